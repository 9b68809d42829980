use crate::modules::user::handle::*;
use actix_web::web::{scope, ServiceConfig};

pub fn public_api_configure(cfg: &mut ServiceConfig) {
    cfg.service(scope("/auth").service(sign_up).service(sign_in));
}

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(
        scope("/users")
            .service(sign_out)
            .service(get_profile)
            .service(update_user)
            .service(update_password)
            .service(delete_user)
            .service(upload_avatar)
            .service(remove_avatar)
            .service(get_user),
    );
}
