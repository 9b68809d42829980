use crate::modules::friend::handle::*;
use actix_web::web::{scope, ServiceConfig};

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(
        scope("/friends")
            .service(send_friend_request)
            .service(list_sent_requests)
            .service(list_received_requests)
            .service(accept_friend_request)
            .service(reject_friend_request)
            .service(list_blocked_users)
            .service(block_user)
            .service(unblock_user)
            .service(list_friends)
            .service(remove_friend),
    );
}
