use actix_multipart::Multipart;
use actix_web::{delete, get, patch, post, put, web, HttpRequest};
use futures_util::TryStreamExt;
use uuid::Uuid;

use crate::modules::user::{model, service::UserService};
use crate::{api::{error, success}, middlewares::get_extensions, utils::{Claims, ValidatedJson}};

#[post("/signup")]
pub async fn sign_up(
    user_service: web::Data<UserService>,
    user_data: ValidatedJson<model::SignUpModel>,
) -> Result<success::Success<model::UserResponse>, error::Error> {
    let user = user_service.sign_up(user_data.0).await?;
    Ok(success::Success::created(Some(user)).message("Signup successful"))
}

#[post("/signin")]
pub async fn sign_in(
    user_service: web::Data<UserService>,
    user_data: ValidatedJson<model::SignInModel>,
) -> Result<success::Success<model::SignInResponse>, error::Error> {
    let access_token = user_service.sign_in(user_data.0).await?;
    let response = model::SignInResponse { access_token };
    Ok(success::Success::ok(Some(response)).message("Signin successful"))
}

#[post("/signout")]
pub async fn sign_out(
    user_service: web::Data<UserService>,
    req: HttpRequest,
) -> Result<success::Success<()>, error::Error> {
    let claims = get_extensions::<Claims>(&req)?;
    user_service.sign_out(&claims).await?;
    Ok(success::Success::ok(None).message("Signout successful"))
}

#[get("/me")]
pub async fn get_profile(
    user_service: web::Data<UserService>,
    req: HttpRequest,
) -> Result<success::Success<model::UserResponse>, error::Error> {
    let id = get_extensions::<Claims>(&req)?.sub;
    let user = user_service.get_by_id(id).await?;
    Ok(success::Success::ok(Some(user)).message("Profile retrieved successfully"))
}

#[get("/{id:[0-9a-fA-F-]{36}}")]
pub async fn get_user(
    user_service: web::Data<UserService>,
    user_id: web::Path<Uuid>,
) -> Result<success::Success<model::PublicUserResponse>, error::Error> {
    let user = user_service.get_public_profile(user_id.into_inner()).await?;
    Ok(success::Success::ok(Some(user)).message("User retrieved successfully"))
}

#[patch("/me")]
pub async fn update_user(
    user_service: web::Data<UserService>,
    user_data: ValidatedJson<model::UpdateUserModel>,
    req: HttpRequest,
) -> Result<success::Success<model::UserResponse>, error::Error> {
    let id = get_extensions::<Claims>(&req)?.sub;
    let user = user_service.update(id, user_data.0).await?;
    Ok(success::Success::ok(Some(user)).message("User updated successfully"))
}

#[patch("/me/password")]
pub async fn update_password(
    user_service: web::Data<UserService>,
    payload: ValidatedJson<model::UpdatePasswordModel>,
    req: HttpRequest,
) -> Result<success::Success<()>, error::Error> {
    let id = get_extensions::<Claims>(&req)?.sub;
    user_service.update_password(id, payload.0).await?;
    Ok(success::Success::ok(None).message("Password updated successfully"))
}

#[delete("/me")]
pub async fn delete_user(
    user_service: web::Data<UserService>,
    req: HttpRequest,
) -> Result<success::Success<()>, error::Error> {
    let claims = get_extensions::<Claims>(&req)?;
    user_service.delete(&claims).await?;
    Ok(success::Success::ok(None).message("User deleted successfully"))
}

/// Takes the first multipart field as the new avatar. Reading stops at the size limit.
#[put("/me/avatar")]
pub async fn upload_avatar(
    user_service: web::Data<UserService>,
    mut payload: Multipart,
    req: HttpRequest,
) -> Result<success::Success<model::UserResponse>, error::Error> {
    let id = get_extensions::<Claims>(&req)?.sub;

    let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| error::Error::bad_request(e.to_string()))?
    else {
        return Err(error::Error::bad_request("No file found in request"));
    };

    let mime_type = field
        .content_type()
        .map(|m| m.essence_str().to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string());

    let mut bytes = Vec::new();
    while let Some(chunk) =
        field.try_next().await.map_err(|e| error::Error::bad_request(e.to_string()))?
    {
        user_service.check_avatar_size(bytes.len() + chunk.len())?;
        bytes.extend_from_slice(&chunk);
    }

    let user = user_service.upload_avatar(id, &bytes, &mime_type).await?;
    Ok(success::Success::ok(Some(user)).message("Avatar uploaded successfully"))
}

#[delete("/me/avatar")]
pub async fn remove_avatar(
    user_service: web::Data<UserService>,
    req: HttpRequest,
) -> Result<success::Success<()>, error::Error> {
    let id = get_extensions::<Claims>(&req)?.sub;
    user_service.remove_avatar(id).await?;
    Ok(success::Success::ok(None).message("Avatar removed successfully"))
}
