use actix_web::{delete, get, patch, post, web, HttpRequest};
use uuid::Uuid;

use crate::{
    api::{error, success},
    middlewares::get_extensions,
    modules::friend::{
        model::{FriendRequestBody, FriendResponse, FriendshipResponse},
        schema::FriendshipEntity,
        service::FriendService,
    },
    utils::{Claims, ValidatedJson},
};

#[post("/requests")]
pub async fn send_friend_request(
    friend_service: web::Data<FriendService>,
    body: ValidatedJson<FriendRequestBody>,
    req: HttpRequest,
) -> Result<success::Success<FriendshipEntity>, error::Error> {
    let user_id = get_extensions::<Claims>(&req)?.sub;
    let request = friend_service.send_request(user_id, body.0.friend_id).await?;

    Ok(success::Success::created(Some(request)).message("Friend request sent successfully"))
}

#[get("/requests/sent")]
pub async fn list_sent_requests(
    friend_service: web::Data<FriendService>,
    req: HttpRequest,
) -> Result<success::Success<Vec<FriendshipResponse>>, error::Error> {
    let user_id = get_extensions::<Claims>(&req)?.sub;
    let requests = friend_service.list_pending_sent(user_id).await?;

    Ok(success::Success::ok(Some(requests)).message("Sent friend requests retrieved successfully"))
}

#[get("/requests/received")]
pub async fn list_received_requests(
    friend_service: web::Data<FriendService>,
    req: HttpRequest,
) -> Result<success::Success<Vec<FriendshipResponse>>, error::Error> {
    let user_id = get_extensions::<Claims>(&req)?.sub;
    let requests = friend_service.list_pending_received(user_id).await?;

    Ok(success::Success::ok(Some(requests))
        .message("Received friend requests retrieved successfully"))
}

#[patch("/requests/{request_id}/accept")]
pub async fn accept_friend_request(
    friend_service: web::Data<FriendService>,
    request_id: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<success::Success<FriendshipEntity>, error::Error> {
    let user_id = get_extensions::<Claims>(&req)?.sub;
    let friendship = friend_service.accept_request(user_id, *request_id).await?;

    Ok(success::Success::ok(Some(friendship)).message("Friend request accepted successfully"))
}

#[patch("/requests/{request_id}/reject")]
pub async fn reject_friend_request(
    friend_service: web::Data<FriendService>,
    request_id: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<success::Success<()>, error::Error> {
    let user_id = get_extensions::<Claims>(&req)?.sub;
    friend_service.reject_request(user_id, *request_id).await?;

    Ok(success::Success::ok(None).message("Friend request rejected successfully"))
}

#[get("")]
pub async fn list_friends(
    friend_service: web::Data<FriendService>,
    req: HttpRequest,
) -> Result<success::Success<Vec<FriendResponse>>, error::Error> {
    let user_id = get_extensions::<Claims>(&req)?.sub;
    let friends = friend_service.list_friends(user_id).await?;

    Ok(success::Success::ok(Some(friends)).message("Friends retrieved successfully"))
}

#[get("/blocked")]
pub async fn list_blocked_users(
    friend_service: web::Data<FriendService>,
    req: HttpRequest,
) -> Result<success::Success<Vec<FriendshipResponse>>, error::Error> {
    let user_id = get_extensions::<Claims>(&req)?.sub;
    let blocked = friend_service.list_blocked(user_id).await?;

    Ok(success::Success::ok(Some(blocked)).message("Blocked users retrieved successfully"))
}

#[patch("/block/{user_id}")]
pub async fn block_user(
    friend_service: web::Data<FriendService>,
    target_id: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<success::Success<FriendshipEntity>, error::Error> {
    let user_id = get_extensions::<Claims>(&req)?.sub;
    let block = friend_service.block_user(user_id, *target_id).await?;

    Ok(success::Success::ok(Some(block)).message("User blocked successfully"))
}

#[patch("/unblock/{user_id}")]
pub async fn unblock_user(
    friend_service: web::Data<FriendService>,
    target_id: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<success::Success<()>, error::Error> {
    let user_id = get_extensions::<Claims>(&req)?.sub;
    friend_service.unblock_user(user_id, *target_id).await?;

    Ok(success::Success::ok(None).message("User unblocked successfully"))
}

#[delete("/{friendship_id}")]
pub async fn remove_friend(
    friend_service: web::Data<FriendService>,
    friendship_id: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<success::Success<()>, error::Error> {
    let user_id = get_extensions::<Claims>(&req)?.sub;
    friend_service.delete_friendship(user_id, *friendship_id).await?;

    Ok(success::Success::ok(None).message("Friendship deleted successfully"))
}
