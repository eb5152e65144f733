use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AppState;
use crate::auth::CurrentUser;
use crate::db::models::{Friendship, FRIENDSHIP_ACCEPTED, FRIENDSHIP_REJECTED};
use crate::db::queries;
use crate::error::AppError;
use crate::handlers::UserSummary;
use crate::validation;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendDto {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub friendship_id: Uuid,
    pub connected_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct FriendsResponse {
    pub friends: Vec<FriendDto>,
}

pub async fn list_friends(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let friends = queries::list_accepted_friends(&state.db, user.id)
        .await?
        .into_iter()
        .map(|f| FriendDto {
            id: f.friend_id,
            name: f.name,
            email: f.email,
            friendship_id: f.friendship_id,
            connected_at: f.connected_at,
        })
        .collect();

    Ok(Json(FriendsResponse { friends }))
}

#[derive(Debug, Deserialize)]
pub struct FriendRequestPayload {
    pub email: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingRequestDto {
    pub id: Uuid,
    pub to_user: UserSummary,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct SendRequestResponse {
    pub message: String,
    pub request: OutgoingRequestDto,
}

pub async fn send_friend_request(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<FriendRequestPayload>,
) -> Result<impl IntoResponse, AppError> {
    let email = validation::validate_email(&payload.email)?;

    let target = queries::find_user_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if target.id == user.id {
        return Err(AppError::BadRequest(
            "Cannot send friend request to yourself".to_string(),
        ));
    }

    if let Some(existing) = queries::find_relation_between(&state.db, user.id, target.id).await? {
        if existing.is_accepted() {
            return Err(AppError::Conflict(
                "Already friends with this user".to_string(),
            ));
        }
        if existing.is_pending() {
            return Err(AppError::Conflict(
                "Friend request already exists".to_string(),
            ));
        }
        // A rejected relation does not block a fresh request; replace it.
        queries::delete_friendship(&state.db, existing.id).await?;
    }

    let request = queries::insert_friendship(&state.db, &Friendship::request(user.id, target.id))
        .await?;

    tracing::info!(requester = %user.id, recipient = %target.id, "friend request sent");

    Ok(Json(SendRequestResponse {
        message: "Friend request sent successfully".to_string(),
        request: OutgoingRequestDto {
            id: request.id,
            to_user: UserSummary::from(&target),
            status: request.status,
            created_at: request.created_at,
        },
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingRequestDto {
    pub id: Uuid,
    pub from_user: UserSummary,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRequestDto {
    pub id: Uuid,
    pub to_user: UserSummary,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct RequestsResponse {
    pub incoming: Vec<IncomingRequestDto>,
    pub outgoing: Vec<PendingRequestDto>,
}

pub async fn list_friend_requests(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let incoming = queries::list_incoming_requests(&state.db, user.id)
        .await?
        .into_iter()
        .map(|r| IncomingRequestDto {
            id: r.id,
            from_user: UserSummary {
                id: r.user_id,
                name: r.name,
                email: r.email,
            },
            created_at: r.created_at,
        })
        .collect();

    let outgoing = queries::list_outgoing_requests(&state.db, user.id)
        .await?
        .into_iter()
        .map(|r| PendingRequestDto {
            id: r.id,
            to_user: UserSummary {
                id: r.user_id,
                name: r.name,
                email: r.email,
            },
            created_at: r.created_at,
        })
        .collect();

    Ok(Json(RequestsResponse { incoming, outgoing }))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestAction {
    Accept,
    Reject,
}

#[derive(Debug, Deserialize)]
pub struct RespondPayload {
    pub action: RequestAction,
}

#[derive(Serialize)]
pub struct RespondResponse {
    pub message: String,
    pub status: String,
}

pub async fn respond_to_friend_request(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(request_id): Path<Uuid>,
    Json(payload): Json<RespondPayload>,
) -> Result<impl IntoResponse, AppError> {
    let request = queries::find_friendship(&state.db, request_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Friend request not found".to_string()))?;

    if request.recipient != user.id {
        return Err(AppError::Forbidden(
            "Not authorized to respond to this request".to_string(),
        ));
    }

    if !request.is_pending() {
        return Err(AppError::Conflict(
            "Friend request already processed".to_string(),
        ));
    }

    let (new_status, verb) = match payload.action {
        RequestAction::Accept => (FRIENDSHIP_ACCEPTED, "accepted"),
        RequestAction::Reject => (FRIENDSHIP_REJECTED, "rejected"),
    };

    let updated = queries::set_friendship_status(&state.db, request.id, new_status).await?;

    tracing::info!(
        request_id = %request.id,
        status = %updated.status,
        "friend request processed"
    );

    Ok(Json(RespondResponse {
        message: format!("Friend request {} successfully", verb),
        status: updated.status,
    }))
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

pub async fn cancel_friend_request(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(request_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let request = queries::find_friendship(&state.db, request_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Friend request not found".to_string()))?;

    if request.requester != user.id {
        return Err(AppError::Forbidden(
            "Not authorized to cancel this request".to_string(),
        ));
    }

    if !request.is_pending() {
        return Err(AppError::Conflict(
            "Can only cancel pending requests".to_string(),
        ));
    }

    queries::delete_friendship(&state.db, request.id).await?;

    Ok(Json(MessageResponse {
        message: "Friend request cancelled successfully".to_string(),
    }))
}

pub async fn remove_friend(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(friend_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let removed = queries::delete_accepted_between(&state.db, user.id, friend_id).await?;
    if removed == 0 {
        return Err(AppError::NotFound("Friendship not found".to_string()));
    }

    tracing::info!(user_id = %user.id, friend_id = %friend_id, "friendship removed");

    Ok(Json(MessageResponse {
        message: "Friend removed successfully".to_string(),
    }))
}
