//! User API endpoints

use api_types::{
    Message,
    account::AccountView,
    user::{UserNew, UserView},
};
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use engine::{User, UserCmd};

use crate::{ServerError, accounts::account_view, parse_id, server::ServerState};

fn user_view(user: User) -> UserView {
    UserView {
        id: user.id,
        username: user.username,
        email: user.email,
        created_at: user.created_at,
    }
}

fn user_cmd(payload: UserNew) -> UserCmd {
    UserCmd::new(payload.username, payload.email, payload.password)
}

/// Handle signup requests
pub async fn create(
    State(state): State<ServerState>,
    payload: Result<Json<UserNew>, JsonRejection>,
) -> Result<(StatusCode, Json<UserView>), ServerError> {
    let Json(payload) = payload?;
    let user = state
        .deadline(state.engine.create_user(user_cmd(payload)))
        .await?;
    Ok((StatusCode::CREATED, Json(user_view(user))))
}

pub async fn list(State(state): State<ServerState>) -> Result<Json<Vec<UserView>>, ServerError> {
    let users = state.deadline(state.engine.users()).await?;
    Ok(Json(users.into_iter().map(user_view).collect()))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<UserView>, ServerError> {
    let id = parse_id(&id, "user")?;
    let user = state.deadline(state.engine.user(id)).await?;
    Ok(Json(user_view(user)))
}

/// Handle profile updates. The password is always re-hashed.
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    payload: Result<Json<UserNew>, JsonRejection>,
) -> Result<Json<Message>, ServerError> {
    let id = parse_id(&id, "user")?;
    let Json(payload) = payload?;
    state
        .deadline(state.engine.update_user(id, user_cmd(payload)))
        .await?;
    Ok(Json(Message {
        message: "user updated".to_string(),
    }))
}

pub async fn accounts(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<AccountView>>, ServerError> {
    let id = parse_id(&id, "user")?;
    let accounts = state.deadline(state.engine.user_accounts(id)).await?;
    Ok(Json(accounts.into_iter().map(account_view).collect()))
}
