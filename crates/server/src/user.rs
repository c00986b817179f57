//! Registration, login and the current-user endpoint.

use api_types::user::{LoginResponse, LoginUser, RegisterResponse, RegisterUser, UserView};
use axum::{Extension, Json, extract::State, http::StatusCode};
use engine::User;

use crate::{ServerError, server::ServerState};

pub(crate) fn user_view(user: &User) -> UserView {
    UserView {
        id: user.id,
        name: user.name.clone(),
        email: user.email.clone(),
    }
}

pub async fn register(
    State(state): State<ServerState>,
    Json(payload): Json<RegisterUser>,
) -> Result<(StatusCode, Json<RegisterResponse>), ServerError> {
    let user = state
        .engine
        .register_user(&payload.name, &payload.email, &payload.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user: user_view(&user),
        }),
    ))
}

pub async fn login(
    State(state): State<ServerState>,
    Json(payload): Json<LoginUser>,
) -> Result<Json<LoginResponse>, ServerError> {
    let user = state
        .engine
        .verify_credentials(&payload.email, &payload.password)
        .await?;
    let token = state.auth.issue(&user, state.engine.now())?;

    tracing::info!(user_id = %user.id, "user logged in");
    Ok(Json(LoginResponse {
        user: user_view(&user),
        token,
    }))
}

pub async fn me(Extension(user): Extension<User>) -> Json<UserView> {
    Json(user_view(&user))
}
