//! Bearer-token authentication.
//!
//! Tokens are HS256 JWTs carrying the user id (`sub`) and email. Every
//! protected request decodes the token and loads the user it names; the
//! user is then handed to handlers as an `Extension<User>`.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use chrono::{DateTime, Duration, Utc};
use engine::User;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Claims {
    /// User id.
    pub(crate) sub: String,
    pub(crate) email: String,
    pub(crate) iat: i64,
    pub(crate) exp: i64,
}

/// Signing material and lifetime of issued tokens.
#[derive(Clone)]
pub struct AuthKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl AuthKeys {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub(crate) fn issue(&self, user: &User, now: DateTime<Utc>) -> Result<String, ServerError> {
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|err| ServerError::Internal(format!("token creation failed: {err}")))
    }

    /// Returns the claims of a valid, unexpired token.
    pub(crate) fn verify(&self, token: &str) -> Option<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .ok()
    }
}

pub(crate) async fn require_user(
    State(state): State<ServerState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or(ServerError::Unauthorized)?;
    let claims = state
        .auth
        .verify(bearer.token())
        .ok_or(ServerError::Unauthorized)?;
    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| ServerError::Unauthorized)?;

    let user = state
        .engine
        .user_by_id(user_id)
        .await?
        .ok_or(ServerError::Unauthorized)?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}
