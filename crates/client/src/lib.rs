//! HTTP client for the finance tracker API.
//!
//! [`Client::login`] returns a [`Session`]; every other authenticated call
//! takes it by reference. Sessions can be persisted between runs with
//! [`Session::save`] and [`Session::load`].

use api_types::{
    dashboard::{DashboardQuery, DashboardResponse},
    receipt::{ReceiptDraft, ReceiptUploadResponse},
    transaction::{
        TransactionDeleted, TransactionListResponse, TransactionNew, TransactionQuery,
        TransactionUpdate, TransactionView,
    },
    user::{LoginResponse, LoginUser, RegisterResponse, RegisterUser, UserView},
};
use reqwest::{
    RequestBuilder, Url,
    multipart::{Form, Part},
};
use serde::{Deserialize, de::DeserializeOwned};
use uuid::Uuid;

pub use session::{Session, SessionError};

mod session;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("not found")]
    NotFound,
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("server error: {0}")]
    Server(String),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Clone)]
pub struct Client {
    base_url: Url,
    http: reqwest::Client,
}

impl Client {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let mut base_url = Url::parse(base_url)
            .map_err(|err| ClientError::Server(format!("invalid base_url: {err}")))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            base_url,
            http: reqwest::Client::new(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path)
            .map_err(|err| ClientError::Server(format!("invalid base_url: {err}")))
    }

    async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ClientError> {
        let res = request.send().await?;

        if res.status().is_success() {
            return Ok(res.json::<T>().await?);
        }

        let status = res.status();
        let body = res
            .json::<ErrorResponse>()
            .await
            .map(|err| err.error)
            .unwrap_or_else(|_| "unknown error".to_string());

        let err = match status.as_u16() {
            401 => ClientError::Unauthorized,
            403 => ClientError::Forbidden,
            404 => ClientError::NotFound,
            400 | 413 | 422 => ClientError::Validation(body),
            _ => ClientError::Server(body),
        };
        Err(err)
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<UserView, ClientError> {
        let payload = RegisterUser {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        let res: RegisterResponse =
            Self::send(self.http.post(self.endpoint("api/auth/register")?).json(&payload)).await?;
        Ok(res.user)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ClientError> {
        let payload = LoginUser {
            email: email.to_string(),
            password: password.to_string(),
        };
        let res: LoginResponse =
            Self::send(self.http.post(self.endpoint("api/auth/login")?).json(&payload)).await?;
        Ok(Session {
            token: res.token,
            user: res.user,
        })
    }

    pub async fn me(&self, session: &Session) -> Result<UserView, ClientError> {
        Self::send(
            self.http
                .get(self.endpoint("api/auth/me")?)
                .bearer_auth(&session.token),
        )
        .await
    }

    pub async fn create_transaction(
        &self,
        session: &Session,
        payload: &TransactionNew,
    ) -> Result<TransactionView, ClientError> {
        Self::send(
            self.http
                .post(self.endpoint("api/transactions")?)
                .bearer_auth(&session.token)
                .json(payload),
        )
        .await
    }

    pub async fn list_transactions(
        &self,
        session: &Session,
        query: &TransactionQuery,
    ) -> Result<TransactionListResponse, ClientError> {
        Self::send(
            self.http
                .get(self.endpoint("api/transactions")?)
                .bearer_auth(&session.token)
                .query(query),
        )
        .await
    }

    pub async fn transaction(
        &self,
        session: &Session,
        id: Uuid,
    ) -> Result<TransactionView, ClientError> {
        Self::send(
            self.http
                .get(self.endpoint(&format!("api/transactions/{id}"))?)
                .bearer_auth(&session.token),
        )
        .await
    }

    pub async fn update_transaction(
        &self,
        session: &Session,
        id: Uuid,
        payload: &TransactionUpdate,
    ) -> Result<TransactionView, ClientError> {
        Self::send(
            self.http
                .put(self.endpoint(&format!("api/transactions/{id}"))?)
                .bearer_auth(&session.token)
                .json(payload),
        )
        .await
    }

    pub async fn delete_transaction(
        &self,
        session: &Session,
        id: Uuid,
    ) -> Result<TransactionDeleted, ClientError> {
        Self::send(
            self.http
                .delete(self.endpoint(&format!("api/transactions/{id}"))?)
                .bearer_auth(&session.token),
        )
        .await
    }

    /// `duration` is one of `1month`, `3months`, `6months` or `all`.
    pub async fn dashboard(
        &self,
        session: &Session,
        duration: Option<&str>,
    ) -> Result<DashboardResponse, ClientError> {
        let query = DashboardQuery {
            duration: duration.map(str::to_string),
        };
        Self::send(
            self.http
                .get(self.endpoint("api/dashboard")?)
                .bearer_auth(&session.token)
                .query(&query),
        )
        .await
    }

    pub async fn upload_receipt(
        &self,
        session: &Session,
        bytes: Vec<u8>,
        filename: &str,
        mime: &str,
    ) -> Result<ReceiptDraft, ClientError> {
        let part = Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(mime)?;
        let form = Form::new().part("receipt", part);

        let res: ReceiptUploadResponse = Self::send(
            self.http
                .post(self.endpoint("api/receipts/upload")?)
                .bearer_auth(&session.token)
                .multipart(form),
        )
        .await?;

        res.data
            .ok_or_else(|| ClientError::Server(res.error.unwrap_or_else(|| "empty response".to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_keep_the_base_path() {
        let client = Client::new("http://localhost:3000/finboard").unwrap();
        assert_eq!(
            client.endpoint("api/auth/me").unwrap().as_str(),
            "http://localhost:3000/finboard/api/auth/me"
        );

        let client = Client::new("http://localhost:3000").unwrap();
        assert_eq!(
            client.endpoint("api/transactions").unwrap().as_str(),
            "http://localhost:3000/api/transactions"
        );
    }
}
