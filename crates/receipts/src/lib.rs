//! Receipt scanning.
//!
//! A [`ReceiptExtractor`] turns an uploaded image or PDF into a
//! [`ReceiptDraft`]: an expense proposal the user reviews before saving it as
//! a transaction. [`MindeeClient`] is the production implementation; the
//! mapping from provider fields to a draft lives in [`extract_draft`] and is
//! independent of the transport.

use api_types::receipt::ReceiptDraft;
use async_trait::async_trait;

pub use draft::{categorize, describe, extract_draft};
pub use fields::{LineItemFields, ReceiptFields};
pub use mindee::{DEFAULT_BASE_URL, DEFAULT_MODEL_ID, MindeeClient, MindeeConfig};

mod draft;
mod fields;
mod mindee;

#[derive(Debug, thiserror::Error)]
pub enum ReceiptError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("provider returned {status}: {body}")]
    Provider { status: u16, body: String },
    #[error("malformed provider response: {0}")]
    Malformed(String),
    #[error("extraction failed")]
    Failed,
    #[error("extraction still pending after {0} polls")]
    Timeout(u32),
}

/// Anything able to read a receipt.
#[async_trait]
pub trait ReceiptExtractor: Send + Sync {
    async fn extract(&self, bytes: Vec<u8>, filename: &str)
    -> Result<ReceiptDraft, ReceiptError>;
}
