//! Mindee v2 client: enqueue the document, poll the job, fetch the result.

use std::time::Duration;

use api_types::receipt::ReceiptDraft;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{
    Response, Url,
    header::AUTHORIZATION,
    multipart::{Form, Part},
};
use serde::Deserialize;

use crate::{ReceiptError, ReceiptExtractor, ReceiptFields, extract_draft};

pub const DEFAULT_BASE_URL: &str = "https://api-v2.mindee.net";
pub const DEFAULT_MODEL_ID: &str = "2540b6d0-dcb8-48b5-8e99-bcddf59d3353";

#[derive(Clone, Debug)]
pub struct MindeeConfig {
    pub api_key: String,
    pub model_id: String,
    pub base_url: String,
    /// Delay between two job polls.
    pub poll_interval: Duration,
    /// Polls before giving up on a job still processing.
    pub max_polls: u32,
}

impl MindeeConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model_id: DEFAULT_MODEL_ID.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval: Duration::from_secs(1),
            max_polls: 30,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Job {
    id: String,
    #[serde(default)]
    status: String,
}

#[derive(Debug, Deserialize)]
struct InferenceResult {
    #[serde(default)]
    fields: Option<ReceiptFields>,
}

#[derive(Debug, Deserialize)]
struct Inference {
    result: InferenceResult,
}

/// Body of both the job and the inference endpoints. A finished job may
/// redirect straight to its inference, so either key can be present.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    job: Option<Job>,
    #[serde(default)]
    inference: Option<Inference>,
}

#[derive(Debug, Clone)]
pub struct MindeeClient {
    base_url: Url,
    http: reqwest::Client,
    config: MindeeConfig,
}

impl MindeeClient {
    pub fn new(config: MindeeConfig) -> Result<Self, ReceiptError> {
        let mut base_url = Url::parse(&config.base_url)
            .map_err(|err| ReceiptError::Malformed(format!("invalid base_url: {err}")))?;
        // Relative joins keep a path prefix only below a trailing slash.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            base_url,
            http: reqwest::Client::new(),
            config,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ReceiptError> {
        self.base_url
            .join(path)
            .map_err(|err| ReceiptError::Malformed(format!("invalid endpoint {path}: {err}")))
    }

    async fn envelope(res: Response) -> Result<Envelope, ReceiptError> {
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(ReceiptError::Provider {
                status: status.as_u16(),
                body,
            });
        }
        res.json::<Envelope>()
            .await
            .map_err(|err| ReceiptError::Malformed(err.to_string()))
    }

    async fn enqueue(&self, bytes: Vec<u8>, filename: &str) -> Result<String, ReceiptError> {
        let form = Form::new()
            .text("model_id", self.config.model_id.clone())
            .text("rag", "false")
            .part("file", Part::bytes(bytes).file_name(filename.to_string()));

        let res = self
            .http
            .post(self.endpoint("v2/inferences/enqueue")?)
            .header(AUTHORIZATION, &self.config.api_key)
            .multipart(form)
            .send()
            .await?;

        Self::envelope(res)
            .await?
            .job
            .map(|job| job.id)
            .ok_or_else(|| ReceiptError::Malformed("enqueue response without job".to_string()))
    }

    async fn get(&self, path: &str) -> Result<Envelope, ReceiptError> {
        let res = self
            .http
            .get(self.endpoint(path)?)
            .header(AUTHORIZATION, &self.config.api_key)
            .send()
            .await?;
        Self::envelope(res).await
    }

    async fn wait_for_inference(&self, job_id: &str) -> Result<Inference, ReceiptError> {
        for attempt in 1..=self.config.max_polls {
            let envelope = self.get(&format!("v2/jobs/{job_id}")).await?;
            if let Some(inference) = envelope.inference {
                return Ok(inference);
            }

            let status = envelope.job.map(|job| job.status).unwrap_or_default();
            match status.as_str() {
                "Processed" => {
                    return self
                        .get(&format!("v2/inferences/{job_id}"))
                        .await?
                        .inference
                        .ok_or_else(|| {
                            ReceiptError::Malformed("response without inference".to_string())
                        });
                }
                "Failed" => return Err(ReceiptError::Failed),
                _ => {
                    tracing::debug!(job_id, attempt, %status, "receipt still processing");
                    tokio::time::sleep(self.config.poll_interval).await;
                }
            }
        }
        Err(ReceiptError::Timeout(self.config.max_polls))
    }
}

#[async_trait]
impl ReceiptExtractor for MindeeClient {
    async fn extract(
        &self,
        bytes: Vec<u8>,
        filename: &str,
    ) -> Result<ReceiptDraft, ReceiptError> {
        let job_id = self.enqueue(bytes, filename).await?;
        tracing::debug!(%job_id, filename, "receipt enqueued");

        let inference = self.wait_for_inference(&job_id).await?;
        let fields = inference
            .result
            .fields
            .ok_or_else(|| ReceiptError::Malformed("inference without fields".to_string()))?;

        Ok(extract_draft(&fields, Utc::now()))
    }
}
