use crate::constants::api;
use crate::context::CodeContext;
use crate::diagnostics::DiagnosticsResponse;
use crate::editor::EditResult;
use crate::error::{CodebudError, Result};
use crate::mode::Mode;
use crate::protocol::{
    ErrorBody, HighlightRequest, InsertRequest, ModeRequest, ModeResponse, ReplaceRequest,
    StatusResponse,
};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// The client's view of the local HTTP API. Any non-success status is an
/// error, including 404 for "no focused document".
#[async_trait::async_trait]
pub trait CodeBudApi: Send + Sync {
    async fn context(&self) -> Result<CodeContext>;
    async fn diagnostics(&self) -> Result<DiagnosticsResponse>;
    async fn insert(&self, line: i64, code: &str) -> Result<EditResult>;
    async fn replace(&self, start_line: i64, end_line: i64, code: &str) -> Result<EditResult>;
    async fn highlight(&self, line: i64) -> Result<()>;
    async fn set_mode(&self, mode: Mode) -> Result<ModeResponse>;
    async fn status(&self) -> Result<StatusResponse>;
}

/// `reqwest` implementation of [`CodeBudApi`].
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn local(host: &str, port: u16) -> Self {
        Self::new(format!("http://{host}:{port}"))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(connection_failed)?;
        decode(response).await
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(connection_failed)?;
        decode(response).await
    }
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::local(api::HOST, api::PORT)
    }
}

fn connection_failed(e: reqwest::Error) -> CodebudError {
    CodebudError::ConnectionFailed(e.to_string())
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.error)
            .unwrap_or_else(|_| {
                status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string()
            });
        return Err(CodebudError::Api {
            status: status.as_u16(),
            message,
        });
    }

    Ok(serde_json::from_str(&text)?)
}

#[async_trait::async_trait]
impl CodeBudApi for ApiClient {
    async fn context(&self) -> Result<CodeContext> {
        self.get(api::CONTEXT).await
    }

    async fn diagnostics(&self) -> Result<DiagnosticsResponse> {
        self.get(api::DIAGNOSTICS).await
    }

    async fn insert(&self, line: i64, code: &str) -> Result<EditResult> {
        let body = InsertRequest {
            line,
            code: code.to_string(),
        };
        self.post(api::INSERT, &body).await
    }

    async fn replace(&self, start_line: i64, end_line: i64, code: &str) -> Result<EditResult> {
        let body = ReplaceRequest {
            start_line,
            end_line,
            code: code.to_string(),
        };
        self.post(api::REPLACE, &body).await
    }

    async fn highlight(&self, line: i64) -> Result<()> {
        let _: serde_json::Value = self.post(api::HIGHLIGHT, &HighlightRequest { line }).await?;
        Ok(())
    }

    async fn set_mode(&self, mode: Mode) -> Result<ModeResponse> {
        let body = ModeRequest {
            mode: mode.to_string(),
        };
        self.post(api::MODE, &body).await
    }

    async fn status(&self) -> Result<StatusResponse> {
        self.get(api::STATUS).await
    }
}
