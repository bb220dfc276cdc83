// src/gateway/mod.rs
//! HTTP access to the two memory backends.

pub mod models;

use std::fmt;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{extract_detail, GatewayError};
pub use models::{PerformanceMetrics, QueryRequest, QueryResponse, ResponsePair};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    Mem0,
    Zep,
}

impl Backend {
    /// Column order, left to right
    pub const ALL: [Backend; 2] = [Backend::Mem0, Backend::Zep];

    pub fn name(&self) -> &'static str {
        match self {
            Backend::Mem0 => "Mem0",
            Backend::Zep => "Zep",
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Backend::Mem0 => "/mem0/query",
            Backend::Zep => "/zep/query",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Single-attempt POST client for both backends. No retry, no timeout
/// override, no caching.
#[derive(Debug, Clone)]
pub struct MemoryGateway {
    client: reqwest::Client,
    base_url: String,
}

impl MemoryGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint(&self, backend: Backend) -> String {
        format!("{}{}", self.base_url, backend.path())
    }

    pub async fn query(
        &self,
        backend: Backend,
        request: &QueryRequest,
    ) -> Result<QueryResponse, GatewayError> {
        let url = self.endpoint(backend);
        let started = Instant::now();
        debug!(backend = backend.name(), url = %url, "posting query");

        let response = self.client.post(&url).json(request).send().await?;
        let status = response.status();
        let body = response.text().await?;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        if !status.is_success() {
            let detail = extract_detail(&body);
            warn!(
                backend = backend.name(),
                status = status.as_u16(),
                elapsed_ms,
                detail = detail.as_deref().unwrap_or(""),
                "backend rejected query"
            );
            return Err(GatewayError::Status { url, status, detail });
        }

        info!(backend = backend.name(), status = status.as_u16(), elapsed_ms, "backend replied");
        Ok(serde_json::from_str(&body)?)
    }

    /// Query both backends concurrently. Resolves once both succeed, fails on
    /// the first error.
    pub async fn query_both(&self, request: &QueryRequest) -> Result<ResponsePair, GatewayError> {
        let (mem0, zep) = tokio::try_join!(
            self.query(Backend::Mem0, request),
            self.query(Backend::Zep, request),
        )?;
        Ok(ResponsePair { mem0, zep })
    }
}
