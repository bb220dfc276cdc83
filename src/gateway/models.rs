// src/gateway/models.rs
// Wire types shared by both memory backends

use serde::{Deserialize, Serialize};

use super::Backend;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub user_id: String,
    pub query: String,
}

impl QueryRequest {
    pub fn new(user_id: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            query: query.into(),
        }
    }
}

/// Per-stage timings reported by a backend, all in milliseconds.
///
/// The backend names the LLM and save stages `chain_invoke_time_ms` and
/// `add_time_ms` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Zep only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_setup_time_ms: Option<f64>,
    /// Zep only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_create_time_ms: Option<f64>,
    pub search_time_ms: f64,
    #[serde(rename = "chain_invoke_time_ms")]
    pub llm_invoke_time_ms: f64,
    #[serde(rename = "add_time_ms")]
    pub save_time_ms: f64,
    pub total_time_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub response: String,
    pub memory_saved: bool,
    #[serde(default)]
    pub context_found: bool,
    #[serde(default)]
    pub retrieved_memory: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance_metrics: Option<PerformanceMetrics>,
}

/// Both backends' answers to the same query.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponsePair {
    pub mem0: QueryResponse,
    pub zep: QueryResponse,
}

impl ResponsePair {
    pub fn get(&self, backend: Backend) -> &QueryResponse {
        match backend {
            Backend::Mem0 => &self.mem0,
            Backend::Zep => &self.zep,
        }
    }
}
