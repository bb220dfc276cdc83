// src/session.rs
// Form state, busy flag, and the two per-backend transcripts

use chrono::{DateTime, Local};
use std::collections::VecDeque;

use crate::error::GatewayError;
use crate::gateway::{Backend, PerformanceMetrics, QueryRequest, QueryResponse, ResponsePair};
use crate::{log_debug, log_info, log_warn};

/// One answered query, as shown in a backend's column. Never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationEntry {
    pub query: String,
    pub response_text: String,
    pub retrieved_memory: Option<Vec<String>>,
    pub timestamp: DateTime<Local>,
    pub performance_metrics: Option<PerformanceMetrics>,
}

impl ConversationEntry {
    fn from_response(query: &str, response: &QueryResponse, timestamp: DateTime<Local>) -> Self {
        Self {
            query: query.to_string(),
            response_text: response.response.clone(),
            retrieved_memory: response.retrieved_memory.clone(),
            timestamp,
            performance_metrics: response.performance_metrics.clone(),
        }
    }

    /// Stable render key. Submissions are serialized, so timestamps are unique
    /// within a column.
    pub fn key(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }

    /// Retrieved memories, or `None` when the backend found nothing.
    pub fn memories(&self) -> Option<&[String]> {
        self.retrieved_memory
            .as_deref()
            .filter(|memories| !memories.is_empty())
    }
}

/// Newest-first history for one backend.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: VecDeque<ConversationEntry>,
}

impl Transcript {
    fn prepend(&mut self, entry: ConversationEntry) {
        self.entries.push_front(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest(&self) -> Option<&ConversationEntry> {
        self.entries.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConversationEntry> {
        self.entries.iter()
    }
}

/// What a column shows besides its entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnState {
    /// Nothing submitted yet
    Idle,
    /// First submission in flight
    Loading,
    /// Later submission in flight, history visible below the indicator
    Processing,
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputField {
    UserId,
    Query,
}

/// A submission that has been dispatched but not yet applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSubmission {
    pub request: QueryRequest,
}

impl PendingSubmission {
    /// Query text as it was when the user submitted.
    pub fn captured_query(&self) -> &str {
        &self.request.query
    }
}

#[derive(Debug)]
pub struct Session {
    pub user_id: String,
    pub query: String,
    focus: InputField,
    busy: bool,
    error: Option<String>,
    mem0: Transcript,
    zep: Transcript,
}

impl Session {
    pub fn new(default_user_id: impl Into<String>) -> Self {
        Self {
            user_id: default_user_id.into(),
            query: String::new(),
            focus: InputField::Query,
            busy: false,
            error: None,
            mem0: Transcript::default(),
            zep: Transcript::default(),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn focus(&self) -> InputField {
        self.focus
    }

    pub fn transcript(&self, backend: Backend) -> &Transcript {
        match backend {
            Backend::Mem0 => &self.mem0,
            Backend::Zep => &self.zep,
        }
    }

    fn transcript_mut(&mut self, backend: Backend) -> &mut Transcript {
        match backend {
            Backend::Mem0 => &mut self.mem0,
            Backend::Zep => &mut self.zep,
        }
    }

    pub fn can_submit(&self) -> bool {
        !self.busy && !self.user_id.trim().is_empty() && !self.query.trim().is_empty()
    }

    /// Start a submission. Returns `None` and changes nothing when a field is
    /// blank or a submission is already in flight.
    pub fn begin_submit(&mut self) -> Option<PendingSubmission> {
        if !self.can_submit() {
            log_debug!(
                "Submit ignored (busy={}, user_id blank={}, query blank={})",
                self.busy,
                self.user_id.trim().is_empty(),
                self.query.trim().is_empty()
            );
            return None;
        }

        self.busy = true;
        self.error = None;

        Some(PendingSubmission {
            request: QueryRequest::new(self.user_id.clone(), self.query.clone()),
        })
    }

    /// Apply the joined outcome of a submission.
    pub fn complete(
        &mut self,
        pending: PendingSubmission,
        outcome: Result<ResponsePair, GatewayError>,
    ) {
        self.complete_at(pending, outcome, Local::now());
    }

    pub fn complete_at(
        &mut self,
        pending: PendingSubmission,
        outcome: Result<ResponsePair, GatewayError>,
        timestamp: DateTime<Local>,
    ) {
        match outcome {
            Ok(responses) => {
                let query = pending.captured_query();
                // Both columns grow together or not at all
                for backend in Backend::ALL {
                    let response = responses.get(backend);
                    let entry = ConversationEntry::from_response(query, response, timestamp);
                    self.transcript_mut(backend).prepend(entry);
                }
                self.query.clear();
                log_info!("Query answered by both backends (history: {})", self.mem0.len());
            }
            Err(err) => {
                log_warn!("Submission failed: {}", err);
                self.error = Some(err.submission_message());
            }
        }
        self.busy = false;
    }

    pub fn column_state(&self, backend: Backend) -> ColumnState {
        let empty = self.transcript(backend).is_empty();
        match (self.busy, empty) {
            (false, true) => ColumnState::Idle,
            (true, true) => ColumnState::Loading,
            (true, false) => ColumnState::Processing,
            (false, false) => ColumnState::Ready,
        }
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            InputField::UserId => InputField::Query,
            InputField::Query => InputField::UserId,
        };
    }

    fn focused_field_mut(&mut self) -> &mut String {
        match self.focus {
            InputField::UserId => &mut self.user_id,
            InputField::Query => &mut self.query,
        }
    }

    /// Inputs are read-only while a submission is in flight.
    pub fn push_char(&mut self, ch: char) {
        if !self.busy {
            self.focused_field_mut().push(ch);
        }
    }

    pub fn pop_char(&mut self) {
        if !self.busy {
            self.focused_field_mut().pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    fn reply(text: &str) -> QueryResponse {
        QueryResponse {
            response: text.to_string(),
            memory_saved: true,
            context_found: false,
            retrieved_memory: None,
            performance_metrics: None,
        }
    }

    fn pair(mem0: &str, zep: &str) -> ResponsePair {
        ResponsePair { mem0: reply(mem0), zep: reply(zep) }
    }

    fn rate_limited() -> GatewayError {
        GatewayError::Status {
            url: "http://localhost:8000/mem0/query".to_string(),
            status: StatusCode::TOO_MANY_REQUESTS,
            detail: Some("rate limited".to_string()),
        }
    }

    fn session_with_query(query: &str) -> Session {
        let mut session = Session::new("u1");
        session.query = query.to_string();
        session
    }

    #[test]
    fn test_begin_submit_captures_request() {
        let mut session = session_with_query("hello");
        let pending = session.begin_submit().unwrap();

        assert_eq!(pending.request, QueryRequest::new("u1", "hello"));
        assert_eq!(pending.captured_query(), "hello");
        assert!(session.is_busy());
    }

    #[test]
    fn test_submit_rejected_when_blank() {
        let mut session = session_with_query("   ");
        assert!(session.begin_submit().is_none());
        assert!(!session.is_busy());

        let mut session = session_with_query("hello");
        session.user_id.clear();
        assert!(session.begin_submit().is_none());
        assert!(!session.is_busy());
        assert_eq!(session.query, "hello");
    }

    #[test]
    fn test_submit_rejected_while_busy() {
        let mut session = session_with_query("hello");
        session.begin_submit().unwrap();
        assert!(session.begin_submit().is_none());
        assert!(session.is_busy());
    }

    #[test]
    fn test_begin_submit_clears_previous_error() {
        let mut session = session_with_query("hello");
        let pending = session.begin_submit().unwrap();
        session.complete(pending, Err(rate_limited()));
        assert!(session.error().is_some());

        session.begin_submit().unwrap();
        assert!(session.error().is_none());
    }

    #[test]
    fn test_success_prepends_to_both() {
        let mut session = session_with_query("hello");
        let pending = session.begin_submit().unwrap();
        session.complete(pending, Ok(pair("hi from mem0", "hi from zep")));

        session.query = "second".to_string();
        let pending = session.begin_submit().unwrap();
        session.complete(pending, Ok(pair("again mem0", "again zep")));

        let mem0 = session.transcript(Backend::Mem0);
        let zep = session.transcript(Backend::Zep);
        assert_eq!(mem0.len(), 2);
        assert_eq!(zep.len(), 2);

        let newest = mem0.latest().unwrap();
        assert_eq!(newest.query, "second");
        assert_eq!(newest.response_text, "again mem0");
        assert_eq!(zep.latest().unwrap().response_text, "again zep");
        assert_eq!(mem0.iter().last().unwrap().query, "hello");

        assert!(!session.is_busy());
        assert!(session.query.is_empty());
        assert!(session.error().is_none());
    }

    #[test]
    fn test_failure_leaves_everything_but_error() {
        let mut session = session_with_query("hello");
        let pending = session.begin_submit().unwrap();
        session.complete(pending, Err(rate_limited()));

        assert_eq!(session.error(), Some("Error processing query: rate limited"));
        assert!(session.transcript(Backend::Mem0).is_empty());
        assert!(session.transcript(Backend::Zep).is_empty());
        assert_eq!(session.query, "hello");
        assert!(!session.is_busy());
    }

    #[test]
    fn test_entry_uses_captured_query() {
        let mut session = session_with_query("what do I like?");
        let pending = session.begin_submit().unwrap();
        // Edits are ignored while busy
        session.push_char('!');
        session.complete(pending, Ok(pair("a", "b")));

        assert_eq!(session.transcript(Backend::Zep).latest().unwrap().query, "what do I like?");
    }

    #[test]
    fn test_entries_share_timestamp_key() {
        let mut session = session_with_query("hello");
        let pending = session.begin_submit().unwrap();
        let at = Local::now();
        session.complete_at(pending, Ok(pair("a", "b")), at);

        let mem0 = session.transcript(Backend::Mem0).latest().unwrap();
        let zep = session.transcript(Backend::Zep).latest().unwrap();
        assert_eq!(mem0.key(), at.timestamp_millis());
        assert_eq!(mem0.key(), zep.key());
    }

    #[test]
    fn test_column_states() {
        let mut session = session_with_query("hello");
        assert_eq!(session.column_state(Backend::Mem0), ColumnState::Idle);

        let pending = session.begin_submit().unwrap();
        assert_eq!(session.column_state(Backend::Mem0), ColumnState::Loading);
        assert_eq!(session.column_state(Backend::Zep), ColumnState::Loading);

        session.complete(pending, Ok(pair("a", "b")));
        assert_eq!(session.column_state(Backend::Zep), ColumnState::Ready);

        session.query = "again".to_string();
        session.begin_submit().unwrap();
        assert_eq!(session.column_state(Backend::Mem0), ColumnState::Processing);
    }

    #[test]
    fn test_editing_follows_focus() {
        let mut session = Session::new("demo");
        assert_eq!(session.focus(), InputField::Query);
        session.push_char('h');
        session.push_char('i');

        session.toggle_focus();
        assert_eq!(session.focus(), InputField::UserId);
        session.pop_char();
        session.push_char('X');

        assert_eq!(session.query, "hi");
        assert_eq!(session.user_id, "demX");
    }

    #[test]
    fn test_empty_memory_list_counts_as_none() {
        let mut response = reply("a");
        response.retrieved_memory = Some(Vec::new());
        let entry = ConversationEntry::from_response("q", &response, Local::now());
        assert!(entry.memories().is_none());

        response.retrieved_memory = Some(vec!["likes tea".to_string()]);
        let entry = ConversationEntry::from_response("q", &response, Local::now());
        assert_eq!(entry.memories(), Some(&["likes tea".to_string()][..]));
    }
}
