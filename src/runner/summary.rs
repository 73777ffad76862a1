//! Run summary model
//!
//! Mirrors the newman JSON reporter export. Only the fields the aggregator
//! reads are typed; everything else rides along in `extra` maps so the
//! persisted debug snapshot keeps the full document.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::collection::CollectionDocument;

/// Replacement for payloads stripped from stored summaries
pub const REDACTED: &str = "*REMOVED*";

/// Headers checked, in order, for a request correlation id
const REQUEST_ID_HEADERS: [&str; 2] = ["request-id", "x-request-id"];

/// Result of one collection run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub collection: CollectionDocument,
    pub run: RunDetails,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunDetails {
    #[serde(default)]
    pub stats: RunStats,
    #[serde(default)]
    pub timings: RunTimings,
    #[serde(default)]
    pub transfers: Transfers,
    #[serde(default)]
    pub executions: Vec<Execution>,
    #[serde(default)]
    pub failures: Vec<Failure>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `total` / `pending` / `failed` triple used by every stats entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatCounts {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub pending: u64,
    #[serde(default)]
    pub failed: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStats {
    #[serde(default)]
    pub iterations: StatCounts,
    #[serde(default)]
    pub items: StatCounts,
    #[serde(default)]
    pub scripts: StatCounts,
    #[serde(default)]
    pub prerequests: StatCounts,
    #[serde(default)]
    pub requests: StatCounts,
    #[serde(default)]
    pub tests: StatCounts,
    #[serde(default)]
    pub assertions: StatCounts,
    #[serde(default)]
    pub test_scripts: StatCounts,
    #[serde(default)]
    pub prerequest_scripts: StatCounts,
}

/// Response timing aggregates in milliseconds, run bounds as epoch millis
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunTimings {
    #[serde(default)]
    pub response_average: f64,
    #[serde(default)]
    pub response_min: f64,
    #[serde(default)]
    pub response_max: f64,
    #[serde(default)]
    pub response_sd: f64,
    #[serde(default)]
    pub started: u64,
    #[serde(default)]
    pub completed: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transfers {
    #[serde(default)]
    pub response_total: u64,
}

/// One request execution
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Execution {
    #[serde(default)]
    pub cursor: Cursor,
    #[serde(default)]
    pub item: ExecutedItem,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Response>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_error: Option<Value>,
    #[serde(default)]
    pub assertions: Vec<Assertion>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cursor {
    #[serde(default)]
    pub iteration: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutedItem {
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub response_time: f64,
    #[serde(default)]
    pub response_size: u64,
    #[serde(default)]
    pub header: Vec<Header>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Header {
    pub key: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Assertion {
    #[serde(default)]
    pub assertion: String,
    #[serde(default)]
    pub skipped: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Error block used by failed assertions and run failures
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ErrorDetail {
    fn redact(&mut self) {
        self.message = Some(REDACTED.to_string());
        self.stack = Some(REDACTED.to_string());
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Failure {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RunSummary {
    pub fn collection_name(&self) -> &str {
        self.collection.name()
    }

    /// Wall-clock duration of the run in milliseconds
    pub fn duration_ms(&self) -> u64 {
        self.run
            .timings
            .completed
            .saturating_sub(self.run.timings.started)
    }

    /// Strip response bodies and assertion/failure error text
    pub fn redact(&mut self) {
        for execution in &mut self.run.executions {
            if let Some(response) = execution.response.as_mut() {
                response.stream = Some(Value::String(REDACTED.to_string()));
            }
            for error in execution
                .assertions
                .iter_mut()
                .filter_map(|a| a.error.as_mut())
            {
                error.redact();
            }
        }

        for error in self.run.failures.iter_mut().filter_map(|f| f.error.as_mut()) {
            error.redact();
        }
    }
}

impl Execution {
    /// Correlation id from the response headers, if any
    pub fn request_id(&self) -> Option<&str> {
        let response = self.response.as_ref()?;
        REQUEST_ID_HEADERS.iter().find_map(|name| {
            response
                .header
                .iter()
                .find(|h| h.key.eq_ignore_ascii_case(name))
                .map(|h| h.value.as_str())
        })
    }

    pub fn failed_assertions(&self) -> impl Iterator<Item = (&Assertion, &ErrorDetail)> {
        self.assertions
            .iter()
            .filter_map(|a| a.error.as_ref().map(|e| (a, e)))
    }

    pub fn total_assertions(&self) -> usize {
        self.assertions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use probekeeper_testkit::fixtures::{ExecutionBuilder, SummaryBuilder};

    fn sample() -> RunSummary {
        let value = SummaryBuilder::new("Pets")
            .execution(
                ExecutionBuilder::new("List pets")
                    .response(200, "OK", 42, 512)
                    .header("X-Request-Id", "req-1")
                    .passed_assertion("status is 200")
                    .failed_assertion("has items", "expected [] to not be empty"),
            )
            .execution(ExecutionBuilder::new("Broken").request_error("connect ECONNREFUSED"))
            .timings(1_000, 1_750)
            .build();
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_parse_newman_export() {
        let summary = sample();
        assert_eq!(summary.collection_name(), "Pets");
        assert_eq!(summary.run.stats.requests.total, 2);
        assert_eq!(summary.run.stats.assertions.failed, 1);
        assert_eq!(summary.run.transfers.response_total, 512);
        assert_eq!(summary.duration_ms(), 750);

        let first = &summary.run.executions[0];
        assert_eq!(first.item.name, "List pets");
        assert_eq!(first.response.as_ref().unwrap().code, 200);
        assert_eq!(first.failed_assertions().count(), 1);
        assert!(summary.run.executions[1].response.is_none());
        assert!(summary.run.executions[1].request_error.is_some());
    }

    #[test]
    fn test_request_id_lookup_is_case_insensitive() {
        let summary = sample();
        assert_eq!(summary.run.executions[0].request_id(), Some("req-1"));
        assert_eq!(summary.run.executions[1].request_id(), None);
    }

    #[test]
    fn test_redact() {
        let mut summary = sample();
        summary.redact();

        let first = &summary.run.executions[0];
        assert_eq!(
            first.response.as_ref().unwrap().stream,
            Some(Value::String(REDACTED.into()))
        );
        let (_, error) = first.failed_assertions().next().unwrap();
        assert_eq!(error.message.as_deref(), Some(REDACTED));
        assert_eq!(error.stack.as_deref(), Some(REDACTED));
        assert_eq!(error.test.as_deref(), Some("has items"));

        let failure = summary.run.failures[0].error.as_ref().unwrap();
        assert_eq!(failure.message.as_deref(), Some(REDACTED));
        assert_eq!(failure.stack.as_deref(), Some(REDACTED));

        let text = serde_json::to_string(&summary).unwrap();
        assert!(!text.contains("expected [] to not be empty"));
    }

    #[test]
    fn test_unknown_fields_survive() {
        let summary = sample();
        let value = serde_json::to_value(&summary).unwrap();
        assert!(value.get("environment").is_some());
        assert_eq!(value["run"]["executions"][0]["cursor"]["length"], 1);
        assert_eq!(value["run"]["stats"]["testScripts"]["total"], 2);
    }
}
