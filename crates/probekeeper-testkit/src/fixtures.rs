//! Document builders
//!
//! Shapes follow what the external tools actually emit: Postman collection
//! v2.1 for collections and the newman JSON reporter for run summaries.

use serde_json::{Value, json};
use std::path::{Path, PathBuf};

/// Collection schema URL written into generated fixtures
pub const COLLECTION_SCHEMA: &str =
    "https://schema.getpostman.com/json/collection/v2.1.0/collection.json";

/// Builder for Postman collections
#[derive(Debug, Clone)]
pub struct CollectionBuilder {
    name: String,
    items: Vec<Value>,
}

impl CollectionBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            items: Vec::new(),
        }
    }

    /// Add a request item
    pub fn request(mut self, name: &str, method: &str, url: &str) -> Self {
        self.items.push(json!({
            "name": name,
            "request": {
                "method": method,
                "header": [],
                "url": { "raw": url }
            },
            "event": [{
                "listen": "test",
                "script": { "exec": ["pm.test(\"Status code is 200\", () => pm.response.to.have.status(200));"] }
            }]
        }));
        self
    }

    /// Add a GET request item
    pub fn get(self, name: &str, url: &str) -> Self {
        self.request(name, "GET", url)
    }

    pub fn build(self) -> Value {
        json!({
            "info": {
                "_postman_id": format!("{}-id", self.name),
                "name": self.name,
                "schema": COLLECTION_SCHEMA
            },
            "item": self.items
        })
    }
}

/// Builder for Postman environments
#[derive(Debug, Clone)]
pub struct EnvironmentBuilder {
    name: String,
    values: Vec<Value>,
}

impl EnvironmentBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
        }
    }

    pub fn value(mut self, key: &str, value: &str) -> Self {
        self.values
            .push(json!({ "key": key, "value": value, "enabled": true }));
        self
    }

    pub fn build(self) -> Value {
        json!({ "name": self.name, "values": self.values })
    }
}

/// Builder for a single request execution inside a run summary
#[derive(Debug, Clone)]
pub struct ExecutionBuilder {
    name: String,
    iteration: u64,
    response: Option<Value>,
    request_error: Option<Value>,
    assertions: Vec<Value>,
}

impl ExecutionBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            iteration: 0,
            response: None,
            request_error: None,
            assertions: Vec::new(),
        }
    }

    pub fn iteration(mut self, iteration: u64) -> Self {
        self.iteration = iteration;
        self
    }

    /// Record a response with the given code, status text, time (ms) and size (bytes)
    pub fn response(mut self, code: u16, status: &str, time_ms: u64, size: u64) -> Self {
        self.response = Some(json!({
            "id": format!("{}-response", self.name),
            "status": status,
            "code": code,
            "header": [{ "key": "Content-Type", "value": "application/json" }],
            "stream": { "type": "Buffer", "data": [123, 125] },
            "cookie": [],
            "responseTime": time_ms,
            "responseSize": size
        }));
        self
    }

    /// Add a response header; call after `response`
    pub fn header(mut self, key: &str, value: &str) -> Self {
        if let Some(headers) = self
            .response
            .as_mut()
            .and_then(|r| r.get_mut("header"))
            .and_then(Value::as_array_mut)
        {
            headers.push(json!({ "key": key, "value": value }));
        }
        self
    }

    /// Mark the request as failed at transport level (no response)
    pub fn request_error(mut self, message: &str) -> Self {
        self.response = None;
        self.request_error = Some(json!({
            "code": "ECONNREFUSED",
            "message": message
        }));
        self
    }

    pub fn passed_assertion(mut self, name: &str) -> Self {
        self.assertions
            .push(json!({ "assertion": name, "skipped": false }));
        self
    }

    pub fn failed_assertion(mut self, name: &str, message: &str) -> Self {
        self.assertions.push(json!({
            "assertion": name,
            "skipped": false,
            "error": {
                "name": "AssertionError",
                "index": self.assertions.len(),
                "test": name,
                "message": message,
                "stack": format!("AssertionError: {message}\n   at Object.eval test.js:1:1")
            }
        }));
        self
    }

    fn failed_assertions(&self) -> Vec<&Value> {
        self.assertions
            .iter()
            .filter(|a| a.get("error").is_some())
            .collect()
    }

    pub fn build(self) -> Value {
        let mut execution = json!({
            "id": format!("{}-execution", self.name),
            "cursor": { "iteration": self.iteration, "position": 0, "length": 1 },
            "item": { "id": format!("{}-item", self.name), "name": self.name },
            "request": { "method": "GET" },
            "assertions": self.assertions
        });
        if let Some(response) = self.response {
            execution["response"] = response;
        }
        if let Some(error) = self.request_error {
            execution["requestError"] = error;
        }
        execution
    }
}

/// Builder for newman run summaries
#[derive(Debug, Clone)]
pub struct SummaryBuilder {
    collection_name: String,
    iterations: Option<(u64, u64)>,
    executions: Vec<ExecutionBuilder>,
    started: u64,
    completed: u64,
}

impl SummaryBuilder {
    pub fn new(collection_name: impl Into<String>) -> Self {
        Self {
            collection_name: collection_name.into(),
            iterations: None,
            executions: Vec::new(),
            started: 1_700_000_000_000,
            completed: 1_700_000_000_250,
        }
    }

    /// Override the iteration stats (defaults to 1 total, 0 failed)
    pub fn iterations(mut self, total: u64, failed: u64) -> Self {
        self.iterations = Some((total, failed));
        self
    }

    pub fn execution(mut self, execution: ExecutionBuilder) -> Self {
        self.executions.push(execution);
        self
    }

    pub fn timings(mut self, started: u64, completed: u64) -> Self {
        self.started = started;
        self.completed = completed;
        self
    }

    pub fn build(self) -> Value {
        let (iterations_total, iterations_failed) = self.iterations.unwrap_or((1, 0));
        let requests_total = self.executions.len() as u64;
        let requests_failed = self
            .executions
            .iter()
            .filter(|e| e.request_error.is_some())
            .count() as u64;
        let assertions_total: usize = self.executions.iter().map(|e| e.assertions.len()).sum();
        let failed: Vec<(String, Value)> = self
            .executions
            .iter()
            .flat_map(|e| {
                e.failed_assertions()
                    .into_iter()
                    .map(|a| (e.name.clone(), a["error"].clone()))
            })
            .collect();

        let times: Vec<u64> = self
            .executions
            .iter()
            .filter_map(|e| e.response.as_ref())
            .filter_map(|r| r["responseTime"].as_u64())
            .collect();
        let transferred: u64 = self
            .executions
            .iter()
            .filter_map(|e| e.response.as_ref())
            .filter_map(|r| r["responseSize"].as_u64())
            .sum();
        let (min, max, avg) = if times.is_empty() {
            (0, 0, 0.0)
        } else {
            let sum: u64 = times.iter().sum();
            (
                *times.iter().min().unwrap_or(&0),
                *times.iter().max().unwrap_or(&0),
                sum as f64 / times.len() as f64,
            )
        };

        let failures: Vec<Value> = failed
            .iter()
            .map(|(name, error)| {
                json!({
                    "error": error,
                    "at": "assertion:0 in test-script",
                    "source": { "name": name },
                    "parent": { "name": self.collection_name }
                })
            })
            .collect();

        let collection = CollectionBuilder::new(self.collection_name.clone());
        let executions: Vec<Value> = self
            .executions
            .into_iter()
            .map(ExecutionBuilder::build)
            .collect();

        json!({
            "collection": collection.build(),
            "environment": { "name": "", "values": [] },
            "run": {
                "stats": {
                    "iterations": { "total": iterations_total, "pending": 0, "failed": iterations_failed },
                    "items": { "total": requests_total, "pending": 0, "failed": 0 },
                    "scripts": { "total": requests_total, "pending": 0, "failed": 0 },
                    "prerequests": { "total": requests_total, "pending": 0, "failed": 0 },
                    "requests": { "total": requests_total, "pending": 0, "failed": requests_failed },
                    "tests": { "total": requests_total, "pending": 0, "failed": 0 },
                    "assertions": { "total": assertions_total, "pending": 0, "failed": failed.len() },
                    "testScripts": { "total": requests_total, "pending": 0, "failed": 0 },
                    "prerequestScripts": { "total": 0, "pending": 0, "failed": 0 }
                },
                "timings": {
                    "responseAverage": avg,
                    "responseMin": min,
                    "responseMax": max,
                    "responseSd": 0,
                    "started": self.started,
                    "completed": self.completed
                },
                "executions": executions,
                "transfers": { "responseTotal": transferred },
                "failures": failures,
                "error": null
            }
        })
    }
}

/// Write `value` as JSON to `dir/name` and return the path
pub fn write_json(dir: &Path, name: &str, value: &Value) -> PathBuf {
    let path = dir.join(name);
    let content = serde_json::to_vec_pretty(value).expect("fixture serializes");
    std::fs::write(&path, content).expect("fixture written");
    path
}
