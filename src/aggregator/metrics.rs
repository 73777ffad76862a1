//! Prometheus text rendering
//!
//! ## Metrics Exposed
//!
//! - `postman_lifetime_{runs,iterations,requests}_total` - counters since start
//! - `postman_stats_*` - gauges for the last run's aggregate stats and timings
//! - `postman_request_*` - per-execution gauges, labeled with `request_name`
//!   and `iteration` (only with request metrics enabled)
//!
//! Every sample carries a `collection` label.

use std::fmt::{self, Display, Write};

use super::ViewError;
use super::state::AggregateSnapshot;
use crate::runner::Execution;
use crate::runner::summary::Response;

/// Content type of the rendered metrics
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

const PREFIX: &str = "postman";

#[derive(Debug, Clone, Copy)]
enum Kind {
    Counter,
    Gauge,
}

impl Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Counter => f.write_str("counter"),
            Kind::Gauge => f.write_str("gauge"),
        }
    }
}

/// Escape a label value for the text exposition format
fn escape_label(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            c => escaped.push(c),
        }
    }
    escaped
}

struct MetricsWriter<'a> {
    out: String,
    collection: &'a str,
}

impl MetricsWriter<'_> {
    fn header(&mut self, name: &str, kind: Kind) -> fmt::Result {
        writeln!(self.out, "# TYPE {PREFIX}_{name} {kind}")
    }

    fn sample(
        &mut self,
        name: &str,
        value: impl Display,
        labels: &[(&str, String)],
    ) -> fmt::Result {
        write!(self.out, "{PREFIX}_{name}{{")?;
        for (key, label) in labels {
            write!(self.out, "{key}=\"{}\",", escape_label(label))?;
        }
        writeln!(
            self.out,
            "collection=\"{}\"}} {value}",
            escape_label(self.collection)
        )
    }

    /// Single-sample family
    fn write(&mut self, name: &str, kind: Kind, value: impl Display) -> fmt::Result {
        self.header(name, kind)?;
        self.sample(name, value, &[])?;
        writeln!(self.out)
    }

    fn gauge(&mut self, name: &str, value: impl Display) -> fmt::Result {
        self.write(name, Kind::Gauge, value)
    }

    /// One gauge family with a sample per execution that has a response
    ///
    /// The `# TYPE` line is written once, and only if some execution yields
    /// a value.
    fn request_family<V: Display>(
        &mut self,
        name: &str,
        executions: &[Execution],
        extract: impl Fn(&Execution, &Response) -> Option<V>,
    ) -> fmt::Result {
        let mut typed = false;
        for execution in executions {
            let Some(response) = &execution.response else {
                continue;
            };
            let Some(value) = extract(execution, response) else {
                continue;
            };
            if !typed {
                self.header(name, Kind::Gauge)?;
                typed = true;
            }
            let labels = [
                ("request_name", execution.item.name.clone()),
                ("iteration", execution.cursor.iteration.to_string()),
            ];
            self.sample(name, value, &labels)?;
        }
        if typed {
            writeln!(self.out)?;
        }
        Ok(())
    }

    fn requests(&mut self, executions: &[Execution]) -> fmt::Result {
        self.request_family("request_status_code", executions, |_, r| {
            (r.code != 0).then_some(r.code)
        })?;
        self.request_family("request_resp_time", executions, |_, r| {
            (r.response_time != 0.0).then_some(r.response_time)
        })?;
        self.request_family("request_resp_size", executions, |_, r| {
            (r.response_size != 0).then_some(r.response_size)
        })?;
        self.request_family("request_status_ok", executions, |_, r| {
            r.status
                .as_deref()
                .filter(|s| !s.is_empty())
                .map(|s| u8::from(s == "OK"))
        })?;
        self.request_family("request_failed_assertions", executions, |e, _| {
            Some(e.failed_assertions().count())
        })?;
        self.request_family("request_total_assertions", executions, |e, _| {
            Some(e.total_assertions())
        })
    }
}

/// Render the snapshot as Prometheus text
pub fn render_metrics(
    snapshot: &AggregateSnapshot,
    request_metrics: bool,
) -> Result<String, ViewError> {
    let summary = snapshot.last_summary.as_ref().ok_or(ViewError::NoRunData)?;
    let stats = &summary.run.stats;
    let timings = &summary.run.timings;

    let mut w = MetricsWriter {
        out: String::new(),
        collection: &snapshot.collection_name,
    };

    w.write("lifetime_runs_total", Kind::Counter, snapshot.lifetime_runs)?;
    w.write("lifetime_iterations_total", Kind::Counter, snapshot.lifetime_iterations)?;
    w.write("lifetime_requests_total", Kind::Counter, snapshot.lifetime_requests)?;

    w.gauge("stats_iterations_total", stats.iterations.total)?;
    w.gauge("stats_iterations_failed", stats.iterations.failed)?;
    w.gauge("stats_requests_total", stats.requests.total)?;
    w.gauge("stats_requests_failed", stats.requests.failed)?;
    w.gauge("stats_tests_total", stats.tests.total)?;
    w.gauge("stats_tests_failed", stats.tests.failed)?;
    w.gauge("stats_test_scripts_total", stats.test_scripts.total)?;
    w.gauge("stats_test_scripts_failed", stats.test_scripts.failed)?;
    w.gauge("stats_assertions_total", stats.assertions.total)?;
    w.gauge("stats_assertions_failed", stats.assertions.failed)?;
    w.gauge("stats_transfered_bytes_total", summary.run.transfers.response_total)?;
    w.gauge("stats_resp_avg", timings.response_average)?;
    w.gauge("stats_resp_min", timings.response_min)?;
    w.gauge("stats_resp_max", timings.response_max)?;

    if request_metrics {
        w.requests(&summary.run.executions)?;
    }

    Ok(w.out)
}
