use std::io::BufWriter;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::{Map, Value, json};

use super::*;
use crate::args::HttpMethod;
use crate::error::TrackerError;
use crate::test_support::{FailingWriter, SharedBuffer, memory_sink, run_async_test};

fn tagged(category: &str) -> Map<String, Value> {
    let mut metadata = Map::new();
    metadata.insert(CATEGORY_KEY.to_owned(), Value::String(category.to_owned()));
    metadata
}

fn record_with(outcome: Outcome, duration: Duration, request: Option<Value>) -> LogRecord {
    LogRecord {
        timestamp: Utc::now(),
        invocation: Invocation::new(
            "Chat Completion",
            "/v1/chat/completions",
            HttpMethod::Post,
            request,
            tagged("Engine Tests"),
        ),
        outcome,
        metrics: PerformanceMetrics::new(duration),
        violations: Vec::new(),
    }
}

#[test]
fn health_check_success_is_logged_once() -> Result<(), String> {
    let memory = memory_sink(false)?;
    let mut tracker = Tracker::open(
        &memory.sink,
        "Health Check",
        "/health",
        HttpMethod::Get,
        None,
        tagged("Server Health"),
    );
    tracker
        .attach(Outcome::success(200, json!({"status": "healthy"})))
        .map_err(|err| err.to_string())?;
    tracker.finish().map_err(|err| err.to_string())?;

    let entry = memory.single_entry()?;
    let line = memory.file.lines().concat();
    let console = memory.console.contents();
    let expected_prefix =
        "[✅ PASS] Health Check - GET /health | Request: 0B | Response: 200 (20B) | Duration: ";
    if entry.success
        && entry.response.status_code == Some(200)
        && line.contains("\"status_code\":200")
        && console.starts_with(expected_prefix)
        && entry.error.is_none()
    {
        Ok(())
    } else {
        Err(format!("Unexpected output: {} / {}", line, console))
    }
}

#[test]
fn scope_exit_without_outcome_records_no_response() -> Result<(), String> {
    let memory = memory_sink(false)?;
    {
        let _tracker = Tracker::open(
            &memory.sink,
            "Embedding",
            "/v1/embeddings",
            HttpMethod::Post,
            Some(json!({"input": "hello"})),
            Map::new(),
        );
    }

    let entry = memory.single_entry()?;
    let line = memory.file.lines().concat();
    if !entry.success
        && entry.response.status_code.is_none()
        && line.contains("\"status_code\":null")
        && entry.error.as_deref() == Some(reason::NO_RESPONSE)
    {
        Ok(())
    } else {
        Err(format!("Unexpected entry: {}", line))
    }
}

#[test]
fn protocol_failure_reports_http_status() -> Result<(), String> {
    let memory = memory_sink(false)?;
    let mut tracker = Tracker::open(
        &memory.sink,
        "Agents",
        "/agents",
        HttpMethod::Get,
        None,
        Map::new(),
    );
    tracker
        .attach_protocol_failure(503, json!({"error": "overloaded"}), 22)
        .map_err(|err| err.to_string())?;
    drop(tracker);

    let entry = memory.single_entry()?;
    if !entry.success
        && entry.response.status_code == Some(503)
        && entry.response.size_bytes == 22
        && entry.error.as_deref() == Some("HTTP 503")
    {
        Ok(())
    } else {
        Err(format!("Unexpected entry: {:?}", entry))
    }
}

#[test]
fn validation_failure_keeps_status_and_reason() -> Result<(), String> {
    let memory = memory_sink(false)?;
    let mut tracker = Tracker::open(
        &memory.sink,
        "Chat Completion",
        "/v1/chat/completions",
        HttpMethod::Post,
        None,
        Map::new(),
    );
    tracker
        .attach_validation_failure(200, json!({}), 2, "missing field 'choices'")
        .map_err(|err| err.to_string())?;
    tracker.finish().map_err(|err| err.to_string())?;

    let entry = memory.single_entry()?;
    if !entry.success
        && entry.response.status_code == Some(200)
        && entry.error.as_deref() == Some("missing field 'choices'")
    {
        Ok(())
    } else {
        Err(format!("Unexpected entry: {:?}", entry))
    }
}

#[test]
fn tracked_error_is_returned_unchanged() -> Result<(), String> {
    run_async_test(async {
        let memory = memory_sink(false)?;
        let mut tracker = Tracker::open(
            &memory.sink,
            "Document Search",
            "/search",
            HttpMethod::Post,
            None,
            Map::new(),
        );
        let result = tracker
            .track(async { Err::<(), String>("connect: connection refused".to_owned()) })
            .await;
        let state = tracker.state();
        drop(tracker);

        let entry = memory.single_entry()?;
        if result == Err("connect: connection refused".to_owned())
            && state == TrackerState::Excepted
            && !entry.success
            && entry.error.as_deref() == Some("connect: connection refused")
        {
            Ok(())
        } else {
            Err(format!("Unexpected result {:?} / {:?}", result, entry))
        }
    })
}

#[test]
fn error_after_success_becomes_validation_failure() -> Result<(), String> {
    let memory = memory_sink(false)?;
    let mut tracker = Tracker::open(
        &memory.sink,
        "Vector Search",
        "/vector-search",
        HttpMethod::Post,
        None,
        Map::new(),
    );
    tracker
        .attach_success(200, json!({"results": []}), 14)
        .map_err(|err| err.to_string())?;
    tracker.observe_error("results must not be empty");
    let kind = tracker.outcome().map(Outcome::kind);
    drop(tracker);

    let entry = memory.single_entry()?;
    if kind == Some("validation_failure")
        && !entry.success
        && entry.response.status_code == Some(200)
        && entry.error.as_deref() == Some("results must not be empty")
    {
        Ok(())
    } else {
        Err(format!("Unexpected entry: {:?}", entry))
    }
}

#[test]
fn panic_in_scope_is_recorded_and_propagates() -> Result<(), String> {
    let memory = memory_sink(false)?;
    let sink = Arc::clone(&memory.sink);
    let outcome = panic::catch_unwind(AssertUnwindSafe(move || {
        let _tracker = Tracker::open(
            &sink,
            "Parse PDF",
            "/parse-pdf",
            HttpMethod::Post,
            None,
            Map::new(),
        );
        panic::panic_any("fixture generator failed");
    }));
    if outcome.is_ok() {
        return Err("Expected the panic to propagate".to_owned());
    }

    let entry = memory.single_entry()?;
    if !entry.success && entry.error.as_deref() == Some(reason::PANICKED) {
        Ok(())
    } else {
        Err(format!("Unexpected entry: {:?}", entry))
    }
}

#[test]
fn panic_in_spawned_task_is_recorded() -> Result<(), String> {
    run_async_test(async {
        let memory = memory_sink(false)?;
        let sink = Arc::clone(&memory.sink);
        let joined = tokio::spawn(async move {
            let _tracker = Tracker::open(
                &sink,
                "Embedding Generation",
                "/v1/embeddings",
                HttpMethod::Post,
                None,
                Map::new(),
            );
            tokio::task::yield_now().await;
            panic::panic_any("embedding client failed");
        })
        .await;

        let entry = memory.single_entry()?;
        let panicked = joined.as_ref().is_err_and(tokio::task::JoinError::is_panic);
        if panicked && !entry.success && entry.error.as_deref() == Some(reason::PANICKED) {
            Ok(())
        } else {
            Err(format!("Unexpected entry: {:?}", entry))
        }
    })
}

#[test]
fn aborted_task_records_no_response() -> Result<(), String> {
    run_async_test(async {
        let memory = memory_sink(false)?;
        let sink = Arc::clone(&memory.sink);
        let (opened_tx, opened_rx) = tokio::sync::oneshot::channel();
        let handle = tokio::spawn(async move {
            let _tracker = Tracker::open(
                &sink,
                "Chat Completion",
                "/v1/chat/completions",
                HttpMethod::Post,
                None,
                Map::new(),
            );
            let _sent = opened_tx.send(());
            tokio::time::sleep(Duration::from_secs(3_600)).await;
        });
        opened_rx.await.map_err(|err| err.to_string())?;
        handle.abort();
        let joined = handle.await;

        let entry = memory.single_entry()?;
        let cancelled = joined.as_ref().is_err_and(tokio::task::JoinError::is_cancelled);
        if cancelled && !entry.success && entry.error.as_deref() == Some(reason::NO_RESPONSE) {
            Ok(())
        } else {
            Err(format!("Unexpected entry: {:?}", entry))
        }
    })
}

#[test]
fn second_attach_is_rejected_and_first_kept() -> Result<(), String> {
    let memory = memory_sink(false)?;
    let mut tracker = Tracker::open(
        &memory.sink,
        "Health Check",
        "/health",
        HttpMethod::Get,
        None,
        Map::new(),
    );
    tracker
        .attach_success(200, json!({"status": "healthy"}), 20)
        .map_err(|err| err.to_string())?;
    let second = tracker.attach_transport_failure(reason::TIMEOUT);
    tracker.finish().map_err(|err| err.to_string())?;

    let entry = memory.single_entry()?;
    let expected = TrackerError::OutcomeAlreadyAttached {
        test_name: "Health Check".to_owned(),
        kept: "success",
        rejected: "transport_failure",
    };
    let error = entry.error.clone().unwrap_or_default();
    if second == Err(expected)
        && entry.response.status_code == Some(200)
        && !entry.success
        && error.contains("already attached")
    {
        Ok(())
    } else {
        Err(format!("Unexpected result {:?} / {:?}", second, entry))
    }
}

#[test]
fn finalize_twice_writes_one_record() -> Result<(), String> {
    let memory = memory_sink(false)?;
    let mut tracker = Tracker::open(
        &memory.sink,
        "Metrics",
        "/metrics",
        HttpMethod::Get,
        None,
        Map::new(),
    );
    tracker
        .attach(Outcome::success(200, Value::String("up 1".to_owned())))
        .map_err(|err| err.to_string())?;
    tracker.finalize().map_err(|err| err.to_string())?;
    let again = tracker.finalize();
    let late_attach = tracker.attach_transport_failure(reason::TIMEOUT);
    drop(tracker);

    let lines = memory.file.lines();
    let expected = Err(TrackerError::AlreadyFinalized {
        test_name: "Metrics".to_owned(),
    });
    if lines.len() == 1 && again == expected && late_attach == expected {
        Ok(())
    } else {
        Err(format!("Expected one record, got {}", lines.len()))
    }
}

#[test]
fn api_key_is_redacted_in_both_outputs() -> Result<(), String> {
    let memory = memory_sink(true)?;
    let mut tracker = Tracker::open(
        &memory.sink,
        "Upload",
        "/documents",
        HttpMethod::Post,
        Some(json!({"api_key": "sk-1234567890abcdef", "title": "notes"})),
        Map::new(),
    );
    tracker
        .attach(Outcome::success(201, json!({"id": "doc-1"})))
        .map_err(|err| err.to_string())?;
    tracker.finish().map_err(|err| err.to_string())?;

    let entry = memory.single_entry()?;
    let file = memory.file.contents();
    let console = memory.console.contents();
    let payload = entry.request.payload.get("api_key").cloned();
    if payload == Some(Value::String(REDACTED.to_owned()))
        && !file.contains("sk-1234567890abcdef")
        && !console.contains("sk-1234567890abcdef")
        && console.contains("📤 Request Payload:")
        && entry.request.size_bytes == 49
    {
        Ok(())
    } else {
        Err(format!("Secret leaked or size wrong: {}", file))
    }
}

#[test]
fn large_text_body_is_truncated_with_original_size() -> Result<(), String> {
    let memory = memory_sink(false)?;
    let mut tracker = Tracker::open(
        &memory.sink,
        "Parse DOCX",
        "/parse-docx",
        HttpMethod::Post,
        None,
        Map::new(),
    );
    tracker
        .attach(Outcome::success(200, Value::String("x".repeat(10_240))))
        .map_err(|err| err.to_string())?;
    tracker.finish().map_err(|err| err.to_string())?;

    let entry = memory.single_entry()?;
    let data = entry.response.data.as_str().unwrap_or_default();
    let expected_len = MAX_LOGGED_STRING_BYTES.saturating_add("... [truncated 10240 bytes]".len());
    if entry.response.size_bytes == 10_240
        && data.ends_with("... [truncated 10240 bytes]")
        && data.len() == expected_len
    {
        Ok(())
    } else {
        Err(format!(
            "Unexpected truncation: size {} len {}",
            entry.response.size_bytes,
            data.len()
        ))
    }
}

#[test]
fn sanitizing_sanitized_output_changes_nothing() -> Result<(), String> {
    let value = json!({
        "password": "hunter2",
        "nested": [{"Authorization": "Bearer abc"}, {"text": "é".repeat(3_000)}],
        "count": 3,
    });
    let once = sanitize(&value);
    let twice = sanitize(&once);
    if once == twice {
        Ok(())
    } else {
        Err("Second sanitize pass changed the value".to_owned())
    }
}

#[test]
fn forged_truncation_marker_is_still_capped() -> Result<(), String> {
    let forged = format!("... [truncated {} bytes]", "7".repeat(100_000));
    let sanitized = sanitize(&json!({ "data": forged }));
    let data = sanitized
        .get("data")
        .and_then(Value::as_str)
        .ok_or_else(|| "Missing data".to_owned())?;
    let bound = MAX_LOGGED_STRING_BYTES
        .saturating_add("... [truncated ".len())
        .saturating_add(20)
        .saturating_add(" bytes]".len());
    if data.len() <= bound && data.ends_with("... [truncated 100022 bytes]") {
        Ok(())
    } else {
        Err(format!("Forged marker kept {} bytes", data.len()))
    }
}

#[test]
fn requests_per_second_is_null_for_zero_duration() -> Result<(), String> {
    let zero = record_with(Outcome::success(200, json!({})), Duration::ZERO, None).to_entry();
    let quarter = record_with(
        Outcome::success(200, json!({})),
        Duration::from_millis(250),
        None,
    )
    .to_entry();

    let line = render_json_line(&zero).map_err(|err| err.to_string())?;
    let rps = quarter
        .performance
        .requests_per_second
        .map(|value| format!("{:.3}", value));
    if line.contains("\"requests_per_second\":null") && rps.as_deref() == Some("4.000") {
        Ok(())
    } else {
        Err(format!("Unexpected rps: {} / {:?}", line, rps))
    }
}

#[test]
fn console_line_matches_documented_layout() -> Result<(), String> {
    let record = record_with(
        Outcome::ProtocolFailure {
            status_code: 500,
            body: json!({}),
            size_bytes: 2,
        },
        Duration::from_millis(1_500),
        None,
    );
    let rendering = render_console(&record.to_entry(), false);
    let expected = "[❌ FAIL] Chat Completion - POST /v1/chat/completions | Request: 0B | \
                    Response: 500 (2B) | Duration: 1.500s | Error: HTTP 500";
    if rendering.line == expected && rendering.details.is_empty() {
        Ok(())
    } else {
        Err(format!("Unexpected console line: {}", rendering.line))
    }
}

#[test]
fn failed_records_show_error_response_block() -> Result<(), String> {
    let record = record_with(
        Outcome::ProtocolFailure {
            status_code: 422,
            body: json!({"detail": "bad model"}),
            size_bytes: 22,
        },
        Duration::from_millis(10),
        Some(json!({"model": "qwen3-0.6b"})),
    );
    let rendering = render_console(&record.to_entry(), true);
    let blocks = rendering.details.join("\n");
    if blocks.contains("📤 Request Payload:")
        && blocks.contains("📥 Error Response Data:")
        && blocks.contains("bad model")
    {
        Ok(())
    } else {
        Err(format!("Unexpected detail blocks: {}", blocks))
    }
}

#[test]
fn fifty_concurrent_trackers_write_fifty_lines() -> Result<(), String> {
    run_async_test(async {
        let memory = memory_sink(true)?;
        let mut handles = Vec::new();
        for index in 0_u16..50 {
            let sink = Arc::clone(&memory.sink);
            handles.push(tokio::spawn(async move {
                let mut tracker = Tracker::open(
                    &sink,
                    format!("Concurrent Embedding {}", index),
                    "/v1/embeddings",
                    HttpMethod::Post,
                    Some(json!({"input": format!("text {}", index)})),
                    tagged("Concurrency"),
                );
                tokio::task::yield_now().await;
                let attached = if index % 5 == 0 {
                    tracker.attach_transport_failure(reason::TIMEOUT)
                } else {
                    tracker.attach(Outcome::success(200, json!({"data": [index]})))
                };
                attached.map_err(|err| err.to_string())?;
                tracker.finish().map_err(|err| err.to_string())
            }));
        }
        for handle in handles {
            handle
                .await
                .map_err(|err| format!("Task failed: {}", err))??;
        }

        let entries = memory.entries()?;
        let summary = memory.sink.summary();
        let tally = summary.categories.get("Concurrency").cloned().unwrap_or_default();
        if entries.len() == 50
            && summary.total == 50
            && summary.passed.saturating_add(summary.failed) == 50
            && summary.failed == 10
            && tally.total == 50
        {
            Ok(())
        } else {
            Err(format!(
                "Expected 50 records, got {} lines and {} counted",
                entries.len(),
                summary.total
            ))
        }
    })
}

#[test]
fn file_failure_is_reported_once_and_run_continues() -> Result<(), String> {
    let console = SharedBuffer::default();
    let sink = Arc::new(
        TelemetrySink::with_writers(
            Box::new(console.clone()),
            Some(Box::new(FailingWriter)),
            false,
        )
        .map_err(|err| err.to_string())?,
    );
    for index in 0..3 {
        let mut tracker = Tracker::open(
            &sink,
            format!("Health Check {}", index),
            "/health",
            HttpMethod::Get,
            None,
            Map::new(),
        );
        tracker
            .attach(Outcome::success(200, json!({"status": "healthy"})))
            .map_err(|err| err.to_string())?;
        tracker.finish().map_err(|err| err.to_string())?;
    }

    let output = console.contents();
    let notices = output.matches("Telemetry log write failed").count();
    let verdicts = output.matches("[✅ PASS]").count();
    let summary = sink.summary();
    if notices == 1 && verdicts == 3 && summary.total == 3 && summary.sink_errors == 3 {
        Ok(())
    } else {
        Err(format!(
            "Expected one notice and three verdicts, got {} and {}",
            notices, verdicts
        ))
    }
}

#[test]
fn buffered_file_failure_reaches_the_console() -> Result<(), String> {
    let console = SharedBuffer::default();
    let sink = Arc::new(
        TelemetrySink::with_writers(
            Box::new(console.clone()),
            Some(Box::new(BufWriter::new(FailingWriter))),
            false,
        )
        .map_err(|err| err.to_string())?,
    );
    let mut tracker = Tracker::open(
        &sink,
        "Health Check",
        "/health",
        HttpMethod::Get,
        None,
        Map::new(),
    );
    tracker
        .attach(Outcome::success(200, json!({"status": "healthy"})))
        .map_err(|err| err.to_string())?;
    tracker.finish().map_err(|err| err.to_string())?;
    let after_record = sink.summary().sink_errors;

    let summary = crate::report::finalize(&sink);
    let notices = console
        .contents()
        .matches("Telemetry log write failed")
        .count();
    if after_record == 1 && notices == 1 && summary.sink_errors == 2 && summary.total == 1 {
        Ok(())
    } else {
        Err(format!(
            "Expected one notice, got {} (sink_errors {} then {})",
            notices, after_record, summary.sink_errors
        ))
    }
}

fn write_one(config: &SinkConfig, name: &str) -> Result<(), String> {
    let sink = Arc::new(TelemetrySink::open(config).map_err(|err| err.to_string())?);
    let mut tracker = Tracker::open(&sink, name, "/health", HttpMethod::Get, None, Map::new());
    tracker
        .attach(Outcome::success(200, json!({"status": "healthy"})))
        .map_err(|err| err.to_string())?;
    tracker.finish().map_err(|err| err.to_string())?;
    sink.flush().map_err(|err| err.to_string())
}

#[test]
fn log_file_is_appended_across_runs() -> Result<(), String> {
    let dir = tempfile::tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = dir.path().join("logs").join("endpoint_tests.log");
    let mut config = SinkConfig {
        log_path: Some(path.clone()),
        truncate: false,
        details: false,
    };
    write_one(&config, "First Run")?;
    write_one(&config, "Second Run")?;
    let appended = std::fs::read_to_string(&path)
        .map_err(|err| format!("Failed to read log: {}", err))?;

    config.truncate = true;
    write_one(&config, "Fresh Run")?;
    let truncated = std::fs::read_to_string(&path)
        .map_err(|err| format!("Failed to read log: {}", err))?;

    if appended.lines().count() == 2
        && appended.contains("First Run")
        && truncated.lines().count() == 1
        && truncated.contains("Fresh Run")
    {
        Ok(())
    } else {
        Err(format!("Unexpected log contents: {}", appended))
    }
}

#[test]
fn suite_banners_frame_records() -> Result<(), String> {
    let memory = memory_sink(false)?;
    memory
        .sink
        .begin_suite("Engine Tests", Some("Completion and embedding endpoints"));
    drop(Tracker::open(
        &memory.sink,
        "Embedding",
        "/v1/embeddings",
        HttpMethod::Post,
        None,
        Map::new(),
    ));
    memory.sink.end_suite("Engine Tests");

    let lines = memory.console.lines();
    let start = lines
        .iter()
        .position(|line| line.contains("STARTING TEST SUITE: Engine Tests"));
    let verdict = lines.iter().position(|line| line.starts_with("[❌ FAIL]"));
    let end = lines
        .iter()
        .position(|line| line.contains("COMPLETED TEST SUITE: Engine Tests"));
    if let (Some(opened), Some(recorded), Some(closed)) = (start, verdict, end)
        && opened < recorded
        && recorded < closed
    {
        Ok(())
    } else {
        Err(format!("Banners out of order: {:?}", lines))
    }
}
