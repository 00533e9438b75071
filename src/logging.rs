//! Structured JSON-lines logging.
//!
//! Every record carries a run id, a sequence number and a domain so a run's
//! load, cache and metrics activity can be filtered and replayed. Records go
//! to stderr and, when `LOG_DIR` is set, to per-run files under
//! `LOG_DIR/<run_id>/`.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};
use std::time::Instant;

// =============================================================================
// Log Levels
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
}

impl Level {
    pub fn from_env() -> Self {
        Self::parse(std::env::var("LOG_LEVEL").as_deref().unwrap_or("info"))
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "trace" => Level::Trace,
            "debug" => Level::Debug,
            "warn" => Level::Warn,
            "error" => Level::Error,
            _ => Level::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
        }
    }
}

// =============================================================================
// Log Domains
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Load,    // Source fetch and CSV parsing
    Cache,   // Loader memoization
    Metrics, // Derived metric summaries
    Report,  // Report assembly and output
    System,  // Startup, shutdown
    Profile, // Timing scopes
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Load => "load",
            Domain::Cache => "cache",
            Domain::Metrics => "metrics",
            Domain::Report => "report",
            Domain::System => "system",
            Domain::Profile => "profile",
        }
    }

    pub fn is_enabled(&self) -> bool {
        // LOG_DOMAINS is a comma-separated list or "all"
        match std::env::var("LOG_DOMAINS").as_deref() {
            Ok("all") | Err(_) => true,
            Ok(domains) => domains.split(',').any(|d| d.trim() == self.as_str()),
        }
    }
}

// =============================================================================
// Run context
// =============================================================================

static LOG_SEQ: AtomicU64 = AtomicU64::new(0);
static RUN_CONTEXT: OnceLock<RunContext> = OnceLock::new();

fn next_seq() -> u64 {
    LOG_SEQ.fetch_add(1, Ordering::SeqCst)
}

type Sink = Option<Mutex<BufWriter<File>>>;

#[derive(Debug)]
struct RunContext {
    run_id: String,
    stdout: bool,
    events: Sink,
    trace: Sink,
    metrics: Sink,
}

fn open_sink(run_dir: &Path, name: &str) -> Sink {
    match File::create(run_dir.join(name)) {
        Ok(f) => Some(Mutex::new(BufWriter::new(f))),
        Err(err) => {
            eprintln!("[log] failed to create {}: {}", name, err);
            None
        }
    }
}

fn ensure_run_context() -> &'static RunContext {
    RUN_CONTEXT.get_or_init(|| {
        let run_id = std::env::var("RUN_ID")
            .unwrap_or_else(|_| format!("r-{}-{}", ts_epoch_ms(), process::id()));
        let stdout = std::env::var("LOG_STDOUT")
            .map(|v| !matches!(v.to_lowercase().as_str(), "0" | "false" | "no"))
            .unwrap_or(true);

        // No LOG_DIR means stdout only.
        let Ok(base) = std::env::var("LOG_DIR") else {
            return RunContext {
                run_id,
                stdout,
                events: None,
                trace: None,
                metrics: None,
            };
        };
        let mut run_dir = PathBuf::from(base);
        run_dir.push(&run_id);
        if let Err(err) = create_dir_all(&run_dir) {
            eprintln!("[log] failed to create run dir: {}", err);
        }
        let _ = std::fs::write(
            run_dir.join("manifest.json"),
            json!({
                "run_id": run_id,
                "ts": ts_now(),
                "pid": process::id(),
                "log_dir": run_dir.to_string_lossy(),
            })
            .to_string(),
        );

        RunContext {
            events: open_sink(&run_dir, "events.jsonl"),
            trace: open_sink(&run_dir, "trace.jsonl"),
            metrics: open_sink(&run_dir, "metrics.jsonl"),
            run_id,
            stdout,
        }
    })
}

fn split_fields(mut fields: Map<String, Value>) -> (Map<String, Value>, Map<String, Value>) {
    let mut top = Map::new();
    for key in ["source_id", "recipe", "msg"] {
        if let Some(value) = fields.remove(key) {
            top.insert(key.to_string(), value);
        }
    }
    (top, fields)
}

fn write_line(writer: &Sink, line: &str) {
    if let Some(w) = writer {
        if let Ok(mut w) = w.lock() {
            let _ = writeln!(w, "{}", line);
            let _ = w.flush();
        }
    }
}

// =============================================================================
// Core logging functions
// =============================================================================

/// RFC3339 timestamp with milliseconds
pub fn ts_now() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

pub fn ts_epoch_ms() -> u64 {
    Utc::now().timestamp_millis() as u64
}

/// Emit a structured log entry
pub fn log(level: Level, domain: Domain, event: &str, fields: Map<String, Value>) {
    if level < Level::from_env() || !domain.is_enabled() {
        return;
    }
    emit_record(level, domain, event, fields);
}

fn build_record(run_id: &str, level: Level, domain: Domain, event: &str, fields: Map<String, Value>) -> Value {
    let (mut top, data) = split_fields(fields);
    let msg = top.remove("msg").unwrap_or(Value::String(String::new()));
    let mut entry = Map::new();
    entry.insert("ts".to_string(), json!(ts_now()));
    entry.insert("run_id".to_string(), json!(run_id));
    entry.insert("seq".to_string(), json!(next_seq()));
    entry.insert("lvl".to_string(), json!(level.as_str().to_uppercase()));
    entry.insert("domain".to_string(), json!(domain.as_str()));
    entry.insert("event".to_string(), json!(event));
    entry.insert("msg".to_string(), msg);
    for (k, v) in top {
        entry.insert(k, v);
    }
    entry.insert("data".to_string(), Value::Object(data));
    Value::Object(entry)
}

fn emit_record(level: Level, domain: Domain, event: &str, fields: Map<String, Value>) {
    let ctx = ensure_run_context();
    let line = build_record(&ctx.run_id, level, domain, event, fields).to_string();
    if domain == Domain::Metrics {
        write_line(&ctx.metrics, &line);
    }
    match level {
        Level::Trace | Level::Debug => write_line(&ctx.trace, &line),
        _ => write_line(&ctx.events, &line),
    }
    if ctx.stdout {
        // Keep stdout free for report output.
        eprintln!("{}", line);
    }
}

// =============================================================================
// Domain-Specific Logging Helpers
// =============================================================================

pub fn log_load(source_id: &str, kind: &str, rows: u64, dropped: u64, hash: &str) {
    log(
        Level::Info,
        Domain::Load,
        "loaded",
        obj(&[
            ("source_id", v_str(source_id)),
            ("kind", v_str(kind)),
            ("rows", json!(rows)),
            ("dropped_rows", json!(dropped)),
            ("hash_sha256", v_str(hash)),
        ]),
    );
}

pub fn log_load_error(source_id: &str, kind: &str, error: &str) {
    log(
        Level::Error,
        Domain::Load,
        "load_failed",
        obj(&[
            ("source_id", v_str(source_id)),
            ("kind", v_str(kind)),
            ("msg", v_str(error)),
        ]),
    );
}

pub fn log_cache(event: &str, source_id: &str) {
    log(
        Level::Debug,
        Domain::Cache,
        event,
        obj(&[("source_id", v_str(source_id))]),
    );
}

pub fn log_metrics_summary(
    total_time_saved: f64,
    total_execution_time: f64,
    roi: f64,
    efficiency: f64,
    recipes: usize,
    change_types: usize,
) {
    log(
        Level::Info,
        Domain::Metrics,
        "summary",
        obj(&[
            ("total_time_saved", v_num(total_time_saved)),
            ("total_execution_time", v_num(total_execution_time)),
            ("roi", v_num(roi)),
            ("efficiency", v_num(efficiency)),
            ("recipes", json!(recipes)),
            ("change_types", json!(change_types)),
        ]),
    );
}

// =============================================================================
// Utility Functions
// =============================================================================

pub fn obj(pairs: &[(&str, Value)]) -> Map<String, Value> {
    let mut map = Map::new();
    for (k, v) in pairs {
        map.insert((*k).to_string(), v.clone());
    }
    map
}

pub fn v_str(s: &str) -> Value {
    Value::String(s.to_string())
}

pub fn v_num(n: f64) -> Value {
    json!(n)
}

// =============================================================================
// Profiling Scope
// =============================================================================

/// Emits a trace record with elapsed milliseconds when dropped.
pub struct ProfileScope {
    label: &'static str,
    context: Option<Map<String, Value>>,
    started: Instant,
}

impl ProfileScope {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            context: None,
            started: Instant::now(),
        }
    }

    pub fn with_context(label: &'static str, fields: &[(&str, Value)]) -> Self {
        Self {
            label,
            context: Some(obj(fields)),
            started: Instant::now(),
        }
    }
}

impl Drop for ProfileScope {
    fn drop(&mut self) {
        let elapsed_ms = self.started.elapsed().as_secs_f64() * 1000.0;
        let mut fields = self.context.take().unwrap_or_default();
        fields.insert("label".to_string(), v_str(self.label));
        fields.insert("elapsed_ms".to_string(), v_num(elapsed_ms));
        log(Level::Trace, Domain::Profile, "profile", fields);
    }
}

// =============================================================================
// Tests
// =============================================================================
