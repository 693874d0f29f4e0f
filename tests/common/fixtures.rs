//! Static log corpora used across harnesses.
//!
//! Each corpus pairs a representative raw line with the `(severity, message)`
//! row the normalizer must produce for it.

use pando_core::Severity;

/// Structured JSON lines in various shapes.
pub const CORPUS_JSON: &[(&str, Severity, &str)] = &[
    (
        r#"{"ts":"2024-01-15T10:00:00Z","level":"INFO","message":"Server started","port":8080}"#,
        Severity::Info,
        "Server started",
    ),
    (
        r#"{"time":"2024-01-15T10:00:02.123Z","level":"WARN","message":"Slow query","duration_ms":4200}"#,
        Severity::Warning,
        "Slow query",
    ),
    (
        r#"{"level":3,"message":"numeric level"}"#,
        Severity::Error,
        "numeric level",
    ),
    (
        r#"{"@timestamp":"2024-01-15T10:00:03Z","log.level":"debug","message":"Cache miss"}"#,
        Severity::Info,
        "Cache miss",
    ),
    (
        r#"{"lvl":"fatal","msg":"Out of memory"}"#,
        Severity::Info,
        "{ lvl: 'fatal', msg: 'Out of memory' }",
    ),
    (
        r#"{"level":"error","message":{"code":503,"upstream":"billing"}}"#,
        Severity::Error,
        "{ code: 503, upstream: 'billing' }",
    ),
];

/// logfmt-style lines.
pub const CORPUS_LOGFMT: &[(&str, Severity, &str)] = &[
    (
        "ts=2024-01-15T10:00:00Z level=info msg=\"Server started\" port=8080",
        Severity::Info,
        "Server started",
    ),
    (
        "ts=2024-01-15T10:00:01Z level=error msg=\"Connection refused\" host=db.internal",
        Severity::Error,
        "Connection refused",
    ),
    (
        "ts=2024-01-15T10:00:02Z level=warn msg=\"Slow query\" duration_ms=4200",
        Severity::Warning,
        "Slow query",
    ),
    (
        "ts=2024-01-15T10:00:03Z level=debug msg=\"Cache miss\" key=user:42 ttl=300",
        Severity::Debug,
        "Cache miss",
    ),
    (
        "time=2024-01-15T10:00:06Z severity=CRITICAL message=\"Panic: index out of bounds\"",
        Severity::Crit,
        "Panic: index out of bounds",
    ),
];

/// Third-party plain-text shapes, one per built-in recognizer, plus lines
/// no recognizer claims.
pub const CORPUS_UNSTRUCTURED: &[(&str, Severity, &str)] = &[
    (
        "[2024-01-15T10:00:03Z] WARN: Disk usage at 92% on /dev/sda1",
        Severity::Warning,
        "Disk usage at 92% on /dev/sda1",
    ),
    (
        "[2024-01-15T10:00:00Z INFO  my_crate::net] listening on 0.0.0.0:80",
        Severity::Info,
        "listening on 0.0.0.0:80",
    ),
    (
        "2024-01-15T10:00:00.123456Z  WARN pando::hub: queue is full",
        Severity::Warning,
        "queue is full",
    ),
    (
        "2024-01-15 10:00:01 ERROR Failed to connect to database after 3 retries",
        Severity::Error,
        "Failed to connect to database after 3 retries",
    ),
    (
        "2024/01/15 10:00:00 [crit] 1234#0: *1 connect() failed",
        Severity::Crit,
        "connect() failed",
    ),
    (
        "10:00:05.123 [main] DEBUG o.s.w.s.DispatcherServlet - Initializing Servlet",
        Severity::Debug,
        "o.s.w.s.DispatcherServlet - Initializing Servlet",
    ),
    (
        "ERROR: NullPointerException at com.example.App.handle(App.java:42)",
        Severity::Error,
        "NullPointerException at com.example.App.handle(App.java:42)",
    ),
    (
        "Jan 15 10:00:02 myhost sshd[12345]: Failed password for invalid user admin",
        Severity::Info,
        "Jan 15 10:00:02 myhost sshd[12345]: Failed password for invalid user admin",
    ),
    ("GET /api/v1/users 200 47ms", Severity::Info, "GET /api/v1/users 200 47ms"),
];

/// Channels used by the router harness, from broad to narrow.
pub const CHANNELS: &[&str] = &[
    "billing",
    "billing:worker",
    "billing:worker:retry",
    "search:indexer",
    "search:query",
    "auth:session:refresh",
];
