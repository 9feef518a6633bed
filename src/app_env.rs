/// Base URL of the task API, such as `https://tasks.example.com`
pub const API_URL: &str = "TASKBELL_API_URL";
/// Path of the JSON file the session token is persisted in
pub const STORAGE_PATH: &str = "TASKBELL_STORAGE_PATH";
/// How often `watch` re-fetches the task list, in seconds
pub const REFRESH_SECS: &str = "TASKBELL_REFRESH_SECS";
/// How many times the terminal bell rings for one alarm
pub const ALARM_RINGS: &str = "TASKBELL_ALARM_RINGS";
/// Timeout for a single API request, in seconds
pub const REQUEST_TIMEOUT_SECS: &str = "TASKBELL_REQUEST_TIMEOUT_SECS";
/// Log level configuration for the application. For formatting info, see [tracing-subscriber's EnvFilter documentation](https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html)
pub const LOG_LEVEL: &str = "LOG_LEVEL";

/// OpenTelemetry span export URL, typically http://localhost:4317 when a collector runs locally
pub const OTEL_SPAN_EXPORT_URL: &str = "OTEL_SPAN_EXPORT_URL";
/// OpenTelemetry metrics export URL, typically http://localhost:4317 when a collector runs locally
pub const OTEL_METRIC_EXPORT_URL: &str = "OTEL_METRIC_EXPORT_URL";
