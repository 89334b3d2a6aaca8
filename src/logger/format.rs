//! Access log format module
//!
//! Supports multiple log formats:
//! - `combined` (Apache/Nginx combined format)
//! - `common` (Common Log Format - CLF)
//! - `json` (one JSON object per line)
//! - Custom patterns with `$variables`

use chrono::{DateTime, Local};
use serde::Serialize;
use std::time::Instant;

/// One proxied request, recorded when the response is ready
#[derive(Debug, Clone, Serialize)]
pub struct AccessLogEntry {
    /// Client address
    pub remote_addr: String,
    /// Time the request arrived
    pub time: DateTime<Local>,
    pub method: String,
    pub path: String,
    /// Which proxy served the request (`chat`, `data`, `save`, `health`), if any
    pub route: Option<&'static str>,
    pub status: u16,
    pub body_bytes: usize,
    pub user_agent: Option<String>,
    /// Processing time in microseconds, upstream round trip included
    pub request_time_us: u64,
    #[serde(skip)]
    started: Option<Instant>,
}

impl AccessLogEntry {
    /// Start an entry; the clock for `request_time_us` starts now
    pub fn start(remote_addr: String, method: String, path: String) -> Self {
        Self {
            remote_addr,
            time: Local::now(),
            method,
            path,
            route: None,
            status: 200,
            body_bytes: 0,
            user_agent: None,
            request_time_us: 0,
            started: Some(Instant::now()),
        }
    }

    /// Record the response and stop the clock
    pub fn finish(&mut self, status: u16, body_bytes: usize) {
        self.status = status;
        self.body_bytes = body_bytes;
        if let Some(started) = self.started.take() {
            self.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        }
    }

    /// Format the log entry according to the specified format
    pub fn format(&self, format: &str) -> String {
        match format {
            "combined" => self.format_combined(),
            "common" => self.format_common(),
            "json" => self.format_json(),
            custom => self.format_custom(custom),
        }
    }

    fn request_line(&self) -> String {
        format!("{} {} HTTP/1.1", self.method, self.path)
    }

    /// `$remote_addr - - [$time_local] "$request" $status $body_bytes_sent "-" "$http_user_agent"`
    fn format_combined(&self) -> String {
        format!(
            "{} \"-\" \"{}\"",
            self.format_common(),
            self.user_agent.as_deref().unwrap_or("-"),
        )
    }

    /// `$remote_addr - - [$time_local] "$request" $status $body_bytes_sent`
    fn format_common(&self) -> String {
        format!(
            "{} - - [{}] \"{}\" {} {}",
            self.remote_addr,
            self.time.format("%d/%b/%Y:%H:%M:%S %z"),
            self.request_line(),
            self.status,
            self.body_bytes,
        )
    }

    fn format_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| format!(r#"{{"log_error":"{e}"}}"#))
    }

    /// Custom format with variable substitution
    ///
    /// Supported variables: `$remote_addr`, `$time_local`, `$time_iso8601`,
    /// `$request`, `$request_method`, `$request_uri`, `$route`, `$status`,
    /// `$body_bytes_sent`, `$http_user_agent`, `$request_time` (seconds, 3 decimals).
    fn format_custom(&self, pattern: &str) -> String {
        #[allow(clippy::cast_precision_loss)]
        let request_time = self.request_time_us as f64 / 1_000_000.0;

        // $request_time and $request_* must be replaced before $request
        pattern
            .replace("$remote_addr", &self.remote_addr)
            .replace(
                "$time_local",
                &self.time.format("%d/%b/%Y:%H:%M:%S %z").to_string(),
            )
            .replace("$time_iso8601", &self.time.to_rfc3339())
            .replace("$request_time", &format!("{request_time:.3}"))
            .replace("$request_method", &self.method)
            .replace("$request_uri", &self.path)
            .replace("$request", &self.request_line())
            .replace("$route", self.route.unwrap_or("-"))
            .replace("$status", &self.status.to_string())
            .replace("$body_bytes_sent", &self.body_bytes.to_string())
            .replace("$http_user_agent", self.user_agent.as_deref().unwrap_or("-"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_entry() -> AccessLogEntry {
        let mut entry = AccessLogEntry::start(
            "192.168.1.1".to_string(),
            "POST".to_string(),
            "/api/chat".to_string(),
        );
        entry.route = Some("chat");
        entry.user_agent = Some("Mozilla/5.0".to_string());
        entry.finish(502, 87);
        entry.request_time_us = 1500;
        entry
    }

    #[test]
    fn test_format_combined() {
        let log = create_test_entry().format("combined");
        assert!(log.contains("192.168.1.1"));
        assert!(log.contains("\"POST /api/chat HTTP/1.1\""));
        assert!(log.contains("502 87"));
        assert!(log.contains("Mozilla/5.0"));
    }

    #[test]
    fn test_format_common() {
        let log = create_test_entry().format("common");
        assert!(log.contains("POST /api/chat HTTP/1.1"));
        assert!(log.contains("502 87"));
        assert!(!log.contains("Mozilla/5.0"));
    }

    #[test]
    fn test_format_json() {
        let log = create_test_entry().format("json");
        let parsed: serde_json::Value = serde_json::from_str(&log).unwrap();
        assert_eq!(parsed["remote_addr"], "192.168.1.1");
        assert_eq!(parsed["route"], "chat");
        assert_eq!(parsed["status"], 502);
        assert_eq!(parsed["body_bytes"], 87);
        assert!(parsed.get("started").is_none());
    }

    #[test]
    fn test_format_custom() {
        let log = create_test_entry().format("$request_method $request_uri [$route] $status $request_time");
        assert!(
            log.starts_with("POST /api/chat [chat] 502 0.00"),
            "unexpected custom log: {log}"
        );
    }

    #[test]
    fn test_finish_records_elapsed_time_once() {
        let mut entry = AccessLogEntry::start("127.0.0.1".into(), "GET".into(), "/".into());
        entry.finish(200, 2);
        let first = entry.request_time_us;
        entry.finish(404, 3);
        assert_eq!(entry.request_time_us, first);
        assert_eq!(entry.status, 404);
    }
}
