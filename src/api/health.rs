// Liveness and detailed health checks

use super::AppState;
use crate::db;
use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    /// Seconds since the server started
    pub uptime: f64,
    pub environment: String,
}

#[derive(Debug, Serialize)]
pub struct DatabaseHealth {
    pub status: &'static str,
    pub name: &'static str,
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct UptimeInfo {
    pub seconds: u64,
    pub formatted: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemInfo {
    pub uptime: UptimeInfo,
    pub version: &'static str,
    pub platform: &'static str,
    pub arch: &'static str,
    pub pid: u32,
}

#[derive(Debug, Serialize)]
pub struct DetailedHealth {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub database: DatabaseHealth,
    pub system: SystemInfo,
    pub environment: String,
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "UP",
        timestamp: Utc::now(),
        uptime: state.uptime().as_secs_f64(),
        environment: state.environment().to_string(),
    })
}

/// GET /health/detailed - adds store connectivity and process details
pub async fn health_detailed(State(state): State<AppState>) -> Json<DetailedHealth> {
    let connected = match state.conn().and_then(|conn| db::ping(&conn)) {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "Database health check failed");
            false
        }
    };
    let uptime = state.uptime().as_secs();

    Json(DetailedHealth {
        status: "UP",
        timestamp: Utc::now(),
        database: DatabaseHealth {
            status: if connected { "Connected" } else { "Disconnected" },
            name: "SQLite",
            path: state.database_label().to_string(),
        },
        system: SystemInfo {
            uptime: UptimeInfo {
                seconds: uptime,
                formatted: format_uptime(uptime),
            },
            version: crate::VERSION,
            platform: std::env::consts::OS,
            arch: std::env::consts::ARCH,
            pid: std::process::id(),
        },
        environment: state.environment().to_string(),
    })
}

/// Compact uptime such as "1d 2h 3m 4s"; zero components are left out
pub fn format_uptime(total_seconds: u64) -> String {
    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3_600;
    let minutes = (total_seconds % 3_600) / 60;
    let seconds = total_seconds % 60;

    let parts: Vec<String> = [(days, "d"), (hours, "h"), (minutes, "m"), (seconds, "s")]
        .into_iter()
        .filter(|(value, _)| *value > 0)
        .map(|(value, unit)| format!("{}{}", value, unit))
        .collect();

    if parts.is_empty() {
        "0s".to_string()
    } else {
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(0), "0s");
        assert_eq!(format_uptime(59), "59s");
        assert_eq!(format_uptime(60), "1m");
        assert_eq!(format_uptime(3_661), "1h 1m 1s");
        assert_eq!(format_uptime(86_400 + 7_200 + 4), "1d 2h 4s");
    }
}
