use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub refreshes_started: u64,
    pub refreshes_total: u64,
    pub refreshes_success: u64,
    pub server_errors: u64,
    pub connection_errors: u64,
    pub stats_success: u64,
    pub stats_failed: u64,
    pub success_rate: f64,
    pub avg_response_time_ms: u64,
    pub elapsed_seconds: f64,
}
