use crate::controller::AUTO_REFRESH_INTERVAL;
use crate::render::DEFAULT_TIME_FORMAT;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DashboardConfig {
    #[serde(default = "default_base_url")]
    #[validate(url)]
    pub base_url: String,

    #[serde(default = "default_refresh_path")]
    #[validate(length(min = 1))]
    pub refresh_path: String,

    #[serde(default = "default_data_path")]
    #[validate(length(min = 1))]
    pub data_path: String,

    #[serde(default = "default_health_path")]
    #[validate(length(min = 1))]
    pub health_path: String,

    #[serde(default = "default_refresh_interval")]
    #[validate(range(min = 1))]
    pub refresh_interval_secs: u64,

    #[serde(default = "default_request_timeout")]
    #[validate(range(min = 1))]
    pub request_timeout_secs: u64,

    /// chrono format string applied in the local time zone.
    #[serde(default = "default_time_format")]
    #[validate(length(min = 1))]
    pub time_format: String,

    #[serde(default)]
    pub output: Option<OutputConfig>,

    /// Optional path to a parent configuration file to inherit from
    #[serde(default)]
    pub extends: Option<String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            refresh_path: default_refresh_path(),
            data_path: default_data_path(),
            health_path: default_health_path(),
            refresh_interval_secs: default_refresh_interval(),
            request_timeout_secs: default_request_timeout(),
            time_format: default_time_format(),
            output: None,
            extends: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutputConfig {
    Console,
    Json { path: String },
    Csv { path: String },
}

pub(crate) fn default_base_url() -> String {
    "http://localhost:5000".to_string()
}

pub(crate) fn default_refresh_path() -> String {
    "/api/refresh".to_string()
}

pub(crate) fn default_data_path() -> String {
    "/api/data".to_string()
}

pub(crate) fn default_health_path() -> String {
    "/api/health".to_string()
}

pub(crate) fn default_refresh_interval() -> u64 {
    AUTO_REFRESH_INTERVAL.as_secs()
}

pub(crate) fn default_request_timeout() -> u64 {
    10
}

pub(crate) fn default_time_format() -> String {
    DEFAULT_TIME_FORMAT.to_string()
}
