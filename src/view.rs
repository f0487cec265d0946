//! The target UI state every render and status change writes into.
//!
//! Output sinks only ever read a [`DashboardView`]; the controller and the
//! renderer are the only writers.

use crate::format::ChangeCell;
use serde::{Deserialize, Serialize};

pub const TABLE_COLUMNS: usize = 5;
pub const EMPTY_TABLE_TEXT: &str = "No data available";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UiStatus {
    Loading,
    Healthy,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusIndicator {
    pub state: UiStatus,
    /// Tooltip text.
    pub message: String,
}

impl StatusIndicator {
    pub fn loading() -> Self {
        Self {
            state: UiStatus::Loading,
            message: "Loading...".to_string(),
        }
    }

    pub fn healthy() -> Self {
        Self {
            state: UiStatus::Healthy,
            message: "Connected".to_string(),
        }
    }

    pub fn server_error(message: &str) -> Self {
        Self {
            state: UiStatus::Error,
            message: format!("Error: {}", message),
        }
    }

    pub fn connection_error() -> Self {
        Self {
            state: UiStatus::Error,
            message: "Connection Error".to_string(),
        }
    }
}

impl Default for StatusIndicator {
    fn default() -> Self {
        Self::loading()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub name: String,
    pub price: String,
    pub market_cap: String,
    pub volume_24h: String,
    pub change_24h: ChangeCell,
}

impl TableRow {
    pub fn cells(&self) -> [&str; TABLE_COLUMNS] {
        [
            &self.name,
            &self.price,
            &self.market_cap,
            &self.volume_24h,
            &self.change_24h.text,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TableBody {
    Rows { rows: Vec<TableRow> },
    Placeholder { text: String, colspan: usize },
}

impl TableBody {
    pub fn placeholder() -> Self {
        TableBody::Placeholder {
            text: EMPTY_TABLE_TEXT.to_string(),
            colspan: TABLE_COLUMNS,
        }
    }

    pub fn rows(&self) -> &[TableRow] {
        match self {
            TableBody::Rows { rows } => rows,
            TableBody::Placeholder { .. } => &[],
        }
    }
}

impl Default for TableBody {
    fn default() -> Self {
        TableBody::Rows { rows: Vec::new() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardView {
    pub status: StatusIndicator,
    pub total_count: String,
    pub valid_count: String,
    pub quality_score: String,
    /// Header text, e.g. "Last update: 2024-05-01 12:00:00".
    pub last_update: String,
    pub footer_time: String,
    pub source: Option<String>,
    pub update_count: Option<u64>,
    pub table: TableBody,
    /// Bumped once per successful render.
    pub revision: u64,
}
