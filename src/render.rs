use crate::format::{format_change, format_currency, format_quality, format_timestamp};
use crate::model::{Item, Snapshot};
use crate::view::{DashboardView, TableBody, TableRow};

pub const DEFAULT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Projects snapshots onto a [`DashboardView`].
#[derive(Debug, Clone)]
pub struct Renderer {
    time_format: String,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(DEFAULT_TIME_FORMAT)
    }
}

impl Renderer {
    pub fn new(time_format: impl Into<String>) -> Self {
        Self {
            time_format: time_format.into(),
        }
    }

    /// Replaces every rendered field of `view`. Status and the update
    /// counter are owned by the controller and left alone.
    pub fn render(&self, snapshot: &Snapshot, view: &mut DashboardView) {
        let summary = &snapshot.summary;
        view.total_count = summary.total_count.to_string();
        view.valid_count = summary.valid_count.to_string();
        view.quality_score = format_quality(summary.data_quality_score);

        let formatted = snapshot
            .timestamp
            .map(|ts| format_timestamp(&ts, &self.time_format))
            .unwrap_or_else(|| "N/A".to_string());
        view.last_update = format!("Last update: {}", formatted);
        view.footer_time = formatted;
        view.source = snapshot.source.clone();

        view.table = if snapshot.items.is_empty() {
            TableBody::placeholder()
        } else {
            TableBody::Rows {
                rows: snapshot.items.iter().map(table_row).collect(),
            }
        };

        view.revision += 1;
    }
}

pub fn table_row(item: &Item) -> TableRow {
    TableRow {
        name: item.name.clone(),
        price: format!("${}", format_currency(item.price_usd)),
        market_cap: format_currency(item.market_cap_usd),
        volume_24h: format_currency(item.volume_24h_usd),
        change_24h: format_change(item.change_24h_percent),
    }
}
