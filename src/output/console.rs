use super::OutputHandler;
use crate::error::{Error, Result};
use crate::view::{DashboardView, TableBody, UiStatus};
use async_trait::async_trait;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;

const HEADERS: [&str; 5] = ["Name", "Price", "Market Cap", "Volume 24h", "Change 24h"];
const WIDTHS: [usize; 5] = [20, 14, 14, 14, 12];

/// Terminal presentation. With a `MultiProgress` the status indicator is a
/// live spinner line; without one, status changes are printed as they come.
pub struct ConsoleOutput {
    multi: Option<Arc<MultiProgress>>,
    indicator: Option<ProgressBar>,
    last_revision: u64,
    last_status: Option<String>,
}

impl ConsoleOutput {
    pub fn new(multi: Option<Arc<MultiProgress>>) -> Self {
        let indicator = multi.as_ref().map(|multi| {
            let pb = multi.add(ProgressBar::new_spinner());
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb.enable_steady_tick(Duration::from_millis(120));
            pb
        });

        Self {
            multi,
            indicator,
            last_revision: 0,
            last_status: None,
        }
    }

    fn println(&self, line: &str) -> Result<()> {
        match &self.multi {
            Some(multi) => multi.println(line).map_err(|e| Error::Internal(e.to_string())),
            None => {
                println!("{}", line);
                Ok(())
            }
        }
    }
}

impl Default for ConsoleOutput {
    fn default() -> Self {
        Self::new(None)
    }
}

pub fn status_line(view: &DashboardView) -> String {
    let marker = match view.status.state {
        UiStatus::Loading => "◌",
        UiStatus::Healthy => "●",
        UiStatus::Error => "✖",
    };
    let updates = view
        .update_count
        .map(|n| n.to_string())
        .unwrap_or_else(|| "-".to_string());
    format!("{} {} | updates: {}", marker, view.status.message, updates)
}

fn table_line(cells: [&str; 5]) -> String {
    cells
        .iter()
        .zip(WIDTHS)
        .map(|(cell, width)| format!("{:<width$}", cell, width = width))
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end()
        .to_string()
}

/// The summary block followed by the table, one string per terminal line.
pub fn format_dashboard(view: &DashboardView) -> Vec<String> {
    let mut lines = Vec::new();

    let mut header = view.last_update.clone();
    if let Some(source) = &view.source {
        header.push_str(&format!(" ({})", source));
    }
    lines.push(header);
    lines.push(format!(
        "Total: {}   Valid: {}   Quality: {}",
        view.total_count, view.valid_count, view.quality_score
    ));
    lines.push(table_line(HEADERS));
    lines.push("-".repeat(WIDTHS.iter().sum::<usize>() + WIDTHS.len() - 1));

    match &view.table {
        TableBody::Rows { rows } => {
            for row in rows {
                lines.push(table_line(row.cells()));
            }
        }
        TableBody::Placeholder { text, .. } => lines.push(text.clone()),
    }

    lines.push(format!("Updated {}", view.footer_time));
    lines
}

#[async_trait]
impl OutputHandler for ConsoleOutput {
    async fn write(&mut self, view: &DashboardView) -> Result<()> {
        let status = status_line(view);
        match &self.indicator {
            Some(pb) => pb.set_message(status),
            None => {
                if self.last_status.as_deref() != Some(status.as_str()) {
                    self.println(&status)?;
                    self.last_status = Some(status);
                }
            }
        }

        if view.revision != self.last_revision {
            for line in format_dashboard(view) {
                self.println(&line)?;
            }
            self.last_revision = view.revision;
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(pb) = self.indicator.take() {
            pb.finish_and_clear();
        }
        Ok(())
    }
}
