use super::OutputHandler;
use crate::error::Result;
use crate::view::DashboardView;
use async_trait::async_trait;
use std::path::PathBuf;

const HEADERS: [&str; 6] = ["name", "price", "market_cap", "volume_24h", "change_24h", "change_class"];

/// Exports the rendered table. The file is replaced on each new render.
pub struct CsvOutput {
    path: PathBuf,
    last_revision: Option<u64>,
}

impl CsvOutput {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            last_revision: None,
        }
    }
}

#[async_trait]
impl OutputHandler for CsvOutput {
    async fn write(&mut self, view: &DashboardView) -> Result<()> {
        if self.last_revision == Some(view.revision) {
            return Ok(());
        }

        let mut writer = csv::Writer::from_path(&self.path)?;
        writer.write_record(HEADERS)?;
        for row in view.table.rows() {
            let [name, price, market_cap, volume, change] = row.cells();
            writer.write_record([name, price, market_cap, volume, change, row.change_24h.class.as_str()])?;
        }
        writer.flush()?;

        self.last_revision = Some(view.revision);
        Ok(())
    }
}
