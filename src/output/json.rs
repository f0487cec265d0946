use super::OutputHandler;
use crate::error::Result;
use crate::view::DashboardView;
use async_trait::async_trait;
use std::fs;
use std::path::PathBuf;

/// Keeps a file holding the latest view, rewritten on every change.
pub struct JsonOutput {
    path: PathBuf,
}

impl JsonOutput {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl OutputHandler for JsonOutput {
    async fn write(&mut self, view: &DashboardView) -> Result<()> {
        let body = serde_json::to_vec_pretty(view)?;
        fs::write(&self.path, body)?;
        Ok(())
    }
}
