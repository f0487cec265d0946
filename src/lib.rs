pub mod config;
pub mod controller;
pub mod error;
pub mod format;
pub mod metrics;
pub mod model;
pub mod output;
pub mod render;
pub mod view;

pub use controller::{Endpoints, RefreshController, RefreshOutcome, AUTO_REFRESH_INTERVAL};
pub use error::{Error, Result};
pub use format::format_currency;
pub use metrics::collector::MetricsCollector;
pub use metrics::snapshot::MetricsSnapshot;
pub use model::{Item, Snapshot, Stats, Summary};
pub use render::Renderer;
pub use view::{DashboardView, StatusIndicator, TableBody, TableRow, UiStatus};
