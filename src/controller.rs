use crate::config::DashboardConfig;
use crate::error::{Error, Result};
use crate::metrics::collector::MetricsCollector;
use crate::metrics::snapshot::MetricsSnapshot;
use crate::model::{DataResponse, HealthReport, RefreshResponse, Snapshot};
use crate::render::Renderer;
use crate::view::{DashboardView, StatusIndicator};
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use url::Url;

pub const AUTO_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Absolute URLs of the backend endpoints the dashboard reads.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub refresh: Url,
    pub data: Url,
    pub health: Url,
}

impl Endpoints {
    pub fn new(base_url: &str, refresh_path: &str, data_path: &str, health_path: &str) -> Result<Self> {
        let base = Url::parse(base_url)?;
        Ok(Self {
            refresh: base.join(refresh_path)?,
            data: base.join(data_path)?,
            health: base.join(health_path)?,
        })
    }
}

/// How a single refresh cycle ended. Exactly one per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Rendered,
    /// 2xx without a `data` payload; nothing was rendered.
    NoData,
    ServerError(String),
    ConnectionError,
}

impl RefreshOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, RefreshOutcome::ServerError(_) | RefreshOutcome::ConnectionError)
    }
}

/// State shared between the controller, its timer task and spawned refreshes.
struct Shared {
    client: Client,
    endpoints: Endpoints,
    renderer: Renderer,
    view: watch::Sender<DashboardView>,
    metrics: Arc<MetricsCollector>,
    stats_task: Mutex<Option<JoinHandle<()>>>,
}

impl Shared {
    async fn refresh(self: &Arc<Self>) -> RefreshOutcome {
        log::info!("Refreshing data...");
        self.view.send_modify(|v| v.status = StatusIndicator::loading());
        self.metrics.record_started();

        let start = Instant::now();
        let result = self.fetch_snapshot().await;
        let elapsed = start.elapsed();

        match result {
            Ok(Some(snapshot)) => {
                let items = snapshot.items.len();
                self.view.send_modify(|v| {
                    self.renderer.render(&snapshot, v);
                    v.status = StatusIndicator::healthy();
                });
                self.metrics.record_success(elapsed);
                log::info!("Data refreshed successfully ({} items)", items);
                self.spawn_stats().await;
                RefreshOutcome::Rendered
            }
            Ok(None) => {
                log::warn!("No data to display");
                self.view.send_modify(|v| v.status = StatusIndicator::healthy());
                self.metrics.record_success(elapsed);
                RefreshOutcome::NoData
            }
            Err(Error::Server { status, message }) => {
                log::error!("API error ({}): {}", status, message);
                self.view
                    .send_modify(|v| v.status = StatusIndicator::server_error(&message));
                self.metrics.record_server_error(elapsed);
                RefreshOutcome::ServerError(message)
            }
            Err(e) => {
                log::error!("Fetch error: {}", e);
                self.view
                    .send_modify(|v| v.status = StatusIndicator::connection_error());
                self.metrics.record_connection_error(elapsed);
                RefreshOutcome::ConnectionError
            }
        }
    }

    /// The body is parsed as JSON whatever the status; only then is the
    /// status consulted.
    async fn fetch_snapshot(&self) -> Result<Option<Snapshot>> {
        let response = self.client.get(self.endpoints.refresh.clone()).send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        let body: Value = serde_json::from_slice(&bytes)?;

        if status.is_success() {
            let body: RefreshResponse = serde_json::from_value(body)?;
            return Ok(body.data);
        }

        let message = match body.get("message") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => status.canonical_reason().unwrap_or("Unknown error").to_string(),
            Some(other) => other.to_string(),
        };
        Err(Error::Server { status, message })
    }

    async fn spawn_stats(self: &Arc<Self>) {
        let shared = self.clone();
        let handle = tokio::spawn(async move {
            match shared.fetch_stats().await {
                Ok(Some(count)) => {
                    shared.view.send_modify(|v| v.update_count = Some(count));
                    shared.metrics.record_stats(true);
                }
                Ok(None) => {
                    log::debug!("Stats response carried no update count");
                    shared.metrics.record_stats(false);
                }
                Err(e) => {
                    log::warn!("Could not fetch stats: {}", e);
                    shared.metrics.record_stats(false);
                }
            }
        });
        *self.stats_task.lock().await = Some(handle);
    }

    async fn fetch_stats(&self) -> Result<Option<u64>> {
        let body: DataResponse = self
            .client
            .get(self.endpoints.data.clone())
            .send()
            .await?
            .json()
            .await?;
        Ok(body.stats.and_then(|s| s.update_count))
    }
}

/// Owns the dashboard view, the periodic refresh timer and the HTTP client.
pub struct RefreshController {
    shared: Arc<Shared>,
    interval: Duration,
    timer: Option<JoinHandle<()>>,
}

impl RefreshController {
    pub fn new(client: Client, endpoints: Endpoints, renderer: Renderer, interval: Duration) -> Self {
        let (view, _) = watch::channel(DashboardView::default());
        Self {
            shared: Arc::new(Shared {
                client,
                endpoints,
                renderer,
                view,
                metrics: Arc::new(MetricsCollector::new()),
                stats_task: Mutex::new(None),
            }),
            interval,
            timer: None,
        }
    }

    pub fn from_config(config: &DashboardConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("market-dashboard/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let endpoints = Endpoints::new(
            &config.base_url,
            &config.refresh_path,
            &config.data_path,
            &config.health_path,
        )?;

        Ok(Self::new(
            client,
            endpoints,
            Renderer::new(config.time_format.clone()),
            Duration::from_secs(config.refresh_interval_secs),
        ))
    }

    /// Runs one fetch cycle. The status switches to loading before any I/O.
    pub async fn refresh(&self) -> RefreshOutcome {
        self.shared.refresh().await
    }

    /// Runs a refresh in the background, like a button press.
    pub fn trigger(&self) -> JoinHandle<RefreshOutcome> {
        let shared = self.shared.clone();
        tokio::spawn(async move { shared.refresh().await })
    }

    /// Installs the periodic trigger, replacing any previous one. The first
    /// firing happens one full interval from now.
    pub fn start_auto_refresh(&mut self) {
        if let Some(previous) = self.timer.take() {
            previous.abort();
        }

        let shared = self.shared.clone();
        let period = self.interval;
        let first = tokio::time::Instant::now() + period;
        self.timer = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(first, period);
            loop {
                ticker.tick().await;
                // Ticks never wait on the previous refresh.
                let shared = shared.clone();
                tokio::spawn(async move {
                    shared.refresh().await;
                });
            }
        }));

        log::info!("Auto-refresh started (every {}s)", period.as_secs_f64());
    }

    /// Prevents future firings. In-flight refreshes run to completion.
    pub fn stop_auto_refresh(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
            log::info!("Auto-refresh stopped");
        }
    }

    pub fn is_auto_refreshing(&self) -> bool {
        self.timer.is_some()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Waits for the most recently spawned stats fetch, if any.
    pub async fn settle(&self) {
        let pending = self.shared.stats_task.lock().await.take();
        if let Some(handle) = pending {
            if let Err(e) = handle.await {
                log::debug!("Stats task ended abnormally: {}", e);
            }
        }
    }

    pub async fn health(&self) -> Result<HealthReport> {
        let report: HealthReport = self
            .shared
            .client
            .get(self.shared.endpoints.health.clone())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(report)
    }

    pub fn view(&self) -> DashboardView {
        self.shared.view.borrow().clone()
    }

    pub fn watch_view(&self) -> watch::Receiver<DashboardView> {
        self.shared.view.subscribe()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.shared.metrics.snapshot()
    }
}

impl Drop for RefreshController {
    fn drop(&mut self) {
        self.stop_auto_refresh();
    }
}
