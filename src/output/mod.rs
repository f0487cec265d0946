use crate::error::Result;
use crate::view::DashboardView;
use async_trait::async_trait;
use futures::StreamExt;
use std::future::Future;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

pub mod console;
pub mod csv;
pub mod json;

#[async_trait]
pub trait OutputHandler: Send + Sync {
    async fn write(&mut self, view: &DashboardView) -> Result<()>;
    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Feeds every view change to `handler` until `shutdown` resolves or the
/// controller goes away, then closes the handler. A failing write is logged
/// and does not stop the loop.
pub async fn drive<F>(
    views: watch::Receiver<DashboardView>,
    handler: &mut dyn OutputHandler,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()>,
{
    let mut stream = std::pin::pin!(WatchStream::new(views).take_until(shutdown));
    while let Some(view) = stream.next().await {
        if let Err(e) = handler.write(&view).await {
            log::error!("Output error: {}", e);
        }
    }
    handler.close().await
}
