use std::sync::Arc;

use tracing::{debug, info};

use super::memo::PushMemo;
use super::push::DisplayDevice;
use super::render::Renderer;

/// What one render-and-push cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Pushed,
    /// The render matched the last pushed image; nothing was sent.
    Unchanged,
}

/// Renders the applet and pushes the image only when it changed since the
/// last successful push.
pub struct DisplayUpdater {
    renderer: Arc<dyn Renderer>,
    display: Arc<dyn DisplayDevice>,
    memo: Arc<PushMemo>,
    background: bool,
}

impl DisplayUpdater {
    pub fn new(renderer: Arc<dyn Renderer>, display: Arc<dyn DisplayDevice>, memo: Arc<PushMemo>) -> Self {
        Self {
            renderer,
            display,
            memo,
            background: true,
        }
    }

    /// Push in the foreground instead of updating the installation quietly.
    pub fn foreground(mut self) -> Self {
        self.background = false;
        self
    }

    pub fn memo(&self) -> &Arc<PushMemo> {
        &self.memo
    }

    /// One cycle. Render and push failures are returned; the memo only
    /// records an image once the display has accepted it, so a failed push
    /// is retried on the next cycle.
    #[tracing::instrument(skip(self))]
    pub async fn render_and_push(&self) -> anyhow::Result<PushOutcome> {
        debug!("rendering display applet");
        let image = self.renderer.render().await?;

        if self.memo.matches(&image).await {
            info!("cache hit: no image change, skipping push");
            return Ok(PushOutcome::Unchanged);
        }

        debug!(bytes = image.len(), "pushing display applet");
        self.display.push(&image, self.background).await?;
        self.memo.set(image).await;
        Ok(PushOutcome::Pushed)
    }
}
