use bytes::Bytes;
use tokio::sync::RwLock;

/// The last image confirmed pushed to the display.
///
/// A single async slot shared (through `Arc`) by everything that pushes, so
/// an unchanged render is never sent twice.
#[derive(Debug, Default)]
pub struct PushMemo {
    last: RwLock<Option<Bytes>>,
}

impl PushMemo {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self) -> Option<Bytes> {
        self.last.read().await.clone()
    }

    pub async fn set(&self, image: Bytes) {
        *self.last.write().await = Some(image);
    }

    /// Whether `image` equals the last pushed image.
    pub async fn matches(&self, image: &[u8]) -> bool {
        self.last.read().await.as_deref() == Some(image)
    }
}
