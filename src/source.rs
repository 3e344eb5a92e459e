use async_trait::async_trait;

/// Produces the raw users payload. How it gets it (HTTP, disk, fixture) is
/// up to the implementor.
#[async_trait]
pub trait UserSource: Send + Sync {
    async fn fetch(&self) -> anyhow::Result<Vec<u8>>;
}

/// Serves the same payload on every fetch.
#[derive(Debug, Clone)]
pub struct StaticSource {
    payload: Vec<u8>,
}

impl StaticSource {
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: payload.into(),
        }
    }
}

#[async_trait]
impl UserSource for StaticSource {
    async fn fetch(&self) -> anyhow::Result<Vec<u8>> {
        Ok(self.payload.clone())
    }
}
