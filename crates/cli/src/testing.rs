use std::collections::HashMap;
use std::sync::Mutex;

use crate::poster::{FetchError, ImageDownloader};

/// Serves fixed bytes per URL; unknown URLs answer HTTP 404.
#[derive(Default)]
pub struct FakeDownloader {
    images: HashMap<String, Vec<u8>>,
    requested: Mutex<Vec<String>>,
}

impl FakeDownloader {
    pub fn with_image(mut self, url: &str, bytes: &[u8]) -> Self {
        self.images.insert(url.to_string(), bytes.to_vec());
        self
    }

    pub fn calls(&self) -> usize {
        self.requested.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl ImageDownloader for FakeDownloader {
    async fn download(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        if let Ok(mut requested) = self.requested.lock() {
            requested.push(url.to_string());
        }
        self.images.get(url).cloned().ok_or(FetchError::Status(404))
    }
}
