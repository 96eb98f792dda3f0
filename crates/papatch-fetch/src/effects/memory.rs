use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use bytes::Bytes;
use futures_util::stream;

use super::http::{Body, HttpClient};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MemoryClientError {
    #[error("no object at {0}")]
    NotFound(String),

    #[error("injected failure for {0}")]
    Injected(String),
}

#[derive(Default)]
struct Routes {
    objects: HashMap<String, Bytes>,
    failing: HashMap<String, bool>,
    requests: HashMap<String, usize>,
}

/// In-memory [`HttpClient`] serving fixed objects by URL.
///
/// Clones share the same routes, so a test can keep a handle to inspect the
/// request log after handing the client to a fetcher.
#[derive(Clone)]
pub struct MemoryClient {
    routes: Arc<Mutex<Routes>>,
    chunk_size: usize,
}

impl Default for MemoryClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryClient {
    pub fn new() -> Self {
        Self {
            routes: Arc::default(),
            chunk_size: 4096,
        }
    }

    #[must_use]
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    fn routes(&self) -> MutexGuard<'_, Routes> {
        match self.routes.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn insert(&self, url: impl Into<String>, body: impl Into<Bytes>) {
        self.routes().objects.insert(url.into(), body.into());
    }

    /// Fail requests for `url`. With `mid_stream`, the first chunk is served
    /// before the error.
    pub fn fail(&self, url: impl Into<String>, mid_stream: bool) {
        self.routes().failing.insert(url.into(), mid_stream);
    }

    /// Serve `url` normally again after [`fail`](Self::fail).
    pub fn recover(&self, url: &str) {
        self.routes().failing.remove(url);
    }

    pub fn requests(&self, url: &str) -> usize {
        self.routes().requests.get(url).copied().unwrap_or(0)
    }

    pub fn total_requests(&self) -> usize {
        self.routes().requests.values().sum()
    }
}

impl HttpClient for MemoryClient {
    type Error = MemoryClientError;

    async fn get(&self, url: &str) -> Result<Body<Self::Error>, Self::Error> {
        let (object, failing) = {
            let mut routes = self.routes();
            *routes.requests.entry(url.to_owned()).or_default() += 1;
            (routes.objects.get(url).cloned(), routes.failing.get(url).copied())
        };

        let object = match (object, failing) {
            (_, Some(false)) => return Err(MemoryClientError::Injected(url.to_owned())),
            (Some(object), _) => object,
            (None, _) => return Err(MemoryClientError::NotFound(url.to_owned())),
        };

        let content_length = Some(object.len() as u64);
        let mut chunks: Vec<Result<Bytes, MemoryClientError>> = (0..object.len())
            .step_by(self.chunk_size)
            .map(|start| Ok(object.slice(start..(start + self.chunk_size).min(object.len()))))
            .collect();
        if failing == Some(true) {
            chunks.truncate(1);
            chunks.push(Err(MemoryClientError::Injected(url.to_owned())));
        }

        Ok(Body {
            content_length,
            chunks: Box::pin(stream::iter(chunks)),
        })
    }
}
