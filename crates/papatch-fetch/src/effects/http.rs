use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::{Stream, TryStreamExt};

/// A boxed stream type for HTTP response bodies.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// A response body still on the wire.
pub struct Body<E> {
    /// Content-Length, when the server sent one.
    pub content_length: Option<u64>,
    pub chunks: BoxStream<'static, Result<Bytes, E>>,
}

const MAX_PREALLOCATION: u64 = 16 * 1024 * 1024;

/// Asynchronous HTTP client abstraction.
///
/// Implementations own redirect following, connect timeouts and the mapping of
/// non-success statuses to errors; callers only ever see a body or an error.
pub trait HttpClient: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Issue a GET and return the response body as a stream.
    fn get(&self, url: &str) -> impl Future<Output = Result<Body<Self::Error>, Self::Error>> + Send;

    /// Issue a GET and buffer the whole body.
    fn get_bytes(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, Self::Error>> + Send {
        async move {
            let body = self.get(url).await?;
            // the advertised length is only a hint; never trust it for allocation
            let hint = body.content_length.unwrap_or(0).min(MAX_PREALLOCATION);
            let mut buffer = Vec::with_capacity(hint as usize);
            let mut chunks = body.chunks;
            while let Some(chunk) = chunks.try_next().await? {
                buffer.extend_from_slice(&chunk);
            }
            Ok(buffer)
        }
    }
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use std::time::Duration;

    use futures_util::StreamExt;
    use reqwest::{Client, Proxy, Url, redirect};
    use thiserror::Error;

    use super::*;

    #[derive(Debug, Error)]
    pub enum ClientSettingError {
        #[error("Invalid proxy URL {url}: {source}")]
        Proxy {
            url: String,
            #[source]
            source: reqwest::Error,
        },

        #[error("Failed to build client: {0}")]
        Build(#[from] reqwest::Error),
    }

    /// Transport configuration.
    #[derive(Clone, Debug)]
    pub struct ClientSetting {
        pub connect_timeout: Option<Duration>,
        /// Redirect hops followed before giving up.
        pub max_redirects: usize,
        pub proxies: Option<Vec<Url>>,
        pub user_agent: String,
    }

    impl Default for ClientSetting {
        fn default() -> Self {
            Self {
                connect_timeout: Some(Duration::from_secs(30)),
                max_redirects: 5,
                proxies: None,
                user_agent: concat!("papatch/", env!("CARGO_PKG_VERSION")).to_owned(),
            }
        }
    }

    impl ClientSetting {
        pub fn builder(self) -> Result<reqwest::ClientBuilder, ClientSettingError> {
            let mut cb = Client::builder()
                .redirect(redirect::Policy::limited(self.max_redirects))
                .user_agent(self.user_agent);

            if let Some(timeout) = self.connect_timeout {
                cb = cb.connect_timeout(timeout);
            }

            if let Some(proxies) = self.proxies {
                let (secure, insecure): (Vec<Url>, Vec<Url>) =
                    proxies.into_iter().partition(|u| u.scheme() == "https");

                for u in secure {
                    cb = cb.proxy(Proxy::https(u.as_str()).map_err(|source| {
                        ClientSettingError::Proxy {
                            url: u.to_string(),
                            source,
                        }
                    })?);
                }

                for u in insecure {
                    cb = cb.proxy(Proxy::http(u.as_str()).map_err(|source| {
                        ClientSettingError::Proxy {
                            url: u.to_string(),
                            source,
                        }
                    })?);
                }
            }

            Ok(cb)
        }

        pub fn build(self) -> Result<ReqwestClient, ClientSettingError> {
            let client = self.builder()?.build().map_err(ClientSettingError::Build)?;
            Ok(ReqwestClient { client })
        }
    }

    /// Production HTTP client implementation using reqwest.
    #[derive(Clone, Debug)]
    pub struct ReqwestClient {
        client: Client,
    }

    impl ReqwestClient {
        pub fn new() -> Result<Self, ClientSettingError> {
            ClientSetting::default().build()
        }

        pub fn inner(&self) -> &Client {
            &self.client
        }
    }

    impl HttpClient for ReqwestClient {
        type Error = reqwest::Error;

        async fn get(&self, url: &str) -> Result<Body<Self::Error>, Self::Error> {
            let response = self.client.get(url).send().await?.error_for_status()?;
            let content_length = response.content_length();
            let chunks = response.bytes_stream().map(|r| r.map(Bytes::from));

            Ok(Body {
                content_length,
                chunks: Box::pin(chunks),
            })
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::{ClientSetting, ClientSettingError, ReqwestClient};
