//! Stream wrapper that caps throughput using a [`TokenBucket`].

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_util::Stream;
use tokio::time::Sleep;

use crate::rate::TokenBucket;

/// Delays each chunk of the inner stream until the bucket covers it.
pub struct ThrottledStream<S> {
    inner: S,
    limiter: Arc<TokenBucket>,
    delay: Option<Pin<Box<Sleep>>>,
    pending_chunk: Option<Bytes>,
}

impl<S> ThrottledStream<S> {
    /// Throttle `inner` to `bytes_per_second`, with one second of burst.
    pub fn new(inner: S, bytes_per_second: u64) -> Self {
        Self::with_bucket(inner, Arc::new(TokenBucket::new(bytes_per_second)))
    }

    /// Share a bucket between several streams.
    pub fn with_bucket(inner: S, bucket: Arc<TokenBucket>) -> Self {
        Self {
            inner,
            limiter: bucket,
            delay: None,
            pending_chunk: None,
        }
    }
}

impl<S, E> Stream for ThrottledStream<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
{
    type Item = Result<Bytes, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if let Some(delay) = this.delay.as_mut() {
            if delay.as_mut().poll(cx).is_pending() {
                return Poll::Pending;
            }
            this.delay = None;
            if let Some(chunk) = this.pending_chunk.take() {
                return Poll::Ready(Some(Ok(chunk)));
            }
        }

        match Pin::new(&mut this.inner).poll_next(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                let wait = this.limiter.reserve(chunk.len());
                if wait.is_zero() {
                    return Poll::Ready(Some(Ok(chunk)));
                }

                let mut delay = Box::pin(tokio::time::sleep(wait));
                if delay.as_mut().poll(cx).is_ready() {
                    return Poll::Ready(Some(Ok(chunk)));
                }
                this.delay = Some(delay);
                this.pending_chunk = Some(chunk);
                Poll::Pending
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::{StreamExt, stream};
    use std::convert::Infallible;
    use std::time::Duration;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_throttled_stream_passes_everything() {
        let chunks = vec![
            Ok::<_, Infallible>(Bytes::from("hi")),
            Ok(Bytes::from("hi")),
            Ok(Bytes::from("hi")),
        ];
        let throttled = ThrottledStream::new(stream::iter(chunks), 100);

        let results: Vec<_> = throttled.collect().await;

        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.is_ok()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttled_stream_rate_limit() {
        let chunks = (0..3).map(|_| Ok::<_, Infallible>(Bytes::from(vec![0u8; 100])));
        let throttled = ThrottledStream::new(stream::iter(chunks), 100);

        let start = Instant::now();
        let total: usize = throttled.map(|c| c.unwrap().len()).fold(0, |a, n| async move { a + n }).await;

        assert_eq!(total, 300);
        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_throttled_stream_forwards_errors() {
        let chunks = vec![Ok(Bytes::from("a")), Err("boom")];
        let results: Vec<_> = ThrottledStream::new(stream::iter(chunks), 1_000_000).collect().await;
        assert_eq!(results[1], Err("boom"));
    }
}
