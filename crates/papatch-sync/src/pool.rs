use std::future::Future;
use std::num::NonZeroUsize;

use tokio::task::JoinSet;

use crate::error::Result;

/// Bounded set of concurrent tasks with fail-fast semantics.
///
/// Items start in iteration order, at most `workers` at a time. The first
/// error returned by any task ends the batch: tasks not yet started are never
/// spawned and in-flight ones are aborted when the set is dropped.
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    workers: NonZeroUsize,
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self {
            workers: available_parallelism(),
        }
    }
}

impl WorkerPool {
    /// A pool of `workers` tasks; zero falls back to available parallelism.
    pub fn new(workers: usize) -> Self {
        NonZeroUsize::new(workers).map_or_else(Self::default, |workers| Self { workers })
    }

    pub fn workers(&self) -> usize {
        self.workers.get()
    }

    /// Run `work` over every item and return the outputs in item order.
    pub async fn run<T, O, F, Fut>(&self, items: impl IntoIterator<Item = T>, mut work: F) -> Result<Vec<O>>
    where
        F: FnMut(T) -> Fut,
        Fut: Future<Output = Result<O>> + Send + 'static,
        O: Send + 'static,
    {
        let mut pending = items.into_iter().enumerate();
        let mut slots: Vec<Option<O>> = Vec::new();
        let mut tasks = JoinSet::new();

        loop {
            while tasks.len() < self.workers.get() {
                let Some((index, item)) = pending.next() else {
                    break;
                };
                let job = work(item);
                tasks.spawn(async move { (index, job.await) });
            }

            let Some(joined) = tasks.join_next().await else {
                break;
            };
            let (index, output) = joined?;
            let output = output?;

            if slots.len() <= index {
                slots.resize_with(index + 1, || None);
            }
            slots[index] = Some(output);
        }

        Ok(slots.into_iter().flatten().collect())
    }
}

pub fn available_parallelism() -> NonZeroUsize {
    std::thread::available_parallelism().unwrap_or(NonZeroUsize::MIN)
}
