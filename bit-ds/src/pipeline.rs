//! A bounded producer/consumer pipeline: a background task feeds items
//! through a bounded channel while the caller drains them on its own
//! schedule, backpressuring the producer whenever the consumer falls behind.
//!
//! This is the same shape used by the protocol crate's side-band demux and
//! by the packfile indexer's multi-pass delta resolution; factored out here
//! so it isn't reimplemented per call site.

use std::future::Future;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// The consumer-facing half of a [`Pipeline`]: a bounded receiver plus the
/// producer's eventual outcome.
pub struct PipelineHandle<T, E> {
    rx: mpsc::Receiver<T>,
    join: Option<JoinHandle<Result<(), E>>>,
}

impl<T: Send + 'static, E: Send + 'static> PipelineHandle<T, E> {
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Drains remaining items, then awaits the producer task, surfacing
    /// either its error or a join panic as `E`'s caller-supplied conversion.
    pub async fn finish(mut self) -> Result<Vec<T>, E>
    where
        E: From<JoinError>,
    {
        let mut items = Vec::new();
        while let Some(item) = self.rx.recv().await {
            items.push(item);
        }
        match self.join.take() {
            Some(join) => match join.await {
                Ok(result) => result.map(|()| items),
                Err(join_err) => Err(JoinError(join_err.to_string()).into()),
            },
            None => Ok(items),
        }
    }
}

/// Propagated when the producer task panics instead of returning an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinError(pub String);

impl std::fmt::Display for JoinError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "pipeline producer task panicked: {}", self.0)
    }
}

impl std::error::Error for JoinError {}

/// Spawns `produce` as a background task that pushes items into a channel of
/// capacity `buffer`, returning a handle the caller drains independently.
/// `produce` receives a sender it should `send().await` each item to; its
/// return value becomes the pipeline's final `Result`.
pub struct Pipeline;

impl Pipeline {
    pub fn spawn<T, E, F, Fut>(buffer: usize, produce: F) -> PipelineHandle<T, E>
    where
        T: Send + 'static,
        E: Send + 'static,
        F: FnOnce(mpsc::Sender<T>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(buffer);
        let join = tokio::spawn(produce(tx));
        PipelineHandle { rx, join: Some(join) }
    }
}
