//! Watch streams handed out by the fake recorder
//!
//! Events are `kube::api::WatchEvent`s, so code written against
//! `Api::<K>::watch` consumes a fake watch the same way. The tracker only
//! produces `Added`, `Modified` and `Deleted`; custom watch reactors may send
//! any variant through [`channel`].

use crate::Result;
use futures::Stream;
pub use kube::api::WatchEvent;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::marker::PhantomData;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

pub type WatchSender = mpsc::UnboundedSender<WatchEvent<Value>>;

/// Create a connected sender and watcher, for watch reactors that produce their own events.
pub fn channel() -> (WatchSender, Watcher<Value>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (tx, Watcher::new(rx))
}

fn decode<K: DeserializeOwned>(event: WatchEvent<Value>) -> Result<WatchEvent<K>> {
    Ok(match event {
        WatchEvent::Added(obj) => WatchEvent::Added(serde_json::from_value(obj)?),
        WatchEvent::Modified(obj) => WatchEvent::Modified(serde_json::from_value(obj)?),
        WatchEvent::Deleted(obj) => WatchEvent::Deleted(serde_json::from_value(obj)?),
        WatchEvent::Bookmark(bookmark) => WatchEvent::Bookmark(bookmark),
        WatchEvent::Error(err) => WatchEvent::Error(err),
    })
}

/// Receiving end of a watch, decoding events into `K`
///
/// Implements `futures::Stream`; the stream ends once every sender is gone or
/// [`Watcher::stop`] was called and buffered events are drained.
pub struct Watcher<K = Value> {
    rx: mpsc::UnboundedReceiver<WatchEvent<Value>>,
    _marker: PhantomData<fn() -> K>,
}

impl<K: DeserializeOwned> Watcher<K> {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<WatchEvent<Value>>) -> Self {
        Self {
            rx,
            _marker: PhantomData,
        }
    }

    pub fn into_typed<T: DeserializeOwned>(self) -> Watcher<T> {
        Watcher::new(self.rx)
    }

    pub async fn next_event(&mut self) -> Option<Result<WatchEvent<K>>> {
        self.rx.recv().await.map(decode)
    }

    /// Next buffered event, without waiting
    pub fn try_next_event(&mut self) -> Option<Result<WatchEvent<K>>> {
        self.rx.try_recv().ok().map(decode)
    }

    pub fn stop(&mut self) {
        self.rx.close();
    }
}

impl<K: DeserializeOwned> Stream for Watcher<K> {
    type Item = Result<WatchEvent<K>>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx).map(|event| event.map(decode))
    }
}
