//! Multicast channel that holds undelivered events for late subscribers.
//!
//! Every event goes into a bounded buffer first and is then flushed, in FIFO
//! order, to all current subscribers. While nobody is subscribed the buffer
//! keeps the most recent `buffer_size` events, and the next subscriber
//! receives them before anything newer.
//!
//! `send`, `send_completion` and `subscribe` all run under the same mutex, so
//! a subscription racing with a send either sees the event in its backlog or
//! receives it live, never both and never neither.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

/// Stream handed to each subscriber.
pub type EventStream<E> = UnboundedReceiverStream<E>;

/// Default number of undelivered events kept per channel.
pub const DEFAULT_BUFFER_SIZE: usize = 64;

struct ChannelState<E> {
    buffer: VecDeque<E>,
    subscribers: Vec<mpsc::UnboundedSender<E>>,
    completed: bool,
}

impl<E: Clone> ChannelState<E> {
    fn push(&mut self, event: E, buffer_size: usize) {
        self.buffer.push_back(event);
        while self.buffer.len() > buffer_size {
            self.buffer.pop_front();
        }
    }

    /// Delivers the buffer to every live subscriber, pruning dropped ones.
    fn flush(&mut self) {
        self.subscribers.retain(|tx| !tx.is_closed());

        while !self.subscribers.is_empty() {
            let Some(event) = self.buffer.pop_front() else {
                break;
            };
            self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
            if self.subscribers.is_empty() {
                // Nobody took it, keep it for the next subscriber.
                self.buffer.push_front(event);
            }
        }
    }
}

/// Thread-safe publish/subscribe channel with a replay buffer.
pub struct MulticastReplayChannel<E> {
    state: Mutex<ChannelState<E>>,
    buffer_size: usize,
}

impl<E: Clone> MulticastReplayChannel<E> {
    /// Creates a channel buffering at most `buffer_size` events (at least one).
    pub fn new(buffer_size: usize) -> Self {
        Self {
            state: Mutex::new(ChannelState {
                buffer: VecDeque::new(),
                subscribers: Vec::new(),
                completed: false,
            }),
            buffer_size: buffer_size.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ChannelState<E>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publishes an event to all current subscribers, or buffers it if there
    /// are none. Events sent after completion are dropped.
    pub fn send(&self, event: E) {
        let mut state = self.lock();
        if state.completed {
            tracing::trace!("Event sent after channel completion dropped");
            return;
        }
        state.push(event, self.buffer_size);
        state.flush();
    }

    /// Completes the channel.
    ///
    /// Pending events are delivered first; an `Err` carries a final event
    /// delivered after them. Current streams then end, and later subscribers
    /// receive whatever is still buffered before ending.
    pub fn send_completion(&self, result: Result<(), E>) {
        let mut state = self.lock();
        if state.completed {
            return;
        }
        if let Err(event) = result {
            state.push(event, self.buffer_size);
        }
        state.flush();
        state.completed = true;
        state.subscribers.clear();
    }

    /// Attaches a new subscriber and replays the buffered backlog to it.
    pub fn subscribe(&self) -> EventStream<E> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.lock();
        state.subscribers.push(tx);
        state.flush();
        if state.completed {
            state.subscribers.clear();
        }
        UnboundedReceiverStream::new(rx)
    }

    /// Number of subscribers whose streams are still alive.
    pub fn subscriber_count(&self) -> usize {
        self.lock()
            .subscribers
            .iter()
            .filter(|tx| !tx.is_closed())
            .count()
    }

    pub fn is_completed(&self) -> bool {
        self.lock().completed
    }

    /// Number of events waiting for a subscriber.
    pub fn buffered(&self) -> usize {
        self.lock().buffer.len()
    }
}

impl<E: Clone> Default for MulticastReplayChannel<E> {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use tokio_stream::StreamExt;

    use super::*;

    async fn next<E>(stream: &mut EventStream<E>) -> Option<E> {
        tokio::time::timeout(Duration::from_secs(2), stream.next())
            .await
            .expect("timed out waiting for event")
    }

    #[tokio::test]
    async fn test_subscriber_receives_events_in_order() {
        let channel = MulticastReplayChannel::new(8);
        let mut stream = channel.subscribe();

        channel.send(1);
        channel.send(2);
        channel.send(3);

        assert_eq!(next(&mut stream).await, Some(1));
        assert_eq!(next(&mut stream).await, Some(2));
        assert_eq!(next(&mut stream).await, Some(3));
    }

    #[tokio::test]
    async fn test_backlog_replayed_to_late_subscriber() {
        let channel = MulticastReplayChannel::new(8);
        channel.send("a");
        channel.send("b");
        assert_eq!(channel.buffered(), 2);

        let mut stream = channel.subscribe();
        channel.send("c");

        assert_eq!(next(&mut stream).await, Some("a"));
        assert_eq!(next(&mut stream).await, Some("b"));
        assert_eq!(next(&mut stream).await, Some("c"));
        assert_eq!(channel.buffered(), 0);
    }

    #[tokio::test]
    async fn test_backlog_drops_oldest_beyond_capacity() {
        let channel = MulticastReplayChannel::new(2);
        channel.send(1);
        channel.send(2);
        channel.send(3);

        let mut stream = channel.subscribe();
        channel.send_completion(Ok(()));

        assert_eq!(next(&mut stream).await, Some(2));
        assert_eq!(next(&mut stream).await, Some(3));
        assert_eq!(next(&mut stream).await, None);
    }

    #[tokio::test]
    async fn test_multiple_subscribers_see_same_sequence() {
        let channel = MulticastReplayChannel::new(8);
        let mut first = channel.subscribe();
        let mut second = channel.subscribe();

        channel.send(10);
        channel.send(20);

        for stream in [&mut first, &mut second] {
            assert_eq!(next(stream).await, Some(10));
            assert_eq!(next(stream).await, Some(20));
        }
        assert_eq!(channel.subscriber_count(), 2);
    }

    #[tokio::test]
    async fn test_delivered_events_are_not_replayed() {
        let channel = MulticastReplayChannel::new(8);
        let mut first = channel.subscribe();
        channel.send(1);

        let mut second = channel.subscribe();
        channel.send(2);
        channel.send_completion(Ok(()));

        assert_eq!(next(&mut first).await, Some(1));
        assert_eq!(next(&mut first).await, Some(2));
        assert_eq!(next(&mut second).await, Some(2));
        assert_eq!(next(&mut second).await, None);
    }

    #[tokio::test]
    async fn test_completion_with_error_event() {
        let channel = MulticastReplayChannel::new(8);
        let mut stream = channel.subscribe();
        channel.send("progress");
        channel.send_completion(Err("failed"));

        assert_eq!(next(&mut stream).await, Some("progress"));
        assert_eq!(next(&mut stream).await, Some("failed"));
        assert_eq!(next(&mut stream).await, None);
        assert!(channel.is_completed());
    }

    #[tokio::test]
    async fn test_send_after_completion_is_dropped() {
        let channel = MulticastReplayChannel::new(8);
        channel.send_completion(Ok(()));
        channel.send(1);

        let mut stream = channel.subscribe();
        assert_eq!(next(&mut stream).await, None);
    }

    #[tokio::test]
    async fn test_dropped_subscriber_is_pruned_and_events_buffer_again() {
        let channel = MulticastReplayChannel::new(8);
        let stream = channel.subscribe();
        assert_eq!(channel.subscriber_count(), 1);

        drop(stream);
        assert_eq!(channel.subscriber_count(), 0);

        channel.send(5);
        assert_eq!(channel.buffered(), 1);

        let mut stream = channel.subscribe();
        assert_eq!(next(&mut stream).await, Some(5));
    }

    #[tokio::test]
    async fn test_zero_buffer_size_still_delivers() {
        let channel = MulticastReplayChannel::new(0);
        let mut stream = channel.subscribe();
        channel.send(1);
        assert_eq!(next(&mut stream).await, Some(1));
    }

    #[tokio::test]
    async fn test_subscribe_racing_with_sends_loses_nothing() {
        let channel = Arc::new(MulticastReplayChannel::new(10_000));

        let sender = {
            let channel = channel.clone();
            std::thread::spawn(move || {
                for i in 0..1_000u32 {
                    channel.send(i);
                }
            })
        };

        let stream = channel.subscribe();
        sender.join().unwrap();
        channel.send_completion(Ok(()));

        let received: Vec<u32> = stream.collect().await;
        assert_eq!(received, (0..1_000).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_concurrent_senders_deliver_every_event_once() {
        let channel = Arc::new(MulticastReplayChannel::new(8));
        let stream = channel.subscribe();

        let handles: Vec<_> = (0..4u32)
            .map(|t| {
                let channel = channel.clone();
                tokio::spawn(async move {
                    for i in 0..100u32 {
                        channel.send(t * 1_000 + i);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }
        channel.send_completion(Ok(()));

        let mut received: Vec<u32> = stream.collect().await;
        assert_eq!(received.len(), 400);

        // Per-sender order is preserved
        for t in 0..4u32 {
            let from_sender: Vec<u32> = received
                .iter()
                .copied()
                .filter(|v| v / 1_000 == t)
                .collect();
            assert_eq!(from_sender, (0..100).map(|i| t * 1_000 + i).collect::<Vec<_>>());
        }

        received.sort_unstable();
        received.dedup();
        assert_eq!(received.len(), 400);
    }
}
