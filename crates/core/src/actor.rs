//! A minimal mailbox actor that owns the orchestrator state.
//!
//! Handlers run one at a time on the actor task, so the state never needs
//! a lock. Long-running work is spawned and reports back with a message.

use std::error::Error;
use std::fmt::{self, Debug};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::Instrument;

/// A type of error which can be returned whenever messages are sent to
/// an orchestrator that has died.
pub struct ActorDeadError;

impl Debug for ActorDeadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorDeadError").finish()
    }
}

impl fmt::Display for ActorDeadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("the orchestrator has died")
    }
}

impl Error for ActorDeadError {}

/// Helper trait for handling boxed messages.
pub(crate) trait BoxMessage<S>: Send + Debug + 'static {
    fn handle_box(self: Box<Self>, state: &mut S, handle: &Actor<S>);
}

/// The message that an actor can handle.
pub(crate) trait Message<S>: BoxMessage<S> {
    /// Handles the message with mutable access to the actor's state.
    fn handle(self, state: &mut S, handle: &Actor<S>);
}

impl<S, M: Message<S>> BoxMessage<S> for M {
    #[inline]
    fn handle_box(self: Box<Self>, state: &mut S, handle: &Actor<S>) {
        (*self).handle(state, handle)
    }
}

type Mailbox<S> = mpsc::UnboundedSender<Box<dyn BoxMessage<S>>>;

/// Handle to an actor.
pub(crate) struct Actor<S> {
    tx: Mailbox<S>,
}

impl<S: Send + 'static> Actor<S> {
    /// Spawns the actor on the current tokio runtime.
    pub fn spawn(state: S, label: &'static str) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let weak_tx = tx.downgrade();
        tokio::spawn(
            run_actor(weak_tx, state, rx)
                .instrument(trace_span!("actor", label = label)),
        );
        Self { tx }
    }

    /// Sends a message to the actor.
    #[inline]
    pub fn send<M: Message<S>>(&self, msg: M) -> Result<(), ActorDeadError> {
        self.tx.send(Box::new(msg)).map_err(|_| ActorDeadError)
    }

    /// Sends a message to the actor once `delay` has passed.
    ///
    /// The pending delivery keeps the actor alive.
    pub fn send_after<M: Message<S>>(&self, delay: Duration, msg: M) {
        let handle = self.clone();
        tokio::spawn(async move {
            sleep(delay).await;
            if handle.send(msg).is_err() {
                debug!("actor died before a delayed message was delivered");
            }
        });
    }
}

impl<S> Clone for Actor<S> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

async fn run_actor<S: Send + 'static>(
    weak_tx: mpsc::WeakUnboundedSender<Box<dyn BoxMessage<S>>>,
    mut state: S,
    mut rx: mpsc::UnboundedReceiver<Box<dyn BoxMessage<S>>>,
) {
    debug!("started");
    while let Some(msg) = rx.recv().await {
        trace!("received message: {msg:?}");

        let Some(tx) = weak_tx.upgrade() else {
            warn!("last handle has been dropped, discard the message");
            break;
        };
        let handle = Actor { tx };

        let proc_span = trace_span!("proc msg");
        proc_span.in_scope(|| {
            msg.handle_box(&mut state, &handle);
            trace!("finished");
        });
    }
    debug!("will terminate");
}

#[cfg(test)]
mod tests {
    use tokio::sync::oneshot;

    use super::*;

    #[derive(Default)]
    struct Counter {
        value: u32,
    }

    #[derive(Debug)]
    struct Add(u32);

    impl Message<Counter> for Add {
        fn handle(self, state: &mut Counter, _handle: &Actor<Counter>) {
            state.value += self.0;
        }
    }

    #[derive(Debug)]
    struct Get(oneshot::Sender<u32>);

    impl Message<Counter> for Get {
        fn handle(self, state: &mut Counter, _handle: &Actor<Counter>) {
            self.0.send(state.value).ok();
        }
    }

    #[tokio::test]
    async fn test_send_message() {
        let actor = Actor::spawn(Counter::default(), "counter");
        actor.send(Add(42)).unwrap();

        let (tx, rx) = oneshot::channel();
        actor.send(Get(tx)).unwrap();
        assert_eq!(rx.await.unwrap(), 42);
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_after() {
        let actor = Actor::spawn(Counter::default(), "counter");
        actor.send_after(Duration::from_secs(1), Add(1));

        let (tx, rx) = oneshot::channel();
        actor.send(Get(tx)).unwrap();
        assert_eq!(rx.await.unwrap(), 0);

        sleep(Duration::from_secs(2)).await;
        let (tx, rx) = oneshot::channel();
        actor.send(Get(tx)).unwrap();
        assert_eq!(rx.await.unwrap(), 1);
    }

    #[test]
    fn test_dead_error_display() {
        assert_eq!(ActorDeadError.to_string(), "the orchestrator has died");
        assert_eq!(format!("{ActorDeadError:?}"), "ActorDeadError");
    }
}
