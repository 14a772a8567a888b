//! Background workers for load and crop requests.
//!
//! Each operation kind owns a [`TaskSlot`]. Starting a request cancels the
//! one in flight, hands out a new id and runs the work on its own thread.
//! Replies come back over an unbounded channel and carry the id they were
//! issued with; the slot only yields replies whose id is still current.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;

use async_channel::{Receiver, Sender, TryRecvError};
use tracing::{debug, trace, warn};

/// Cooperative cancellation flag shared between a slot and its worker.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Returns `Err(err)` once the token has been cancelled, so workers can
    /// bail out with `?` before an expensive step.
    pub fn check<E>(&self, err: E) -> Result<(), E> {
        if self.is_cancelled() {
            Err(err)
        } else {
            Ok(())
        }
    }
}

/// A finished request, tagged with the id it was started under.
#[derive(Debug)]
pub struct TaskReply<T> {
    pub id: u32,
    pub result: T,
}

/// One in-flight request at a time for a single operation kind.
#[derive(Debug)]
pub struct TaskSlot<T> {
    kind: &'static str,
    counter: Arc<AtomicU32>, // id of the most recently started request
    sender: Sender<TaskReply<T>>,
    receiver: Receiver<TaskReply<T>>,
    token: Option<CancelToken>,
    in_flight: bool,
    on_panic: fn(String) -> T,
}

impl<T: Send + 'static> TaskSlot<T> {
    /// `on_panic` turns a panic message from the worker into a result.
    pub fn new(kind: &'static str, on_panic: fn(String) -> T) -> Self {
        let (sender, receiver) = async_channel::unbounded();
        Self {
            kind,
            counter: Arc::new(AtomicU32::new(0)),
            sender,
            receiver,
            token: None,
            in_flight: false,
            on_panic,
        }
    }

    /// Start `work` on a background thread, superseding any request in flight.
    pub fn start<F>(&mut self, work: F) -> u32
    where
        F: FnOnce(&CancelToken) -> T + Send + 'static,
    {
        if let Some(previous) = self.token.take() {
            previous.cancel();
        }

        let id = 1 + self.counter.fetch_add(1, Ordering::SeqCst);
        let token = CancelToken::new();
        self.token = Some(token.clone());
        self.in_flight = true;

        let sender = self.sender.clone();
        let on_panic = self.on_panic;
        let kind = self.kind;
        let spawned = thread::Builder::new()
            .name(format!("candycrop-{kind}"))
            .spawn(move || {
                let result = panic::catch_unwind(AssertUnwindSafe(|| work(&token)))
                    .unwrap_or_else(|payload| {
                        let message = panic_message(payload.as_ref());
                        warn!(kind, id, %message, "worker panicked");
                        on_panic(message)
                    });
                if sender.send_blocking(TaskReply { id, result }).is_err() {
                    trace!(kind, id, "reply dropped, session is gone");
                }
            });

        if let Err(e) = spawned {
            warn!(kind, id, error = %e, "failed to spawn worker");
            let reply = TaskReply {
                id,
                result: (self.on_panic)(e.to_string()),
            };
            if self.sender.try_send(reply).is_err() {
                trace!(kind, id, "spawn failure reply dropped, channel closed");
            }
        }

        debug!(kind, id, "request started");
        id
    }

    /// Cancel the request in flight, if any. Its (cancelled) reply is still
    /// delivered.
    pub fn cancel(&self) {
        if let Some(token) = &self.token {
            token.cancel();
        }
    }

    /// Cancel the request in flight and retire its id. Its reply, finished
    /// or not, is dropped as stale.
    pub fn supersede(&mut self) {
        if let Some(token) = self.token.take() {
            token.cancel();
        }
        if self.in_flight {
            let retired = self.counter.fetch_add(1, Ordering::SeqCst);
            debug!(kind = self.kind, id = retired, "request superseded");
        }
        self.in_flight = false;
    }

    /// Id of the most recently started request, or 0 if none was started.
    pub fn current_id(&self) -> u32 {
        self.counter.load(Ordering::SeqCst)
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Next current reply without blocking. Stale replies are discarded.
    pub fn try_next(&mut self) -> Option<TaskReply<T>> {
        loop {
            match self.receiver.try_recv() {
                Ok(reply) => {
                    if let Some(reply) = self.accept(reply) {
                        return Some(reply);
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    /// Block until the request in flight replies. Returns `None` straight
    /// away when nothing is in flight.
    pub fn wait_next(&mut self) -> Option<TaskReply<T>> {
        while self.in_flight {
            let reply = self.receiver.recv_blocking().ok()?;
            if let Some(reply) = self.accept(reply) {
                return Some(reply);
            }
        }
        None
    }

    fn accept(&mut self, reply: TaskReply<T>) -> Option<TaskReply<T>> {
        if reply.id != self.current_id() {
            debug!(
                kind = self.kind,
                id = reply.id,
                current = self.current_id(),
                "dropping stale reply"
            );
            return None;
        }
        self.in_flight = false;
        self.token = None;
        Some(reply)
    }
}

impl<T> Drop for TaskSlot<T> {
    fn drop(&mut self) {
        if let Some(token) = &self.token {
            token.cancel();
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}
