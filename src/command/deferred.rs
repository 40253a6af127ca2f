// Deferred - result of a command that may still be running
//
// Graph commands resolve immediately. Save/Load run their storage I/O on a
// worker thread; only the finished result travels back over a channel and is
// picked up by the control thread when it polls.

use crate::command::trait_def::{CommandError, CommandResult};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

enum DeferredState<T> {
    Ready(CommandResult<T>),
    Pending(Receiver<CommandResult<T>>),
    Taken,
}

pub struct Deferred<T> {
    state: DeferredState<T>,
}

impl<T: Send + 'static> Deferred<T> {
    pub fn resolved(value: T) -> Self {
        Self {
            state: DeferredState::Ready(Ok(value)),
        }
    }

    pub fn rejected(error: CommandError) -> Self {
        Self {
            state: DeferredState::Ready(Err(error)),
        }
    }

    pub fn from_result(result: CommandResult<T>) -> Self {
        Self {
            state: DeferredState::Ready(result),
        }
    }

    /// Run `work` on a named worker thread
    pub fn spawn<F>(name: &str, work: F) -> Self
    where
        F: FnOnce() -> CommandResult<T> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let spawned = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                // Receiver gone means the caller abandoned the result
                let _ = tx.send(work());
            });

        match spawned {
            Ok(_) => Self {
                state: DeferredState::Pending(rx),
            },
            Err(e) => {
                log::error!("Failed to start {} worker: {}", name, e);
                Self::rejected(CommandError::WorkerDisconnected)
            }
        }
    }

    /// Take the result if it has arrived; `None` while pending or once taken
    pub fn try_take(&mut self) -> Option<CommandResult<T>> {
        let outcome = match &self.state {
            DeferredState::Ready(_) => None,
            DeferredState::Pending(rx) => match rx.try_recv() {
                Ok(result) => Some(result),
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Disconnected) => Some(Err(CommandError::WorkerDisconnected)),
            },
            DeferredState::Taken => return None,
        };

        match std::mem::replace(&mut self.state, DeferredState::Taken) {
            DeferredState::Ready(result) => Some(result),
            _ => outcome,
        }
    }

    /// Block until the result arrives
    pub fn wait(self) -> CommandResult<T> {
        match self.state {
            DeferredState::Ready(result) => result,
            DeferredState::Pending(rx) => rx.recv().unwrap_or(Err(CommandError::WorkerDisconnected)),
            DeferredState::Taken => Err(CommandError::WorkerDisconnected),
        }
    }

    /// Resolved immediately, without a worker
    pub fn is_immediate(&self) -> bool {
        matches!(self.state, DeferredState::Ready(_))
    }

    pub fn is_taken(&self) -> bool {
        matches!(self.state, DeferredState::Taken)
    }
}

impl<T> std::fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.state {
            DeferredState::Ready(_) => "ready",
            DeferredState::Pending(_) => "pending",
            DeferredState::Taken => "taken",
        };
        f.debug_struct("Deferred").field("state", &state).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_resolved_is_taken_once() {
        let mut deferred = Deferred::resolved(7);
        assert!(deferred.is_immediate());
        assert_eq!(deferred.try_take().unwrap().unwrap(), 7);
        assert!(deferred.try_take().is_none());
        assert!(deferred.is_taken());
    }

    #[test]
    fn test_spawned_result_arrives() {
        let deferred = Deferred::spawn("test-worker", || {
            thread::sleep(Duration::from_millis(5));
            Ok(42)
        });
        assert!(!deferred.is_immediate());
        assert_eq!(deferred.wait().unwrap(), 42);
    }

    #[test]
    fn test_polling_until_ready() {
        let mut deferred = Deferred::spawn("test-worker", || Ok("done"));
        let result = loop {
            if let Some(result) = deferred.try_take() {
                break result;
            }
            thread::sleep(Duration::from_millis(1));
        };
        assert_eq!(result.unwrap(), "done");
    }

    #[test]
    fn test_panicking_worker_reports_disconnect() {
        let deferred: Deferred<u32> = Deferred::spawn("test-worker", || panic!("worker failed"));
        assert!(matches!(
            deferred.wait(),
            Err(CommandError::WorkerDisconnected)
        ));
    }
}
