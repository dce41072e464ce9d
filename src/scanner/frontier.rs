//! Shared queue of directories awaiting exploration.
//!
//! The frontier is an unbounded multi-producer/multi-consumer channel.
//! `push` never blocks and `pop` is a non-blocking snapshot check, so
//! each directory is handed to exactly one worker. No ordering is
//! promised between entries.
//!
//! The frontier also counts directories that have been pushed but not
//! yet fully processed. The default polling termination ignores this
//! counter; the in-flight termination mode waits for it to reach zero.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};

/// Concurrent, unordered directory work queue.
#[derive(Debug)]
pub struct Frontier {
    sender: Sender<PathBuf>,
    receiver: Receiver<PathBuf>,
    /// Directories pushed but not yet marked complete
    pending: AtomicUsize,
    /// Total directories ever pushed
    pushed: AtomicU64,
}

impl Default for Frontier {
    fn default() -> Self {
        Self::new()
    }
}

impl Frontier {
    /// Create an empty frontier.
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self {
            sender,
            receiver,
            pending: AtomicUsize::new(0),
            pushed: AtomicU64::new(0),
        }
    }

    /// Add a directory. Never blocks.
    pub fn push(&self, path: PathBuf) {
        // Count before sending so a concurrent pop + complete cannot
        // drive the counter below zero.
        self.pending.fetch_add(1, Ordering::SeqCst);
        self.pushed.fetch_add(1, Ordering::Relaxed);

        // The frontier owns its receiver, so the channel cannot be disconnected
        if let Err(e) = self.sender.send(path) {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            log::error!("Frontier rejected {}", e.into_inner().display());
        }
    }

    /// Remove and return an arbitrary directory, or `None` if the frontier is empty right now.
    #[must_use]
    pub fn pop(&self) -> Option<PathBuf> {
        match self.receiver.try_recv() {
            Ok(path) => Some(path),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Mark one popped directory as fully processed.
    pub fn complete(&self) {
        self.pending.fetch_sub(1, Ordering::SeqCst);
    }

    /// Whether the queue holds no entries right now.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Number of entries currently queued.
    #[must_use]
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Directories queued or still being processed.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Total directories ever pushed.
    #[must_use]
    pub fn total_pushed(&self) -> u64 {
        self.pushed.load(Ordering::Relaxed)
    }
}
