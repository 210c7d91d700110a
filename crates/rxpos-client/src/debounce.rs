//! # Debouncer
//!
//! Issues a lookup only after the input has been quiet for a while, and
//! drops results that a newer input has overtaken.
//!
//! ```text
//!  keystrokes:   p    pa   par  ──────── 300 ms quiet ────────►  fetch("par")
//!  generation:   1    2    3                                        │
//!  run #1 wakes: gen 3 ≠ 1 ──► Superseded                            │
//!  run #2 wakes: gen 3 ≠ 2 ──► Superseded                            ▼
//!  run #3 wakes: gen 3 = 3 ──► fetch ──► still 3? ──► Ready(rows)
//! ```
//!
//! Nothing is cancelled mid-flight; an overtaken fetch finishes and its
//! result is thrown away (last query wins).

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Outcome of a debounced call.
#[derive(Debug, Clone, PartialEq)]
pub enum Debounced<T> {
    Ready(T),
    /// A newer call (or an explicit [`Debouncer::supersede`]) overtook this one.
    Superseded,
}

impl<T> Debounced<T> {
    pub fn ready(self) -> Option<T> {
        match self {
            Debounced::Ready(v) => Some(v),
            Debounced::Superseded => None,
        }
    }
}

/// Generation-counting debouncer. Clones share the same counter.
#[derive(Debug, Clone)]
pub struct Debouncer {
    quiet: Duration,
    generation: Arc<AtomicU64>,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Debouncer {
            quiet,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn quiet(&self) -> Duration {
        self.quiet
    }

    /// Invalidates every call currently waiting or in flight.
    pub fn supersede(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, ticket: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket
    }

    /// Waits out the quiet interval, then runs `fetch` unless overtaken.
    pub async fn run<F, Fut, T>(&self, fetch: F) -> Debounced<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let ticket = self.supersede();

        tokio::time::sleep(self.quiet).await;
        if !self.is_current(ticket) {
            return Debounced::Superseded;
        }

        let value = fetch().await;
        if !self.is_current(ticket) {
            return Debounced::Superseded;
        }
        Debounced::Ready(value)
    }
}
