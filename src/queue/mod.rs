//! Blocking Queue Component
//!
//! A generic FIFO hand-off primitive shared by any number of producer threads
//! and (usually) a single consumer thread.
//!
//! # Overview
//!
//! - **Multiple Producers**: `push` never blocks beyond a short critical section
//! - **Blocking Consumer**: `pop` parks the caller until an item arrives
//! - **Strict Ordering**: items leave in exactly the order they were pushed
//! - **Drain Barrier**: `wait_empty` parks the caller until the queue is empty
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │  Producer A  │     │  Producer B  │     │  Producer C  │
//! └──────┬───────┘     └──────┬───────┘     └──────┬───────┘
//!        │ push               │ push               │ push
//!        ▼                    ▼                    ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │        BlockingQueue  (one mutex, two condvars)         │
//! │   ┌───┬───┬───┬───┬───┬───┬───┐                         │
//! │   │ 1 │ 2 │ 3 │ 4 │ 5 │ 6 │...│  ── pushed ──▶ pop      │
//! │   └───┴───┴───┴───┴───┴───┴───┘  ── drained ─▶ wait_empty│
//! └─────────────────────────────────────────────────────────┘
//! ```

mod blocking;
mod error;

pub use blocking::BlockingQueue;
pub use error::{QueueError, QueueResult};

#[cfg(test)]
mod tests;
