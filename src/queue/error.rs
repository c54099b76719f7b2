//! Queue Error Types

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Queue lock unavailable: {message}")]
    Poisoned { message: String },
}

/// Result type for queue operations
pub type QueueResult<T> = Result<T, QueueError>;
