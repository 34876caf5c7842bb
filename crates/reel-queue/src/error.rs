//! Queue error types.

use thiserror::Error;

pub type QueueResult<T> = Result<T, QueueError>;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("processing queue is full")]
    Full,

    #[error("processing queue is closed")]
    Closed,
}
