use thiserror::Error;

#[derive(Error, Debug)]
pub enum BroadcastError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("subscriber connection is closed")]
    SubscriberClosed,
}

pub type Result<T> = std::result::Result<T, BroadcastError>;
