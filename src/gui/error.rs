use std::{error::Error, fmt::Display, sync::mpsc};

/// Errors surfaced by the operator TUI helpers.
#[derive(Debug)]
pub enum GridGuiError {
    /// Terminal IO failed.
    Io(std::io::Error),
    /// The worker thread's result channel closed early.
    ChannelRecv(mpsc::RecvError),
    /// The stop signal could not be delivered.
    ChannelSend,
    /// The worker thread panicked.
    Join,
}

impl Display for GridGuiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GridGuiError::Io(error) => write!(f, "terminal io error: {}", error),
            GridGuiError::ChannelRecv(error) => write!(f, "worker result lost: {}", error),
            GridGuiError::ChannelSend => write!(f, "worker stop signal lost"),
            GridGuiError::Join => write!(f, "worker thread panicked"),
        }
    }
}

impl Error for GridGuiError {}

impl From<std::io::Error> for GridGuiError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<mpsc::RecvError> for GridGuiError {
    fn from(value: mpsc::RecvError) -> Self {
        Self::ChannelRecv(value)
    }
}

impl<T> From<mpsc::SendError<T>> for GridGuiError {
    fn from(_: mpsc::SendError<T>) -> Self {
        Self::ChannelSend
    }
}
