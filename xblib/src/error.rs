use crate::protocol::Status;

/// Errors from talking to a radio.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// No response arrived in time. `frame_id` is [None] for the
    /// text command-mode handshake.
    #[error("timed out waiting for response{}", for_frame(.frame_id))]
    Timeout { frame_id: Option<u8> },

    /// The module answered, and said no.
    #[error("module reported failure: {0}")]
    NegativeAck(Status),

    /// Command-mode handshake got a reply other than `OK`.
    #[error("unexpected command mode reply: {0:?}")]
    CommandMode(String),

    #[error("transport error ({kind:?}): {message}")]
    Transport {
        kind: embedded_io::ErrorKind,
        message: String,
    },

    /// Rejected before anything was sent.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("frame data too long: {0} bytes")]
    FrameTooLong(usize),

    #[error("no free frame id, too many requests outstanding")]
    NoFreeFrameId,

    #[error("frame id {0} already in use")]
    FrameIdInUse(u8),

    /// A response of the wrong type answered a request.
    #[error("unexpected response frame type {0:#04x}")]
    UnexpectedResponse(u8),
}

impl Error {
    /// Wrap an error from the underlying port.
    pub fn transport<E>(err: E) -> Self
    where
        E: embedded_io::Error,
    {
        Self::Transport {
            kind: err.kind(),
            message: format!("{:?}", err),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

fn for_frame(frame_id: &Option<u8>) -> String {
    match frame_id {
        Some(id) => format!(" to frame {}", id),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, Error>;
