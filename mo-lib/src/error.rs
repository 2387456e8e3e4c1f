#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Packet bytes could not be decoded or encoded.
    #[error(transparent)]
    Decode(#[from] crate::spacepacket::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// XML text could not be parsed or written.
    #[error("xml error: {0}")]
    Xml(String),

    #[error("no telemetry packet with sequence count {0}")]
    TelemetryNotFound(u16),

    #[error("no parameter named {0}")]
    ParameterNotFound(String),

    /// The receiver thread did not exit within the allowed wait.
    #[error("receiver did not stop within {0:?}")]
    ShutdownTimeout(std::time::Duration),

    #[error("receiver thread panicked")]
    ThreadPanicked,
}

pub type Result<T> = std::result::Result<T, Error>;
