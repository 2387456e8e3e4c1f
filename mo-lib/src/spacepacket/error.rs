use super::Integrity;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("Not enough bytes")]
    TooShort {
        /// Number of bytes we got
        actual: usize,
        /// Minimum number of expected bytes
        minimum: usize,
    },

    #[error("payload of {actual} bytes does not fit in a packet (max {maximum})")]
    PayloadTooLarge { actual: usize, maximum: usize },

    /// Packet decoded but failed its integrity checks. Only produced by a strict
    /// [`super::Decoder`].
    #[error("suspect packet: {0}")]
    Suspect(Integrity),
}

pub type Result<T> = std::result::Result<T, Error>;
