use thiserror::Error;

/// Errors which abort an exchange run. None of them is recoverable: a rank hitting one of these
/// leaves its result vector in an undefined state.
#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("Rank {rank} is not valid for a ring of {size} participants")]
    InvalidTopology { rank: u32, size: u32 },

    #[error("Message vector has {actual} entries, but the ring has {expected} participants")]
    MessageLength { expected: usize, actual: usize },

    #[error("Communicator reports rank {comm_rank} of {comm_size}, but exchange was set up for rank {rank} of {size}")]
    CommunicatorMismatch {
        rank: u32,
        size: u32,
        comm_rank: u32,
        comm_size: u32,
    },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Process {rank} stopped waiting, because another process has left the exchange")]
    PeerLeft { rank: u32 },

    #[error("Received {actual} values from process {from}, expected {expected}")]
    ShortReceive {
        from: u32,
        expected: usize,
        actual: usize,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to set up logging: {0}")]
    Logging(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse yaml config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, ExchangeError>;

#[cfg(test)]
mod tests {
    use crate::exchange::error::ExchangeError;

    #[test]
    fn display_short_receive() {
        let err = ExchangeError::ShortReceive {
            from: 2,
            expected: 3,
            actual: 1,
        };
        assert_eq!("Received 1 values from process 2, expected 3", err.to_string());
    }

    #[test]
    fn display_invalid_topology() {
        let err = ExchangeError::InvalidTopology { rank: 4, size: 4 };
        assert_eq!(
            "Rank 4 is not valid for a ring of 4 participants",
            err.to_string()
        );
    }
}
