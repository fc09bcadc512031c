use thiserror::Error;

/// Failures reported by a ledger gateway for a single submitted call.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("transaction rejected: {0}")]
    Rejected(String),

    #[error("transaction failed on ledger: {0}")]
    Failed(String),

    #[error("timed out waiting for transaction {0}")]
    Timeout(String),

    #[error("network error: {0}")]
    Network(String),
}

#[derive(Error, Debug)]
pub enum OperatorError {
    // Encoding errors - must surface before any network call
    #[error("value exceeds encoder magnitude: {0}")]
    EncodingOverflow(String),

    #[error("malformed address in payload: {0}")]
    MalformedAddress(String),

    // Action errors
    #[error("action failed: {0}")]
    Action(#[from] GatewayError),

    #[error("action timed out after {0}s")]
    ActionTimeout(u64),

    // Persistence errors
    #[error("state snapshot write failed: {0}")]
    Persistence(String),

    #[error("state snapshot load failed: {0}")]
    StateLoad(String),

    // Wallet pool errors
    #[error("wallet file error: {0}")]
    WalletFile(String),

    #[error("unknown wallet: {0}")]
    UnknownWallet(String),

    // Configuration errors
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("configuration load failed: {0}")]
    ConfigurationLoad(String),

    // System errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl OperatorError {
    /// Check if the failed operation may succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            OperatorError::Action(GatewayError::Rejected(_)) => false,
            OperatorError::Action(_)
            | OperatorError::ActionTimeout(_)
            | OperatorError::Persistence(_) => true,
            _ => false,
        }
    }

    /// Get error category for logging/metrics
    pub fn category(&self) -> &'static str {
        match self {
            OperatorError::EncodingOverflow(_) | OperatorError::MalformedAddress(_) => "encoding",

            OperatorError::Action(_) | OperatorError::ActionTimeout(_) => "action",

            OperatorError::Persistence(_) | OperatorError::StateLoad(_) => "persistence",

            OperatorError::WalletFile(_) | OperatorError::UnknownWallet(_) => "pool",

            OperatorError::InvalidConfiguration(_) | OperatorError::ConfigurationLoad(_) => {
                "configuration"
            }

            OperatorError::Io(_) | OperatorError::Serialization(_) => "system",
        }
    }
}

// Result type alias for convenience
pub type OperatorResult<T> = Result<T, OperatorError>;
