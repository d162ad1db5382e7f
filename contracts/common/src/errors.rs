//! Error Types for the rpool Engine
//!
//! Every failure is a typed rejection of the single operation that produced
//! it. Nothing is retried by the engine and no partial state survives an
//! error.

use thiserror::Error;

/// Result type alias for rpool operations
pub type PoolResult<T> = Result<T, PoolError>;

/// Main error enum for all rpool engine errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    // ============ Amount Errors ============
    /// Submit called with no value
    #[error("deposit value must be non-zero")]
    ZeroDeposit,

    /// Non-zero deposit that would mint zero shares at the current rate
    #[error("deposit of {value} mints no shares at the current rate")]
    DepositTooSmall { value: u128 },

    /// Burn or withdraw exceeds the account balance
    #[error("insufficient shares: available {available}, requested {requested}")]
    InsufficientShares { available: u128, requested: u128 },

    /// Release exceeds the buffered value
    #[error("insufficient buffer: available {available}, requested {requested}")]
    InsufficientBuffer { available: u128, requested: u128 },

    /// Withdrawal exceeds the value that is still buffered
    #[error("insufficient liquidity: available {available}, requested {requested}")]
    InsufficientLiquidity { available: u128, requested: u128 },

    // ============ Math Errors ============
    /// Arithmetic overflow occurred
    #[error("arithmetic overflow")]
    Overflow,

    /// Arithmetic underflow occurred
    #[error("arithmetic underflow")]
    Underflow,

    /// Division by zero
    #[error("division by zero")]
    DivisionByZero,

    /// Malformed decimal text
    #[error("invalid decimal {input:?}: {reason}")]
    InvalidDecimal { input: String, reason: &'static str },

    // ============ Authorization Errors ============
    /// Caller is not authorized for this operation
    #[error("unauthorized caller")]
    Unauthorized { expected: Option<[u8; 32]>, actual: [u8; 32] },

    // ============ Oracle Errors ============
    /// Report rejected by a sanity rule
    #[error("invalid report: {reason}")]
    InvalidReport { reason: &'static str },

    /// Reported external balance moved further than allowed
    #[error("report deviation {deviation_bps}bps exceeds {max_bps}bps")]
    OracleDeviation { deviation_bps: u64, max_bps: u64 },

    /// Member already voted in the current epoch
    #[error("member already reported for epoch {epoch}")]
    DuplicateVote { epoch: u64 },

    // ============ Input / Config Errors ============
    /// Invalid input parameter
    #[error("invalid {param}: {reason}")]
    InvalidInput { param: &'static str, reason: &'static str },

    /// Configuration rejected by validation
    #[error("invalid config {param}: {reason}")]
    InvalidConfig { param: &'static str, reason: String },

    // ============ State Errors ============
    /// Pool is paused
    #[error("pool is paused")]
    PoolPaused,

    /// External facility refused a released batch
    #[error("stake sink rejected batch of {units} units: {reason}")]
    SinkRejected { units: u64, reason: String },

    /// Flush or report attempted from inside a stake sink
    #[error("a flush is already in progress")]
    FlushInProgress,
}

impl PoolError {
    /// Returns a stable error code for logging/debugging
    pub fn code(&self) -> &'static str {
        match self {
            Self::ZeroDeposit => "E010_ZERO_DEPOSIT",
            Self::DepositTooSmall { .. } => "E011_DEPOSIT_TOO_SMALL",
            Self::InsufficientShares { .. } => "E012_INSUFFICIENT_SHARES",
            Self::InsufficientBuffer { .. } => "E013_INSUFFICIENT_BUFFER",
            Self::InsufficientLiquidity { .. } => "E014_INSUFFICIENT_LIQUIDITY",
            Self::Overflow => "E080_OVERFLOW",
            Self::Underflow => "E081_UNDERFLOW",
            Self::DivisionByZero => "E082_DIV_ZERO",
            Self::InvalidDecimal { .. } => "E083_INVALID_DECIMAL",
            Self::Unauthorized { .. } => "E020_UNAUTHORIZED",
            Self::InvalidReport { .. } => "E030_INVALID_REPORT",
            Self::OracleDeviation { .. } => "E031_ORACLE_DEVIATION",
            Self::DuplicateVote { .. } => "E032_DUPLICATE_VOTE",
            Self::InvalidInput { .. } => "E090_INVALID_INPUT",
            Self::InvalidConfig { .. } => "E091_INVALID_CONFIG",
            Self::PoolPaused => "E100_PAUSED",
            Self::SinkRejected { .. } => "E110_SINK_REJECTED",
            Self::FlushInProgress => "E111_FLUSH_IN_PROGRESS",
        }
    }

    /// Returns true if this error is recoverable (caller can fix it)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::InsufficientShares { .. } => true, // Withdraw less
            Self::InsufficientLiquidity { .. } => true, // Wait for deposits
            Self::DepositTooSmall { .. } => true,    // Deposit more
            Self::PoolPaused => true,                // Wait for resume
            Self::SinkRejected { .. } => true,       // Retry the flush later
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_error_codes_unique() {
        let errors = [
            PoolError::ZeroDeposit,
            PoolError::DepositTooSmall { value: 1 },
            PoolError::InsufficientShares { available: 0, requested: 1 },
            PoolError::InsufficientBuffer { available: 0, requested: 1 },
            PoolError::InsufficientLiquidity { available: 0, requested: 1 },
            PoolError::Overflow,
            PoolError::Underflow,
            PoolError::DivisionByZero,
            PoolError::InvalidDecimal { input: String::new(), reason: "empty" },
            PoolError::Unauthorized { expected: None, actual: [0u8; 32] },
            PoolError::InvalidReport { reason: "x" },
            PoolError::OracleDeviation { deviation_bps: 1, max_bps: 0 },
            PoolError::DuplicateVote { epoch: 0 },
            PoolError::InvalidInput { param: "p", reason: "r" },
            PoolError::InvalidConfig { param: "p", reason: String::new() },
            PoolError::PoolPaused,
            PoolError::SinkRejected { units: 1, reason: String::new() },
            PoolError::FlushInProgress,
        ];

        let codes: Vec<_> = errors.iter().map(|e| e.code()).collect();
        let unique: BTreeSet<_> = codes.iter().collect();
        assert_eq!(codes.len(), unique.len(), "Error codes must be unique");
    }

    #[test]
    fn test_display_messages() {
        let err = PoolError::InsufficientShares { available: 5, requested: 7 };
        assert_eq!(err.to_string(), "insufficient shares: available 5, requested 7");
        assert_eq!(PoolError::ZeroDeposit.to_string(), "deposit value must be non-zero");
    }

    #[test]
    fn test_recoverable() {
        assert!(PoolError::PoolPaused.is_recoverable());
        assert!(!PoolError::Overflow.is_recoverable());
        assert!(!PoolError::ZeroDeposit.is_recoverable());
    }
}
