//! Protocol Constants
//!
//! All magic numbers and default configuration values for the rpool engine.
//!
//! # Network Configuration
//!
//! Use feature flags to compile for different networks:
//! - `mainnet` - Production values (full-size stake units)
//! - Default (no feature) - Testnet values (small stake units for testing)
//!
//! ```toml
//! # For mainnet deployment:
//! rpool-common = { path = "...", features = ["mainnet"] }
//! ```

/// Value unit metadata
pub mod units {
    /// Decimal places of the pooled value unit
    pub const DECIMALS: u32 = 18;
    /// One whole unit with decimals (1 unit = 10^18 base units)
    pub const ONE: u128 = 1_000_000_000_000_000_000;
}

/// Fee Configuration
///
/// Fee rates are expressed over a 1000 scale: 100 = 10%, 10 = 1%.
pub mod fees {
    /// Denominator of the fee rate scale
    pub const FEE_DENOMINATOR: u16 = 1_000;

    /// Largest configurable fee rate (100% of growth)
    pub const MAX_FEE_RATE: u16 = 1_000;

    /// Default protocol fee rate (10% of growth)
    pub const DEFAULT_FEE_RATE: u16 = 100;

    /// Fractional digits needed to express a fee value exactly
    pub const FEE_VALUE_PRECISION: u32 = 3;
}

/// Batching Configuration
///
/// Values differ between mainnet and testnet to allow easier testing.
pub mod batching {
    use super::units::ONE;

    /// Default unit released to the external facility per batch slot
    /// - Mainnet: 32 units
    /// - Testnet: 1 unit (allows testing with faucet funds)
    #[cfg(feature = "mainnet")]
    pub const DEFAULT_UNIT_SIZE: u128 = 32 * ONE;
    #[cfg(not(feature = "mainnet"))]
    pub const DEFAULT_UNIT_SIZE: u128 = ONE;

    /// Upper bound on units released by a single flush
    pub const DEFAULT_MAX_UNITS_PER_FLUSH: u64 = 150;
}

/// Oracle Configuration
pub mod oracle {
    /// Maximum number of committee members
    pub const MAX_MEMBERS: usize = 256;

    /// Default number of matching reports required to apply one
    pub const DEFAULT_QUORUM: usize = 1;

    /// Basis-point denominator for report sanity bounds
    pub const BPS_DENOMINATOR: u64 = 10_000;

    /// Default maximum increase of the external balance per report (10%)
    pub const DEFAULT_MAX_INCREASE_BPS: u64 = 1_000;
}

/// Precision constants
pub mod precision {
    /// Fractional digits used when rendering the share rate
    pub const RATE_PRECISION: u32 = 18;

    /// Largest precision accepted by the decimal type
    pub const MAX_PRECISION: u32 = 77;
}
