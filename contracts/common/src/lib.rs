//! rpool Common Library
//!
//! Shared types, constants, and utilities for the rebasing-pool
//! share-accounting engine.
//!
//! ## Numeric Discipline
//!
//! There is no floating point anywhere in the engine. Amounts are `u128`
//! base units; every ratio is computed with truncating integer arithmetic,
//! and products wider than 128 bits are evaluated through
//! [`FixedPointDecimal`], an exact scaled-integer decimal. Two
//! implementations following these rules agree on every unit.
//!
//! ## Modules
//!
//! - **constants**: Defaults and network-dependent values
//! - **errors**: `PoolError` taxonomy with stable codes
//! - **types**: Identity alias and deployment config (`PoolConfig`)
//! - **decimal**: `FixedPointDecimal` and its wire format
//! - **math**: Checked `u128` helpers and `mul_div_floor`
//! - **access_control**: Role checks for the caller-side access layer

pub mod constants;
pub mod errors;
pub mod types;
pub mod decimal;
pub mod math;
pub mod access_control;

// Re-exports for convenience
pub use constants::*;
pub use errors::*;
pub use types::*;
pub use decimal::FixedPointDecimal;
pub use math::*;
pub use access_control::*;
