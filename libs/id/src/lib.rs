//! # maitred-id
//!
//! Typed identifiers for the booking system.
//!
//! ## ID Format
//!
//! Every identifier uses a prefixed format: `{prefix}_{ulid}`
//!
//! Examples:
//! - `rsv_01HV4Z2WQXKJNM8GPQY6VBKC3D` (reservation)
//! - `rst_01HV4Z3MXNKPQR9HSTZ7WCLD4E` (restaurant)
//!
//! The prefix keeps a reservation id from being passed where a restaurant id
//! is expected, and ULIDs sort by creation time, which keeps listings stable.

mod error;
mod macros;
mod types;

pub use error::IdError;
pub use types::*;

/// Re-export ulid for consumers that need raw ULID operations
pub use ulid::Ulid;
