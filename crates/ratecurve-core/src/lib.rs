//! # Ratecurve Core
//!
//! Core types shared across the curve bootstrapping workspace.
//!
//! - **Types**: [`types::Date`], the calendar date used by schedules and curves.
//! - **Errors**: [`error::CoreError`], the error enum for this crate.
//!
//! ## Design Philosophy
//!
//! - **Type Safety**: newtypes prevent mixing incompatible values.
//! - **Explicit Over Implicit**: clear, self-documenting APIs.
//!
//! ## Example
//!
//! ```rust
//! use ratecurve_core::prelude::*;
//!
//! let date = Date::from_ymd(2025, 6, 15).unwrap();
//! let rolled = date.add_months(6).unwrap();
//! assert_eq!(rolled.month(), 12);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod types;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{CoreError, CoreResult};
    pub use crate::types::Date;
}

// Re-export commonly used types at crate root
pub use error::{CoreError, CoreResult};
pub use types::Date;
