//! Centralized error handling for the Pokedex browser
//!
//! # Error Categories
//!
//! - **Source Errors**: catalog transport, HTTP status and payload failures,
//!   plus malformed summary records
//! - **Color Errors**: sprite decoding, cancellation and task failures
//! - **Configuration Errors**: invalid settings
//!
//! # Usage
//!
//! ```rust
//! use pokedex_browser::errors::{AppError, AppResult, SourceError};
//!
//! fn example_function() -> AppResult<u32> {
//!     Err(SourceError::malformed("https://pokeapi.co/api/v2/pokemon/").into())
//! }
//!
//! assert!(matches!(example_function(), Err(AppError::Source(_))));
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for Source Results
pub type SourceResult<T> = Result<T, SourceError>;

/// Convenience type alias for Color Results
pub type ColorResult<T> = Result<T, ColorError>;
