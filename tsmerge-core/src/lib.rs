//! Qt Linguist `.ts` adapter core.
//!
//! Parses `.ts` files into text flows keyed by ids derived from context and
//! source text, reads existing translations, and writes translated copies of
//! the original file with externally supplied translations merged in.

pub mod error;
pub mod events;
pub mod model;
pub mod parsers;
pub mod protocol;
pub mod services;

pub use error::{AdapterError, Result};
