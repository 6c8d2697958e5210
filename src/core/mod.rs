//! Core traits, types, and constants.
//!
//! Nothing in here does I/O. It defines the wire constants,
//! the error types shared by every layer, and the two capabilities the link
//! consumes: a [`Transport`] to push bytes out and a [`Client`] to hand
//! validated payloads up.

mod constants;
mod error;
mod traits;

pub use constants::*;
pub use error::*;
pub use traits::*;
