//! Value Objects
//!
//! Immutable objects defined by their attributes rather than identity.

mod pagination;

pub use pagination::*;
