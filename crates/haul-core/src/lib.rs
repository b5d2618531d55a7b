//! # haul-core
//!
//! Core types shared across Haulage crates.
//!
//! - [`identity::Identity`]: read-only projection of a backend account
//! - [`enums::Role`] and [`enums::SessionStatus`]: permission classes and
//!   the derived state of a resolved session
//! - [`errors::CoreError`]: cross-cutting error type

pub mod enums;
pub mod errors;
pub mod identity;

pub use enums::{Role, SessionStatus};
pub use errors::CoreError;
pub use identity::Identity;
