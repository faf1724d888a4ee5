//! Category directory wiring.
//!
//! Mapping indexes are addressed externally by name (`teams`, `sports`, ...)
//! and internally by `CategoryTag`. The directory is a verified bijection
//! between the two; callers use `resolve_category` to reject any name that
//! does not round-trip.

pub mod directory;

pub use directory::{CategoryTag, resolve_category};
