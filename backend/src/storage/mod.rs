//! # Storage Layer
//!
//! Persistence for the tutoring tracker. Every entity collection lives in a
//! JSON file under the data directory; repositories expose typed access to
//! those files behind the traits in [`traits`], so the domain layer never
//! touches the filesystem directly.

pub mod json;
pub mod traits;

pub use json::JsonConnection;
