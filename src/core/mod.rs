//! Core profile pipeline
//!
//! Data structures shared across the crate, the seams to external
//! collaborators, associate expansion, and the orchestrator that turns a
//! request into an ordered profile.

pub mod data;
pub mod operations;
pub mod relationship;
pub mod traits;
