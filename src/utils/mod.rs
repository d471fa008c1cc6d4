pub mod error;
pub mod format;
pub mod output;

pub use output::*;
