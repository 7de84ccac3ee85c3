mod analyzer;
mod prompt;
pub mod providers;

pub use analyzer::{Analysis, Analyzer};
pub use prompt::DEFAULT_PROMPT;
