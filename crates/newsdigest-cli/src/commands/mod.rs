pub mod analyze;
pub mod config;
pub mod preview;
pub mod run;
