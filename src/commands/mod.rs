//! Command implementations

pub mod details;
pub mod dispatch;
pub mod run;
