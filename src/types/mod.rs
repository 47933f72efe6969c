//! Core types for Parley.

pub mod agent;
pub mod message;
pub mod tool_result;

pub use agent::*;
pub use message::*;
pub use tool_result::*;
