//! Utility modules: timeout, text preview.

pub mod text;
pub mod timeout;
