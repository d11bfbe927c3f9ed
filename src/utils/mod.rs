//! Utility functions shared across layers.
//!
//! - [`code_generator`] - Short code generation and alias validation
//! - [`db_error`] - SQLx error classification

pub mod code_generator;
pub mod db_error;
