//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod demo;
pub mod exports;
pub mod imports;
pub mod templates;

// Re-export all handlers for use in router
pub use demo::*;
pub use exports::*;
pub use imports::*;
pub use templates::*;
