//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Init, template listing and shared utilities (open_db, load_config)
//! - `import` - CSV import and sample seeding
//! - `export` - CSV / XLSX export of the latest calculation
//! - `serve` - Web server command
//! - `status` - Latest calculation, history and reset

pub mod core;
pub mod export;
pub mod import;
pub mod serve;
pub mod status;

// Re-export command functions for main.rs
pub use core::*;
pub use export::*;
pub use import::*;
pub use serve::*;
pub use status::*;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
