//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod admin;
pub mod budgets;
pub mod forecast;
pub mod profile;
pub mod reports;
pub mod status;
pub mod transactions;

// Re-export all handlers for use in router
pub use admin::*;
pub use budgets::*;
pub use forecast::*;
pub use profile::*;
pub use reports::*;
pub use status::*;
pub use transactions::*;
