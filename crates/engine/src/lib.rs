//! TrionForge Engine library.
//!
//! Server-side code for the character builder.
//!
//! ## Structure
//!
//! - `use_cases/` - Limit resolution, editor sessions, and auth orchestration
//! - `stores/` - In-memory draft and session state
//! - `infrastructure/` - External dependency implementations (ports + adapters)
//! - `api/` - HTTP entry points
//! - `app` - Application composition

pub mod api;
pub mod app;
pub mod infrastructure;
pub mod stores;
pub mod use_cases;

pub use app::App;
