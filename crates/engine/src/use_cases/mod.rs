//! Use cases - User story orchestration.
//!
//! Each module contains use cases for a specific area of the editor.

pub mod auth;
pub mod editor;
pub mod limits;

pub use auth::AuthUseCases;
pub use editor::{EditorContext, EditorError, EditorSession, EditorSnapshot};
pub use limits::{LimitError, LimitProvider, LimitSource, ResolvedLimits};
