//! In-memory state storage modules.
//!
//! Stores manage runtime state that doesn't belong in the database:
//! - `DraftStore` - The character being edited, with undo history
//! - `SessionStore` - Open editor sessions by id

pub mod draft;
pub mod session;

pub use draft::DraftStore;
pub use session::SessionStore;
