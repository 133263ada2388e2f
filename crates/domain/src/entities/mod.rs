//! Domain entities - Core business objects

mod character_record;
mod draft;

pub use character_record::CharacterRecord;
pub use draft::{CharacterDraft, FieldPath, FieldUpdate, FieldValue};
