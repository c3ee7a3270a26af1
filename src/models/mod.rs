pub mod document;

pub use document::{BeamerDocument, BodyPart, ContentUnit, DocumentTemplate, UnitKind};
