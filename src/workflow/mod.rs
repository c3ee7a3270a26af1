pub mod boundary;
pub mod translate_flow;

pub use boundary::{build_payload, extract_units, TagMismatch};
pub use translate_flow::{TranslateFlow, ValidationOutcome};
