pub mod batcher;
pub mod latex_parser;
pub mod llm_service;
pub mod warn_writer;

pub use batcher::{batch_units, estimate_tokens, UnitBatch};
pub use latex_parser::{load_document_template, parse_beamer_tex, read_and_parse};
pub use llm_service::{LlmService, Translator};
pub use warn_writer::WarnWriter;
