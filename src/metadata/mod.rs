mod language;
mod parse;
mod row;

pub use language::Language;
pub use parse::{parse_batch, ParseOutcome, ParseWarning};
pub use row::{derive_filename, MetadataRow};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("metadata batch is empty or has no header row")]
    EmptyBatch,

    #[error("header is missing required column '{0}'")]
    MissingColumn(&'static str),
}
