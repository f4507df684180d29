mod assemble;
mod evaluate;
mod types;

pub use assemble::{AssembleOutcome, Assembler, MISSING_PRIMARY_MARKER};
pub use evaluate::{evaluate, merge_into_run};
pub use types::{DocumentPackage, FileExpectation, FileStatus};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssembleError {
    #[error("store error: {0}")]
    StoreError(#[from] crate::store::StoreError),

    #[error("record error: {0}")]
    RecordError(#[from] crate::records::RecordError),
}
