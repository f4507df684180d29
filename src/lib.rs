pub mod agenda;
pub mod config;
pub mod ingest;
pub mod metadata;
pub mod package;
pub mod pdfinfo;
pub mod reconcile;
pub mod records;
pub mod report;
pub mod store;
pub mod utils;

// Re-export commonly used types
pub use agenda::{AgendaLookup, AGENDA_LOOKUP_KEY};
pub use config::{read_credentials, Config, ConfigError, Credentials};
pub use ingest::{ingest_key, ingest_keys, ingest_latest, IngestError};
pub use metadata::{parse_batch, Language, MetadataRow, ParseError, ParseOutcome};
pub use package::{
    evaluate, Assembler, DocumentPackage, FileExpectation, FileStatus,
};
pub use pdfinfo::{
    parse_unlabeled_pdfs, InfoScanExtractor, PdfExtractor, PdfInfo, PdfInfoError,
};
pub use reconcile::{reconcile_errors, ReconcileError, RunSummary};
pub use records::{
    FileRecord, JsonRecordStore, MissingFile, PackageRecord, PackageStatus, RecordError,
    RecordStore,
};
pub use report::{generate_report, ReportError, ReportRange};
pub use store::{FsObjectStore, ObjectStore, PresenceResolver, RetryPolicy, StoreError};
