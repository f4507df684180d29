//! Agenda label lookup.
//!
//! A small JSON lookup document in the object store maps composite keys of
//! governing-body code and cleaned agenda-item reference to human-readable
//! labels. The extended package record carries the label when one resolves.

use crate::store::{ObjectStore, StoreError};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

/// Default key of the lookup document in the object store.
pub const AGENDA_LOOKUP_KEY: &str = "lookup/agenda.json";

#[derive(Error, Debug)]
pub enum AgendaError {
    #[error("store error: {0}")]
    StoreError(#[from] StoreError),

    #[error("lookup document is not valid JSON: {0}")]
    JsonError(#[from] serde_json::Error),
}

#[derive(Debug, Default)]
pub struct AgendaLookup {
    entries: HashMap<String, String>,
}

impl AgendaLookup {
    /// Load the lookup document. A missing document yields an empty lookup
    /// rather than an error; agenda labels are best-effort.
    pub async fn load(store: &dyn ObjectStore, key: &str) -> Result<Self, AgendaError> {
        if !store.exists(key).await? {
            debug!(%key, "no agenda lookup document, labels disabled");
            return Ok(Self::default());
        }
        let bytes = store.read(key).await?;
        let entries: HashMap<String, String> = serde_json::from_slice(&bytes)?;
        Ok(Self { entries })
    }

    /// Composite key: governing-body document code plus the cleaned
    /// agenda-item reference.
    pub fn agenda_key(body_code: &str, item: &str) -> String {
        let body = body_code.trim().to_ascii_uppercase();
        let item = item.trim().trim_end_matches('.');
        format!("{body};{item}")
    }

    /// Body code for a symbol: its first path segment (`A/68/100` → `A`).
    pub fn body_code(symbol: &str) -> &str {
        symbol.split('/').next().unwrap_or(symbol)
    }

    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Resolve the label for a package's agenda reference, if any.
    pub fn label_for(&self, symbol: &str, agenda_reference: &str) -> Option<&str> {
        let key = Self::agenda_key(Self::body_code(symbol), agenda_reference);
        self.lookup(&key)
    }
}
