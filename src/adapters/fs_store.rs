//! Filesystem node store.
//!
//! Persists the registered-node set as one small JSON document:
//!
//! ```json
//! {"nodes":[{"id":1,"mac":"AA:BB:CC:11:22:33","type":1,"name":"Node_1"}]}
//! ```
//!
//! Writes replace the whole file; the set is tiny (max 32 records) and only
//! changes on pair/remove, so there is nothing worth doing incrementally.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::app::ports::{NodeStorePort, PersistedNode};
use crate::error::StoreError;

#[derive(Serialize, Deserialize)]
struct NodeDocument {
    nodes: Vec<PersistedNode>,
}

/// JSON-file-backed [`NodeStorePort`].
pub struct FileNodeStore {
    path: PathBuf,
}

impl FileNodeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl NodeStorePort for FileNodeStore {
    fn save(&mut self, nodes: &[PersistedNode]) -> Result<(), StoreError> {
        let doc = NodeDocument {
            nodes: nodes.to_vec(),
        };
        let json = serde_json::to_string_pretty(&doc).map_err(|_| StoreError::Io)?;
        fs::write(&self.path, json).map_err(|_| StoreError::Io)
    }

    fn load(&self) -> Result<Vec<PersistedNode>, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(StoreError::NotFound),
            Err(_) => return Err(StoreError::Io),
        };
        serde_json::from_str::<NodeDocument>(&text)
            .map(|doc| doc.nodes)
            .map_err(|_| StoreError::Corrupted)
    }
}
