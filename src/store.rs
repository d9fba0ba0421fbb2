//! # Script Store
//!
//! Persistence seam. The compiler never performs I/O itself: scripts and
//! contexts are handed over fully materialized by a [`DialplanStore`].

use crate::error::StoreError;
use crate::model::{Context, Script, ScriptId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Read;

/// Source of scripts and contexts.
pub trait DialplanStore: Send + Sync {
    /// Load one script with all of its blocks and connections.
    fn load_script(&self, id: ScriptId) -> Result<Script, StoreError>;

    /// Load every context in output order. Extension scripts are referenced
    /// by id only; callers resolve them through [`load_script`](Self::load_script).
    fn load_contexts(&self) -> Result<Vec<Context>, StoreError>;
}

/// Store backed by in-process data.
///
/// Can be built programmatically or from a JSON document shaped like:
///
/// ```json
/// {
///   "scripts": [{ "id": 1, "name": "inbound", "blocks": [], "connections": [] }],
///   "contexts": [{ "name": "incoming", "extensions": [{ "name": "100", "script_id": 1 }] }]
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    scripts: HashMap<ScriptId, Script>,
    contexts: Vec<Context>,
}

#[derive(Deserialize, Serialize)]
struct StoreDocument {
    #[serde(default)]
    scripts: Vec<Script>,
    #[serde(default)]
    contexts: Vec<Context>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_script(&mut self, script: Script) {
        self.scripts.insert(script.id, script);
    }

    pub fn push_context(&mut self, context: Context) {
        self.contexts.push(context);
    }

    pub fn with_script(mut self, script: Script) -> Self {
        self.insert_script(script);
        self
    }

    pub fn with_context(mut self, context: Context) -> Self {
        self.push_context(context);
        self
    }

    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        let document: StoreDocument = serde_json::from_str(json)?;
        Ok(Self::from_document(document))
    }

    pub fn from_reader(reader: impl Read) -> Result<Self, StoreError> {
        let document: StoreDocument = serde_json::from_reader(reader)?;
        Ok(Self::from_document(document))
    }

    fn from_document(document: StoreDocument) -> Self {
        let mut store = Self::new();
        for script in document.scripts {
            store.insert_script(script);
        }
        store.contexts = document.contexts;
        tracing::debug!(
            "[STORE] Loaded {} scripts and {} contexts",
            store.scripts.len(),
            store.contexts.len()
        );
        store
    }
}

impl DialplanStore for InMemoryStore {
    fn load_script(&self, id: ScriptId) -> Result<Script, StoreError> {
        self.scripts
            .get(&id)
            .cloned()
            .ok_or(StoreError::ScriptNotFound(id))
    }

    fn load_contexts(&self) -> Result<Vec<Context>, StoreError> {
        // scripts are resolved separately, by id
        Ok(self
            .contexts
            .iter()
            .cloned()
            .map(|mut context| {
                for extension in &mut context.extensions {
                    extension.script = None;
                }
                context
            })
            .collect())
    }
}
