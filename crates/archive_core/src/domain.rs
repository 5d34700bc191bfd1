//! crates/archive_core/src/domain.rs
//!
//! Defines the pure, core data structures for the archive.
//! Field names follow the JSON shape used by existing stores and backup files,
//! so a record written by any earlier build still loads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

//=========================================================================================
// Identity
//=========================================================================================

/// Opaque document identifier. The only key used for deduplication and deletion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Generates a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for DocumentId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for DocumentId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

//=========================================================================================
// Document
//=========================================================================================

/// The closed set of document classes. Serialized with the labels the
/// archive has always stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Facture")]
    Invoice,
    #[serde(rename = "Bon de Livraison")]
    DeliveryNote,
    #[serde(rename = "Contrat")]
    Contract,
    #[serde(rename = "Preuve de Livraison")]
    ProofOfDelivery,
    #[serde(rename = "Autre")]
    Other,
}

impl Category {
    /// The stored label, also written to the `type` column of the structured store.
    pub fn label(self) -> &'static str {
        match self {
            Category::Invoice => "Facture",
            Category::DeliveryNote => "Bon de Livraison",
            Category::Contract => "Contrat",
            Category::ProofOfDelivery => "Preuve de Livraison",
            Category::Other => "Autre",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Metadata produced by the external extraction step.
///
/// Opaque to the archive: whatever JSON the extractor wrote is stored and
/// written back unchanged, whatever the type of each field. The accessors
/// only read; they never reject a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentMetadata(Value);

impl Default for DocumentMetadata {
    fn default() -> Self {
        Self(Value::Object(Map::new()))
    }
}

impl DocumentMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key`, turning a non-object payload into an object first.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        if !self.0.is_object() {
            self.0 = Value::Object(Map::new());
        }
        if let Value::Object(map) = &mut self.0 {
            map.insert(key.to_string(), value.into());
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The field as text, if it is a JSON string.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn company_name(&self) -> Option<&str> {
        self.text("companyName")
    }

    /// Extracted amount, kept in whatever form the extractor produced.
    pub fn amount(&self) -> Option<&Value> {
        self.get("amount").filter(|v| !v.is_null())
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for DocumentMetadata {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Reads a `null` string field as empty text.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A scanned or uploaded logistics document with its extracted metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: DocumentId,
    pub file_name: String,
    pub file_type: String,
    /// Base64 text of the original artifact.
    #[serde(rename = "base64Data")]
    pub binary_payload: String,
    pub upload_date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub category: Category,
    #[serde(default)]
    pub metadata: DocumentMetadata,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub full_text: String,
    #[serde(default)]
    pub is_duplicate: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duplicate_of_id: Option<DocumentId>,
}

impl Document {
    /// Creates a document with a freshly generated id, uploaded now.
    pub fn new(
        file_name: impl Into<String>,
        file_type: impl Into<String>,
        binary_payload: impl Into<String>,
        category: Category,
        metadata: DocumentMetadata,
        full_text: impl Into<String>,
    ) -> Self {
        Self {
            id: DocumentId::generate(),
            file_name: file_name.into(),
            file_type: file_type.into(),
            binary_payload: binary_payload.into(),
            upload_date: Utc::now(),
            category,
            metadata,
            full_text: full_text.into(),
            is_duplicate: false,
            duplicate_of_id: None,
        }
    }
}

//=========================================================================================
// Collection
//=========================================================================================

/// The ordered, newest-first set of archived documents.
///
/// No two documents share an id. Every constructor and mutator keeps that
/// invariant, so a `Collection` can be handed to storage without re-checking.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "Vec<Document>")]
pub struct Collection {
    documents: Vec<Document>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a collection from arbitrary documents.
    ///
    /// A repeated id keeps the position of its first occurrence and the value
    /// of its last one.
    pub fn from_documents(documents: impl IntoIterator<Item = Document>) -> Self {
        let mut positions: HashMap<DocumentId, usize> = HashMap::new();
        let mut deduped: Vec<Document> = Vec::new();
        for doc in documents {
            match positions.get(&doc.id) {
                Some(&pos) => deduped[pos] = doc,
                None => {
                    positions.insert(doc.id.clone(), deduped.len());
                    deduped.push(doc);
                }
            }
        }
        Self { documents: deduped }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Document> {
        self.documents.iter()
    }

    pub fn as_slice(&self) -> &[Document] {
        &self.documents
    }

    pub fn get(&self, id: &DocumentId) -> Option<&Document> {
        self.documents.iter().find(|d| &d.id == id)
    }

    pub fn contains(&self, id: &DocumentId) -> bool {
        self.get(id).is_some()
    }

    pub fn ids(&self) -> Vec<&DocumentId> {
        self.documents.iter().map(|d| &d.id).collect()
    }

    /// Puts `doc` at the front. A document already holding the same id is
    /// removed and returned.
    pub fn prepend(&mut self, doc: Document) -> Option<Document> {
        let replaced = self.remove(&doc.id);
        self.documents.insert(0, doc);
        replaced
    }

    /// Removes the document with `id`, keeping the order of the rest.
    pub fn remove(&mut self, id: &DocumentId) -> Option<Document> {
        let pos = self.documents.iter().position(|d| &d.id == id)?;
        Some(self.documents.remove(pos))
    }

    /// Appends `doc` unless its id is already present. Returns whether it was added.
    pub(crate) fn push_if_absent(&mut self, doc: Document) -> bool {
        if self.contains(&doc.id) {
            return false;
        }
        self.documents.push(doc);
        true
    }

    pub fn into_vec(self) -> Vec<Document> {
        self.documents
    }
}

impl From<Vec<Document>> for Collection {
    fn from(documents: Vec<Document>) -> Self {
        Self::from_documents(documents)
    }
}

impl FromIterator<Document> for Collection {
    fn from_iter<I: IntoIterator<Item = Document>>(iter: I) -> Self {
        Self::from_documents(iter)
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a Document;
    type IntoIter = std::slice::Iter<'a, Document>;

    fn into_iter(self) -> Self::IntoIter {
        self.documents.iter()
    }
}

impl Serialize for Collection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.documents.serialize(serializer)
    }
}

//=========================================================================================
// Backup Bundle
//=========================================================================================

/// Portable export container for a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupBundle {
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub documents: Collection,
}
