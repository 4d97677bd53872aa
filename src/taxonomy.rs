//! The caller-supplied list of document types a document can be filed under.
//!
//! Definitions are JSON. The canonical layout is
//!
//! ```json
//! {
//!   "documents": [
//!     {
//!       "type_document": "Facture",
//!       "description": "Document commercial réclamant un paiement.",
//!       "champs": [{ "nom": "montant" }, { "nom": "date" }]
//!     }
//!   ]
//! }
//! ```
//!
//! A bare array of entries, the English keys `type_name` / `fields`, and
//! fields written as plain strings are accepted as well.

use crate::error::DocClassError;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// One document category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyEntry {
    #[serde(alias = "type_document")]
    pub type_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(alias = "champs", default, deserialize_with = "deserialize_fields")]
    pub fields: Vec<String>,
}

impl TaxonomyEntry {
    pub fn new(
        type_name: impl Into<String>,
        description: impl Into<String>,
        fields: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            description: description.into(),
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}

/// An ordered, non-empty list of [`TaxonomyEntry`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Taxonomy {
    entries: Vec<TaxonomyEntry>,
}

impl Taxonomy {
    /// Build a taxonomy from entries, keeping their order.
    pub fn new(entries: Vec<TaxonomyEntry>) -> Result<Self, DocClassError> {
        if entries.is_empty() {
            return Err(DocClassError::EmptyTaxonomy);
        }
        Ok(Self { entries })
    }

    /// Read and decode a taxonomy definition file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, DocClassError> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DocClassError::TaxonomyNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                DocClassError::Internal(format!("reading {}: {}", path.display(), e))
            }
        })?;
        let taxonomy = Self::from_json_str(&raw)?;
        info!(
            "Taxonomy loaded from {}: {} document types",
            path.display(),
            taxonomy.len()
        );
        Ok(taxonomy)
    }

    /// Decode a taxonomy from its JSON text.
    pub fn from_json_str(raw: &str) -> Result<Self, DocClassError> {
        let file: TaxonomyFile =
            serde_json::from_str(raw).map_err(|e| DocClassError::TaxonomyParse {
                detail: e.to_string(),
            })?;
        let entries = match file {
            TaxonomyFile::Wrapped { documents } => documents,
            TaxonomyFile::Bare(entries) => entries,
        };
        debug!("Decoded {} taxonomy entries", entries.len());
        Self::new(entries)
    }

    pub fn entries(&self) -> &[TaxonomyEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.type_name.as_str())
    }

    /// Find the entry whose `type_name` equals `candidate`, ignoring case
    /// and surrounding whitespace.
    ///
    /// Pure lookup: the caller decides what a miss means.
    pub fn resolve(&self, candidate: &str) -> Option<&TaxonomyEntry> {
        let wanted = candidate.trim().to_lowercase();
        self.entries
            .iter()
            .find(|e| e.type_name.to_lowercase() == wanted)
    }
}

impl<'a> IntoIterator for &'a Taxonomy {
    type Item = &'a TaxonomyEntry;
    type IntoIter = std::slice::Iter<'a, TaxonomyEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

// ── Wire format ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(untagged)]
enum TaxonomyFile {
    Wrapped { documents: Vec<TaxonomyEntry> },
    Bare(Vec<TaxonomyEntry>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FieldSpec {
    Named {
        #[serde(alias = "nom")]
        name: String,
    },
    Plain(String),
}

fn deserialize_fields<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let specs = Vec::<FieldSpec>::deserialize(deserializer)?;
    Ok(specs
        .into_iter()
        .map(|f| match f {
            FieldSpec::Named { name } => name,
            FieldSpec::Plain(name) => name,
        })
        .collect())
}
