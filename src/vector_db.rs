use std::fs;
use std::path::PathBuf;

use ndarray::Array1;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, VocabError};
use crate::utils::{WordRecord, ensure_dir};

const INDEX_FILE: &str = "index.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub record: WordRecord,
    pub embedding: Array1<f32>,
}

/// On-disk layout of `index.json`.
#[derive(Serialize, Deserialize)]
struct IndexFile {
    embedding_model: String,
    dimension: usize,
    documents: Vec<Document>,
}

/// Exhaustive cosine-similarity index over embedded word records,
/// persisted as a single JSON file inside `dir`.
pub struct VectorDB {
    dir: PathBuf,
    embedding_model: String,
    dimension: usize,
    documents: Vec<Document>,
    keys: FxHashSet<(String, usize)>,
}

impl VectorDB {
    pub fn new(dir: impl Into<PathBuf>, embedding_model: impl Into<String>, dimension: usize) -> Self {
        VectorDB {
            dir: dir.into(),
            embedding_model: embedding_model.into(),
            dimension,
            documents: Vec::new(),
            keys: FxHashSet::default(),
        }
    }

    /// Opens the index persisted in `dir`. `Ok(None)` when nothing was
    /// persisted there yet.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Option<Self>> {
        let dir = dir.into();
        let path = dir.join(INDEX_FILE);
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&path)
            .map_err(|e| VocabError::IndexLoad(format!("{}: {e}", path.display())))?;
        let file: IndexFile = serde_json::from_str(&contents)
            .map_err(|e| VocabError::IndexLoad(format!("{}: {e}", path.display())))?;

        let mut db = VectorDB::new(dir, file.embedding_model, file.dimension);
        for document in file.documents {
            db.insert(document).map_err(|e| VocabError::IndexLoad(e.to_string()))?;
        }

        debug!("Opened vector database with {} records", db.len());
        Ok(Some(db))
    }

    /// Adds one document per record. Records and embeddings pair up by position.
    pub fn add_documents(&mut self, records: Vec<WordRecord>, embeddings: Vec<Vec<f32>>) -> Result<usize> {
        if records.len() != embeddings.len() {
            return Err(VocabError::Embedding(format!(
                "{} records but {} embeddings",
                records.len(),
                embeddings.len()
            )));
        }

        let mut added = 0;
        for (record, embedding) in records.into_iter().zip(embeddings) {
            self.insert(Document {
                id: uuid::Uuid::new_v4().to_string(),
                record,
                embedding: Array1::from(embedding),
            })?;
            added += 1;
        }
        Ok(added)
    }

    fn insert(&mut self, document: Document) -> Result<()> {
        if document.embedding.len() != self.dimension {
            return Err(VocabError::Embedding(format!(
                "line {}: expected {} dimensions, got {}",
                document.record.line_number,
                self.dimension,
                document.embedding.len()
            )));
        }

        let key = (document.record.source_file.clone(), document.record.line_number);
        if !self.keys.insert(key) {
            return Err(VocabError::Embedding(format!(
                "duplicate record for {}:{}",
                document.record.source_file, document.record.line_number
            )));
        }

        self.documents.push(document);
        Ok(())
    }

    /// Writes the index to `dir`, replacing any previous file.
    pub fn persist(&self) -> Result<()> {
        ensure_dir(&self.dir)?;

        let file = IndexFile {
            embedding_model: self.embedding_model.clone(),
            dimension: self.dimension,
            documents: self.documents.clone(),
        };
        let json = serde_json::to_string(&file)
            .map_err(|e| VocabError::IndexLoad(format!("failed to serialize index: {e}")))?;

        let tmp = self.dir.join(format!("{INDEX_FILE}.tmp"));
        fs::write(&tmp, json)?;
        fs::rename(&tmp, self.dir.join(INDEX_FILE))?;

        info!("Persisted {} records to {}", self.len(), self.dir.display());
        Ok(())
    }

    /// Top `top_k` documents by cosine similarity, best first. Equal scores
    /// keep insertion order.
    pub fn search_similar(&self, query: &[f32], top_k: usize) -> Vec<(f32, &Document)> {
        let query_embedding = Array1::from(query.to_vec());

        let mut similarities: Vec<(f32, &Document)> = self
            .documents
            .iter()
            .map(|doc| (cosine_similarity(&doc.embedding, &query_embedding), doc))
            .collect();

        similarities.sort_by(|a, b| b.0.total_cmp(&a.0));
        similarities.truncate(top_k);
        similarities
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

fn cosine_similarity(a: &Array1<f32>, b: &Array1<f32>) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product = a.dot(b);
    let norm_a = a.dot(a).sqrt();
    let norm_b = b.dot(b).sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot_product / (norm_a * norm_b)
    }
}
