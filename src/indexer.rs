use std::path::Path;

use tracing::{info, warn};

use crate::embedder::Embedder;
use crate::error::{Result, VocabError};
use crate::ui::Notifier;
use crate::utils::load_word_records;
use crate::vector_db::VectorDB;

/// Records embedded per call to the embedding model.
const EMBEDDING_BATCH_SIZE: usize = 64;

/// Returns a ready-to-query index for `data_path`.
///
/// A loadable, non-empty index already persisted in `db_dir` is returned
/// as is, without embedding anything. Corpus changes are not detected;
/// delete `db_dir` to force a rebuild.
pub fn index_data(
    data_path: &Path,
    db_dir: &Path,
    embedder: &dyn Embedder,
    notifier: &dyn Notifier,
) -> Result<VectorDB> {
    if db_dir.exists() {
        match load_existing(db_dir, embedder) {
            Ok(Some(db)) => {
                notifier.info(&format!(
                    "Vector database loaded from disk. Total records: {}",
                    db.len()
                ));
                return Ok(db);
            }
            Ok(None) => {}
            Err(e) => {
                warn!("Discarding persisted index: {}", e);
                notifier.warning(&format!("Error loading vector database ({e}). Rebuilding..."));
            }
        }
    }

    build(data_path, db_dir, embedder, notifier)
}

/// `Ok(None)` when nothing usable is on disk yet.
fn load_existing(db_dir: &Path, embedder: &dyn Embedder) -> Result<Option<VectorDB>> {
    let Some(db) = VectorDB::open(db_dir)? else {
        return Ok(None);
    };
    if db.is_empty() {
        return Ok(None);
    }

    if db.embedding_model() != embedder.model_name() || db.dimension() != embedder.dimension() {
        return Err(VocabError::IndexLoad(format!(
            "index was built with {} ({} dims), current model is {} ({} dims)",
            db.embedding_model(),
            db.dimension(),
            embedder.model_name(),
            embedder.dimension()
        )));
    }
    Ok(Some(db))
}

fn build(
    data_path: &Path,
    db_dir: &Path,
    embedder: &dyn Embedder,
    notifier: &dyn Notifier,
) -> Result<VectorDB> {
    notifier.info("The data is being loaded, split by line, and vectorized... This may take some time.");

    let records = load_word_records(data_path)?;
    notifier.write(&format!("-> 1 document, {} pieces.", records.len()));
    info!("Loaded {} records from {}", records.len(), data_path.display());

    notifier.warning("Vector database is creating...");
    let progress = notifier.progress(records.len() as u64, "Embedding");
    let mut embeddings = Vec::with_capacity(records.len());
    for batch in records.chunks(EMBEDDING_BATCH_SIZE) {
        let texts: Vec<&str> = batch.iter().map(|r| r.text.as_str()).collect();
        let batch_embeddings = match embedder.embed_batch(&texts) {
            Ok(batch_embeddings) => batch_embeddings,
            Err(e) => {
                progress.abandon();
                return Err(e);
            }
        };
        embeddings.extend(batch_embeddings);
        progress.inc(batch.len() as u64);
    }
    progress.finish_and_clear();

    let mut db = VectorDB::new(db_dir, embedder.model_name(), embedder.dimension());
    db.add_documents(records, embeddings)?;
    db.persist()?;

    notifier.success(&format!(
        "Vector database created and saved in {} folder. Total records: {}",
        db_dir.display(),
        db.len()
    ));
    Ok(db)
}
