//! Runtime configuration.
//!
//! Every value has a default and can be overridden through the environment.
//! The API key is looked up in the secrets file first and the environment
//! second; a missing key is fatal.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Result, VocabError};

pub const DATA_PATH: &str = "data/words.txt";
pub const DB_DIR: &str = "vector_db/words";
pub const SECRETS_PATH: &str = ".vocab-rag/secrets.toml";
pub const GENERATION_MODEL: &str = "gemini-2.5-flash";
pub const TEMPERATURE: f32 = 0.7;
pub const TOP_K: usize = 7;

pub const API_KEY_VAR: &str = "GEMINI_API_KEY";
const DATA_PATH_VAR: &str = "VOCAB_DATA_PATH";
const DB_DIR_VAR: &str = "VOCAB_DB_DIR";
const SECRETS_PATH_VAR: &str = "VOCAB_SECRETS_PATH";
const GENERATION_MODEL_VAR: &str = "VOCAB_GENERATION_MODEL";
const EMBEDDING_CACHE_VAR: &str = "VOCAB_EMBEDDING_CACHE";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_path: PathBuf,
    pub db_dir: PathBuf,
    pub embedding_cache_dir: PathBuf,
    pub generation_model: String,
    pub temperature: f32,
    pub top_k: usize,
    pub api_key: String,
}

/// Shape of the secrets file. Only the API key is read from it.
#[derive(Debug, Default, Deserialize)]
struct Secrets {
    #[serde(rename = "GEMINI_API_KEY")]
    gemini_api_key: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let secrets_path = var(SECRETS_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(SECRETS_PATH));
        let api_key = resolve_api_key(&secrets_path, &lookup)?;

        let generation_model =
            var(GENERATION_MODEL_VAR).unwrap_or_else(|| GENERATION_MODEL.to_string());
        if generation_model.contains('/') {
            return Err(VocabError::Config(format!(
                "generation model id must not contain '/': {generation_model}"
            )));
        }

        Ok(Self {
            data_path: var(DATA_PATH_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DATA_PATH)),
            db_dir: var(DB_DIR_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DB_DIR)),
            embedding_cache_dir: var(EMBEDDING_CACHE_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(default_embedding_cache_dir),
            generation_model,
            temperature: TEMPERATURE,
            top_k: TOP_K,
            api_key,
        })
    }

    /// Fails unless the source data file is present.
    pub fn ensure_data_file(&self) -> Result<()> {
        if self.data_path.is_file() {
            Ok(())
        } else {
            Err(VocabError::DataFileNotFound(self.data_path.clone()))
        }
    }
}

/// Secrets file first, then the environment.
pub fn resolve_api_key<F>(secrets_path: &Path, lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(key) = read_secrets(secrets_path).gemini_api_key
        && !key.trim().is_empty()
    {
        debug!("API key loaded from {}", secrets_path.display());
        return Ok(key.trim().to_string());
    }

    lookup(API_KEY_VAR)
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
        .ok_or(VocabError::MissingCredential)
}

fn read_secrets(path: &Path) -> Secrets {
    if !path.exists() {
        return Secrets::default();
    }

    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            warn!("Failed to read secrets file {}: {}", path.display(), e);
            return Secrets::default();
        }
    };

    toml::from_str(&contents).unwrap_or_else(|e| {
        warn!("Failed to parse secrets file {}: {}", path.display(), e);
        Secrets::default()
    })
}

fn default_embedding_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|dir| dir.join("vocab-rag").join("models"))
        .unwrap_or_else(|| PathBuf::from(".fastembed_cache"))
}
