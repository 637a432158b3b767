use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VocabError {
    #[error("GEMINI API KEY not found. Please set it in the secrets file or the GEMINI_API_KEY environment variable")]
    MissingCredential,

    #[error("data file not found: {}. Please create it", .0.display())]
    DataFileNotFound(PathBuf),

    #[error("'{}' file is empty or unreadable", .0.display())]
    EmptyCorpus(PathBuf),

    #[error("failed to load vector database: {0}")]
    IndexLoad(String),

    #[error("embedding failed: {0}")]
    Embedding(String),

    #[error("generation failed: {0}")]
    Generation(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, VocabError>;
