//! Deterministic fakes shared by unit tests.

use std::collections::VecDeque;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use indicatif::ProgressBar;
use rustc_hash::FxHasher;

use crate::chat::ChatMessage;
use crate::embedder::Embedder;
use crate::error::{Result, VocabError};
use crate::llm::{Generation, Generator};
use crate::prompt::Prompt;
use crate::ui::Notifier;

const KEYWORD_DIMENSION: usize = 64;

/// Bag-of-words vectors: texts sharing words point the same way.
pub struct KeywordEmbedder {
    name: String,
    calls: AtomicUsize,
}

impl KeywordEmbedder {
    pub fn new() -> Self {
        Self::with_name("keyword-test")
    }

    pub fn with_name(name: &str) -> Self {
        Self {
            name: name.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `embed_batch` invocations so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Embedder for KeywordEmbedder {
    fn model_name(&self) -> &str {
        &self.name
    }

    fn dimension(&self) -> usize {
        KEYWORD_DIMENSION
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|text| keyword_vector(text)).collect())
    }
}

fn keyword_vector(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0; KEYWORD_DIMENSION];
    let lowered = text.to_lowercase();
    for token in lowered.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
        let mut hasher = FxHasher::default();
        token.hash(&mut hasher);
        vector[(hasher.finish() % KEYWORD_DIMENSION as u64) as usize] += 1.0;
    }
    vector
}

/// Embedder whose every call fails.
pub struct FailingEmbedder;

impl Embedder for FailingEmbedder {
    fn model_name(&self) -> &str {
        "failing"
    }

    fn dimension(&self) -> usize {
        KEYWORD_DIMENSION
    }

    fn embed_batch(&self, _texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Err(VocabError::Embedding("model unavailable".to_string()))
    }
}

/// Replays queued replies and records every prompt it receives.
/// Fails once the queue is empty.
#[derive(Default)]
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<Result<String>>>,
    prompts: Mutex<Vec<Prompt>>,
}

impl ScriptedGenerator {
    pub fn replying(replies: Vec<Result<String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<Prompt> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, prompt: &Prompt) -> Result<Generation> {
        self.prompts.lock().unwrap().push(prompt.clone());
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(VocabError::Generation("no scripted reply".to_string())))?;
        Ok(Generation::from_text(reply))
    }
}

/// Keeps every notification in memory.
#[derive(Default)]
pub struct RecordingNotifier {
    lines: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|line| line.contains(needle))
    }

    fn push(&self, level: &str, message: &str) {
        self.lines.lock().unwrap().push(format!("{level}: {message}"));
    }
}

impl Notifier for RecordingNotifier {
    fn info(&self, message: &str) {
        self.push("info", message);
    }

    fn warning(&self, message: &str) {
        self.push("warning", message);
    }

    fn success(&self, message: &str) {
        self.push("success", message);
    }

    fn error(&self, message: &str) {
        self.push("error", message);
    }

    fn write(&self, message: &str) {
        self.push("write", message);
    }

    fn spinner(&self, message: &str) -> ProgressBar {
        self.push("spinner", message);
        ProgressBar::hidden()
    }

    fn progress(&self, _len: u64, message: &str) -> ProgressBar {
        self.push("progress", message);
        ProgressBar::hidden()
    }

    fn message(&self, message: &ChatMessage) {
        self.push(&message.role.to_string(), &message.content);
    }
}
