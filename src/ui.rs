//! User-facing status output.
//!
//! Indexing and the chat loop report progress through [`Notifier`] so they
//! can run against the terminal or silently under test.

use std::time::Duration;

use console::{Emoji, Term, style};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

use crate::chat::{ChatMessage, Role};

static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "! ");
static CHECK: Emoji<'_, '_> = Emoji("✅ ", "+ ");
static CROSS: Emoji<'_, '_> = Emoji("❌ ", "x ");
static BOOKS: Emoji<'_, '_> = Emoji("📚 ", "");

pub trait Notifier {
    fn info(&self, message: &str);
    fn warning(&self, message: &str);
    fn success(&self, message: &str);
    fn error(&self, message: &str);

    /// Plain progress line.
    fn write(&self, message: &str);

    /// Indeterminate spinner; the caller finishes it.
    fn spinner(&self, message: &str) -> ProgressBar;

    /// Bounded progress bar; the caller finishes it.
    fn progress(&self, len: u64, message: &str) -> ProgressBar;

    /// Renders one transcript entry.
    fn message(&self, message: &ChatMessage);
}

pub struct TerminalUi {
    term: Term,
}

impl TerminalUi {
    pub fn new() -> Self {
        Self {
            term: Term::stdout(),
        }
    }

    pub fn banner(&self) {
        self.println(&format!(
            "{}{}",
            BOOKS,
            style("RAG-Powered Translation Bot").bold().cyan()
        ));
        self.println(&format!(
            "{}",
            style("fastembed + Gemini Flash + local vector index").dim()
        ));
        self.println("");
    }

    pub fn input_prompt(&self) -> String {
        format!("{} ", style("Ask me a word...>").bold().green())
    }

    fn println(&self, line: &str) {
        if let Err(e) = self.term.write_line(line) {
            warn!("Failed to write to terminal: {}", e);
        }
    }
}

impl Default for TerminalUi {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for TerminalUi {
    fn info(&self, message: &str) {
        self.println(&format!("{}{}", INFO, style(message).blue()));
    }

    fn warning(&self, message: &str) {
        self.println(&format!("{}{}", WARN, style(message).yellow()));
    }

    fn success(&self, message: &str) {
        self.println(&format!("{}{}", CHECK, style(message).green()));
    }

    fn error(&self, message: &str) {
        self.println(&format!("{}{}", CROSS, style(message).red().bold()));
    }

    fn write(&self, message: &str) {
        self.println(message);
    }

    fn spinner(&self, message: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(spinner_style);
        }
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    fn progress(&self, len: u64, message: &str) -> ProgressBar {
        let pb = ProgressBar::new(len);
        if let Ok(bar_style) = ProgressStyle::default_bar()
            .template("{spinner:.green} {msg} [{bar:40.cyan/blue}] {pos}/{len} ({percent}%)")
        {
            pb.set_style(bar_style.progress_chars("━━╸"));
        }
        pb.set_message(message.to_string());
        pb
    }

    fn message(&self, message: &ChatMessage) {
        let label = match message.role {
            Role::User => style("you").bold().cyan(),
            Role::Assistant => style("assistant").bold().magenta(),
        };
        self.println(&format!("\n{label}:"));
        self.println(&message.content);
        self.println("");
    }
}
