use tracing::{debug, info};

use crate::error::Result;
use crate::llm::{Generation, Generator};
use crate::prompt::assemble_prompt;
use crate::retriever::Retriever;

/// retrieve -> assemble_prompt -> generate -> text, once per question.
/// Nothing is cached between calls.
pub struct RagPipeline {
    retriever: Retriever,
    generator: Box<dyn Generator>,
}

impl RagPipeline {
    pub fn new(retriever: Retriever, generator: Box<dyn Generator>) -> Self {
        Self { retriever, generator }
    }

    pub async fn invoke(&self, input: &str) -> Result<String> {
        let context = self.retriever.retrieve(input)?;
        debug!(
            "Context (line, level): {:?}",
            context.iter().map(|r| (r.line_number, r.level())).collect::<Vec<_>>()
        );

        let prompt = assemble_prompt(&context, input);
        let generation = self.generator.generate(&prompt).await?;
        info!(
            "Generated {} chars (prompt tokens {:?}, output tokens {:?})",
            generation.text.len(),
            generation.prompt_tokens,
            generation.output_tokens
        );

        Ok(extract_text(generation))
    }

    pub fn index_size(&self) -> usize {
        self.retriever.index_size()
    }
}

fn extract_text(generation: Generation) -> String {
    generation.text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::Embedder;
    use crate::error::VocabError;
    use crate::testing::{KeywordEmbedder, ScriptedGenerator};
    use crate::utils::split_into_records;
    use crate::vector_db::VectorDB;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn retriever(dir: &std::path::Path) -> Retriever {
        let embedder: Arc<dyn Embedder> = Arc::new(KeywordEmbedder::new());
        let records = split_into_records("jacket - ceket (A1)\nrun - koşmak (A1)\n", "words.txt");
        let texts: Vec<&str> = records.iter().map(|r| r.text.as_str()).collect();
        let embeddings = embedder.embed_batch(&texts).unwrap();
        let mut db = VectorDB::new(dir, embedder.model_name(), embedder.dimension());
        db.add_documents(records, embeddings).unwrap();
        Retriever::new(db, embedder, 7)
    }

    #[tokio::test]
    async fn test_invoke_feeds_context_and_question_to_generator() {
        let dir = tempdir().unwrap();
        let generator = Arc::new(ScriptedGenerator::replying(vec![Ok(
            "\n### 1. jacket\n- **Türkçe Anlamı:** ceket\n".to_string(),
        )]));
        let pipeline = RagPipeline::new(retriever(dir.path()), Box::new(SharedGenerator(generator.clone())));

        let answer = pipeline.invoke("jacket kelimesi ne demek?").await.unwrap();
        assert_eq!(answer, "### 1. jacket\n- **Türkçe Anlamı:** ceket");

        let prompts = generator.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].system.contains("jacket - ceket (A1)"));
        assert!(prompts[0].system.contains("Soru (Question): jacket kelimesi ne demek?"));
        assert_eq!(prompts[0].user, "jacket kelimesi ne demek?");
        assert_eq!(pipeline.index_size(), 2);
    }

    #[tokio::test]
    async fn test_generation_failure_propagates() {
        let dir = tempdir().unwrap();
        let generator = ScriptedGenerator::replying(vec![Err(VocabError::Generation("quota".to_string()))]);
        let pipeline = RagPipeline::new(retriever(dir.path()), Box::new(generator));

        let err = pipeline.invoke("jacket").await.unwrap_err();
        assert!(err.to_string().contains("quota"));
    }

    /// Lets a test keep a handle on the generator it hands to the pipeline.
    struct SharedGenerator(Arc<ScriptedGenerator>);

    #[async_trait::async_trait]
    impl Generator for SharedGenerator {
        async fn generate(&self, prompt: &crate::prompt::Prompt) -> Result<Generation> {
            self.0.generate(prompt).await
        }
    }
}
