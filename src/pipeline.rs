//! Retrieval-augmented answering.
//!
//! [`Pipeline::respond`] is the whole request path: validate the question,
//! retrieve the top-k chunks, build the prompt, call the model. Every
//! failure becomes one of the fixed apology replies below; the underlying
//! error goes to the log only.
//!
//! [`ChatSession`] wraps a pipeline with a bounded [`ConversationHistory`]
//! for the interactive loop.

use std::sync::Arc;

use crate::config::Config;
use crate::error::{GenerationError, StoreError};
use crate::history::ConversationHistory;
use crate::llm::{ChatModel, CompletionRequest};
use crate::models::{QueryMatch, Turn};
use crate::prompt::{build_messages, render_context, system_instruction};
use crate::store::VectorStore;

pub const EMPTY_QUERY_REPLY: &str = "질문을 입력해주세요.";

pub const NO_CONTEXT_REPLY: &str = "죄송합니다. 관련된 교육 과정 정보를 찾을 수 없습니다. 다른 질문을 해주시거나 상담원에게 문의해주세요.";

pub const PIPELINE_FAILURE_REPLY: &str =
    "죄송합니다. 일시적인 오류가 발생했습니다. 잠시 후 다시 시도해주세요.";

pub const GENERATION_FAILURE_REPLY: &str =
    "죄송합니다. 응답 생성 중 오류가 발생했습니다. 잠시 후 다시 시도해주세요.";

#[derive(Debug, thiserror::Error)]
enum PipelineError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
}

/// Shared, immutable answering pipeline.
pub struct Pipeline {
    store: Arc<dyn VectorStore>,
    model: Arc<dyn ChatModel>,
    top_k: usize,
    model_name: String,
    max_tokens: u32,
    temperature: f64,
}

impl Pipeline {
    pub fn new(config: &Config, store: Arc<dyn VectorStore>, model: Arc<dyn ChatModel>) -> Self {
        Self {
            store,
            model,
            top_k: config.retrieval.top_k,
            model_name: config.llm.model.clone(),
            max_tokens: config.llm.max_tokens,
            temperature: config.llm.temperature,
        }
    }

    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    /// Answer `query`, optionally folding prior turns into the prompt.
    ///
    /// Always returns user-facing text: the model's reply or a fixed apology.
    pub async fn respond(&self, query: &str, history: Option<&[Turn]>) -> String {
        if query.trim().is_empty() {
            return EMPTY_QUERY_REPLY.to_string();
        }

        match self.try_respond(query, history).await {
            Ok(Some(reply)) => reply,
            Ok(None) => NO_CONTEXT_REPLY.to_string(),
            Err(PipelineError::Store(e)) => {
                tracing::error!(error = %e, "retrieval failed");
                PIPELINE_FAILURE_REPLY.to_string()
            }
            Err(PipelineError::Generation(e)) => {
                tracing::error!(error = %e, "generation failed");
                GENERATION_FAILURE_REPLY.to_string()
            }
        }
    }

    async fn try_respond(
        &self,
        query: &str,
        history: Option<&[Turn]>,
    ) -> Result<Option<String>, PipelineError> {
        let matches = self.store.query(query, self.top_k).await?;
        if matches.is_empty() {
            tracing::info!("no relevant chunks found");
            return Ok(None);
        }
        tracing::debug!(matches = matches.len(), "retrieved context");

        let context = render_context(&matches);
        let system = system_instruction(&context, query, history.is_some());
        let request = CompletionRequest {
            model: self.model_name.clone(),
            messages: build_messages(system, history.unwrap_or_default(), query),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let reply = self.model.complete(&request).await?;
        Ok(Some(reply.trim().to_string()))
    }

    /// Raw top-k matches for `query`, for inspection.
    pub async fn relevant_documents(&self, query: &str) -> Result<Vec<QueryMatch>, StoreError> {
        self.relevant_documents_limit(query, self.top_k).await
    }

    pub async fn relevant_documents_limit(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<QueryMatch>, StoreError> {
        self.store.query(query, limit).await
    }
}

/// A pipeline plus the history of one interactive conversation.
pub struct ChatSession {
    pipeline: Arc<Pipeline>,
    history: ConversationHistory,
}

impl ChatSession {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self {
            pipeline,
            history: ConversationHistory::new(),
        }
    }

    /// Answer with the session history in the prompt, then record the exchange.
    pub async fn chat(&mut self, query: &str) -> String {
        if query.trim().is_empty() {
            return EMPTY_QUERY_REPLY.to_string();
        }

        let turns = self.history.turns();
        let history = if turns.is_empty() {
            None
        } else {
            Some(turns.as_slice())
        };
        let reply = self.pipeline.respond(query, history).await;
        self.history.push_exchange(query, &reply);
        reply
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }
}
