//! End-to-end answering tests with an in-memory store, a deterministic
//! embedder, and a recording chat model.

use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;

use edu_assistant::chunk::ChunkSettings;
use edu_assistant::config::Config;
use edu_assistant::embedding::Embedder;
use edu_assistant::error::{GenerationError, StoreError};
use edu_assistant::history::MAX_HISTORY_TURNS;
use edu_assistant::ingest::add_documents;
use edu_assistant::llm::{ChatModel, CompletionRequest};
use edu_assistant::models::{CollectionInfo, Chunk, Document, QueryMatch, Role};
use edu_assistant::pipeline::{
    ChatSession, Pipeline, EMPTY_QUERY_REPLY, GENERATION_FAILURE_REPLY, NO_CONTEXT_REPLY,
    PIPELINE_FAILURE_REPLY,
};
use edu_assistant::store::{InMemoryStore, VectorStore};

/// Bag-of-characters embedding over a small fixed alphabet.
struct CharEmbedder;

#[async_trait]
impl Embedder for CharEmbedder {
    fn model_name(&self) -> &str {
        "chars"
    }
    fn dims(&self) -> usize {
        26
    }
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|t| {
                let mut v = vec![0.01f32; 26];
                for c in t.to_ascii_lowercase().chars() {
                    if c.is_ascii_lowercase() {
                        v[(c as u8 - b'a') as usize] += 1.0;
                    }
                }
                v
            })
            .collect())
    }
}

#[derive(Default)]
struct RecordingModel {
    requests: Mutex<Vec<CompletionRequest>>,
    fail: bool,
}

impl RecordingModel {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn last(&self) -> CompletionRequest {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl ChatModel for RecordingModel {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, GenerationError> {
        self.requests.lock().unwrap().push(request.clone());
        if self.fail {
            return Err(GenerationError::Api {
                status: 500,
                body: "upstream exploded".to_string(),
            });
        }
        Ok(format!("  answer #{}  \n", self.requests.lock().unwrap().len()))
    }
}

/// A store whose every call fails.
struct BrokenStore;

#[async_trait]
impl VectorStore for BrokenStore {
    async fn add(&self, _chunks: &[Chunk]) -> Result<usize, StoreError> {
        Err(StoreError::Unavailable("disk gone".to_string()))
    }
    async fn query(&self, _text: &str, _k: usize) -> Result<Vec<QueryMatch>, StoreError> {
        Err(StoreError::Unavailable("disk gone".to_string()))
    }
    async fn count(&self) -> Result<i64, StoreError> {
        Err(StoreError::Unavailable("disk gone".to_string()))
    }
    async fn clear(&self) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("disk gone".to_string()))
    }
    async fn info(&self) -> Result<CollectionInfo, StoreError> {
        Err(StoreError::Unavailable("disk gone".to_string()))
    }
}

fn doc(path: &str, content: &str) -> Document {
    Document {
        file_path: path.to_string(),
        content: content.to_string(),
        file_type: ".txt".to_string(),
    }
}

async fn seeded_store(docs: &[Document]) -> Arc<InMemoryStore> {
    let store = Arc::new(InMemoryStore::new(Arc::new(CharEmbedder)));
    add_documents(store.as_ref(), docs, ChunkSettings::default())
        .await
        .unwrap();
    store
}

fn pipeline(store: Arc<dyn VectorStore>, model: Arc<RecordingModel>) -> Pipeline {
    Pipeline::new(&Config::default(), store, model)
}

#[tokio::test]
async fn blank_query_short_circuits() {
    let model = Arc::new(RecordingModel::default());
    let p = pipeline(Arc::new(BrokenStore), model.clone());

    assert_eq!(p.respond("", None).await, EMPTY_QUERY_REPLY);
    assert_eq!(p.respond(" \n\t", None).await, EMPTY_QUERY_REPLY);
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn empty_collection_gives_no_context_reply() {
    let model = Arc::new(RecordingModel::default());
    let store = seeded_store(&[]).await;
    let p = pipeline(store, model.clone());

    assert_eq!(p.respond("python fee?", None).await, NO_CONTEXT_REPLY);
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn context_reaches_the_model_with_labels() {
    let model = Arc::new(RecordingModel::default());
    let store = seeded_store(&[doc("a.txt", "Course X costs 500,000 won")]).await;
    let p = pipeline(store, model.clone());

    let reply = p.respond("How much is course X?", None).await;
    assert_eq!(reply, "answer #1");

    let request = model.last();
    assert_eq!(request.model, "gpt-3.5-turbo");
    assert_eq!(request.max_tokens, 1000);
    assert!((request.temperature - 0.7).abs() < f64::EPSILON);
    assert_eq!(request.messages.len(), 2);
    assert_eq!(request.messages[0].role, Role::System);
    assert!(request.messages[0]
        .content
        .contains("[교육 자료 1 - a.txt]\nCourse X costs 500,000 won"));
    assert!(request.messages[0]
        .content
        .contains("**고객 질문:** How much is course X?"));
    assert_eq!(request.messages[1].role, Role::User);
    assert_eq!(request.messages[1].content, "How much is course X?");
}

#[tokio::test]
async fn retrieval_is_capped_at_top_k() {
    let model = Arc::new(RecordingModel::default());
    let docs: Vec<Document> = (0..8)
        .map(|i| doc(&format!("course{}.txt", i), &format!("course number {} outline", i)))
        .collect();
    let store = seeded_store(&docs).await;
    let p = pipeline(store, model.clone());

    let matches = p.relevant_documents("course outline").await.unwrap();
    assert_eq!(matches.len(), 5);
    assert!(matches.windows(2).all(|w| w[0].distance <= w[1].distance));

    p.respond("course outline", None).await;
    let request = model.last();
    let system = &request.messages[0].content;
    assert!(system.contains("[교육 자료 5 - "));
    assert!(!system.contains("[교육 자료 6 - "));
}

#[tokio::test]
async fn store_failure_maps_to_pipeline_apology() {
    let model = Arc::new(RecordingModel::default());
    let p = pipeline(Arc::new(BrokenStore), model.clone());

    assert_eq!(p.respond("python?", None).await, PIPELINE_FAILURE_REPLY);
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn model_failure_maps_to_generation_apology() {
    let model = Arc::new(RecordingModel::failing());
    let store = seeded_store(&[doc("a.txt", "python basics")]).await;
    let p = pipeline(store, model.clone());

    assert_eq!(p.respond("python?", None).await, GENERATION_FAILURE_REPLY);
    assert_eq!(model.calls(), 1);
}

#[tokio::test]
async fn chat_session_folds_history_and_caps_it() {
    let model = Arc::new(RecordingModel::default());
    let store = seeded_store(&[doc("a.txt", "python basics, eight weeks")]).await;
    let p = Arc::new(pipeline(store, model.clone()));
    let mut session = ChatSession::new(p);

    session.chat("first python question").await;
    assert_eq!(model.last().messages.len(), 2);
    assert!(!model.last().messages[0].content.contains("이전 대화 내용도 참고하여"));

    session.chat("second python question").await;
    let request = model.last();
    assert_eq!(request.messages.len(), 4);
    assert!(request.messages[0].content.contains("이전 대화 내용도 참고하여"));
    assert_eq!(request.messages[1].content, "first python question");
    assert_eq!(request.messages[2].content, "answer #1");
    assert_eq!(request.messages[3].content, "second python question");

    for i in 0..10 {
        session.chat(&format!("python question {}", i)).await;
        assert!(session.history().len() <= MAX_HISTORY_TURNS);
    }
    let turns = session.history().turns();
    assert_eq!(turns.len(), MAX_HISTORY_TURNS);
    assert_eq!(turns[0].content, "python question 5");
    assert_eq!(turns[9].role, Role::Assistant);
}

#[tokio::test]
async fn chat_session_ignores_blank_input() {
    let model = Arc::new(RecordingModel::default());
    let store = seeded_store(&[doc("a.txt", "python")]).await;
    let mut session = ChatSession::new(Arc::new(pipeline(store, model.clone())));

    assert_eq!(session.chat("  ").await, EMPTY_QUERY_REPLY);
    assert!(session.history().is_empty());
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn clear_then_count_is_zero() {
    let store = seeded_store(&[doc("a.txt", "python"), doc("b.txt", "java")]).await;
    assert_eq!(store.count().await.unwrap(), 2);
    store.clear().await.unwrap();
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn repl_answers_until_exit_word() {
    let model = Arc::new(RecordingModel::default());
    let store = seeded_store(&[doc("a.txt", "python basics")]).await;
    let mut session = ChatSession::new(Arc::new(pipeline(store, model.clone())));

    let input = "python?\n\n  \n종료\nnever asked\n";
    let reader = tokio::io::BufReader::new(input.as_bytes());
    let mut out = Vec::new();
    edu_assistant::repl::run_repl(&mut session, reader, &mut out, false)
        .await
        .unwrap();

    let printed = String::from_utf8(out).unwrap();
    assert_eq!(printed, "답변: answer #1\n\n");
    assert_eq!(model.calls(), 1);
    assert_eq!(session.history().len(), 2);
}

#[tokio::test]
async fn repl_stops_at_end_of_input() {
    let model = Arc::new(RecordingModel::default());
    let store = seeded_store(&[doc("a.txt", "python basics")]).await;
    let mut session = ChatSession::new(Arc::new(pipeline(store, model.clone())));

    let reader = tokio::io::BufReader::new("first\nsecond".as_bytes());
    let mut out = Vec::new();
    edu_assistant::repl::run_repl(&mut session, reader, &mut out, true)
        .await
        .unwrap();

    let printed = String::from_utf8(out).unwrap();
    assert_eq!(printed.matches("질문: ").count(), 3);
    assert_eq!(printed.matches("답변: ").count(), 2);
}
