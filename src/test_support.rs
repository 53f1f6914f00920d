use crate::amazon::SpApiError;
use crate::catalog::{FeedService, ProductTypeDirectory};
use crate::llm::{LlmError, TextGenerator};
use crate::models::{Candidate, Row};
use async_trait::async_trait;
use serde_json::Value;
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Mutex,
};
use tokio::time::Instant;

type Responder = Box<dyn Fn(&str) -> Result<String, LlmError> + Send + Sync>;

pub struct FakeText {
    respond: Responder,
    prompts: Mutex<Vec<String>>,
    call_times: Mutex<Vec<Instant>>,
}

impl FakeText {
    pub fn new(
        respond: impl Fn(&str) -> Result<String, LlmError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            respond: Box::new(respond),
            prompts: Mutex::new(Vec::new()),
            call_times: Mutex::new(Vec::new()),
        }
    }

    pub fn fixed(answer: &str) -> Self {
        let answer = answer.to_string();
        Self::new(move |_| Ok(answer.clone()))
    }

    pub fn failing() -> Self {
        Self::new(|_| Err(LlmError::Http("HTTP 503 Service Unavailable".into())))
    }

    /// Answers search-term prompts with `term` and type-selection prompts with `selected`.
    pub fn scripted(term: &str, selected: &str) -> Self {
        let term = term.to_string();
        let selected = selected.to_string();
        Self::new(move |prompt| {
            if prompt.starts_with("Product:") {
                Ok(selected.clone())
            } else {
                Ok(term.clone())
            }
        })
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.call_times.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for FakeText {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        self.call_times.lock().unwrap().push(Instant::now());
        self.prompts.lock().unwrap().push(prompt.to_string());
        (self.respond)(prompt)
    }
}

#[derive(Default)]
pub struct FakeDirectory {
    search: HashMap<String, Vec<Candidate>>,
    search_fails: bool,
    schemas: HashMap<String, Value>,
    search_log: Mutex<Vec<String>>,
    schema_log: Mutex<Vec<String>>,
}

impl FakeDirectory {
    pub fn with_search(mut self, query: &str, results: Vec<Candidate>) -> Self {
        self.search.insert(query.to_string(), results);
        self
    }

    pub fn failing_search(mut self) -> Self {
        self.search_fails = true;
        self
    }

    pub fn with_schema(mut self, product_type: &str, schema: Value) -> Self {
        self.schemas.insert(product_type.to_string(), schema);
        self
    }

    pub fn search_calls(&self) -> usize {
        self.search_log.lock().unwrap().len()
    }

    pub fn schema_calls(&self, product_type: &str) -> usize {
        self.schema_log
            .lock()
            .unwrap()
            .iter()
            .filter(|name| name.as_str() == product_type)
            .count()
    }

    pub fn schema_log(&self) -> Vec<String> {
        self.schema_log.lock().unwrap().clone()
    }

    pub fn total_calls(&self) -> usize {
        self.search_calls() + self.schema_log.lock().unwrap().len()
    }
}

#[async_trait]
impl ProductTypeDirectory for FakeDirectory {
    async fn search_product_types(&self, keywords: &str) -> Result<Vec<Candidate>, SpApiError> {
        self.search_log.lock().unwrap().push(keywords.to_string());
        if self.search_fails {
            return Err(SpApiError::Request("HTTP 500 Internal Server Error".into()));
        }
        Ok(self.search.get(keywords).cloned().unwrap_or_default())
    }

    async fn product_type_schema(
        &self,
        product_type: &str,
        _requirements: &str,
        _locale: &str,
    ) -> Result<Value, SpApiError> {
        self.schema_log.lock().unwrap().push(product_type.to_string());
        self.schemas
            .get(product_type)
            .cloned()
            .ok_or_else(|| SpApiError::Request("HTTP 404 Not Found".into()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFailure {
    Upload,
    CreateFeed,
}

#[derive(Debug, Clone)]
pub struct UploadRecord {
    pub path: PathBuf,
    pub existed: bool,
    pub content_type: String,
    pub body: Value,
}

#[derive(Default)]
pub struct FakeFeeds {
    failure: Option<FeedFailure>,
    uploads: Mutex<Vec<UploadRecord>>,
    feeds: Mutex<Vec<(String, String)>>,
}

impl FakeFeeds {
    pub fn failing(failure: FeedFailure) -> Self {
        Self {
            failure: Some(failure),
            ..Self::default()
        }
    }

    pub fn uploads(&self) -> Vec<UploadRecord> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn created_feeds(&self) -> Vec<(String, String)> {
        self.feeds.lock().unwrap().clone()
    }

    pub fn submission_calls(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }
}

#[async_trait]
impl FeedService for FakeFeeds {
    async fn create_feed_document(
        &self,
        document: &Path,
        content_type: &str,
    ) -> Result<String, SpApiError> {
        let existed = document.exists();
        let body = std::fs::read_to_string(document)
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or(Value::Null);
        self.uploads.lock().unwrap().push(UploadRecord {
            path: document.to_path_buf(),
            existed,
            content_type: content_type.to_string(),
            body,
        });
        if self.failure == Some(FeedFailure::Upload) {
            return Err(SpApiError::Request("document upload HTTP 403 Forbidden".into()));
        }
        Ok("doc-1".to_string())
    }

    async fn create_feed(&self, feed_type: &str, document_id: &str) -> Result<String, SpApiError> {
        if self.failure == Some(FeedFailure::CreateFeed) {
            return Err(SpApiError::Request("HTTP 400 Bad Request".into()));
        }
        self.feeds
            .lock()
            .unwrap()
            .push((feed_type.to_string(), document_id.to_string()));
        Ok("feed-1".to_string())
    }
}

pub fn row(sku: &str, title: &str) -> Row {
    Row {
        sku: Some(sku.to_string()),
        title: Some(title.to_string()),
        ..Row::default()
    }
}
