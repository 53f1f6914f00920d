use crate::amazon::SpApiError;
use crate::models::{Candidate, FeedEnvelope, FeedMessage};
use async_trait::async_trait;
use serde_json::Value;
use std::{
    collections::{HashMap, HashSet},
    io::{BufWriter, Write},
    path::Path,
    sync::Arc,
    time::Instant,
};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const FEED_TYPE: &str = "JSON_LISTINGS_FEED";
pub const FEED_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

pub const DEFAULT_FALLBACK_CANDIDATES: [&str; 3] = [
    "MAJOR_HOME_APPLIANCES_PART",
    "HOME_APPLIANCE_ACCESSORY",
    "REPLACEMENT_PART",
];

/// Keyword search and schema lookup for marketplace product types.
#[async_trait]
pub trait ProductTypeDirectory: Send + Sync {
    async fn search_product_types(&self, keywords: &str) -> Result<Vec<Candidate>, SpApiError>;

    async fn product_type_schema(
        &self,
        product_type: &str,
        requirements: &str,
        locale: &str,
    ) -> Result<Value, SpApiError>;
}

/// Document upload and feed creation.
#[async_trait]
pub trait FeedService: Send + Sync {
    async fn create_feed_document(
        &self,
        document: &Path,
        content_type: &str,
    ) -> Result<String, SpApiError>;

    async fn create_feed(&self, feed_type: &str, document_id: &str) -> Result<String, SpApiError>;
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to stage feed document: {0}")]
    Staging(#[from] std::io::Error),
    #[error("failed to encode feed document: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("feed document upload failed: {0}")]
    Upload(SpApiError),
    #[error("feed creation failed: {0}")]
    CreateFeed(SpApiError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NegativeCaching {
    /// Failed lookups are retried on every request for that type.
    #[default]
    Disabled,
    /// A failed lookup is remembered for the cache's lifetime.
    Enabled,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    Hit(Arc<Value>),
    KnownMissing,
    Miss,
}

/// Product type name to schema. Entries are never invalidated.
#[derive(Debug, Default)]
pub struct SchemaCache {
    entries: HashMap<String, Option<Arc<Value>>>,
    negative: NegativeCaching,
}

impl SchemaCache {
    pub fn new(negative: NegativeCaching) -> Self {
        Self {
            entries: HashMap::new(),
            negative,
        }
    }

    pub fn lookup(&self, product_type: &str) -> CacheLookup {
        match self.entries.get(product_type) {
            Some(Some(schema)) => CacheLookup::Hit(schema.clone()),
            Some(None) => CacheLookup::KnownMissing,
            None => CacheLookup::Miss,
        }
    }

    pub fn store(&mut self, product_type: &str, schema: Value) -> Arc<Value> {
        let schema = Arc::new(schema);
        self.entries
            .insert(product_type.to_string(), Some(schema.clone()));
        schema
    }

    pub fn store_missing(&mut self, product_type: &str) {
        if self.negative == NegativeCaching::Enabled {
            self.entries.insert(product_type.to_string(), None);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[derive(Debug, Clone)]
pub struct CatalogSettings {
    pub fallback_candidates: Vec<String>,
    pub requirements: String,
    pub locale: String,
    pub seller_id: String,
    pub issue_locale: String,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            fallback_candidates: DEFAULT_FALLBACK_CANDIDATES
                .iter()
                .map(|name| name.to_string())
                .collect(),
            requirements: "LISTING".to_string(),
            locale: "en_US".to_string(),
            seller_id: "SELLER_ID".to_string(),
            issue_locale: "en_US".to_string(),
        }
    }
}

pub struct CatalogService {
    directory: Arc<dyn ProductTypeDirectory>,
    feeds: Arc<dyn FeedService>,
    cache: SchemaCache,
    settings: CatalogSettings,
}

impl CatalogService {
    pub fn new(
        directory: Arc<dyn ProductTypeDirectory>,
        feeds: Arc<dyn FeedService>,
        cache: SchemaCache,
        settings: CatalogSettings,
    ) -> Self {
        Self {
            directory,
            feeds,
            cache,
            settings,
        }
    }

    /// Search results first, then every configured fallback not already
    /// present. Never empty while the fallback list is non-empty.
    pub async fn search_product_types(&self, query: &str) -> Vec<Candidate> {
        let mut candidates = Vec::new();
        let query = query.trim();
        if !query.is_empty() {
            match self.directory.search_product_types(query).await {
                Ok(found) => candidates = found,
                Err(err) => {
                    warn!(target = "listing.catalog", query, error = %err, "product_type_search_failed");
                }
            }
        }

        let mut seen = HashSet::new();
        candidates.retain(|candidate| seen.insert(candidate.name.clone()));
        for fallback in &self.settings.fallback_candidates {
            if seen.insert(fallback.clone()) {
                candidates.push(Candidate::bare(fallback));
            }
        }
        candidates
    }

    pub async fn get_product_type_schema(&mut self, product_type: &str) -> Option<Arc<Value>> {
        match self.cache.lookup(product_type) {
            CacheLookup::Hit(schema) => {
                crate::metrics::schema_cache(product_type, "hit");
                return Some(schema);
            }
            CacheLookup::KnownMissing => {
                crate::metrics::schema_cache(product_type, "negative_hit");
                return None;
            }
            CacheLookup::Miss => crate::metrics::schema_cache(product_type, "miss"),
        }

        let fetched = self
            .directory
            .product_type_schema(product_type, &self.settings.requirements, &self.settings.locale)
            .await;
        match fetched {
            Ok(schema) if !is_empty_schema(&schema) => {
                debug!(target = "listing.catalog", product_type, "schema_cached");
                Some(self.cache.store(product_type, schema))
            }
            Ok(_) => {
                warn!(target = "listing.catalog", product_type, "schema_empty");
                self.cache.store_missing(product_type);
                None
            }
            Err(err) => {
                warn!(target = "listing.catalog", product_type, error = %err, "schema_fetch_failed");
                self.cache.store_missing(product_type);
                None
            }
        }
    }

    /// Uploads all messages as one listings feed and returns its id.
    pub async fn submit_feed(&self, messages: &[FeedMessage]) -> Result<String, CatalogError> {
        let started = Instant::now();
        let envelope = FeedEnvelope::new(
            &self.settings.seller_id,
            &self.settings.issue_locale,
            messages,
        );
        let staged = StagedDocument::write(&envelope)?;

        let document_id = self
            .feeds
            .create_feed_document(staged.path(), FEED_CONTENT_TYPE)
            .await
            .map_err(CatalogError::Upload)?;
        let feed_id = self
            .feeds
            .create_feed(FEED_TYPE, &document_id)
            .await
            .map_err(CatalogError::CreateFeed)?;

        staged.release();
        crate::metrics::stage_elapsed("submit_feed", started.elapsed());
        info!(
            target = "listing.catalog",
            document_id = %document_id,
            feed_id = %feed_id,
            messages = messages.len(),
            "feed_created"
        );
        Ok(feed_id)
    }

    pub fn cached_schemas(&self) -> usize {
        self.cache.len()
    }
}

/// `null` or `{}`: a definition with nothing to validate against.
fn is_empty_schema(schema: &Value) -> bool {
    match schema {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Feed body staged on disk for the duration of one submission. The file is
/// removed on `release` or, on early exit, when dropped.
struct StagedDocument {
    file: NamedTempFile,
}

impl StagedDocument {
    fn write(envelope: &FeedEnvelope<'_>) -> Result<Self, CatalogError> {
        let file = tempfile::Builder::new()
            .prefix("listing-feed-")
            .suffix(".json")
            .tempfile()?;
        {
            let mut writer = BufWriter::new(file.as_file());
            serde_json::to_writer(&mut writer, envelope)?;
            writer.flush()?;
        }
        Ok(Self { file })
    }

    fn path(&self) -> &Path {
        self.file.path()
    }

    fn release(self) {
        let path = self.file.path().to_path_buf();
        if let Err(err) = self.file.close() {
            warn!(target = "listing.catalog", path = %path.display(), error = %err, "staged_document_cleanup_failed");
        }
    }
}
