use crate::catalog::{
    CatalogService, CatalogSettings, DEFAULT_FALLBACK_CANDIDATES, FeedService, NegativeCaching,
    ProductTypeDirectory, SchemaCache,
};
use crate::classifier::{ClassifierConfig, TextClassifier};
use crate::llm::TextGenerator;
use crate::models::{Candidate, FeedMessage, Row, RowOutcome, RowReport, RunReport, RunSummary};
use crate::payload::{self, PayloadBuilder, clean_value};
use crate::settings;
use chrono::Utc;
use serde_json::Value;
use std::{path::PathBuf, sync::Arc, time::Instant};
use thiserror::Error;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub source: String,
    pub dry_run: bool,
    pub output_path: PathBuf,
    pub language: String,
    pub classifier: ClassifierConfig,
    pub catalog: CatalogSettings,
    pub negative_caching: NegativeCaching,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source: String::new(),
            dry_run: true,
            output_path: PathBuf::from("feed_output.json"),
            language: "en_US".to_string(),
            classifier: ClassifierConfig::default(),
            catalog: CatalogSettings::default(),
            negative_caching: NegativeCaching::Disabled,
        }
    }
}

impl PipelineConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let classifier = ClassifierConfig {
            search_term_interval: settings::millis("SEARCH_TERM_INTERVAL_MS")
                .unwrap_or(defaults.classifier.search_term_interval),
            select_type_interval: settings::millis("SELECT_TYPE_INTERVAL_MS")
                .unwrap_or(defaults.classifier.select_type_interval),
            ..defaults.classifier
        };
        let catalog = CatalogSettings {
            fallback_candidates: fallback_candidates(settings::list("FALLBACK_CANDIDATES")),
            seller_id: crate::amazon::config::SELLER_ID.clone(),
            ..defaults.catalog
        };
        let negative_caching = if settings::flag("SCHEMA_NEGATIVE_CACHE").unwrap_or(false) {
            NegativeCaching::Enabled
        } else {
            NegativeCaching::Disabled
        };

        Self {
            source: settings::text("INVENTORY_SOURCE").unwrap_or_default(),
            dry_run: settings::flag("DRY_RUN").unwrap_or(defaults.dry_run),
            output_path: settings::text("FEED_OUTPUT_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_path),
            language: settings::text("DEFAULT_LANGUAGE").unwrap_or(defaults.language),
            classifier,
            catalog,
            negative_caching,
        }
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.source.trim().is_empty() {
            return Err(PipelineError::invalid_input(
                "config",
                "INVENTORY_SOURCE is not set",
            ));
        }
        if self.language.trim().is_empty() {
            return Err(PipelineError::invalid_input("config", "language is empty"));
        }
        if self.dry_run && self.output_path.as_os_str().is_empty() {
            return Err(PipelineError::invalid_input(
                "config",
                "dry run needs an output path",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
#[error("stage `{stage}` failed: {message}")]
pub struct PipelineError {
    stage: &'static str,
    message: String,
    kind: PipelineErrorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineErrorKind {
    InvalidInput,
    Internal,
}

impl PipelineError {
    pub fn invalid_input(stage: &'static str, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
            kind: PipelineErrorKind::InvalidInput,
        }
    }

    pub fn internal(stage: &'static str, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
            kind: PipelineErrorKind::Internal,
        }
    }

    pub fn stage(&self) -> &'static str {
        self.stage
    }

    pub fn kind(&self) -> PipelineErrorKind {
        self.kind
    }

    pub fn detail(&self) -> &str {
        &self.message
    }
}

/// Drives rows one at a time through classification, schema resolution,
/// payload building and validation, then hands the batch off once.
pub struct Pipeline {
    config: PipelineConfig,
    classifier: TextClassifier,
    catalog: CatalogService,
    builder: PayloadBuilder,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        llm: Arc<dyn TextGenerator>,
        directory: Arc<dyn ProductTypeDirectory>,
        feeds: Arc<dyn FeedService>,
    ) -> Self {
        let classifier = TextClassifier::new(llm, config.classifier.clone());
        let catalog = CatalogService::new(
            directory,
            feeds,
            SchemaCache::new(config.negative_caching),
            config.catalog.clone(),
        );
        let builder = PayloadBuilder::new(config.language.clone());
        Self {
            config,
            classifier,
            catalog,
            builder,
        }
    }

    pub async fn run(&mut self, rows: &[Row]) -> Result<RunReport, PipelineError> {
        if rows.is_empty() {
            warn!(target = "listing.pipeline", "inventory has no rows");
        }
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let started = Instant::now();
        let mut reports = Vec::with_capacity(rows.len());
        let mut batch = Vec::new();

        for (index, row) in rows.iter().enumerate() {
            let position = index + 1;
            let span = info_span!("row", run = %run_id, position, sku = %row.sku_label());
            let (outcome, message) = self.process_row(position, row).instrument(span).await;
            crate::metrics::row_outcome(&outcome);
            if let Some(message) = message {
                batch.push(message);
            }
            reports.push(RowReport {
                position,
                sku: row.sku_label().to_string(),
                outcome,
            });
        }
        crate::metrics::stage_elapsed("process_rows", started.elapsed());

        let summary = self.finish(&batch).await?;
        info!(
            target = "listing.pipeline",
            run = %run_id,
            cached_schemas = self.catalog.cached_schemas(),
            "{summary}"
        );
        Ok(RunReport {
            run_id,
            started_at,
            rows: reports,
            batch,
            summary,
        })
    }

    async fn process_row(
        &mut self,
        position: usize,
        row: &Row,
    ) -> (RowOutcome, Option<FeedMessage>) {
        let sku = row.sku_label();
        let Some(title) = clean_value(row.title.as_deref()) else {
            return (RowOutcome::Skipped, None);
        };

        let term = self.classifier.identify_search_term(title).await;
        let candidates = self.catalog.search_product_types(term.value()).await;
        debug!(
            target = "listing.pipeline",
            term = term.value(),
            default_term = term.is_fallback(),
            candidates = candidates.len(),
            "candidates_found"
        );
        if candidates.is_empty() {
            warn!(target = "listing.pipeline", sku, "no candidates found");
            return (RowOutcome::NoCandidates, None);
        }

        let primary = self
            .classifier
            .select_best_type(title, &candidates)
            .await
            .into_value();
        let Some((product_type, schema)) = self.resolve_schema(&primary, &candidates).await else {
            warn!(target = "listing.pipeline", sku, product_type = %primary, "schema not found");
            return (
                RowOutcome::SchemaNotFound {
                    product_type: primary,
                },
                None,
            );
        };

        let payload = self.builder.build_payload(&product_type, row);
        if !payload::validate(&payload, &schema) {
            warn!(target = "listing.pipeline", sku, product_type = %product_type, "INVALID");
            return (RowOutcome::Invalid { product_type }, None);
        }

        info!(target = "listing.pipeline", sku, product_type = %product_type, "VALID");
        let message = FeedMessage::update(position, sku, payload);
        (RowOutcome::Valid { product_type }, Some(message))
    }

    /// Schema for the primary type, else for the first remaining candidate
    /// (in list order) whose schema resolves.
    async fn resolve_schema(
        &mut self,
        primary: &str,
        candidates: &[Candidate],
    ) -> Option<(String, Arc<Value>)> {
        if let Some(schema) = self.catalog.get_product_type_schema(primary).await {
            return Some((primary.to_string(), schema));
        }

        for candidate in candidates.iter().filter(|c| c.name != primary) {
            if let Some(schema) = self.catalog.get_product_type_schema(&candidate.name).await {
                info!(
                    target = "listing.pipeline",
                    primary,
                    resolved = %candidate.name,
                    "schema_fallback_used"
                );
                return Some((candidate.name.clone(), schema));
            }
        }
        None
    }

    async fn finish(&self, batch: &[FeedMessage]) -> Result<RunSummary, PipelineError> {
        if batch.is_empty() {
            return Ok(RunSummary::NothingToSubmit);
        }

        if self.config.dry_run {
            let path = self.config.output_path.clone();
            let body = serde_json::to_vec_pretty(batch)
                .map_err(|err| PipelineError::internal("persist_batch", err.to_string()))?;
            tokio::fs::write(&path, body)
                .await
                .map_err(|err| PipelineError::internal("persist_batch", err.to_string()))?;
            return Ok(RunSummary::DryRun {
                count: batch.len(),
                path,
            });
        }

        info!(target = "listing.pipeline", messages = batch.len(), "submitting feed");
        match self.catalog.submit_feed(batch).await {
            Ok(feed_id) => Ok(RunSummary::Submitted {
                count: batch.len(),
                feed_id,
            }),
            Err(err) => {
                error!(target = "listing.pipeline", error = %err, "feed submission failed");
                Ok(RunSummary::SubmissionFailed {
                    count: batch.len(),
                    error: err.to_string(),
                })
            }
        }
    }
}

/// Configured fallbacks, or the built-in list when none are configured.
fn fallback_candidates(configured: Vec<String>) -> Vec<String> {
    if configured.is_empty() {
        DEFAULT_FALLBACK_CANDIDATES
            .iter()
            .map(|name| name.to_string())
            .collect()
    } else {
        configured
    }
}
