use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{collections::BTreeMap, fmt, path::PathBuf};
use uuid::Uuid;

/// One inventory record as it arrives from the tabular source.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Row {
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default, rename = "product description")]
    pub description: Option<String>,
    #[serde(default, rename = "bullet 1")]
    pub bullet_1: Option<String>,
    #[serde(default, rename = "bullet 2")]
    pub bullet_2: Option<String>,
    #[serde(default, rename = "bullet 3")]
    pub bullet_3: Option<String>,
    #[serde(default, rename = "bullet 4")]
    pub bullet_4: Option<String>,
    #[serde(default, rename = "bullet 5")]
    pub bullet_5: Option<String>,
    #[serde(default, rename = "MPN/Model Part Number")]
    pub part_number: Option<String>,
    #[serde(default)]
    pub upc: Option<String>,
    #[serde(default, rename = "image1")]
    pub image: Option<String>,
}

impl Row {
    pub fn bullets(&self) -> [Option<&str>; 5] {
        [
            self.bullet_1.as_deref(),
            self.bullet_2.as_deref(),
            self.bullet_3.as_deref(),
            self.bullet_4.as_deref(),
            self.bullet_5.as_deref(),
        ]
    }

    pub fn sku_label(&self) -> &str {
        self.sku.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub name: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
}

impl Candidate {
    pub fn new(name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
        }
    }

    /// Candidate synthesised from a bare product type name.
    pub fn bare(name: &str) -> Self {
        Self::new(name, name)
    }
}

/// Attribute name to its ordered list of value objects.
pub type Attributes = BTreeMap<String, Vec<Value>>;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Payload {
    pub product_type: String,
    pub attributes: Attributes,
}

pub const OPERATION_UPDATE: &str = "UPDATE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedMessage {
    pub message_id: usize,
    pub sku: String,
    pub operation_type: String,
    pub product_type: String,
    pub attributes: Attributes,
}

impl FeedMessage {
    pub fn update(message_id: usize, sku: impl Into<String>, payload: Payload) -> Self {
        Self {
            message_id,
            sku: sku.into(),
            operation_type: OPERATION_UPDATE.to_string(),
            product_type: payload.product_type,
            attributes: payload.attributes,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedHeader {
    pub seller_id: String,
    pub version: &'static str,
    pub issue_locale: String,
}

/// Wire document submitted as a single listings feed.
#[derive(Debug, Serialize)]
pub struct FeedEnvelope<'a> {
    pub header: FeedHeader,
    pub messages: &'a [FeedMessage],
}

impl<'a> FeedEnvelope<'a> {
    pub fn new(seller_id: &str, issue_locale: &str, messages: &'a [FeedMessage]) -> Self {
        Self {
            header: FeedHeader {
                seller_id: seller_id.to_string(),
                version: "2.0",
                issue_locale: issue_locale.to_string(),
            },
            messages,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RowOutcome {
    Skipped,
    NoCandidates,
    SchemaNotFound { product_type: String },
    Invalid { product_type: String },
    Valid { product_type: String },
}

impl RowOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            RowOutcome::Skipped => "skipped",
            RowOutcome::NoCandidates => "no_candidates",
            RowOutcome::SchemaNotFound { .. } => "schema_not_found",
            RowOutcome::Invalid { .. } => "invalid",
            RowOutcome::Valid { .. } => "valid",
        }
    }

    /// Type the row was resolved or rejected against, once one was chosen.
    pub fn product_type(&self) -> Option<&str> {
        match self {
            RowOutcome::Skipped | RowOutcome::NoCandidates => None,
            RowOutcome::SchemaNotFound { product_type }
            | RowOutcome::Invalid { product_type }
            | RowOutcome::Valid { product_type } => Some(product_type),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RowReport {
    pub position: usize,
    pub sku: String,
    #[serde(flatten)]
    pub outcome: RowOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunSummary {
    NothingToSubmit,
    DryRun { count: usize, path: PathBuf },
    Submitted { count: usize, feed_id: String },
    SubmissionFailed { count: usize, error: String },
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunSummary::NothingToSubmit => write!(f, "No valid messages to submit."),
            RunSummary::DryRun { count, path } => write!(
                f,
                "DRY RUN: generated {count} messages into {}. No feed submitted.",
                path.display()
            ),
            RunSummary::Submitted { count, feed_id } => {
                write!(f, "Feed with {count} messages submitted. Feed ID: {feed_id}")
            }
            RunSummary::SubmissionFailed { count, error } => {
                write!(f, "Feed submission of {count} messages failed: {error}")
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub rows: Vec<RowReport>,
    pub batch: Vec<FeedMessage>,
    pub summary: RunSummary,
}
