use crate::llm::TextGenerator;
use crate::models::Candidate;
use crate::pacing::Pacer;
use std::{sync::Arc, time::Duration};
use tracing::{debug, warn};

pub const DEFAULT_SEARCH_TERM: &str = "Appliance";
pub const DEFAULT_PRODUCT_TYPE: &str = "MAJOR_HOME_APPLIANCES_PART";

#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub search_term_interval: Duration,
    pub select_type_interval: Duration,
    pub default_search_term: String,
    pub default_product_type: String,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            search_term_interval: Duration::from_millis(1000),
            select_type_interval: Duration::from_millis(1200),
            default_search_term: DEFAULT_SEARCH_TERM.to_string(),
            default_product_type: DEFAULT_PRODUCT_TYPE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    ServiceError(String),
    EmptyAnswer,
    NoMatch(String),
    NoCandidates,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Model(String),
    Fallback { value: String, reason: FallbackReason },
}

impl Classification {
    pub fn value(&self) -> &str {
        match self {
            Classification::Model(value) => value,
            Classification::Fallback { value, .. } => value,
        }
    }

    pub fn into_value(self) -> String {
        match self {
            Classification::Model(value) => value,
            Classification::Fallback { value, .. } => value,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Classification::Fallback { .. })
    }
}

pub struct TextClassifier {
    llm: Arc<dyn TextGenerator>,
    config: ClassifierConfig,
    pacer: Pacer,
}

impl TextClassifier {
    pub fn new(llm: Arc<dyn TextGenerator>, config: ClassifierConfig) -> Self {
        Self {
            llm,
            config,
            pacer: Pacer::new(),
        }
    }

    /// Names the general category implied by a listing title.
    pub async fn identify_search_term(&mut self, title: &str) -> Classification {
        self.pacer.wait(self.config.search_term_interval).await;
        let prompt = format!(
            "Analyze title: '{title}'. Identify the appliance type. \
             Use 'Washing Machine' not 'Washer'. Output ONLY the name."
        );

        match self.llm.generate(&prompt).await {
            Ok(answer) => {
                let term = clean_answer(&answer);
                if term.is_empty() {
                    warn!(target = "listing.llm", title, "search_term_empty_answer");
                    return self.fallback_term(FallbackReason::EmptyAnswer);
                }
                debug!(target = "listing.llm", title, term = %term, "search_term_identified");
                Classification::Model(term)
            }
            Err(err) => {
                warn!(target = "listing.llm", title, error = %err, "search_term_fallback");
                self.fallback_term(FallbackReason::ServiceError(err.to_string()))
            }
        }
    }

    /// Picks the best-fitting product type among `candidates`. The answer is
    /// always one of the candidate names unless the list is empty.
    pub async fn select_best_type(
        &mut self,
        title: &str,
        candidates: &[Candidate],
    ) -> Classification {
        let Some(first) = candidates.first() else {
            return Classification::Fallback {
                value: self.config.default_product_type.clone(),
                reason: FallbackReason::NoCandidates,
            };
        };

        self.pacer.wait(self.config.select_type_interval).await;
        let names: Vec<&str> = candidates.iter().map(|c| c.name.as_str()).collect();
        let listed = serde_json::to_string(&names).unwrap_or_default();
        let prompt = format!(
            "Product: '{title}'\nCategories: {listed}\nSelect the best PART category. Output ONLY the name."
        );

        let reason = match self.llm.generate(&prompt).await {
            Ok(answer) => {
                let selected = clean_answer(&answer);
                if names.contains(&selected.as_str()) {
                    return Classification::Model(selected);
                }
                FallbackReason::NoMatch(selected)
            }
            Err(err) => FallbackReason::ServiceError(err.to_string()),
        };

        warn!(
            target = "listing.llm",
            title,
            fallback = %first.name,
            reason = ?reason,
            "product_type_fallback"
        );
        Classification::Fallback {
            value: first.name.clone(),
            reason,
        }
    }

    fn fallback_term(&self, reason: FallbackReason) -> Classification {
        Classification::Fallback {
            value: self.config.default_search_term.clone(),
            reason,
        }
    }
}

fn clean_answer(answer: &str) -> String {
    answer.trim().replace(['"', '\''], "").trim().to_string()
}
