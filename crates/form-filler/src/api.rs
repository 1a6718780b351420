use std::sync::Arc;

use async_trait::async_trait;
use fastfill_core_types::{FillRequest, FillResponse, FillResult};
use page_dom::{PageDom, Tone};
use tracing::{info, instrument, warn};

use crate::errors::FillError;
use crate::group;
use crate::notify;
use crate::orchestrator;
use crate::patterns::PatternRegistry;
use crate::policy::FillPolicy;
use crate::session::{FillContext, FillSession};

/// Result of one fill together with the session carrying its scheduled follow-ups.
pub struct FillOutcome {
    pub result: Result<FillResult, FillError>,
    pub session: Arc<FillSession>,
}

impl FillOutcome {
    /// The wire response for this outcome.
    pub fn response(&self) -> FillResponse {
        match &self.result {
            Ok(result) => FillResponse::filled(result.filled_count),
            Err(err) => FillResponse::failed(err.to_string()),
        }
    }
}

#[async_trait]
pub trait FormFiller: Send + Sync {
    /// Runs one request in a fresh session. Never leaves the caller without an answer.
    async fn fill(&self, request: FillRequest) -> FillOutcome;
}

pub struct FillEngineBuilder {
    page: Arc<dyn PageDom>,
    patterns: Option<Arc<PatternRegistry>>,
    policy: FillPolicy,
}

impl FillEngineBuilder {
    pub fn new(page: Arc<dyn PageDom>) -> Self {
        Self {
            page,
            patterns: None,
            policy: FillPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: FillPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_patterns(mut self, patterns: PatternRegistry) -> Self {
        self.patterns = Some(Arc::new(patterns));
        self
    }

    pub fn build(self) -> FillEngine {
        FillEngine {
            page: self.page,
            patterns: self
                .patterns
                .unwrap_or_else(|| Arc::new(PatternRegistry::builtin())),
            policy: Arc::new(self.policy),
        }
    }
}

/// Default [`FormFiller`] bound to one page.
#[derive(Clone)]
pub struct FillEngine {
    page: Arc<dyn PageDom>,
    patterns: Arc<PatternRegistry>,
    policy: Arc<FillPolicy>,
}

impl FillEngine {
    pub fn builder(page: Arc<dyn PageDom>) -> FillEngineBuilder {
        FillEngineBuilder::new(page)
    }

    pub fn policy(&self) -> &FillPolicy {
        &self.policy
    }

    pub fn patterns(&self) -> &PatternRegistry {
        &self.patterns
    }

    pub fn page(&self) -> &Arc<dyn PageDom> {
        &self.page
    }

    fn context(&self) -> FillContext {
        FillContext::new(self.page.clone(), self.patterns.clone(), self.policy.clone())
    }
}

#[async_trait]
impl FormFiller for FillEngine {
    #[instrument(skip_all, fields(action = request.kind(), profile = request.profile_name()))]
    async fn fill(&self, request: FillRequest) -> FillOutcome {
        let ctx = self.context();
        let result = match &request {
            FillRequest::Single { profile } => orchestrator::fill_single(&ctx, &profile.data).await,
            FillRequest::Group { master_profile } => group::fill_group(&ctx, master_profile).await,
        };
        match &result {
            Ok(result) => info!(filled = result.filled_count, "fill handled"),
            Err(err) => {
                warn!(error = %err, "fill failed");
                notify::announce(&ctx, notify::FAILED_MESSAGE, Tone::Error).await;
            }
        }
        FillOutcome {
            result,
            session: ctx.session,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fastfill_core_types::{FieldMap, FieldType, ProfileRecord};
    use page_dom::MemoryPage;

    #[tokio::test(start_paused = true)]
    async fn extra_patterns_reach_the_matcher() {
        let page = Arc::new(MemoryPage::from_html(r#"<input name="yatriNagar">"#));
        let engine = FillEngine::builder(page.clone())
            .with_patterns(PatternRegistry::builtin().with_extra(FieldType::City, ["nagar"]))
            .build();
        let data = FieldMap::default().with(FieldType::City, "Tirupati");
        let request = FillRequest::Single {
            profile: ProfileRecord::new("p1", "Self", data),
        };
        let outcome = engine.fill(request).await;
        assert_eq!(outcome.response(), FillResponse::filled(1));
        let input = page.find("input").unwrap();
        assert_eq!(page.value_of(input), "Tirupati");
    }
}
