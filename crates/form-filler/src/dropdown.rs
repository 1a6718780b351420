//! Custom dropdown resolver for framework-rendered overlays.
//!
//! The overlay's options appear some unpredictable time after the trigger is clicked, so the
//! resolver polls at fixed offsets from the click. It is a small state machine driven by one
//! timer raced against the fill's cancellation token:
//!
//! `Opening -> Polling(0) -> Polling(1) -> ... -> Matched | Exhausted`, with `Cancelled`
//! reachable from every waiting state.

use std::time::Duration;

use page_dom::{Complex, Compound, DomError, NodeId, PageDom, Scope, Selector};
use serde::Serialize;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::errors::FillError;

/// Class fragments that confirm a node is a dropdown option.
const OPTION_CLASS_MARKERS: [&str; 3] = ["floatingDropdown", "listItem", "mat-option"];

/// Candidate option nodes across the overlay flavours seen in the wild.
pub fn option_families() -> Selector {
    let descendant = |outer: Compound, inner: Compound| Selector::from(Complex::new(vec![outer, inner]));
    Selector::any_of([
        Compound::tag("mat-option").into(),
        Compound::any().with_class("mat-option").into(),
        Compound::any().with_attr_eq("role", "option").into(),
        descendant(
            Compound::any().with_class("mat-select-panel"),
            Compound::tag("mat-option"),
        ),
        descendant(
            Compound::tag("cdk-virtual-scroll-viewport"),
            Compound::tag("mat-option"),
        ),
        descendant(
            Compound::tag("div").with_attr_eq("role", "listbox"),
            Compound::tag("div"),
        ),
        descendant(Compound::tag("ul"), Compound::tag("li")),
        Compound::any().with_class("dropdown-item").into(),
        Compound::any().with_class("select-option").into(),
    ])
}

/// Text-matching tiers, tried in declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchTier {
    Exact,
    CaseInsensitive,
    Prefix,
    Contains,
}

impl MatchTier {
    pub const CASCADE: [MatchTier; 4] = [
        MatchTier::Exact,
        MatchTier::CaseInsensitive,
        MatchTier::Prefix,
        MatchTier::Contains,
    ];

    fn accepts(&self, option: &str, wanted: &str, wanted_lower: &str) -> bool {
        match self {
            MatchTier::Exact => option == wanted,
            MatchTier::CaseInsensitive => option.to_lowercase() == wanted_lower,
            MatchTier::Prefix => option.to_lowercase().starts_with(wanted_lower),
            MatchTier::Contains => option.to_lowercase().contains(wanted_lower),
        }
    }
}

/// Index of the option the cascade picks, stopping at the first tier with a hit.
pub fn pick_option<S: AsRef<str>>(options: &[S], wanted: &str) -> Option<(usize, MatchTier)> {
    if wanted.is_empty() {
        return None;
    }
    let wanted_lower = wanted.to_lowercase();
    MatchTier::CASCADE.iter().find_map(|tier| {
        options
            .iter()
            .position(|option| tier.accepts(option.as_ref(), wanted, &wanted_lower))
            .map(|idx| (idx, *tier))
    })
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DropdownMatch {
    pub text: String,
    pub tier: MatchTier,
    /// Zero-based poll attempt that found the option.
    pub attempt: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolverState {
    Opening,
    Polling { attempt: usize },
    Matched(DropdownMatch),
    /// Polling ended without a selection; `seen` options were rendered on the last attempt.
    Exhausted { seen: usize },
    Cancelled,
}

impl ResolverState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ResolverState::Matched(_) | ResolverState::Exhausted { .. } | ResolverState::Cancelled
        )
    }
}

pub struct DropdownResolver<'a> {
    page: &'a dyn PageDom,
    trigger: NodeId,
    wanted: String,
    offsets: Vec<Duration>,
    cancel: CancellationToken,
    state: ResolverState,
    opened_at: Option<Instant>,
}

impl<'a> DropdownResolver<'a> {
    pub fn new(
        page: &'a dyn PageDom,
        trigger: NodeId,
        wanted: impl Into<String>,
        offsets: impl IntoIterator<Item = Duration>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            page,
            trigger,
            wanted: wanted.into(),
            offsets: offsets.into_iter().collect(),
            cancel,
            state: ResolverState::Opening,
            opened_at: None,
        }
    }

    pub fn state(&self) -> &ResolverState {
        &self.state
    }

    /// Advances one transition. Terminal states are left unchanged.
    pub async fn step(&mut self) -> Result<(), DomError> {
        let next = match &self.state {
            ResolverState::Opening => {
                self.page.click(self.trigger).await?;
                self.page.focus(self.trigger).await?;
                self.opened_at = Some(Instant::now());
                if self.offsets.is_empty() {
                    self.close().await;
                    ResolverState::Exhausted { seen: 0 }
                } else {
                    ResolverState::Polling { attempt: 0 }
                }
            }
            ResolverState::Polling { attempt } => self.poll(*attempt).await?,
            _ => return Ok(()),
        };
        self.state = next;
        Ok(())
    }

    async fn poll(&self, attempt: usize) -> Result<ResolverState, DomError> {
        let opened_at = self.opened_at.unwrap_or_else(Instant::now);
        let due = opened_at + self.offsets[attempt];
        tokio::select! {
            _ = self.cancel.cancelled() => return Ok(ResolverState::Cancelled),
            _ = sleep_until(due) => {}
        }

        let options = self.rendered_options().await;
        debug!(attempt, found = options.len(), "dropdown poll");

        if !options.is_empty() {
            let texts: Vec<&str> = options.iter().map(|(_, text)| text.as_str()).collect();
            return match pick_option(&texts, &self.wanted) {
                Some((idx, tier)) => {
                    let (node, text) = &options[idx];
                    self.page.click(*node).await?;
                    Ok(ResolverState::Matched(DropdownMatch {
                        text: text.clone(),
                        tier,
                        attempt,
                    }))
                }
                None => {
                    self.close().await;
                    Ok(ResolverState::Exhausted {
                        seen: options.len(),
                    })
                }
            };
        }

        if attempt + 1 < self.offsets.len() {
            Ok(ResolverState::Polling {
                attempt: attempt + 1,
            })
        } else {
            self.close().await;
            Ok(ResolverState::Exhausted { seen: 0 })
        }
    }

    /// Option nodes confirmed by class or role, with their trimmed text. Page errors count as an
    /// empty poll.
    async fn rendered_options(&self) -> Vec<(NodeId, String)> {
        let candidates = match self.page.query_all(Scope::Document, &option_families()).await {
            Ok(nodes) => nodes,
            Err(err) => {
                warn!(error = %err, "dropdown option query failed");
                return Vec::new();
            }
        };
        let mut confirmed = Vec::new();
        for node in candidates {
            let Ok(text) = self.confirmed_text(node).await else {
                continue;
            };
            if let Some(text) = text {
                confirmed.push((node, text));
            }
        }
        confirmed
    }

    async fn confirmed_text(&self, node: NodeId) -> Result<Option<String>, DomError> {
        let class = self.page.attribute(node, "class").await?.unwrap_or_default();
        let role = self.page.attribute(node, "role").await?;
        let is_option = OPTION_CLASS_MARKERS
            .iter()
            .any(|marker| class.contains(marker))
            || role.as_deref() == Some("option");
        if !is_option {
            return Ok(None);
        }
        let text = self.page.text_content(node).await?;
        Ok(Some(text.trim().to_string()))
    }

    async fn close(&self) {
        if let Err(err) = self.page.click_body().await {
            warn!(error = %err, "failed to dismiss dropdown overlay");
        }
    }

    /// Drives the machine to a terminal state.
    #[instrument(skip_all, fields(trigger = %self.trigger, wanted = %self.wanted))]
    pub async fn run(mut self) -> Result<DropdownMatch, FillError> {
        while !self.state.is_terminal() {
            if self.cancel.is_cancelled() {
                self.state = ResolverState::Cancelled;
                break;
            }
            self.step().await?;
        }
        match self.state {
            ResolverState::Matched(found) => {
                debug!(text = %found.text, tier = ?found.tier, "dropdown option selected");
                Ok(found)
            }
            ResolverState::Exhausted { seen: 0 } => Err(FillError::DropdownExhausted {
                attempts: self.offsets.len(),
            }),
            ResolverState::Exhausted { seen } => Err(FillError::DropdownNoMatch {
                wanted: self.wanted,
                seen,
            }),
            _ => Err(FillError::Cancelled),
        }
    }
}

/// Opens the overlay behind `trigger` and clicks the option best matching `wanted`.
pub async fn resolve(
    page: &dyn PageDom,
    trigger: NodeId,
    wanted: &str,
    offsets: impl IntoIterator<Item = Duration>,
    cancel: &CancellationToken,
) -> Result<DropdownMatch, FillError> {
    DropdownResolver::new(page, trigger, wanted, offsets, cancel.clone())
        .run()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cascade_prefers_earlier_tiers() {
        let options = ["Aadhaar Card Copy", "aadhaar card", "Aadhaar Card", "PAN"];
        assert_eq!(
            pick_option(&options, "Aadhaar Card"),
            Some((2, MatchTier::Exact))
        );
        assert_eq!(
            pick_option(&options, "AADHAAR CARD"),
            Some((1, MatchTier::CaseInsensitive))
        );
        assert_eq!(pick_option(&["Female", "Male"], "ma"), Some((1, MatchTier::Prefix)));
        assert_eq!(
            pick_option(&["Voter ID", "Passport"], "port"),
            Some((1, MatchTier::Contains))
        );
        assert_eq!(pick_option(&["Male"], "Other"), None);
        assert_eq!(pick_option(&["Male"], ""), None);
    }

    #[test]
    fn option_families_render_as_css() {
        let rendered = option_families().to_string();
        assert!(rendered.starts_with("mat-option, .mat-option, [role=\"option\"]"));
        assert!(rendered.contains("div[role=\"listbox\"] div"));
        assert!(rendered.ends_with(".dropdown-item, .select-option"));
    }

    #[test]
    fn terminal_states() {
        assert!(!ResolverState::Opening.is_terminal());
        assert!(!ResolverState::Polling { attempt: 2 }.is_terminal());
        assert!(ResolverState::Exhausted { seen: 0 }.is_terminal());
        assert!(ResolverState::Cancelled.is_terminal());
    }
}
