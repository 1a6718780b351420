pub mod api;
pub mod attributes;
pub mod diagnostics;
pub mod dropdown;
pub mod errors;
pub mod group;
pub mod injector;
pub mod matcher;
pub mod orchestrator;
pub mod patterns;
pub mod policy;
pub mod sections;
pub mod service;
pub mod session;
pub mod wait;

mod notify;

pub use api::{FillEngine, FillEngineBuilder, FillOutcome, FormFiller};
pub use diagnostics::{detect_all_fields, match_report, FieldReport, MatchReport};
pub use dropdown::{DropdownMatch, DropdownResolver, MatchTier, ResolverState};
pub use errors::FillError;
pub use matcher::{ElementKind, MatchCandidate};
pub use patterns::PatternRegistry;
pub use policy::{FillPolicy, FillTimings};
pub use service::{FillService, FillServiceHandle};
pub use session::{FillContext, FillSession, SessionReport};
