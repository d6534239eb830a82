//! Application layer: orchestration, scoring, history, enrichment.

pub mod history;
pub mod lookup_service;
pub mod narrative;
pub mod risk;
pub mod service;

pub use history::{HISTORY_CAPACITY, LookupHistory};
pub use lookup_service::{LookupService, normalize_query};
pub use narrative::{NarrativeHandle, NarrativeOutcome, NarrativeService};
pub use risk::{RiskSignals, score};
pub use service::{AppService, LookupReport};
