//! Domain layer containing core types, collaborator traits, and error definitions.

pub mod error;
pub mod traits;
pub mod types;

pub use error::{AppError, ConfigError, ExternalServiceError, LookupError};
pub use traits::{DeviceInfoProvider, HistoryStore, HttpFetcher, HttpResponse, NarrativeGenerator};
pub use types::{
    DeviceInfo, DeviceType, IpRecord, LookupHistoryEntry, NetworkType, RESTRICTED_PLACEHOLDER,
    RecordSource, RiskAssessment, SecurityFlags, ThreatLevel,
};
