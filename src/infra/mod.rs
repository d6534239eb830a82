//! Infrastructure layer implementations.

pub mod device;
pub mod discovery;
pub mod history;
pub mod http;
pub mod narrative;
pub mod providers;

pub use device::{HostDeviceInfo, UserAgentDeviceInfo};
pub use discovery::{Discovery, DiscoveryService, OwnAddressResolver};
pub use history::JsonFileHistoryStore;
pub use http::ReqwestFetcher;
pub use narrative::GeminiNarrativeClient;
pub use providers::{ProviderAdapter, ProviderEndpoint};
