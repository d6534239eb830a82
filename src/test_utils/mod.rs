//! Test utilities and mock implementations.

mod mocks;

pub use mocks::{
    MockConfig, MockDeviceInfo, MockHistoryStore, MockHttpFetcher, MockNarrativeGenerator,
};
