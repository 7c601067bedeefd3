//! Shared helpers for integration tests.

#![allow(dead_code)]

pub mod socket_guard;

use lecture_core::{Credential, EngineConfig, Transport};

pub use socket_guard::start_mock_server_or_skip;

/// Engine configuration with every endpoint on the mock server.
pub fn mock_config(base: &str) -> EngineConfig {
    EngineConfig {
        workers: 4,
        ..EngineConfig::for_origin(base)
    }
}

/// Transport with default timeouts.
pub fn transport(config: &EngineConfig) -> Transport {
    Transport::new(config.timeouts).expect("build transport")
}

/// Credential accepted by the mocks.
pub fn credential() -> Credential {
    Credential::new("session-cookie-value", "api-token-value")
}
