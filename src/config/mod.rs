//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → environment overlay (AGENT, SERVICE_ENV, SERVICE_NS)
//!     → validation.rs (semantic checks)
//!     → AckServerConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Read once at process start, never per request
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::AckServerConfig;
pub use schema::LimitsConfig;
pub use schema::ListenerConfig;
pub use schema::ObservabilityConfig;
pub use schema::ServiceIdentity;
