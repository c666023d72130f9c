//! PingDirectory Provider
//!
//! A Terraform-style provider that manages PingDirectory server
//! configuration through the PingDirectory configuration REST API.
//!
//! # Overview
//!
//! The crate provides:
//!
//! - **ConfigClient**: An HTTP client for the configuration API (GET, POST, PATCH, DELETE, list)
//! - **Resources**: Managed configuration objects with create/read/update/delete and import
//! - **Data sources**: Read-only lookups of single objects and filtered lists of ids
//! - **ProviderService trait**: The provider lifecycle, implemented by [`PingDirectoryProvider`]
//! - **Plan computation**: Planned state and attribute changes derived from the schema
//! - **Error types**: A single [`ProviderError`] reported to the user as diagnostics
//! - **Logging**: Integration with `tracing` for structured logging
//!
//! # Quick Start
//!
//! ```ignore
//! use pingdirectory_provider::{PingDirectoryProvider, ProviderService, ServiceHandle};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     pingdirectory_provider::init_logging();
//!
//!     let handle = ServiceHandle::new(PingDirectoryProvider::new());
//!     let reply = handle
//!         .configure(json!({
//!             "https_host": "https://localhost:1443",
//!             "username": "cn=administrator",
//!             "password": "2FederateM0re",
//!             "product_version": "10.3.0.0"
//!         }))
//!         .await;
//!     assert!(!reply.has_errors());
//!
//!     let config = json!({"name": "old-logs", "type": "file-count", "number_of_files": 5});
//!     let plan = handle
//!         .plan("pingdirectory_log_retention_policy", None, config)
//!         .await;
//!     if let Some(plan) = plan.value {
//!         let state = handle
//!             .create("pingdirectory_log_retention_policy", plan.planned_state)
//!             .await;
//!         println!("{:?}", state.value);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Configuration
//!
//! Every provider attribute may be omitted and read from the environment
//! instead: `PINGDIRECTORY_PROVIDER_HTTPS_HOST`,
//! `PINGDIRECTORY_PROVIDER_USERNAME`, `PINGDIRECTORY_PROVIDER_PASSWORD`,
//! `PINGDIRECTORY_PROVIDER_INSECURE_TRUST_ALL_TLS`,
//! `PINGDIRECTORY_PROVIDER_CA_CERTIFICATE_PEM_FILES` and
//! `PINGDIRECTORY_PROVIDER_PRODUCT_VERSION`.
//!
//! # Resources
//!
//! - `pingdirectory_default_group_implementation`
//! - `pingdirectory_license`
//! - `pingdirectory_log_field_mapping`, `pingdirectory_default_log_field_mapping`
//! - `pingdirectory_log_retention_policy`, `pingdirectory_default_log_retention_policy`
//! - `pingdirectory_default_server_instance`
//!
//! `default_` resources adopt an object that already exists on the server;
//! deleting them only removes them from state.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod error;
pub mod internaltypes;
pub mod logging;
pub mod operations;
pub mod plan;
pub mod provider;
pub mod resources;
pub mod schema;
pub mod service;
pub mod testing;
pub mod types;
pub mod validation;

// Re-export main types at crate root
pub use client::ConfigClient;
pub use config::ProviderConfig;
pub use error::ProviderError;
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use provider::PingDirectoryProvider;
pub use schema::ProviderSchema;
pub use service::{ProviderService, Reply, ServiceHandle};
pub use testing::ProviderTester;
pub use types::{
    AttributeChange, ImportedResource, PlanResult, ProviderMetadata, ReadResult, Value,
};
pub use validation::{is_valid, validate, validate_result};

// Re-export async_trait for convenience
pub use async_trait::async_trait;

// Re-export commonly used external types
pub use serde_json;
pub use tracing;
