//! JFrog AppTrust provider.
//!
//! This crate manages AppTrust applications, their versions, package bindings
//! and lifecycle actions (promotion, release, rollback) through the JFrog
//! Platform REST API, and exposes read-only data sources over the same API.
//!
//! # Overview
//!
//! - **Resources**: [`resources`] implements create, read, update, delete and
//!   import for every managed entity.
//! - **Data sources**: [`data_sources`] implements read-only lookups.
//! - **Provider**: [`AppTrustProvider`] dispatches [`ProviderService`]
//!   operations by type name through a [`Registry`].
//! - **Reconciliation**: [`reconcile`] keeps "omitted" and "explicitly empty"
//!   apart across write-then-read cycles, so refreshed state converges.
//! - **Identifiers**: [`identifier`] encodes composite keys as
//!   colon-delimited strings.
//! - **Errors**: [`ProviderError`] maps HTTP outcomes to typed errors and
//!   diagnostics.
//! - **Logging**: [`init_logging`] wires `tracing` to stderr, filtered by
//!   `APPTRUST_LOG`.
//!
//! # Quick Start
//!
//! ```no_run
//! use apptrust_provider::{init_logging, AppTrustProvider, ProviderService};
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), apptrust_provider::ProviderError> {
//! init_logging();
//!
//! let provider = AppTrustProvider::default();
//! provider
//!     .configure(json!({"url": "https://acme.jfrog.io", "access_token": "..."}))
//!     .await?;
//!
//! let state = provider
//!     .create(
//!         "apptrust_application",
//!         json!({
//!             "application_key": "payments",
//!             "application_name": "Payments",
//!             "project_key": "shop",
//!             "user_owners": []
//!         }),
//!     )
//!     .await?;
//! assert_eq!(state["user_owners"], json!([]));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api_error;
pub mod client;
pub mod config;
pub mod data_sources;
pub mod driver;
pub mod error;
pub mod identifier;
pub mod logging;
pub mod provider;
pub mod reconcile;
pub mod registry;
pub mod resources;
pub mod schema;
pub mod service;
pub mod testing;
pub mod types;
pub mod validation;

// Re-export main types at crate root
pub use client::ApiClient;
pub use config::ProviderConfig;
pub use error::ProviderError;
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use provider::AppTrustProvider;
pub use registry::Registry;
pub use schema::ProviderSchema;
pub use service::ProviderService;
pub use types::{ImportedResource, ProviderMetadata};
pub use validation::{is_valid, validate, validate_result};

// Re-export async_trait for convenience
pub use async_trait::async_trait;

// Re-export commonly used external types
pub use serde_json;
pub use tracing;
