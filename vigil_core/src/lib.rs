//! # Vigil Core
//!
//! Core library for the Vigil operations console. The console attaches to an
//! administrative portal's HTTP API and keeps a handful of operational
//! dashboards live in the terminal. This crate provides the building blocks:
//!
//! - **Refresh**: the coordinator that owns each dashboard's timer lifecycle,
//!   visibility pause/resume and manual triggers
//! - **Client**: async HTTP access to the portal's JSON endpoints
//! - **Snapshot**: opaque payload model with dotted-path lookups and usage
//!   thresholds
//! - **Config**: file, environment and flag layering
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use vigil_core::{PortalClient, RefreshConfig, RefreshCoordinator};
//!
//! # async fn demo() -> vigil_core::VigilResult<()> {
//! let client = PortalClient::new("http://127.0.0.1:8080", Duration::from_secs(10))?;
//! let mut refresh = RefreshCoordinator::new(
//!     RefreshConfig::new("metrics", Duration::from_secs(30)),
//!     move |_cancel| {
//!         let client = client.clone();
//!         async move {
//!             let payload = client.metrics().await?;
//!             println!("{}", payload);
//!             Ok(())
//!         }
//!     },
//! );
//! refresh.start();
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod refresh;
pub mod snapshot;

// Re-export commonly used types for easy access
pub use client::PortalClient;
pub use config::{ConsoleConfig, RefreshIntervals};
pub use error::{VigilError, VigilResult};
pub use refresh::{RefreshCancel, RefreshConfig, RefreshCoordinator, RefreshMode, RefreshStatus};
pub use snapshot::{MetricsSnapshot, UsageLevel};
