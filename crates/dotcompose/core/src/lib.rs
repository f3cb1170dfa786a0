// Dotlanth
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! # dotcompose-core
//!
//! Dependency injection and lifecycle composition for long-running services.
//!
//! Services are registered in a [`ServiceContext`], which derives a deterministic
//! initialization order from the dependencies they declare, injects resolved
//! dependencies and runs each service's `init` and `on_services_resolved` hooks
//! exactly once. Services with no dependencies are composed concurrently; the
//! rest follow one by one in topological order. Failures are collected per
//! service and reported together.
//!
//! ```no_run
//! use std::sync::Arc;
//! use dotcompose_core::{ComposerBuilder, Injection, Service};
//!
//! struct Server;
//!
//! #[derive(Default)]
//! struct Router {
//!     server: Option<Arc<Server>>,
//! }
//!
//! impl Service for Router {
//!     fn injections() -> Vec<Injection<Self>> {
//!         vec![Injection::required("server", |r: &mut Router, s: Arc<Server>| r.server = Some(s)).service("$server")]
//!     }
//! }
//!
//! # async fn run() -> Result<(), dotcompose_core::ComposeError> {
//! let root = ComposerBuilder::new().with_static("$server", Arc::new(Server)).service(Router::default).compose().await?;
//! let router = root.get_typed::<Router>("Router")?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod injection;
pub mod logging;
pub mod scheduling;

pub use config::{ComposeConfig, ConfigError};
pub use injection::{
    ComposeError, ComposeResult, ComposerBuilder, CompositionError, DependencyIdentifier, Discovery, Hook, HookError, Injection, Instance, Service, ServiceContext,
    ServiceContextOptions, UnitError,
};
pub use logging::{LogSink, NoopSink, TracingSink, setup_logging};
pub use scheduling::{CompositionPlan, CyclicGraphError, ToposortOptions, toposort};
