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

//! Service context
//!
//! A [`ServiceContext`] is one resolution scope. Services are added to it, then
//! a single composition pass orders them, injects their dependencies and runs
//! their lifecycle hooks. Lookups that miss in a scope continue in its parent,
//! which is how a root scope sees the statics of the scope above it.

use crate::config::ComposeConfig;
use crate::injection::composables::{Composable, ComposableUnit, StubComposable};
use crate::injection::discovery::Discovery;
use crate::injection::error::{ComposeError, ComposeResult, CompositionError};
use crate::injection::identifier::DependencyIdentifier;
use crate::injection::service::{Instance, Service};
use crate::injection::service_map::ServiceMap;
use crate::logging::{LogSink, NoopSink, TracingSink};
use crate::scheduling::{CompositionPlan, ToposortOptions};
use std::any::{Any, type_name};
use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument};

const INFO_TAGS: &[&str] = &["dotcompose", "info"];
const ERROR_TAGS: &[&str] = &["dotcompose", "error"];

/// Options supplied when creating a context
#[derive(Clone)]
pub struct ServiceContextOptions {
    pub discovery: Discovery,
    pub logger: Arc<dyn LogSink>,
    pub toposort: ToposortOptions,
}

impl Default for ServiceContextOptions {
    fn default() -> Self {
        Self {
            discovery: Discovery::Default,
            logger: Arc::new(TracingSink),
            toposort: ToposortOptions::default(),
        }
    }
}

impl ServiceContextOptions {
    pub fn new(discovery: Discovery) -> Self {
        Self { discovery, ..Self::default() }
    }

    pub fn with_logger(mut self, logger: Arc<dyn LogSink>) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_toposort(mut self, toposort: ToposortOptions) -> Self {
        self.toposort = toposort;
        self
    }

    /// Default discovery with the sink and cycle handling `config` selects
    pub fn from_config(config: &ComposeConfig) -> Self {
        let logger: Arc<dyn LogSink> = if config.log_compose { Arc::new(TracingSink) } else { Arc::new(NoopSink) };

        Self {
            discovery: Discovery::Default,
            logger,
            toposort: config.toposort_options(),
        }
    }
}

impl fmt::Debug for ServiceContextOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceContextOptions")
            .field("discovery", &self.discovery)
            .field("toposort", &self.toposort)
            .finish_non_exhaustive()
    }
}

/// One resolution scope with an optional read-only parent
pub struct ServiceContext {
    options: ServiceContextOptions,
    services: ServiceMap,
    parent: Option<Arc<ServiceContext>>,

    /// Set by a successful composition pass, cleared by `add`
    composed: bool,
}

impl ServiceContext {
    pub fn new(options: ServiceContextOptions) -> Self {
        Self {
            options,
            services: ServiceMap::new(),
            parent: None,
            composed: false,
        }
    }

    pub fn with_parent(options: ServiceContextOptions, parent: Arc<ServiceContext>) -> Self {
        Self {
            parent: Some(parent),
            ..Self::new(options)
        }
    }

    /// Scope that only hosts already-resolved values
    pub fn statics(logger: Arc<dyn LogSink>) -> Self {
        Self::new(ServiceContextOptions::new(Discovery::Stub).with_logger(logger))
    }

    pub fn is_composed(&self) -> bool {
        self.composed
    }

    pub fn parent(&self) -> Option<&Arc<ServiceContext>> {
        self.parent.as_ref()
    }

    pub fn options(&self) -> &ServiceContextOptions {
        &self.options
    }

    pub fn services(&self) -> &ServiceMap {
        &self.services
    }

    /// Registers the service built by `construct`.
    ///
    /// The name is derived before `construct` runs, so a rejected service is never built.
    /// Shadowing a service of the parent scope is allowed.
    pub fn add<S, F>(&mut self, construct: F) -> ComposeResult<DependencyIdentifier>
    where
        S: Service,
        F: FnOnce() -> S,
    {
        let discovery = self.options.discovery;
        let identifier = discovery
            .identifier::<S>()?
            .ok_or_else(|| ComposeError::Discovery(type_name::<S>().to_string()))?;

        self.services.ensure_vacant(&identifier)?;
        self.composed = false;

        let unit = Composable::new(identifier.name(), construct(), discovery.dependencies::<S>());
        self.services.insert(identifier.clone(), Box::new(unit))?;

        self.log(INFO_TAGS, &format!("Discovered service '{}'", identifier));
        Ok(identifier)
    }

    pub fn add_default<S: Service + Default>(&mut self) -> ComposeResult<DependencyIdentifier> {
        self.add(S::default)
    }

    /// Registers an already-finished value under `key`
    pub fn add_static<T: Any + Send + Sync>(&mut self, key: impl Into<String>, instance: Arc<T>) -> ComposeResult<DependencyIdentifier> {
        let identifier = DependencyIdentifier::with_instance(key, type_name::<T>());
        self.services.insert(identifier.clone(), Box::new(StubComposable::new(instance)))?;

        debug!(service = %identifier, "Registered static value");
        Ok(identifier)
    }

    /// Runs the composition pass; a composed context is left untouched.
    ///
    /// Units without dependencies are composed concurrently first, then the rest one at a time
    /// in dependency order. Names in the order that this scope does not own are skipped, and a
    /// unit whose dependency in this scope failed is left pending without errors of its own.
    ///
    /// # Errors
    ///
    /// [`ComposeError::CyclicGraph`] before any unit runs, or [`ComposeError::Composition`]
    /// listing every unit error of the pass. The context stays uncomposed in both cases.
    #[instrument(skip(self), fields(services = self.services.len()))]
    pub async fn compose(&mut self) -> ComposeResult<()> {
        if self.composed {
            self.log(INFO_TAGS, "Service context already fully composed - skipping...");
            return Ok(());
        }

        self.log(INFO_TAGS, "Composing service context...");

        let plan = CompositionPlan::build(self.services.dependency_graph(), self.options.toposort)?;
        let downstream: Vec<String> = plan.ordered().iter().filter(|name| self.services.has(name)).cloned().collect();

        let parent = self.parent.clone();
        let fallback = move |name: &str| parent.as_ref().and_then(|parent| parent.lookup(name));

        let mut errors = Vec::new();

        self.log(INFO_TAGS, &format!("Composing top level services [{}]...", plan.islands().join(", ")));
        errors.extend(self.services.compose_concurrently(plan.islands(), &fallback).await);

        self.log(INFO_TAGS, &format!("Composing downstream services [{}]...", downstream.join(", ")));
        errors.extend(self.services.compose_in_order(&downstream, &fallback).await);

        if !errors.is_empty() {
            self.log(ERROR_TAGS, &format!("Failed to compose service context with {} errors", errors.len()));
            return Err(CompositionError::new("Failed to compose service context", errors).into());
        }

        self.composed = true;
        self.log(INFO_TAGS, "Composition of services completed");
        Ok(())
    }

    /// Composed instance registered in this scope; the parent is never consulted
    pub fn get<K: Borrow<str> + ?Sized>(&self, key: &K) -> ComposeResult<Option<Instance>> {
        if !self.composed {
            return Err(ComposeError::NotComposed);
        }

        Ok(self.services.instance(key.borrow()))
    }

    pub fn get_by_name(&self, name: &str) -> ComposeResult<Option<Instance>> {
        self.get(name)
    }

    /// Like [`ServiceContext::get`], `None` also when the instance is not a `T`
    pub fn get_typed<T: Any + Send + Sync>(&self, key: &str) -> ComposeResult<Option<Arc<T>>> {
        Ok(self.get(key)?.and_then(|instance| instance.downcast::<T>().ok()))
    }

    /// Composes a transient instance against this scope and its parents
    #[instrument(skip(self, instance), fields(service = type_name::<S>()))]
    pub async fn resolve<S: Service>(&self, instance: S) -> ComposeResult<Arc<S>> {
        let mut unit = Composable::new(type_name::<S>(), instance, Discovery::Default.dependencies::<S>());
        let getter = |name: &str| self.lookup(name);

        if let Some(errors) = unit.compose(&getter).await {
            return Err(CompositionError::new(format!("Failed to compose instance '{}'", type_name::<S>()), errors).into());
        }

        unit.shared()
            .ok_or_else(|| CompositionError::new(format!("Failed to compose instance '{}'", type_name::<S>()), Vec::new()).into())
    }

    /// Resolution chain: a name this scope owns resolves here, any other name in the parent
    fn lookup(&self, name: &str) -> Option<Instance> {
        if self.services.has(name) {
            return self.services.instance(name);
        }

        self.parent.as_ref().and_then(|parent| parent.lookup(name))
    }

    fn log(&self, tags: &[&str], message: &str) {
        self.options.logger.log(tags, message);
    }
}

impl fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let services: Vec<&str> = self.services.iter().map(|(identifier, _)| identifier.name()).collect();

        f.debug_struct("ServiceContext")
            .field("services", &services)
            .field("composed", &self.composed)
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}
