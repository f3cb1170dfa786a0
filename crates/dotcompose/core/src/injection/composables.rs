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

//! Composable units
//!
//! A unit wraps one service instance and knows how to bring it to its composed
//! state: inject dependencies, run `init`, run `on_services_resolved`. Every
//! failure along the way is captured as a [`UnitError`] value rather than
//! aborting, so one broken service never hides the errors of another.

use crate::injection::discovery::DependencyRequest;
use crate::injection::error::{Hook, UnitError};
use crate::injection::service::{Instance, Service};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Resolves a dependency by name against the enclosing context chain
pub type Getter<'a> = &'a (dyn Fn(&str) -> Option<Instance> + Send + Sync);

/// Common capability of stub and live units
#[async_trait]
pub trait ComposableUnit: Send + Sync {
    /// Whether the unit reached its composed state; never resets
    fn is_composed(&self) -> bool;

    /// Names of the services this unit asks for, in declaration order
    fn dependency_names(&self) -> Vec<&str>;

    /// Shared handle to the instance, available once composed
    fn instance(&self) -> Option<Instance>;

    /// Errors stored by the last failed compose attempt
    fn errors(&self) -> &[UnitError];

    /// Composes the unit; `None` on success or when already composed
    async fn compose(&mut self, getter: Getter<'_>) -> Option<Vec<UnitError>>;
}

/// Wraps an already-finished value, e.g. a static supplied by the host
pub struct StubComposable {
    instance: Instance,
}

impl StubComposable {
    pub fn new(instance: Instance) -> Self {
        Self { instance }
    }
}

#[async_trait]
impl ComposableUnit for StubComposable {
    fn is_composed(&self) -> bool {
        true
    }

    fn dependency_names(&self) -> Vec<&str> {
        Vec::new()
    }

    fn instance(&self) -> Option<Instance> {
        Some(Arc::clone(&self.instance))
    }

    fn errors(&self) -> &[UnitError] {
        &[]
    }

    async fn compose(&mut self, _getter: Getter<'_>) -> Option<Vec<UnitError>> {
        None
    }
}

/// Live unit driving injection and lifecycle hooks of a service exactly once
pub struct Composable<S: Service> {
    /// Service name used in diagnostics
    label: String,

    /// Exclusively owned instance while it is still being composed
    pending: Option<Box<S>>,

    /// Frozen, shareable instance once composition succeeded
    composed: Option<Arc<S>>,

    dependency_requests: Vec<DependencyRequest<S>>,

    errors: Vec<UnitError>,
}

impl<S: Service> Composable<S> {
    pub fn new(label: impl Into<String>, instance: S, dependency_requests: Vec<DependencyRequest<S>>) -> Self {
        Self {
            label: label.into(),
            pending: Some(Box::new(instance)),
            composed: None,
            dependency_requests,
            errors: Vec::new(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn dependency_requests(&self) -> &[DependencyRequest<S>] {
        &self.dependency_requests
    }

    /// Typed handle to the composed instance
    pub fn shared(&self) -> Option<Arc<S>> {
        self.composed.clone()
    }
}

fn inject<S>(instance: &mut S, requests: &[DependencyRequest<S>], getter: Getter<'_>) -> Vec<UnitError> {
    requests.iter().filter_map(|request| request.set(instance, getter(request.name())).err()).collect()
}

#[async_trait]
impl<S: Service> ComposableUnit for Composable<S> {
    fn is_composed(&self) -> bool {
        self.composed.is_some()
    }

    fn dependency_names(&self) -> Vec<&str> {
        self.dependency_requests.iter().map(DependencyRequest::name).collect()
    }

    fn instance(&self) -> Option<Instance> {
        self.composed.clone().map(|shared| shared as Instance)
    }

    fn errors(&self) -> &[UnitError] {
        &self.errors
    }

    async fn compose(&mut self, getter: Getter<'_>) -> Option<Vec<UnitError>> {
        let Some(instance) = self.pending.as_deref_mut() else {
            return None;
        };

        let mut errors = inject(instance, &self.dependency_requests, getter);

        if let Err(source) = instance.init().await {
            errors.push(UnitError::hook(&self.label, Hook::Init, source));
        }

        if let Err(source) = instance.on_services_resolved() {
            errors.push(UnitError::hook(&self.label, Hook::OnServicesResolved, source));
        }

        if !errors.is_empty() {
            debug!(service = %self.label, errors = errors.len(), "Service failed to compose");
            self.errors = errors.clone();
            return Some(errors);
        }

        self.errors.clear();
        self.composed = self.pending.take().map(Arc::from);
        debug!(service = %self.label, "Service composed");
        None
    }
}
