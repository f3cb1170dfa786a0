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

//! Per-scope registry of composable units keyed by service name

use crate::injection::composables::{ComposableUnit, Getter};
use crate::injection::error::{ComposeError, ComposeResult, UnitError};
use crate::injection::identifier::DependencyIdentifier;
use crate::injection::service::Instance;
use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use tracing::debug;

struct ServiceEntry {
    identifier: DependencyIdentifier,
    unit: Box<dyn ComposableUnit>,
}

/// Registered units in insertion order plus the instances composed so far
#[derive(Default)]
pub struct ServiceMap {
    entries: Vec<ServiceEntry>,

    /// Service name to position in `entries`
    index: HashMap<String, usize>,

    /// Instances of composed units; the only table dependency lookups read
    composed: HashMap<String, Instance>,
}

impl ServiceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&dyn ComposableUnit> {
        self.index.get(name).map(|&i| self.entries[i].unit.as_ref())
    }

    /// Identifier as registered, including its instance tag
    pub fn identifier(&self, name: &str) -> Option<&DependencyIdentifier> {
        self.index.get(name).map(|&i| &self.entries[i].identifier)
    }

    /// Composed instance registered under `name`
    pub fn instance(&self, name: &str) -> Option<Instance> {
        self.composed.get(name).cloned()
    }

    /// Names whose units have not reached their composed state
    pub fn pending(&self) -> Vec<&str> {
        self.entries.iter().filter(|entry| !entry.unit.is_composed()).map(|entry| entry.identifier.name()).collect()
    }

    /// Fails with [`ComposeError::DuplicateService`] when the name is already claimed here
    pub fn ensure_vacant(&self, identifier: &DependencyIdentifier) -> ComposeResult<()> {
        match self.identifier(identifier.name()) {
            Some(existing) => Err(ComposeError::DuplicateService {
                name: identifier.name().to_string(),
                instance: identifier.debug_instance().to_string(),
                existing: existing.debug_instance().to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Registers a unit; a name may only be claimed once per scope
    pub fn insert(&mut self, identifier: DependencyIdentifier, unit: Box<dyn ComposableUnit>) -> ComposeResult<()> {
        self.ensure_vacant(&identifier)?;

        let name = identifier.name().to_string();
        if let Some(instance) = unit.instance() {
            self.composed.insert(name.clone(), instance);
        }

        self.index.insert(name, self.entries.len());
        self.entries.push(ServiceEntry { identifier, unit });
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DependencyIdentifier, &dyn ComposableUnit)> {
        self.entries.iter().map(|entry| (&entry.identifier, entry.unit.as_ref()))
    }

    /// Dependency names per registered service, in insertion order
    pub fn dependency_graph(&self) -> Vec<(&str, Vec<&str>)> {
        self.entries.iter().map(|entry| (entry.identifier.name(), entry.unit.dependency_names())).collect()
    }

    /// Composes the named units at the same time; names not registered here are skipped
    pub(crate) async fn compose_concurrently(&mut self, names: &[String], fallback: Getter<'_>) -> Vec<UnitError> {
        let ServiceMap { entries, index, composed } = self;
        let wanted: HashSet<usize> = names.iter().filter_map(|name| index.get(name.as_str()).copied()).collect();

        let errors: Vec<UnitError> = {
            let lookup = |name: &str| scoped_lookup(&*index, &*composed, fallback, name);
            let getter: Getter<'_> = &lookup;

            let tasks = entries
                .iter_mut()
                .enumerate()
                .filter(|(i, _)| wanted.contains(i))
                .map(|(_, entry)| entry.unit.compose(getter));

            join_all(tasks).await.into_iter().flatten().flatten().collect()
        };

        for i in wanted {
            publish(&entries[i], composed);
        }

        errors
    }

    /// Composes the named units one after another, each seeing the ones before it.
    ///
    /// A unit is deferred without errors of its own when one of its dependencies in this scope
    /// failed or was deferred during the current pass, so one failure is reported once.
    pub(crate) async fn compose_in_order(&mut self, names: &[String], fallback: Getter<'_>) -> Vec<UnitError> {
        let ServiceMap { entries, index, composed } = self;
        let mut errors = Vec::new();

        // Owned units outside `names` already had their chance in this pass
        let mut blocked: HashSet<String> = entries
            .iter()
            .filter(|entry| !entry.unit.is_composed() && !names.iter().any(|name| name == entry.identifier.name()))
            .map(|entry| entry.identifier.name().to_string())
            .collect();

        for name in names {
            let Some(&i) = index.get(name.as_str()) else {
                debug!(service = %name, "No unit registered in this scope, skipping");
                continue;
            };

            if entries[i].unit.dependency_names().iter().any(|dependency| blocked.contains(*dependency)) {
                debug!(service = %name, "Dependency failed to compose, deferring");
                blocked.insert(name.clone());
                continue;
            }

            let failures = {
                let lookup = |name: &str| scoped_lookup(&*index, &*composed, fallback, name);
                entries[i].unit.compose(&lookup).await
            };

            if let Some(failures) = failures {
                errors.extend(failures);
                blocked.insert(name.clone());
            }

            publish(&entries[i], composed);
        }

        errors
    }
}

/// Names owned by the scope resolve here or not at all; only unknown names reach `fallback`
fn scoped_lookup(index: &HashMap<String, usize>, composed: &HashMap<String, Instance>, fallback: Getter<'_>, name: &str) -> Option<Instance> {
    if index.contains_key(name) {
        return composed.get(name).cloned();
    }

    fallback(name)
}

fn publish(entry: &ServiceEntry, composed: &mut HashMap<String, Instance>) {
    if let Some(instance) = entry.unit.instance() {
        composed.insert(entry.identifier.name().to_string(), instance);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::injection::composables::{Composable, StubComposable};
    use crate::injection::discovery::Discovery;
    use crate::injection::service::{Injection, Service};
    use std::sync::Arc;

    fn no_services(_: &str) -> Option<Instance> {
        None
    }

    #[derive(Default)]
    struct Leaf;

    impl Service for Leaf {}

    #[derive(Default)]
    struct Branch {
        leaf: Option<Arc<Leaf>>,
    }

    impl Service for Branch {
        fn injections() -> Vec<Injection<Self>> {
            vec![Injection::required("leaf", |b: &mut Branch, leaf: Arc<Leaf>| b.leaf = Some(leaf)).service("Leaf")]
        }
    }

    #[derive(Default)]
    struct Upstream {
        missing: Option<Arc<Leaf>>,
    }

    impl Service for Upstream {
        fn injections() -> Vec<Injection<Self>> {
            vec![Injection::required("missing", |u: &mut Upstream, leaf: Arc<Leaf>| u.missing = Some(leaf))]
        }
    }

    #[derive(Default)]
    struct Downstream {
        upstream: Option<Arc<Upstream>>,
    }

    impl Service for Downstream {
        fn injections() -> Vec<Injection<Self>> {
            vec![Injection::required("upstream", |d: &mut Downstream, upstream: Arc<Upstream>| d.upstream = Some(upstream)).service("Upstream")]
        }
    }

    #[derive(Default)]
    struct Tail {
        downstream: Option<Arc<Downstream>>,
    }

    impl Service for Tail {
        fn injections() -> Vec<Injection<Self>> {
            vec![Injection::required("downstream", |t: &mut Tail, downstream: Arc<Downstream>| t.downstream = Some(downstream)).service("Downstream")]
        }
    }

    fn unit<S: Service>(instance: S) -> Box<dyn ComposableUnit> {
        Box::new(Composable::new(std::any::type_name::<S>(), instance, Discovery::Default.dependencies::<S>()))
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let mut map = ServiceMap::new();
        map.insert(DependencyIdentifier::with_instance("Leaf", "first"), unit(Leaf)).unwrap();

        let error = map.insert(DependencyIdentifier::with_instance("Leaf", "second"), unit(Leaf)).unwrap_err();

        assert_eq!(error.to_string(), "Duplicate services named 'Leaf' from 'second' and 'first' within the same scope");
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_stub_instances_are_published_on_insert() {
        let mut map = ServiceMap::new();
        map.insert("config".into(), Box::new(StubComposable::new(Arc::new(7u32)))).unwrap();

        assert!(map.pending().is_empty());
        assert_eq!(*map.instance("config").unwrap().downcast::<u32>().unwrap(), 7);
    }

    #[test]
    fn test_dependency_graph_keeps_insertion_order() {
        let mut map = ServiceMap::new();
        map.insert("Branch".into(), unit(Branch::default())).unwrap();
        map.insert("Leaf".into(), unit(Leaf)).unwrap();

        assert_eq!(map.dependency_graph(), vec![("Branch", vec!["Leaf"]), ("Leaf", vec![])]);
    }

    #[tokio::test]
    async fn test_compose_in_order_sees_earlier_units() {
        let mut map = ServiceMap::new();
        map.insert("Branch".into(), unit(Branch::default())).unwrap();
        map.insert("Leaf".into(), unit(Leaf)).unwrap();

        let order = vec!["Leaf".to_string(), "Branch".to_string(), "Elsewhere".to_string()];
        let errors = map.compose_in_order(&order, &no_services).await;

        assert!(errors.is_empty());
        assert!(map.pending().is_empty());
        assert!(map.instance("Branch").is_some());
    }

    #[tokio::test]
    async fn test_wrong_order_reports_missing_dependency() {
        let mut map = ServiceMap::new();
        map.insert("Branch".into(), unit(Branch::default())).unwrap();
        map.insert("Leaf".into(), unit(Leaf)).unwrap();

        let order = vec!["Branch".to_string(), "Leaf".to_string()];
        let errors = map.compose_in_order(&order, &no_services).await;

        assert_eq!(errors.len(), 1);
        assert!(matches!(&errors[0], UnitError::MissingDependency { dependency, .. } if dependency == "Leaf"));
        assert_eq!(map.pending(), vec!["Branch"]);
    }

    #[tokio::test]
    async fn test_compose_concurrently_uses_fallback() {
        let mut map = ServiceMap::new();
        map.insert("Branch".into(), unit(Branch::default())).unwrap();
        map.insert("Other".into(), unit(Leaf)).unwrap();

        let leaf: Instance = Arc::new(Leaf);
        let fallback = move |name: &str| (name == "Leaf").then(|| Arc::clone(&leaf));

        let names = vec!["Branch".to_string(), "Other".to_string()];
        let errors = map.compose_concurrently(&names, &fallback).await;

        assert!(errors.is_empty());
        assert!(map.instance("Branch").is_some());
        assert!(map.instance("Other").is_some());
    }

    #[tokio::test]
    async fn test_owned_names_never_fall_back() {
        let mut map = ServiceMap::new();
        map.insert("Branch".into(), unit(Branch::default())).unwrap();
        map.insert("Leaf".into(), unit(Leaf)).unwrap();

        let outside: Instance = Arc::new(Leaf);
        let fallback = move |_: &str| Some(Arc::clone(&outside));

        let order = vec!["Branch".to_string(), "Leaf".to_string()];
        let errors = map.compose_in_order(&order, &fallback).await;

        assert_eq!(errors.len(), 1);
        assert!(matches!(&errors[0], UnitError::MissingDependency { dependency, .. } if dependency == "Leaf"));
    }

    #[tokio::test]
    async fn test_failed_dependency_defers_dependents() {
        let mut map = ServiceMap::new();
        map.insert("Tail".into(), unit(Tail::default())).unwrap();
        map.insert("Downstream".into(), unit(Downstream::default())).unwrap();
        map.insert("Upstream".into(), unit(Upstream::default())).unwrap();

        let order = vec!["Upstream".to_string(), "Downstream".to_string(), "Tail".to_string()];
        let errors = map.compose_in_order(&order, &no_services).await;

        assert_eq!(errors.len(), 1);
        assert!(matches!(&errors[0], UnitError::MissingDependency { dependency, .. } if dependency == "missing"));
        assert_eq!(map.pending(), vec!["Tail", "Downstream", "Upstream"]);
    }

    #[test]
    fn test_ensure_vacant() {
        let mut map = ServiceMap::new();
        map.insert(DependencyIdentifier::with_instance("Leaf", "first"), unit(Leaf)).unwrap();

        assert!(map.ensure_vacant(&"Branch".into()).is_ok());
        assert!(matches!(map.ensure_vacant(&"Leaf".into()), Err(ComposeError::DuplicateService { .. })));
    }
}
