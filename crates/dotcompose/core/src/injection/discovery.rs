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

//! Dependency discovery
//!
//! Turns the metadata a [`Service`] declares into an identifier and a list of
//! [`DependencyRequest`]s. The default strategy reads the type's registration;
//! the stub strategy backs scopes that only hold already-resolved static values.

use crate::injection::error::{ComposeError, ComposeResult, UnitError};
use crate::injection::identifier::DependencyIdentifier;
use crate::injection::service::{Injection, Instance, Service};
use std::any::type_name;
use std::fmt;

type Setter<S> = Box<dyn Fn(&mut S, Option<Instance>) -> Result<(), UnitError> + Send + Sync>;

/// A single dependency a unit asks for, with the setter that records it
pub struct DependencyRequest<S> {
    /// Identifier name of the requested service
    name: String,

    /// Receiving field on the owning candidate
    field: &'static str,

    required: bool,

    setter: Setter<S>,
}

impl<S> DependencyRequest<S> {
    pub fn new(name: impl Into<String>, field: &'static str, required: bool, setter: Setter<S>) -> Self {
        Self {
            name: name.into(),
            field,
            required,
            setter,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field(&self) -> &'static str {
        self.field
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Hands the resolved value (or its absence) to the owning candidate
    pub fn set(&self, target: &mut S, value: Option<Instance>) -> Result<(), UnitError> {
        (self.setter)(target, value)
    }
}

impl<S> fmt::Debug for DependencyRequest<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyRequest")
            .field("name", &self.name)
            .field("field", &self.field)
            .field("required", &self.required)
            .finish()
    }
}

/// Discovery strategies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Discovery {
    /// Reads service names and injections declared on the type
    #[default]
    Default,

    /// No dependencies and no identifiers; hosts static values only
    Stub,
}

impl Discovery {
    /// Derives the identifier `S` registers under, `None` when no name is derivable
    pub fn identifier<S: Service>(&self) -> ComposeResult<Option<DependencyIdentifier>> {
        match self {
            Discovery::Default => Ok(derive_name::<S>().map(|name| DependencyIdentifier::with_instance(name, type_name::<S>()))),
            Discovery::Stub => Err(ComposeError::Unsupported("identifier discovery")),
        }
    }

    /// Builds the dependency requests declared by `S`
    pub fn dependencies<S: Service>(&self) -> Vec<DependencyRequest<S>> {
        match self {
            Discovery::Default => {
                let service = derive_name::<S>().unwrap_or(type_name::<S>());
                S::injections().into_iter().map(|injection| request_for(service, injection)).collect()
            }
            Discovery::Stub => Vec::new(),
        }
    }
}

fn request_for<S: Service>(service: &'static str, injection: Injection<S>) -> DependencyRequest<S> {
    let name = injection.name().to_string();
    let field = injection.field();
    let required = injection.is_required();
    let dependency = name.clone();

    let setter = move |target: &mut S, value: Option<Instance>| {
        if value.is_none() && required {
            return Err(UnitError::MissingDependency {
                service: service.to_string(),
                dependency: dependency.clone(),
            });
        }

        injection.apply(target, value).map_err(|expected| UnitError::TypeMismatch {
            service: service.to_string(),
            dependency: dependency.clone(),
            expected,
        })
    };

    DependencyRequest::new(name, field, required, Box::new(setter))
}

/// Explicit service name when non-blank, otherwise the short type name
fn derive_name<S: Service>() -> Option<&'static str> {
    S::service_name()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .or_else(|| short_type_name(type_name::<S>()))
}

/// Last path segment of a type name with generics stripped, if it is a plain identifier
fn short_type_name(full: &'static str) -> Option<&'static str> {
    let base = full.split('<').next().unwrap_or(full);
    let short = base.rsplit("::").next().unwrap_or(base);

    let is_identifier = !short.is_empty() && short.chars().all(|c| c.is_alphanumeric() || c == '_');
    is_identifier.then_some(short)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Default)]
    struct Plain;

    impl Service for Plain {}

    #[derive(Default)]
    struct Named {
        plain: Option<Arc<Plain>>,
        extra: Option<Arc<u8>>,
    }

    impl Service for Named {
        fn service_name() -> Option<&'static str> {
            Some("named")
        }

        fn injections() -> Vec<Injection<Self>> {
            vec![
                Injection::required("plain", |n: &mut Named, plain: Arc<Plain>| n.plain = Some(plain)).service("Plain"),
                Injection::optional("extra", |n: &mut Named, extra: Option<Arc<u8>>| n.extra = extra),
            ]
        }
    }

    struct Blank;

    impl Service for Blank {
        fn service_name() -> Option<&'static str> {
            Some("  ")
        }
    }

    #[test]
    fn test_identifier_prefers_service_name() {
        let identifier = Discovery::Default.identifier::<Named>().unwrap().unwrap();
        assert_eq!(identifier.name(), "named");
        assert_eq!(identifier.instance_tag(), Some(type_name::<Named>()));
    }

    #[test]
    fn test_identifier_falls_back_to_type_name() {
        assert_eq!(Discovery::Default.identifier::<Plain>().unwrap().unwrap().name(), "Plain");
        assert_eq!(Discovery::Default.identifier::<Blank>().unwrap().unwrap().name(), "Blank");
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("app::services::Store"), Some("Store"));
        assert_eq!(short_type_name("app::Wrapper<app::Inner>"), Some("Wrapper"));
        assert_eq!(short_type_name("()"), None);
        assert_eq!(short_type_name("(app::A, app::B)"), None);
    }

    #[test]
    fn test_dependencies_follow_injections() {
        let requests = Discovery::Default.dependencies::<Named>();

        let names: Vec<_> = requests.iter().map(|r| (r.name(), r.field(), r.is_required())).collect();
        assert_eq!(names, vec![("Plain", "plain", true), ("extra", "extra", false)]);
    }

    #[test]
    fn test_missing_required_names_both_services() {
        let requests = Discovery::Default.dependencies::<Named>();
        let mut target = Named::default();

        let error = requests[0].set(&mut target, None).unwrap_err();
        assert_eq!(error.to_string(), "Service 'named' missing required service 'Plain'");

        assert!(requests[1].set(&mut target, None).is_ok());
    }

    #[test]
    fn test_setter_assigns_value() {
        let requests = Discovery::Default.dependencies::<Named>();
        let mut target = Named::default();

        let value: Instance = Arc::new(Plain);
        assert!(requests[0].set(&mut target, Some(value)).is_ok());
        assert!(target.plain.is_some());
    }

    #[test]
    fn test_stub_discovery() {
        assert!(Discovery::Stub.dependencies::<Named>().is_empty());
        assert!(matches!(Discovery::Stub.identifier::<Named>(), Err(ComposeError::Unsupported(_))));
    }
}
