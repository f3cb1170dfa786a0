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

//! Service candidates
//!
//! A service is any `Send + Sync` type that implements [`Service`]. The trait
//! carries the type-level metadata discovery reads (an optional service name and
//! the list of [`Injection`]s) alongside the two lifecycle hooks run during
//! composition. Injections are declared explicitly:
//!
//! ```
//! use std::sync::Arc;
//! use dotcompose_core::injection::{Injection, Service};
//!
//! #[derive(Default)]
//! struct Store;
//!
//! impl Service for Store {}
//!
//! #[derive(Default)]
//! struct Api {
//!     store: Option<Arc<Store>>,
//! }
//!
//! impl Service for Api {
//!     fn service_name() -> Option<&'static str> {
//!         Some("api")
//!     }
//!
//!     fn injections() -> Vec<Injection<Self>> {
//!         vec![Injection::required("store", |api: &mut Api, store: Arc<Store>| api.store = Some(store)).service("Store")]
//!     }
//! }
//! ```

use crate::injection::error::HookError;
use async_trait::async_trait;
use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;

/// Shared, type-erased handle to a composed service or static value
pub type Instance = Arc<dyn Any + Send + Sync>;

type Assign<S> = Box<dyn Fn(&mut S, Option<Instance>) -> Result<(), ()> + Send + Sync>;

/// Lifecycle and discovery metadata of a managed service
#[async_trait]
pub trait Service: Any + Send + Sync {
    /// Service name this type registers under; `None` falls back to the type name
    fn service_name() -> Option<&'static str>
    where
        Self: Sized,
    {
        None
    }

    /// Dependencies injected into this type before its hooks run
    fn injections() -> Vec<Injection<Self>>
    where
        Self: Sized,
    {
        Vec::new()
    }

    /// Runs once after injection; may suspend
    async fn init(&mut self) -> Result<(), HookError> {
        Ok(())
    }

    /// Runs once after injection and `init`
    fn on_services_resolved(&mut self) -> Result<(), HookError> {
        Ok(())
    }
}

/// Declares that a field of `S` receives another service by name
pub struct Injection<S> {
    /// Receiving field; also the service name unless overridden
    field: &'static str,

    /// Explicit service name to inject from
    service: Option<String>,

    required: bool,

    /// Concrete type the injected value must downcast to
    expected: &'static str,

    assign: Assign<S>,
}

impl<S: 'static> Injection<S> {
    /// Injection that fails composition when the dependency is unavailable
    pub fn required<D, F>(field: &'static str, assign: F) -> Self
    where
        D: Any + Send + Sync,
        F: Fn(&mut S, Arc<D>) + Send + Sync + 'static,
    {
        Self {
            field,
            service: None,
            required: true,
            expected: type_name::<D>(),
            assign: Box::new(move |target, value| {
                if let Some(value) = value {
                    assign(target, value.downcast::<D>().map_err(|_| ())?);
                }
                Ok(())
            }),
        }
    }

    /// Injection that receives `None` when the dependency is unavailable
    pub fn optional<D, F>(field: &'static str, assign: F) -> Self
    where
        D: Any + Send + Sync,
        F: Fn(&mut S, Option<Arc<D>>) + Send + Sync + 'static,
    {
        Self {
            field,
            service: None,
            required: false,
            expected: type_name::<D>(),
            assign: Box::new(move |target, value| {
                let value = value.map(|value| value.downcast::<D>()).transpose().map_err(|_| ())?;
                assign(target, value);
                Ok(())
            }),
        }
    }

    /// Injects from the named service instead of the one matching the field name
    pub fn service(mut self, name: impl Into<String>) -> Self {
        self.service = Some(name.into());
        self
    }

    /// Name of the service this injection resolves
    pub fn name(&self) -> &str {
        self.service.as_deref().unwrap_or(self.field)
    }

    pub fn field(&self) -> &'static str {
        self.field
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Records `value` on `target`; on a type mismatch returns the expected type name
    pub(crate) fn apply(&self, target: &mut S, value: Option<Instance>) -> Result<(), &'static str> {
        (self.assign)(target, value).map_err(|_| self.expected)
    }
}

impl<S> fmt::Debug for Injection<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Injection")
            .field("field", &self.field)
            .field("service", &self.service)
            .field("required", &self.required)
            .field("expected", &self.expected)
            .finish()
    }
}
