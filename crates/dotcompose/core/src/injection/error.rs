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

//! Error types for service composition

use crate::scheduling::CyclicGraphError;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Error type lifecycle hooks report; any `Error + Send + Sync` converts into it
pub type HookError = Box<dyn StdError + Send + Sync>;

pub type ComposeResult<T> = Result<T, ComposeError>;

/// Failures that abort an `add`, `compose`, `get` or `resolve` call
#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("Unable to resolve service name from '{0}'")]
    Discovery(String),

    #[error("Duplicate services named '{name}' from '{instance}' and '{existing}' within the same scope")]
    DuplicateService { name: String, instance: String, existing: String },

    #[error(transparent)]
    CyclicGraph(#[from] CyclicGraphError),

    #[error(transparent)]
    Composition(#[from] CompositionError),

    #[error("Context not yet composed")]
    NotComposed,

    #[error("{0} is not supported by stub discovery")]
    Unsupported(&'static str),
}

impl ComposeError {
    /// Child errors when this is an aggregated composition failure
    pub fn unit_errors(&self) -> Option<&[UnitError]> {
        match self {
            ComposeError::Composition(composition) => Some(composition.errors()),
            _ => None,
        }
    }
}

/// Lifecycle hook that raised an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    Init,
    OnServicesResolved,
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hook::Init => f.write_str("init"),
            Hook::OnServicesResolved => f.write_str("on_services_resolved"),
        }
    }
}

/// Failure recorded against a single unit; never aborts sibling units
#[derive(Debug, Clone, Error)]
pub enum UnitError {
    #[error("Service '{service}' missing required service '{dependency}'")]
    MissingDependency { service: String, dependency: String },

    #[error("Service '{service}' expected '{dependency}' to be a {expected}")]
    TypeMismatch {
        service: String,
        dependency: String,
        expected: &'static str,
    },

    #[error("Service '{service}' failed in {hook}: {source}")]
    Hook {
        service: String,
        hook: Hook,
        source: Arc<dyn StdError + Send + Sync>,
    },
}

impl UnitError {
    pub(crate) fn hook(service: &str, hook: Hook, source: HookError) -> Self {
        UnitError::Hook {
            service: service.to_string(),
            hook,
            source: Arc::from(source),
        }
    }

    /// Name of the service the error was recorded against
    pub fn service(&self) -> &str {
        match self {
            UnitError::MissingDependency { service, .. } | UnitError::TypeMismatch { service, .. } | UnitError::Hook { service, .. } => service,
        }
    }
}

/// Aggregate of every unit error collected during one compose or resolve pass
#[derive(Debug, Clone, Error)]
#[error("{}", format_message(.message, .errors))]
pub struct CompositionError {
    message: String,
    errors: Vec<UnitError>,
}

impl CompositionError {
    pub fn new(message: impl Into<String>, errors: Vec<UnitError>) -> Self {
        Self { message: message.into(), errors }
    }

    /// Summary line without the child listing
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn errors(&self) -> &[UnitError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<UnitError> {
        self.errors
    }
}

/// Formats the summary followed by one indexed line per child error
pub fn format_message(message: &str, errors: &[UnitError]) -> String {
    let mut buff = message.to_string();

    if !errors.is_empty() {
        buff.push_str(&format!("\n{} child errors:", errors.len()));

        for (i, error) in errors.iter().enumerate() {
            buff.push_str(&format!("\n\t[{}] {}", i, error));
        }
    }

    buff
}
