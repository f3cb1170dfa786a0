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

//! Service injection and lifecycle composition

pub mod builder;
pub mod composables;
pub mod context;
pub mod discovery;
pub mod error;
pub mod identifier;
pub mod service;
pub mod service_map;

pub use builder::ComposerBuilder;
pub use composables::{Composable, ComposableUnit, Getter, StubComposable};
pub use context::{ServiceContext, ServiceContextOptions};
pub use discovery::{DependencyRequest, Discovery};
pub use error::{ComposeError, ComposeResult, CompositionError, Hook, HookError, UnitError};
pub use identifier::DependencyIdentifier;
pub use service::{Injection, Instance, Service};
pub use service_map::ServiceMap;
