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

//! Composition order determination
//!
//! Splits the units of a scope into islands, which depend on nothing and can be
//! composed together, and dependents, which are composed one by one in
//! topological order.

pub mod toposort;

pub use toposort::{CyclicGraphError, ToposortOptions, toposort};

use std::collections::HashSet;

/// Two-phase plan for one composition pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompositionPlan {
    /// Units without dependency requests, in insertion order
    islands: Vec<String>,

    /// Remaining sort output with islands filtered out
    ordered: Vec<String>,
}

impl CompositionPlan {
    /// Builds the plan from `(name, dependency names)` pairs.
    ///
    /// Dependencies that name no unit (statics held by a parent scope, missing services) stay
    /// in the ordered list; the caller decides what to do with them.
    pub fn build<'a, I>(units: I, options: ToposortOptions) -> Result<Self, CyclicGraphError>
    where
        I: IntoIterator<Item = (&'a str, Vec<&'a str>)>,
    {
        let mut islands = Vec::new();
        let mut edges = Vec::new();

        for (name, dependencies) in units {
            if dependencies.is_empty() {
                islands.push(name.to_string());
                continue;
            }

            edges.extend(dependencies.into_iter().map(|dependency| [name.to_string(), dependency.to_string()]));
        }

        let island_names: HashSet<&str> = islands.iter().map(String::as_str).collect();
        let ordered = toposort(edges, options)?
            .into_iter()
            .filter(|name| !island_names.contains(name.as_str()))
            .collect();

        Ok(Self { islands, ordered })
    }

    pub fn islands(&self) -> &[String] {
        &self.islands
    }

    pub fn ordered(&self) -> &[String] {
        &self.ordered
    }

    pub fn is_empty(&self) -> bool {
        self.islands.is_empty() && self.ordered.is_empty()
    }

    /// Position of a unit within the sequential phase
    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.ordered.iter().position(|id| id == name)
    }
}
