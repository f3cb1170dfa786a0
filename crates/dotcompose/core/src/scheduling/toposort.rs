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

//! Deterministic depth-first topological sort

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;

/// Options controlling how cycles are treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToposortOptions {
    /// Skip the offending edge instead of failing when a cycle is found
    pub continue_on_circular_dependency: bool,
}

impl ToposortOptions {
    /// Options that break cycles by dropping the edge that closes them
    pub fn tolerant() -> Self {
        Self {
            continue_on_circular_dependency: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Cyclic graph detected: '{node}' depends on its ancestor '{dependency}'")]
pub struct CyclicGraphError {
    pub node: String,
    pub dependency: String,
}

/// Orders the nodes of `edges` so every dependency precedes its dependents.
///
/// Each edge is `[node, dep1, dep2, ...]`, meaning `node` depends on each dep. Nodes named only
/// as dependencies are part of the result too. Roots and dependency lists are walked in
/// descending order, so nodes without constraints between them come out ascending and the
/// result is identical for identical input. Self-edges and empty edges are ignored.
///
/// # Errors
///
/// Returns [`CyclicGraphError`] when a dependency is already on the current path, unless
/// `options.continue_on_circular_dependency` is set, in which case that edge is skipped.
pub fn toposort<T, I, E>(edges: I, options: ToposortOptions) -> Result<Vec<T>, CyclicGraphError>
where
    T: Ord + Clone + fmt::Display,
    I: IntoIterator<Item = E>,
    E: IntoIterator<Item = T>,
{
    let mut nodes: BTreeMap<T, Vec<T>> = BTreeMap::new();

    for edge in edges {
        let mut edge = edge.into_iter();
        let Some(node) = edge.next() else {
            continue;
        };

        let afters: Vec<T> = edge.filter(|dependency| *dependency != node).collect();
        for dependency in &afters {
            nodes.entry(dependency.clone()).or_default();
        }
        nodes.entry(node).or_default().extend(afters);
    }

    for afters in nodes.values_mut() {
        afters.sort();
        afters.dedup();
    }

    let mut walk = Walk {
        nodes: &nodes,
        options,
        visited: BTreeSet::new(),
        ancestors: Vec::new(),
        sorted: Vec::with_capacity(nodes.len()),
    };

    for node in nodes.keys().rev() {
        walk.visit(node)?;
    }

    Ok(walk.sorted)
}

struct Walk<'a, T> {
    nodes: &'a BTreeMap<T, Vec<T>>,
    options: ToposortOptions,
    visited: BTreeSet<&'a T>,

    /// Path from the current root to the node being visited
    ancestors: Vec<&'a T>,

    sorted: Vec<T>,
}

impl<'a, T: Ord + Clone + fmt::Display> Walk<'a, T> {
    fn visit(&mut self, node: &'a T) -> Result<(), CyclicGraphError> {
        if !self.visited.insert(node) {
            return Ok(());
        }

        self.ancestors.push(node);

        let nodes = self.nodes;
        let afters = nodes.get(node).map(Vec::as_slice).unwrap_or_default();
        for after in afters.iter().rev() {
            if self.ancestors.contains(&after) {
                if self.options.continue_on_circular_dependency {
                    continue;
                }
                return Err(CyclicGraphError {
                    node: node.to_string(),
                    dependency: after.to_string(),
                });
            }

            self.visit(after)?;
        }

        self.ancestors.pop();
        self.sorted.push(node.clone());
        Ok(())
    }
}
