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

//! Service identity
//!
//! A [`DependencyIdentifier`] names a service inside a composition scope. Two
//! identifiers are the same service when their names match; the instance tag
//! only exists to make diagnostics point at the concrete type behind a name.

use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};

const UNKNOWN: &str = "<unknown>";

/// Identifies a service by name, with an optional tag naming the instance behind it
#[derive(Debug, Clone)]
pub struct DependencyIdentifier {
    /// Service name, the only part that participates in equality and hashing
    name: String,

    /// Human-readable description of the instance, diagnostics only
    instance_tag: Option<String>,
}

impl DependencyIdentifier {
    /// Creates an identifier with no instance tag
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), instance_tag: None }
    }

    /// Creates an identifier tagged with the instance that claims the name
    pub fn with_instance(name: impl Into<String>, instance_tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instance_tag: Some(instance_tag.into()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instance_tag(&self) -> Option<&str> {
        self.instance_tag.as_deref()
    }

    /// Compares against a possibly absent identifier; absent never matches
    pub fn equals(&self, other: Option<&Self>) -> bool {
        other.is_some_and(|other| other.name == self.name)
    }

    /// Renders the instance tag for diagnostics, `<unknown>` when untagged
    pub fn debug_instance(&self) -> &str {
        self.instance_tag.as_deref().unwrap_or(UNKNOWN)
    }
}

impl PartialEq for DependencyIdentifier {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for DependencyIdentifier {}

impl Hash for DependencyIdentifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

// Equality and hashing only look at the name, so lookups by raw key stay consistent.
impl Borrow<str> for DependencyIdentifier {
    fn borrow(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for DependencyIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.name.is_empty() {
            return f.write_str(&self.name);
        }

        f.write_str(self.debug_instance())
    }
}

impl From<&str> for DependencyIdentifier {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for DependencyIdentifier {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_equality_ignores_instance_tag() {
        let a = DependencyIdentifier::with_instance("store", "app::MemoryStore");
        let b = DependencyIdentifier::with_instance("store", "app::DiskStore");
        let c = DependencyIdentifier::new("cache");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.equals(Some(&b)));
        assert!(!a.equals(None));
    }

    #[test]
    fn test_hash_ignores_instance_tag() {
        let mut set = HashSet::new();
        set.insert(DependencyIdentifier::with_instance("store", "first"));

        assert!(!set.insert(DependencyIdentifier::with_instance("store", "second")));
        assert!(set.contains("store"));
    }

    #[test]
    fn test_display_fallbacks() {
        assert_eq!(DependencyIdentifier::new("store").to_string(), "store");
        assert_eq!(DependencyIdentifier::with_instance("", "app::Store").to_string(), "app::Store");
        assert_eq!(DependencyIdentifier::new("").to_string(), "<unknown>");
        assert_eq!(DependencyIdentifier::new("store").debug_instance(), "<unknown>");
    }
}
