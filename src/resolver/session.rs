use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use crate::error::ResolveError;
use crate::package::{LocatorCache, ResolvedPackage};

/// Names currently being resolved, in the order resolution entered them.
#[derive(Debug, Default)]
pub struct InFlight {
    order: Vec<String>,
    members: HashSet<String>,
}

impl InFlight {
    pub fn push(&mut self, name: &str) {
        self.order.push(name.to_string());
        self.members.insert(name.to_string());
    }

    pub fn pop(&mut self) -> Option<String> {
        let name = self.order.pop()?;
        // a name is never pushed twice, the cycle check runs first
        self.members.remove(&name);
        Some(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.members.contains(name)
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// The in-flight names followed by `repeated`, as reported for a cycle.
    pub fn cycle_path(&self, repeated: &str) -> Vec<String> {
        let mut path = self.order.clone();
        path.push(repeated.to_string());
        path
    }
}

/// State owned by one resolution run.
///
/// A new session is created for every build or rebuild; nothing carries over
/// between sessions, so file-system changes are always picked up.
#[derive(Debug)]
pub struct ResolutionSession {
    pub(crate) cache: BTreeMap<String, Arc<ResolvedPackage>>,
    pub(crate) in_flight: InFlight,
    pub(crate) visited: HashSet<String>,
    pub(crate) locator_cache: LocatorCache,
    pub(crate) roots: Vec<String>,
    pub(crate) errors: Vec<ResolveError>,
    pub(crate) warnings: Vec<String>,
    pub(crate) started: Instant,
}

impl Default for ResolutionSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolutionSession {
    pub fn new() -> Self {
        Self {
            cache: BTreeMap::new(),
            in_flight: InFlight::default(),
            visited: HashSet::new(),
            locator_cache: LocatorCache::default(),
            roots: Vec::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
            started: Instant::now(),
        }
    }

    /// Packages resolved so far. Still populated after a strict-mode
    /// failure, for inspection.
    pub fn cache(&self) -> &BTreeMap<String, Arc<ResolvedPackage>> {
        &self.cache
    }

    pub fn get(&self, name: &str) -> Option<&Arc<ResolvedPackage>> {
        self.cache.get(name)
    }

    pub fn errors(&self) -> &[ResolveError] {
        &self.errors
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    pub fn in_flight(&self) -> &InFlight {
        &self.in_flight
    }

    pub(crate) fn warn(&mut self, message: String) {
        log::warn!("{}", message);
        self.warnings.push(message);
    }

    pub(crate) fn error(&mut self, error: ResolveError) {
        log::error!("{}", error);
        self.errors.push(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_flight_push_pop() {
        let mut stack = InFlight::default();
        stack.push("a");
        stack.push("b");
        assert!(stack.contains("a"));
        assert_eq!(stack.len(), 2);

        assert_eq!(stack.pop(), Some("b".to_string()));
        assert!(!stack.contains("b"));
        assert_eq!(stack.pop(), Some("a".to_string()));
        assert!(stack.is_empty());
        assert_eq!(stack.pop(), None);
    }

    #[test]
    fn test_cycle_path_in_encounter_order() {
        let mut stack = InFlight::default();
        stack.push("app");
        stack.push("a");
        stack.push("b");
        assert_eq!(stack.cycle_path("a"), vec!["app", "a", "b", "a"]);
    }

    #[test]
    fn test_sessions_are_independent() {
        let mut first = ResolutionSession::new();
        first.warn("stale".into());
        let second = ResolutionSession::new();
        assert_eq!(first.warnings().len(), 1);
        assert!(second.warnings().is_empty());
        assert!(second.cache().is_empty());
    }
}
