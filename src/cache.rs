//! Execution result cache
//!
//! Heuristic runs are pure functions of `(language, code)`, so their step
//! timelines are memoized under the fingerprint `language + "::" + code`.
//! Dynamic runs are never cached; re-running real code is the point of the
//! dynamic path.

use crate::language::Language;
use crate::step::ExecutionStep;
use rustc_hash::FxHashMap;

#[derive(Default)]
pub struct ExecutionCache {
    entries: FxHashMap<String, Vec<ExecutionStep>>,
}

fn fingerprint(language: Language, code: &str) -> String {
    format!("{}::{}", language, code)
}

impl ExecutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, language: Language, code: &str) -> Option<&Vec<ExecutionStep>> {
        self.entries.get(&fingerprint(language, code))
    }

    pub fn set(&mut self, language: Language, code: &str, steps: Vec<ExecutionStep>) {
        self.entries.insert(fingerprint(language, code), steps);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::{LineStep, Scope};

    fn steps() -> Vec<ExecutionStep> {
        vec![ExecutionStep::Line(LineStep {
            step: 0,
            line: 1,
            scope: Scope::default(),
            issues: Vec::new(),
        })]
    }

    #[test]
    fn hit_requires_same_language_and_code() {
        let mut cache = ExecutionCache::new();
        cache.set(Language::Python, "a = 1", steps());
        assert!(cache.get(Language::Python, "a = 1").is_some());
        assert!(cache.get(Language::Go, "a = 1").is_none());
        assert!(cache.get(Language::Python, "a = 2").is_none());
    }

    #[test]
    fn clear_empties_the_cache() {
        let mut cache = ExecutionCache::new();
        cache.set(Language::Rust, "fn main() {}", steps());
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }
}
