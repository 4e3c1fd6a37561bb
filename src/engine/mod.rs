//! Run orchestration
//!
//! [`Engine`] owns the whole pipeline for one editing session: active source
//! and language, the shared parser, the execution cache, run history, the
//! timeline, and the worker dispatcher. `run` is the single entry point:
//! parse, gate on the first syntax error, execute (dynamic VM for the
//! dynamic language, heuristic simulation otherwise), attach lint findings,
//! cache when legal, then load the timeline and record history.

pub mod errors;
pub mod samples;

pub use errors::{ParseError, RunError};
pub use samples::sample_program;

use crate::cache::ExecutionCache;
use crate::history::RunHistoryStore;
use crate::isolate::IsolationDispatcher;
use crate::language::Language;
use crate::lint;
use crate::parse::ParserAdapter;
use crate::sim::SimStrategy;
use crate::step::ExecutionStep;
use crate::storage::Storage;
use crate::timeline::TimelineController;
use uuid::Uuid;

pub struct Engine<S: Storage> {
    code: String,
    language: Language,
    strategy: SimStrategy,
    parser: ParserAdapter,
    cache: ExecutionCache,
    history: RunHistoryStore<S>,
    timeline: TimelineController,
    dispatcher: IsolationDispatcher,
    running: bool,
    parse_error: Option<ParseError>,
}

impl<S: Storage> Engine<S> {
    pub fn new(storage: S) -> Self {
        let language = Language::Javascript;
        Engine {
            code: sample_program(language).to_string(),
            language,
            strategy: SimStrategy::default(),
            parser: ParserAdapter::new(),
            cache: ExecutionCache::new(),
            history: RunHistoryStore::new(storage),
            timeline: TimelineController::new(),
            dispatcher: IsolationDispatcher::new(),
            running: false,
            parse_error: None,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn strategy(&self) -> SimStrategy {
        self.strategy
    }

    /// Location of the last run's syntax error, until the next run or edit.
    pub fn parse_error(&self) -> Option<&ParseError> {
        self.parse_error.as_ref()
    }

    pub fn timeline(&self) -> &TimelineController {
        &self.timeline
    }

    pub fn timeline_mut(&mut self) -> &mut TimelineController {
        &mut self.timeline
    }

    pub fn history(&self) -> &RunHistoryStore<S> {
        &self.history
    }

    pub fn set_code(&mut self, code: String) {
        self.code = code;
        self.parse_error = None;
        self.timeline.reset();
    }

    /// Switching language replaces the buffer with that language's sample.
    pub fn set_language(&mut self, language: Language) {
        self.language = language;
        self.code = sample_program(language).to_string();
        self.parse_error = None;
        self.timeline.reset();
    }

    /// Cached heuristic timelines depend on the strategy that produced them,
    /// so changing it invalidates the cache.
    pub fn set_strategy(&mut self, strategy: SimStrategy) {
        if self.strategy != strategy {
            self.strategy = strategy;
            self.cache.clear();
        }
    }

    /// Execute the current buffer.
    pub fn run_current(&mut self) -> Result<(), RunError> {
        self.run(self.code.clone(), self.language)
    }

    /// Execute `code` as `language`; on success it becomes the active
    /// buffer, the timeline is loaded, and the run is recorded in history.
    pub fn run(&mut self, code: String, language: Language) -> Result<(), RunError> {
        if self.running {
            return Err(RunError::RunInProgress);
        }
        self.running = true;
        let outcome = self.execute(&code, language);
        self.running = false;

        let steps = outcome?;
        self.code = code.clone();
        self.language = language;
        self.timeline.load(steps.clone());
        self.history
            .add(code, language, steps, self.timeline.current_index());
        Ok(())
    }

    fn execute(
        &mut self,
        code: &str,
        language: Language,
    ) -> Result<Vec<ExecutionStep>, RunError> {
        self.parse_error = None;

        let tree = self.parser.parse(code, language)?;
        if let Some(err_id) = tree.find_first_error() {
            let node = tree.node(err_id);
            let detail = ParseError {
                line: node.line,
                start_column: node.start_column,
                end_column: node.end_column,
                message: node.text.clone(),
            };
            tracing::debug!(%language, line = detail.line, "run blocked by syntax error");
            self.parse_error = Some(detail.clone());
            return Err(RunError::SyntaxInvalid(detail));
        }

        if !language.is_dynamic() {
            if let Some(cached) = self.cache.get(language, code) {
                tracing::debug!(%language, "serving heuristic run from cache");
                return Ok(cached.clone());
            }
        }

        let mut steps = if language.is_dynamic() {
            self.dispatcher
                .run_vm(code)
                .map_err(|message| RunError::ExecutionFailed { message })?
        } else {
            self.dispatcher
                .run_sim(code, language, self.strategy)
                .map_err(|message| RunError::ExecutionFailed { message })?
        };

        // Lint findings ride on the first step so cached entries keep them.
        let grammar = self.parser.grammar(language)?;
        let issues = lint::run_linter(&tree, &grammar, language);
        if !issues.is_empty() {
            if let Some(first) = steps.first_mut() {
                first.issues_mut().extend(issues);
            }
        }

        if !language.is_dynamic() {
            self.cache.set(language, code, steps.clone());
        }
        Ok(steps)
    }

    /// Bring a recorded run back as the active timeline. Returns false for
    /// an unknown id.
    pub fn restore(&mut self, id: Uuid) -> bool {
        let Some(entry) = self.history.restore(id) else {
            return false;
        };
        let code = entry.code.clone();
        let language = entry.language;
        let steps = entry.steps.clone();
        let index = entry.current_index;

        self.code = code;
        self.language = language;
        self.parse_error = None;
        self.timeline.load(steps);
        self.timeline.set_index(index);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::{IssueKind, ScopeValue};
    use crate::storage::MemoryStorage;

    fn engine() -> Engine<MemoryStorage> {
        Engine::new(MemoryStorage::new())
    }

    #[test]
    fn dynamic_run_produces_exact_steps() {
        let mut e = engine();
        e.run("x = 1; console.log(x)".to_string(), Language::Javascript)
            .unwrap();
        let steps = e.timeline().steps();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps.last().unwrap().final_output(), Some("1"));
        assert_eq!(e.history().len(), 1);
    }

    #[test]
    fn heuristic_run_is_cached_and_stable() {
        let mut e = engine();
        let code = "a = 1\nprint(a)".to_string();
        e.run(code.clone(), Language::Python).unwrap();
        let first: Vec<ExecutionStep> = e.timeline().steps().to_vec();

        e.run(code, Language::Python).unwrap();
        assert_eq!(e.timeline().steps(), &first[..]);
        assert_eq!(e.history().len(), 2);
    }

    #[test]
    fn syntax_error_blocks_the_run() {
        let mut e = engine();
        let err = e
            .run("x = \"oops\nprint(x)".to_string(), Language::Python)
            .unwrap_err();
        match err {
            RunError::SyntaxInvalid(detail) => assert_eq!(detail.line, 1),
            other => panic!("unexpected error {:?}", other),
        }
        assert!(e.parse_error().is_some());
        // Nothing was executed or recorded.
        assert!(e.timeline().is_empty());
        assert!(e.history().is_empty());
    }

    #[test]
    fn execution_failure_surfaces_message() {
        let mut e = engine();
        let err = e
            .run("missing();".to_string(), Language::Javascript)
            .unwrap_err();
        match err {
            RunError::ExecutionFailed { message } => {
                assert!(message.contains("missing is not a function"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn lint_findings_attach_to_first_step() {
        let mut e = engine();
        e.run("var a = 1;\nconsole.log(a);".to_string(), Language::Javascript)
            .unwrap();
        let steps = e.timeline().steps();
        assert_eq!(steps[0].issues().len(), 1);
        assert_eq!(steps[0].issues()[0].kind, IssueKind::Style);
        assert!(steps[1].issues().is_empty());
    }

    #[test]
    fn restore_rewinds_to_a_recorded_run() {
        let mut e = engine();
        e.run("a = 1\nprint(a)".to_string(), Language::Python).unwrap();
        let first_id = e.history().entries()[0].id;

        e.run("b = 2\nprint(b)".to_string(), Language::Python).unwrap();
        assert!(e.restore(first_id));
        assert_eq!(e.code(), "a = 1\nprint(a)");
        assert_eq!(
            e.timeline().steps().last().unwrap().scope().log,
            vec![ScopeValue::Num(1.0)]
        );
        assert!(!e.restore(Uuid::new_v4()));
    }

    #[test]
    fn set_language_loads_the_sample() {
        let mut e = engine();
        e.set_language(Language::Rust);
        assert!(e.code().contains("fn main()"));
        assert!(e.timeline().is_empty());
    }

    #[test]
    fn edit_clears_stale_parse_error() {
        let mut e = engine();
        let _ = e.run("x = \"oops".to_string(), Language::Python);
        assert!(e.parse_error().is_some());
        e.set_code("x = 1".to_string());
        assert!(e.parse_error().is_none());
    }
}
