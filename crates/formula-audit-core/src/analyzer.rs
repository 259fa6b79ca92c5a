//! Core analyzer for orchestrating formula audits.

use crate::config::Config;
use crate::context::FileContext;
use crate::edit::{apply_edits, plan_edits, Edit, EditError};
use crate::formula::FormulaNodes;
use crate::node::{Node, NodeError};
use crate::parser::{ParseError, ParserBox, SourceParser};
use crate::rule::{FormulaRule, RuleBox};
use crate::types::{Diagnostic, LintResult};

use rayon::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Upper bound on analyze/fix/reparse rounds for one file.
pub const MAX_FIX_PASSES: usize = 10;

/// Errors that can occur during analysis.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// IO error reading or writing files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Directory walk error.
    #[error("Walk error: {0}")]
    Walk(#[from] ignore::Error),

    /// Source file could not be parsed.
    #[error("Parse error in {path}: {source}")]
    Parse {
        /// Path to the file that failed to parse.
        path: PathBuf,
        /// Parser error.
        source: ParseError,
    },

    /// A rule received a tree that breaks the node contract.
    #[error("Malformed tree in {path}: {source}")]
    Node {
        /// Path to the file being audited.
        path: PathBuf,
        /// Contract violation.
        source: NodeError,
    },

    /// Proposed edits could not be applied.
    #[error("Cannot apply fixes to {path}: {source}")]
    Edit {
        /// Path to the file being fixed.
        path: PathBuf,
        /// Edit error.
        source: EditError,
    },

    /// Worker pool could not be created.
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// No parser was configured.
    #[error("No source parser configured")]
    NoParser,
}

impl AnalyzerError {
    /// Returns true for errors tied to one file's content, which are skipped
    /// unless `fail_on_error` is set.
    #[must_use]
    pub fn is_per_file(&self) -> bool {
        matches!(self, Self::Parse { .. } | Self::Node { .. } | Self::Edit { .. })
    }
}

/// Builder for configuring an [`Analyzer`].
#[derive(Default)]
pub struct AnalyzerBuilder {
    root: Option<PathBuf>,
    parser: Option<ParserBox>,
    rules: Vec<RuleBox>,
    exclude_patterns: Vec<String>,
    config: Option<Config>,
    fail_on_error: Option<bool>,
}

impl AnalyzerBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the root directory (or single file) to analyze.
    #[must_use]
    pub fn root(mut self, path: impl Into<PathBuf>) -> Self {
        self.root = Some(path.into());
        self
    }

    /// Sets the source parser.
    #[must_use]
    pub fn parser<P: SourceParser + 'static>(mut self, parser: P) -> Self {
        self.parser = Some(Box::new(parser));
        self
    }

    /// Adds a rule to the analyzer.
    #[must_use]
    pub fn rule<R: FormulaRule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Adds a boxed rule to the analyzer.
    #[must_use]
    pub fn rule_box(mut self, rule: RuleBox) -> Self {
        self.rules.push(rule);
        self
    }

    /// Adds several boxed rules to the analyzer.
    #[must_use]
    pub fn rules(mut self, rules: impl IntoIterator<Item = RuleBox>) -> Self {
        self.rules.extend(rules);
        self
    }

    /// Adds an exclude glob pattern.
    #[must_use]
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_patterns.push(pattern.into());
        self
    }

    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets whether parse and node-contract errors abort the run
    /// (default: taken from config, otherwise false).
    #[must_use]
    pub fn fail_on_error(mut self, fail: bool) -> Self {
        self.fail_on_error = Some(fail);
        self
    }

    /// Builds the analyzer.
    ///
    /// # Errors
    ///
    /// Returns an error if no parser was set or the working directory cannot
    /// be determined.
    pub fn build(self) -> Result<Analyzer, AnalyzerError> {
        let parser = self.parser.ok_or(AnalyzerError::NoParser)?;
        let config = self.config.unwrap_or_default();

        let root = self
            .root
            .unwrap_or_else(|| config.analyzer.root.clone());
        let root = if root.is_absolute() {
            root
        } else {
            let cwd = std::env::current_dir()?;
            root.components()
                .filter(|c| !matches!(c, std::path::Component::CurDir))
                .fold(cwd, |path, c| path.join(c))
        };

        let mut exclude_patterns = self.exclude_patterns;
        exclude_patterns.extend(config.analyzer.exclude.iter().cloned());

        Ok(Analyzer {
            root,
            parser,
            rules: self.rules,
            exclude_patterns,
            fail_on_error: self.fail_on_error.unwrap_or(config.analyzer.fail_on_error),
            config,
        })
    }
}

/// Outcome of fixing one source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixOutcome {
    /// Rewritten source.
    pub source: String,
    /// Number of edits applied across all passes.
    pub applied: usize,
    /// Number of passes that changed the source.
    pub passes: usize,
}

/// Totals of a fix run over the whole tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixSummary {
    /// Files whose content changed.
    pub files_changed: usize,
    /// Edits applied across all files.
    pub edits_applied: usize,
}

/// The main analyzer that orchestrates formula audits.
///
/// Use [`Analyzer::builder()`] to construct an instance.
pub struct Analyzer {
    root: PathBuf,
    parser: ParserBox,
    rules: Vec<RuleBox>,
    exclude_patterns: Vec<String>,
    config: Config,
    fail_on_error: bool,
}

impl Analyzer {
    /// Creates a new builder for configuring an analyzer.
    #[must_use]
    pub fn builder() -> AnalyzerBuilder {
        AnalyzerBuilder::new()
    }

    /// Returns the root directory or file being analyzed.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the number of registered rules.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Returns the active configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Analyzes all discovered files and returns the results.
    ///
    /// # Errors
    ///
    /// Returns an error if file discovery fails, or if a file fails to parse
    /// or audit while `fail_on_error` is set.
    pub fn analyze(&self) -> Result<LintResult, AnalyzerError> {
        info!("Starting analysis at {:?}", self.root);

        let files = self.discover_files()?;
        info!("Found {} files to analyze", files.len());

        let reports = self.run_parallel(|| {
            files
                .par_iter()
                .map(|path| self.analyze_file(path))
                .collect::<Vec<_>>()
        })?;

        let mut result = LintResult::new();
        for report in reports {
            match report {
                Ok(file_result) => result.extend(file_result),
                Err(e) if e.is_per_file() && !self.fail_on_error => warn!("{e}"),
                Err(e) => return Err(e),
            }
        }
        result.sort();

        info!(
            "Analysis complete: {} violations in {} formulae ({} files)",
            result.violations.len(),
            result.formulae_checked,
            result.files_checked
        );

        Ok(result)
    }

    /// Analyzes one source text as if it were the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the source fails to parse or a rule reports a
    /// node-contract violation.
    pub fn analyze_source(&self, path: &Path, content: &str) -> Result<LintResult, AnalyzerError> {
        let tree = self.parse(path, content)?;
        let ctx = FileContext::new(path, content, self.base_dir());
        let formulae = FormulaNodes::collect(&tree);

        let diagnostics = self.audit(&formulae).map_err(|source| AnalyzerError::Node {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(LintResult {
            violations: diagnostics.into_iter().map(|d| ctx.violation(d)).collect(),
            files_checked: 1,
            formulae_checked: formulae.len(),
        })
    }

    /// Runs every enabled rule over each formula and applies severity overrides.
    ///
    /// # Errors
    ///
    /// Propagates the first node-contract violation reported by a rule.
    pub fn audit(&self, formulae: &[FormulaNodes<'_>]) -> Result<Vec<Diagnostic>, NodeError> {
        let mut diagnostics = Vec::new();

        for formula in formulae {
            debug!("Auditing formula {}", formula.name());
            for rule in &self.rules {
                let overrides = self.config.rule(rule.name(), rule.code());
                if overrides.is_some_and(|o| !o.is_enabled()) {
                    debug!("Skipping disabled rule: {}", rule.name());
                    continue;
                }

                let mut found = rule.audit_formula(formula)?;
                if let Some(severity) = overrides.and_then(|o| o.severity) {
                    for d in &mut found {
                        d.severity = severity;
                    }
                }
                diagnostics.extend(found);
            }
        }

        Ok(diagnostics)
    }

    /// Repeatedly audits `content`, applies every non-conflicting edit and
    /// reparses, until nothing is left to fix or [`MAX_FIX_PASSES`] is hit.
    ///
    /// # Errors
    ///
    /// Returns an error if a pass fails to parse, audit, or apply edits.
    pub fn fix_source(&self, path: &Path, content: &str) -> Result<FixOutcome, AnalyzerError> {
        let mut outcome = FixOutcome {
            source: content.to_string(),
            applied: 0,
            passes: 0,
        };

        for _ in 0..MAX_FIX_PASSES {
            let tree = self.parse(path, &outcome.source)?;
            let formulae = FormulaNodes::collect(&tree);
            let edits: Vec<Edit> = self
                .audit(&formulae)
                .map_err(|source| AnalyzerError::Node {
                    path: path.to_path_buf(),
                    source,
                })?
                .into_iter()
                .filter_map(|d| d.edit)
                .collect();

            let plan = plan_edits(edits);
            if !plan.rejected.is_empty() {
                debug!(
                    "{}: deferring {} conflicting edit(s) to the next pass",
                    path.display(),
                    plan.rejected.len()
                );
            }
            if plan.accepted.is_empty() {
                break;
            }

            let rewritten =
                apply_edits(&outcome.source, &plan.accepted).map_err(|source| {
                    AnalyzerError::Edit {
                        path: path.to_path_buf(),
                        source,
                    }
                })?;
            if rewritten == outcome.source {
                break;
            }

            outcome.applied += plan.accepted.len();
            outcome.passes += 1;
            outcome.source = rewritten;
        }

        Ok(outcome)
    }

    /// Fixes every discovered file in place.
    ///
    /// # Errors
    ///
    /// Returns an error if discovery or writing fails, or if a file fails to
    /// parse, audit or apply edits while `fail_on_error` is set.
    pub fn fix(&self) -> Result<FixSummary, AnalyzerError> {
        let files = self.discover_files()?;
        info!("Fixing {} files", files.len());

        let outcomes = self.run_parallel(|| {
            files
                .par_iter()
                .map(|path| -> Result<_, AnalyzerError> {
                    let content = std::fs::read_to_string(path)?;
                    let outcome = self.fix_source(path, &content)?;
                    Ok((path, content, outcome))
                })
                .collect::<Vec<_>>()
        })?;

        let mut summary = FixSummary::default();
        for outcome in outcomes {
            match outcome {
                Ok((path, original, outcome)) => {
                    if outcome.source != original {
                        std::fs::write(path, &outcome.source)?;
                        info!(
                            "Fixed {} ({} edit(s) in {} pass(es))",
                            path.display(),
                            outcome.applied,
                            outcome.passes
                        );
                        summary.files_changed += 1;
                        summary.edits_applied += outcome.applied;
                    }
                }
                Err(e) if e.is_per_file() && !self.fail_on_error => warn!("{e}"),
                Err(e) => return Err(e),
            }
        }

        Ok(summary)
    }

    /// Reads and analyzes a single file.
    fn analyze_file(&self, path: &Path) -> Result<LintResult, AnalyzerError> {
        debug!("Analyzing: {}", path.display());
        let content = std::fs::read_to_string(path)?;
        self.analyze_source(path, &content)
    }

    fn parse(&self, path: &Path, content: &str) -> Result<Node, AnalyzerError> {
        self.parser
            .parse(content)
            .map_err(|source| AnalyzerError::Parse {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Runs `op` on a dedicated pool when `parallelism` is configured,
    /// otherwise on the global rayon pool.
    fn run_parallel<R, F>(&self, op: F) -> Result<R, AnalyzerError>
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        match self.config.analyzer.parallelism {
            Some(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()?;
                Ok(pool.install(op))
            }
            None => Ok(op()),
        }
    }

    /// Directory that reported paths are relative to: the root itself, or
    /// its parent when the root is a single file.
    #[must_use]
    pub fn base_dir(&self) -> &Path {
        if self.root.is_file() {
            self.root.parent().unwrap_or(self.root.as_path())
        } else {
            &self.root
        }
    }

    /// Discovers all source files the parser handles.
    fn discover_files(&self) -> Result<Vec<PathBuf>, AnalyzerError> {
        let mut builder = ignore::WalkBuilder::new(&self.root);
        builder
            .hidden(false)
            .git_ignore(self.config.analyzer.respect_gitignore)
            .require_git(false);

        let mut files = Vec::new();
        for entry in builder.build() {
            let entry = entry?;
            let path = entry.path();

            if !path.is_file() || !self.parser.handles(path) {
                continue;
            }
            if self.should_exclude(path) {
                debug!("Excluding: {}", path.display());
                continue;
            }

            files.push(path.to_path_buf());
        }

        files.sort();
        Ok(files)
    }

    /// Checks if a path should be excluded.
    fn should_exclude(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(self.base_dir()).unwrap_or(path);
        let path_str = path.to_string_lossy();

        for pattern in &self.exclude_patterns {
            if let Ok(glob_pattern) = glob::Pattern::new(pattern) {
                if glob_pattern.matches_path(path) || glob_pattern.matches_path(relative) {
                    return true;
                }
            }

            // Also check as substring for patterns like "**/vendor/**"
            let normalized_pattern = pattern.replace("**", "");
            if normalized_pattern.len() > 1 && path_str.contains(&normalized_pattern) {
                return true;
            }
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Field, NodeKind};
    use crate::range::TextRange;
    use crate::types::Severity;
    use std::sync::Arc;

    /// Recognises exactly `class <Name> < <Super>` followed by `end`.
    struct TinyParser;

    impl SourceParser for TinyParser {
        fn language_id(&self) -> &'static str {
            "tiny"
        }

        fn extensions(&self) -> &'static [&'static str] {
            &[".rb"]
        }

        fn parse(&self, source: &str) -> Result<Node, ParseError> {
            let text: Arc<str> = Arc::from(source);
            let mut program = Node::new(
                NodeKind::Program,
                TextRange::new(0, source.len()),
                Arc::clone(&text),
            );
            let mut offset = 0;
            for line in source.split_inclusive('\n') {
                let words: Vec<&str> = line.split_whitespace().collect();
                if let ["class", name, "<", parent] = words.as_slice() {
                    let at = |word: &str| {
                        let start = offset + line.find(word).unwrap_or(0);
                        TextRange::new(start, start + word.len())
                    };
                    let class = Node::new(
                        NodeKind::Class,
                        TextRange::new(offset, offset + line.trim_end().len()),
                        Arc::clone(&text),
                    )
                    .with_child(
                        Node::new(NodeKind::Const, at(*name), Arc::clone(&text))
                            .with_field(Field::Name),
                    )
                    .with_child(
                        Node::new(NodeKind::Const, at(*parent), Arc::clone(&text))
                            .with_field(Field::Superclass),
                    );
                    program = program.with_child(class);
                } else if line.contains("@@") {
                    return Err(ParseError::Syntax { line: 1, column: 1 });
                }
                offset += line.len();
            }
            Ok(program)
        }
    }

    /// Rewrites a `Legacy` superclass to `Formula`.
    struct LegacyParent;

    impl FormulaRule for LegacyParent {
        fn name(&self) -> &'static str {
            "legacy-parent"
        }

        fn code(&self) -> &'static str {
            "TEST001"
        }

        fn audit_formula(&self, formula: &FormulaNodes<'_>) -> Result<Vec<Diagnostic>, NodeError> {
            let Some(parent) = formula.parent_class_node else {
                return Ok(Vec::new());
            };
            if crate::formula::class_name(parent)? != "ScriptFileFormula" {
                return Ok(Vec::new());
            }
            Ok(vec![Diagnostic::new(
                self.code(),
                self.name(),
                self.default_severity(),
                parent.range(),
                "legacy parent",
            )
            .with_edit(Edit::replace(parent.range(), "Formula"))])
        }
    }

    fn analyzer(root: &Path) -> Analyzer {
        Analyzer::builder()
            .root(root)
            .parser(TinyParser)
            .rule(LegacyParent)
            .build()
            .expect("Failed to build analyzer")
    }

    #[test]
    fn test_builder_requires_parser() {
        let err = Analyzer::builder().root(".").build().err();
        assert!(matches!(err, Some(AnalyzerError::NoParser)));
    }

    #[test]
    fn test_exclude_patterns() {
        let analyzer = Analyzer::builder()
            .root("/tap")
            .parser(TinyParser)
            .exclude("**/vendor/**")
            .exclude("Aliases/*")
            .build()
            .expect("Failed to build analyzer");

        assert!(analyzer.should_exclude(Path::new("/tap/vendor/foo.rb")));
        assert!(analyzer.should_exclude(Path::new("/tap/Aliases/foo.rb")));
        assert!(!analyzer.should_exclude(Path::new("/tap/Formula/foo.rb")));
    }

    #[test]
    fn analyze_source_places_violations() {
        let analyzer = analyzer(Path::new("/tap"));
        let source = "# header\nclass Foo < ScriptFileFormula\nclass Bar < Base\n";
        let result = analyzer
            .analyze_source(Path::new("/tap/Formula/foo.rb"), source)
            .unwrap();

        assert_eq!(result.formulae_checked, 1);
        assert_eq!(result.violations.len(), 1);
        let v = &result.violations[0];
        assert_eq!(v.location.file, PathBuf::from("Formula/foo.rb"));
        assert_eq!((v.location.line, v.location.column), (2, 13));
        assert_eq!(v.severity, Severity::Error);
    }

    #[test]
    fn config_disables_and_overrides_rules() {
        let source = "class Foo < ScriptFileFormula\n";
        let disabled = Analyzer::builder()
            .root("/tap")
            .parser(TinyParser)
            .rule(LegacyParent)
            .config(Config::parse("[rules.legacy-parent]\nenabled = false\n").unwrap())
            .build()
            .unwrap();
        let result = disabled.analyze_source(Path::new("/tap/foo.rb"), source).unwrap();
        assert!(result.violations.is_empty());

        let downgraded = Analyzer::builder()
            .root("/tap")
            .parser(TinyParser)
            .rule(LegacyParent)
            .config(Config::parse("[rules.legacy-parent]\nseverity = \"info\"\n").unwrap())
            .build()
            .unwrap();
        let result = downgraded
            .analyze_source(Path::new("/tap/foo.rb"), source)
            .unwrap();
        assert_eq!(result.violations[0].severity, Severity::Info);

        let by_code = Analyzer::builder()
            .root("/tap")
            .parser(TinyParser)
            .rule(LegacyParent)
            .config(Config::parse("[rules.test001]\nenabled = false\n").unwrap())
            .build()
            .unwrap();
        let result = by_code.analyze_source(Path::new("/tap/foo.rb"), source).unwrap();
        assert!(result.violations.is_empty());
    }

    #[test]
    fn fix_source_rewrites_until_clean() {
        let analyzer = analyzer(Path::new("/tap"));
        let source = "class Foo < ScriptFileFormula\nclass Bar < ScriptFileFormula\n";
        let outcome = analyzer.fix_source(Path::new("/tap/foo.rb"), source).unwrap();

        assert_eq!(outcome.source, "class Foo < Formula\nclass Bar < Formula\n");
        assert_eq!(outcome.applied, 2);
        assert_eq!(outcome.passes, 1);
    }

    #[test]
    fn analyze_and_fix_directory() {
        let dir = tempfile::tempdir().unwrap();
        let formula_dir = dir.path().join("Formula");
        std::fs::create_dir(&formula_dir).unwrap();
        std::fs::write(formula_dir.join("foo.rb"), "class Foo < ScriptFileFormula\n").unwrap();
        std::fs::write(formula_dir.join("bar.rb"), "class Bar < Formula\n").unwrap();
        std::fs::write(formula_dir.join("broken.rb"), "@@\n").unwrap();
        std::fs::write(formula_dir.join("notes.txt"), "class X < ScriptFileFormula\n").unwrap();

        let analyzer = analyzer(dir.path());
        let result = analyzer.analyze().unwrap();
        assert_eq!(result.files_checked, 2);
        assert_eq!(result.violations.len(), 1);
        assert_eq!(
            result.violations[0].location.file,
            PathBuf::from("Formula/foo.rb")
        );

        let summary = analyzer.fix().unwrap();
        assert_eq!(
            summary,
            FixSummary {
                files_changed: 1,
                edits_applied: 1
            }
        );
        assert_eq!(
            std::fs::read_to_string(formula_dir.join("foo.rb")).unwrap(),
            "class Foo < Formula\n"
        );
        assert!(analyzer.analyze().unwrap().violations.is_empty());
    }

    #[test]
    fn fail_on_error_surfaces_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.rb"), "@@\n").unwrap();

        let analyzer = Analyzer::builder()
            .root(dir.path())
            .parser(TinyParser)
            .fail_on_error(true)
            .build()
            .unwrap();
        assert!(matches!(
            analyzer.analyze(),
            Err(AnalyzerError::Parse { .. })
        ));
    }

    #[test]
    fn single_file_root_reports_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("foo.rb");
        std::fs::write(&file, "class Foo < ScriptFileFormula\n").unwrap();

        let result = analyzer(&file).analyze().unwrap();
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].location.file, PathBuf::from("foo.rb"));
    }

    #[test]
    fn parallelism_setting_uses_dedicated_pool() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("foo.rb"), "class Foo < ScriptFileFormula\n").unwrap();

        let mut config = Config::default();
        config.analyzer.parallelism = Some(2);
        let analyzer = Analyzer::builder()
            .root(dir.path())
            .parser(TinyParser)
            .rule(LegacyParent)
            .config(config)
            .build()
            .unwrap();
        assert_eq!(analyzer.analyze().unwrap().violations.len(), 1);
    }
}
