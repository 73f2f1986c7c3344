//! Import pruner: removes the first import of each target specifier
//!
//! Module text is parsed with oxc, spans are collected against the original
//! text, and the removals are applied in one splice pass. Nothing is
//! re-printed: every byte outside the removed spans is kept as-is.
//!
//! Two passes run over the tree:
//!
//! 1. Static `import ... from 'pkg'` declarations. The whole declaration is
//!    removed.
//! 2. Dynamic `import('pkg')` expressions, only for targets pass 1 did not
//!    find. The nearest enclosing variable declaration is removed, so
//!    `const { x } = await import('pkg');` disappears as a whole statement.
//!
//! Only the first lexical occurrence of each target is considered.

use crate::types::SourceSpan;

use oxc_allocator::Allocator;
use oxc_ast::ast::{Expression, ImportExpression, Program, Statement, VariableDeclaration};
use oxc_ast::visit::walk;
use oxc_ast::Visit;
use oxc_parser::Parser;
use oxc_span::SourceType;
use std::ops::ControlFlow;
use std::path::Path;

/// Outcome of one pruning pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PruneReport {
    pub text: String,
    /// Targets whose first import was found, in the order they were given.
    /// A dynamic import outside any variable declaration resolves its target
    /// without removing anything.
    pub resolved: Vec<String>,
    /// True when the module could not be parsed and was returned unchanged
    pub parse_failed: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct ImportPruner {
    source_type: SourceType,
}

impl Default for ImportPruner {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportPruner {
    /// Pruner for plain ES modules
    pub fn new() -> Self {
        Self {
            source_type: SourceType::mjs(),
        }
    }

    /// Pruner whose grammar follows the module id's extension, falling back
    /// to an ES module for unknown extensions and virtual ids
    pub fn for_module(module_id: &str) -> Self {
        let path = module_id.split(['?', '#']).next().unwrap_or(module_id);
        let source_type = SourceType::from_path(Path::new(path))
            .map(|source_type| source_type.with_module(true))
            .unwrap_or_else(|_| SourceType::mjs());
        Self { source_type }
    }

    pub fn prune<S: AsRef<str>>(&self, text: &str, targets: &[S]) -> String {
        self.prune_with_report(text, targets).text
    }

    pub fn prune_with_report<S: AsRef<str>>(&self, text: &str, targets: &[S]) -> PruneReport {
        let targets: Vec<&str> = targets.iter().map(AsRef::as_ref).collect();

        let Some(search) = self.find_imports(text, &targets) else {
            log::debug!("Module could not be parsed, imports left in place");
            return PruneReport {
                text: text.to_string(),
                resolved: Vec::new(),
                parse_failed: true,
            };
        };

        let resolved = targets
            .iter()
            .zip(&search.resolved)
            .filter(|(_, &resolved)| resolved)
            .map(|(target, _)| target.to_string())
            .collect();

        PruneReport {
            text: splice(text, search.spans),
            resolved,
            parse_failed: false,
        }
    }

    /// Run both passes; `None` when the text does not parse
    fn find_imports(&self, text: &str, targets: &[&str]) -> Option<ImportSearch> {
        let allocator = Allocator::default();
        let parsed = Parser::new(&allocator, text, self.source_type).parse();
        if parsed.panicked || !parsed.errors.is_empty() {
            return None;
        }

        let mut search = ImportSearch::new(targets.len());
        if targets.is_empty() {
            return Some(search);
        }

        let _ = search.find_static(&parsed.program, targets);

        if !search.all_resolved() {
            let mut finder = DynamicImportFinder {
                targets,
                search: &mut search,
                declarations: Vec::new(),
                halted: false,
            };
            finder.visit_program(&parsed.program);
        }

        Some(search)
    }
}

/// Spans found so far and which targets they satisfy
#[derive(Debug)]
struct ImportSearch {
    spans: Vec<SourceSpan>,
    resolved: Vec<bool>,
}

impl ImportSearch {
    fn new(target_count: usize) -> Self {
        Self {
            spans: Vec::new(),
            resolved: vec![false; target_count],
        }
    }

    fn all_resolved(&self) -> bool {
        self.resolved.iter().all(|&resolved| resolved)
    }

    /// Index of the first unresolved target equal to `specifier`
    fn unresolved_target(&self, targets: &[&str], specifier: &str) -> Option<usize> {
        targets
            .iter()
            .zip(&self.resolved)
            .position(|(target, &resolved)| !resolved && *target == specifier)
    }

    /// Mark a target found, recording its span when there is one.
    /// Breaks once every target is resolved.
    fn resolve(&mut self, index: usize, span: Option<SourceSpan>) -> ControlFlow<()> {
        self.resolved[index] = true;
        self.spans.extend(span);
        if self.all_resolved() {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    }

    fn find_static(&mut self, program: &Program<'_>, targets: &[&str]) -> ControlFlow<()> {
        for statement in &program.body {
            if let Statement::ImportDeclaration(declaration) = statement {
                if let Some(index) = self.unresolved_target(targets, declaration.source.value.as_str()) {
                    let span = SourceSpan::new(
                        declaration.span.start as usize,
                        declaration.span.end as usize,
                    );
                    self.resolve(index, Some(span))?;
                }
            }
        }
        ControlFlow::Continue(())
    }
}

/// Visits `import()` expressions, tracking enclosing variable declarations
struct DynamicImportFinder<'s> {
    targets: &'s [&'s str],
    search: &'s mut ImportSearch,
    declarations: Vec<SourceSpan>,
    halted: bool,
}

impl<'a> Visit<'a> for DynamicImportFinder<'_> {
    fn visit_statement(&mut self, it: &Statement<'a>) {
        if !self.halted {
            walk::walk_statement(self, it);
        }
    }

    fn visit_expression(&mut self, it: &Expression<'a>) {
        if !self.halted {
            walk::walk_expression(self, it);
        }
    }

    fn visit_variable_declaration(&mut self, it: &VariableDeclaration<'a>) {
        self.declarations
            .push(SourceSpan::new(it.span.start as usize, it.span.end as usize));
        walk::walk_variable_declaration(self, it);
        self.declarations.pop();
    }

    fn visit_import_expression(&mut self, it: &ImportExpression<'a>) {
        if let Expression::StringLiteral(source) = &it.source {
            if let Some(index) = self.search.unresolved_target(self.targets, source.value.as_str()) {
                let enclosing = self.declarations.last().copied();
                if enclosing.is_none() {
                    log::debug!(
                        "import('{}') is not bound by a variable declaration, left in place",
                        source.value
                    );
                }
                if self.search.resolve(index, enclosing).is_break() {
                    self.halted = true;
                    return;
                }
            }
        }
        walk::walk_import_expression(self, it);
    }
}

/// Remove `spans` from `text` in a single pass.
///
/// Spans are applied in ascending start order; a span starting inside an
/// already removed region is skipped. A single `\n` directly after a span
/// is removed with it.
pub fn splice(text: &str, mut spans: Vec<SourceSpan>) -> String {
    if spans.is_empty() {
        return text.to_string();
    }

    spans.sort_by_key(|span| span.start);

    let bytes = text.as_bytes();
    let mut result = String::with_capacity(text.len());
    let mut next = 0;

    for span in spans {
        if span.start < next || span.end > text.len() {
            continue;
        }
        result.push_str(&text[next..span.start]);
        next = if bytes.get(span.end) == Some(&b'\n') {
            span.end + 1
        } else {
            span.end
        };
    }
    result.push_str(&text[next..]);

    result
}

/// Prune ES module text with the default grammar
pub fn prune<S: AsRef<str>>(text: &str, targets: &[S]) -> String {
    ImportPruner::new().prune(text, targets)
}
