//! Recursive formula evaluation.
//!
//! A formula names one aggregate over one range. Every cell in the range is
//! resolved through the [`CellStore`]: absent cells contribute `""`, value
//! cells their raw text, formula cells the unrounded result of their own
//! (recursive) evaluation. The aggregate then reduces the contributions and
//! only the top-level result is formatted for display.
//!
//! Each walk threads its own `visiting` set of the cells currently being
//! resolved on the call stack. Reaching a cell that is already in the set is
//! a circular reference; the set is unwound on return so sibling branches of
//! the same walk are unaffected. A depth limit backs this up.

use std::collections::{HashMap, HashSet};
use std::fmt;

use tracing::{debug, trace};

use super::cell::{CellContents, CellStore};
use super::cell_ref::{CellRef, RangeRef};
use super::format::format_number;
use super::formula::{is_formula, parse_formula};
use crate::builtins::Contribution;
use crate::error::EvalError;

/// Default cap on nested formula evaluation.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Ranges with more cells than this (and many more than the store holds)
/// are resolved by scanning stored cells instead of every position.
const DENSE_SCAN_LIMIT: usize = 4096;

/// Outcome of evaluating a cell or formula.
#[derive(Clone, Debug, PartialEq)]
pub enum Evaluation {
    /// Non-formula text, passed through unchanged.
    Value(String),
    /// Aggregate result.
    Number(f64),
    Error(EvalError),
}

impl Evaluation {
    /// Text rendered into the grid.
    pub fn display(&self) -> String {
        match self {
            Evaluation::Value(text) => text.clone(),
            Evaluation::Number(n) => format_number(*n),
            Evaluation::Error(err) => err.sentinel().to_string(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Evaluation::Error(_))
    }

    pub fn error(&self) -> Option<EvalError> {
        match self {
            Evaluation::Error(err) => Some(*err),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Evaluation::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EvalOptions {
    /// Maximum number of formula cells on one resolution path.
    pub max_depth: usize,
}

impl Default for EvalOptions {
    fn default() -> Self {
        EvalOptions {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Per-render-pass results. Disabled for one-off evaluations.
#[derive(Debug, Default)]
struct Memo {
    enabled: bool,
    results: HashMap<CellRef, Evaluation>,
}

impl Memo {
    fn enabled() -> Memo {
        Memo {
            enabled: true,
            results: HashMap::new(),
        }
    }

    fn get(&self, at: &CellRef) -> Option<&Evaluation> {
        self.results.get(at)
    }

    fn remember(&mut self, at: CellRef, result: &Evaluation) {
        // Depth failures depend on where the walk started.
        if self.enabled && result.error() != Some(EvalError::DepthExceeded) {
            self.results.insert(at, result.clone());
        }
    }
}

/// Evaluates formulas against a read-only cell store.
pub struct Evaluator<'a, S: CellStore + ?Sized> {
    store: &'a S,
    options: EvalOptions,
}

impl<'a, S: CellStore + ?Sized> Evaluator<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self::with_options(store, EvalOptions::default())
    }

    pub fn with_options(store: &'a S, options: EvalOptions) -> Self {
        Evaluator { store, options }
    }

    /// Evaluate formula text owned by `owner`, with a fresh visiting set.
    pub fn evaluate(&self, formula: &str, owner: CellRef) -> Evaluation {
        let mut visiting = HashSet::new();
        self.evaluate_with(formula, owner, &mut visiting)
    }

    /// Evaluate with a caller-supplied visiting set. `visiting` is left as it
    /// was found.
    pub fn evaluate_with(
        &self,
        formula: &str,
        owner: CellRef,
        visiting: &mut HashSet<CellRef>,
    ) -> Evaluation {
        self.eval_formula(formula, owner, visiting, &mut Memo::default())
    }

    /// Display value of the cell at `at`.
    pub fn evaluate_cell(&self, at: CellRef) -> Evaluation {
        match self.store.contents(&at) {
            None => Evaluation::Value(String::new()),
            Some(CellContents::Value(value)) => Evaluation::Value(value),
            Some(CellContents::Formula(formula)) => self.evaluate(&formula, at),
        }
    }

    fn eval_formula(
        &self,
        formula: &str,
        owner: CellRef,
        visiting: &mut HashSet<CellRef>,
        memo: &mut Memo,
    ) -> Evaluation {
        if !is_formula(formula) {
            return Evaluation::Value(formula.to_string());
        }

        let parsed = match parse_formula(formula) {
            Ok(parsed) => parsed,
            Err(err) => {
                debug!(cell = %owner, %formula, error = %err, "formula rejected");
                return Evaluation::Error(EvalError::from(&err));
            }
        };

        if !visiting.insert(owner) {
            debug!(cell = %owner, "circular reference");
            return Evaluation::Error(EvalError::CircularReference);
        }
        trace!(cell = %owner, %formula, depth = visiting.len(), "evaluating formula");

        let result = match self.resolve_range(&parsed.range, visiting, memo) {
            Ok(values) => Evaluation::Number(parsed.function.apply(&values)),
            Err(err) => Evaluation::Error(err),
        };

        visiting.remove(&owner);
        result
    }

    /// Contributions of every cell in `range`, row-major.
    fn resolve_range(
        &self,
        range: &RangeRef,
        visiting: &mut HashSet<CellRef>,
        memo: &mut Memo,
    ) -> Result<Vec<Contribution>, EvalError> {
        let dense = match range.cell_count() {
            Some(count) => {
                count <= DENSE_SCAN_LIMIT || count <= self.store.len().saturating_mul(4)
            }
            None => false,
        };

        let mut values = Vec::new();
        if dense {
            for at in range.iter() {
                values.push(self.contribution(at, visiting, memo)?);
            }
        } else {
            // Absent cells only add "" which no aggregate counts.
            for at in self.store.positions_in(range) {
                values.push(self.contribution(at, visiting, memo)?);
            }
        }
        Ok(values)
    }

    fn contribution(
        &self,
        at: CellRef,
        visiting: &mut HashSet<CellRef>,
        memo: &mut Memo,
    ) -> Result<Contribution, EvalError> {
        match self.store.contents(&at) {
            None => Ok(Contribution::Text(String::new())),
            Some(CellContents::Value(value)) => Ok(Contribution::Text(value)),
            Some(CellContents::Formula(formula)) => {
                let result = self.resolve_formula_cell(&formula, at, visiting, memo);
                match (result.as_number(), result.error()) {
                    (Some(n), _) => Ok(Contribution::Number(n)),
                    (None, Some(err)) if err.propagates() => Err(err),
                    _ => Ok(Contribution::Text(result.display())),
                }
            }
        }
    }

    fn resolve_formula_cell(
        &self,
        formula: &str,
        at: CellRef,
        visiting: &mut HashSet<CellRef>,
        memo: &mut Memo,
    ) -> Evaluation {
        if let Some(hit) = memo.get(&at) {
            return hit.clone();
        }
        if visiting.contains(&at) {
            debug!(cell = %at, "circular reference");
            return Evaluation::Error(EvalError::CircularReference);
        }
        if visiting.len() >= self.options.max_depth {
            debug!(cell = %at, max_depth = self.options.max_depth, "evaluation too deep");
            return Evaluation::Error(EvalError::DepthExceeded);
        }

        let result = self.eval_formula(formula, at, visiting, memo);
        memo.remember(at, &result);
        result
    }
}

/// One rendering of a sheet: every cell evaluated at most once.
///
/// Results are only valid for the store snapshot the pass was created with;
/// start a new pass after any cell changes.
pub struct RenderPass<'a, S: CellStore + ?Sized> {
    evaluator: Evaluator<'a, S>,
    memo: Memo,
}

impl<'a, S: CellStore + ?Sized> RenderPass<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self::with_options(store, EvalOptions::default())
    }

    pub fn with_options(store: &'a S, options: EvalOptions) -> Self {
        RenderPass {
            evaluator: Evaluator::with_options(store, options),
            memo: Memo::enabled(),
        }
    }

    pub fn evaluate_cell(&mut self, at: CellRef) -> Evaluation {
        match self.evaluator.store.contents(&at) {
            None => Evaluation::Value(String::new()),
            Some(CellContents::Value(value)) => Evaluation::Value(value),
            Some(CellContents::Formula(formula)) => {
                let mut visiting = HashSet::new();
                self.evaluator
                    .resolve_formula_cell(&formula, at, &mut visiting, &mut self.memo)
            }
        }
    }

    pub fn display(&mut self, at: CellRef) -> String {
        self.evaluate_cell(at).display()
    }

    /// Display strings for a rectangle, one `Vec` per row.
    pub fn render(&mut self, range: &RangeRef) -> Vec<Vec<String>> {
        let n = range.normalized();
        (n.start.row..=n.end.row)
            .map(|row| {
                (n.start.col..=n.end.col)
                    .map(|col| self.display(CellRef::new(row, col)))
                    .collect()
            })
            .collect()
    }
}

/// Evaluate `formula` owned by `owner` and return its display text.
///
/// Cells already in `visiting` are treated as being resolved further up the
/// call stack.
pub fn evaluate_formula<S: CellStore + ?Sized>(
    formula: &str,
    owner: CellRef,
    store: &S,
    visiting: &mut HashSet<CellRef>,
) -> String {
    Evaluator::new(store)
        .evaluate_with(formula, owner, visiting)
        .display()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Cell, Grid};
    use pretty_assertions::assert_eq;

    fn at(token: &str) -> CellRef {
        token.parse().unwrap()
    }

    fn grid(cells: &[(&str, &str)]) -> Grid {
        let grid = Grid::new();
        for (token, input) in cells {
            grid.insert(at(token), Cell::from_input(input));
        }
        grid
    }

    #[test]
    fn test_memo_skips_depth_failures() {
        let mut memo = Memo::enabled();
        memo.remember(at("A1"), &Evaluation::Error(EvalError::DepthExceeded));
        memo.remember(at("A2"), &Evaluation::Number(1.0));
        assert!(memo.get(&at("A1")).is_none());
        assert_eq!(memo.get(&at("A2")), Some(&Evaluation::Number(1.0)));

        let mut disabled = Memo::default();
        disabled.remember(at("A2"), &Evaluation::Number(1.0));
        assert!(disabled.get(&at("A2")).is_none());
    }

    #[test]
    fn test_visiting_is_restored_after_evaluation() {
        let g = grid(&[("A1", "1"), ("A2", "=SUM(A1)")]);
        let mut visiting = HashSet::new();
        visiting.insert(at("Z9"));
        let shown = evaluate_formula("=SUM(A1:A2)", at("B1"), &g, &mut visiting);
        assert_eq!(shown, "2");
        assert_eq!(visiting, HashSet::from([at("Z9")]));
    }

    #[test]
    fn test_caller_visiting_set_marks_cycles() {
        let g = grid(&[("A1", "=SUM(B1)")]);
        let mut visiting = HashSet::from([at("B1")]);
        assert_eq!(
            evaluate_formula("=SUM(A1)", at("B1"), &g, &mut visiting),
            "#CIRCULAR!"
        );
    }

    #[test]
    fn test_sparse_scan_matches_dense_scan() {
        let g = grid(&[("A1", "2"), ("C5000", "3"), ("B7", "x")]);
        let eval = Evaluator::new(&g);
        // 26 * 10000 cells: well past the dense limit.
        assert_eq!(eval.evaluate("=SUM(A1:Z10000)", at("AA1")), Evaluation::Number(5.0));
        assert_eq!(eval.evaluate("=COUNT(A1:Z10000)", at("AA1")), Evaluation::Number(2.0));
        assert_eq!(eval.evaluate("=SUM(A1:C5)", at("AA1")), Evaluation::Number(2.0));
    }

    #[test]
    fn test_render_pass_matches_one_off_evaluation() {
        let g = grid(&[
            ("A1", "1"),
            ("A2", "2"),
            ("A3", "=SUM(A1:A2)"),
            ("B1", "=SUM(A1:A3)"),
            ("B2", "=AVERAGE(B1:B1)"),
            ("C1", "=SUM(C2)"),
            ("C2", "=SUM(C1)"),
        ]);
        let eval = Evaluator::new(&g);
        let mut pass = RenderPass::new(&g);
        let range = RangeRef::parse("A1:C3").unwrap();
        for cell in range.iter() {
            assert_eq!(pass.evaluate_cell(cell), eval.evaluate_cell(cell), "{cell}");
        }
        let rows = pass.render(&range);
        assert_eq!(rows[0], vec!["1", "6", "#CIRCULAR!"]);
        assert_eq!(rows[2], vec!["3", "", ""]);
    }
}
