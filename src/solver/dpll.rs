use crate::formula::{find_pure_literal, Assignment, Clause, Cnf, Literal, Model, Variable};

use super::{Deadline, Engine, Interrupted, Outcome};

/// One pending case split.
///
/// The clause-set snapshot is taken before the branch literal is
/// assigned, so flipping the branch restores the sibling's state
/// exactly; nothing from the failed subtree leaks into it.
#[derive(Debug)]
struct Frame {
    /// Pre-branch working set. Dropped once the branch is flipped.
    snapshot: Vec<Clause>,
    trail_len: usize,
    branch: Literal,
    flipped: bool,
}

/// DPLL backtracking search with unit propagation and pure literal
/// elimination.
///
/// The branching recursion is flattened into an explicit [`Frame`]
/// stack so the search depth is bounded by the variable count rather
/// than the native call stack.
#[derive(Debug)]
pub struct DpllEngine {
    formula: Cnf,
    /// Working set; shrinks under simplification, restored on backtrack.
    clauses: Vec<Clause>,
    assignment: Assignment,
    trail: Vec<Variable>,
    frames: Vec<Frame>,
}

impl DpllEngine {
    /// Assigns `literal` true and simplifies the working set: clauses
    /// containing it are satisfied and dropped, its negation is struck
    /// from the rest.
    fn assign(&mut self, literal: Literal) {
        self.assignment
            .set(literal.variable(), literal.positive());
        self.trail.push(literal.variable());

        let negated = !literal;
        let mut simplified = Vec::with_capacity(self.clauses.len());
        for clause in self.clauses.drain(..) {
            if clause.contains(literal) {
                continue;
            }
            if clause.contains(negated) {
                simplified.push(clause.without(negated));
            } else {
                simplified.push(clause);
            }
        }
        self.clauses = simplified;
    }

    /// Unwinds the trail down to `trail_len`.
    fn truncate_trail(&mut self, trail_len: usize) {
        while self.trail.len() > trail_len {
            let variable = self.trail.pop().unwrap();
            self.assignment.unset(variable);
        }
    }

    /// The lowest-id variable still occurring in the working set.
    /// Every such variable is unassigned: assigned ones were
    /// simplified away.
    fn branch_variable(&self) -> Variable {
        self.clauses
            .iter()
            .flat_map(Clause::iter)
            .map(|literal| literal.variable())
            .min()
            .unwrap()
    }

    /// Backtracks out of a falsified branch. Returns `false` when the
    /// whole search tree is exhausted.
    fn backtrack(&mut self) -> bool {
        while let Some(frame) = self.frames.pop() {
            if frame.flipped {
                // both polarities failed, keep unwinding
                continue;
            }

            let Frame {
                snapshot,
                trail_len,
                branch,
                ..
            } = frame;

            self.clauses = snapshot;
            self.truncate_trail(trail_len);

            trace!("flip branch to {}", !branch);
            self.frames.push(Frame {
                snapshot: Vec::new(),
                trail_len,
                branch: !branch,
                flipped: true,
            });
            self.assign(!branch);

            return true;
        }

        false
    }
}

impl Engine for DpllEngine {
    fn new(formula: Cnf) -> Self {
        // Tautological clauses are true under every assignment.
        let clauses = formula
            .clauses()
            .iter()
            .filter(|clause| !clause.is_tautology())
            .map(Clause::canonical)
            .collect();
        let assignment = Assignment::new(formula.num_variables());

        DpllEngine {
            formula,
            clauses,
            assignment,
            trail: Vec::new(),
            frames: Vec::new(),
        }
    }

    fn solve(mut self, deadline: &Deadline) -> Result<Outcome, Interrupted> {
        debug!(
            "dpll: {} clauses over {} variables",
            self.clauses.len(),
            self.formula.num_variables()
        );

        loop {
            deadline.check()?;

            if self.clauses.iter().any(Clause::is_empty) {
                if !self.backtrack() {
                    return Ok(Outcome::Unsat);
                }
                continue;
            }

            if self.clauses.is_empty() {
                // Every clause is satisfied; unassigned variables may
                // take either value.
                let model = Model::new(self.formula, self.assignment.complete());
                return Ok(Outcome::Sat(Some(model)));
            }

            // Unit propagation has priority over the pure literal rule.
            if let Some(unit) = self.clauses.iter().find_map(Clause::unit_literal) {
                trace!("unit {}", unit);
                self.assign(unit);
                continue;
            }

            if let Some(pure) =
                find_pure_literal(&self.clauses, self.formula.num_variables())
            {
                trace!("pure {}", pure);
                self.assign(pure);
                continue;
            }

            // Case split on the first unassigned variable, true first.
            // Note: This is an inefficient heuristics, kept for
            // reproducible benchmarking.
            let literal = Literal::new(self.branch_variable(), true);
            trace!("branch {}", literal);
            self.frames.push(Frame {
                snapshot: self.clauses.clone(),
                trail_len: self.trail.len(),
                branch: literal,
                flipped: false,
            });
            self.assign(literal);
        }
    }
}
