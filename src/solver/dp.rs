use crate::formula::{Clause, Cnf, Literal, Variable};

use super::{Deadline, Engine, Interrupted, Outcome};

/// Davis-Putnam variable elimination.
///
/// Eliminates variables in ascending id order by replacing the clauses
/// mentioning a variable with their pairwise resolvents over it.
/// Elimination order affects running time only, never the verdict.
#[derive(Debug)]
pub struct DpEngine {
    num_variables: usize,
    clauses: Vec<Clause>,
}

impl DpEngine {
    /// Resolvents of every (positive, negative) clause pair over
    /// `variable`, pruned as they are produced: tautologies are
    /// dropped, subsumed resolvents are dropped, and an empty
    /// resolvent short-circuits to `None` (the formula is
    /// unsatisfiable).
    fn resolve_groups(
        positive: &[Clause],
        negative: &[Clause],
        retained: &[Clause],
        variable: Variable,
        deadline: &Deadline,
    ) -> Result<Option<Vec<Clause>>, Interrupted> {
        let pos_literal = Literal::new(variable, true);
        let mut resolvents: Vec<Clause> = Vec::new();

        for left in positive {
            deadline.check()?;

            for right in negative {
                let mut literals: Vec<Literal> =
                    left.without(pos_literal).iter().collect();
                literals.extend(right.without(!pos_literal).iter());
                let resolvent = Clause::new(literals).canonical();

                if resolvent.is_empty() {
                    return Ok(None);
                }
                if resolvent.is_tautology() {
                    continue;
                }
                if retained
                    .iter()
                    .chain(resolvents.iter())
                    .any(|kept| kept.subsumes(&resolvent))
                {
                    continue;
                }

                resolvents.push(resolvent);
            }
        }

        Ok(Some(resolvents))
    }
}

impl Engine for DpEngine {
    fn new(formula: Cnf) -> Self {
        let mut clauses: Vec<Clause> = formula
            .clauses()
            .iter()
            .filter(|clause| !clause.is_tautology())
            .map(Clause::canonical)
            .collect();
        clauses.sort();
        clauses.dedup();

        DpEngine {
            num_variables: formula.num_variables(),
            clauses,
        }
    }

    fn solve(mut self, deadline: &Deadline) -> Result<Outcome, Interrupted> {
        debug!(
            "dp: {} clauses over {} variables",
            self.clauses.len(),
            self.num_variables
        );

        for index in 0..self.num_variables {
            deadline.check()?;

            if self.clauses.iter().any(Clause::is_empty) {
                return Ok(Outcome::Unsat);
            }
            if self.clauses.is_empty() {
                break;
            }

            let variable = Variable::from_index(index).unwrap();
            let pos_literal = Literal::new(variable, true);

            let mut positive = Vec::new();
            let mut negative = Vec::new();
            let mut rest = Vec::new();
            for clause in self.clauses.drain(..) {
                if clause.contains(pos_literal) {
                    positive.push(clause);
                } else if clause.contains(!pos_literal) {
                    negative.push(clause);
                } else {
                    rest.push(clause);
                }
            }

            let resolvents =
                match Self::resolve_groups(&positive, &negative, &rest, variable, deadline)? {
                    Some(resolvents) => resolvents,
                    None => return Ok(Outcome::Unsat),
                };

            trace!(
                "eliminated {}: {}+{} clauses -> {} resolvents",
                variable,
                positive.len(),
                negative.len(),
                resolvents.len()
            );

            rest.extend(resolvents);
            self.clauses = rest;
        }

        // Every variable is eliminated; any remaining clause is empty.
        if self.clauses.iter().any(Clause::is_empty) {
            Ok(Outcome::Unsat)
        } else {
            // Elimination never builds a witness.
            Ok(Outcome::Sat(None))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{cnf, UNSAT_SQUARE};

    #[test]
    fn direct_contradiction() {
        let formula = cnf(1, &[&[1], &[-1]]);
        let outcome = DpEngine::new(formula)
            .solve(&Deadline::unbounded())
            .unwrap();
        assert!(!outcome.is_sat());
    }

    #[test]
    fn square_is_unsat() {
        let formula = cnf(2, UNSAT_SQUARE);
        let outcome = DpEngine::new(formula)
            .solve(&Deadline::unbounded())
            .unwrap();
        assert!(!outcome.is_sat());
    }

    #[test]
    fn sat_verdict_carries_no_model() {
        let formula = cnf(2, &[&[1, 2]]);
        let outcome = DpEngine::new(formula)
            .solve(&Deadline::unbounded())
            .unwrap();
        assert!(outcome.is_sat());
        assert!(outcome.model().is_none());
    }

    #[test]
    fn elimination_never_reintroduces_a_variable() {
        let formula = cnf(3, &[&[1, 2], &[-1, 3], &[-1, -2], &[2, 3]]);
        let mut engine = DpEngine::new(formula);
        let deadline = Deadline::unbounded();

        let variable = Variable::from_index(0).unwrap();
        let pos_literal = Literal::new(variable, true);

        let (mentioning, rest): (Vec<Clause>, Vec<Clause>) = engine
            .clauses
            .drain(..)
            .partition(|clause| clause.contains(pos_literal) || clause.contains(!pos_literal));
        let (positive, negative): (Vec<Clause>, Vec<Clause>) = mentioning
            .into_iter()
            .partition(|clause| clause.contains(pos_literal));

        let resolvents =
            DpEngine::resolve_groups(&positive, &negative, &rest, variable, &deadline)
                .unwrap()
                .unwrap();
        assert!(resolvents
            .iter()
            .all(|clause| !clause.contains(pos_literal) && !clause.contains(!pos_literal)));
    }
}
