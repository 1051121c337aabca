use crate::formula::{Clause, Cnf, Literal};

use super::{Deadline, Engine, Interrupted, Outcome};

/// Resolution saturation.
///
/// Closes the clause set under the resolution rule: UNSAT the moment
/// the empty clause is derived, SAT once a full round produces no new
/// clause. The closure loop has no recursion to piggyback on, so the
/// deadline is polled at every pair step.
#[derive(Debug)]
pub struct ResolutionEngine {
    clauses: Vec<Clause>,
}

/// Resolvent of the two clauses over the first complementary pair,
/// or `None` when they share none.
///
/// Resolving over one pivot is enough: a pair with several
/// complementary literals only yields tautological resolvents.
fn resolve_pair(left: &Clause, right: &Clause) -> Option<Clause> {
    let pivot = left.iter().find(|&literal| right.contains(!literal))?;

    let mut literals: Vec<Literal> = left.without(pivot).iter().collect();
    literals.extend(right.without(!pivot).iter());
    Some(Clause::new(literals).canonical())
}

impl Engine for ResolutionEngine {
    fn new(formula: Cnf) -> Self {
        let mut clauses: Vec<Clause> = formula
            .clauses()
            .iter()
            .filter(|clause| !clause.is_tautology())
            .map(Clause::canonical)
            .collect();
        clauses.sort();
        clauses.dedup();

        ResolutionEngine { clauses }
    }

    fn solve(mut self, deadline: &Deadline) -> Result<Outcome, Interrupted> {
        debug!("resolution: {} initial clauses", self.clauses.len());

        if self.clauses.iter().any(Clause::is_empty) {
            return Ok(Outcome::Unsat);
        }

        loop {
            let mut fresh: Vec<Clause> = Vec::new();

            for i in 0..self.clauses.len() {
                for j in (i + 1)..self.clauses.len() {
                    deadline.check()?;

                    let resolvent = match resolve_pair(&self.clauses[i], &self.clauses[j]) {
                        Some(resolvent) => resolvent,
                        None => continue,
                    };

                    if resolvent.is_empty() {
                        return Ok(Outcome::Unsat);
                    }
                    if resolvent.is_tautology() {
                        continue;
                    }
                    if self
                        .clauses
                        .iter()
                        .chain(fresh.iter())
                        .any(|kept| kept.subsumes(&resolvent))
                    {
                        continue;
                    }

                    fresh.push(resolvent);
                }
            }

            if fresh.is_empty() {
                // Saturated without deriving the empty clause.
                // Saturation proves satisfiability but yields no witness.
                return Ok(Outcome::Sat(None));
            }

            trace!("saturation round added {} clauses", fresh.len());
            self.clauses.extend(fresh);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{cnf, UNSAT_SQUARE};

    #[test]
    fn resolve_pair_on_first_pivot() {
        let formula = cnf(3, &[&[1, 2], &[-1, 3]]);
        let resolvent =
            resolve_pair(&formula.clauses()[0], &formula.clauses()[1]).unwrap();
        assert_eq!(resolvent, cnf(3, &[&[2, 3]]).clauses()[0].canonical());
    }

    #[test]
    fn unrelated_clauses_do_not_resolve() {
        let formula = cnf(2, &[&[1], &[2]]);
        assert!(resolve_pair(&formula.clauses()[0], &formula.clauses()[1]).is_none());
    }

    #[test]
    fn derives_the_empty_clause() {
        let formula = cnf(2, UNSAT_SQUARE);
        let outcome = ResolutionEngine::new(formula)
            .solve(&Deadline::unbounded())
            .unwrap();
        assert!(!outcome.is_sat());
    }

    #[test]
    fn saturation_without_refutation_is_sat() {
        let formula = cnf(3, &[&[1, 2], &[-1, 3]]);
        let outcome = ResolutionEngine::new(formula)
            .solve(&Deadline::unbounded())
            .unwrap();
        assert!(outcome.is_sat());
        assert!(outcome.model().is_none());
    }

    #[test]
    fn initial_empty_clause_is_unsat() {
        let formula = cnf(1, &[&[]]);
        let outcome = ResolutionEngine::new(formula)
            .solve(&Deadline::unbounded())
            .unwrap();
        assert!(!outcome.is_sat());
    }
}
