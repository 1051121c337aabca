use std::time::Duration;

use paste::paste;

use crate::{
    bench::{run_benchmark, BenchConfig, Error, Task, TaskId, Verdict},
    formula::{Assignment, Clause, Cnf, Literal, Variable},
    solver::{solve, Algorithm, Deadline},
};

/// Builds a formula from DIMACS-style signed integers.
pub(crate) fn cnf(num_variables: usize, clauses: &[&[i32]]) -> Cnf {
    let mut cnf = Cnf::new(num_variables);
    for &clause in clauses {
        let literals = clause
            .iter()
            .map(|&lit| {
                let variable = Variable::from_index(lit.unsigned_abs() as usize - 1).unwrap();
                Literal::new(variable, lit > 0)
            })
            .collect();
        cnf.add_clause(Clause::new(literals));
    }
    cnf
}

/// The classic unsatisfiable two-variable instance.
pub(crate) const UNSAT_SQUARE: &[&[i32]] = &[&[1, 2], &[-1, 2], &[1, -2], &[-1, -2]];

macro_rules! verdict_testcase {
    ($algorithm:ident, $name:ident, $num_variables:expr, $clauses:expr, $expect_sat:expr) => {
        paste! {
            #[test]
            fn [< $algorithm:lower _ $name >]() {
                let formula = cnf($num_variables, $clauses);
                let outcome = solve(formula, Algorithm::$algorithm, &Deadline::unbounded()).unwrap();
                assert_eq!(outcome.is_sat(), $expect_sat);
            }
        }
    };
}

macro_rules! scenario {
    ($name:ident, $num_variables:expr, $clauses:expr, $expect_sat:expr) => {
        verdict_testcase!(Dp, $name, $num_variables, $clauses, $expect_sat);
        verdict_testcase!(Dpll, $name, $num_variables, $clauses, $expect_sat);
        verdict_testcase!(Resolution, $name, $num_variables, $clauses, $expect_sat);
    };
}

scenario!(empty_formula, 0, &[], true);
scenario!(tautological_unit, 1, &[&[1, -1]], true);
scenario!(direct_contradiction, 1, &[&[1], &[-1]], false);
scenario!(two_variable_square, 2, UNSAT_SQUARE, false);
scenario!(implication_chain, 3, &[&[1], &[-1, 2], &[-2, 3]], true);
scenario!(unit_cascade_conflict, 3, &[&[1], &[-1, 2], &[-2, 3], &[-3]], false);
scenario!(two_pigeons_one_hole, 2, &[&[1], &[2], &[-1, -2]], false);
scenario!(initial_empty_clause, 2, &[&[1, 2], &[]], false);

#[test]
fn partial_assignment_clause_satisfaction() {
    let formula = cnf(2, &[&[1, -2]]);
    let clause = &formula.clauses()[0];

    let mut assignment = Assignment::new(2);
    assert!(!clause.satisfied_by(&assignment));

    assignment.set(Variable::from_index(1).unwrap(), false);
    assert!(clause.satisfied_by(&assignment));
}

#[test]
fn engines_agree_on_fixed_instances() {
    let instances: &[(usize, &[&[i32]])] = &[
        (3, &[&[1, 2, 3], &[-1, -2], &[-2, -3], &[-1, -3]]),
        (4, &[&[1, 2], &[-1, 3], &[-3, 4], &[-2, -4], &[2, 4]]),
        (3, &[&[1, 2], &[1, -2], &[-1, 3], &[-1, -3]]),
        (2, &[&[1], &[-1, 2], &[-2, -1]]),
    ];

    for (index, &(num_variables, clauses)) in instances.iter().enumerate() {
        let verdicts: Vec<bool> = Algorithm::ALL
            .iter()
            .map(|&algorithm| {
                solve(cnf(num_variables, clauses), algorithm, &Deadline::unbounded())
                    .unwrap()
                    .is_sat()
            })
            .collect();
        assert!(
            verdicts.windows(2).all(|pair| pair[0] == pair[1]),
            "engines disagree on instance {}: {:?}",
            index,
            verdicts
        );
    }
}

#[test]
fn dpll_witness_satisfies_every_clause() {
    let clauses: &[&[i32]] = &[&[1, 2, 3], &[-1, 2], &[-2, 3], &[-3, 1], &[1, -2, 3]];
    let formula = cnf(3, clauses);
    let outcome = solve(formula.clone(), Algorithm::Dpll, &Deadline::unbounded()).unwrap();

    let model = outcome.model().expect("expected a witness");
    for clause in formula.clauses() {
        assert!(clause
            .iter()
            .any(|literal| model.assignment()[literal.variable().as_index()]
                == literal.positive()));
    }
}

#[test]
fn only_dpll_produces_witnesses() {
    for &algorithm in &Algorithm::ALL {
        let outcome = solve(
            cnf(2, &[&[1, 2]]),
            algorithm,
            &Deadline::unbounded(),
        )
        .unwrap();
        assert!(outcome.is_sat());
        assert_eq!(outcome.model().is_some(), algorithm == Algorithm::Dpll);
    }
}

fn scenario_tasks(count: usize, budget: Duration) -> Vec<Task> {
    (0..count)
        .map(|index| {
            // every third task is unsatisfiable
            let formula = if index % 3 == 2 {
                cnf(2, UNSAT_SQUARE)
            } else {
                cnf(2, &[&[1, 2], &[-1, 2]])
            };
            Task {
                id: TaskId::from(index),
                formula,
                algorithm: Algorithm::ALL[index % 3],
                budget,
            }
        })
        .collect()
}

fn config(workers: usize) -> BenchConfig {
    BenchConfig {
        workers,
        ..BenchConfig::default()
    }
}

#[test]
fn seven_tasks_three_workers() {
    let results = run_benchmark(scenario_tasks(7, Duration::from_secs(10)), config(3)).unwrap();

    assert_eq!(results.len(), 7);
    for (index, result) in results.iter().enumerate() {
        assert_eq!(usize::from(result.id), index);
        let expected = if index % 3 == 2 {
            Verdict::Unsat
        } else {
            Verdict::Sat
        };
        assert_eq!(result.verdict, expected);
    }
}

#[test]
fn verdicts_are_independent_of_worker_count() {
    let reference: Vec<Verdict> =
        run_benchmark(scenario_tasks(10, Duration::from_secs(10)), config(1))
            .unwrap()
            .iter()
            .map(|result| result.verdict)
            .collect();

    for workers in 2..=5 {
        let verdicts: Vec<Verdict> =
            run_benchmark(scenario_tasks(10, Duration::from_secs(10)), config(workers))
                .unwrap()
                .iter()
                .map(|result| result.verdict)
                .collect();
        assert_eq!(verdicts, reference, "worker count {}", workers);
    }
}

#[test]
fn zero_budget_reports_timeout() {
    let task = Task {
        id: TaskId::from(0),
        formula: cnf(3, &[&[1, 2, 3], &[-1, -2], &[-2, -3], &[-1, -3]]),
        algorithm: Algorithm::Dpll,
        budget: Duration::from_secs(0),
    };
    let results = run_benchmark(vec![task], config(1)).unwrap();

    assert_eq!(results[0].verdict, Verdict::Timeout);
    assert_eq!(results[0].elapsed, Duration::from_secs(0));
}

#[test]
fn zero_workers_is_rejected() {
    let error = run_benchmark(scenario_tasks(1, Duration::from_secs(1)), config(0)).unwrap_err();
    assert!(matches!(error, Error::NoWorkers));
}
