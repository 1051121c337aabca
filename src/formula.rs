/*!
A module to represent conjunctive normal form formula.
*/

use std::{convert::TryInto, fmt::Display, num::NonZeroU32, str::FromStr};

use crate::prelude::*;

#[derive(Debug, Snafu)]
pub enum VariableParseError {
    #[snafu(display("Failed to parse Variable ID"))]
    ParseIntError { source: std::num::ParseIntError },
    #[snafu(display(
        "Variable ID {} is out of range (must be within 1 to {})",
        num,
        Variable::MAX_VARIABLE_ID
    ))]
    RangeError { num: usize },
    #[snafu(display("Literal 0 is not a valid literal"))]
    ZeroLiteral,
}

/// Newtype wrapper for variable ID.
/// Invariant: 0 < ID <= MAX_VARIABLE_ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Variable(NonZeroU32);

impl Variable {
    pub const MAX_VARIABLE_ID: usize = std::u32::MAX as usize;
}

impl Variable {
    pub fn as_index(&self) -> usize {
        (self.0.get() - 1) as usize
    }

    /// Creates a variable from a raw index.
    /// Returns `None` if the index is invalid.
    pub fn from_index(index: usize) -> Option<Self> {
        let id = index.checked_add(1)?;
        if id > Variable::MAX_VARIABLE_ID {
            return None;
        }
        Some(Variable(NonZeroU32::new(id.try_into().ok()?)?))
    }
}

impl FromStr for Variable {
    type Err = VariableParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let num = s.parse::<usize>().context(ParseIntError)?;
        ensure!(num != 0, ZeroLiteral);
        Variable::from_index(num - 1).context(RangeError { num })
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "x{}", self.0)
    }
}

/// A variable together with a polarity.
/// Ordered by variable first, so sorted clauses group complementary pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Literal {
    id: Variable,
    positive: bool,
}

impl Literal {
    pub fn new(id: Variable, positive: bool) -> Self {
        Literal { id, positive }
    }

    pub fn variable(&self) -> Variable {
        self.id
    }

    pub fn positive(&self) -> bool {
        self.positive
    }
}

impl FromStr for Literal {
    type Err = VariableParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (positive, id) = if s.starts_with('-') {
            (false, s[1..].parse()?)
        } else {
            (true, s.parse()?)
        };

        Ok(Literal { id, positive })
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", if self.positive { "" } else { "¬" }, self.id)
    }
}

impl std::ops::Not for Literal {
    type Output = Literal;

    fn not(self) -> Self::Output {
        Literal {
            id: self.id,
            positive: !self.positive,
        }
    }
}

/// Disjunction of literals
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Clause {
    literals: Vec<Literal>,
}

impl Clause {
    pub fn new(literals: Vec<Literal>) -> Self {
        Self { literals }
    }

    pub fn num_literals(&self) -> usize {
        self.literals.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Literal> + '_ {
        self.literals.iter().copied()
    }

    /// The empty clause is the constant false.
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    /// A unit clause forces its single literal.
    pub fn is_unit(&self) -> bool {
        self.literals.len() == 1
    }

    pub fn unit_literal(&self) -> Option<Literal> {
        if self.is_unit() {
            Some(self.literals[0])
        } else {
            None
        }
    }

    pub fn contains(&self, literal: Literal) -> bool {
        self.literals.contains(&literal)
    }

    /// A clause containing a literal and its negation is always true
    /// and may be dropped from any working set.
    pub fn is_tautology(&self) -> bool {
        self.literals
            .iter()
            .any(|&literal| self.literals.contains(&!literal))
    }

    /// Sorts the literals and drops duplicates.
    /// Canonical clauses compare equal iff they denote the same disjunction.
    pub fn canonical(&self) -> Clause {
        let mut literals = self.literals.clone();
        literals.sort();
        literals.dedup();
        Clause { literals }
    }

    /// Whether every literal of `self` also occurs in `other`.
    pub fn subsumes(&self, other: &Clause) -> bool {
        self.literals.iter().all(|&literal| other.contains(literal))
    }

    /// Returns a copy of the clause with every occurrence of `literal` removed.
    pub fn without(&self, literal: Literal) -> Clause {
        Clause {
            literals: self
                .literals
                .iter()
                .copied()
                .filter(|&other| other != literal)
                .collect(),
        }
    }

    pub fn satisfied_by(&self, assignment: &Assignment) -> bool {
        self.literals
            .iter()
            .any(|&literal| assignment.value_of(literal) == Some(true))
    }
}

impl Display for Clause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;

        let mut iter = self.literals.iter();
        if let Some(first) = iter.next() {
            write!(f, "{}", first)?;
        }
        for literal in iter {
            write!(f, " ∨ {}", literal)?;
        }

        write!(f, ")")?;

        Ok(())
    }
}

/// Returns the first pure literal of the clause set in ascending variable
/// order, i.e. a variable that occurs with only one polarity.
pub fn find_pure_literal(clauses: &[Clause], num_variables: usize) -> Option<Literal> {
    let mut positive = vec![false; num_variables];
    let mut negative = vec![false; num_variables];

    for clause in clauses {
        for literal in clause.iter() {
            if literal.positive() {
                positive[literal.variable().as_index()] = true;
            } else {
                negative[literal.variable().as_index()] = true;
            }
        }
    }

    for index in 0..num_variables {
        if positive[index] != negative[index] {
            let variable = Variable::from_index(index).unwrap();
            return Some(Literal::new(variable, positive[index]));
        }
    }

    None
}

/// Formula representation in Conjunctive Normal Form
#[derive(Debug, Clone)]
pub struct Cnf {
    num_variables: usize,
    clauses: Vec<Clause>,
}

impl Cnf {
    pub fn new(num_variables: usize) -> Self {
        assert!(num_variables <= Variable::MAX_VARIABLE_ID);

        Cnf {
            num_variables,
            clauses: Vec::new(),
        }
    }

    pub fn num_variables(&self) -> usize {
        self.num_variables
    }

    pub fn clauses(&self) -> &Vec<Clause> {
        &self.clauses
    }

    pub fn add_clause(&mut self, clause: Clause) {
        debug_assert!(clause
            .iter()
            .all(|literal| literal.variable().as_index() < self.num_variables));
        self.clauses.push(clause);
    }

    /// An empty formula is the constant true.
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn has_empty_clause(&self) -> bool {
        self.clauses.iter().any(Clause::is_empty)
    }
}

impl Display for Cnf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CNF with {} variables (", self.num_variables)?;

        let mut iter = self.clauses.iter();
        if let Some(first) = iter.next() {
            write!(f, "{}", first)?;
        }
        for clause in iter {
            write!(f, " ∧ {}", clause)?;
        }

        write!(f, ")")?;

        Ok(())
    }
}

/// A partial mapping from variable to boolean.
#[derive(Debug, Clone)]
pub struct Assignment {
    values: Vec<Option<bool>>,
}

impl Assignment {
    pub fn new(num_variables: usize) -> Self {
        Assignment {
            values: vec![None; num_variables],
        }
    }

    pub fn get(&self, variable: Variable) -> Option<bool> {
        self.values[variable.as_index()]
    }

    pub fn set(&mut self, variable: Variable, value: bool) {
        self.values[variable.as_index()] = Some(value);
    }

    pub fn unset(&mut self, variable: Variable) {
        self.values[variable.as_index()] = None;
    }

    /// The truth value of `literal` under this assignment,
    /// or `None` if its variable is unassigned.
    pub fn value_of(&self, literal: Literal) -> Option<bool> {
        self.get(literal.variable())
            .map(|value| value == literal.positive())
    }

    pub fn first_unassigned(&self) -> Option<Variable> {
        self.values
            .iter()
            .position(|value| value.is_none())
            .map(|index| Variable::from_index(index).unwrap())
    }

    /// Extends the assignment to a total one; unassigned variables
    /// default to true.
    pub fn complete(&self) -> Vec<bool> {
        self.values
            .iter()
            .map(|value| value.unwrap_or(true))
            .collect()
    }
}

/// Represents a satisfying assignment for a formula.
#[derive(Debug)]
pub struct Model {
    formula: Cnf,
    assignment: Vec<bool>,
}

impl Model {
    /// Creates a new model from a formula and an assignment.
    ///
    /// # Panics
    ///
    /// Panics when `assignment` is invalid (e.g., length mismatch, unsatisfying).
    pub fn new(formula: Cnf, assignment: Vec<bool>) -> Self {
        assert!(assignment.len() == formula.num_variables());
        assert!(
            formula.clauses().iter().all(|clause| clause
                .iter()
                .any(|literal| assignment[literal.variable().as_index()] == literal.positive())),
            "assignment does not satisfy the formula"
        );

        Model {
            formula,
            assignment,
        }
    }

    pub fn formula(&self) -> &Cnf {
        &self.formula
    }

    pub fn assignment(&self) -> &[bool] {
        &self.assignment
    }
}

impl Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Model for {}\nAssignment:", self.formula)?;
        for (idx, &val) in self.assignment.iter().enumerate() {
            write!(f, "\n  {}: {}", Variable::from_index(idx).unwrap(), val)?;
        }

        Ok(())
    }
}
