/*!
DIMACS CNF parser.

Accepts the common benchmark-corpus dialect: comment lines (`c`), a
`p cnf <variables> <clauses>` problem line, clauses as whitespace-separated
literals terminated by `0` (several clauses may share a line), and an
optional trailing `%` marker.
*/

use std::{
    fs::File,
    io::{BufRead, BufReader, Read},
    path::{Path, PathBuf},
};

use crate::formula::{Clause, Cnf, Literal, VariableParseError};
use crate::prelude::*;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("I/O error occurred while parsing CNF file '{}'", path.display()))]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Invalid literal '{}'", token))]
    MalformedLiteral {
        token: String,
        source: VariableParseError,
    },
    #[snafu(display(
        "Literal {} is out of range (problem line declares {} variables)",
        literal,
        num_variables
    ))]
    LiteralOutOfRange {
        literal: String,
        num_variables: usize,
    },
    #[snafu(display("Problem line 'p cnf <num_variables> <num_clauses>' is not found"))]
    MalformedProblemDefinition,
    #[snafu(display("Clause is not terminated by 0"))]
    UnterminatedClause,
    #[snafu(display(
        "The number of clauses ({}) does not match the clauses number in the problem definition ({})",
        found,
        expected,
    ))]
    ClauseCountMismatch { expected: usize, found: usize },
}

/// Parses CNF formula from a reader.
pub fn parse(reader: impl Read) -> Result<Cnf, Error> {
    let reader = BufReader::new(reader);

    let mut lines = reader
        .lines()
        .map(|line| line.unwrap_or_default())
        .skip_while(|line| !line.starts_with('p'));

    let prob_line = lines.next().context(MalformedProblemDefinition)?;

    let splitted = prob_line.trim().split_whitespace().collect::<Vec<_>>();

    // We only support CNF DIMACS format
    ensure!(
        splitted.len() == 4 && splitted[0] == "p" && splitted[1] == "cnf",
        MalformedProblemDefinition
    );

    let (num_variables, num_clauses) =
        match (splitted[2].parse::<usize>(), splitted[3].parse::<usize>()) {
            (Ok(num_variables), Ok(num_clauses)) => (num_variables, num_clauses),
            _ => return MalformedProblemDefinition.fail(),
        };

    let mut cnf = Cnf::new(num_variables);
    let mut literals: Vec<Literal> = Vec::new();

    'outer: for line in lines {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('c') {
            // empty line, comment
            continue;
        }
        if trimmed.starts_with('%') {
            // some benchmark corpora end with a '%' marker
            break;
        }

        for token in trimmed.split_whitespace() {
            if token == "0" {
                cnf.add_clause(Clause::new(std::mem::take(&mut literals)));
                if cnf.clauses().len() == num_clauses {
                    break 'outer;
                }
                continue;
            }

            let literal = token.parse::<Literal>().with_context(|| MalformedLiteral {
                token: token.to_owned(),
            })?;
            ensure!(
                literal.variable().as_index() < num_variables,
                LiteralOutOfRange {
                    literal: token.to_owned(),
                    num_variables,
                }
            );
            literals.push(literal);
        }
    }

    ensure!(literals.is_empty(), UnterminatedClause);
    ensure!(
        cnf.clauses().len() == num_clauses,
        ClauseCountMismatch {
            expected: num_clauses,
            found: cnf.clauses().len(),
        }
    );

    Ok(cnf)
}

/// Parses CNF formula from a file
pub fn parse_file(path: impl AsRef<Path>) -> Result<Cnf, Error> {
    let path = path.as_ref();
    let file = File::open(path).context(IoError {
        path: path.to_owned(),
    })?;
    parse(file)
}
