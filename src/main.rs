use std::{env::args, path::{Path, PathBuf}, time::Duration};

use pretty_env_logger::formatted_builder;
use rand::seq::SliceRandom;
use satrio::{
    bench::{self, run_benchmark, BenchConfig, Task, TaskId, TaskResult, Verdict},
    parser::{self, parse_file},
    prelude::*,
    report::Report,
    solver::{solve, Algorithm, Deadline},
};

fn usage_string() -> String {
    format!(
        "Usage: {} <algorithm> <command>

algorithm: dp, dpll, resolution

command:
    check <file_name> - solve a single DIMACS CNF file
    bench <cnf_dir> [--workers N] [--timeout SECS] [--sample-per-block N]
                      - benchmark the algorithm over a corpus directory",
        args().next().unwrap()
    )
}

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("Unknown algorithm '{}'\n\n{}", name, usage_string()))]
    UnknownAlgorithm { name: String },
    #[snafu(display("Unknown command '{}'\n\n{}", name, usage_string()))]
    UnknownCommand { name: String },
    #[snafu(display("Unknown flag '{}'\n\n{}", name, usage_string()))]
    UnknownFlag { name: String },
    #[snafu(display("Flag '{}' expects a positive integer", name))]
    MalformedFlag {
        name: String,
        source: std::num::ParseIntError,
    },
    #[snafu(display("Failed to parse CNF"))]
    ParserError { source: parser::Error },
    #[snafu(display("Failed to read corpus directory '{}'", path.display()))]
    CorpusIoError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("No .cnf files in '{}'", path.display()))]
    EmptyCorpus { path: PathBuf },
    #[snafu(display("Benchmark run failed"))]
    BenchError { source: bench::Error },
    #[snafu(display("Required argument does not exist\n\n{}", usage_string()))]
    MissingArgument,
}

fn check_command(algorithm: Algorithm, path: &Path) -> Result<(), Error> {
    let formula = parse_file(path).context(ParserError)?;

    let deadline = Deadline::unbounded();
    // an unbounded deadline is never observed mid-run
    let outcome = solve(formula, algorithm, &deadline).unwrap();

    match outcome.model() {
        Some(model) => println!("SAT {}", model),
        None if outcome.is_sat() => println!("SAT"),
        None => println!("UNSAT"),
    }
    println!("Time elapsed: {:.3}s", deadline.elapsed().as_secs_f64());

    Ok(())
}

/// Collects `*.cnf` files under `dir`, sorted by name for a
/// reproducible task order.
fn corpus_files(dir: &Path) -> Result<Vec<PathBuf>, Error> {
    let entries = std::fs::read_dir(dir).context(CorpusIoError {
        path: dir.to_owned(),
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .context(CorpusIoError {
                path: dir.to_owned(),
            })?
            .path();
        if path.extension().map_or(false, |ext| ext == "cnf") {
            files.push(path);
        }
    }
    files.sort();

    ensure!(
        !files.is_empty(),
        EmptyCorpus {
            path: dir.to_owned(),
        }
    );

    Ok(files)
}

/// Splits the corpus into 10 equal blocks and samples `per_block`
/// files from each, so the sample covers easy and hard instances
/// alike when the corpus is sorted by difficulty.
fn sample_per_block(files: Vec<PathBuf>, per_block: usize) -> Vec<PathBuf> {
    const BLOCKS: usize = 10;

    let block_size = files.len() / BLOCKS;
    if block_size == 0 {
        return files;
    }

    let mut rng = rand::thread_rng();
    let mut samples = Vec::new();
    for block in 0..BLOCKS {
        let start = block * block_size;
        let end = if block + 1 == BLOCKS {
            files.len()
        } else {
            start + block_size
        };
        samples.extend(
            files[start..end]
                .choose_multiple(&mut rng, per_block)
                .cloned(),
        );
    }
    samples.sort();
    samples
}

fn print_summary(files: &[PathBuf], results: &[TaskResult]) {
    let file_name = |id: TaskId| {
        files[usize::from(id)]
            .file_name()
            .unwrap()
            .to_string_lossy()
            .into_owned()
    };

    for result in results {
        match result.verdict {
            Verdict::Error => println!(
                "{}: ERROR ({})",
                file_name(result.id),
                result.diagnostic.as_deref().unwrap_or("unknown")
            ),
            verdict => println!(
                "{}: {} in {:.3}s",
                file_name(result.id),
                verdict,
                result.elapsed.as_secs_f64()
            ),
        }
    }

    let count = |verdict: Verdict| {
        results
            .iter()
            .filter(|result| result.verdict == verdict)
            .count()
    };
    let total: Duration = results.iter().map(|result| result.elapsed).sum();
    let average = total.as_secs_f64() / results.len() as f64;

    let decided: Vec<&TaskResult> = results
        .iter()
        .filter(|result| matches!(result.verdict, Verdict::Sat | Verdict::Unsat))
        .collect();
    let fastest = decided.iter().min_by_key(|result| result.elapsed);
    let slowest = decided.iter().max_by_key(|result| result.elapsed);

    println!("\n=== Summary ===");
    println!("Files tested           : {}", results.len());
    println!("Satisfiable            : {}", count(Verdict::Sat));
    println!("Unsatisfiable          : {}", count(Verdict::Unsat));
    println!("Timed out              : {}", count(Verdict::Timeout));
    println!("Errors                 : {}", count(Verdict::Error));
    println!("Total time             : {:.3}s", total.as_secs_f64());
    println!("Average time           : {:.3}s", average);
    if let Some(result) = fastest {
        println!(
            "Fastest solve time     : {:.3}s ({})",
            result.elapsed.as_secs_f64(),
            file_name(result.id)
        );
    }
    if let Some(result) = slowest {
        println!(
            "Slowest solve time     : {:.3}s ({})",
            result.elapsed.as_secs_f64(),
            file_name(result.id)
        );
    }
}

struct BenchArgs {
    dir: PathBuf,
    workers: Option<usize>,
    timeout: Duration,
    sample_per_block: Option<usize>,
}

fn parse_bench_args(args: &[String]) -> Result<BenchArgs, Error> {
    let dir = PathBuf::from(args.get(0).context(MissingArgument)?);
    let mut workers = None;
    let mut timeout = Duration::from_secs(60);
    let mut sample = None;

    let mut iter = args[1..].iter();
    while let Some(flag) = iter.next() {
        let value = iter.next().context(MissingArgument)?;
        let parsed = value.parse::<usize>().context(MalformedFlag {
            name: flag.clone(),
        })?;
        match flag.as_str() {
            "--workers" => workers = Some(parsed),
            "--timeout" => timeout = Duration::from_secs(parsed as u64),
            "--sample-per-block" => sample = Some(parsed),
            name => {
                return UnknownFlag {
                    name: name.to_owned(),
                }
                .fail()
            }
        }
    }

    Ok(BenchArgs {
        dir,
        workers,
        timeout,
        sample_per_block: sample,
    })
}

fn bench_command(algorithm: Algorithm, args: &[String]) -> Result<(), Error> {
    let bench_args = parse_bench_args(args)?;

    let mut files = corpus_files(&bench_args.dir)?;
    if let Some(per_block) = bench_args.sample_per_block {
        files = sample_per_block(files, per_block);
    }

    // Malformed input aborts here, before any task executes.
    let mut tasks = Vec::with_capacity(files.len());
    for (index, path) in files.iter().enumerate() {
        let formula = parse_file(path).context(ParserError)?;
        tasks.push(Task {
            id: TaskId::from(index),
            formula,
            algorithm,
            budget: bench_args.timeout,
        });
    }

    let mut config = BenchConfig::default();
    if let Some(workers) = bench_args.workers {
        config.workers = workers;
    }

    println!(
        "Benchmarking {} with {} files and {} workers...\n",
        algorithm,
        tasks.len(),
        config.workers
    );

    let results = run_benchmark(tasks, config).context(BenchError)?;
    print_summary(&files, &results);

    Ok(())
}

fn dispatch_command(algorithm: Algorithm, args: Vec<String>) -> Result<(), Error> {
    match args.get(0).map(|s| s.as_str()) {
        Some("check") => {
            let path = args.get(1).context(MissingArgument)?;
            check_command(algorithm, path.as_ref())?;
        }
        Some("bench") => {
            bench_command(algorithm, &args[1..])?;
        }
        Some(name) => UnknownCommand {
            name: name.to_owned(),
        }
        .fail()?,
        None => MissingArgument.fail()?,
    }

    Ok(())
}

fn init_logger() {
    let mut builder = formatted_builder();

    if let Ok(s) = ::std::env::var("RUST_LOG") {
        builder.parse_filters(&s);
    } else {
        if cfg!(debug_assertions) {
            builder.parse_filters("satrio=debug");
        } else {
            builder.parse_filters("satrio=warn");
        }
    }

    builder.try_init().expect("Failed to initialize the logger");
}

fn main() -> Result<(), Report> {
    init_logger();

    let mut args = args();

    // drop arg[0]
    args.next();

    // algorithm name
    let algorithm_name = args.next();
    let remaining: Vec<_> = args.collect();

    match algorithm_name.as_deref() {
        Some(name) => match name.parse::<Algorithm>() {
            Ok(algorithm) => dispatch_command(algorithm, remaining)?,
            Err(()) => UnknownAlgorithm {
                name: name.to_owned(),
            }
            .fail()?,
        },
        None => {
            println!("{}", usage_string());
        }
    }

    Ok(())
}
