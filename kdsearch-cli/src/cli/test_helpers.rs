//! Small helpers shared across CLI tests.

use std::{
    fs::File,
    io::{self, Write},
    path::PathBuf,
};

use tempfile::TempDir;

use super::{
    BuildCommand, Cli, CliError, Command, DistributedCommand, IndexArgs, InsertCommand,
    QueryCommand, StrategyArg, run_cli,
};

/// The worked example: two clusters of alternating labels and an outlier.
pub(super) const SCENARIO: &str = "1,1,0\n2,2,1\n3,3,0\n8,8,1\n";

pub(super) fn temp_dir() -> TempDir {
    match TempDir::new() {
        Ok(dir) => dir,
        Err(err) => panic!("failed to create temp dir: {err}"),
    }
}

pub(super) fn create_points_file(dir: &TempDir, name: &str, contents: &str) -> io::Result<PathBuf> {
    let path = dir.path().join(name);
    let mut file = File::create(&path)?;
    file.write_all(contents.as_bytes())?;
    Ok(path)
}

pub(super) fn index(path: PathBuf, strategy: StrategyArg) -> IndexArgs {
    IndexArgs {
        path,
        dimensions: None,
        strategy,
    }
}

pub(super) fn build(path: PathBuf, strategy: StrategyArg) -> Cli {
    Cli {
        command: Command::Build(BuildCommand {
            index: index(path, strategy),
            dump: false,
        }),
    }
}

pub(super) fn insert(base: PathBuf, additions: PathBuf, threads: usize) -> InsertCommand {
    InsertCommand {
        index: index(base, StrategyArg::Auto),
        points: additions,
        threads: threads.try_into().expect("thread count must be non-zero"),
        dump: false,
    }
}

pub(super) fn query(path: PathBuf, neighbours: usize, target: &str) -> QueryCommand {
    QueryCommand {
        index: index(path, StrategyArg::Auto),
        neighbours,
        target: target.parse().expect("test targets are well formed"),
    }
}

pub(super) fn distributed(
    path: PathBuf,
    neighbours: usize,
    target: &str,
    workers: usize,
) -> Cli {
    Cli {
        command: Command::Distributed(DistributedCommand {
            query: query(path, neighbours, target),
            workers: workers.try_into().expect("worker count must be non-zero"),
        }),
    }
}

pub(super) fn run_cli_expecting_error(cli: Cli, panic_msg: &str) -> CliError {
    match run_cli(cli) {
        Ok(_) => panic!("{panic_msg}"),
        Err(err) => err,
    }
}
