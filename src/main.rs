use std::io::Read;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context};
use clearhyp::{File, PrintOptions};

const USAGE: &str = "\
Usage: clearhyp [OPTIONS] [FILE]

Runs a goal script and prints the goals left open.
Reads the script from standard input when FILE is omitted.

Options:
      --show-ids  Print hypothesis and goal identifiers
  -h, --help      Print help
  -v, --version   Print version
";

enum Action {
    Run {
        path: Option<String>,
        options: PrintOptions,
    },
    Help,
    Version,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> anyhow::Result<Action> {
    let mut path = None;
    let mut options = PrintOptions::default();
    for arg in args {
        match arg.as_str() {
            "-h" | "--help" => return Ok(Action::Help),
            "-v" | "--version" => return Ok(Action::Version),
            "--show-ids" => options.show_ids = true,
            s if s.starts_with('-') && s != "-" => bail!("unknown option `{s}`\n\n{USAGE}"),
            _ if path.is_some() => bail!("unexpected argument `{arg}`\n\n{USAGE}"),
            _ => path = Some(arg),
        }
    }
    Ok(Action::Run { path, options })
}

fn read_input(path: Option<String>) -> anyhow::Result<File> {
    match path {
        Some(path) if path != "-" => {
            let contents =
                std::fs::read_to_string(&path).with_context(|| format!("failed to read `{path}`"))?;
            Ok(File::new(path, contents))
        }
        _ => {
            let mut contents = String::new();
            std::io::stdin()
                .read_to_string(&mut contents)
                .context("failed to read standard input")?;
            Ok(File::new("<stdin>", contents))
        }
    }
}

fn run() -> anyhow::Result<()> {
    match parse_args(std::env::args().skip(1))? {
        Action::Help => print!("{USAGE}"),
        Action::Version => println!("clearhyp {}", env!("CARGO_PKG_VERSION")),
        Action::Run { path, options } => {
            let file = read_input(path)?;
            log::info!("processing {}", file.name());
            let output = clearhyp::process_with_options(Arc::new(file), options)?;
            print!("{output}");
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:?}");
            ExitCode::FAILURE
        }
    }
}
