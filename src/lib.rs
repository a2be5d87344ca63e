use std::sync::Arc;

use anyhow::Context;
use lex::Lex;
use parse::Parser;

pub mod clear;
pub mod cmd;
pub mod depends;
pub mod lctx;
pub mod lex;
pub mod mctx;
pub mod parse;
pub mod print;
pub mod tactic;
pub mod tt;

pub use clear::{clear, ClearError, Dependent};
pub use lex::File;
pub use print::PrintOptions;
pub use tactic::{ProofState, TacticResult};

/// Runs a goal script and renders the goals left open at its end.
pub fn process(file: Arc<File>) -> anyhow::Result<String> {
    process_with_options(file, PrintOptions::default())
}

pub fn process_with_options(file: Arc<File>, options: PrintOptions) -> anyhow::Result<String> {
    let mut eval = cmd::Eval::default();

    let mut lex = Lex::new(file);

    while !lex.is_eof() {
        let cmd = match Parser::new(&mut lex, &eval.tt).cmd() {
            Ok(cmd) => cmd,
            Err(e) => {
                return Err(e).context("parse error");
            }
        };
        eval.run_cmd(cmd).context("command error")?;
    }

    Ok(eval.goals(options).to_string())
}
