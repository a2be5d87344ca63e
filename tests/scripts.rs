use std::{
    ffi::OsStr,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use clearhyp::{File, PrintOptions};

#[ctor::ctor]
fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn format_error(err: &anyhow::Error) -> String {
    let mut lines = vec!["error chain:".to_string()];
    for cause in err.chain() {
        lines.push(format!("  - {cause}"));
    }
    lines.join("\n")
}

fn load(name: &str) -> Arc<File> {
    let path = Path::new("tests/scripts").join(format!("{name}.clear"));
    let input = fs::read_to_string(&path)
        .unwrap_or_else(|err| panic!("failed to read {}: {err}", path.display()));
    Arc::new(File::new(path.display().to_string(), input))
}

fn run(name: &str) -> String {
    match clearhyp::process(load(name)) {
        Ok(output) => output,
        Err(err) => panic!("expected {name} to succeed\n{}", format_error(&err)),
    }
}

fn run_err(name: &str) -> String {
    match clearhyp::process(load(name)) {
        Ok(output) => panic!("expected {name} to fail, got\n{output}"),
        Err(err) => format_error(&err),
    }
}

fn run_source(input: &str) -> anyhow::Result<String> {
    clearhyp::process(Arc::new(File::new("<inline>", input)))
}

#[test]
fn scenario_a_clears_unused_hypothesis() {
    insta::assert_snapshot!(run("scenario_a"), @r###"
    x y : Nat
    ⊢ x + y = y + x
    "###);
}

#[test]
fn scenario_b_later_hypothesis_depends() {
    insta::assert_snapshot!(run_err("scenario_b"), @r###"
    error chain:
      - command error
      - failed to clear 'h'
      - clear tactic failed, hypothesis 'h2' depends on 'h'
    "###);
}

#[test]
fn scenario_c_unknown_hypothesis() {
    insta::assert_snapshot!(run_err("scenario_c"), @r###"
    error chain:
      - command error
      - failed to clear 'y'
      - clear tactic failed, unknown 'y' hypothesis
    "###);
}

#[test]
fn scenario_d_target_depends() {
    insta::assert_snapshot!(run_err("scenario_d"), @r###"
    error chain:
      - command error
      - failed to clear 'h'
      - clear tactic failed, target type depends on 'h'
    "###);
}

#[test]
fn goals_before_clear() {
    let output = run_source(
        "infixl + : 65 := HAdd.hAdd\n\
         infix > : 50 := GT.gt\n\
         goal (x : Nat) (h : x > 0) (y : Nat) (z : Nat := x + y) : P z\n",
    )
    .unwrap();
    insta::assert_snapshot!(output, @r###"
    x : Nat
    h : x > 0
    y : Nat
    z : Nat := x + y
    ⊢ P z
    "###);
}

#[test]
fn let_bound_hypotheses() {
    insta::assert_snapshot!(run("let_hyp"), @r###"
    x y : Nat
    ⊢ P x
    "###);

    // z's value mentions x
    let err = run_source(
        "infixl + : 65 := HAdd.hAdd\n\
         goal (x y : Nat) (z : Nat := x + y) : Prop\n\
         clear x\n",
    )
    .unwrap_err();
    assert_eq!(
        err.root_cause().to_string(),
        "clear tactic failed, hypothesis 'z' depends on 'x'"
    );
}

#[test]
fn clearing_several_hypotheses_starts_from_the_last() {
    insta::assert_snapshot!(run("dependents"), @r###"
    x : Nat
    ⊢ Q x
    "###);

    // in the other order h is still needed by h2 when it is cleared
    let err = run_source("goal (x : Nat) (h : P x) (h2 : Q h) : Prop\nclear h2 h\n").unwrap_err();
    assert_eq!(
        err.root_cause().to_string(),
        "clear tactic failed, hypothesis 'h2' depends on 'h'"
    );
}

#[test]
fn failed_clear_is_all_or_nothing() {
    // `clear x h` clears h, then fails on x; h has to come back
    let mut eval = clearhyp::cmd::Eval::default();
    let file = Arc::new(File::new(
        "<inline>",
        "goal (x : Nat) (h : True) (y : P x) : Prop\nclear x h\n",
    ));
    let mut lex = clearhyp::lex::Lex::new(file);
    let goal = clearhyp::parse::Parser::new(&mut lex, &eval.tt).cmd().unwrap();
    eval.run_cmd(goal).unwrap();
    let clear = clearhyp::parse::Parser::new(&mut lex, &eval.tt).cmd().unwrap();
    assert!(eval.run_cmd(clear).is_err());
    insta::assert_snapshot!(eval.goals(PrintOptions::default()), @r###"
    x : Nat
    h : True
    y : P x
    ⊢ Prop
    "###);
}

#[test]
fn only_the_main_goal_is_cleared() {
    insta::assert_snapshot!(run("siblings"), @r###"
    ⊢ Prop

    h : True
    ⊢ P h
    "###);
}

#[test]
fn binder_annotations_and_ids() {
    insta::assert_snapshot!(run("binders"), @r###"
    α : Type
    a : α
    ⊢ ∀ (b : α), a = b
    "###);

    let output = clearhyp::process_with_options(
        load("binders"),
        PrintOptions { show_ids: true },
    )
    .unwrap();
    insta::assert_snapshot!(output, @r###"
    goal ?1
    α$0 : Type
    a$2 : α$0
    ⊢ ∀ (b : α$0), a$2 = b
    "###);
}

#[test]
fn shadowed_hypotheses_stay_distinguishable() {
    let output = run_source("goal (x : Nat) (h : P x) (x : Nat) : P x\nclear h\n").unwrap();
    insta::assert_snapshot!(output, @r###"
    x✝ x : Nat
    ⊢ P x
    "###);
}

#[test]
fn ambiguous_names_are_rejected() {
    let err = run_source("goal (h : True) (h : False) : Prop\nclear h\n").unwrap_err();
    assert_eq!(
        err.root_cause().to_string(),
        "clear tactic failed, ambiguous 'h' hypothesis"
    );
}

#[test]
fn no_goals() {
    insta::assert_snapshot!(run_source("").unwrap(), @"no goals");
    let err = run_source("clear h").unwrap_err();
    assert_eq!(
        err.root_cause().to_string(),
        "clear tactic failed, there are no goals to be proved"
    );
}

#[test]
fn parse_errors_point_at_the_source() {
    let err = run_source("goal (x : Nat) x").unwrap_err();
    let report = format_error(&err);
    assert!(report.contains("  - parse error\n"), "{report}");
    assert!(report.contains("expected ':' or '⊢' at <inline>:1:16"), "{report}");
}

fn fixtures() -> Vec<PathBuf> {
    let dir = Path::new("tests/scripts");
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => panic!("failed to read {dir:?}: {err}"),
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            (path.extension() == Some(OsStr::new("clear"))).then_some(path)
        })
        .collect();
    files.sort();
    files
}

#[test]
fn every_script_parses() {
    let files = fixtures();
    assert!(!files.is_empty(), "no .clear fixtures found in tests/scripts");
    for path in files {
        let input = fs::read_to_string(&path)
            .unwrap_or_else(|err| panic!("failed to read {}: {err}", path.display()));
        let file = Arc::new(File::new(path.display().to_string(), input));
        if let Err(err) = clearhyp::process(file) {
            let report = format_error(&err);
            assert!(
                !report.contains("parse error"),
                "{} does not parse\n{report}",
                path.display()
            );
        }
    }
}
