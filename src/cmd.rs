use anyhow::{bail, Context};

use crate::lctx::{LocalContext, LocalDecl};
use crate::parse::TokenTable;
use crate::print::{GoalsDisplay, OpTable, PrintOptions};
use crate::tactic::{self, ProofState, TacticResult};
use crate::tt::{BinderInfo, MVarId, Name, Term};

#[derive(Debug, Clone)]
pub enum Cmd {
    Infix(CmdInfix),
    Goal(CmdGoal),
    Clear(CmdClear),
}

#[derive(Clone, Debug)]
pub struct CmdInfix {
    pub fixity: Fixity,
    pub op: String,
    pub prec: usize,
    pub entity: Name,
}

/// `goal (x : A) {y : B x} (z : C := v) : target`
///
/// Hypothesis types, values and the target refer to earlier hypotheses through
/// bound variables: `#0` is the hypothesis declared last.
#[derive(Clone, Debug)]
pub struct CmdGoal {
    pub hyps: Vec<GoalHyp>,
    pub target: Term,
}

#[derive(Clone, Debug)]
pub struct GoalHyp {
    pub name: Name,
    pub binder_info: BinderInfo,
    pub ty: Term,
    pub value: Option<Term>,
}

/// `clear h₁ ⋯ hₙ` clears `hₙ` first, so that a hypothesis can be cleared together with
/// the ones depending on it.
#[derive(Clone, Debug)]
pub struct CmdClear {
    pub names: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fixity {
    Infix,
    Infixl,
    Infixr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operator {
    pub symbol: String,
    pub fixity: Fixity,
    pub prec: usize,
    pub entity: Name,
}

#[derive(Debug, Default)]
pub struct Eval {
    pub tt: TokenTable,
    pub pp: OpTable,
    pub state: ProofState,
}

impl Eval {
    pub fn run_cmd(&mut self, cmd: Cmd) -> anyhow::Result<()> {
        match cmd {
            Cmd::Infix(inner) => {
                let CmdInfix {
                    fixity,
                    op,
                    prec,
                    entity,
                } = inner;
                let op = Operator {
                    symbol: op,
                    fixity,
                    prec,
                    entity,
                };
                self.tt.add(op.clone())?;
                self.pp.add(op)?;
                Ok(())
            }
            Cmd::Goal(inner) => {
                self.open_goal(inner)?;
                Ok(())
            }
            Cmd::Clear(inner) => {
                let CmdClear { names } = inner;
                self.clear(&names)
            }
        }
    }

    fn open_goal(&mut self, cmd: CmdGoal) -> anyhow::Result<MVarId> {
        let CmdGoal { hyps, target } = cmd;
        let mut lctx = LocalContext::new();
        let mut locals = vec![];
        for hyp in hyps {
            let id = self.state.fresh_fvar_id();
            let decl = LocalDecl {
                id,
                user_name: hyp.name,
                binder_info: hyp.binder_info,
                ty: hyp.ty.open(&locals, 0),
                value: hyp.value.map(|value| value.open(&locals, 0)),
            };
            let local = decl.mk_ref();
            lctx.push(decl)?;
            locals.push(local);
        }
        let target = target.open(&locals, 0);
        if target.metadata().bound > 0 {
            bail!("target has loose bound variables: {target}");
        }
        let goal = self.state.add_goal(lctx, target);
        log::debug!("opened goal ?{goal} with {} hypotheses", locals.len());
        Ok(goal)
    }

    fn clear(&mut self, names: &[String]) -> anyhow::Result<()> {
        let mut state = self.state.clone();
        for name in names.iter().rev() {
            state = match tactic::clear_by_name(name, &state) {
                TacticResult::Success(next) => next,
                TacticResult::Exception { error, .. } => {
                    return Err(error).with_context(|| format!("failed to clear '{name}'"));
                }
            };
        }
        self.state = state;
        Ok(())
    }

    pub fn goals(&self, options: PrintOptions) -> GoalsDisplay<'_> {
        GoalsDisplay::new(&self.state, &self.pp, options)
    }
}
