//! Removing a hypothesis from a goal.

use std::fmt::Display;

use thiserror::Error;

use crate::depends::DependencyChecker;
use crate::mctx::{MetavarContext, MetavarDecl, MetavarError};
use crate::tt::{mk_mvar, FVarId, MVarId, Name};

/// What keeps a hypothesis alive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dependent {
    Hypothesis { id: FVarId, user_name: Name },
    Target,
}

impl Display for Dependent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dependent::Hypothesis { user_name, .. } => write!(f, "hypothesis '{user_name}'"),
            Dependent::Target => write!(f, "target type"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClearError {
    #[error("clear tactic failed, {} '{hypothesis}' hypothesis", lookup_failure(.ambiguous))]
    NotFound { hypothesis: String, ambiguous: bool },
    #[error("clear tactic failed, {dependent} depends on '{hypothesis}'")]
    StillInUse {
        hypothesis: Name,
        dependent: Dependent,
    },
    #[error("clear tactic failed, there are no goals to be proved")]
    NoGoals,
    #[error("clear tactic failed, malformed metavariable context")]
    Malformed(#[from] MetavarError),
}

fn lookup_failure(ambiguous: &bool) -> &'static str {
    if *ambiguous {
        "ambiguous"
    } else {
        "unknown"
    }
}

impl ClearError {
    pub(crate) fn not_found(hypothesis: impl Display) -> Self {
        ClearError::NotFound {
            hypothesis: hypothesis.to_string(),
            ambiguous: false,
        }
    }
}

/// Computes the declaration of the goal that replaces `goal` once `h` is gone.
///
/// Only reads `mctx`.
pub fn plan_clear(
    mctx: &MetavarContext,
    goal: MVarId,
    h: FVarId,
) -> Result<MetavarDecl, ClearError> {
    let decl = mctx.get_decl(goal)?;
    if mctx.is_assigned(goal) {
        return Err(MetavarError::AlreadyAssigned(goal).into());
    }
    let lctx = &decl.lctx;
    let Some((index, found)) = lctx
        .index_of(h)
        .and_then(|index| Some((index, lctx.get(index)?)))
    else {
        return Err(ClearError::not_found(format!("${h}")));
    };
    let hypothesis = found.user_name.clone();

    let mut checker = DependencyChecker::new(mctx, h);
    if let Some(dependent) = checker.context_depends_on(lctx, index + 1)? {
        return Err(ClearError::StillInUse {
            hypothesis,
            dependent: Dependent::Hypothesis {
                id: dependent.id,
                user_name: dependent.user_name.clone(),
            },
        });
    }
    if checker.term_depends_on(&decl.ty)? {
        return Err(ClearError::StillInUse {
            hypothesis,
            dependent: Dependent::Target,
        });
    }

    Ok(MetavarDecl {
        lctx: lctx.remove_at(index),
        ty: decl.ty.clone(),
    })
}

/// Replaces the goal `goal` by a new goal whose context lacks `h`, and returns the new goal.
///
/// On success `goal` is assigned to the new metavariable. On failure `mctx` is left as it was.
pub fn clear(mctx: &mut MetavarContext, goal: MVarId, h: FVarId) -> Result<MVarId, ClearError> {
    let MetavarDecl { lctx, ty } = match plan_clear(mctx, goal, h) {
        Ok(decl) => decl,
        Err(err) => {
            log::debug!("clear ${h} from ?{goal}: {err}");
            return Err(err);
        }
    };
    let new_goal = mctx.mk_metavar_decl(lctx, ty);
    if let Err(err) = mctx.assign(goal, mk_mvar(new_goal)) {
        mctx.discard_metavar_decl(new_goal);
        log::debug!("clear ${h} from ?{goal}: {err}");
        return Err(err.into());
    }
    if log::log_enabled!(log::Level::Debug) {
        let remaining = mctx.get_decl(new_goal).map(|d| d.lctx.len()).unwrap_or(0);
        log::debug!("cleared ${h}: ?{goal} := ?{new_goal} ({remaining} hypotheses left)");
    }
    Ok(new_goal)
}
