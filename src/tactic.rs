//! Proof states and the `clear` tactic as seen by a tactic language.

use crate::clear::{clear, ClearError};
use crate::lctx::{LocalContext, UserNameLookup};
use crate::mctx::MetavarContext;
use crate::tt::{FVarId, MVarId, Name, Term};

#[derive(Debug, Clone, Default)]
pub struct ProofState {
    mctx: MetavarContext,
    /// Open goals, the main goal first.
    goals: Vec<MVarId>,
}

impl ProofState {
    /// A state with a single goal `⊢ target` under the empty context.
    pub fn new(target: Term) -> Self {
        let mut state = ProofState::default();
        state.add_goal(LocalContext::new(), target);
        state
    }

    pub fn from_parts(mctx: MetavarContext, goals: Vec<MVarId>) -> Self {
        ProofState { mctx, goals }
    }

    pub fn mctx(&self) -> &MetavarContext {
        &self.mctx
    }

    pub fn goals(&self) -> &[MVarId] {
        &self.goals
    }

    pub fn fresh_fvar_id(&mut self) -> FVarId {
        self.mctx.fresh_fvar_id()
    }

    /// Opens a new goal after the existing ones.
    pub fn add_goal(&mut self, lctx: LocalContext, target: Term) -> MVarId {
        let goal = self.mctx.mk_metavar_decl(lctx, target);
        self.goals.push(goal);
        goal
    }

    pub fn main_goal(&self) -> Result<MVarId, ClearError> {
        self.goals.first().copied().ok_or(ClearError::NoGoals)
    }

    /// Clears `h` from the main goal. `self` is left untouched.
    pub fn clear_by_identifier(&self, h: FVarId) -> Result<ProofState, ClearError> {
        let goal = self.main_goal()?;
        let mut mctx = self.mctx.clone();
        let new_goal = clear(&mut mctx, goal, h)?;
        let mut goals = self.goals.clone();
        goals[0] = new_goal;
        Ok(ProofState { mctx, goals })
    }

    /// Clears the hypothesis of the main goal called `name`.
    ///
    /// The name must denote exactly one hypothesis.
    pub fn clear_by_name(&self, name: &str) -> Result<ProofState, ClearError> {
        let goal = self.main_goal()?;
        let decl = self.mctx.get_decl(goal)?;
        let Ok(user_name) = Name::intern(name) else {
            return Err(ClearError::not_found(name));
        };
        match decl.lctx.lookup_user_name(&user_name) {
            UserNameLookup::Found(found) => {
                log::debug!("'{name}' resolves to ${} in ?{goal}", found.id);
                self.clear_by_identifier(found.id)
            }
            UserNameLookup::Ambiguous(count) => {
                log::debug!("'{name}' is shared by {count} hypotheses of ?{goal}");
                Err(ClearError::NotFound {
                    hypothesis: name.to_owned(),
                    ambiguous: true,
                })
            }
            UserNameLookup::Missing => Err(ClearError::not_found(name)),
        }
    }

    /// The term built so far for `goal`, with every solved metavariable substituted.
    pub fn proof_term(&self, goal: MVarId) -> Term {
        self.mctx.mk_proof(goal)
    }
}

/// Outcome of a tactic step. A failed step hands back the state it started from.
#[derive(Debug, Clone)]
pub enum TacticResult {
    Success(ProofState),
    Exception { error: ClearError, state: ProofState },
}

impl TacticResult {
    pub fn run(
        state: &ProofState,
        step: impl FnOnce(&ProofState) -> Result<ProofState, ClearError>,
    ) -> TacticResult {
        match step(state) {
            Ok(next) => TacticResult::Success(next),
            Err(error) => TacticResult::Exception {
                error,
                state: state.clone(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TacticResult::Success(_))
    }

    /// The state to continue from, whether the step succeeded or not.
    pub fn state(&self) -> &ProofState {
        match self {
            TacticResult::Success(state) | TacticResult::Exception { state, .. } => state,
        }
    }

    pub fn into_result(self) -> Result<ProofState, ClearError> {
        match self {
            TacticResult::Success(state) => Ok(state),
            TacticResult::Exception { error, .. } => Err(error),
        }
    }
}

pub fn clear_by_name(name: &str, state: &ProofState) -> TacticResult {
    TacticResult::run(state, |state| state.clear_by_name(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clear::Dependent;
    use crate::lctx::LocalDecl;
    use crate::tt::{mk_app, mk_const, mk_local, mk_mvar, mk_prop, BinderInfo};

    fn c(name: &str) -> Term {
        mk_const(Name::intern(name).unwrap())
    }

    fn hyp(state: &mut ProofState, lctx: &mut LocalContext, name: &str, ty: Term) -> FVarId {
        let id = state.fresh_fvar_id();
        lctx.push(LocalDecl {
            id,
            user_name: Name::intern(name).unwrap(),
            binder_info: BinderInfo::Default,
            ty,
            value: None,
        })
        .unwrap();
        id
    }

    fn hyp_names(state: &ProofState, goal: MVarId) -> Vec<String> {
        let decl = state.mctx().get_decl(goal).unwrap();
        decl.lctx.iter().map(|d| d.user_name.to_string()).collect()
    }

    #[test]
    fn clear_by_name_replaces_the_main_goal() {
        let mut state = ProofState::default();
        let mut lctx = LocalContext::new();
        let x = hyp(&mut state, &mut lctx, "x", c("Nat"));
        hyp(&mut state, &mut lctx, "h", mk_app(c("Pos"), mk_local(x)));
        let goal = state.add_goal(lctx, mk_app(c("P"), mk_local(x)));

        let next = state.clear_by_name("h").unwrap();

        assert_eq!(next.goals().len(), 1);
        let new_goal = next.main_goal().unwrap();
        assert_ne!(new_goal, goal);
        assert_eq!(hyp_names(&next, new_goal), vec!["x"]);
        assert_eq!(next.proof_term(goal), mk_mvar(new_goal));
        // the input state is a value and is not affected
        assert_eq!(state.main_goal().unwrap(), goal);
        assert!(!state.mctx().is_assigned(goal));
    }

    #[test]
    fn unknown_name() {
        let mut state = ProofState::default();
        let mut lctx = LocalContext::new();
        let x = hyp(&mut state, &mut lctx, "x", c("Nat"));
        state.add_goal(lctx, c("Eq").apply([mk_local(x), mk_local(x)]));
        let err = state.clear_by_name("y").unwrap_err();
        insta::assert_snapshot!(err, @"clear tactic failed, unknown 'y' hypothesis");
        let err = state.clear_by_name("not a name").unwrap_err();
        assert!(matches!(err, ClearError::NotFound { ambiguous: false, .. }));
    }

    #[test]
    fn ambiguous_name() {
        let mut state = ProofState::default();
        let mut lctx = LocalContext::new();
        hyp(&mut state, &mut lctx, "h", c("True"));
        hyp(&mut state, &mut lctx, "h", c("False"));
        state.add_goal(lctx, mk_prop());
        let err = state.clear_by_name("h").unwrap_err();
        insta::assert_snapshot!(err, @"clear tactic failed, ambiguous 'h' hypothesis");
    }

    #[test]
    fn no_goals() {
        let state = ProofState::default();
        assert_eq!(state.clear_by_name("h").unwrap_err(), ClearError::NoGoals);
        assert_eq!(
            state.clear_by_identifier(FVarId(0)).unwrap_err(),
            ClearError::NoGoals
        );
        insta::assert_snapshot!(ClearError::NoGoals, @"clear tactic failed, there are no goals to be proved");
    }

    #[test]
    fn only_the_main_goal_changes() {
        let mut state = ProofState::default();
        let mut lctx = LocalContext::new();
        let h = hyp(&mut state, &mut lctx, "h", c("True"));
        state.add_goal(lctx.clone(), mk_prop());
        let sibling = state.add_goal(lctx, mk_app(c("P"), mk_local(h)));

        let next = state.clear_by_identifier(h).unwrap();

        assert_eq!(next.goals()[1], sibling);
        assert_eq!(hyp_names(&next, sibling), vec!["h"]);
        assert!(hyp_names(&next, next.goals()[0]).is_empty());
        assert!(!next.mctx().is_assigned(sibling));
    }

    #[test]
    fn exception_keeps_the_input_state() {
        let mut state = ProofState::default();
        let mut lctx = LocalContext::new();
        let h = hyp(&mut state, &mut lctx, "h", c("True"));
        let goal = state.add_goal(lctx, c("Eq").apply([mk_local(h), mk_local(h)]));

        let result = clear_by_name("h", &state);

        assert!(!result.is_success());
        let TacticResult::Exception { error, state: after } = result else {
            panic!("clear should have failed");
        };
        assert!(matches!(
            error,
            ClearError::StillInUse {
                dependent: Dependent::Target,
                ..
            }
        ));
        assert_eq!(after.goals(), &[goal]);
        assert_eq!(after.mctx().num_decls(), state.mctx().num_decls());
    }

    #[test]
    fn new_state_has_one_goal() {
        let state = ProofState::new(mk_prop());
        let goal = state.main_goal().unwrap();
        assert_eq!(state.goals(), &[goal]);
        let result = clear_by_name("x", &state);
        assert!(result.state().mctx().find_decl(goal).is_some());
        assert!(result.into_result().is_err());
    }

    #[test]
    fn state_from_an_existing_store() {
        // ⊢ P ?42 where ?42 was never declared
        let mut mctx = MetavarContext::new();
        let h = mctx.fresh_fvar_id();
        let mut lctx = LocalContext::new();
        lctx.push(LocalDecl {
            id: h,
            user_name: Name::intern("h").unwrap(),
            binder_info: BinderInfo::Default,
            ty: c("True"),
            value: None,
        })
        .unwrap();
        let goal = mctx.mk_metavar_decl(lctx, mk_app(c("P"), mk_mvar(MVarId(42))));
        let state = ProofState::from_parts(mctx, vec![goal]);

        assert_eq!(state.main_goal().unwrap(), goal);
        let err = state.clear_by_name("h").unwrap_err();
        assert!(matches!(err, ClearError::Malformed(_)));
        assert_eq!(state.goals(), &[goal]);
    }
}
