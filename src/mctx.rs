//! The metavariable store.
//!
//! A [MetavarContext] is a value: tactics take one and produce another, so that
//! backtracking is just keeping the old value around.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::lctx::LocalContext;
use crate::tt::{mk_mvar, FVarId, MVarId, Term};

/// An open goal: prove `ty` under `lctx`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetavarDecl {
    pub lctx: LocalContext,
    pub ty: Term,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetavarError {
    #[error("unknown metavariable ?{0}")]
    UnknownMVar(MVarId),
    #[error("metavariable ?{0} is already assigned")]
    AlreadyAssigned(MVarId),
    #[error("assignment of ?{mvar} mentions undeclared metavariable ?{target}")]
    UnknownMVarRef { mvar: MVarId, target: MVarId },
    #[error("assignment of ?{mvar} mentions ${fvar} which is not in its local context")]
    OutOfScope { mvar: MVarId, fvar: FVarId },
    #[error("assignment of ?{0} would make it depend on itself")]
    Cycle(MVarId),
}

#[derive(Debug, Clone, Default)]
pub struct MetavarContext {
    decls: HashMap<MVarId, Arc<MetavarDecl>>,
    assignments: HashMap<MVarId, Term>,
    next_fvar: usize,
    next_mvar: usize,
}

impl MetavarContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh_fvar_id(&mut self) -> FVarId {
        let id = FVarId(self.next_fvar);
        self.next_fvar += 1;
        id
    }

    fn fresh_mvar_id(&mut self) -> MVarId {
        let id = MVarId(self.next_mvar);
        self.next_mvar += 1;
        id
    }

    /// Declares a fresh unassigned metavariable.
    pub fn mk_metavar_decl(&mut self, lctx: LocalContext, ty: Term) -> MVarId {
        let id = self.fresh_mvar_id();
        self.decls.insert(id, Arc::new(MetavarDecl { lctx, ty }));
        id
    }

    /// Undoes the `mk_metavar_decl` that returned `mvar`, which must not be referred to yet.
    /// The id is handed out again only if it was the last one allocated.
    pub(crate) fn discard_metavar_decl(&mut self, mvar: MVarId) {
        self.decls.remove(&mvar);
        if mvar.0 + 1 == self.next_mvar {
            self.next_mvar = mvar.0;
        }
    }

    pub fn find_decl(&self, mvar: MVarId) -> Option<&MetavarDecl> {
        self.decls.get(&mvar).map(Arc::as_ref)
    }

    pub fn get_decl(&self, mvar: MVarId) -> Result<&MetavarDecl, MetavarError> {
        self.find_decl(mvar).ok_or(MetavarError::UnknownMVar(mvar))
    }

    pub fn is_declared(&self, mvar: MVarId) -> bool {
        self.decls.contains_key(&mvar)
    }

    pub fn is_assigned(&self, mvar: MVarId) -> bool {
        self.assignments.contains_key(&mvar)
    }

    pub fn get_assignment(&self, mvar: MVarId) -> Option<&Term> {
        self.assignments.get(&mvar)
    }

    pub fn num_decls(&self) -> usize {
        self.decls.len()
    }

    /// Records `mvar := m`.
    ///
    /// Errors if `mvar` is unknown or already assigned, if `m` mentions an undeclared
    /// metavariable or a hypothesis outside of `mvar`'s context, or if `m` reaches `mvar`
    /// through assignments.
    pub fn assign(&mut self, mvar: MVarId, m: Term) -> Result<(), MetavarError> {
        let decl = self.get_decl(mvar)?;
        if self.is_assigned(mvar) {
            return Err(MetavarError::AlreadyAssigned(mvar));
        }
        for fvar in m.locals() {
            if !decl.lctx.contains(fvar) {
                return Err(MetavarError::OutOfScope { mvar, fvar });
            }
        }
        for target in m.mvars() {
            if !self.is_declared(target) {
                return Err(MetavarError::UnknownMVarRef { mvar, target });
            }
            if self.reaches(target, mvar) {
                return Err(MetavarError::Cycle(mvar));
            }
        }
        self.assignments.insert(mvar, m);
        Ok(())
    }

    // Whether `to` occurs in `from` or in what `from` is assigned to, transitively.
    fn reaches(&self, from: MVarId, to: MVarId) -> bool {
        let mut stack = vec![from];
        let mut visited = vec![];
        while let Some(mvar) = stack.pop() {
            if mvar == to {
                return true;
            }
            if visited.contains(&mvar) {
                continue;
            }
            visited.push(mvar);
            if let Some(m) = self.get_assignment(mvar) {
                stack.extend(m.mvars());
            }
        }
        false
    }

    /// Replaces every assigned metavariable in `m` by its (instantiated) assignment.
    ///
    /// Each metavariable is instantiated once per call; its occurrences share the result.
    pub fn instantiate_mvars(&self, m: &Term) -> Term {
        let cache = RefCell::new(HashMap::new());
        self.instantiate_mvars_with(m, &cache)
    }

    fn instantiate_mvars_with(&self, m: &Term, cache: &RefCell<HashMap<MVarId, Term>>) -> Term {
        m.replace_mvar(&|mvar| {
            if let Some(done) = cache.borrow().get(&mvar) {
                return Some(done.clone());
            }
            let value = self.get_assignment(mvar)?;
            let done = self.instantiate_mvars_with(value, cache);
            cache.borrow_mut().insert(mvar, done.clone());
            Some(done)
        })
    }

    /// The term `mvar` stands for, if it is (transitively) solved.
    pub fn mk_proof(&self, mvar: MVarId) -> Term {
        self.instantiate_mvars(&mk_mvar(mvar))
    }
}
