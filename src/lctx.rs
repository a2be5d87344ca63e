//! Local contexts: telescopes of hypotheses attached to a goal.

use std::fmt::Display;

use thiserror::Error;

use crate::tt::{mk_local, BinderInfo, FVarId, Name, Term};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalDecl {
    pub id: FVarId,
    pub user_name: Name,
    pub binder_info: BinderInfo,
    pub ty: Term,
    /// Present iff the hypothesis is let-bound.
    pub value: Option<Term>,
}

impl LocalDecl {
    pub fn mk_ref(&self) -> Term {
        mk_local(self.id)
    }

    pub fn is_let(&self) -> bool {
        self.value.is_some()
    }

    /// The terms this declaration carries, i.e. its type and its value if any.
    pub fn terms(&self) -> impl Iterator<Item = &Term> {
        std::iter::once(&self.ty).chain(self.value.as_ref())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocalContextError {
    #[error("hypothesis ${id} is already declared")]
    DuplicateId { id: FVarId },
    #[error("hypothesis '{user_name}' refers to ${target} which is not declared before it")]
    ForwardReference { user_name: Name, target: FVarId },
}

/// Result of resolving a user-facing name.
#[derive(Debug, Clone, Copy)]
pub enum UserNameLookup<'a> {
    Found(&'a LocalDecl),
    Ambiguous(usize),
    Missing,
}

/// An ordered telescope. Declarations may only mention declarations strictly before them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalContext {
    decls: Vec<LocalDecl>,
}

impl LocalContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `decl`, checking that its id is fresh and that it has no forward references.
    pub fn push(&mut self, decl: LocalDecl) -> Result<(), LocalContextError> {
        if self.contains(decl.id) {
            return Err(LocalContextError::DuplicateId { id: decl.id });
        }
        for m in decl.terms() {
            for x in m.locals() {
                if !self.contains(x) {
                    return Err(LocalContextError::ForwardReference {
                        user_name: decl.user_name.clone(),
                        target: x,
                    });
                }
            }
        }
        self.decls.push(decl);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LocalDecl> {
        self.decls.iter()
    }

    pub fn get(&self, index: usize) -> Option<&LocalDecl> {
        self.decls.get(index)
    }

    pub fn index_of(&self, id: FVarId) -> Option<usize> {
        self.decls.iter().position(|decl| decl.id == id)
    }

    pub fn find(&self, id: FVarId) -> Option<&LocalDecl> {
        self.decls.iter().find(|decl| decl.id == id)
    }

    pub fn contains(&self, id: FVarId) -> bool {
        self.find(id).is_some()
    }

    pub fn lookup_user_name(&self, user_name: &Name) -> UserNameLookup<'_> {
        let mut found = self.decls.iter().filter(|decl| decl.user_name == *user_name);
        match (found.next(), found.count()) {
            (None, _) => UserNameLookup::Missing,
            (Some(decl), 0) => UserNameLookup::Found(decl),
            (Some(_), rest) => UserNameLookup::Ambiguous(rest + 1),
        }
    }

    /// Returns a new context without the declaration at `index`. `self` is left untouched.
    ///
    /// The caller must make sure that no later declaration mentions the removed one.
    pub fn remove_at(&self, index: usize) -> LocalContext {
        let mut decls = Vec::with_capacity(self.decls.len().saturating_sub(1));
        decls.extend_from_slice(&self.decls[..index]);
        decls.extend_from_slice(&self.decls[index + 1..]);
        LocalContext { decls }
    }

    /// Checks that `self` is an order-preserving subsequence of `other` with identical declarations.
    pub fn is_subcontext_of(&self, other: &LocalContext) -> bool {
        let mut rest = other.decls.iter();
        self.decls
            .iter()
            .all(|decl| rest.by_ref().any(|candidate| candidate == decl))
    }

    /// FV(m) ⊆ dom(self)
    pub fn is_well_scoped(&self, m: &Term) -> bool {
        m.locals().into_iter().all(|x| self.contains(x))
    }
}

impl<'a> IntoIterator for &'a LocalContext {
    type Item = &'a LocalDecl;
    type IntoIter = std::slice::Iter<'a, LocalDecl>;

    fn into_iter(self) -> Self::IntoIter {
        self.decls.iter()
    }
}

impl Display for LocalContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for decl in &self.decls {
            write!(f, "({} ${} : {}", decl.user_name, decl.id, decl.ty)?;
            if let Some(value) = &decl.value {
                write!(f, " := {value}")?;
            }
            write!(f, ") ")?;
        }
        Ok(())
    }
}
