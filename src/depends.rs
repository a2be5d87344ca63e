//! Deciding whether a hypothesis is still used.
//!
//! The search is local: it starts from the terms it is given and only follows the
//! metavariables those terms mention. Other goals are never visited.

use std::collections::HashMap;

use crate::lctx::{LocalContext, LocalDecl};
use crate::mctx::{MetavarContext, MetavarError};
use crate::tt::{FVarId, MVarId, Term};

pub struct DependencyChecker<'a> {
    mctx: &'a MetavarContext,
    x: FVarId,
    // `None` while the metavariable is being visited.
    cache: HashMap<MVarId, Option<bool>>,
}

impl<'a> DependencyChecker<'a> {
    /// A checker answering queries about the hypothesis `x`.
    pub fn new(mctx: &'a MetavarContext, x: FVarId) -> Self {
        DependencyChecker {
            mctx,
            x,
            cache: HashMap::new(),
        }
    }

    /// Whether `x` occurs in `m`, looking through the metavariables `m` mentions.
    ///
    /// Fails if `m` reaches a metavariable the store does not know.
    pub fn term_depends_on(&mut self, m: &Term) -> Result<bool, MetavarError> {
        if m.has_local(self.x) {
            return Ok(true);
        }
        if !m.metadata().has_mvar {
            return Ok(false);
        }
        for mvar in m.mvars() {
            if self.metavar_depends_on(mvar)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Returns the first declaration at or after `from` whose type or value depends on `x`.
    pub fn context_depends_on<'l>(
        &mut self,
        lctx: &'l LocalContext,
        from: usize,
    ) -> Result<Option<&'l LocalDecl>, MetavarError> {
        for decl in lctx.iter().skip(from) {
            for m in decl.terms() {
                if self.term_depends_on(m)? {
                    log::trace!("'{}' depends on ${}", decl.user_name, self.x);
                    return Ok(Some(decl));
                }
            }
        }
        Ok(None)
    }

    /// Whether the metavariable `mvar` may stand for a term mentioning `x`.
    ///
    /// An assigned metavariable depends on `x` iff its assignment does. An unassigned one
    /// depends on `x` as soon as `x` is visible in its context, since it may be solved by a
    /// term using `x` later on.
    pub fn metavar_depends_on(&mut self, mvar: MVarId) -> Result<bool, MetavarError> {
        match self.cache.get(&mvar) {
            Some(Some(result)) => return Ok(*result),
            // cycles cannot arise from well-formed contexts; cut them anyway.
            Some(None) => return Ok(false),
            None => {}
        }
        self.cache.insert(mvar, None);
        let result = self.visit_metavar(mvar);
        match &result {
            Ok(result) => {
                log::trace!("?{mvar} depends on ${}: {result}", self.x);
                self.cache.insert(mvar, Some(*result));
            }
            Err(_) => {
                self.cache.remove(&mvar);
            }
        }
        result
    }

    fn visit_metavar(&mut self, mvar: MVarId) -> Result<bool, MetavarError> {
        let mctx = self.mctx;
        let decl = mctx.get_decl(mvar)?;
        if let Some(value) = mctx.get_assignment(mvar) {
            return self.term_depends_on(value);
        }
        if decl.lctx.contains(self.x) {
            return Ok(true);
        }
        Ok(self.term_depends_on(&decl.ty)? || self.context_depends_on(&decl.lctx, 0)?.is_some())
    }
}
