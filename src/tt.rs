use std::collections::HashMap;
use std::fmt::Display;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, Weak};

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

#[derive(Debug, Clone, Ord, PartialOrd)]
pub struct Name(Arc<String>);

static NAME_TABLE: Lazy<Mutex<HashMap<String, Weak<String>>>> = Lazy::new(Default::default);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid name: '{0}'")]
pub struct InvalidNameError(pub String);

impl TryFrom<&str> for Name {
    type Error = InvalidNameError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Name::intern(value)
    }
}

impl Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Name {
    pub fn intern(value: &str) -> Result<Name, InvalidNameError> {
        static RE: Lazy<Regex> = Lazy::new(|| {
            regex::Regex::new(r"^[\p{Cased_Letter}_][\p{Cased_Letter}\p{Number}_']*(\.[\p{Cased_Letter}_][\p{Cased_Letter}\p{Number}_']*)*$").unwrap()
        });
        if !RE.is_match(value) {
            return Err(InvalidNameError(value.to_owned()));
        }
        let mut table = NAME_TABLE.lock().unwrap();
        if let Some(existing) = table.get(value).and_then(|weak| weak.upgrade()) {
            return Ok(Name(existing));
        }
        let owned = Arc::new(value.to_owned());
        table.insert(value.to_owned(), Arc::downgrade(&owned));
        Ok(Name(owned))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Name {}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.0).hash(state);
    }
}

/// Identifier of a hypothesis. Allocated by [crate::mctx::MetavarContext], never reused.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct FVarId(pub(crate) usize);

/// Identifier of a metavariable. Allocated by [crate::mctx::MetavarContext], never reused.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct MVarId(pub(crate) usize);

impl Display for FVarId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Display for MVarId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BinderInfo {
    #[default]
    Default,
    Implicit,
    StrictImplicit,
    InstImplicit,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Literal {
    Nat(u64),
    Str(Arc<str>),
}

impl Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::Nat(n) => write!(f, "{n}"),
            Literal::Str(s) => write!(f, "{s:?}"),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct TermMetadata {
    // loose bound variables are all below this index
    pub bound: usize,
    pub has_local: bool,
    pub has_mvar: bool,
}

/// Locally nameless representation. See [Charguéraud, 2012].
/// Use syn's convention [https://docs.rs/syn/latest/syn/enum.Expr.html#syntax-tree-enums].
#[derive(Clone, Debug)]
pub enum Term {
    Var(Arc<TermVar>),
    Local(Arc<TermLocal>),
    Const(Arc<TermConst>),
    App(Arc<TermApp>),
    Lam(Arc<TermBinder>),
    Pi(Arc<TermBinder>),
    Let(Arc<TermLet>),
    Sort(Arc<TermSort>),
    MVar(Arc<TermMVar>),
    Lit(Arc<TermLit>),
}

#[derive(Clone, Debug)]
pub struct TermVar {
    pub metadata: TermMetadata,
    pub index: usize,
}

#[derive(Clone, Debug)]
pub struct TermLocal {
    pub metadata: TermMetadata,
    pub id: FVarId,
}

#[derive(Clone, Debug)]
pub struct TermConst {
    pub metadata: TermMetadata,
    pub name: Name,
}

#[derive(Clone, Debug)]
pub struct TermApp {
    pub metadata: TermMetadata,
    pub fun: Term,
    pub arg: Term,
}

#[derive(Clone, Debug)]
pub struct TermBinder {
    pub metadata: TermMetadata,
    // for pretty-printing
    pub binder_name: Option<Name>,
    pub binder_info: BinderInfo,
    pub binder_type: Term,
    pub body: Term,
}

#[derive(Clone, Debug)]
pub struct TermLet {
    pub metadata: TermMetadata,
    // for pretty-printing
    pub binder_name: Option<Name>,
    pub binder_type: Term,
    pub value: Term,
    pub body: Term,
}

#[derive(Clone, Debug)]
pub struct TermSort {
    pub metadata: TermMetadata,
    pub level: usize,
}

#[derive(Clone, Debug)]
pub struct TermMVar {
    pub metadata: TermMetadata,
    pub id: MVarId,
}

#[derive(Clone, Debug)]
pub struct TermLit {
    pub metadata: TermMetadata,
    pub value: Literal,
}

impl PartialEq for Term {
    fn eq(&self, other: &Self) -> bool {
        self.alpha_eq(other)
    }
}

impl Eq for Term {}

impl Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Term::Var(inner) => write!(f, "#{}", inner.index),
            Term::Local(inner) => write!(f, "${}", inner.id),
            Term::Const(inner) => write!(f, "{}", inner.name),
            Term::App(inner) => write!(f, "({} {})", inner.fun, inner.arg),
            Term::Lam(inner) => write!(f, "(λ {}, {})", inner.binder_type, inner.body),
            Term::Pi(inner) => write!(f, "(Π {}, {})", inner.binder_type, inner.body),
            Term::Let(inner) => write!(
                f,
                "(let {} := {}; {})",
                inner.binder_type, inner.value, inner.body
            ),
            Term::Sort(inner) => write!(f, "Sort {}", inner.level),
            Term::MVar(inner) => write!(f, "?{}", inner.id),
            Term::Lit(inner) => write!(f, "{}", inner.value),
        }
    }
}

fn join_metadata<'a>(children: impl IntoIterator<Item = (&'a Term, usize)>) -> TermMetadata {
    let mut metadata = TermMetadata::default();
    for (child, binders) in children {
        let m = child.metadata();
        metadata.bound = metadata.bound.max(m.bound.saturating_sub(binders));
        metadata.has_local |= m.has_local;
        metadata.has_mvar |= m.has_mvar;
    }
    metadata
}

pub fn mk_var(index: usize) -> Term {
    let metadata = TermMetadata {
        bound: index + 1,
        ..Default::default()
    };
    Term::Var(Arc::new(TermVar { metadata, index }))
}

pub fn mk_local(id: FVarId) -> Term {
    let metadata = TermMetadata {
        has_local: true,
        ..Default::default()
    };
    Term::Local(Arc::new(TermLocal { metadata, id }))
}

pub fn mk_const(name: Name) -> Term {
    Term::Const(Arc::new(TermConst {
        metadata: TermMetadata::default(),
        name,
    }))
}

pub fn mk_app(fun: Term, arg: Term) -> Term {
    let metadata = join_metadata([(&fun, 0), (&arg, 0)]);
    Term::App(Arc::new(TermApp { metadata, fun, arg }))
}

pub fn mk_lam(
    binder_name: Option<Name>,
    binder_info: BinderInfo,
    binder_type: Term,
    body: Term,
) -> Term {
    let metadata = join_metadata([(&binder_type, 0), (&body, 1)]);
    Term::Lam(Arc::new(TermBinder {
        metadata,
        binder_name,
        binder_info,
        binder_type,
        body,
    }))
}

pub fn mk_pi(
    binder_name: Option<Name>,
    binder_info: BinderInfo,
    binder_type: Term,
    body: Term,
) -> Term {
    let metadata = join_metadata([(&binder_type, 0), (&body, 1)]);
    Term::Pi(Arc::new(TermBinder {
        metadata,
        binder_name,
        binder_info,
        binder_type,
        body,
    }))
}

/// Non-dependent function type. `cod` is lifted under the anonymous binder.
pub fn mk_arrow(dom: Term, cod: Term) -> Term {
    let cod = cod.lift_loose_bvars(0, 1);
    mk_pi(None, BinderInfo::Default, dom, cod)
}

pub fn mk_let(binder_name: Option<Name>, binder_type: Term, value: Term, body: Term) -> Term {
    let metadata = join_metadata([(&binder_type, 0), (&value, 0), (&body, 1)]);
    Term::Let(Arc::new(TermLet {
        metadata,
        binder_name,
        binder_type,
        value,
        body,
    }))
}

pub fn mk_sort(level: usize) -> Term {
    Term::Sort(Arc::new(TermSort {
        metadata: TermMetadata::default(),
        level,
    }))
}

pub fn mk_prop() -> Term {
    static PROP: Lazy<Term> = Lazy::new(|| mk_sort(0));
    PROP.clone()
}

pub fn mk_type() -> Term {
    static TYPE: Lazy<Term> = Lazy::new(|| mk_sort(1));
    TYPE.clone()
}

pub fn mk_mvar(id: MVarId) -> Term {
    let metadata = TermMetadata {
        has_mvar: true,
        ..Default::default()
    };
    Term::MVar(Arc::new(TermMVar { metadata, id }))
}

pub fn mk_lit(value: Literal) -> Term {
    Term::Lit(Arc::new(TermLit {
        metadata: TermMetadata::default(),
        value,
    }))
}

impl Term {
    #[inline]
    pub fn metadata(&self) -> &TermMetadata {
        match self {
            Term::Var(inner) => &inner.metadata,
            Term::Local(inner) => &inner.metadata,
            Term::Const(inner) => &inner.metadata,
            Term::App(inner) => &inner.metadata,
            Term::Lam(inner) => &inner.metadata,
            Term::Pi(inner) => &inner.metadata,
            Term::Let(inner) => &inner.metadata,
            Term::Sort(inner) => &inner.metadata,
            Term::MVar(inner) => &inner.metadata,
            Term::Lit(inner) => &inner.metadata,
        }
    }

    pub fn ptr_eq(&self, other: &Term) -> bool {
        match (self, other) {
            (Term::Var(a), Term::Var(b)) => Arc::ptr_eq(a, b),
            (Term::Local(a), Term::Local(b)) => Arc::ptr_eq(a, b),
            (Term::Const(a), Term::Const(b)) => Arc::ptr_eq(a, b),
            (Term::App(a), Term::App(b)) => Arc::ptr_eq(a, b),
            (Term::Lam(a), Term::Lam(b)) => Arc::ptr_eq(a, b),
            (Term::Pi(a), Term::Pi(b)) => Arc::ptr_eq(a, b),
            (Term::Let(a), Term::Let(b)) => Arc::ptr_eq(a, b),
            (Term::Sort(a), Term::Sort(b)) => Arc::ptr_eq(a, b),
            (Term::MVar(a), Term::MVar(b)) => Arc::ptr_eq(a, b),
            (Term::Lit(a), Term::Lit(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Rebuilds `self` with its immediate subterms mapped by `f`.
    /// `f` receives each child together with the number of binders crossed to reach it.
    /// Returns `self` itself when no child changed.
    fn map_children(&self, f: &mut impl FnMut(&Term, usize) -> Term) -> Term {
        match self {
            Term::Var(_)
            | Term::Local(_)
            | Term::Const(_)
            | Term::Sort(_)
            | Term::MVar(_)
            | Term::Lit(_) => self.clone(),
            Term::App(inner) => {
                let fun = f(&inner.fun, 0);
                let arg = f(&inner.arg, 0);
                if inner.fun.ptr_eq(&fun) && inner.arg.ptr_eq(&arg) {
                    self.clone()
                } else {
                    mk_app(fun, arg)
                }
            }
            Term::Lam(inner) | Term::Pi(inner) => {
                let binder_type = f(&inner.binder_type, 0);
                let body = f(&inner.body, 1);
                if inner.binder_type.ptr_eq(&binder_type) && inner.body.ptr_eq(&body) {
                    return self.clone();
                }
                let mk: fn(Option<Name>, BinderInfo, Term, Term) -> Term =
                    if matches!(self, Term::Lam(_)) {
                        mk_lam
                    } else {
                        mk_pi
                    };
                mk(
                    inner.binder_name.clone(),
                    inner.binder_info,
                    binder_type,
                    body,
                )
            }
            Term::Let(inner) => {
                let binder_type = f(&inner.binder_type, 0);
                let value = f(&inner.value, 0);
                let body = f(&inner.body, 1);
                if inner.binder_type.ptr_eq(&binder_type)
                    && inner.value.ptr_eq(&value)
                    && inner.body.ptr_eq(&body)
                {
                    self.clone()
                } else {
                    mk_let(inner.binder_name.clone(), binder_type, value, body)
                }
            }
        }
    }

    /// self.open([x, y], k) == [x/k+1,y/k]self
    pub fn open(&self, xs: &[Term], level: usize) -> Term {
        if self.metadata().bound <= level {
            return self.clone();
        }
        if let Term::Var(inner) = self {
            if inner.index >= level {
                let i = inner.index - level;
                if i < xs.len() {
                    return xs[xs.len() - i - 1].clone();
                }
            }
            return self.clone();
        }
        self.map_children(&mut |child, binders| child.open(xs, level + binders))
    }

    /// Shifts every loose bound variable with index `>= offset` up by `n`.
    pub fn lift_loose_bvars(&self, offset: usize, n: usize) -> Term {
        if n == 0 || self.metadata().bound <= offset {
            return self.clone();
        }
        if let Term::Var(inner) = self {
            if inner.index >= offset {
                return mk_var(inner.index + n);
            }
            return self.clone();
        }
        self.map_children(&mut |child, binders| child.lift_loose_bvars(offset + binders, n))
    }

    pub fn replace_mvar(&self, f: &impl Fn(MVarId) -> Option<Term>) -> Term {
        if !self.metadata().has_mvar {
            return self.clone();
        }
        if let Term::MVar(inner) = self {
            return f(inner.id).unwrap_or_else(|| self.clone());
        }
        self.map_children(&mut |child, _| child.replace_mvar(f))
    }

    /// x ∈ FV(self)
    pub fn has_local(&self, id: FVarId) -> bool {
        if !self.metadata().has_local {
            return false;
        }
        match self {
            Term::Local(inner) => inner.id == id,
            Term::App(inner) => inner.fun.has_local(id) || inner.arg.has_local(id),
            Term::Lam(inner) | Term::Pi(inner) => {
                inner.binder_type.has_local(id) || inner.body.has_local(id)
            }
            Term::Let(inner) => {
                inner.binder_type.has_local(id)
                    || inner.value.has_local(id)
                    || inner.body.has_local(id)
            }
            Term::Var(_) | Term::Const(_) | Term::Sort(_) | Term::MVar(_) | Term::Lit(_) => false,
        }
    }

    /// Whether the loose bound variable `index` occurs in self.
    pub fn has_loose_bvar(&self, index: usize) -> bool {
        if self.metadata().bound <= index {
            return false;
        }
        match self {
            Term::Var(inner) => inner.index == index,
            Term::App(inner) => {
                inner.fun.has_loose_bvar(index) || inner.arg.has_loose_bvar(index)
            }
            Term::Lam(inner) | Term::Pi(inner) => {
                inner.binder_type.has_loose_bvar(index) || inner.body.has_loose_bvar(index + 1)
            }
            Term::Let(inner) => {
                inner.binder_type.has_loose_bvar(index)
                    || inner.value.has_loose_bvar(index)
                    || inner.body.has_loose_bvar(index + 1)
            }
            Term::Local(_) | Term::Const(_) | Term::Sort(_) | Term::MVar(_) | Term::Lit(_) => false,
        }
    }

    /// FV(self), in order of first occurrence.
    pub fn locals(&self) -> Vec<FVarId> {
        let mut acc = vec![];
        self.for_each(&mut |m| {
            if !m.metadata().has_local {
                return false;
            }
            if let Term::Local(inner) = m {
                if !acc.contains(&inner.id) {
                    acc.push(inner.id);
                }
            }
            true
        });
        acc
    }

    /// Metavariables occurring in self, in order of first occurrence.
    pub fn mvars(&self) -> Vec<MVarId> {
        let mut acc = vec![];
        self.for_each(&mut |m| {
            if !m.metadata().has_mvar {
                return false;
            }
            if let Term::MVar(inner) = m {
                if !acc.contains(&inner.id) {
                    acc.push(inner.id);
                }
            }
            true
        });
        acc
    }

    /// Pre-order traversal. `f` returns false to skip the children of the visited node.
    pub fn for_each(&self, f: &mut impl FnMut(&Term) -> bool) {
        if !f(self) {
            return;
        }
        match self {
            Term::App(inner) => {
                inner.fun.for_each(f);
                inner.arg.for_each(f);
            }
            Term::Lam(inner) | Term::Pi(inner) => {
                inner.binder_type.for_each(f);
                inner.body.for_each(f);
            }
            Term::Let(inner) => {
                inner.binder_type.for_each(f);
                inner.value.for_each(f);
                inner.body.for_each(f);
            }
            Term::Var(_) | Term::Local(_) | Term::Const(_) | Term::Sort(_) | Term::MVar(_)
            | Term::Lit(_) => {}
        }
    }

    pub fn head(&self) -> &Term {
        let mut m = self;
        while let Term::App(inner) = m {
            m = &inner.fun;
        }
        m
    }

    pub fn args(&self) -> Vec<&Term> {
        let mut m = self;
        let mut args = vec![];
        while let Term::App(inner) = m {
            m = &inner.fun;
            args.push(&inner.arg);
        }
        args.reverse();
        args
    }

    /// Returns the application `self l₁ ⋯ lₙ`.
    pub fn apply(&self, args: impl IntoIterator<Item = Term>) -> Term {
        let mut fun = self.clone();
        for arg in args {
            fun = mk_app(fun, arg);
        }
        fun
    }

    pub fn alpha_eq(&self, other: &Term) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        match (self, other) {
            (Term::Var(a), Term::Var(b)) => a.index == b.index,
            (Term::Local(a), Term::Local(b)) => a.id == b.id,
            (Term::Const(a), Term::Const(b)) => a.name == b.name,
            (Term::App(a), Term::App(b)) => a.fun.alpha_eq(&b.fun) && a.arg.alpha_eq(&b.arg),
            (Term::Lam(a), Term::Lam(b)) | (Term::Pi(a), Term::Pi(b)) => {
                a.binder_info == b.binder_info
                    && a.binder_type.alpha_eq(&b.binder_type)
                    && a.body.alpha_eq(&b.body)
            }
            (Term::Let(a), Term::Let(b)) => {
                a.binder_type.alpha_eq(&b.binder_type)
                    && a.value.alpha_eq(&b.value)
                    && a.body.alpha_eq(&b.body)
            }
            (Term::Sort(a), Term::Sort(b)) => a.level == b.level,
            (Term::MVar(a), Term::MVar(b)) => a.id == b.id,
            (Term::Lit(a), Term::Lit(b)) => a.value == b.value,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> Name {
        Name::intern(s).unwrap()
    }

    #[test]
    fn names_are_interned() {
        assert_eq!(name("foo"), name("foo"));
        assert_ne!(name("foo"), name("bar"));
        assert_eq!(name("HAdd.hAdd").as_str(), "HAdd.hAdd");
        assert!(Name::intern("h₁'").is_ok());
        insta::assert_snapshot!(Name::intern("1x").unwrap_err(), @"invalid name: '1x'");
        assert!(Name::intern("a b").is_err());
        assert!(Name::intern("").is_err());
    }

    #[test]
    fn metadata_tracks_locals_and_mvars() {
        let x = FVarId(0);
        let m = mk_app(mk_const(name("f")), mk_local(x));
        assert!(m.metadata().has_local);
        assert!(!m.metadata().has_mvar);
        assert_eq!(m.metadata().bound, 0);

        let lam = mk_lam(None, BinderInfo::Default, mk_type(), mk_var(0));
        assert_eq!(lam.metadata().bound, 0);
        let open_lam = mk_lam(None, BinderInfo::Default, mk_type(), mk_var(1));
        assert_eq!(open_lam.metadata().bound, 1);

        let hole = mk_app(mk_mvar(MVarId(3)), mk_local(x));
        assert!(hole.metadata().has_mvar);
        assert_eq!(hole.mvars(), vec![MVarId(3)]);
    }

    #[test]
    fn has_local_looks_under_binders() {
        let x = FVarId(0);
        let y = FVarId(1);
        let body = mk_app(mk_var(0), mk_local(x));
        let m = mk_pi(Some(name("z")), BinderInfo::Default, mk_local(y), body);
        assert!(m.has_local(x));
        assert!(m.has_local(y));
        assert!(!m.has_local(FVarId(2)));
        assert_eq!(m.locals(), vec![y, x]);

        let l = mk_let(None, mk_type(), mk_local(y), mk_var(0));
        assert!(l.has_local(y));
        assert!(!l.has_local(x));
    }

    #[test]
    fn open_replaces_loose_bvars() {
        let x = FVarId(0);
        let y = FVarId(1);
        // #1 #0 with [x, y] == x y
        let m = mk_app(mk_var(1), mk_var(0));
        let opened = m.open(&[mk_local(x), mk_local(y)], 0);
        assert_eq!(opened, mk_app(mk_local(x), mk_local(y)));

        // λ _, #0 #1 opened with [x] == λ _, #0 x
        let lam = mk_lam(None, BinderInfo::Default, mk_type(), mk_app(mk_var(0), mk_var(1)));
        let opened = lam.open(&[mk_local(x)], 0);
        let expected = mk_lam(None, BinderInfo::Default, mk_type(), mk_app(mk_var(0), mk_local(x)));
        assert_eq!(opened, expected);
        assert_eq!(opened.metadata().bound, 0);
    }

    #[test]
    fn arrow_lifts_codomain() {
        // A → #0, where #0 refers to an enclosing binder
        let m = mk_arrow(mk_const(name("A")), mk_var(0));
        let Term::Pi(inner) = &m else {
            panic!("expected Pi");
        };
        assert_eq!(inner.body, mk_var(1));
        assert_eq!(m.metadata().bound, 1);
        assert!(!inner.body.has_loose_bvar(0));
        assert!(m.has_loose_bvar(0));
    }

    #[test]
    fn alpha_eq_ignores_binder_names() {
        let a = mk_lam(Some(name("x")), BinderInfo::Default, mk_type(), mk_var(0));
        let b = mk_lam(Some(name("y")), BinderInfo::Default, mk_type(), mk_var(0));
        assert_eq!(a, b);
        let c = mk_lam(Some(name("x")), BinderInfo::Implicit, mk_type(), mk_var(0));
        assert_ne!(a, c);
        assert_ne!(mk_prop(), mk_type());
        assert_eq!(mk_lit(Literal::Nat(3)), mk_lit(Literal::Nat(3)));
    }

    #[test]
    fn replace_mvar_keeps_sharing() {
        let m = mk_app(mk_const(name("f")), mk_const(name("a")));
        let replaced = m.replace_mvar(&|_| Some(mk_prop()));
        assert!(m.ptr_eq(&replaced));

        let n = mk_app(mk_const(name("f")), mk_mvar(MVarId(0)));
        let replaced = n.replace_mvar(&|id| (id == MVarId(0)).then(mk_prop));
        assert_eq!(replaced, mk_app(mk_const(name("f")), mk_prop()));
    }

    #[test]
    fn head_and_args() {
        let f = mk_const(name("f"));
        let m = f.apply([mk_lit(Literal::Nat(1)), mk_lit(Literal::Nat(2))]);
        assert_eq!(*m.head(), f);
        assert_eq!(m.args().len(), 2);
        insta::assert_snapshot!(m, @"((f 1) 2)");
    }
}
