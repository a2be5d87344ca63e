use std::collections::HashMap;
use std::fmt::{Display, Write};

use anyhow::bail;

use crate::cmd::{Fixity, Operator};
use crate::lctx::{LocalContext, LocalDecl};
use crate::mctx::MetavarContext;
use crate::tactic::ProofState;
use crate::tt::{BinderInfo, FVarId, MVarId, Name, Term, TermBinder};

const ARROW_PREC: usize = 25;
const APP_PREC: usize = 1024;

#[derive(Debug, Default, Clone)]
pub struct OpTable {
    op_table: HashMap<Name, Operator>,
}

impl OpTable {
    pub fn add(&mut self, op: Operator) -> anyhow::Result<()> {
        let entity = op.entity.clone();
        if self.op_table.insert(entity, op).is_some() {
            bail!("notation already defined");
        }
        Ok(())
    }

    fn get(&self, name: &Name) -> Option<&Operator> {
        self.op_table.get(name)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PrintOptions {
    /// Suffix hypotheses with their identifier and label goals with their metavariable.
    pub show_ids: bool,
}

/// Renders terms living in the local context `lctx`.
pub struct Printer<'a> {
    op_table: &'a OpTable,
    lctx: &'a LocalContext,
    options: PrintOptions,
}

impl<'a> Printer<'a> {
    pub fn new(op_table: &'a OpTable, lctx: &'a LocalContext, options: PrintOptions) -> Self {
        Printer {
            op_table,
            lctx,
            options,
        }
    }

    pub fn fmt_term(&self, m: &Term, f: &mut impl Write) -> std::fmt::Result {
        let mut local_names = vec![];
        self.fmt_term_help(m, 0, true, &mut local_names, f)
    }

    pub fn term_to_string(&self, m: &Term) -> String {
        let mut s = String::new();
        // writing to a String cannot fail
        let _ = self.fmt_term(m, &mut s);
        s
    }

    fn fmt_local(&self, id: FVarId, f: &mut impl Write) -> std::fmt::Result {
        match self.lctx.find(id) {
            Some(decl) => self.fmt_decl_name(decl, f),
            None => write!(f, "${id}"),
        }
    }

    // `x✝` when a later hypothesis is also called `x`
    fn fmt_decl_name(&self, decl: &LocalDecl, f: &mut impl Write) -> std::fmt::Result {
        write!(f, "{}", decl.user_name)?;
        if self.is_shadowed(decl) {
            write!(f, "✝")?;
        }
        if self.options.show_ids {
            write!(f, "${}", decl.id)?;
        }
        Ok(())
    }

    fn is_shadowed(&self, decl: &LocalDecl) -> bool {
        let Some(index) = self.lctx.index_of(decl.id) else {
            return false;
        };
        self.lctx
            .iter()
            .skip(index + 1)
            .any(|later| later.user_name == decl.user_name)
    }

    fn fmt_term_help(
        &self,
        m: &Term,
        prec: usize,
        allow_lambda: bool,
        local_names: &mut Vec<String>,
        f: &mut impl Write,
    ) -> std::fmt::Result {
        match m {
            Term::Var(inner) => {
                let name = local_names
                    .len()
                    .checked_sub(inner.index + 1)
                    .and_then(|i| local_names.get(i));
                match name {
                    Some(name) => write!(f, "{name}"),
                    None => write!(f, "#{}", inner.index),
                }
            }
            Term::Local(inner) => self.fmt_local(inner.id, f),
            Term::Const(inner) => write!(f, "{}", inner.name),
            Term::Sort(inner) => match inner.level {
                0 => write!(f, "Prop"),
                1 => write!(f, "Type"),
                level if prec >= APP_PREC => write!(f, "(Sort {level})"),
                level => write!(f, "Sort {level}"),
            },
            Term::MVar(inner) => write!(f, "?{}", inner.id),
            Term::Lit(inner) => write!(f, "{}", inner.value),
            Term::App(_) => self.fmt_app(m, prec, allow_lambda, local_names, f),
            Term::Pi(inner) if is_arrow(inner) => {
                let paren = prec >= ARROW_PREC;
                if paren {
                    write!(f, "(")?;
                }
                self.fmt_term_help(&inner.binder_type, ARROW_PREC, false, local_names, f)?;
                write!(f, " → ")?;
                // never referred to
                local_names.push(String::new());
                let res = self.fmt_term_help(
                    &inner.body,
                    ARROW_PREC - 1,
                    allow_lambda || paren,
                    local_names,
                    f,
                );
                local_names.pop();
                res?;
                if paren {
                    write!(f, ")")?;
                }
                Ok(())
            }
            Term::Lam(_) | Term::Pi(_) => self.fmt_binders(m, allow_lambda, local_names, f),
            Term::Let(inner) => {
                if !allow_lambda {
                    write!(f, "(")?;
                }
                let name = self.fresh_name(inner.binder_name.as_ref(), &inner.body, local_names);
                write!(f, "let {name} : ")?;
                self.fmt_term_help(&inner.binder_type, 0, true, local_names, f)?;
                write!(f, " := ")?;
                self.fmt_term_help(&inner.value, 0, true, local_names, f)?;
                write!(f, "; ")?;
                local_names.push(name);
                let res = self.fmt_term_help(&inner.body, 0, true, local_names, f);
                local_names.pop();
                res?;
                if !allow_lambda {
                    write!(f, ")")?;
                }
                Ok(())
            }
        }
    }

    fn fmt_app(
        &self,
        m: &Term,
        prec: usize,
        mut allow_lambda: bool,
        local_names: &mut Vec<String>,
        f: &mut impl Write,
    ) -> std::fmt::Result {
        let head = m.head();
        let args = m.args();
        if let Term::Const(inner) = head {
            if let (Some(op), [lhs, rhs]) = (self.op_table.get(&inner.name), args.as_slice()) {
                let (lprec, rprec) = match op.fixity {
                    Fixity::Infix | Fixity::Infixl => (op.prec.saturating_sub(1), op.prec),
                    Fixity::Infixr => (op.prec, op.prec.saturating_sub(1)),
                };
                let paren = prec >= op.prec;
                if paren {
                    write!(f, "(")?;
                    allow_lambda = true;
                }
                self.fmt_term_help(lhs, lprec, false, local_names, f)?;
                write!(f, " {} ", op.symbol)?;
                self.fmt_term_help(rhs, rprec, allow_lambda, local_names, f)?;
                if paren {
                    write!(f, ")")?;
                }
                return Ok(());
            }
        }
        let paren = prec >= APP_PREC;
        if paren {
            write!(f, "(")?;
        }
        self.fmt_term_help(head, APP_PREC, false, local_names, f)?;
        for arg in args {
            write!(f, " ")?;
            self.fmt_term_help(arg, APP_PREC, false, local_names, f)?;
        }
        if paren {
            write!(f, ")")?;
        }
        Ok(())
    }

    // fun (x : A) {y : B} => m
    // ∀ (x : A) {y : B}, m
    fn fmt_binders(
        &self,
        m: &Term,
        allow_lambda: bool,
        local_names: &mut Vec<String>,
        f: &mut impl Write,
    ) -> std::fmt::Result {
        let is_lambda = matches!(m, Term::Lam(_));
        if !allow_lambda {
            write!(f, "(")?;
        }
        write!(f, "{}", if is_lambda { "fun" } else { "∀" })?;
        let depth = local_names.len();
        let mut m = m;
        loop {
            let inner = match m {
                Term::Lam(inner) if is_lambda => inner,
                Term::Pi(inner) if !is_lambda && !is_arrow(inner) => inner,
                _ => break,
            };
            let name = self.fresh_name(inner.binder_name.as_ref(), &inner.body, local_names);
            let (open, close) = match inner.binder_info {
                BinderInfo::Default => ("(", ")"),
                BinderInfo::Implicit => ("{", "}"),
                BinderInfo::StrictImplicit => ("⦃", "⦄"),
                BinderInfo::InstImplicit => ("[", "]"),
            };
            write!(f, " {open}{name} : ")?;
            self.fmt_term_help(&inner.binder_type, 0, true, local_names, f)?;
            write!(f, "{close}")?;
            local_names.push(name);
            m = &inner.body;
        }
        write!(f, "{} ", if is_lambda { " =>" } else { "," })?;
        let res = self.fmt_term_help(m, 0, true, local_names, f);
        local_names.truncate(depth);
        res?;
        if !allow_lambda {
            write!(f, ")")?;
        }
        Ok(())
    }

    // Picks a display name for a binder whose body is `body`, avoiding capture of the
    // bound variables and hypotheses `body` refers to.
    fn fresh_name(&self, base: Option<&Name>, body: &Term, local_names: &[String]) -> String {
        let base = base.map_or("a", Name::as_str);
        let clashes = |x: &str| {
            let bound = local_names
                .iter()
                .rev()
                .enumerate()
                .any(|(i, name)| name == x && body.has_loose_bvar(i + 1));
            bound
                || self
                    .lctx
                    .iter()
                    .any(|decl| decl.user_name.as_str() == x && body.has_local(decl.id))
        };
        if !clashes(base) {
            return base.to_owned();
        }
        (1..)
            .map(|i| format!("{base}{i}"))
            .find(|x| !clashes(x))
            .unwrap_or_else(|| base.to_owned())
    }
}

fn is_arrow(inner: &TermBinder) -> bool {
    inner.binder_info == BinderInfo::Default && !inner.body.has_loose_bvar(0)
}

/// The open goals of a proof state, in Lean's hypotheses-then-turnstile layout.
pub struct GoalsDisplay<'a> {
    state: &'a ProofState,
    op_table: &'a OpTable,
    options: PrintOptions,
}

impl<'a> GoalsDisplay<'a> {
    pub fn new(state: &'a ProofState, op_table: &'a OpTable, options: PrintOptions) -> Self {
        GoalsDisplay {
            state,
            op_table,
            options,
        }
    }

    fn fmt_goal(
        &self,
        goal: MVarId,
        mctx: &MetavarContext,
        f: &mut std::fmt::Formatter,
    ) -> std::fmt::Result {
        let decl = mctx.get_decl(goal).map_err(|_| std::fmt::Error)?;
        let printer = Printer::new(self.op_table, &decl.lctx, self.options);
        if self.options.show_ids {
            writeln!(f, "goal ?{goal}")?;
        }
        let mut decls = decl.lctx.iter().peekable();
        while let Some(first) = decls.next() {
            let ty = mctx.instantiate_mvars(&first.ty);
            printer.fmt_decl_name(first, f)?;
            if let Some(value) = &first.value {
                write!(f, " : {} := ", printer.term_to_string(&ty))?;
                printer.fmt_term(&mctx.instantiate_mvars(value), f)?;
                writeln!(f)?;
                continue;
            }
            // x y : A
            while let Some(next) = decls.next_if(|next| {
                !next.is_let() && mctx.instantiate_mvars(&next.ty) == ty
            }) {
                write!(f, " ")?;
                printer.fmt_decl_name(next, f)?;
            }
            writeln!(f, " : {}", printer.term_to_string(&ty))?;
        }
        writeln!(f, "⊢ {}", printer.term_to_string(&mctx.instantiate_mvars(&decl.ty)))
    }
}

impl Display for GoalsDisplay<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let goals = self.state.goals();
        if goals.is_empty() {
            return writeln!(f, "no goals");
        }
        for (i, goal) in goals.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            self.fmt_goal(*goal, self.state.mctx(), f)?;
        }
        Ok(())
    }
}
