use std::collections::HashMap;

use anyhow::bail;
use thiserror::Error;

use crate::cmd::{Cmd, CmdClear, CmdGoal, CmdInfix, Fixity, GoalHyp, Operator};
use crate::lex::{Lex, LexError, SourceInfo, Token, TokenKind};
use crate::tt::{
    mk_app, mk_arrow, mk_const, mk_lam, mk_let, mk_lit, mk_pi, mk_prop, mk_sort, mk_type, mk_var,
    BinderInfo, Literal, Name, Term,
};

// symbols with a fixed meaning that notations cannot take over
const RESERVED: &[&str] = &[
    "(", ")", "{", "}", "[", "]", "⦃", "⦄", ",", ":", ":=", ";", "=>", "→", "->", "⊢", "λ", "Π",
    "∀",
];

const ARROW_PREC: usize = 25;
const APP_PREC: usize = 1024;

#[derive(Default, Debug, Clone)]
pub struct TokenTable {
    led: HashMap<String, Operator>,
}

impl TokenTable {
    pub fn add(&mut self, op: Operator) -> anyhow::Result<()> {
        if RESERVED.contains(&op.symbol.as_str()) {
            bail!("symbol '{}' is reserved", op.symbol);
        }
        let sym = op.symbol.clone();
        if self.led.insert(sym, op).is_some() {
            bail!("symbol already defined")
        }
        Ok(())
    }
}

enum Led {
    App,
    Arrow,
    User(Operator),
}

impl Led {
    fn prec(&self) -> usize {
        match self {
            Self::App => APP_PREC,
            Self::Arrow => ARROW_PREC,
            Self::User(op) => op.prec,
        }
    }
}

enum Nud {
    Var,
    Abs,
    Pi,
    Let,
    Paren,
    Sort,
    Prop,
    Type,
    NumLit,
    StrLit,
}

impl TokenTable {
    fn get_led(&self, token: &Token) -> Option<Led> {
        match token.kind {
            TokenKind::Ident | TokenKind::NumLit | TokenKind::StrLit => Some(Led::App),
            TokenKind::Symbol => {
                let lit = token.as_str();
                match lit {
                    "→" | "->" => Some(Led::Arrow),
                    "(" => Some(Led::App),
                    _ => self.led.get(lit).map(|op| Led::User(op.clone())),
                }
            }
            TokenKind::Keyword => match token.as_str() {
                "Sort" | "Prop" | "Type" => Some(Led::App),
                _ => None,
            },
        }
    }

    fn get_nud(&self, token: &Token) -> Option<Nud> {
        match token.kind {
            TokenKind::Ident => Some(Nud::Var),
            TokenKind::Symbol => match token.as_str() {
                "(" => Some(Nud::Paren),
                "λ" => Some(Nud::Abs),
                "Π" | "∀" => Some(Nud::Pi),
                _ => None,
            },
            TokenKind::NumLit => Some(Nud::NumLit),
            TokenKind::StrLit => Some(Nud::StrLit),
            TokenKind::Keyword => match token.as_str() {
                "fun" => Some(Nud::Abs),
                "let" => Some(Nud::Let),
                "Sort" => Some(Nud::Sort),
                "Prop" => Some(Nud::Prop),
                "Type" => Some(Nud::Type),
                _ => None,
            },
        }
    }
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("tokenize error")]
    Lex {
        #[from]
        lex_error: LexError,
    },
    #[error("parse error: {message} at {source_info}")]
    Parse {
        message: String,
        source_info: String,
    },
    #[error("unexpected end of input at {source_info}")]
    Eof { source_info: String },
}

struct Binder {
    name: Name,
    info: BinderInfo,
    ty: Term,
    value: Option<Term>,
}

pub struct Parser<'a> {
    lex: &'a mut Lex,
    tt: &'a TokenTable,
    // names in scope, innermost last; a name's de Bruijn index is its distance from the end
    locals: Vec<Name>,
}

impl<'a> Parser<'a> {
    pub fn new(lex: &'a mut Lex, tt: &'a TokenTable) -> Self {
        Self {
            lex,
            tt,
            locals: vec![],
        }
    }

    fn fail<R>(token: Token, message: impl Into<String>) -> Result<R, ParseError> {
        Err(ParseError::Parse {
            message: message.into(),
            source_info: token.source_info.to_string(),
        })
    }

    fn eof_error(&self) -> ParseError {
        ParseError::Eof {
            source_info: SourceInfo::eof(self.lex.input().clone()).to_string(),
        }
    }

    fn optional<F, R>(&mut self, f: F) -> Option<R>
    where
        F: FnOnce(&mut Self) -> Result<R, ParseError>,
    {
        let state = self.lex.save();
        match f(self) {
            Ok(m) => Some(m),
            Err(_err) => {
                self.lex.restore(state);
                None
            }
        }
    }

    fn peek_opt(&mut self) -> Option<Token> {
        self.optional(|this| this.peek())
    }

    fn peek(&mut self) -> Result<Token, ParseError> {
        self.lex
            .clone()
            .next()
            .transpose()?
            .ok_or_else(|| self.eof_error())
    }

    // consumes a token that has just been peeked
    fn advance(&mut self) {
        let _ = self.lex.next();
    }

    pub fn eof(&mut self) -> Result<(), ParseError> {
        if let Some(token) = self.peek_opt() {
            Self::fail(token, "expected EOF but tokens remain")?;
        }
        Ok(())
    }

    fn any_token(&mut self) -> Result<Token, ParseError> {
        let token = self.lex.next().transpose()?;
        token.ok_or_else(|| self.eof_error())
    }

    fn ident(&mut self) -> Result<Token, ParseError> {
        let token = self.any_token()?;
        if !token.is_ident() {
            return Self::fail(token, "expected identifier");
        }
        Ok(token)
    }

    fn ident_opt(&mut self) -> Option<Token> {
        if let Some(token) = self.peek_opt() {
            if token.is_ident() {
                self.advance();
                return Some(token);
            }
        }
        None
    }

    fn symbol(&mut self) -> Result<Token, ParseError> {
        let token = self.any_token()?;
        if !token.is_symbol() {
            return Self::fail(token, "expected symbol");
        }
        Ok(token)
    }

    fn expect_symbol(&mut self, sym: &str) -> Result<(), ParseError> {
        let token = self.any_token()?;
        if token.kind == TokenKind::Symbol && token.as_str() == sym {
            return Ok(());
        }
        Self::fail(token, format!("expected symbol '{}'", sym))
    }

    fn expect_symbol_opt(&mut self, sym: &str) -> Option<Token> {
        if let Some(token) = self.peek_opt() {
            if token.kind == TokenKind::Symbol && token.as_str() == sym {
                self.advance();
                return Some(token);
            }
        }
        None
    }

    fn num_lit(&mut self) -> Result<Token, ParseError> {
        let token = self.any_token()?;
        if !token.is_num_lit() {
            return Self::fail(token, "expected numeral literal");
        }
        Ok(token)
    }

    fn usize_lit(&mut self) -> Result<usize, ParseError> {
        let token = self.num_lit()?;
        match token.as_str().parse::<usize>() {
            Ok(n) => Ok(n),
            Err(_) => Self::fail(token, "numeral literal too big"),
        }
    }

    fn keyword(&mut self) -> Result<Token, ParseError> {
        let token = self.any_token()?;
        if !token.is_keyword() {
            return Self::fail(token, "expected keyword");
        }
        Ok(token)
    }

    fn name_of(token: Token) -> Result<Name, ParseError> {
        match Name::intern(token.as_str()) {
            Ok(name) => Ok(name),
            Err(err) => Self::fail(token, err.to_string()),
        }
    }

    fn name(&mut self) -> Result<Name, ParseError> {
        let token = self.ident()?;
        Self::name_of(token)
    }

    fn name_opt(&mut self) -> Result<Option<Name>, ParseError> {
        self.ident_opt().map(Self::name_of).transpose()
    }

    pub fn term(&mut self) -> Result<Term, ParseError> {
        self.subterm(0)
    }

    /// Parses binder groups such as `(x y : A) {z : B}` and brings the bound names into scope.
    ///
    /// The caller is responsible for taking them out of scope again.
    fn binders(&mut self, allow_value: bool) -> Result<Vec<Binder>, ParseError> {
        let mut binders = vec![];
        while let Some(token) = self.peek_opt() {
            if !token.is_symbol() {
                break;
            }
            let (info, close) = match token.as_str() {
                "(" => (BinderInfo::Default, ")"),
                "{" => (BinderInfo::Implicit, "}"),
                "⦃" => (BinderInfo::StrictImplicit, "⦄"),
                "[" => (BinderInfo::InstImplicit, "]"),
                _ => break,
            };
            self.advance();
            let mut names = vec![self.name()?];
            while let Some(name) = self.name_opt()? {
                names.push(name);
            }
            self.expect_symbol(":")?;
            let ty = self.term()?;
            let value = if allow_value && self.expect_symbol_opt(":=").is_some() {
                Some(self.term()?)
            } else {
                None
            };
            self.expect_symbol(close)?;
            self.push_binders(&mut binders, names, info, ty, value);
        }
        Ok(binders)
    }

    // `x y : A` without brackets
    fn bare_binders(&mut self) -> Result<Vec<Binder>, ParseError> {
        let mut names = vec![];
        while let Some(name) = self.name_opt()? {
            names.push(name);
        }
        self.expect_symbol(":")?;
        let ty = self.term()?;
        let mut binders = vec![];
        self.push_binders(&mut binders, names, BinderInfo::Default, ty, None);
        Ok(binders)
    }

    fn push_binders(
        &mut self,
        binders: &mut Vec<Binder>,
        names: Vec<Name>,
        info: BinderInfo,
        ty: Term,
        value: Option<Term>,
    ) {
        // the k-th name of a group sees the k names before it
        for (k, name) in names.into_iter().enumerate() {
            binders.push(Binder {
                name: name.clone(),
                info,
                ty: ty.lift_loose_bvars(0, k),
                value: value.as_ref().map(|v| v.lift_loose_bvars(0, k)),
            });
            self.locals.push(name);
        }
    }

    fn term_binder(&mut self, token: Token) -> Result<Term, ParseError> {
        let is_lambda = matches!(token.as_str(), "λ" | "fun");
        let depth = self.locals.len();
        let binders = match self.peek_opt() {
            Some(next) if next.is_ident() => self.bare_binders()?,
            _ => self.binders(false)?,
        };
        if binders.is_empty() {
            return Self::fail(token, "empty binding");
        }
        // `fun x => m` or `fun x, m`; binders other than λ only take a comma
        let arrow = is_lambda && self.expect_symbol_opt("=>").is_some();
        if !arrow {
            self.expect_symbol(",")?;
        }
        let mut m = self.subterm(0)?;
        self.locals.truncate(depth);
        for binder in binders.into_iter().rev() {
            m = if is_lambda {
                mk_lam(Some(binder.name), binder.info, binder.ty, m)
            } else {
                mk_pi(Some(binder.name), binder.info, binder.ty, m)
            };
        }
        Ok(m)
    }

    // let x : A := m; n
    fn term_let(&mut self) -> Result<Term, ParseError> {
        let name = self.name()?;
        self.expect_symbol(":")?;
        let ty = self.term()?;
        self.expect_symbol(":=")?;
        let value = self.term()?;
        self.expect_symbol(";")?;
        self.locals.push(name.clone());
        let body = self.subterm(0)?;
        self.locals.pop();
        Ok(mk_let(Some(name), ty, value, body))
    }

    fn term_var(&mut self, token: Token) -> Result<Term, ParseError> {
        let name = Self::name_of(token)?;
        if let Some(index) = self.locals.iter().rev().position(|x| x == &name) {
            return Ok(mk_var(index));
        }
        Ok(mk_const(name))
    }

    fn subterm(&mut self, rbp: usize) -> Result<Term, ParseError> {
        let token = self.any_token()?;
        // nud
        let Some(nud) = self.tt.get_nud(&token) else {
            return Self::fail(token, "expected term");
        };
        let mut left = match nud {
            Nud::Var => self.term_var(token)?,
            Nud::Abs | Nud::Pi => self.term_binder(token)?,
            Nud::Let => self.term_let()?,
            Nud::Paren => {
                let m = self.subterm(0)?;
                self.expect_symbol(")")?;
                m
            }
            Nud::Sort => mk_sort(self.usize_lit()?),
            Nud::Prop => mk_prop(),
            Nud::Type => mk_type(),
            Nud::NumLit => match token.as_str().parse::<u64>() {
                Ok(n) => mk_lit(Literal::Nat(n)),
                Err(_) => return Self::fail(token, "numeral literal too big"),
            },
            Nud::StrLit => mk_lit(Literal::Str(unescape(token.as_str()).into())),
        };
        while let Some(token) = self.peek_opt() {
            let Some(led) = self.tt.get_led(&token) else {
                break;
            };
            let prec = led.prec();
            if rbp >= prec {
                break;
            }
            match led {
                Led::App => {
                    let right = self.subterm(prec)?;
                    left = mk_app(left, right);
                }
                Led::Arrow => {
                    self.advance();
                    let right = self.subterm(prec - 1)?;
                    left = mk_arrow(left, right);
                }
                Led::User(op) => {
                    let prec = match op.fixity {
                        Fixity::Infix | Fixity::Infixl => prec,
                        Fixity::Infixr => prec.saturating_sub(1),
                    };
                    self.advance();
                    let right = self.subterm(prec)?;
                    left = mk_const(op.entity).apply([left, right]);
                }
            }
        }
        Ok(left)
    }

    pub fn cmd(&mut self) -> Result<Cmd, ParseError> {
        let keyword = self.keyword()?;
        let cmd = match keyword.as_str() {
            "infix" => Cmd::Infix(self.infix_cmd(Fixity::Infix)?),
            "infixl" => Cmd::Infix(self.infix_cmd(Fixity::Infixl)?),
            "infixr" => Cmd::Infix(self.infix_cmd(Fixity::Infixr)?),
            "goal" => Cmd::Goal(self.goal_cmd()?),
            "clear" => Cmd::Clear(self.clear_cmd()?),
            _ => {
                return Self::fail(keyword, "expected command");
            }
        };
        Ok(cmd)
    }

    // infixl + : 65 := HAdd.hAdd
    fn infix_cmd(&mut self, fixity: Fixity) -> Result<CmdInfix, ParseError> {
        let op = self.symbol()?;
        self.expect_symbol(":")?;
        let prec_token = self.num_lit()?;
        let prec = match prec_token.as_str().parse::<usize>() {
            Ok(0) => return Self::fail(prec_token, "precedence must be positive"),
            Ok(prec) => prec,
            Err(_) => return Self::fail(prec_token, "numeral literal too big"),
        };
        self.expect_symbol(":=")?;
        let entity = self.name()?;
        Ok(CmdInfix {
            fixity,
            op: op.as_str().to_owned(),
            prec,
            entity,
        })
    }

    fn goal_cmd(&mut self) -> Result<CmdGoal, ParseError> {
        let depth = self.locals.len();
        let binders = self.binders(true)?;
        let token = self.any_token()?;
        if !(token.is_symbol() && matches!(token.as_str(), ":" | "⊢")) {
            return Self::fail(token, "expected ':' or '⊢'");
        }
        let target = self.term()?;
        self.locals.truncate(depth);
        let hyps = binders
            .into_iter()
            .map(|binder| GoalHyp {
                name: binder.name,
                binder_info: binder.info,
                ty: binder.ty,
                value: binder.value,
            })
            .collect();
        Ok(CmdGoal { hyps, target })
    }

    fn clear_cmd(&mut self) -> Result<CmdClear, ParseError> {
        let mut names = vec![self.ident()?.as_str().to_owned()];
        while let Some(token) = self.ident_opt() {
            names.push(token.as_str().to_owned());
        }
        Ok(CmdClear { names })
    }
}

// contents of a string literal token, quotes removed
fn unescape(lit: &str) -> String {
    let inner = &lit[1..lit.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(c) => out.push(c),
            None => {}
        }
    }
    out
}
