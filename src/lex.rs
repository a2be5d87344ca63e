use std::ops::Range;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

#[derive(Debug)]
pub struct File {
    name: String,
    contents: String,
    lines: Vec<usize>,
}

impl File {
    pub fn new(name: impl Into<String>, contents: impl Into<String>) -> Self {
        let name = name.into();
        let contents = contents.into();
        let mut lines = vec![0];
        for (idx, ch) in contents.char_indices() {
            if ch == '\n' {
                lines.push(idx + ch.len_utf8());
            }
        }
        Self {
            name,
            contents,
            lines,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn contents(&self) -> &str {
        &self.contents
    }

    pub fn len(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    /// 1-origin line and column (in characters) of a byte offset.
    pub fn line_column_at(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.contents.len());
        let line_index = match self.lines.binary_search(&offset) {
            Ok(index) => index,
            Err(index) => index.saturating_sub(1),
        };
        let line_start = self.lines.get(line_index).copied().unwrap_or(0);
        let column = self.contents[line_start..offset].chars().count() + 1;
        (line_index + 1, column)
    }

    pub fn line(&self, line: usize) -> &str {
        if line == 0 || line > self.lines.len() {
            return "";
        }
        let start = self.lines[line - 1];
        let end = match self.lines.get(line) {
            Some(&next_start) if next_start > start => next_start - 1,
            Some(&next_start) => next_start,
            None => self.contents.len(),
        };
        &self.contents[start..end]
    }
}

#[derive(Debug, Clone)]
pub struct SourceInfo {
    range: Range<usize>,
    file: Arc<File>,
}

impl SourceInfo {
    pub fn new(file: Arc<File>, range: Range<usize>) -> Self {
        Self { range, file }
    }

    pub fn eof(file: Arc<File>) -> Self {
        let len = file.len();
        let start = len.saturating_sub(1);
        Self::new(file, start..len)
    }

    fn as_str(&self) -> &str {
        self.file.contents().get(self.range.clone()).unwrap_or("")
    }

    pub fn line_column(&self) -> (usize, usize) {
        self.file.line_column_at(self.range.start)
    }
}

impl std::fmt::Display for SourceInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let (line, column) = self.line_column();
        writeln!(f, "{}:{}:{}\n", self.file.name(), line, column)?;
        writeln!(f, "{}", self.file.line(line))?;
        writeln!(
            f,
            "{}{}",
            " ".repeat(column - 1),
            "^".repeat(std::cmp::max(1, self.as_str().chars().count()))
        )
    }
}

/// Token classes of the script language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `x`, `h₁`, `HAdd.hAdd`
    Ident,
    /// `+`, `:`, `:=`, `λ`, `⦃`
    Symbol,
    NumLit,
    /// Quotes and escapes included.
    StrLit,
    /// Identifiers in [KEYWORDS].
    Keyword,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub source_info: SourceInfo,
}

impl Token {
    pub fn is_ident(&self) -> bool {
        self.kind == TokenKind::Ident
    }

    pub fn is_symbol(&self) -> bool {
        self.kind == TokenKind::Symbol
    }

    pub fn is_num_lit(&self) -> bool {
        self.kind == TokenKind::NumLit
    }

    pub fn is_keyword(&self) -> bool {
        self.kind == TokenKind::Keyword
    }

    pub fn as_str(&self) -> &str {
        self.source_info.as_str()
    }
}

#[derive(Debug, Clone, Error)]
#[error("unrecognizable character at {source_info}")]
pub struct LexError {
    source_info: SourceInfo,
}

pub const KEYWORDS: &[&str] = &[
    "goal", "clear", "fun", "let", "infix", "infixl", "infixr", "Sort", "Prop", "Type",
];

const IDENT: &str = r"[\p{Cased_Letter}_][\p{Cased_Letter}\p{Number}_']*";

// One alternative per token class, tried in order. `None` marks trivia.
static TOKEN_CLASSES: &[(&str, Option<TokenKind>)] = &[
    (r"\s+|--.*", None),
    (r"0|[1-9][0-9]*", Some(TokenKind::NumLit)),
    (r#""(?:[^"\\]|\\.)*""#, Some(TokenKind::StrLit)),
    (
        r#"[(){}\[\]⦃⦄,]|:=|=>|->|[\p{Symbol}\p{Punctuation}&&[^(){}\[\]⦃⦄,"]]"#,
        Some(TokenKind::Symbol),
    ),
];

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    let ident = format!("(?P<c0>{IDENT}(?:\\.{IDENT})*)");
    let classes = TOKEN_CLASSES
        .iter()
        .enumerate()
        .map(|(i, (re, _))| format!("(?P<c{}>{re})", i + 1));
    let alternatives: Vec<_> = std::iter::once(ident).chain(classes).collect();
    Regex::new(&format!("^(?:{})", alternatives.join("|"))).unwrap()
});

static COMMENT_DELIM_RE: Lazy<Regex> = Lazy::new(|| Regex::new("/-|-/").unwrap());

#[derive(Debug, Clone)]
pub struct Lex {
    file: Arc<File>,
    position: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct LexState {
    position: usize,
}

impl Lex {
    pub fn new(file: Arc<File>) -> Self {
        Self { file, position: 0 }
    }

    pub fn input(&self) -> &Arc<File> {
        &self.file
    }

    pub fn save(&self) -> LexState {
        LexState {
            position: self.position,
        }
    }

    pub fn restore(&mut self, state: LexState) {
        self.position = state.position;
    }

    pub fn is_eof(&self) -> bool {
        self.clone().next().is_none()
    }

    fn rest(&self) -> &str {
        &self.file.contents()[self.position..]
    }

    fn error(&self) -> LexError {
        let end = self
            .rest()
            .chars()
            .next()
            .map_or(self.position, |c| self.position + c.len_utf8());
        LexError {
            source_info: SourceInfo::new(Arc::clone(&self.file), self.position..end),
        }
    }

    // Moves past a `/- ... -/` comment, nesting included, starting at its opening.
    // An unterminated comment runs to the end of the input.
    fn skip_block_comment(&mut self) {
        let file = Arc::clone(&self.file);
        let mut depth = 0usize;
        for delim in COMMENT_DELIM_RE.find_iter(&file.contents()[self.position..]) {
            if delim.as_str() == "/-" {
                depth += 1;
                continue;
            }
            depth = depth.saturating_sub(1);
            if depth == 0 {
                self.position += delim.end();
                return;
            }
        }
        self.position = file.len();
    }
}

impl Iterator for Lex {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.rest().starts_with("/-") {
                self.skip_block_comment();
                continue;
            }
            if self.rest().is_empty() {
                return None;
            }
            let file = Arc::clone(&self.file);
            let Some(cap) = TOKEN_RE.captures(&file.contents()[self.position..]) else {
                return Some(Err(self.error()));
            };
            let len = cap[0].len();
            let kind = if cap.name("c0").is_some() {
                Some(TokenKind::Ident)
            } else {
                TOKEN_CLASSES
                    .iter()
                    .enumerate()
                    .find(|(i, _)| cap.name(&format!("c{}", i + 1)).is_some())
                    .and_then(|(_, (_, kind))| *kind)
            };
            let range = self.position..self.position + len;
            self.position += len;
            let Some(kind) = kind else {
                continue;
            };
            let source_info = SourceInfo::new(Arc::clone(&self.file), range);
            let kind = match (kind, source_info.as_str()) {
                (TokenKind::Ident, "λ" | "Π") => TokenKind::Symbol,
                (TokenKind::Ident, text) if KEYWORDS.contains(&text) => TokenKind::Keyword,
                (kind, _) => kind,
            };
            return Some(Ok(Token { kind, source_info }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(input: &str) -> Vec<Token> {
        let file = Arc::new(File::new("<test>", input.to_owned()));
        Lex::new(file)
            .map(|token| token.expect("lexing failed"))
            .collect()
    }

    fn kinds(input: &str) -> Vec<(TokenKind, String)> {
        tokenize(input)
            .into_iter()
            .map(|token| (token.kind, token.as_str().to_owned()))
            .collect()
    }

    #[test]
    fn ident_with_apostrophe() {
        let tokens = tokenize("x'");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Ident);
        assert_eq!(tokens[0].as_str(), "x'");
    }

    #[test]
    fn dotted_ident_is_one_token() {
        let tokens = tokenize("HAdd.hAdd x");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].kind, TokenKind::Ident);
        assert_eq!(tokens[0].as_str(), "HAdd.hAdd");
    }

    #[test]
    fn keywords_and_binder_symbols() {
        assert_eq!(
            kinds("goal {x : Nat} ⦃h : P x⦄ : Prop"),
            vec![
                (TokenKind::Keyword, "goal".to_owned()),
                (TokenKind::Symbol, "{".to_owned()),
                (TokenKind::Ident, "x".to_owned()),
                (TokenKind::Symbol, ":".to_owned()),
                (TokenKind::Ident, "Nat".to_owned()),
                (TokenKind::Symbol, "}".to_owned()),
                (TokenKind::Symbol, "⦃".to_owned()),
                (TokenKind::Ident, "h".to_owned()),
                (TokenKind::Symbol, ":".to_owned()),
                (TokenKind::Ident, "P".to_owned()),
                (TokenKind::Ident, "x".to_owned()),
                (TokenKind::Symbol, "⦄".to_owned()),
                (TokenKind::Symbol, ":".to_owned()),
                (TokenKind::Keyword, "Prop".to_owned()),
            ]
        );
    }

    #[test]
    fn multi_character_symbols() {
        let texts: Vec<_> = kinds("x := λ y => y -> z")
            .into_iter()
            .map(|(_, text)| text)
            .collect();
        assert_eq!(texts, vec!["x", ":=", "λ", "y", "=>", "y", "->", "z"]);
    }

    #[test]
    fn literals() {
        assert_eq!(
            kinds(r#"42 "a \"b\"""#),
            vec![
                (TokenKind::NumLit, "42".to_owned()),
                (TokenKind::StrLit, r#""a \"b\"""#.to_owned()),
            ]
        );
    }

    #[test]
    fn comments_are_skipped() {
        let texts: Vec<_> = kinds("a -- line\n/- block /- nested -/ still -/ b")
            .into_iter()
            .map(|(_, text)| text)
            .collect();
        assert_eq!(texts, vec!["a", "b"]);
        assert!(tokenize("/- unterminated").is_empty());
    }

    #[test]
    fn unknown_character_is_reported() {
        let file = Arc::new(File::new("<test>", "x あ"));
        let mut lex = Lex::new(file);
        assert!(lex.next().unwrap().is_ok());
        let err = lex.next().unwrap().unwrap_err().to_string();
        assert!(err.starts_with("unrecognizable character at <test>:1:3\n"), "{err}");
        assert!(err.ends_with("x あ\n  ^\n"), "{err}");
    }

    #[test]
    fn line_column() {
        let file = File::new("<test>", "ab\ncd\n");
        assert_eq!(file.line_column_at(0), (1, 1));
        assert_eq!(file.line_column_at(4), (2, 2));
        assert_eq!(file.line(2), "cd");
    }
}
