use crate::script::error::ScriptError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Span {
    pub(crate) start: usize,
    pub(crate) end: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) span: Span,
    /// A line terminator separates this token from the previous one.
    pub(crate) nl_before: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    /// Identifiers and keywords; the parser decides which is which.
    Ident(String),
    Number(f64),
    Str(String),
    Template(Vec<TemplatePart>),
    Punct(Punct),
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TemplatePart {
    Text(String),
    /// Byte range of an embedded `${...}` expression in the source.
    Expr(Span),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Punct {
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Dot,
    Ellipsis,
    Semi,
    Colon,
    Question,
    QuestionDot,
    Nullish,
    Arrow,
    Assign,
    EqEq,
    EqEqEq,
    Ne,
    NeEq,
    Lt,
    Le,
    Gt,
    Ge,
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    Percent,
    Bang,
    AndAnd,
    OrOr,
    PlusPlus,
    MinusMinus,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    PercentAssign,
    Amp,
    Pipe,
    Tilde,
    Caret,
    At,
    Hash,
}

impl Punct {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::LParen => "(",
            Self::RParen => ")",
            Self::LBracket => "[",
            Self::RBracket => "]",
            Self::LBrace => "{",
            Self::RBrace => "}",
            Self::Comma => ",",
            Self::Dot => ".",
            Self::Ellipsis => "...",
            Self::Semi => ";",
            Self::Colon => ":",
            Self::Question => "?",
            Self::QuestionDot => "?.",
            Self::Nullish => "??",
            Self::Arrow => "=>",
            Self::Assign => "=",
            Self::EqEq => "==",
            Self::EqEqEq => "===",
            Self::Ne => "!=",
            Self::NeEq => "!==",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::StarStar => "**",
            Self::Slash => "/",
            Self::Percent => "%",
            Self::Bang => "!",
            Self::AndAnd => "&&",
            Self::OrOr => "||",
            Self::PlusPlus => "++",
            Self::MinusMinus => "--",
            Self::PlusAssign => "+=",
            Self::MinusAssign => "-=",
            Self::StarAssign => "*=",
            Self::SlashAssign => "/=",
            Self::PercentAssign => "%=",
            Self::Amp => "&",
            Self::Pipe => "|",
            Self::Tilde => "~",
            Self::Caret => "^",
            Self::At => "@",
            Self::Hash => "#",
        }
    }
}

// Longest match first.
const MAX_TEMPLATE_NESTING: u32 = 32;

const PUNCTS: &[(&str, Punct)] = &[
    ("...", Punct::Ellipsis),
    ("===", Punct::EqEqEq),
    ("!==", Punct::NeEq),
    ("**", Punct::StarStar),
    ("=>", Punct::Arrow),
    ("==", Punct::EqEq),
    ("!=", Punct::Ne),
    ("<=", Punct::Le),
    (">=", Punct::Ge),
    ("&&", Punct::AndAnd),
    ("||", Punct::OrOr),
    ("??", Punct::Nullish),
    ("?.", Punct::QuestionDot),
    ("++", Punct::PlusPlus),
    ("--", Punct::MinusMinus),
    ("+=", Punct::PlusAssign),
    ("-=", Punct::MinusAssign),
    ("*=", Punct::StarAssign),
    ("/=", Punct::SlashAssign),
    ("%=", Punct::PercentAssign),
    ("(", Punct::LParen),
    (")", Punct::RParen),
    ("[", Punct::LBracket),
    ("]", Punct::RBracket),
    ("{", Punct::LBrace),
    ("}", Punct::RBrace),
    (",", Punct::Comma),
    (".", Punct::Dot),
    (";", Punct::Semi),
    (":", Punct::Colon),
    ("?", Punct::Question),
    ("=", Punct::Assign),
    ("<", Punct::Lt),
    (">", Punct::Gt),
    ("+", Punct::Plus),
    ("-", Punct::Minus),
    ("*", Punct::Star),
    ("/", Punct::Slash),
    ("%", Punct::Percent),
    ("!", Punct::Bang),
    ("&", Punct::Amp),
    ("|", Punct::Pipe),
    ("~", Punct::Tilde),
    ("^", Punct::Caret),
    ("@", Punct::At),
    ("#", Punct::Hash),
];

/// On-demand tokenizer. The parser drives it one token at a time because JSX text cannot be
/// tokenized without knowing the syntactic context.
#[derive(Debug, Clone)]
pub(crate) struct Lexer<'a> {
    src: &'a str,
    pub(crate) pos: usize,
    end: usize,
    /// Template literals enclosing this lexer; each `${` is lexed by a nested probe.
    templates: u32,
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c == '$' || c.is_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    c == '_' || c == '$' || c.is_alphanumeric()
}

impl<'a> Lexer<'a> {
    pub(crate) fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            end: src.len(),
            templates: 0,
        }
    }

    /// Lex only `src[span.start..span.end]`, keeping offsets relative to the whole source.
    pub(crate) fn with_range(src: &'a str, span: Span) -> Self {
        Self {
            src,
            pos: span.start,
            end: span.end.min(src.len()),
            templates: 0,
        }
    }

    pub(crate) fn src(&self) -> &'a str {
        self.src
    }

    fn peek_char(&self) -> Option<char> {
        self.src[self.pos..self.end].chars().next()
    }

    fn char_at(&self, pos: usize) -> Option<char> {
        if pos >= self.end {
            return None;
        }
        self.src[pos..self.end].chars().next()
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..self.end]
    }

    /// Skip whitespace and comments. Returns whether a line terminator was crossed.
    pub(crate) fn skip_trivia(&mut self) -> Result<bool, ScriptError> {
        let mut nl = false;
        while let Some(c) = self.peek_char() {
            if c == '\n' {
                nl = true;
                self.pos += 1;
            } else if c.is_whitespace() {
                self.pos += c.len_utf8();
            } else if self.rest().starts_with("//") {
                match self.rest().find('\n') {
                    Some(i) => self.pos += i,
                    None => self.pos = self.end,
                }
            } else if self.rest().starts_with("/*") {
                let start = self.pos;
                match self.rest()[2..].find("*/") {
                    Some(i) => {
                        if self.rest()[..i + 2].contains('\n') {
                            nl = true;
                        }
                        self.pos += i + 4;
                    }
                    None => return Err(ScriptError::new(start, "unterminated block comment")),
                }
            } else {
                break;
            }
        }
        Ok(nl)
    }

    pub(crate) fn next_token(&mut self) -> Result<Token, ScriptError> {
        let nl_before = self.skip_trivia()?;
        let start = self.pos;
        let Some(c) = self.peek_char() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                span: Span {
                    start: self.end,
                    end: self.end,
                },
                nl_before,
            });
        };

        let kind = if c.is_ascii_digit()
            || (c == '.' && self.char_at(self.pos + 1).is_some_and(|d| d.is_ascii_digit()))
        {
            TokenKind::Number(self.lex_number()?)
        } else if is_ident_start(c) {
            while let Some(ch) = self.peek_char() {
                if !is_ident_continue(ch) {
                    break;
                }
                self.pos += ch.len_utf8();
            }
            TokenKind::Ident(self.src[start..self.pos].to_owned())
        } else if c == '"' || c == '\'' {
            TokenKind::Str(self.lex_string(c)?)
        } else if c == '`' {
            TokenKind::Template(self.lex_template()?)
        } else {
            let rest = self.rest();
            // `cond?.5:0` is a conditional followed by a number.
            let Some((text, p)) = PUNCTS.iter().find(|(text, p)| {
                rest.starts_with(text)
                    && !(*p == Punct::QuestionDot && rest[2..].starts_with(|c: char| c.is_ascii_digit()))
            }) else {
                return Err(ScriptError::new(start, format!("unexpected character '{c}'")));
            };
            self.pos += text.len();
            TokenKind::Punct(*p)
        };

        Ok(Token {
            kind,
            span: Span {
                start,
                end: self.pos,
            },
            nl_before,
        })
    }

    fn lex_number(&mut self) -> Result<f64, ScriptError> {
        let start = self.pos;
        let rest = self.rest();
        if rest.starts_with("0x") || rest.starts_with("0X") {
            self.pos += 2;
            let digits_start = self.pos;
            while self
                .peek_char()
                .is_some_and(|c| c.is_ascii_hexdigit() || c == '_')
            {
                self.pos += 1;
            }
            let digits: String = self.src[digits_start..self.pos]
                .chars()
                .filter(|c| *c != '_')
                .collect();
            return u64::from_str_radix(&digits, 16)
                .map(|v| v as f64)
                .map_err(|_| ScriptError::new(start, "invalid hex literal"));
        }

        let digits = |lx: &mut Self| {
            while lx
                .peek_char()
                .is_some_and(|c| c.is_ascii_digit() || c == '_')
            {
                lx.pos += 1;
            }
        };
        digits(self);
        if self.peek_char() == Some('.') {
            self.pos += 1;
            digits(self);
        }
        if matches!(self.peek_char(), Some('e' | 'E')) {
            let e_pos = self.pos;
            self.pos += 1;
            if matches!(self.peek_char(), Some('+' | '-')) {
                self.pos += 1;
            }
            let exp_start = self.pos;
            digits(self);
            if exp_start == self.pos {
                return Err(ScriptError::new(
                    e_pos,
                    "invalid number exponent (expected digits)",
                ));
            }
        }
        if self.peek_char().is_some_and(is_ident_start) {
            return Err(ScriptError::new(
                self.pos,
                "identifier starts immediately after numeric literal",
            ));
        }

        let text: String = self.src[start..self.pos]
            .chars()
            .filter(|c| *c != '_')
            .collect();
        text.parse()
            .map_err(|_| ScriptError::new(start, format!("invalid number '{text}'")))
    }

    fn lex_string(&mut self, quote: char) -> Result<String, ScriptError> {
        let start = self.pos;
        self.pos += 1;
        let mut out = String::new();
        loop {
            let Some(c) = self.peek_char() else {
                return Err(ScriptError::new(start, "unterminated string literal"));
            };
            self.pos += c.len_utf8();
            match c {
                c if c == quote => return Ok(out),
                '\n' => return Err(ScriptError::new(start, "unterminated string literal")),
                '\\' => self.lex_escape(&mut out, start)?,
                c => out.push(c),
            }
        }
    }

    fn lex_escape(&mut self, out: &mut String, lit_start: usize) -> Result<(), ScriptError> {
        let Some(e) = self.peek_char() else {
            return Err(ScriptError::new(lit_start, "unterminated escape sequence"));
        };
        self.pos += e.len_utf8();
        match e {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0' => out.push('\0'),
            '\n' => {}
            'x' => {
                let hex = self.src.get(self.pos..self.pos + 2).unwrap_or("");
                let v = u32::from_str_radix(hex, 16)
                    .map_err(|_| ScriptError::new(self.pos, "invalid \\x escape"))?;
                self.pos += 2;
                out.push(char::from_u32(v).unwrap_or('\u{fffd}'));
            }
            'u' => {
                let (hex, consumed) = if self.peek_char() == Some('{') {
                    let close = self.rest().find('}').ok_or_else(|| {
                        ScriptError::new(self.pos, "unterminated \\u{...} escape")
                    })?;
                    (&self.src[self.pos + 1..self.pos + close], close + 1)
                } else {
                    (self.src.get(self.pos..self.pos + 4).unwrap_or(""), 4)
                };
                let v = u32::from_str_radix(hex, 16)
                    .map_err(|_| ScriptError::new(self.pos, "invalid \\u escape"))?;
                self.pos += consumed;
                out.push(char::from_u32(v).unwrap_or('\u{fffd}'));
            }
            other => out.push(other),
        }
        Ok(())
    }

    fn lex_template(&mut self) -> Result<Vec<TemplatePart>, ScriptError> {
        let start = self.pos;
        if self.templates >= MAX_TEMPLATE_NESTING {
            return Err(ScriptError::new(start, "template literals are nested too deeply"));
        }
        self.pos += 1;
        let mut parts = Vec::new();
        let mut text = String::new();
        loop {
            let Some(c) = self.peek_char() else {
                return Err(ScriptError::new(start, "unterminated template literal"));
            };
            if c == '`' {
                self.pos += 1;
                break;
            }
            if c == '\\' {
                self.pos += 1;
                self.lex_escape(&mut text, start)?;
                continue;
            }
            if self.rest().starts_with("${") {
                if !text.is_empty() {
                    parts.push(TemplatePart::Text(std::mem::take(&mut text)));
                }
                let expr_start = self.pos + 2;
                let expr_end = self.skip_balanced(expr_start)?;
                parts.push(TemplatePart::Expr(Span {
                    start: expr_start,
                    end: expr_end,
                }));
                self.pos = expr_end + 1;
                continue;
            }
            text.push(c);
            self.pos += c.len_utf8();
        }
        if !text.is_empty() || parts.is_empty() {
            parts.push(TemplatePart::Text(text));
        }
        Ok(parts)
    }

    /// Find the `}` closing a `${` whose body starts at `from`, skipping nested braces and
    /// string/template literals. Returns the offset of that `}`.
    fn skip_balanced(&self, from: usize) -> Result<usize, ScriptError> {
        let mut probe = Lexer {
            src: self.src,
            pos: from,
            end: self.end,
            templates: self.templates + 1,
        };
        let mut depth = 0usize;
        loop {
            let tok = probe.next_token()?;
            match tok.kind {
                TokenKind::Eof => {
                    return Err(ScriptError::new(
                        from,
                        "unterminated ${...} in template literal",
                    ));
                }
                TokenKind::Punct(Punct::LBrace) => depth += 1,
                TokenKind::Punct(Punct::RBrace) => {
                    if depth == 0 {
                        return Ok(tok.span.start);
                    }
                    depth -= 1;
                }
                _ => {}
            }
        }
    }

    /// Raw JSX text up to the next `<` or `{`.
    pub(crate) fn jsx_text(&mut self) -> String {
        let rest = self.rest();
        let len = rest.find(['<', '{']).unwrap_or(rest.len());
        let text = rest[..len].to_owned();
        self.pos += len;
        text
    }

    /// Skip whitespace only (no comments) and report the next raw character.
    pub(crate) fn peek_raw_after_ws(&mut self) -> Option<char> {
        while let Some(c) = self.peek_char() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
        self.peek_char()
    }

    pub(crate) fn eat_raw(&mut self, c: char) -> bool {
        if self.peek_char() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    /// Raw JSX attribute string up to (and consuming) the closing quote `q`.
    pub(crate) fn jsx_text_until(&mut self, q: char) -> Option<String> {
        let rest = self.rest();
        let len = rest.find(q)?;
        let text = rest[..len].to_owned();
        self.pos += len + q.len_utf8();
        Some(text)
    }

    /// JSX attribute and tag names may contain `-` (`aria-label`, `stroke-width`).
    pub(crate) fn jsx_name(&mut self) -> Option<String> {
        let start = self.pos;
        let first = self.peek_char()?;
        if !is_ident_start(first) {
            return None;
        }
        while let Some(ch) = self.peek_char() {
            if !(is_ident_continue(ch) || ch == '-') {
                break;
            }
            self.pos += ch.len_utf8();
        }
        Some(self.src[start..self.pos].to_owned())
    }
}

#[cfg(test)]
pub(crate) fn lex(input: &str) -> Result<Vec<Token>, ScriptError> {
    let mut lx = Lexer::new(input);
    let mut out = Vec::new();
    loop {
        let t = lx.next_token()?;
        let eof = t.kind == TokenKind::Eof;
        out.push(t);
        if eof {
            return Ok(out);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/script/lexer.rs"]
mod tests;
