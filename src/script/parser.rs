use crate::script::ast::{
    ArrayItem, AssignOp, BinaryOp, DeclKind, Declarator, Expr, FunctionBody, FunctionDef,
    JsxAttr, JsxChild, JsxElement, JsxName, LogicalOp, MemberProp, ObjectItem, Pattern, Program,
    PropKey, PropPattern, Stmt, SwitchCase, TemplateChunk, UnaryOp,
};
use crate::script::error::ScriptError;
use crate::script::lexer::{Lexer, Punct, Span, TemplatePart, Token, TokenKind};
use std::rc::Rc;

/// Maximum syntactic nesting before the parser gives up instead of exhausting the stack.
const MAX_NESTING: u32 = 128;

const RESERVED: &[&str] = &[
    "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete", "do",
    "else", "export", "extends", "finally", "for", "function", "if", "import", "in", "instanceof",
    "new", "return", "super", "switch", "throw", "try", "typeof", "var", "void", "while", "with",
    "yield", "let", "true", "false", "null",
];

pub(crate) fn parse_program(src: &str) -> Result<Program, ScriptError> {
    let mut p = Parser::new(Lexer::new(src));
    let mut body = Vec::new();
    while !p.at_eof()? {
        body.push(p.parse_statement()?);
    }
    Ok(Program { body })
}

#[cfg(test)]
pub(crate) fn parse_expr(src: &str) -> Result<Expr, ScriptError> {
    let mut p = Parser::new(Lexer::new(src));
    let e = p.parse_expression()?;
    if !p.at_eof()? {
        let t = p.peek()?.clone();
        return Err(p.unexpected(&t));
    }
    Ok(e)
}

#[derive(Clone)]
struct Parser<'a> {
    lx: Lexer<'a>,
    peeked: Option<Token>,
    depth: u32,
}

impl<'a> Parser<'a> {
    fn new(lx: Lexer<'a>) -> Self {
        Self {
            lx,
            peeked: None,
            depth: 0,
        }
    }

    // ---- token plumbing -------------------------------------------------------------------

    fn peek(&mut self) -> Result<&Token, ScriptError> {
        if self.peeked.is_none() {
            self.peeked = Some(self.lx.next_token()?);
        }
        match &self.peeked {
            Some(t) => Ok(t),
            None => Err(ScriptError::new(self.lx.pos, "lexer produced no token")),
        }
    }

    fn bump(&mut self) -> Result<Token, ScriptError> {
        match self.peeked.take() {
            Some(t) => Ok(t),
            None => self.lx.next_token(),
        }
    }

    /// Second token of lookahead, computed on a throwaway copy of the parser.
    fn peek2(&self) -> Option<Token> {
        let mut probe = self.clone();
        probe.bump().ok()?;
        probe.bump().ok()
    }

    /// Drop any lookahead token so the lexer can be driven in raw (JSX) mode.
    fn raw(&mut self) -> &mut Lexer<'a> {
        if let Some(t) = self.peeked.take() {
            self.lx.pos = t.span.start;
        }
        &mut self.lx
    }

    fn at_eof(&mut self) -> Result<bool, ScriptError> {
        Ok(self.peek()?.kind == TokenKind::Eof)
    }

    fn is_punct(&mut self, p: Punct) -> Result<bool, ScriptError> {
        Ok(self.peek()?.kind == TokenKind::Punct(p))
    }

    fn eat_punct(&mut self, p: Punct) -> Result<bool, ScriptError> {
        if self.is_punct(p)? {
            self.bump()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect_punct(&mut self, p: Punct) -> Result<Token, ScriptError> {
        let t = self.peek()?.clone();
        if t.kind == TokenKind::Punct(p) {
            self.bump()
        } else {
            Err(ScriptError::new(
                t.span.start,
                format!("expected '{}', found {}", p.as_str(), describe(&t.kind)),
            ))
        }
    }

    fn is_kw(&mut self, kw: &str) -> Result<bool, ScriptError> {
        Ok(matches!(&self.peek()?.kind, TokenKind::Ident(s) if s == kw))
    }

    fn eat_kw(&mut self, kw: &str) -> Result<bool, ScriptError> {
        if self.is_kw(kw)? {
            self.bump()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect_kw(&mut self, kw: &str) -> Result<(), ScriptError> {
        let t = self.peek()?.clone();
        if self.eat_kw(kw)? {
            Ok(())
        } else {
            Err(ScriptError::new(
                t.span.start,
                format!("expected '{kw}', found {}", describe(&t.kind)),
            ))
        }
    }

    fn binding_ident(&mut self) -> Result<String, ScriptError> {
        let t = self.bump()?;
        match t.kind {
            TokenKind::Ident(s) if !RESERVED.contains(&s.as_str()) => Ok(s),
            other => Err(ScriptError::new(
                t.span.start,
                format!("expected identifier, found {}", describe(&other)),
            )),
        }
    }

    fn unexpected(&self, t: &Token) -> ScriptError {
        ScriptError::new(t.span.start, format!("unexpected {}", describe(&t.kind)))
    }

    fn enter(&mut self, at: usize) -> Result<(), ScriptError> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(ScriptError::new(at, "source is nested too deeply"));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Run a left-associative chain. Links are folded in a loop but each one still deepens the
    /// tree, so they count toward the nesting limit until the whole chain is parsed.
    fn chain(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<Expr, ScriptError>,
    ) -> Result<Expr, ScriptError> {
        let depth = self.depth;
        let r = f(self);
        self.depth = depth;
        r
    }

    /// Automatic semicolon insertion, lenient flavour: a statement may end at `;`, before `}`,
    /// at end of input, or at a line break.
    fn consume_semi(&mut self) -> Result<(), ScriptError> {
        if self.eat_punct(Punct::Semi)? {
            return Ok(());
        }
        let t = self.peek()?.clone();
        if t.kind == TokenKind::Eof || t.kind == TokenKind::Punct(Punct::RBrace) || t.nl_before {
            return Ok(());
        }
        Err(ScriptError::new(
            t.span.start,
            format!("expected ';' or line break, found {}", describe(&t.kind)),
        ))
    }

    // ---- statements -------------------------------------------------------------------------

    fn parse_statement(&mut self) -> Result<Stmt, ScriptError> {
        let start = self.peek()?.span.start;
        self.enter(start)?;
        let r = self.parse_statement_inner();
        self.leave();
        r
    }

    fn parse_statement_inner(&mut self) -> Result<Stmt, ScriptError> {
        let t = self.peek()?.clone();
        let kw = match &t.kind {
            TokenKind::Punct(Punct::LBrace) => return Ok(Stmt::Block(self.parse_block()?)),
            TokenKind::Punct(Punct::Semi) => {
                self.bump()?;
                return Ok(Stmt::Empty);
            }
            TokenKind::Ident(s) => s.clone(),
            _ => return self.parse_expression_statement(),
        };

        match kw.as_str() {
            "const" | "let" | "var" => {
                let s = self.parse_var_decl()?;
                self.consume_semi()?;
                Ok(s)
            }
            "function" => {
                let f = self.parse_function(true)?;
                Ok(Stmt::Function(Rc::new(f)))
            }
            "async" if self.peek2().is_some_and(|n| is_ident(&n.kind, "function")) => {
                self.bump()?;
                let f = self.parse_function(true)?;
                Ok(Stmt::Function(Rc::new(f)))
            }
            "return" => {
                self.bump()?;
                let n = self.peek()?.clone();
                let value = if n.nl_before
                    || matches!(
                        n.kind,
                        TokenKind::Eof
                            | TokenKind::Punct(Punct::Semi)
                            | TokenKind::Punct(Punct::RBrace)
                    ) {
                    None
                } else {
                    Some(self.parse_expression()?)
                };
                self.consume_semi()?;
                Ok(Stmt::Return(value))
            }
            "if" => self.parse_if(),
            "for" => self.parse_for(),
            "while" => {
                self.bump()?;
                self.expect_punct(Punct::LParen)?;
                let test = self.parse_expression()?;
                self.expect_punct(Punct::RParen)?;
                let body = Box::new(self.parse_statement()?);
                Ok(Stmt::While { test, body })
            }
            "break" => {
                self.bump()?;
                self.consume_semi()?;
                Ok(Stmt::Break)
            }
            "continue" => {
                self.bump()?;
                self.consume_semi()?;
                Ok(Stmt::Continue)
            }
            "throw" => {
                self.bump()?;
                let e = self.parse_expression()?;
                self.consume_semi()?;
                Ok(Stmt::Throw(e))
            }
            "try" => self.parse_try(),
            "switch" => self.parse_switch(),
            "class" => Err(ScriptError::new(
                t.span.start,
                "class declarations are not supported; use function components",
            )),
            "interface" if self.peek2().is_some_and(|n| is_plain_ident(&n.kind)) => {
                self.skip_interface()?;
                Ok(Stmt::Empty)
            }
            "type" if self.peek2().is_some_and(|n| is_plain_ident(&n.kind) && !n.nl_before) => {
                self.skip_type_alias()?;
                Ok(Stmt::Empty)
            }
            "export" => {
                // Stray export keywords left after normalization: keep the declaration.
                self.bump()?;
                self.eat_kw("default")?;
                if self.is_punct(Punct::LBrace)? {
                    self.skip_balanced(Punct::LBrace, Punct::RBrace)?;
                    self.consume_semi()?;
                    return Ok(Stmt::Empty);
                }
                self.parse_statement_inner()
            }
            "import" if !self.peek2().is_some_and(|n| is_punct(&n.kind, Punct::LParen)) => {
                self.skip_to_statement_end()?;
                Ok(Stmt::Empty)
            }
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_expression_statement(&mut self) -> Result<Stmt, ScriptError> {
        let e = self.parse_expression()?;
        self.consume_semi()?;
        Ok(Stmt::Expr(e))
    }

    fn parse_block(&mut self) -> Result<Vec<Stmt>, ScriptError> {
        self.expect_punct(Punct::LBrace)?;
        let mut body = Vec::new();
        loop {
            let t = self.peek()?.clone();
            match t.kind {
                TokenKind::Punct(Punct::RBrace) => {
                    self.bump()?;
                    return Ok(body);
                }
                TokenKind::Eof => {
                    return Err(ScriptError::new(t.span.start, "expected '}', found end of input"));
                }
                _ => body.push(self.parse_statement()?),
            }
        }
    }

    fn decl_kind(&mut self) -> Result<DeclKind, ScriptError> {
        let t = self.bump()?;
        match &t.kind {
            TokenKind::Ident(s) if s == "const" => Ok(DeclKind::Const),
            TokenKind::Ident(s) if s == "let" => Ok(DeclKind::Let),
            TokenKind::Ident(s) if s == "var" => Ok(DeclKind::Var),
            other => Err(ScriptError::new(
                t.span.start,
                format!("expected declaration, found {}", describe(other)),
            )),
        }
    }

    fn parse_var_decl(&mut self) -> Result<Stmt, ScriptError> {
        let start = self.peek()?.span.start;
        let kind = self.decl_kind()?;
        let mut decls = Vec::new();
        loop {
            let at = self.peek()?.span.start;
            let pattern = self.parse_binding_target()?;
            self.skip_annotation()?;
            let init = if self.eat_punct(Punct::Assign)? {
                Some(self.parse_assign()?)
            } else {
                None
            };
            if init.is_none() && (kind == DeclKind::Const || !matches!(pattern, Pattern::Ident(_)))
            {
                return Err(ScriptError::new(at, "missing initializer in declaration"));
            }
            decls.push(Declarator {
                pattern,
                init,
                span: Span {
                    start: if decls.is_empty() { start } else { at },
                    end: self.lx.pos,
                },
            });
            if !self.eat_punct(Punct::Comma)? {
                break;
            }
        }
        Ok(Stmt::VarDecl { kind, decls })
    }

    fn parse_if(&mut self) -> Result<Stmt, ScriptError> {
        self.expect_kw("if")?;
        self.expect_punct(Punct::LParen)?;
        let test = self.parse_expression()?;
        self.expect_punct(Punct::RParen)?;
        let cons = Box::new(self.parse_statement()?);
        let alt = if self.eat_kw("else")? {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(Stmt::If { test, cons, alt })
    }

    fn parse_for(&mut self) -> Result<Stmt, ScriptError> {
        self.expect_kw("for")?;
        self.expect_punct(Punct::LParen)?;

        let is_decl = self.is_kw("const")? || self.is_kw("let")? || self.is_kw("var")?;
        if is_decl {
            // `for (const x of xs)` / `for (const k in obj)`
            let mut probe = self.clone();
            let kind = probe.decl_kind()?;
            if let Ok(pattern) = probe.parse_binding_target() {
                let of = probe.is_kw("of")?;
                if of || probe.is_kw("in")? {
                    probe.bump()?;
                    *self = probe;
                    let iter = self.parse_assign()?;
                    self.expect_punct(Punct::RParen)?;
                    let body = Box::new(self.parse_statement()?);
                    return Ok(if of {
                        Stmt::ForOf {
                            kind,
                            pattern,
                            iter,
                            body,
                        }
                    } else {
                        Stmt::ForIn {
                            kind,
                            pattern,
                            object: iter,
                            body,
                        }
                    });
                }
            }
        }

        let init = if self.eat_punct(Punct::Semi)? {
            None
        } else {
            let s = if is_decl {
                self.parse_var_decl()?
            } else {
                Stmt::Expr(self.parse_expression()?)
            };
            self.expect_punct(Punct::Semi)?;
            Some(Box::new(s))
        };
        let test = if self.is_punct(Punct::Semi)? {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_punct(Punct::Semi)?;
        let update = if self.is_punct(Punct::RParen)? {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_punct(Punct::RParen)?;
        let body = Box::new(self.parse_statement()?);
        Ok(Stmt::For {
            init,
            test,
            update,
            body,
        })
    }

    fn parse_try(&mut self) -> Result<Stmt, ScriptError> {
        let start = self.peek()?.span.start;
        self.expect_kw("try")?;
        let block = self.parse_block()?;
        let mut param = None;
        let mut handler = None;
        if self.eat_kw("catch")? {
            if self.eat_punct(Punct::LParen)? {
                param = Some(self.parse_binding_target()?);
                self.skip_annotation()?;
                self.expect_punct(Punct::RParen)?;
            }
            handler = Some(self.parse_block()?);
        }
        let finalizer = if self.eat_kw("finally")? {
            Some(self.parse_block()?)
        } else {
            None
        };
        if handler.is_none() && finalizer.is_none() {
            return Err(ScriptError::new(start, "try without catch or finally"));
        }
        Ok(Stmt::Try {
            block,
            param,
            handler,
            finalizer,
        })
    }

    fn parse_switch(&mut self) -> Result<Stmt, ScriptError> {
        self.expect_kw("switch")?;
        self.expect_punct(Punct::LParen)?;
        let disc = self.parse_expression()?;
        self.expect_punct(Punct::RParen)?;
        self.expect_punct(Punct::LBrace)?;
        let mut cases = Vec::new();
        while !self.eat_punct(Punct::RBrace)? {
            let t = self.peek()?.clone();
            let test = if self.eat_kw("case")? {
                Some(self.parse_expression()?)
            } else if self.eat_kw("default")? {
                None
            } else {
                return Err(self.unexpected(&t));
            };
            self.expect_punct(Punct::Colon)?;
            let mut body = Vec::new();
            while !(self.is_kw("case")?
                || self.is_kw("default")?
                || self.is_punct(Punct::RBrace)?
                || self.at_eof()?)
            {
                body.push(self.parse_statement()?);
            }
            cases.push(SwitchCase { test, body });
        }
        Ok(Stmt::Switch { disc, cases })
    }

    // ---- TypeScript tolerance ---------------------------------------------------------------

    /// Skip `: Type` after a binding, parameter or parameter list.
    fn skip_annotation(&mut self) -> Result<(), ScriptError> {
        if self.is_punct(Punct::Question)? {
            // Optional parameter marker: `title?: string`.
            let probe = self.peek2();
            if probe.is_some_and(|n| {
                matches!(
                    n.kind,
                    TokenKind::Punct(Punct::Colon | Punct::Comma | Punct::RParen)
                )
            }) {
                self.bump()?;
            }
        }
        if self.eat_punct(Punct::Colon)? {
            self.skip_type()?;
        }
        Ok(())
    }

    /// Skip a type expression; stops before the first token that cannot continue it.
    fn skip_type(&mut self) -> Result<(), ScriptError> {
        let mut depth = 0usize;
        let mut expect_operand = true;
        // `(a: number) => void` as a type: the parenthesized group opened in operand position.
        let mut paren_operand = false;
        let mut after_fn_params = false;
        loop {
            let t = self.peek()?.clone();
            let closes_fn_params = match &t.kind {
                TokenKind::Eof => return Ok(()),
                TokenKind::Punct(p) => match p {
                    Punct::LParen | Punct::LBracket | Punct::Lt | Punct::LBrace => {
                        if *p == Punct::LBrace && depth == 0 && !expect_operand {
                            return Ok(());
                        }
                        if depth == 0 {
                            paren_operand = *p == Punct::LParen && expect_operand;
                        }
                        depth += 1;
                        expect_operand = true;
                        false
                    }
                    Punct::RParen | Punct::RBracket | Punct::RBrace | Punct::Gt => {
                        if depth == 0 {
                            return Ok(());
                        }
                        depth -= 1;
                        expect_operand = false;
                        depth == 0 && *p == Punct::RParen && paren_operand
                    }
                    Punct::Arrow if depth == 0 => {
                        if !after_fn_params {
                            return Ok(());
                        }
                        expect_operand = true;
                        false
                    }
                    Punct::Pipe | Punct::Amp | Punct::Dot | Punct::Colon | Punct::Question => {
                        expect_operand = true;
                        false
                    }
                    Punct::Comma | Punct::Semi | Punct::Assign if depth == 0 => return Ok(()),
                    _ => false,
                },
                _ => {
                    if depth == 0 && !expect_operand {
                        return Ok(());
                    }
                    expect_operand = false;
                    false
                }
            };
            after_fn_params = closes_fn_params;
            self.bump()?;
        }
    }

    /// `useState<number>(0)`: a type argument list directly followed by a call.
    fn looks_like_type_args(&self) -> bool {
        let mut probe = self.clone();
        let ok = (|| -> Result<bool, ScriptError> {
            probe.expect_punct(Punct::Lt)?;
            let mut depth = 1usize;
            while depth > 0 {
                let t = probe.bump()?;
                match t.kind {
                    TokenKind::Punct(Punct::Lt) => depth += 1,
                    TokenKind::Punct(Punct::Gt) => depth -= 1,
                    TokenKind::Ident(_) | TokenKind::Str(_) | TokenKind::Number(_) => {}
                    TokenKind::Punct(
                        Punct::Dot
                        | Punct::Comma
                        | Punct::LBracket
                        | Punct::RBracket
                        | Punct::Pipe
                        | Punct::LBrace
                        | Punct::RBrace
                        | Punct::Colon
                        | Punct::Semi,
                    ) => {}
                    _ => return Ok(false),
                }
            }
            let next = probe.peek()?;
            Ok(next.kind == TokenKind::Punct(Punct::LParen) && !next.nl_before)
        })();
        ok.unwrap_or(false)
    }

    fn skip_balanced(&mut self, open: Punct, close: Punct) -> Result<(), ScriptError> {
        let start = self.expect_punct(open)?.span.start;
        let mut depth = 1usize;
        while depth > 0 {
            let t = self.bump()?;
            match t.kind {
                TokenKind::Eof => {
                    return Err(ScriptError::new(
                        start,
                        format!("unbalanced '{}'", open.as_str()),
                    ));
                }
                TokenKind::Punct(p) if p == open => depth += 1,
                TokenKind::Punct(p) if p == close => depth -= 1,
                _ => {}
            }
        }
        Ok(())
    }

    fn skip_interface(&mut self) -> Result<(), ScriptError> {
        self.bump()?;
        while !self.is_punct(Punct::LBrace)? {
            if self.at_eof()? {
                let t = self.peek()?.clone();
                return Err(self.unexpected(&t));
            }
            self.bump()?;
        }
        self.skip_balanced(Punct::LBrace, Punct::RBrace)
    }

    fn skip_type_alias(&mut self) -> Result<(), ScriptError> {
        self.bump()?;
        self.bump()?;
        if self.is_punct(Punct::Lt)? {
            self.skip_balanced(Punct::Lt, Punct::Gt)?;
        }
        self.expect_punct(Punct::Assign)?;
        self.skip_type()?;
        self.consume_semi()
    }

    fn skip_to_statement_end(&mut self) -> Result<(), ScriptError> {
        self.bump()?;
        loop {
            let t = self.peek()?.clone();
            match t.kind {
                TokenKind::Eof => return Ok(()),
                TokenKind::Punct(Punct::Semi) => {
                    self.bump()?;
                    return Ok(());
                }
                _ if t.nl_before => return Ok(()),
                _ => {
                    self.bump()?;
                }
            }
        }
    }

    // ---- patterns ---------------------------------------------------------------------------

    fn parse_binding_target(&mut self) -> Result<Pattern, ScriptError> {
        let t = self.peek()?.clone();
        self.enter(t.span.start)?;
        let r = match t.kind {
            TokenKind::Punct(Punct::LBrace) => self.parse_object_pattern(),
            TokenKind::Punct(Punct::LBracket) => self.parse_array_pattern(),
            _ => self.binding_ident().map(Pattern::Ident),
        };
        self.leave();
        r
    }

    fn parse_binding_element(&mut self) -> Result<Pattern, ScriptError> {
        let target = self.parse_binding_target()?;
        self.skip_annotation()?;
        if self.eat_punct(Punct::Assign)? {
            let default = self.parse_assign()?;
            return Ok(Pattern::Default(Box::new(target), Box::new(default)));
        }
        Ok(target)
    }

    fn parse_object_pattern(&mut self) -> Result<Pattern, ScriptError> {
        self.expect_punct(Punct::LBrace)?;
        let mut props = Vec::new();
        let mut rest = None;
        loop {
            if self.eat_punct(Punct::RBrace)? {
                break;
            }
            if self.eat_punct(Punct::Ellipsis)? {
                rest = Some(self.binding_ident()?);
                self.eat_punct(Punct::Comma)?;
                self.expect_punct(Punct::RBrace)?;
                break;
            }
            let key = self.parse_prop_key()?;
            let value = if self.eat_punct(Punct::Colon)? {
                self.parse_binding_element()?
            } else {
                let PropKey::Named(name) = &key else {
                    let t = self.peek()?.clone();
                    return Err(ScriptError::new(
                        t.span.start,
                        "computed keys in patterns need a ': target'",
                    ));
                };
                let target = Pattern::Ident(name.clone());
                if self.eat_punct(Punct::Assign)? {
                    Pattern::Default(Box::new(target), Box::new(self.parse_assign()?))
                } else {
                    target
                }
            };
            props.push(PropPattern { key, value });
            if !self.eat_punct(Punct::Comma)? {
                self.expect_punct(Punct::RBrace)?;
                break;
            }
        }
        Ok(Pattern::Object { props, rest })
    }

    fn parse_array_pattern(&mut self) -> Result<Pattern, ScriptError> {
        self.expect_punct(Punct::LBracket)?;
        let mut items = Vec::new();
        let mut rest = None;
        loop {
            if self.eat_punct(Punct::RBracket)? {
                break;
            }
            if self.eat_punct(Punct::Comma)? {
                items.push(None);
                continue;
            }
            if self.eat_punct(Punct::Ellipsis)? {
                rest = Some(Box::new(self.parse_binding_target()?));
                self.expect_punct(Punct::RBracket)?;
                break;
            }
            items.push(Some(self.parse_binding_element()?));
            if !self.eat_punct(Punct::Comma)? {
                self.expect_punct(Punct::RBracket)?;
                break;
            }
        }
        Ok(Pattern::Array { items, rest })
    }

    fn parse_prop_key(&mut self) -> Result<PropKey, ScriptError> {
        let t = self.bump()?;
        match t.kind {
            TokenKind::Ident(s) | TokenKind::Str(s) => Ok(PropKey::Named(s)),
            TokenKind::Number(n) => Ok(PropKey::Named(crate::script::value::number_to_string(n))),
            TokenKind::Punct(Punct::LBracket) => {
                let e = self.parse_assign()?;
                self.expect_punct(Punct::RBracket)?;
                Ok(PropKey::Computed(e))
            }
            other => Err(ScriptError::new(
                t.span.start,
                format!("expected property name, found {}", describe(&other)),
            )),
        }
    }

    // ---- functions --------------------------------------------------------------------------

    fn parse_params(&mut self) -> Result<(Vec<Pattern>, Option<Pattern>), ScriptError> {
        self.expect_punct(Punct::LParen)?;
        let mut params = Vec::new();
        let mut rest = None;
        loop {
            if self.eat_punct(Punct::RParen)? {
                break;
            }
            if self.eat_punct(Punct::Ellipsis)? {
                rest = Some(self.parse_binding_target()?);
                self.skip_annotation()?;
                self.eat_punct(Punct::Comma)?;
                self.expect_punct(Punct::RParen)?;
                break;
            }
            params.push(self.parse_binding_element()?);
            if !self.eat_punct(Punct::Comma)? {
                self.expect_punct(Punct::RParen)?;
                break;
            }
        }
        Ok((params, rest))
    }

    fn parse_function(&mut self, require_name: bool) -> Result<FunctionDef, ScriptError> {
        let start = self.peek()?.span.start;
        self.expect_kw("function")?;
        let name = if self.is_punct(Punct::LParen)? {
            if require_name {
                return Err(ScriptError::new(start, "function declaration requires a name"));
            }
            None
        } else {
            Some(self.binding_ident()?)
        };
        if self.is_punct(Punct::Lt)? {
            self.skip_balanced(Punct::Lt, Punct::Gt)?;
        }
        let (params, rest) = self.parse_params()?;
        self.skip_annotation()?;
        let body = FunctionBody::Block(self.parse_block()?);
        Ok(FunctionDef {
            name,
            params,
            rest,
            body,
            is_arrow: false,
            span: Span {
                start,
                end: self.lx.pos,
            },
        })
    }

    /// Decide whether the `(` at the cursor opens an arrow function parameter list.
    fn looks_like_arrow(&self) -> bool {
        let mut probe = self.clone();
        let ok = (|| -> Result<bool, ScriptError> {
            if probe.is_punct(Punct::Lt)? {
                probe.skip_balanced(Punct::Lt, Punct::Gt)?;
            }
            probe.skip_balanced(Punct::LParen, Punct::RParen)?;
            if probe.is_punct(Punct::Arrow)? {
                return Ok(!probe.peek()?.nl_before);
            }
            if probe.eat_punct(Punct::Colon)? {
                probe.skip_type()?;
                return probe.is_punct(Punct::Arrow);
            }
            Ok(false)
        })();
        ok.unwrap_or(false)
    }

    fn parse_arrow_body(
        &mut self,
        start: usize,
        params: Vec<Pattern>,
        rest: Option<Pattern>,
    ) -> Result<Expr, ScriptError> {
        self.expect_punct(Punct::Arrow)?;
        let body = if self.is_punct(Punct::LBrace)? {
            FunctionBody::Block(self.parse_block()?)
        } else {
            FunctionBody::Expr(Box::new(self.parse_assign()?))
        };
        Ok(Expr::Function(Rc::new(FunctionDef {
            name: None,
            params,
            rest,
            body,
            is_arrow: true,
            span: Span {
                start,
                end: self.lx.pos,
            },
        })))
    }

    // ---- expressions ------------------------------------------------------------------------

    fn parse_expression(&mut self) -> Result<Expr, ScriptError> {
        let first = self.parse_assign()?;
        if !self.is_punct(Punct::Comma)? {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat_punct(Punct::Comma)? {
            items.push(self.parse_assign()?);
        }
        Ok(Expr::Sequence(items))
    }

    fn parse_assign(&mut self) -> Result<Expr, ScriptError> {
        let start = self.peek()?.span.start;
        self.enter(start)?;
        let r = self.parse_assign_inner();
        self.leave();
        r
    }

    fn parse_assign_inner(&mut self) -> Result<Expr, ScriptError> {
        let t = self.peek()?.clone();
        let start = t.span.start;

        // async arrows are evaluated synchronously.
        if is_ident(&t.kind, "async")
            && self.peek2().is_some_and(|n| {
                !n.nl_before
                    && (is_punct(&n.kind, Punct::LParen) || is_plain_ident(&n.kind))
            })
        {
            let mut probe = self.clone();
            probe.bump()?;
            if probe.looks_like_arrow() || probe.peek2().is_some_and(|n| is_punct(&n.kind, Punct::Arrow)) {
                *self = probe;
                return self.parse_assign_inner();
            }
        }

        if is_plain_ident(&t.kind)
            && self
                .peek2()
                .is_some_and(|n| is_punct(&n.kind, Punct::Arrow) && !n.nl_before)
        {
            let name = self.binding_ident()?;
            return self.parse_arrow_body(start, vec![Pattern::Ident(name)], None);
        }

        if (is_punct(&t.kind, Punct::LParen) || is_punct(&t.kind, Punct::Lt))
            && self.looks_like_arrow()
        {
            if self.is_punct(Punct::Lt)? {
                self.skip_balanced(Punct::Lt, Punct::Gt)?;
            }
            let (params, rest) = self.parse_params()?;
            self.skip_annotation()?;
            return self.parse_arrow_body(start, params, rest);
        }

        let target = self.parse_conditional()?;
        let op = match self.peek()?.kind {
            TokenKind::Punct(Punct::Assign) => AssignOp::Assign,
            TokenKind::Punct(Punct::PlusAssign) => AssignOp::Add,
            TokenKind::Punct(Punct::MinusAssign) => AssignOp::Sub,
            TokenKind::Punct(Punct::StarAssign) => AssignOp::Mul,
            TokenKind::Punct(Punct::SlashAssign) => AssignOp::Div,
            TokenKind::Punct(Punct::PercentAssign) => AssignOp::Mod,
            _ => return Ok(target),
        };
        if !matches!(target, Expr::Ident(_) | Expr::Member { .. }) {
            return Err(ScriptError::new(start, "invalid assignment target"));
        }
        self.bump()?;
        let value = self.parse_assign()?;
        Ok(Expr::Assign {
            op,
            target: Box::new(target),
            value: Box::new(value),
        })
    }

    fn parse_conditional(&mut self) -> Result<Expr, ScriptError> {
        let test = self.parse_logical_or()?;
        if !self.eat_punct(Punct::Question)? {
            return Ok(test);
        }
        let cons = self.parse_assign()?;
        self.expect_punct(Punct::Colon)?;
        let alt = self.parse_assign()?;
        Ok(Expr::Cond {
            test: Box::new(test),
            cons: Box::new(cons),
            alt: Box::new(alt),
        })
    }

    fn parse_logical_or(&mut self) -> Result<Expr, ScriptError> {
        self.chain(|p| {
            let mut e = p.parse_logical_and()?;
            loop {
                let op = if p.eat_punct(Punct::OrOr)? {
                    LogicalOp::Or
                } else if p.eat_punct(Punct::Nullish)? {
                    LogicalOp::Nullish
                } else {
                    return Ok(e);
                };
                let at = p.peek()?.span.start;
                p.enter(at)?;
                let r = p.parse_logical_and()?;
                e = Expr::Logical {
                    op,
                    left: Box::new(e),
                    right: Box::new(r),
                };
            }
        })
    }

    fn parse_logical_and(&mut self) -> Result<Expr, ScriptError> {
        self.chain(|p| {
            let mut e = p.parse_equality()?;
            while p.eat_punct(Punct::AndAnd)? {
                let at = p.peek()?.span.start;
                p.enter(at)?;
                let r = p.parse_equality()?;
                e = Expr::Logical {
                    op: LogicalOp::And,
                    left: Box::new(e),
                    right: Box::new(r),
                };
            }
            Ok(e)
        })
    }

    fn parse_equality(&mut self) -> Result<Expr, ScriptError> {
        self.chain(|p| {
            let mut e = p.parse_relational()?;
            loop {
                let op = match p.peek()?.kind {
                    TokenKind::Punct(Punct::EqEq) => BinaryOp::EqLoose,
                    TokenKind::Punct(Punct::Ne) => BinaryOp::NeLoose,
                    TokenKind::Punct(Punct::EqEqEq) => BinaryOp::EqStrict,
                    TokenKind::Punct(Punct::NeEq) => BinaryOp::NeStrict,
                    _ => return Ok(e),
                };
                p.bump()?;
                let at = p.peek()?.span.start;
                p.enter(at)?;
                let r = p.parse_relational()?;
                e = binary(op, e, r);
            }
        })
    }

    fn parse_relational(&mut self) -> Result<Expr, ScriptError> {
        self.chain(|p| {
            let mut e = p.parse_additive()?;
            loop {
                let op = match &p.peek()?.kind {
                    TokenKind::Punct(Punct::Lt) => BinaryOp::Lt,
                    TokenKind::Punct(Punct::Le) => BinaryOp::Le,
                    TokenKind::Punct(Punct::Gt) => BinaryOp::Gt,
                    TokenKind::Punct(Punct::Ge) => BinaryOp::Ge,
                    TokenKind::Ident(s) if s == "in" => BinaryOp::In,
                    TokenKind::Ident(s) if s == "as" || s == "satisfies" => {
                        p.bump()?;
                        p.skip_type()?;
                        continue;
                    }
                    _ => return Ok(e),
                };
                p.bump()?;
                let at = p.peek()?.span.start;
                p.enter(at)?;
                let r = p.parse_additive()?;
                e = binary(op, e, r);
            }
        })
    }

    fn parse_additive(&mut self) -> Result<Expr, ScriptError> {
        self.chain(|p| {
            let mut e = p.parse_multiplicative()?;
            loop {
                let op = match p.peek()?.kind {
                    TokenKind::Punct(Punct::Plus) => BinaryOp::Add,
                    TokenKind::Punct(Punct::Minus) => BinaryOp::Sub,
                    _ => return Ok(e),
                };
                p.bump()?;
                let at = p.peek()?.span.start;
                p.enter(at)?;
                let r = p.parse_multiplicative()?;
                e = binary(op, e, r);
            }
        })
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ScriptError> {
        self.chain(|p| {
            let mut e = p.parse_exponent()?;
            loop {
                let op = match p.peek()?.kind {
                    TokenKind::Punct(Punct::Star) => BinaryOp::Mul,
                    TokenKind::Punct(Punct::Slash) => BinaryOp::Div,
                    TokenKind::Punct(Punct::Percent) => BinaryOp::Mod,
                    _ => return Ok(e),
                };
                p.bump()?;
                let at = p.peek()?.span.start;
                p.enter(at)?;
                let r = p.parse_exponent()?;
                e = binary(op, e, r);
            }
        })
    }

    fn parse_exponent(&mut self) -> Result<Expr, ScriptError> {
        let base = self.parse_unary()?;
        if self.eat_punct(Punct::StarStar)? {
            let at = self.peek()?.span.start;
            self.enter(at)?;
            let exp = self.parse_exponent();
            self.leave();
            return Ok(binary(BinaryOp::Pow, base, exp?));
        }
        Ok(base)
    }

    fn parse_unary(&mut self) -> Result<Expr, ScriptError> {
        let t = self.peek()?.clone();
        self.enter(t.span.start)?;
        let r = self.parse_unary_inner(t);
        self.leave();
        r
    }

    fn parse_unary_inner(&mut self, t: Token) -> Result<Expr, ScriptError> {
        let op = match &t.kind {
            TokenKind::Punct(Punct::Minus) => Some(UnaryOp::Neg),
            TokenKind::Punct(Punct::Plus) => Some(UnaryOp::Plus),
            TokenKind::Punct(Punct::Bang) => Some(UnaryOp::Not),
            TokenKind::Ident(s) if s == "typeof" => Some(UnaryOp::TypeOf),
            TokenKind::Ident(s) if s == "void" => Some(UnaryOp::Void),
            TokenKind::Punct(Punct::PlusPlus | Punct::MinusMinus) => {
                self.bump()?;
                let target = self.parse_unary()?;
                check_update_target(&target, t.span.start)?;
                return Ok(Expr::Update {
                    increment: t.kind == TokenKind::Punct(Punct::PlusPlus),
                    prefix: true,
                    target: Box::new(target),
                });
            }
            TokenKind::Ident(s) if s == "await" => {
                self.bump()?;
                return self.parse_unary();
            }
            _ => None,
        };
        if let Some(op) = op {
            self.bump()?;
            let expr = self.parse_unary()?;
            return Ok(Expr::Unary {
                op,
                expr: Box::new(expr),
            });
        }

        let e = self.parse_call_member()?;
        let n = self.peek()?.clone();
        if !n.nl_before
            && matches!(
                n.kind,
                TokenKind::Punct(Punct::PlusPlus | Punct::MinusMinus)
            )
        {
            check_update_target(&e, n.span.start)?;
            self.bump()?;
            return Ok(Expr::Update {
                increment: n.kind == TokenKind::Punct(Punct::PlusPlus),
                prefix: false,
                target: Box::new(e),
            });
        }
        Ok(e)
    }

    fn parse_args(&mut self) -> Result<Vec<ArrayItem>, ScriptError> {
        self.expect_punct(Punct::LParen)?;
        let mut args = Vec::new();
        loop {
            if self.eat_punct(Punct::RParen)? {
                return Ok(args);
            }
            if self.eat_punct(Punct::Ellipsis)? {
                args.push(ArrayItem::Spread(self.parse_assign()?));
            } else {
                args.push(ArrayItem::Item(self.parse_assign()?));
            }
            if !self.eat_punct(Punct::Comma)? {
                self.expect_punct(Punct::RParen)?;
                return Ok(args);
            }
        }
    }

    fn parse_member_name(&mut self) -> Result<String, ScriptError> {
        let t = self.bump()?;
        match t.kind {
            TokenKind::Ident(s) => Ok(s),
            other => Err(ScriptError::new(
                t.span.start,
                format!("expected property name after '.', found {}", describe(&other)),
            )),
        }
    }

    fn parse_call_member(&mut self) -> Result<Expr, ScriptError> {
        self.chain(|p| {
            let mut e = if p.is_kw("new")? {
                p.parse_new()?
            } else {
                p.parse_primary()?
            };

            loop {
                let t = p.peek()?.clone();
                match t.kind {
                    TokenKind::Punct(Punct::Dot) => {
                        p.enter(t.span.start)?;
                        p.bump()?;
                        let name = p.parse_member_name()?;
                        e = member(e, MemberProp::Name(name), false);
                    }
                    TokenKind::Punct(Punct::QuestionDot) => {
                        p.enter(t.span.start)?;
                        p.bump()?;
                        if p.is_punct(Punct::LParen)? {
                            let args = p.parse_args()?;
                            e = Expr::Call {
                                callee: Box::new(e),
                                args,
                                optional: true,
                            };
                        } else if p.eat_punct(Punct::LBracket)? {
                            let idx = p.parse_expression()?;
                            p.expect_punct(Punct::RBracket)?;
                            e = member(e, MemberProp::Computed(Box::new(idx)), true);
                        } else {
                            let name = p.parse_member_name()?;
                            e = member(e, MemberProp::Name(name), true);
                        }
                    }
                    // A call or index on the next line starts a new statement.
                    TokenKind::Punct(Punct::LBracket) if !t.nl_before => {
                        p.enter(t.span.start)?;
                        p.bump()?;
                        let idx = p.parse_expression()?;
                        p.expect_punct(Punct::RBracket)?;
                        e = member(e, MemberProp::Computed(Box::new(idx)), false);
                    }
                    TokenKind::Punct(Punct::LParen) if !t.nl_before => {
                        p.enter(t.span.start)?;
                        let args = p.parse_args()?;
                        e = Expr::Call {
                            callee: Box::new(e),
                            args,
                            optional: false,
                        };
                    }
                    TokenKind::Punct(Punct::Lt) if !t.nl_before && p.looks_like_type_args() => {
                        p.skip_balanced(Punct::Lt, Punct::Gt)?;
                    }
                    // TypeScript non-null assertion `value!.x` / `value!)`.
                    TokenKind::Punct(Punct::Bang)
                        if !t.nl_before
                            && p.peek2().is_some_and(|n| {
                                matches!(
                                    n.kind,
                                    TokenKind::Punct(
                                        Punct::Dot
                                            | Punct::RParen
                                            | Punct::RBracket
                                            | Punct::Comma
                                            | Punct::Semi
                                    )
                                )
                            }) =>
                    {
                        p.bump()?;
                    }
                    _ => return Ok(e),
                }
            }
        })
    }

    fn parse_new(&mut self) -> Result<Expr, ScriptError> {
        self.expect_kw("new")?;
        let mut callee = self.parse_primary()?;
        while self.eat_punct(Punct::Dot)? {
            let at = self.peek()?.span.start;
            self.enter(at)?;
            let name = self.parse_member_name()?;
            callee = member(callee, MemberProp::Name(name), false);
        }
        let args = if self.is_punct(Punct::LParen)? {
            self.parse_args()?
        } else {
            Vec::new()
        };
        Ok(Expr::New {
            callee: Box::new(callee),
            args,
        })
    }

    fn parse_primary(&mut self) -> Result<Expr, ScriptError> {
        let t = self.bump()?;
        match t.kind {
            TokenKind::Number(v) => Ok(Expr::Num(v)),
            TokenKind::Str(s) => Ok(Expr::Str(Rc::from(s.as_str()))),
            TokenKind::Template(parts) => self.parse_template(parts),
            TokenKind::Ident(s) => match s.as_str() {
                "true" => Ok(Expr::Bool(true)),
                "false" => Ok(Expr::Bool(false)),
                "null" => Ok(Expr::Null),
                "undefined" => Ok(Expr::Undefined),
                "function" => {
                    self.raw().pos = t.span.start;
                    Ok(Expr::Function(Rc::new(self.parse_function(false)?)))
                }
                "class" => Err(ScriptError::new(
                    t.span.start,
                    "class expressions are not supported",
                )),
                kw if RESERVED.contains(&kw) => {
                    Err(ScriptError::new(t.span.start, format!("unexpected '{kw}'")))
                }
                _ => Ok(Expr::Ident(s)),
            },
            TokenKind::Punct(Punct::LParen) => {
                let e = self.parse_expression()?;
                self.expect_punct(Punct::RParen)?;
                Ok(e)
            }
            TokenKind::Punct(Punct::LBracket) => self.parse_array_literal(),
            TokenKind::Punct(Punct::LBrace) => self.parse_object_literal(),
            TokenKind::Punct(Punct::Lt) => Ok(Expr::Jsx(Rc::new(self.parse_jsx_after_lt(t.span.start)?))),
            TokenKind::Eof => Err(ScriptError::new(
                t.span.start,
                "unexpected end of input",
            )),
            other => Err(ScriptError::new(
                t.span.start,
                format!("unexpected {}", describe(&other)),
            )),
        }
    }

    fn parse_template(&mut self, parts: Vec<TemplatePart>) -> Result<Expr, ScriptError> {
        let mut chunks = Vec::with_capacity(parts.len());
        for part in parts {
            match part {
                TemplatePart::Text(s) => chunks.push(TemplateChunk::Text(s)),
                TemplatePart::Expr(span) => {
                    let mut sub = Parser::new(Lexer::with_range(self.lx.src(), span));
                    sub.depth = self.depth;
                    let e = sub.parse_expression()?;
                    if !sub.at_eof()? {
                        let t = sub.peek()?.clone();
                        return Err(sub.unexpected(&t));
                    }
                    chunks.push(TemplateChunk::Expr(e));
                }
            }
        }
        Ok(Expr::Template(chunks))
    }

    fn parse_array_literal(&mut self) -> Result<Expr, ScriptError> {
        let mut items = Vec::new();
        loop {
            if self.eat_punct(Punct::RBracket)? {
                return Ok(Expr::Array(items));
            }
            if self.eat_punct(Punct::Comma)? {
                items.push(ArrayItem::Hole);
                continue;
            }
            if self.eat_punct(Punct::Ellipsis)? {
                items.push(ArrayItem::Spread(self.parse_assign()?));
            } else {
                items.push(ArrayItem::Item(self.parse_assign()?));
            }
            if !self.eat_punct(Punct::Comma)? {
                self.expect_punct(Punct::RBracket)?;
                return Ok(Expr::Array(items));
            }
        }
    }

    fn parse_object_literal(&mut self) -> Result<Expr, ScriptError> {
        let mut items = Vec::new();
        loop {
            if self.eat_punct(Punct::RBrace)? {
                return Ok(Expr::Object(items));
            }
            if self.eat_punct(Punct::Ellipsis)? {
                items.push(ObjectItem::Spread(self.parse_assign()?));
            } else {
                let key_tok = self.peek()?.clone();
                let key = self.parse_prop_key()?;
                if self.eat_punct(Punct::Colon)? {
                    items.push(ObjectItem::Prop(key, self.parse_assign()?));
                } else if self.is_punct(Punct::LParen)? {
                    let (params, rest) = self.parse_params()?;
                    self.skip_annotation()?;
                    let body = FunctionBody::Block(self.parse_block()?);
                    let name = match &key {
                        PropKey::Named(n) => Some(n.clone()),
                        PropKey::Computed(_) => None,
                    };
                    items.push(ObjectItem::Prop(
                        key,
                        Expr::Function(Rc::new(FunctionDef {
                            name,
                            params,
                            rest,
                            body,
                            is_arrow: false,
                            span: Span {
                                start: key_tok.span.start,
                                end: self.lx.pos,
                            },
                        })),
                    ));
                } else {
                    match (&key, &key_tok.kind) {
                        (PropKey::Named(n), TokenKind::Ident(_)) => {
                            items.push(ObjectItem::Prop(key.clone(), Expr::Ident(n.clone())));
                        }
                        _ => {
                            let t = self.peek()?.clone();
                            return Err(ScriptError::new(
                                t.span.start,
                                format!("expected ':' after property key, found {}", describe(&t.kind)),
                            ));
                        }
                    }
                }
            }
            if !self.eat_punct(Punct::Comma)? {
                self.expect_punct(Punct::RBrace)?;
                return Ok(Expr::Object(items));
            }
        }
    }

    // ---- JSX --------------------------------------------------------------------------------

    fn jsx_tag_name(&mut self, at: usize) -> Result<JsxName, ScriptError> {
        let lx = self.raw();
        lx.peek_raw_after_ws();
        let Some(first) = lx.jsx_name() else {
            return Err(ScriptError::new(at, "expected JSX tag name"));
        };
        let mut path = vec![first];
        while lx.eat_raw('.') {
            match lx.jsx_name() {
                Some(seg) => path.push(seg),
                None => return Err(ScriptError::new(lx.pos, "expected name after '.' in JSX tag")),
            }
        }
        if path.len() == 1 && path[0].starts_with(|c: char| c.is_ascii_lowercase()) {
            return Ok(JsxName::Intrinsic(path.remove(0)));
        }
        let mut segs = path.into_iter();
        let mut e = Expr::Ident(segs.next().unwrap_or_default());
        for seg in segs {
            e = member(e, MemberProp::Name(seg), false);
        }
        Ok(JsxName::Component(e))
    }

    fn parse_jsx_after_lt(&mut self, start: usize) -> Result<JsxElement, ScriptError> {
        self.enter(start)?;
        let r = self.parse_jsx_inner(start);
        self.leave();
        r
    }

    fn parse_jsx_inner(&mut self, start: usize) -> Result<JsxElement, ScriptError> {
        let lx = self.raw();
        let name = if lx.peek_raw_after_ws() == Some('>') {
            lx.eat_raw('>');
            return self.parse_jsx_children(start, JsxName::Fragment, Vec::new());
        } else {
            self.jsx_tag_name(start)?
        };

        let mut attrs = Vec::new();
        loop {
            let lx = self.raw();
            match lx.peek_raw_after_ws() {
                Some('/') => {
                    lx.eat_raw('/');
                    lx.peek_raw_after_ws();
                    if !lx.eat_raw('>') {
                        return Err(ScriptError::new(lx.pos, "expected '>' after '/' in JSX tag"));
                    }
                    return Ok(JsxElement {
                        name,
                        attrs,
                        children: Vec::new(),
                    });
                }
                Some('>') => {
                    lx.eat_raw('>');
                    return self.parse_jsx_children(start, name, attrs);
                }
                Some('{') => {
                    lx.eat_raw('{');
                    self.expect_punct(Punct::Ellipsis)?;
                    let e = self.parse_assign()?;
                    self.expect_punct(Punct::RBrace)?;
                    attrs.push(JsxAttr::Spread(e));
                }
                Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {
                    let attr_name = lx.jsx_name().unwrap_or_default();
                    if lx.peek_raw_after_ws() != Some('=') {
                        attrs.push(JsxAttr::Named(attr_name, None));
                        continue;
                    }
                    lx.eat_raw('=');
                    match lx.peek_raw_after_ws() {
                        Some(q @ ('"' | '\'')) => {
                            let at = lx.pos;
                            lx.eat_raw(q);
                            let text = lx.jsx_text_until(q).ok_or_else(|| {
                                ScriptError::new(at, "unterminated JSX attribute string")
                            })?;
                            attrs.push(JsxAttr::Named(
                                attr_name,
                                Some(Expr::Str(Rc::from(decode_entities(&text).as_str()))),
                            ));
                        }
                        Some('{') => {
                            lx.eat_raw('{');
                            let e = self.parse_assign()?;
                            self.expect_punct(Punct::RBrace)?;
                            attrs.push(JsxAttr::Named(attr_name, Some(e)));
                        }
                        _ => {
                            return Err(ScriptError::new(
                                lx.pos,
                                "expected JSX attribute value after '='",
                            ));
                        }
                    }
                }
                Some(c) => {
                    return Err(ScriptError::new(
                        lx.pos,
                        format!("unexpected character '{c}' in JSX tag"),
                    ));
                }
                None => return Err(ScriptError::new(start, "unterminated JSX tag")),
            }
        }
    }

    fn parse_jsx_children(
        &mut self,
        start: usize,
        name: JsxName,
        attrs: Vec<JsxAttr>,
    ) -> Result<JsxElement, ScriptError> {
        let mut children = Vec::new();
        loop {
            let lx = self.raw();
            let text = lx.jsx_text();
            if let Some(clean) = clean_jsx_text(&text) {
                children.push(JsxChild::Text(clean));
            }
            let at = lx.pos;
            if lx.eat_raw('{') {
                if self.eat_punct(Punct::RBrace)? {
                    continue;
                }
                let e = if self.eat_punct(Punct::Ellipsis)? {
                    self.parse_assign()?
                } else {
                    self.parse_expression()?
                };
                self.expect_punct(Punct::RBrace)?;
                children.push(JsxChild::Expr(e));
                continue;
            }
            if !lx.eat_raw('<') {
                return Err(ScriptError::new(
                    start,
                    format!("unterminated JSX element <{}>", jsx_name_text(&name)),
                ));
            }
            if lx.peek_raw_after_ws() == Some('/') {
                lx.eat_raw('/');
                let closing = if lx.peek_raw_after_ws() == Some('>') {
                    JsxName::Fragment
                } else {
                    self.jsx_tag_name(at)?
                };
                let lx = self.raw();
                lx.peek_raw_after_ws();
                if !lx.eat_raw('>') {
                    return Err(ScriptError::new(lx.pos, "expected '>' in JSX closing tag"));
                }
                if jsx_name_text(&closing) != jsx_name_text(&name) {
                    return Err(ScriptError::new(
                        at,
                        format!(
                            "expected closing tag </{}>, found </{}>",
                            jsx_name_text(&name),
                            jsx_name_text(&closing)
                        ),
                    ));
                }
                return Ok(JsxElement {
                    name,
                    attrs,
                    children,
                });
            }
            let child = self.parse_jsx_after_lt(at)?;
            children.push(JsxChild::Expr(Expr::Jsx(Rc::new(child))));
        }
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn member(object: Expr, prop: MemberProp, optional: bool) -> Expr {
    Expr::Member {
        object: Box::new(object),
        prop,
        optional,
    }
}

fn check_update_target(e: &Expr, at: usize) -> Result<(), ScriptError> {
    if matches!(e, Expr::Ident(_) | Expr::Member { .. }) {
        Ok(())
    } else {
        Err(ScriptError::new(at, "invalid increment/decrement target"))
    }
}

fn is_ident(kind: &TokenKind, s: &str) -> bool {
    matches!(kind, TokenKind::Ident(i) if i == s)
}

fn is_plain_ident(kind: &TokenKind) -> bool {
    matches!(kind, TokenKind::Ident(i) if !RESERVED.contains(&i.as_str()))
}

fn is_punct(kind: &TokenKind, p: Punct) -> bool {
    *kind == TokenKind::Punct(p)
}

fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Ident(s) => format!("'{s}'"),
        TokenKind::Number(n) => format!("number {n}"),
        TokenKind::Str(_) => "string literal".to_owned(),
        TokenKind::Template(_) => "template literal".to_owned(),
        TokenKind::Punct(p) => format!("'{}'", p.as_str()),
        TokenKind::Eof => "end of input".to_owned(),
    }
}

fn jsx_name_text(name: &JsxName) -> String {
    fn expr_path(e: &Expr) -> String {
        match e {
            Expr::Ident(s) => s.clone(),
            Expr::Member {
                object,
                prop: MemberProp::Name(n),
                ..
            } => format!("{}.{n}", expr_path(object)),
            _ => String::new(),
        }
    }
    match name {
        JsxName::Intrinsic(s) => s.clone(),
        JsxName::Component(e) => expr_path(e),
        JsxName::Fragment => String::new(),
    }
}

/// Collapse JSX text the way React does: lines are trimmed, blank lines dropped and the rest
/// joined with single spaces.
fn clean_jsx_text(raw: &str) -> Option<String> {
    let lines: Vec<&str> = raw.split('\n').collect();
    let last = lines.len().saturating_sub(1);
    let mut out = String::new();
    for (i, line) in lines.iter().enumerate() {
        let mut l = line.trim_end_matches('\r');
        if i != 0 {
            l = l.trim_start();
        }
        if i != last {
            l = l.trim_end();
        }
        if l.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(l);
    }
    if out.is_empty() {
        None
    } else {
        Some(decode_entities(&out))
    }
}

fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_owned();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail.find(';').filter(|&end| end <= 10).and_then(|end| {
            let name = &tail[1..end];
            let ch = match name {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                "mdash" => Some('\u{2014}'),
                "hellip" => Some('\u{2026}'),
                _ => name
                    .strip_prefix("#x")
                    .and_then(|h| u32::from_str_radix(h, 16).ok())
                    .or_else(|| name.strip_prefix('#').and_then(|d| d.parse().ok()))
                    .and_then(char::from_u32),
            }?;
            Some((ch, end))
        });
        match decoded {
            Some((ch, end)) => {
                out.push(ch);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
#[path = "../../tests/unit/script/parser.rs"]
mod tests;
