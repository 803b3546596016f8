//! JavaScript script parser.
//!
//! Uses a recursive descent parser with precedence climbing for binary
//! expressions. Nodes are appended to the arena as soon as they are
//! complete. Arrow parameters are parsed as expressions first and rewritten
//! into binding patterns in place once the `=>` is seen.

use crate::ast::*;
use crate::lexer::Lexer;
use crate::span::Span;
use crate::token::{Token, TokenKind};

/// Parse error.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}..{}", self.message, self.span.start, self.span.end)
    }
}

impl std::error::Error for ParseError {}

/// The parser.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    /// Current (lookahead) token.
    current: Token,
    /// End offset of the most recently consumed token.
    prev_end: u32,
    /// The arena being built.
    ast: Ast,
    /// When false, `in` is not parsed as a binary operator (for-in init).
    allow_in: bool,
    in_function: bool,
    in_async: bool,
    in_generator: bool,
}

impl<'a> Parser<'a> {
    /// Create a new parser.
    pub fn new(source: &'a str) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token();
        Self {
            lexer,
            current,
            prev_end: 0,
            ast: Ast::new(),
            allow_in: true,
            in_function: false,
            in_async: false,
            in_generator: false,
        }
    }

    /// Parse the entire source into a tree.
    pub fn parse(mut self) -> Result<Ast, ParseError> {
        while !self.is_eof() {
            let stmt = self.parse_stmt()?;
            self.ast.body.push(stmt);
        }
        Ok(self.ast)
    }

    // =========================================================================
    // Token Handling
    // =========================================================================

    fn peek(&self) -> &TokenKind {
        &self.current.kind
    }

    /// Advance to the next token and return the previous.
    fn advance(&mut self) -> Token {
        let next = self.lexer.next_token();
        let prev = std::mem::replace(&mut self.current, next);
        self.prev_end = prev.span.end;
        prev
    }

    /// Check if the current token matches the given kind.
    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.peek()) == std::mem::discriminant(kind)
    }

    /// Check for a contextual word lexed as an identifier (`of`, `get`, ...).
    fn check_ident(&self, word: &str) -> bool {
        matches!(self.peek(), TokenKind::Identifier(name) if name == word)
    }

    fn is_eof(&self) -> bool {
        matches!(self.peek(), TokenKind::Eof)
    }

    /// Consume a token if it matches, otherwise return an error.
    fn expect(&mut self, kind: &TokenKind) -> Result<Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(ParseError::new(
                format!("Expected {:?}, got {:?}", kind, self.peek()),
                self.current.span,
            ))
        }
    }

    /// Consume the `)` closing an `if`, loop or `with` head.
    fn expect_head_close(&mut self) -> Result<(), ParseError> {
        if !self.check(&TokenKind::RParen) {
            self.expect(&TokenKind::RParen)?;
        }
        self.lexer.expect_operand();
        self.advance();
        Ok(())
    }

    /// Consume a token if it matches, returning true if consumed.
    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume a semicolon (with ASI support).
    fn expect_semicolon(&mut self) -> Result<(), ParseError> {
        if self.eat(&TokenKind::Semicolon) {
            return Ok(());
        }
        if self.check(&TokenKind::RBrace) || self.is_eof() || self.current.had_newline_before {
            return Ok(());
        }
        self.error("Expected semicolon")
    }

    fn error<T>(&self, message: impl Into<String>) -> Result<T, ParseError> {
        Err(ParseError::new(message, self.current.span))
    }

    fn start(&self) -> u32 {
        self.current.span.start
    }

    /// Allocate a node spanning from `start` to the last consumed token.
    fn finish(&mut self, kind: NodeKind, start: u32) -> NodeId {
        self.ast.push(kind, Span::new(start, self.prev_end.max(start)))
    }

    /// Whether the current token could begin an expression operand.
    fn at_expression_end(&self) -> bool {
        self.current.had_newline_before
            || matches!(
                self.peek(),
                TokenKind::Semicolon
                    | TokenKind::RBrace
                    | TokenKind::RParen
                    | TokenKind::RBracket
                    | TokenKind::Colon
                    | TokenKind::Comma
                    | TokenKind::Eof
            )
    }

    /// Run `f` with the flags of a fresh function body.
    fn with_function_context<T>(
        &mut self,
        is_async: bool,
        is_generator: bool,
        f: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        let saved = (self.in_function, self.in_async, self.in_generator, self.allow_in);
        self.in_function = true;
        self.in_async = is_async;
        self.in_generator = is_generator;
        self.allow_in = true;
        let result = f(self);
        (self.in_function, self.in_async, self.in_generator, self.allow_in) = saved;
        result
    }

    // =========================================================================
    // Statement Parsing
    // =========================================================================

    /// Parse a statement.
    fn parse_stmt(&mut self) -> Result<NodeId, ParseError> {
        let start = self.start();

        if self.check_ident("async") {
            let next = self.lexer.peek();
            if matches!(next.kind, TokenKind::Function) && !next.had_newline_before {
                self.advance();
                let func = self.parse_function(true, true)?;
                return Ok(self.finish(NodeKind::FunctionDecl(func), start));
            }
        }
        if matches!(self.peek(), TokenKind::Identifier(_))
            && matches!(self.lexer.peek().kind, TokenKind::Colon)
        {
            return self.parse_labeled_stmt();
        }

        match self.peek() {
            TokenKind::Var | TokenKind::Let | TokenKind::Const => {
                let decl = self.parse_var_decl()?;
                self.expect_semicolon()?;
                Ok(decl)
            }
            TokenKind::Function => {
                let func = self.parse_function(false, true)?;
                Ok(self.finish(NodeKind::FunctionDecl(func), start))
            }
            TokenKind::Class => {
                let class = self.parse_class(true)?;
                Ok(self.finish(NodeKind::ClassDecl(class), start))
            }
            TokenKind::LBrace => self.parse_block(),
            TokenKind::If => self.parse_if_stmt(),
            TokenKind::For => self.parse_for_stmt(),
            TokenKind::While => self.parse_while_stmt(),
            TokenKind::Do => self.parse_do_while_stmt(),
            TokenKind::Break | TokenKind::Continue => self.parse_jump_stmt(),
            TokenKind::Return => self.parse_return_stmt(),
            TokenKind::Throw => self.parse_throw_stmt(),
            TokenKind::Try => self.parse_try_stmt(),
            TokenKind::Switch => self.parse_switch_stmt(),
            TokenKind::With => self.parse_with_stmt(),
            TokenKind::Debugger => {
                self.advance();
                self.expect_semicolon()?;
                Ok(self.finish(NodeKind::Debugger, start))
            }
            TokenKind::Semicolon => {
                self.advance();
                Ok(self.finish(NodeKind::Empty, start))
            }
            TokenKind::Import | TokenKind::Export => {
                self.error("Modules are not supported; parse scripts only")
            }
            _ => self.parse_expr_stmt(),
        }
    }

    fn parse_block(&mut self) -> Result<NodeId, ParseError> {
        let start = self.start();
        let stmts = self.parse_block_body()?;
        Ok(self.finish(NodeKind::Block(stmts), start))
    }

    /// Parse `{ stmt* }` and return the statements.
    fn parse_block_body(&mut self) -> Result<Vec<NodeId>, ParseError> {
        self.expect(&TokenKind::LBrace)?;
        let mut stmts = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            if self.is_eof() {
                return self.error("Unterminated block");
            }
            stmts.push(self.parse_stmt()?);
        }
        self.expect(&TokenKind::RBrace)?;
        Ok(stmts)
    }

    /// Parse `var`/`let`/`const` declarations without the trailing semicolon.
    fn parse_var_decl(&mut self) -> Result<NodeId, ParseError> {
        let start = self.start();
        let kind = match self.peek() {
            TokenKind::Var => VarKind::Var,
            TokenKind::Let => VarKind::Let,
            TokenKind::Const => VarKind::Const,
            _ => return self.error("Expected variable declaration"),
        };
        self.advance();

        let mut declarators = Vec::new();
        loop {
            let decl_start = self.start();
            let binding = self.parse_binding_target()?;
            let init = if self.eat(&TokenKind::Eq) {
                Some(self.parse_assign_expr()?)
            } else {
                None
            };
            declarators.push(self.finish(NodeKind::Declarator { binding, init }, decl_start));
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        Ok(self.finish(NodeKind::VarDecl { kind, declarators }, start))
    }

    fn parse_if_stmt(&mut self) -> Result<NodeId, ParseError> {
        let start = self.start();
        self.expect(&TokenKind::If)?;
        self.expect(&TokenKind::LParen)?;
        let test = self.parse_expr()?;
        self.expect_head_close()?;
        let consequent = self.parse_stmt()?;
        let alternate = if self.eat(&TokenKind::Else) {
            Some(self.parse_stmt()?)
        } else {
            None
        };
        Ok(self.finish(NodeKind::If { test, consequent, alternate }, start))
    }

    fn parse_for_stmt(&mut self) -> Result<NodeId, ParseError> {
        let start = self.start();
        self.expect(&TokenKind::For)?;
        if self.check(&TokenKind::Await) {
            return self.error("for-await loops are not supported");
        }
        self.expect(&TokenKind::LParen)?;

        let saved_in = self.allow_in;
        let mut init = None;
        if !self.check(&TokenKind::Semicolon) {
            self.allow_in = false;
            let head = if matches!(self.peek(), TokenKind::Var | TokenKind::Let | TokenKind::Const) {
                self.parse_var_decl()?
            } else {
                self.parse_expr()?
            };
            self.allow_in = saved_in;

            if self.eat(&TokenKind::In) {
                let right = self.parse_expr()?;
                self.expect_head_close()?;
                let body = self.parse_stmt()?;
                return Ok(self.finish(NodeKind::ForIn { left: head, right, body }, start));
            }
            if self.check_ident("of") {
                self.advance();
                let right = self.parse_assign_expr()?;
                self.expect_head_close()?;
                let body = self.parse_stmt()?;
                return Ok(self.finish(NodeKind::ForOf { left: head, right, body }, start));
            }
            init = Some(head);
        }
        self.expect(&TokenKind::Semicolon)?;

        let test = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(&TokenKind::Semicolon)?;

        let update = if self.check(&TokenKind::RParen) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect_head_close()?;

        let body = self.parse_stmt()?;
        Ok(self.finish(NodeKind::For { init, test, update, body }, start))
    }

    fn parse_while_stmt(&mut self) -> Result<NodeId, ParseError> {
        let start = self.start();
        self.expect(&TokenKind::While)?;
        self.expect(&TokenKind::LParen)?;
        let test = self.parse_expr()?;
        self.expect_head_close()?;
        let body = self.parse_stmt()?;
        Ok(self.finish(NodeKind::While { test, body }, start))
    }

    fn parse_do_while_stmt(&mut self) -> Result<NodeId, ParseError> {
        let start = self.start();
        self.expect(&TokenKind::Do)?;
        let body = self.parse_stmt()?;
        self.expect(&TokenKind::While)?;
        self.expect(&TokenKind::LParen)?;
        let test = self.parse_expr()?;
        self.expect(&TokenKind::RParen)?;
        self.eat(&TokenKind::Semicolon);
        Ok(self.finish(NodeKind::DoWhile { body, test }, start))
    }

    /// `break` / `continue` with an optional label on the same line.
    fn parse_jump_stmt(&mut self) -> Result<NodeId, ParseError> {
        let start = self.start();
        let is_break = matches!(self.advance().kind, TokenKind::Break);
        let label = match self.peek() {
            TokenKind::Identifier(name) if !self.current.had_newline_before => {
                let name = name.clone();
                self.advance();
                Some(name)
            }
            _ => None,
        };
        self.expect_semicolon()?;
        let kind = if is_break {
            NodeKind::Break(label)
        } else {
            NodeKind::Continue(label)
        };
        Ok(self.finish(kind, start))
    }

    fn parse_return_stmt(&mut self) -> Result<NodeId, ParseError> {
        let start = self.start();
        if !self.in_function {
            return self.error("'return' outside of function");
        }
        self.expect(&TokenKind::Return)?;
        let arg = if self.at_expression_end() {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect_semicolon()?;
        Ok(self.finish(NodeKind::Return(arg), start))
    }

    fn parse_throw_stmt(&mut self) -> Result<NodeId, ParseError> {
        let start = self.start();
        self.expect(&TokenKind::Throw)?;
        if self.current.had_newline_before {
            return self.error("Illegal newline after throw");
        }
        let arg = self.parse_expr()?;
        self.expect_semicolon()?;
        Ok(self.finish(NodeKind::Throw(arg), start))
    }

    fn parse_try_stmt(&mut self) -> Result<NodeId, ParseError> {
        let start = self.start();
        self.expect(&TokenKind::Try)?;
        let block = self.parse_block()?;

        let handler = if self.check(&TokenKind::Catch) {
            let catch_start = self.start();
            self.advance();
            let param = if self.eat(&TokenKind::LParen) {
                let param = self.parse_binding_target()?;
                self.expect(&TokenKind::RParen)?;
                Some(param)
            } else {
                None
            };
            let body = self.parse_block_body()?;
            Some(self.finish(NodeKind::CatchClause { param, body }, catch_start))
        } else {
            None
        };

        let finalizer = if self.eat(&TokenKind::Finally) {
            Some(self.parse_block()?)
        } else {
            None
        };

        if handler.is_none() && finalizer.is_none() {
            return self.error("Missing catch or finally after try");
        }
        Ok(self.finish(NodeKind::Try { block, handler, finalizer }, start))
    }

    fn parse_switch_stmt(&mut self) -> Result<NodeId, ParseError> {
        let start = self.start();
        self.expect(&TokenKind::Switch)?;
        self.expect(&TokenKind::LParen)?;
        let discriminant = self.parse_expr()?;
        self.expect(&TokenKind::RParen)?;
        self.expect(&TokenKind::LBrace)?;

        let mut cases = Vec::new();
        while !self.eat(&TokenKind::RBrace) {
            let case_start = self.start();
            let test = if self.eat(&TokenKind::Case) {
                Some(self.parse_expr()?)
            } else {
                self.expect(&TokenKind::Default)?;
                None
            };
            self.expect(&TokenKind::Colon)?;

            let mut body = Vec::new();
            while !matches!(
                self.peek(),
                TokenKind::Case | TokenKind::Default | TokenKind::RBrace | TokenKind::Eof
            ) {
                body.push(self.parse_stmt()?);
            }
            cases.push(self.finish(NodeKind::SwitchCase { test, body }, case_start));
        }
        Ok(self.finish(NodeKind::Switch { discriminant, cases }, start))
    }

    fn parse_with_stmt(&mut self) -> Result<NodeId, ParseError> {
        let start = self.start();
        self.expect(&TokenKind::With)?;
        self.expect(&TokenKind::LParen)?;
        let object = self.parse_expr()?;
        self.expect_head_close()?;
        let body = self.parse_stmt()?;
        Ok(self.finish(NodeKind::With { object, body }, start))
    }

    fn parse_labeled_stmt(&mut self) -> Result<NodeId, ParseError> {
        let start = self.start();
        let label = self.expect_identifier()?;
        self.expect(&TokenKind::Colon)?;
        let body = self.parse_stmt()?;
        Ok(self.finish(NodeKind::Labeled { label, body }, start))
    }

    fn parse_expr_stmt(&mut self) -> Result<NodeId, ParseError> {
        let start = self.start();
        let expr = self.parse_expr()?;
        self.expect_semicolon()?;
        Ok(self.finish(NodeKind::ExprStmt(expr), start))
    }

    // =========================================================================
    // Bindings
    // =========================================================================

    /// Parse an identifier, array pattern or object pattern.
    fn parse_binding_target(&mut self) -> Result<NodeId, ParseError> {
        match self.peek() {
            TokenKind::LBracket => self.parse_array_pattern(),
            TokenKind::LBrace => self.parse_object_pattern(),
            _ => {
                let start = self.start();
                let name = self.expect_identifier()?;
                Ok(self.finish(NodeKind::BindingIdent(name), start))
            }
        }
    }

    /// Parse a binding target with an optional `= default`.
    fn parse_binding_element(&mut self) -> Result<NodeId, ParseError> {
        let start = self.start();
        let target = self.parse_binding_target()?;
        if self.eat(&TokenKind::Eq) {
            let default = self.parse_assign_expr()?;
            return Ok(self.finish(NodeKind::AssignPattern { target, default }, start));
        }
        Ok(target)
    }

    fn parse_rest_element(&mut self) -> Result<NodeId, ParseError> {
        let start = self.start();
        self.expect(&TokenKind::Spread)?;
        let target = self.parse_binding_target()?;
        Ok(self.finish(NodeKind::Rest(target), start))
    }

    fn parse_array_pattern(&mut self) -> Result<NodeId, ParseError> {
        let start = self.start();
        self.expect(&TokenKind::LBracket)?;
        let mut elements = Vec::new();
        while !self.eat(&TokenKind::RBracket) {
            if self.eat(&TokenKind::Comma) {
                elements.push(None);
                continue;
            }
            let element = if self.check(&TokenKind::Spread) {
                self.parse_rest_element()?
            } else {
                self.parse_binding_element()?
            };
            elements.push(Some(element));
            if !self.check(&TokenKind::RBracket) {
                self.expect(&TokenKind::Comma)?;
            }
        }
        Ok(self.finish(NodeKind::ArrayPattern(elements), start))
    }

    fn parse_object_pattern(&mut self) -> Result<NodeId, ParseError> {
        let start = self.start();
        self.expect(&TokenKind::LBrace)?;
        let mut props = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            let prop_start = self.start();
            if self.check(&TokenKind::Spread) {
                props.push(self.parse_rest_element()?);
            } else {
                let (key, computed) = self.parse_property_key()?;
                let prop = if self.eat(&TokenKind::Colon) {
                    let value = self.parse_binding_element()?;
                    NodeKind::Property {
                        key,
                        value,
                        kind: PropertyKind::Init,
                        shorthand: false,
                        computed,
                    }
                } else {
                    let name = self.shorthand_name(key, computed)?;
                    let key_span = self.ast.span(key);
                    let mut value = self.ast.push(NodeKind::BindingIdent(name), key_span);
                    if self.eat(&TokenKind::Eq) {
                        let default = self.parse_assign_expr()?;
                        value = self.finish(
                            NodeKind::AssignPattern { target: value, default },
                            key_span.start,
                        );
                    }
                    NodeKind::Property {
                        key,
                        value,
                        kind: PropertyKind::Init,
                        shorthand: true,
                        computed: false,
                    }
                };
                props.push(self.finish(prop, prop_start));
            }
            if !self.check(&TokenKind::RBrace) {
                self.expect(&TokenKind::Comma)?;
            }
        }
        self.expect(&TokenKind::RBrace)?;
        Ok(self.finish(NodeKind::ObjectPattern(props), start))
    }

    /// The name a shorthand entry binds, if `key` allows shorthand at all.
    fn shorthand_name(&self, key: NodeId, computed: bool) -> Result<String, ParseError> {
        match self.ast.kind(key) {
            NodeKind::PropName(name) if !computed => Ok(name.clone()),
            _ => self.error("Expected ':' after property key"),
        }
    }

    fn expect_identifier(&mut self) -> Result<String, ParseError> {
        match self.peek() {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            TokenKind::Yield if !self.in_generator => {
                self.advance();
                Ok("yield".to_string())
            }
            TokenKind::Await if !self.in_async => {
                self.advance();
                Ok("await".to_string())
            }
            _ => self.error(format!("Expected identifier, got {:?}", self.peek())),
        }
    }

    /// Rewrite an expression parsed as arrow parameters into a binding.
    fn to_binding(&mut self, id: NodeId) -> Result<(), ParseError> {
        let span = self.ast.span(id);
        let kind = std::mem::replace(self.ast.kind_mut(id), NodeKind::Empty);
        let converted = match kind {
            NodeKind::Ident(name) => NodeKind::BindingIdent(name),
            NodeKind::Array(elements) => {
                for element in elements.iter().flatten() {
                    self.to_binding(*element)?;
                }
                NodeKind::ArrayPattern(elements)
            }
            NodeKind::Object(props) => {
                for &prop in &props {
                    match self.ast.kind(prop) {
                        NodeKind::Property { value, kind: PropertyKind::Init, .. } => {
                            let value = *value;
                            self.to_binding(value)?;
                        }
                        NodeKind::Spread(_) => self.to_binding(prop)?,
                        _ => return Err(ParseError::new("Invalid destructuring pattern", span)),
                    }
                }
                NodeKind::ObjectPattern(props)
            }
            NodeKind::Assign { op: AssignOp::Assign, target, value } => {
                self.to_binding(target)?;
                NodeKind::AssignPattern { target, default: value }
            }
            NodeKind::Spread(arg) => {
                self.to_binding(arg)?;
                NodeKind::Rest(arg)
            }
            _ => return Err(ParseError::new("Invalid binding pattern", span)),
        };
        *self.ast.kind_mut(id) = converted;
        Ok(())
    }

    // =========================================================================
    // Functions and Classes
    // =========================================================================

    /// Parse `function [*] [name] (params) { body }`.
    fn parse_function(&mut self, is_async: bool, require_name: bool) -> Result<Function, ParseError> {
        self.expect(&TokenKind::Function)?;
        let is_generator = self.eat(&TokenKind::Star);
        let name = if matches!(self.peek(), TokenKind::Identifier(_)) {
            let start = self.start();
            let name = self.expect_identifier()?;
            Some(self.finish(NodeKind::BindingIdent(name), start))
        } else if require_name {
            return self.error("Expected function name");
        } else {
            None
        };
        self.with_function_context(is_async, is_generator, |p| {
            let params = p.parse_params()?;
            let body = p.parse_block_body()?;
            Ok(Function { name, params, body, is_async, is_generator })
        })
    }

    /// Parse the `(params) { body }` of an object or class method.
    fn parse_method_function(&mut self, is_async: bool, is_generator: bool) -> Result<NodeId, ParseError> {
        let start = self.start();
        let func = self.with_function_context(is_async, is_generator, |p| {
            let params = p.parse_params()?;
            let body = p.parse_block_body()?;
            Ok(Function { name: None, params, body, is_async, is_generator })
        })?;
        Ok(self.finish(NodeKind::FunctionExpr(func), start))
    }

    fn parse_params(&mut self) -> Result<Vec<NodeId>, ParseError> {
        self.expect(&TokenKind::LParen)?;
        let mut params = Vec::new();
        while !self.check(&TokenKind::RParen) {
            if self.check(&TokenKind::Spread) {
                params.push(self.parse_rest_element()?);
            } else {
                params.push(self.parse_binding_element()?);
            }
            if !self.check(&TokenKind::RParen) {
                self.expect(&TokenKind::Comma)?;
            }
        }
        self.expect(&TokenKind::RParen)?;
        Ok(params)
    }

    fn parse_arrow_body(&mut self, params: Vec<NodeId>, is_async: bool, start: u32) -> Result<NodeId, ParseError> {
        self.with_function_context(is_async, false, |p| {
            if p.check(&TokenKind::LBrace) {
                let body = p.parse_block()?;
                Ok(p.finish(NodeKind::Arrow { params, body, expression: false, is_async }, start))
            } else {
                let body = p.parse_assign_expr()?;
                Ok(p.finish(NodeKind::Arrow { params, body, expression: true, is_async }, start))
            }
        })
    }

    fn parse_class(&mut self, require_name: bool) -> Result<Class, ParseError> {
        self.expect(&TokenKind::Class)?;
        let name = if matches!(self.peek(), TokenKind::Identifier(_)) {
            let start = self.start();
            let name = self.expect_identifier()?;
            Some(self.finish(NodeKind::BindingIdent(name), start))
        } else if require_name {
            return self.error("Expected class name");
        } else {
            None
        };

        let super_class = if self.eat(&TokenKind::Extends) {
            Some(self.parse_left_hand_side_expr()?)
        } else {
            None
        };

        self.expect(&TokenKind::LBrace)?;
        let mut members = Vec::new();
        while !self.eat(&TokenKind::RBrace) {
            if self.is_eof() {
                return self.error("Unterminated class body");
            }
            if self.eat(&TokenKind::Semicolon) {
                continue;
            }
            members.push(self.parse_class_member()?);
        }
        Ok(Class { name, super_class, members })
    }

    /// Whether the token after a modifier word means the word is itself the
    /// member name (`static() {}`, `get = 1`).
    fn modifier_is_name(next: &Token) -> bool {
        matches!(
            next.kind,
            TokenKind::LParen
                | TokenKind::Eq
                | TokenKind::Semicolon
                | TokenKind::RBrace
                | TokenKind::Colon
                | TokenKind::Comma
        )
    }

    fn parse_class_member(&mut self) -> Result<NodeId, ParseError> {
        let start = self.start();

        let mut is_static = false;
        if self.check_ident("static") && !Self::modifier_is_name(&self.lexer.peek()) {
            self.advance();
            is_static = true;
            if self.check(&TokenKind::LBrace) {
                return self.error("Static initialization blocks are not supported");
            }
        }

        let (is_async, is_generator, accessor) = self.parse_method_modifiers()?;
        let (key, computed) = self.parse_property_key()?;

        if self.check(&TokenKind::LParen) {
            let is_constructor = !is_static
                && !computed
                && matches!(self.ast.kind(key), NodeKind::PropName(n) | NodeKind::Str(n) if n == "constructor");
            let kind = match accessor {
                Some(PropertyKind::Get) => MethodKind::Get,
                Some(PropertyKind::Set) => MethodKind::Set,
                _ if is_constructor => MethodKind::Constructor,
                _ => MethodKind::Method,
            };
            let value = self.parse_method_function(is_async, is_generator)?;
            return Ok(self.finish(
                NodeKind::ClassMethod { key, value, kind, is_static, computed },
                start,
            ));
        }

        if is_async || is_generator || accessor.is_some() {
            return self.error("Expected '(' after method name");
        }
        let value = if self.eat(&TokenKind::Eq) {
            Some(self.parse_assign_expr()?)
        } else {
            None
        };
        self.expect_semicolon()?;
        Ok(self.finish(NodeKind::ClassField { key, value, is_static, computed }, start))
    }

    /// Parse the `async`, `*`, `get` and `set` prefixes of a method.
    fn parse_method_modifiers(&mut self) -> Result<(bool, bool, Option<PropertyKind>), ParseError> {
        let mut is_async = false;
        if self.check_ident("async") {
            let next = self.lexer.peek();
            if !Self::modifier_is_name(&next) && !next.had_newline_before {
                self.advance();
                is_async = true;
            }
        }
        let is_generator = self.eat(&TokenKind::Star);

        let mut accessor = None;
        if !is_async && !is_generator && (self.check_ident("get") || self.check_ident("set")) {
            if !Self::modifier_is_name(&self.lexer.peek()) {
                accessor = if self.check_ident("get") {
                    Some(PropertyKind::Get)
                } else {
                    Some(PropertyKind::Set)
                };
                self.advance();
            }
        }
        Ok((is_async, is_generator, accessor))
    }

    /// Parse a property key. Returns the key node and whether it was computed.
    fn parse_property_key(&mut self) -> Result<(NodeId, bool), ParseError> {
        let start = self.start();
        let kind = match self.peek().clone() {
            TokenKind::Identifier(name) => NodeKind::PropName(name),
            TokenKind::String(value) => NodeKind::Str(value),
            TokenKind::Number(value) => NodeKind::Number(value),
            TokenKind::LBracket => {
                self.advance();
                let saved_in = self.allow_in;
                self.allow_in = true;
                let expr = self.parse_assign_expr()?;
                self.allow_in = saved_in;
                self.expect(&TokenKind::RBracket)?;
                return Ok((expr, true));
            }
            TokenKind::Hash => return self.error("Private class members are not supported"),
            other => match other.keyword_text() {
                Some(text) => NodeKind::PropName(text.to_string()),
                None => return self.error(format!("Unexpected token {:?} in property key", other)),
            },
        };
        self.advance();
        Ok((self.finish(kind, start), false))
    }

    // =========================================================================
    // Expression Parsing
    // =========================================================================

    /// Parse an expression, including the comma operator.
    fn parse_expr(&mut self) -> Result<NodeId, ParseError> {
        let start = self.start();
        let first = self.parse_assign_expr()?;
        if !self.check(&TokenKind::Comma) {
            return Ok(first);
        }
        let mut exprs = vec![first];
        while self.eat(&TokenKind::Comma) {
            exprs.push(self.parse_assign_expr()?);
        }
        Ok(self.finish(NodeKind::Sequence(exprs), start))
    }

    fn parse_assign_expr(&mut self) -> Result<NodeId, ParseError> {
        if self.in_generator && self.check(&TokenKind::Yield) {
            return self.parse_yield_expr();
        }

        let start = self.start();
        let left = self.parse_conditional_expr()?;

        let Some(op) = self.get_assign_op() else {
            return Ok(left);
        };
        let valid_target = match self.ast.kind(left) {
            NodeKind::Ident(_) | NodeKind::Member { optional: false, .. } => true,
            NodeKind::Object(_) | NodeKind::Array(_) => op == AssignOp::Assign,
            _ => false,
        };
        if !valid_target {
            return self.error("Invalid assignment target");
        }
        self.advance();
        let value = self.parse_assign_expr()?;
        Ok(self.finish(NodeKind::Assign { op, target: left, value }, start))
    }

    fn get_assign_op(&self) -> Option<AssignOp> {
        let op = match self.peek() {
            TokenKind::Eq => AssignOp::Assign,
            TokenKind::PlusEq => AssignOp::AddAssign,
            TokenKind::MinusEq => AssignOp::SubAssign,
            TokenKind::StarEq => AssignOp::MulAssign,
            TokenKind::SlashEq => AssignOp::DivAssign,
            TokenKind::PercentEq => AssignOp::ModAssign,
            TokenKind::StarStarEq => AssignOp::PowAssign,
            TokenKind::LtLtEq => AssignOp::ShlAssign,
            TokenKind::GtGtEq => AssignOp::ShrAssign,
            TokenKind::GtGtGtEq => AssignOp::UShrAssign,
            TokenKind::PipeEq => AssignOp::BitOrAssign,
            TokenKind::CaretEq => AssignOp::BitXorAssign,
            TokenKind::AmpEq => AssignOp::BitAndAssign,
            TokenKind::AmpAmpEq => AssignOp::AndAssign,
            TokenKind::PipePipeEq => AssignOp::OrAssign,
            TokenKind::QuestionQuestionEq => AssignOp::NullishAssign,
            _ => return None,
        };
        Some(op)
    }

    fn parse_yield_expr(&mut self) -> Result<NodeId, ParseError> {
        let start = self.start();
        self.expect(&TokenKind::Yield)?;
        let delegate = !self.current.had_newline_before && self.eat(&TokenKind::Star);
        let argument = if !delegate && self.at_expression_end() {
            None
        } else {
            Some(self.parse_assign_expr()?)
        };
        Ok(self.finish(NodeKind::Yield { argument, delegate }, start))
    }

    fn parse_conditional_expr(&mut self) -> Result<NodeId, ParseError> {
        let start = self.start();
        let test = self.parse_binary_expr(1)?;
        if !self.eat(&TokenKind::Question) {
            return Ok(test);
        }
        let saved_in = self.allow_in;
        self.allow_in = true;
        let consequent = self.parse_assign_expr()?;
        self.allow_in = saved_in;
        self.expect(&TokenKind::Colon)?;
        let alternate = self.parse_assign_expr()?;
        Ok(self.finish(NodeKind::Conditional { test, consequent, alternate }, start))
    }

    /// Precedence climbing over binary and logical operators.
    fn parse_binary_expr(&mut self, min_prec: u8) -> Result<NodeId, ParseError> {
        let start = self.start();
        let mut left = self.parse_unary_expr()?;

        loop {
            let Some(prec) = self.peek().binary_precedence() else {
                break;
            };
            if prec < min_prec || (!self.allow_in && self.check(&TokenKind::In)) {
                break;
            }
            let Some(op) = self.get_binary_op() else {
                break;
            };
            let next_min = if self.peek().is_right_associative() { prec } else { prec + 1 };
            self.advance();
            let right = self.parse_binary_expr(next_min)?;
            left = self.finish(NodeKind::Binary { op, left, right }, start);
        }

        Ok(left)
    }

    fn get_binary_op(&self) -> Option<BinaryOp> {
        let op = match self.peek() {
            TokenKind::Plus => BinaryOp::Add,
            TokenKind::Minus => BinaryOp::Sub,
            TokenKind::Star => BinaryOp::Mul,
            TokenKind::Slash => BinaryOp::Div,
            TokenKind::Percent => BinaryOp::Mod,
            TokenKind::StarStar => BinaryOp::Pow,
            TokenKind::EqEq => BinaryOp::Eq,
            TokenKind::BangEq => BinaryOp::NotEq,
            TokenKind::EqEqEq => BinaryOp::StrictEq,
            TokenKind::BangEqEq => BinaryOp::StrictNotEq,
            TokenKind::Lt => BinaryOp::Lt,
            TokenKind::LtEq => BinaryOp::LtEq,
            TokenKind::Gt => BinaryOp::Gt,
            TokenKind::GtEq => BinaryOp::GtEq,
            TokenKind::Pipe => BinaryOp::BitOr,
            TokenKind::Caret => BinaryOp::BitXor,
            TokenKind::Amp => BinaryOp::BitAnd,
            TokenKind::LtLt => BinaryOp::Shl,
            TokenKind::GtGt => BinaryOp::Shr,
            TokenKind::GtGtGt => BinaryOp::UShr,
            TokenKind::AmpAmp => BinaryOp::And,
            TokenKind::PipePipe => BinaryOp::Or,
            TokenKind::QuestionQuestion => BinaryOp::NullishCoalesce,
            TokenKind::In => BinaryOp::In,
            TokenKind::Instanceof => BinaryOp::Instanceof,
            _ => return None,
        };
        Some(op)
    }

    fn parse_unary_expr(&mut self) -> Result<NodeId, ParseError> {
        let start = self.start();
        let op = match self.peek() {
            TokenKind::Minus => Some(UnaryOp::Minus),
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Tilde => Some(UnaryOp::BitNot),
            TokenKind::Typeof => Some(UnaryOp::Typeof),
            TokenKind::Void => Some(UnaryOp::Void),
            TokenKind::Delete => Some(UnaryOp::Delete),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let argument = self.parse_unary_expr()?;
            return Ok(self.finish(NodeKind::Unary { op, argument }, start));
        }

        let update = match self.peek() {
            TokenKind::PlusPlus => Some(UpdateOp::Increment),
            TokenKind::MinusMinus => Some(UpdateOp::Decrement),
            _ => None,
        };
        if let Some(op) = update {
            self.advance();
            let argument = self.parse_unary_expr()?;
            return Ok(self.finish(NodeKind::Update { op, prefix: true, argument }, start));
        }

        if self.in_async && self.check(&TokenKind::Await) {
            self.advance();
            let argument = self.parse_unary_expr()?;
            return Ok(self.finish(NodeKind::Await(argument), start));
        }

        self.parse_postfix_expr()
    }

    fn parse_postfix_expr(&mut self) -> Result<NodeId, ParseError> {
        let start = self.start();
        let expr = self.parse_left_hand_side_expr()?;
        if self.current.had_newline_before {
            return Ok(expr);
        }
        let op = match self.peek() {
            TokenKind::PlusPlus => UpdateOp::Increment,
            TokenKind::MinusMinus => UpdateOp::Decrement,
            _ => return Ok(expr),
        };
        self.advance();
        Ok(self.finish(NodeKind::Update { op, prefix: false, argument: expr }, start))
    }

    /// Member accesses, calls, optional chains and tagged templates.
    fn parse_left_hand_side_expr(&mut self) -> Result<NodeId, ParseError> {
        let start = self.start();
        let mut expr = if self.check(&TokenKind::New) {
            self.parse_new_expr()?
        } else {
            self.parse_primary_expr()?
        };

        loop {
            match self.peek() {
                TokenKind::Dot => {
                    self.advance();
                    let property = self.parse_member_name()?;
                    expr = self.finish(
                        NodeKind::Member { object: expr, property, computed: false, optional: false },
                        start,
                    );
                }
                TokenKind::QuestionDot => {
                    self.advance();
                    expr = if self.check(&TokenKind::LParen) {
                        let args = self.parse_arguments()?;
                        self.finish(NodeKind::Call { callee: expr, args, optional: true }, start)
                    } else if self.eat(&TokenKind::LBracket) {
                        let property = self.parse_bracketed_expr()?;
                        self.finish(
                            NodeKind::Member { object: expr, property, computed: true, optional: true },
                            start,
                        )
                    } else {
                        let property = self.parse_member_name()?;
                        self.finish(
                            NodeKind::Member { object: expr, property, computed: false, optional: true },
                            start,
                        )
                    };
                }
                TokenKind::LBracket => {
                    self.advance();
                    let property = self.parse_bracketed_expr()?;
                    expr = self.finish(
                        NodeKind::Member { object: expr, property, computed: true, optional: false },
                        start,
                    );
                }
                TokenKind::LParen => {
                    let args = self.parse_arguments()?;
                    expr = self.finish(NodeKind::Call { callee: expr, args, optional: false }, start);
                }
                TokenKind::TemplateNoSub(_) | TokenKind::TemplateHead(_) => {
                    let quasi = self.parse_template()?;
                    expr = self.finish(NodeKind::TaggedTemplate { tag: expr, quasi }, start);
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    /// Parse `expr ]` after an opening bracket.
    fn parse_bracketed_expr(&mut self) -> Result<NodeId, ParseError> {
        let saved_in = self.allow_in;
        self.allow_in = true;
        let expr = self.parse_expr()?;
        self.allow_in = saved_in;
        self.expect(&TokenKind::RBracket)?;
        Ok(expr)
    }

    /// Parse the name after `.`; keywords are valid property names.
    fn parse_member_name(&mut self) -> Result<NodeId, ParseError> {
        let start = self.start();
        let name = match self.peek() {
            TokenKind::Identifier(name) => name.clone(),
            TokenKind::Hash => return self.error("Private class members are not supported"),
            other => match other.keyword_text() {
                Some(text) => text.to_string(),
                None => return self.error(format!("Expected property name, got {:?}", other)),
            },
        };
        self.advance();
        Ok(self.finish(NodeKind::PropName(name), start))
    }

    fn parse_new_expr(&mut self) -> Result<NodeId, ParseError> {
        let start = self.start();
        self.expect(&TokenKind::New)?;

        if self.eat(&TokenKind::Dot) {
            let meta = self.ast.push(NodeKind::Ident("new".to_string()), Span::new(start, start + 3));
            if !self.check_ident("target") {
                return self.error("Expected 'target' after 'new.'");
            }
            let prop_start = self.start();
            self.advance();
            let property = self.finish(NodeKind::Ident("target".to_string()), prop_start);
            return Ok(self.finish(NodeKind::MetaProperty { meta, property }, start));
        }

        let callee_start = self.start();
        let mut callee = if self.check(&TokenKind::New) {
            self.parse_new_expr()?
        } else {
            self.parse_primary_expr()?
        };
        loop {
            match self.peek() {
                TokenKind::Dot => {
                    self.advance();
                    let property = self.parse_member_name()?;
                    callee = self.finish(
                        NodeKind::Member { object: callee, property, computed: false, optional: false },
                        callee_start,
                    );
                }
                TokenKind::LBracket => {
                    self.advance();
                    let property = self.parse_bracketed_expr()?;
                    callee = self.finish(
                        NodeKind::Member { object: callee, property, computed: true, optional: false },
                        callee_start,
                    );
                }
                TokenKind::TemplateNoSub(_) | TokenKind::TemplateHead(_) => {
                    let quasi = self.parse_template()?;
                    callee = self.finish(NodeKind::TaggedTemplate { tag: callee, quasi }, callee_start);
                }
                _ => break,
            }
        }

        let args = if self.check(&TokenKind::LParen) {
            self.parse_arguments()?
        } else {
            Vec::new()
        };
        Ok(self.finish(NodeKind::New { callee, args }, start))
    }

    fn parse_arguments(&mut self) -> Result<Vec<NodeId>, ParseError> {
        self.expect(&TokenKind::LParen)?;
        let saved_in = self.allow_in;
        self.allow_in = true;
        let mut args = Vec::new();
        while !self.check(&TokenKind::RParen) {
            args.push(self.parse_spread_or_assign()?);
            if !self.check(&TokenKind::RParen) {
                self.expect(&TokenKind::Comma)?;
            }
        }
        self.allow_in = saved_in;
        self.expect(&TokenKind::RParen)?;
        Ok(args)
    }

    fn parse_spread_or_assign(&mut self) -> Result<NodeId, ParseError> {
        let start = self.start();
        if self.eat(&TokenKind::Spread) {
            let arg = self.parse_assign_expr()?;
            return Ok(self.finish(NodeKind::Spread(arg), start));
        }
        self.parse_assign_expr()
    }

    fn parse_primary_expr(&mut self) -> Result<NodeId, ParseError> {
        let start = self.start();
        let kind = match self.peek().clone() {
            TokenKind::Identifier(name) => return self.parse_identifier_expr(name),
            TokenKind::Yield | TokenKind::Await => {
                let name = self.expect_identifier()?;
                NodeKind::Ident(name)
            }
            TokenKind::Number(value) => {
                self.advance();
                NodeKind::Number(value)
            }
            TokenKind::String(value) => {
                self.advance();
                NodeKind::Str(value)
            }
            TokenKind::Regex { pattern, flags } => {
                self.advance();
                NodeKind::Regex { pattern, flags }
            }
            TokenKind::True | TokenKind::False => {
                let value = matches!(self.advance().kind, TokenKind::True);
                NodeKind::Bool(value)
            }
            TokenKind::Null => {
                self.advance();
                NodeKind::Null
            }
            TokenKind::This => {
                self.advance();
                NodeKind::This
            }
            TokenKind::Super => {
                self.advance();
                NodeKind::Super
            }
            TokenKind::TemplateNoSub(_) | TokenKind::TemplateHead(_) => return self.parse_template(),
            TokenKind::LParen => return self.parse_paren_or_arrow(false, start),
            TokenKind::LBracket => return self.parse_array_literal(),
            TokenKind::LBrace => return self.parse_object_literal(),
            TokenKind::Function => {
                let func = self.parse_function(false, false)?;
                NodeKind::FunctionExpr(func)
            }
            TokenKind::Class => {
                let class = self.parse_class(false)?;
                NodeKind::ClassExpr(class)
            }
            TokenKind::New => return self.parse_new_expr(),
            TokenKind::Hash => return self.error("Private class members are not supported"),
            TokenKind::Import => return self.error("Modules are not supported; parse scripts only"),
            other => return self.error(format!("Unexpected token {:?}", other)),
        };
        Ok(self.finish(kind, start))
    }

    /// An identifier in expression position: a reference, an arrow
    /// parameter, or the start of an `async` function or arrow.
    fn parse_identifier_expr(&mut self, name: String) -> Result<NodeId, ParseError> {
        let start = self.start();

        if name == "async" {
            let next = self.lexer.peek();
            if !next.had_newline_before {
                match next.kind {
                    TokenKind::Function => {
                        self.advance();
                        let func = self.parse_function(true, false)?;
                        return Ok(self.finish(NodeKind::FunctionExpr(func), start));
                    }
                    TokenKind::Identifier(_) => {
                        self.advance();
                        let param_start = self.start();
                        let param_name = self.expect_identifier()?;
                        let param = self.finish(NodeKind::BindingIdent(param_name), param_start);
                        self.expect(&TokenKind::Arrow)?;
                        return self.parse_arrow_body(vec![param], true, start);
                    }
                    TokenKind::LParen => {
                        self.advance();
                        return self.parse_paren_or_arrow(true, start);
                    }
                    _ => {}
                }
            }
        }

        self.advance();
        if self.check(&TokenKind::Arrow) && !self.current.had_newline_before {
            let param = self.finish(NodeKind::BindingIdent(name), start);
            self.advance();
            return self.parse_arrow_body(vec![param], false, start);
        }
        Ok(self.finish(NodeKind::Ident(name), start))
    }

    /// Parse `( ... )`: a parenthesized expression, arrow parameters, or the
    /// arguments of a call to a function named `async`.
    fn parse_paren_or_arrow(&mut self, is_async: bool, start: u32) -> Result<NodeId, ParseError> {
        self.expect(&TokenKind::LParen)?;
        let saved_in = self.allow_in;
        self.allow_in = true;
        let mut items = Vec::new();
        while !self.check(&TokenKind::RParen) {
            items.push(self.parse_spread_or_assign()?);
            if !self.check(&TokenKind::RParen) {
                self.expect(&TokenKind::Comma)?;
            }
        }
        self.expect(&TokenKind::RParen)?;
        self.allow_in = saved_in;

        if self.check(&TokenKind::Arrow) && !self.current.had_newline_before {
            self.advance();
            for &item in &items {
                self.to_binding(item)?;
            }
            return self.parse_arrow_body(items, is_async, start);
        }

        if is_async {
            let callee = self.ast.push(NodeKind::Ident("async".to_string()), Span::new(start, start + 5));
            return Ok(self.finish(NodeKind::Call { callee, args: items, optional: false }, start));
        }

        if items.iter().any(|&item| matches!(self.ast.kind(item), NodeKind::Spread(_))) {
            return self.error("Unexpected spread in parenthesized expression");
        }
        match items.len() {
            0 => self.error("Expected expression"),
            1 => Ok(items[0]),
            _ => Ok(self.finish(NodeKind::Sequence(items), start)),
        }
    }

    fn parse_array_literal(&mut self) -> Result<NodeId, ParseError> {
        let start = self.start();
        self.expect(&TokenKind::LBracket)?;
        let saved_in = self.allow_in;
        self.allow_in = true;
        let mut elements = Vec::new();
        while !self.eat(&TokenKind::RBracket) {
            if self.eat(&TokenKind::Comma) {
                elements.push(None);
                continue;
            }
            elements.push(Some(self.parse_spread_or_assign()?));
            if !self.check(&TokenKind::RBracket) {
                self.expect(&TokenKind::Comma)?;
            }
        }
        self.allow_in = saved_in;
        Ok(self.finish(NodeKind::Array(elements), start))
    }

    fn parse_object_literal(&mut self) -> Result<NodeId, ParseError> {
        let start = self.start();
        self.expect(&TokenKind::LBrace)?;
        let saved_in = self.allow_in;
        self.allow_in = true;
        let mut props = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            if self.is_eof() {
                return self.error("Unterminated object literal");
            }
            props.push(self.parse_object_member()?);
            if !self.check(&TokenKind::RBrace) {
                self.expect(&TokenKind::Comma)?;
            }
        }
        self.expect(&TokenKind::RBrace)?;
        self.allow_in = saved_in;
        Ok(self.finish(NodeKind::Object(props), start))
    }

    fn parse_object_member(&mut self) -> Result<NodeId, ParseError> {
        let start = self.start();
        if self.eat(&TokenKind::Spread) {
            let arg = self.parse_assign_expr()?;
            return Ok(self.finish(NodeKind::Spread(arg), start));
        }

        let (is_async, is_generator, accessor) = self.parse_method_modifiers()?;
        let (key, computed) = self.parse_property_key()?;

        if self.check(&TokenKind::LParen) {
            let value = self.parse_method_function(is_async, is_generator)?;
            let kind = accessor.unwrap_or(PropertyKind::Method);
            return Ok(self.finish(
                NodeKind::Property { key, value, kind, shorthand: false, computed },
                start,
            ));
        }
        if is_async || is_generator || accessor.is_some() {
            return self.error("Expected '(' after method name");
        }

        if self.eat(&TokenKind::Colon) {
            let value = self.parse_assign_expr()?;
            return Ok(self.finish(
                NodeKind::Property { key, value, kind: PropertyKind::Init, shorthand: false, computed },
                start,
            ));
        }

        // Shorthand `{ x }`, or `{ x = 1 }` when the literal is really a
        // destructuring target.
        let name = self.shorthand_name(key, computed)?;
        let key_span = self.ast.span(key);
        let mut value = self.ast.push(NodeKind::Ident(name), key_span);
        if self.eat(&TokenKind::Eq) {
            let default = self.parse_assign_expr()?;
            value = self.finish(
                NodeKind::Assign { op: AssignOp::Assign, target: value, value: default },
                key_span.start,
            );
        }
        Ok(self.finish(
            NodeKind::Property { key, value, kind: PropertyKind::Init, shorthand: true, computed: false },
            start,
        ))
    }

    fn parse_template(&mut self) -> Result<NodeId, ParseError> {
        let start = self.start();
        match self.peek().clone() {
            TokenKind::TemplateNoSub(text) => {
                self.advance();
                Ok(self.finish(NodeKind::Template { quasis: vec![text], exprs: Vec::new() }, start))
            }
            TokenKind::TemplateHead(text) => {
                self.advance();
                let saved_in = self.allow_in;
                self.allow_in = true;
                let mut quasis = vec![text];
                let mut exprs = Vec::new();
                loop {
                    exprs.push(self.parse_expr()?);
                    if !self.check(&TokenKind::RBrace) {
                        return self.error("Expected '}' in template literal");
                    }
                    self.current = self.lexer.scan_template_continuation();
                    match self.peek().clone() {
                        TokenKind::TemplateMiddle(text) => {
                            quasis.push(text);
                            self.advance();
                        }
                        TokenKind::TemplateTail(text) => {
                            quasis.push(text);
                            self.advance();
                            break;
                        }
                        _ => return self.error("Unterminated template literal"),
                    }
                }
                self.allow_in = saved_in;
                Ok(self.finish(NodeKind::Template { quasis, exprs }, start))
            }
            other => self.error(format!("Expected template literal, got {:?}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Result<Ast, ParseError> {
        Parser::new(source).parse()
    }

    fn first_expr(ast: &Ast) -> NodeId {
        match ast.kind(ast.body[0]) {
            NodeKind::ExprStmt(expr) => *expr,
            other => panic!("expected expression statement, got {:?}", other),
        }
    }

    #[test]
    fn test_variable_declaration() {
        let ast = parse("let x = 1;").unwrap();
        assert_eq!(ast.body.len(), 1);
        let NodeKind::VarDecl { kind, declarators } = ast.kind(ast.body[0]) else {
            panic!("expected var decl");
        };
        assert_eq!(*kind, VarKind::Let);
        let NodeKind::Declarator { binding, init } = ast.kind(declarators[0]) else {
            panic!("expected declarator");
        };
        assert_eq!(ast.name(*binding), Some("x"));
        assert!(matches!(ast.kind(init.unwrap()), NodeKind::Number(n) if *n == 1.0));
    }

    #[test]
    fn test_member_property_is_prop_name() {
        let ast = parse("o.foo;").unwrap();
        let NodeKind::Member { object, property, computed, .. } = ast.kind(first_expr(&ast)) else {
            panic!("expected member");
        };
        assert!(!computed);
        assert!(matches!(ast.kind(*object), NodeKind::Ident(n) if n == "o"));
        assert!(matches!(ast.kind(*property), NodeKind::PropName(n) if n == "foo"));
    }

    #[test]
    fn test_keyword_property_names() {
        let ast = parse("o.default = { class: 1, new() {} };").unwrap();
        assert_eq!(ast.body.len(), 1);
    }

    #[test]
    fn test_shorthand_property_owns_two_nodes() {
        let ast = parse("var o = {x};").unwrap();
        let prop = ast
            .ids()
            .find(|&id| matches!(ast.kind(id), NodeKind::Property { .. }))
            .unwrap();
        let NodeKind::Property { key, value, shorthand, .. } = ast.kind(prop) else {
            unreachable!();
        };
        assert!(shorthand);
        assert_ne!(key, value);
        assert!(matches!(ast.kind(*key), NodeKind::PropName(n) if n == "x"));
        assert!(matches!(ast.kind(*value), NodeKind::Ident(n) if n == "x"));
    }

    #[test]
    fn test_computed_and_string_keys() {
        let ast = parse(r#"o = {"foo": 1, ["bar"]: 2, baz: 3};"#).unwrap();
        let computed: Vec<bool> = ast
            .ids()
            .filter_map(|id| match ast.kind(id) {
                NodeKind::Property { computed, .. } => Some(*computed),
                _ => None,
            })
            .collect();
        assert_eq!(computed, vec![false, true, false]);
    }

    #[test]
    fn test_new_target() {
        let ast = parse("function F() { new.target; }").unwrap();
        assert!(ast
            .ids()
            .any(|id| matches!(ast.kind(id), NodeKind::MetaProperty { .. })));
    }

    #[test]
    fn test_arrow_params_become_bindings() {
        let ast = parse("f = ({a, b: [c]}, ...rest) => a + c;").unwrap();
        let names: Vec<&str> = ast
            .ids()
            .filter_map(|id| match ast.kind(id) {
                NodeKind::BindingIdent(name) => Some(name.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(names, vec!["a", "c", "rest"]);
        assert!(ast.ids().any(|id| matches!(ast.kind(id), NodeKind::ObjectPattern(_))));
    }

    #[test]
    fn test_class_members() {
        let ast = parse("class C extends B { constructor() { super(); } static get x() { return 1; } y = 2; }").unwrap();
        let kinds: Vec<MethodKind> = ast
            .ids()
            .filter_map(|id| match ast.kind(id) {
                NodeKind::ClassMethod { kind, .. } => Some(*kind),
                _ => None,
            })
            .collect();
        assert_eq!(kinds, vec![MethodKind::Constructor, MethodKind::Get]);
        assert!(ast.ids().any(|id| matches!(ast.kind(id), NodeKind::ClassField { .. })));
    }

    #[test]
    fn test_for_in_and_of() {
        let ast = parse("for (var k in o) {} for (const v of list) {}").unwrap();
        assert!(matches!(ast.kind(ast.body[0]), NodeKind::ForIn { .. }));
        assert!(matches!(ast.kind(ast.body[1]), NodeKind::ForOf { .. }));
    }

    #[test]
    fn test_asi() {
        let ast = parse("a = 1\nb = 2\n").unwrap();
        assert_eq!(ast.body.len(), 2);
    }

    #[test]
    fn test_template_with_substitutions() {
        let ast = parse("`a${x}b${y}c`;").unwrap();
        let NodeKind::Template { quasis, exprs } = ast.kind(first_expr(&ast)) else {
            panic!("expected template");
        };
        assert_eq!(quasis, &vec!["a".to_string(), "b".to_string(), "c".to_string()]);
        assert_eq!(exprs.len(), 2);
    }

    #[test]
    fn test_regex_after_statement_head() {
        let ast = parse("if (x) /re/.test(y);").unwrap();
        let NodeKind::If { consequent, .. } = ast.kind(ast.body[0]) else {
            panic!("expected if statement");
        };
        let NodeKind::ExprStmt(call) = ast.kind(*consequent) else {
            panic!("expected expression statement");
        };
        let NodeKind::Call { callee, .. } = ast.kind(*call) else {
            panic!("expected call");
        };
        let NodeKind::Member { object, .. } = ast.kind(*callee) else {
            panic!("expected member");
        };
        assert!(matches!(ast.kind(*object), NodeKind::Regex { pattern, .. } if pattern == "re"));

        assert!(parse("while (i) /x/g.exec(s);").is_ok());
        assert!(parse("for (;;) /x/.test(s);").is_ok());
        assert!(parse("for (k in o) /x/.test(k);").is_ok());
        // A parenthesised operand is still divided.
        assert!(parse("var r = (a) / b;").is_ok());
    }

    #[test]
    fn test_errors() {
        assert!(parse("import x from 'y';").is_err());
        assert!(parse("return 1;").is_err());
        assert!(parse("var = 1;").is_err());
        assert!(parse("1 = 2;").is_err());
        let err = parse("class A { #x = 1 }").unwrap_err();
        assert!(err.message.contains("Private"));
    }
}
