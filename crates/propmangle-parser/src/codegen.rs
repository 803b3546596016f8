//! JavaScript code generator.
//!
//! Converts an arena tree back to JavaScript source code, with an optional
//! minified layout. Parentheses are re-derived from operator precedence, so a
//! tree whose names were rewritten prints as valid source.

use crate::ast::*;

/// Code generation options.
#[derive(Debug, Clone, Default)]
pub struct CodegenOptions {
    /// Minify output (drop optional whitespace and newlines).
    pub minify: bool,
    /// Indent string (default: "  ").
    pub indent: Option<String>,
}

/// The code generator.
pub struct Codegen<'a> {
    /// The tree to generate code from.
    ast: &'a Ast,
    options: CodegenOptions,
    output: String,
    indent_level: usize,
    indent_str: String,
    /// Whether we need a semicolon before the next token (minify only).
    needs_semicolon: bool,
    /// Set while printing a `for` initializer, where a bare `in` would be
    /// read as a for-in loop.
    no_in: bool,
}

impl<'a> Codegen<'a> {
    /// Create a new code generator.
    pub fn new(ast: &'a Ast, options: CodegenOptions) -> Self {
        let indent_str = options.indent.clone().unwrap_or_else(|| "  ".to_string());
        Self {
            ast,
            options,
            output: String::new(),
            indent_level: 0,
            indent_str,
            needs_semicolon: false,
            no_in: false,
        }
    }

    /// Generate JavaScript source code.
    pub fn generate(mut self) -> String {
        for &stmt in &self.ast.body {
            self.emit_stmt(stmt);
            if !self.options.minify {
                self.emit_newline();
            }
        }
        self.output
    }

    // =========================================================================
    // Output Helpers
    // =========================================================================

    fn emit(&mut self, s: &str) {
        if self.needs_semicolon {
            self.output.push(';');
            self.needs_semicolon = false;
        }
        if let (Some(last), Some(first)) = (self.output.chars().next_back(), s.chars().next()) {
            // Keep adjacent words, `+ +`, `- -` and `/ /` from fusing.
            let fuses = (is_word_char(last) && is_word_char(first))
                || (last == first && matches!(first, '+' | '-' | '/'));
            if fuses {
                self.output.push(' ');
            }
        }
        self.output.push_str(s);
    }

    /// Emit text verbatim, without separating it from the previous token.
    fn emit_raw(&mut self, s: &str) {
        self.output.push_str(s);
    }

    fn emit_space(&mut self) {
        if !self.options.minify {
            self.output.push(' ');
        }
    }

    fn emit_newline(&mut self) {
        if !self.options.minify {
            self.output.push('\n');
            for _ in 0..self.indent_level {
                self.output.push_str(&self.indent_str);
            }
        }
    }

    fn emit_semicolon(&mut self) {
        if self.options.minify {
            self.needs_semicolon = true;
        } else {
            self.output.push(';');
        }
    }

    fn indent(&mut self) {
        self.indent_level += 1;
    }

    fn dedent(&mut self) {
        self.indent_level = self.indent_level.saturating_sub(1);
    }

    fn emit_comma_list(&mut self, items: &[NodeId], prec: u8) {
        for (i, &item) in items.iter().enumerate() {
            if i > 0 {
                self.emit(",");
                self.emit_space();
            }
            self.emit_expr_with_prec(item, prec);
        }
    }

    // =========================================================================
    // Statement Emission
    // =========================================================================

    fn emit_stmt(&mut self, id: NodeId) {
        match self.ast.kind(id) {
            NodeKind::VarDecl { kind, declarators } => {
                self.emit_var_decl(*kind, declarators);
                self.emit_semicolon();
            }
            NodeKind::FunctionDecl(func) => self.emit_function(func),
            NodeKind::ClassDecl(class) => self.emit_class(class),
            NodeKind::Block(stmts) => self.emit_block(stmts),
            NodeKind::ExprStmt(expr) => {
                let expr = *expr;
                if self.starts_with_declaration_token(expr) {
                    self.emit("(");
                    self.emit_expr(expr);
                    self.emit(")");
                } else {
                    self.emit_expr(expr);
                }
                self.emit_semicolon();
            }
            NodeKind::If { test, consequent, alternate } => {
                self.emit("if");
                self.emit_space();
                self.emit("(");
                self.emit_expr(*test);
                self.emit(")");
                self.emit_space();
                self.emit_stmt(*consequent);
                if let Some(alt) = alternate {
                    self.emit_space();
                    self.emit("else");
                    self.emit_space();
                    self.emit_stmt(*alt);
                }
            }
            NodeKind::For { init, test, update, body } => {
                self.emit("for");
                self.emit_space();
                self.emit("(");
                if let Some(init) = init {
                    self.no_in = true;
                    self.emit_for_head(*init);
                    self.no_in = false;
                }
                self.emit(";");
                if let Some(test) = test {
                    self.emit_space();
                    self.emit_expr(*test);
                }
                self.emit(";");
                if let Some(update) = update {
                    self.emit_space();
                    self.emit_expr(*update);
                }
                self.emit(")");
                self.emit_space();
                self.emit_stmt(*body);
            }
            NodeKind::ForIn { left, right, body } | NodeKind::ForOf { left, right, body } => {
                let keyword = if matches!(self.ast.kind(id), NodeKind::ForIn { .. }) { "in" } else { "of" };
                self.emit("for");
                self.emit_space();
                self.emit("(");
                self.emit_for_head(*left);
                self.emit(" ");
                self.emit(keyword);
                self.emit(" ");
                self.emit_expr_with_prec(*right, 2);
                self.emit(")");
                self.emit_space();
                self.emit_stmt(*body);
            }
            NodeKind::While { test, body } => {
                self.emit("while");
                self.emit_space();
                self.emit("(");
                self.emit_expr(*test);
                self.emit(")");
                self.emit_space();
                self.emit_stmt(*body);
            }
            NodeKind::DoWhile { body, test } => {
                self.emit("do");
                self.emit_space();
                self.emit_stmt(*body);
                self.emit_space();
                self.emit("while");
                self.emit_space();
                self.emit("(");
                self.emit_expr(*test);
                self.emit(")");
                self.emit_semicolon();
            }
            NodeKind::Return(arg) => {
                self.emit("return");
                if let Some(arg) = arg {
                    self.emit_space();
                    self.emit_expr(*arg);
                }
                self.emit_semicolon();
            }
            NodeKind::Throw(arg) => {
                self.emit("throw");
                self.emit_space();
                self.emit_expr(*arg);
                self.emit_semicolon();
            }
            NodeKind::Break(label) | NodeKind::Continue(label) => {
                let keyword = if matches!(self.ast.kind(id), NodeKind::Break(_)) { "break" } else { "continue" };
                self.emit(keyword);
                if let Some(label) = label {
                    self.emit(" ");
                    self.emit(label);
                }
                self.emit_semicolon();
            }
            NodeKind::Try { block, handler, finalizer } => {
                self.emit("try");
                self.emit_space();
                self.emit_stmt(*block);
                if let Some(handler) = handler {
                    self.emit_space();
                    self.emit_stmt(*handler);
                }
                if let Some(finalizer) = finalizer {
                    self.emit_space();
                    self.emit("finally");
                    self.emit_space();
                    self.emit_stmt(*finalizer);
                }
            }
            NodeKind::CatchClause { param, body } => {
                self.emit("catch");
                self.emit_space();
                if let Some(param) = param {
                    self.emit("(");
                    self.emit_binding(*param);
                    self.emit(")");
                    self.emit_space();
                }
                self.emit_block(body);
            }
            NodeKind::Switch { discriminant, cases } => {
                self.emit("switch");
                self.emit_space();
                self.emit("(");
                self.emit_expr(*discriminant);
                self.emit(")");
                self.emit_space();
                self.emit("{");
                self.indent();
                for &case in cases {
                    self.emit_newline();
                    self.emit_stmt(case);
                }
                self.dedent();
                if !cases.is_empty() {
                    self.emit_newline();
                }
                self.emit("}");
            }
            NodeKind::SwitchCase { test, body } => {
                match test {
                    Some(test) => {
                        self.emit("case");
                        self.emit(" ");
                        self.emit_expr(*test);
                    }
                    None => self.emit("default"),
                }
                self.emit(":");
                self.indent();
                for &stmt in body {
                    self.emit_newline();
                    self.emit_stmt(stmt);
                }
                self.dedent();
            }
            NodeKind::Labeled { label, body } => {
                self.emit(label);
                self.emit(":");
                self.emit_space();
                self.emit_stmt(*body);
            }
            NodeKind::With { object, body } => {
                self.emit("with");
                self.emit_space();
                self.emit("(");
                self.emit_expr(*object);
                self.emit(")");
                self.emit_space();
                self.emit_stmt(*body);
            }
            NodeKind::Declarator { binding, init } => {
                self.emit_binding(*binding);
                if let Some(init) = init {
                    self.emit_space();
                    self.emit("=");
                    self.emit_space();
                    self.emit_expr_with_prec(*init, 2);
                }
            }
            NodeKind::Empty => self.emit(";"),
            NodeKind::Debugger => {
                self.emit("debugger");
                self.emit_semicolon();
            }
            _ => {
                self.emit_expr(id);
                self.emit_semicolon();
            }
        }
    }

    fn emit_block(&mut self, stmts: &[NodeId]) {
        self.emit("{");
        if !stmts.is_empty() {
            self.indent();
            for &stmt in stmts {
                self.emit_newline();
                self.emit_stmt(stmt);
            }
            self.dedent();
            self.emit_newline();
        }
        self.emit("}");
    }

    fn emit_var_decl(&mut self, kind: VarKind, declarators: &[NodeId]) {
        match kind {
            VarKind::Var => self.emit("var"),
            VarKind::Let => self.emit("let"),
            VarKind::Const => self.emit("const"),
        }
        self.emit(" ");

        for (i, &decl) in declarators.iter().enumerate() {
            if i > 0 {
                self.emit(",");
                self.emit_space();
            }
            if let NodeKind::Declarator { binding, init } = self.ast.kind(decl) {
                self.emit_binding(*binding);
                if let Some(init) = init {
                    self.emit_space();
                    self.emit("=");
                    self.emit_space();
                    self.emit_expr_with_prec(*init, 2);
                }
            }
        }
    }

    /// The head of a `for` loop: a declaration without semicolon, or an
    /// expression.
    fn emit_for_head(&mut self, id: NodeId) {
        match self.ast.kind(id) {
            NodeKind::VarDecl { kind, declarators } => self.emit_var_decl(*kind, declarators),
            _ => self.emit_expr_with_prec(id, 2),
        }
    }

    /// Whether an expression statement would begin with `{`, `function` or
    /// `class` and so be misread as a declaration.
    fn starts_with_declaration_token(&self, mut id: NodeId) -> bool {
        loop {
            id = match self.ast.kind(id) {
                NodeKind::Object(_) | NodeKind::FunctionExpr(_) | NodeKind::ClassExpr(_) => return true,
                NodeKind::Member { object, .. } => *object,
                NodeKind::Call { callee, .. } => *callee,
                NodeKind::TaggedTemplate { tag, .. } => *tag,
                NodeKind::Binary { left, .. } => *left,
                NodeKind::Assign { target, .. } => *target,
                NodeKind::Conditional { test, .. } => *test,
                NodeKind::Update { prefix: false, argument, .. } => *argument,
                NodeKind::Sequence(exprs) if !exprs.is_empty() => exprs[0],
                _ => return false,
            };
        }
    }

    // =========================================================================
    // Bindings
    // =========================================================================

    fn emit_binding(&mut self, id: NodeId) {
        match self.ast.kind(id) {
            NodeKind::BindingIdent(name) => self.emit(name),
            NodeKind::ArrayPattern(elements) => self.emit_array_elements(elements, true),
            NodeKind::ObjectPattern(props) => {
                self.emit("{");
                for (i, &prop) in props.iter().enumerate() {
                    if i > 0 {
                        self.emit(",");
                        self.emit_space();
                    }
                    self.emit_object_member(prop);
                }
                self.emit("}");
            }
            NodeKind::AssignPattern { target, default } => {
                self.emit_binding(*target);
                self.emit_space();
                self.emit("=");
                self.emit_space();
                self.emit_expr_with_prec(*default, 2);
            }
            NodeKind::Rest(target) => {
                self.emit("...");
                self.emit_binding(*target);
            }
            // Object and array patterns hold plain expressions when they are
            // assignment targets.
            _ => self.emit_expr_with_prec(id, 2),
        }
    }

    fn emit_array_elements(&mut self, elements: &[Option<NodeId>], pattern: bool) {
        self.emit("[");
        for (i, element) in elements.iter().enumerate() {
            if i > 0 {
                self.emit(",");
                self.emit_space();
            }
            if let Some(element) = element {
                if pattern {
                    self.emit_binding(*element);
                } else {
                    self.emit_expr_with_prec(*element, 2);
                }
            }
        }
        // A trailing hole needs its own comma to survive.
        if matches!(elements.last(), Some(None)) {
            self.emit(",");
        }
        self.emit("]");
    }

    // =========================================================================
    // Functions and Classes
    // =========================================================================

    fn emit_function(&mut self, func: &Function) {
        if func.is_async {
            self.emit("async ");
        }
        self.emit("function");
        if func.is_generator {
            self.emit("*");
        }
        if let Some(name) = func.name {
            self.emit(" ");
            self.emit_binding(name);
        }
        self.emit_params(&func.params);
        self.emit_space();
        self.emit_block(&func.body);
    }

    fn emit_params(&mut self, params: &[NodeId]) {
        self.emit("(");
        for (i, &param) in params.iter().enumerate() {
            if i > 0 {
                self.emit(",");
                self.emit_space();
            }
            self.emit_binding(param);
        }
        self.emit(")");
    }

    /// `(params) { body }` of a method whose value is a `FunctionExpr`.
    fn emit_method_tail(&mut self, value: NodeId) {
        match self.ast.kind(value) {
            NodeKind::FunctionExpr(func) => {
                self.emit_params(&func.params);
                self.emit_space();
                self.emit_block(&func.body);
            }
            _ => {
                self.emit(":");
                self.emit_space();
                self.emit_expr_with_prec(value, 2);
            }
        }
    }

    fn method_prefix(&mut self, value: NodeId) {
        if let NodeKind::FunctionExpr(func) = self.ast.kind(value) {
            if func.is_async {
                self.emit("async ");
            }
            if func.is_generator {
                self.emit("*");
            }
        }
    }

    fn emit_arrow(&mut self, params: &[NodeId], body: NodeId, expression: bool, is_async: bool) {
        if is_async {
            self.emit("async");
            self.emit_space();
        }
        match params {
            [single] if matches!(self.ast.kind(*single), NodeKind::BindingIdent(_)) => {
                self.emit_binding(*single);
            }
            _ => self.emit_params(params),
        }
        self.emit_space();
        self.emit("=>");
        self.emit_space();
        if expression {
            // An object body must be wrapped to not be parsed as a block.
            if self.starts_with_declaration_token(body) {
                self.emit("(");
                self.emit_expr_with_prec(body, 2);
                self.emit(")");
            } else {
                self.emit_expr_with_prec(body, 2);
            }
        } else {
            self.emit_stmt(body);
        }
    }

    fn emit_class(&mut self, class: &Class) {
        self.emit("class");
        if let Some(name) = class.name {
            self.emit(" ");
            self.emit_binding(name);
        }
        if let Some(super_class) = class.super_class {
            self.emit(" extends ");
            self.emit_expr_with_prec(super_class, 18);
        }
        self.emit_space();
        self.emit("{");
        self.indent();
        for &member in &class.members {
            self.emit_newline();
            self.emit_class_member(member);
        }
        self.dedent();
        if !class.members.is_empty() {
            self.emit_newline();
        }
        self.emit("}");
    }

    fn emit_class_member(&mut self, id: NodeId) {
        match self.ast.kind(id) {
            NodeKind::ClassMethod { key, value, kind, is_static, computed } => {
                if *is_static {
                    self.emit("static ");
                }
                match kind {
                    MethodKind::Get => self.emit("get "),
                    MethodKind::Set => self.emit("set "),
                    MethodKind::Constructor | MethodKind::Method => self.method_prefix(*value),
                }
                self.emit_property_key(*key, *computed);
                self.emit_method_tail(*value);
            }
            NodeKind::ClassField { key, value, is_static, computed } => {
                if *is_static {
                    self.emit("static ");
                }
                self.emit_property_key(*key, *computed);
                if let Some(value) = value {
                    self.emit_space();
                    self.emit("=");
                    self.emit_space();
                    self.emit_expr_with_prec(*value, 2);
                }
                self.emit(";");
            }
            _ => self.emit(";"),
        }
    }

    // =========================================================================
    // Expression Emission
    // =========================================================================

    fn emit_expr(&mut self, id: NodeId) {
        self.emit_expr_with_prec(id, 0);
    }

    /// Emit an expression, parenthesizing it if it binds looser than
    /// `min_prec`.
    fn emit_expr_with_prec(&mut self, id: NodeId, min_prec: u8) {
        match self.ast.kind(id) {
            NodeKind::Null => self.emit("null"),
            NodeKind::Bool(b) => self.emit(if *b { "true" } else { "false" }),
            NodeKind::Number(n) => self.emit_number(*n),
            NodeKind::Str(s) => {
                self.emit("\"");
                self.emit(&escape_string(s));
                self.emit("\"");
            }
            NodeKind::Regex { pattern, flags } => {
                self.emit("/");
                self.emit(pattern);
                self.emit("/");
                self.emit(flags);
            }
            NodeKind::Template { quasis, exprs } => {
                self.emit("`");
                for (i, quasi) in quasis.iter().enumerate() {
                    self.emit_raw(&escape_template(quasi));
                    if let Some(&expr) = exprs.get(i) {
                        self.emit_raw("${");
                        self.emit_expr(expr);
                        self.emit_raw("}");
                    }
                }
                self.emit_raw("`");
            }
            NodeKind::TaggedTemplate { tag, quasi } => {
                self.emit_expr_with_prec(*tag, 18);
                self.emit_expr(*quasi);
            }
            NodeKind::Ident(name) | NodeKind::PropName(name) | NodeKind::BindingIdent(name) => {
                self.emit(name)
            }
            NodeKind::This => self.emit("this"),
            NodeKind::Super => self.emit("super"),
            NodeKind::Array(elements) => self.emit_array_elements(elements, false),
            NodeKind::Object(props) => {
                self.emit("{");
                for (i, &prop) in props.iter().enumerate() {
                    if i > 0 {
                        self.emit(",");
                        self.emit_space();
                    }
                    self.emit_object_member(prop);
                }
                self.emit("}");
            }
            NodeKind::FunctionExpr(func) => self.emit_function(func),
            NodeKind::ClassExpr(class) => self.emit_class(class),
            NodeKind::Arrow { params, body, expression, is_async } => {
                let needs_parens = min_prec > 2;
                if needs_parens {
                    self.emit("(");
                }
                self.emit_arrow(params, *body, *expression, *is_async);
                if needs_parens {
                    self.emit(")");
                }
            }
            NodeKind::Unary { op, argument } => {
                let needs_parens = min_prec > 15;
                if needs_parens {
                    self.emit("(");
                }
                let op_str = match op {
                    UnaryOp::Minus => "-",
                    UnaryOp::Plus => "+",
                    UnaryOp::Not => "!",
                    UnaryOp::BitNot => "~",
                    UnaryOp::Typeof => "typeof ",
                    UnaryOp::Void => "void ",
                    UnaryOp::Delete => "delete ",
                };
                self.emit(op_str);
                self.emit_expr_with_prec(*argument, 15);
                if needs_parens {
                    self.emit(")");
                }
            }
            NodeKind::Update { op, prefix, argument } => {
                let op_str = match op {
                    UpdateOp::Increment => "++",
                    UpdateOp::Decrement => "--",
                };
                if *prefix {
                    self.emit(op_str);
                    self.emit_expr_with_prec(*argument, 15);
                } else {
                    self.emit_expr_with_prec(*argument, 16);
                    self.emit(op_str);
                }
            }
            NodeKind::Binary { op, left, right } => {
                let (prec, op_str) = binary_op_info(*op);
                let needs_parens = prec < min_prec || (self.no_in && *op == BinaryOp::In);
                if needs_parens {
                    self.emit("(");
                }
                let (left_prec, right_prec) = if is_right_associative(*op) {
                    // `-a ** b` is a syntax error; the base needs parens.
                    (prec + 2, prec)
                } else {
                    (prec, prec + 1)
                };
                self.emit_binary_operand(*op, *left, left_prec);
                self.emit_space();
                self.emit(op_str);
                self.emit_space();
                self.emit_binary_operand(*op, *right, right_prec);
                if needs_parens {
                    self.emit(")");
                }
            }
            NodeKind::Assign { op, target, value } => {
                let needs_parens = min_prec > 2;
                if needs_parens {
                    self.emit("(");
                }
                self.emit_binding(*target);
                self.emit_space();
                self.emit(assign_op_str(*op));
                self.emit_space();
                self.emit_expr_with_prec(*value, 2);
                if needs_parens {
                    self.emit(")");
                }
            }
            NodeKind::Conditional { test, consequent, alternate } => {
                let needs_parens = min_prec > 3;
                if needs_parens {
                    self.emit("(");
                }
                self.emit_expr_with_prec(*test, 4);
                self.emit_space();
                self.emit("?");
                self.emit_space();
                self.emit_expr_with_prec(*consequent, 2);
                self.emit_space();
                self.emit(":");
                self.emit_space();
                self.emit_expr_with_prec(*alternate, 2);
                if needs_parens {
                    self.emit(")");
                }
            }
            NodeKind::Call { callee, args, optional } => {
                self.emit_expr_with_prec(*callee, 18);
                if *optional {
                    self.emit("?.");
                }
                self.emit("(");
                self.emit_comma_list(args, 2);
                self.emit(")");
            }
            NodeKind::New { callee, args } => {
                self.emit("new ");
                if self.has_call_in_chain(*callee) {
                    self.emit("(");
                    self.emit_expr(*callee);
                    self.emit(")");
                } else {
                    self.emit_expr_with_prec(*callee, 18);
                }
                self.emit("(");
                self.emit_comma_list(args, 2);
                self.emit(")");
            }
            NodeKind::Member { object, property, computed, optional } => {
                // `1.x` would lex as a number; wrap bare integer objects.
                let wrap_object = matches!(self.ast.kind(*object), NodeKind::Number(n) if !format_number(*n).contains(['.', 'e', 'x']))
                    && !computed;
                if wrap_object {
                    self.emit("(");
                    self.emit_expr(*object);
                    self.emit(")");
                } else {
                    self.emit_expr_with_prec(*object, 18);
                }
                match (computed, optional) {
                    (true, true) => self.emit("?.["),
                    (true, false) => self.emit("["),
                    (false, true) => self.emit("?."),
                    (false, false) => self.emit("."),
                }
                self.emit_expr(*property);
                if *computed {
                    self.emit("]");
                }
            }
            NodeKind::MetaProperty { meta, property } => {
                self.emit_expr(*meta);
                self.emit(".");
                self.emit_expr(*property);
            }
            NodeKind::Sequence(exprs) => {
                let needs_parens = min_prec > 1;
                if needs_parens {
                    self.emit("(");
                }
                self.emit_comma_list(exprs, 2);
                if needs_parens {
                    self.emit(")");
                }
            }
            NodeKind::Spread(arg) => {
                self.emit("...");
                self.emit_expr_with_prec(*arg, 2);
            }
            NodeKind::Yield { argument, delegate } => {
                let needs_parens = min_prec > 2;
                if needs_parens {
                    self.emit("(");
                }
                self.emit("yield");
                if *delegate {
                    self.emit("*");
                }
                if let Some(argument) = argument {
                    self.emit_space();
                    self.emit_expr_with_prec(*argument, 2);
                }
                if needs_parens {
                    self.emit(")");
                }
            }
            NodeKind::Await(arg) => {
                let needs_parens = min_prec > 15;
                if needs_parens {
                    self.emit("(");
                }
                self.emit("await ");
                self.emit_expr_with_prec(*arg, 15);
                if needs_parens {
                    self.emit(")");
                }
            }
            NodeKind::ArrayPattern(_)
            | NodeKind::ObjectPattern(_)
            | NodeKind::AssignPattern { .. }
            | NodeKind::Rest(_) => self.emit_binding(id),
            NodeKind::Property { .. } => self.emit_object_member(id),
            NodeKind::ClassMethod { .. } | NodeKind::ClassField { .. } => self.emit_class_member(id),
            _ => self.emit_stmt(id),
        }
    }

    /// `??` cannot mix with `||` or `&&` without parentheses.
    fn emit_binary_operand(&mut self, op: BinaryOp, operand: NodeId, prec: u8) {
        let mixes_nullish = match self.ast.kind(operand) {
            NodeKind::Binary { op: inner, .. } => {
                let is_logical = |o: &BinaryOp| matches!(o, BinaryOp::And | BinaryOp::Or);
                (op == BinaryOp::NullishCoalesce && is_logical(inner))
                    || (is_logical(&op) && *inner == BinaryOp::NullishCoalesce)
            }
            _ => false,
        };
        if mixes_nullish {
            self.emit("(");
            self.emit_expr(operand);
            self.emit(")");
        } else {
            self.emit_expr_with_prec(operand, prec);
        }
    }

    /// Whether a `new` callee contains a call that `new` would otherwise
    /// take the arguments of.
    fn has_call_in_chain(&self, mut id: NodeId) -> bool {
        loop {
            id = match self.ast.kind(id) {
                NodeKind::Call { .. } => return true,
                NodeKind::Member { object, .. } => *object,
                NodeKind::TaggedTemplate { tag, .. } => *tag,
                _ => return false,
            };
        }
    }

    fn emit_number(&mut self, n: f64) {
        if n.is_nan() {
            self.emit("NaN");
        } else if n.is_infinite() {
            self.emit("Infinity");
        } else {
            self.emit(&format_number(n));
        }
    }

    fn emit_object_member(&mut self, id: NodeId) {
        match self.ast.kind(id) {
            NodeKind::Property { key, value, kind, shorthand, computed } => {
                let (key, value, computed) = (*key, *value, *computed);
                match kind {
                    PropertyKind::Init => {
                        if *shorthand && self.shorthand_still_valid(key, value) {
                            self.emit_shorthand_value(value);
                            return;
                        }
                        self.emit_property_key(key, computed);
                        self.emit(":");
                        self.emit_space();
                        self.emit_binding(value);
                    }
                    PropertyKind::Method => {
                        self.method_prefix(value);
                        self.emit_property_key(key, computed);
                        self.emit_method_tail(value);
                    }
                    PropertyKind::Get | PropertyKind::Set => {
                        self.emit(if *kind == PropertyKind::Get { "get " } else { "set " });
                        self.emit_property_key(key, computed);
                        self.emit_method_tail(value);
                    }
                }
            }
            NodeKind::Spread(arg) | NodeKind::Rest(arg) => {
                self.emit("...");
                self.emit_binding(*arg);
            }
            _ => self.emit_expr_with_prec(id, 2),
        }
    }

    /// A shorthand entry prints as `{x}` only while its key still names the
    /// same thing as its value; otherwise it prints in full.
    fn shorthand_still_valid(&self, key: NodeId, value: NodeId) -> bool {
        let target = match self.ast.kind(value) {
            NodeKind::AssignPattern { target, .. } => *target,
            NodeKind::Assign { op: AssignOp::Assign, target, .. } => *target,
            _ => value,
        };
        matches!((self.ast.name(key), self.ast.name(target)), (Some(k), Some(v)) if k == v)
    }

    /// `x` or `x = default` for a shorthand entry.
    fn emit_shorthand_value(&mut self, value: NodeId) {
        match self.ast.kind(value) {
            NodeKind::AssignPattern { target, default: init }
            | NodeKind::Assign { target, value: init, .. } => {
                let (target, init) = (*target, *init);
                self.emit_binding(target);
                self.emit_space();
                self.emit("=");
                self.emit_space();
                self.emit_expr_with_prec(init, 2);
            }
            _ => self.emit_binding(value),
        }
    }

    fn emit_property_key(&mut self, key: NodeId, computed: bool) {
        if computed {
            self.emit("[");
            self.emit_expr_with_prec(key, 2);
            self.emit("]");
        } else {
            self.emit_expr(key);
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$' || c as u32 > 0x7f
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{:.0}", n)
    } else {
        let s = format!("{}", n);
        // Use shorter exponential notation if beneficial
        let exp = format!("{:e}", n);
        if exp.len() < s.len() {
            exp
        } else {
            s
        }
    }
}

fn escape_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            '"' => result.push_str("\\\""),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            '\0' => result.push_str("\\0"),
            '\u{2028}' => result.push_str("\\u2028"),
            '\u{2029}' => result.push_str("\\u2029"),
            c if c.is_control() => {
                result.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => result.push(c),
        }
    }
    result
}

fn escape_template(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => result.push_str("\\\\"),
            '`' => result.push_str("\\`"),
            '$' if chars.peek() == Some(&'{') => result.push_str("\\$"),
            c => result.push(c),
        }
    }
    result
}

fn binary_op_info(op: BinaryOp) -> (u8, &'static str) {
    match op {
        BinaryOp::Or => (4, "||"),
        BinaryOp::And => (5, "&&"),
        BinaryOp::NullishCoalesce => (4, "??"),
        BinaryOp::BitOr => (6, "|"),
        BinaryOp::BitXor => (7, "^"),
        BinaryOp::BitAnd => (8, "&"),
        BinaryOp::Eq => (9, "=="),
        BinaryOp::NotEq => (9, "!="),
        BinaryOp::StrictEq => (9, "==="),
        BinaryOp::StrictNotEq => (9, "!=="),
        BinaryOp::Lt => (10, "<"),
        BinaryOp::LtEq => (10, "<="),
        BinaryOp::Gt => (10, ">"),
        BinaryOp::GtEq => (10, ">="),
        BinaryOp::In => (10, "in"),
        BinaryOp::Instanceof => (10, "instanceof"),
        BinaryOp::Shl => (11, "<<"),
        BinaryOp::Shr => (11, ">>"),
        BinaryOp::UShr => (11, ">>>"),
        BinaryOp::Add => (12, "+"),
        BinaryOp::Sub => (12, "-"),
        BinaryOp::Mul => (13, "*"),
        BinaryOp::Div => (13, "/"),
        BinaryOp::Mod => (13, "%"),
        BinaryOp::Pow => (14, "**"),
    }
}

fn is_right_associative(op: BinaryOp) -> bool {
    matches!(op, BinaryOp::Pow)
}

fn assign_op_str(op: AssignOp) -> &'static str {
    match op {
        AssignOp::Assign => "=",
        AssignOp::AddAssign => "+=",
        AssignOp::SubAssign => "-=",
        AssignOp::MulAssign => "*=",
        AssignOp::DivAssign => "/=",
        AssignOp::ModAssign => "%=",
        AssignOp::PowAssign => "**=",
        AssignOp::ShlAssign => "<<=",
        AssignOp::ShrAssign => ">>=",
        AssignOp::UShrAssign => ">>>=",
        AssignOp::BitOrAssign => "|=",
        AssignOp::BitXorAssign => "^=",
        AssignOp::BitAndAssign => "&=",
        AssignOp::AndAssign => "&&=",
        AssignOp::OrAssign => "||=",
        AssignOp::NullishAssign => "??=",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    fn roundtrip(source: &str) -> String {
        let ast = Parser::new(source).parse().unwrap();
        Codegen::new(&ast, CodegenOptions::default()).generate()
    }

    fn minified(source: &str) -> String {
        let ast = Parser::new(source).parse().unwrap();
        Codegen::new(&ast, CodegenOptions { minify: true, ..Default::default() }).generate()
    }

    #[test]
    fn test_variable_declaration() {
        assert_eq!(roundtrip("let x = 1;"), "let x = 1;\n");
    }

    #[test]
    fn test_function_declaration() {
        let output = roundtrip("function foo(a, b) { return a + b; }");
        assert_eq!(output, "function foo(a, b) {\n  return a + b;\n}\n");
    }

    #[test]
    fn test_object_literal_layout() {
        let output = roundtrip("var o = {foo: 1, bar() {}, get baz() { return 2; }};");
        assert_eq!(output, "var o = {foo: 1, bar() {}, get baz() {\n  return 2;\n}};\n");
    }

    #[test]
    fn test_shorthand_prints_in_full_after_key_change() {
        let mut ast = Parser::new("var o = {x};").parse().unwrap();
        let key = ast
            .ids()
            .find(|&id| matches!(ast.kind(id), NodeKind::PropName(_)))
            .unwrap();
        if let Some(name) = ast.name_mut(key) {
            *name = "A".to_string();
        }
        let output = Codegen::new(&ast, CodegenOptions::default()).generate();
        assert_eq!(output, "var o = {A: x};\n");
    }

    #[test]
    fn test_precedence_parens() {
        assert_eq!(roundtrip("(a + b) * c;"), "(a + b) * c;\n");
        assert_eq!(roundtrip("a + b * c;"), "a + b * c;\n");
        assert_eq!(roundtrip("(a, b);"), "a, b;\n");
        assert_eq!(roundtrip("f((a, b));"), "f((a, b));\n");
        assert_eq!(roundtrip("(a ?? b) || c;"), "(a ?? b) || c;\n");
        assert_eq!(roundtrip("(-a) ** 2;"), "(-a) ** 2;\n");
        assert_eq!(roundtrip("new (f())();"), "new (f())();\n");
    }

    #[test]
    fn test_statement_start_parens() {
        assert_eq!(roundtrip("({a: 1}).a;"), "({a: 1}.a);\n");
        assert_eq!(roundtrip("(function () {})();"), "(function() {}());\n");
        assert_eq!(roundtrip("f = () => ({});"), "f = () => ({});\n");
    }

    #[test]
    fn test_member_and_meta() {
        assert_eq!(roundtrip("a.b?.c[d];"), "a.b?.c[d];\n");
        assert_eq!(roundtrip("function F() { new.target; }"), "function F() {\n  new.target;\n}\n");
        assert_eq!(roundtrip("1..toString();"), "(1).toString();\n");
        assert_eq!(roundtrip("(1).toString();"), "(1).toString();\n");
    }

    #[test]
    fn test_class_output() {
        assert_eq!(roundtrip("class C { foo() {} }"), "class C {\n  foo() {}\n}\n");
        assert_eq!(
            roundtrip("class D extends C { static x = 1; }"),
            "class D extends C {\n  static x = 1;\n}\n"
        );
    }

    #[test]
    fn test_template_and_strings() {
        assert_eq!(roundtrip("`a${b}c`;"), "`a${b}c`;\n");
        assert_eq!(minified("x = `id${n}`;"), "x=`id${n}`");
        assert_eq!(roundtrip("'it\\'s';"), "\"it's\";\n");
    }

    #[test]
    fn test_minify() {
        let output = minified("let x = 1;\nlet y = 2;");
        assert_eq!(output, "let x=1;let y=2");
        assert_eq!(minified("if (a in b) x();"), "if(a in b)x()");
        assert_eq!(minified("a - -b;"), "a- -b");
        assert_eq!(minified("typeof x;"), "typeof x");
    }
}
