//! Arena-allocated syntax tree for JavaScript scripts.
//!
//! Every node lives in one `Vec<Node>` owned by [`Ast`] and is addressed by a
//! copyable [`NodeId`]. Children are referenced by id, never by pointer, so a
//! pass can hold a set of ids (for example "already renamed") that stays
//! valid while it rewrites names in place.
//!
//! `NodeKind` is closed: statements, bindings, expressions and the
//! identifier-shaped property names used for keys and `a.b` accesses all
//! share one enum, and consumers match on it exhaustively.

use crate::span::Span;

/// Index of a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Position of this node in the arena.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A node in the arena.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
}

/// The root of a parsed script: the node arena plus the top-level statements.
#[derive(Debug, Clone, Default)]
pub struct Ast {
    nodes: Vec<Node>,
    /// Top-level statements, in source order.
    pub body: Vec<NodeId>,
}

impl Ast {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node and return its id.
    pub fn push(&mut self, kind: NodeKind, span: Span) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node { kind, span });
        id
    }

    /// Number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    #[inline]
    pub fn kind_mut(&mut self, id: NodeId) -> &mut NodeKind {
        &mut self.nodes[id.index()].kind
    }

    #[inline]
    pub fn span(&self, id: NodeId) -> Span {
        self.nodes[id.index()].span
    }

    /// Iterate over every node id in allocation order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len() as u32).map(NodeId)
    }

    /// The name carried by an identifier, binding identifier or property name.
    pub fn name(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Ident(name) | NodeKind::BindingIdent(name) | NodeKind::PropName(name) => {
                Some(name)
            }
            _ => None,
        }
    }

    /// Mutable access to the name of a name-holding node.
    pub fn name_mut(&mut self, id: NodeId) -> Option<&mut String> {
        match self.kind_mut(id) {
            NodeKind::Ident(name) | NodeKind::BindingIdent(name) | NodeKind::PropName(name) => {
                Some(name)
            }
            _ => None,
        }
    }

    /// Direct children of a node, in source order.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        match self.kind(id) {
            NodeKind::VarDecl { declarators, .. } => out.extend(declarators),
            NodeKind::Declarator { binding, init } => {
                out.push(*binding);
                out.extend(init);
            }
            NodeKind::FunctionDecl(func) | NodeKind::FunctionExpr(func) => {
                out.extend(func.name);
                out.extend(&func.params);
                out.extend(&func.body);
            }
            NodeKind::ClassDecl(class) | NodeKind::ClassExpr(class) => {
                out.extend(class.name);
                out.extend(class.super_class);
                out.extend(&class.members);
            }
            NodeKind::Block(stmts) => out.extend(stmts),
            NodeKind::ExprStmt(expr) => out.push(*expr),
            NodeKind::If { test, consequent, alternate } => {
                out.push(*test);
                out.push(*consequent);
                out.extend(alternate);
            }
            NodeKind::For { init, test, update, body } => {
                out.extend(init);
                out.extend(test);
                out.extend(update);
                out.push(*body);
            }
            NodeKind::ForIn { left, right, body } | NodeKind::ForOf { left, right, body } => {
                out.push(*left);
                out.push(*right);
                out.push(*body);
            }
            NodeKind::While { test, body } => {
                out.push(*test);
                out.push(*body);
            }
            NodeKind::DoWhile { body, test } => {
                out.push(*body);
                out.push(*test);
            }
            NodeKind::Return(arg) => out.extend(arg),
            NodeKind::Throw(arg) => out.push(*arg),
            NodeKind::Try { block, handler, finalizer } => {
                out.push(*block);
                out.extend(handler);
                out.extend(finalizer);
            }
            NodeKind::CatchClause { param, body } => {
                out.extend(param);
                out.extend(body);
            }
            NodeKind::Switch { discriminant, cases } => {
                out.push(*discriminant);
                out.extend(cases);
            }
            NodeKind::SwitchCase { test, body } => {
                out.extend(test);
                out.extend(body);
            }
            NodeKind::Labeled { body, .. } => out.push(*body),
            NodeKind::With { object, body } => {
                out.push(*object);
                out.push(*body);
            }
            NodeKind::ArrayPattern(elements) | NodeKind::Array(elements) => {
                out.extend(elements.iter().flatten());
            }
            NodeKind::ObjectPattern(props) | NodeKind::Object(props) => out.extend(props),
            NodeKind::AssignPattern { target, default } => {
                out.push(*target);
                out.push(*default);
            }
            NodeKind::Rest(arg) | NodeKind::Spread(arg) | NodeKind::Await(arg) => out.push(*arg),
            NodeKind::Template { exprs, .. } => out.extend(exprs),
            NodeKind::TaggedTemplate { tag, quasi } => {
                out.push(*tag);
                out.push(*quasi);
            }
            NodeKind::Property { key, value, .. } => {
                out.push(*key);
                out.push(*value);
            }
            NodeKind::Arrow { params, body, .. } => {
                out.extend(params);
                out.push(*body);
            }
            NodeKind::ClassMethod { key, value, .. } => {
                out.push(*key);
                out.push(*value);
            }
            NodeKind::ClassField { key, value, .. } => {
                out.push(*key);
                out.extend(value);
            }
            NodeKind::Unary { argument, .. } | NodeKind::Update { argument, .. } => {
                out.push(*argument);
            }
            NodeKind::Binary { left, right, .. } => {
                out.push(*left);
                out.push(*right);
            }
            NodeKind::Assign { target, value, .. } => {
                out.push(*target);
                out.push(*value);
            }
            NodeKind::Conditional { test, consequent, alternate } => {
                out.push(*test);
                out.push(*consequent);
                out.push(*alternate);
            }
            NodeKind::Call { callee, args, .. } | NodeKind::New { callee, args } => {
                out.push(*callee);
                out.extend(args);
            }
            NodeKind::Member { object, property, .. } => {
                out.push(*object);
                out.push(*property);
            }
            NodeKind::MetaProperty { meta, property } => {
                out.push(*meta);
                out.push(*property);
            }
            NodeKind::Sequence(exprs) => out.extend(exprs),
            NodeKind::Yield { argument, .. } => out.extend(argument),
            NodeKind::Break(_)
            | NodeKind::Continue(_)
            | NodeKind::Empty
            | NodeKind::Debugger
            | NodeKind::BindingIdent(_)
            | NodeKind::Ident(_)
            | NodeKind::PropName(_)
            | NodeKind::This
            | NodeKind::Super
            | NodeKind::Null
            | NodeKind::Bool(_)
            | NodeKind::Number(_)
            | NodeKind::Str(_)
            | NodeKind::Regex { .. } => {}
        }
        out
    }
}

/// Node kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    // =========================================================================
    // Statements
    // =========================================================================
    /// `var a = 1, b;` (declarators are `Declarator` nodes)
    VarDecl { kind: VarKind, declarators: Vec<NodeId> },
    /// One `binding = init` entry of a declaration.
    Declarator { binding: NodeId, init: Option<NodeId> },
    /// `function f() {}`
    FunctionDecl(Function),
    /// `class C {}`
    ClassDecl(Class),
    /// `{ ... }`
    Block(Vec<NodeId>),
    /// Expression statement
    ExprStmt(NodeId),
    If { test: NodeId, consequent: NodeId, alternate: Option<NodeId> },
    /// `init` is a `VarDecl` or an expression.
    For { init: Option<NodeId>, test: Option<NodeId>, update: Option<NodeId>, body: NodeId },
    /// `left` is a `VarDecl` without initializer, or an assignment target.
    ForIn { left: NodeId, right: NodeId, body: NodeId },
    ForOf { left: NodeId, right: NodeId, body: NodeId },
    While { test: NodeId, body: NodeId },
    DoWhile { body: NodeId, test: NodeId },
    Return(Option<NodeId>),
    Throw(NodeId),
    /// `block` and `finalizer` are `Block` nodes; `handler` is a `CatchClause`.
    Try { block: NodeId, handler: Option<NodeId>, finalizer: Option<NodeId> },
    CatchClause { param: Option<NodeId>, body: Vec<NodeId> },
    Switch { discriminant: NodeId, cases: Vec<NodeId> },
    /// `test` is `None` for `default:`.
    SwitchCase { test: Option<NodeId>, body: Vec<NodeId> },
    Break(Option<String>),
    Continue(Option<String>),
    Labeled { label: String, body: NodeId },
    With { object: NodeId, body: NodeId },
    Empty,
    Debugger,

    // =========================================================================
    // Bindings
    // =========================================================================
    /// A name introduced by a declaration, parameter or catch clause.
    BindingIdent(String),
    /// `[a, , b]`
    ArrayPattern(Vec<Option<NodeId>>),
    /// `{a, b: c}` (entries are `Property` or `Rest` nodes)
    ObjectPattern(Vec<NodeId>),
    /// `target = default`
    AssignPattern { target: NodeId, default: NodeId },
    /// `...target` in a pattern or parameter list
    Rest(NodeId),

    // =========================================================================
    // Expressions
    // =========================================================================
    /// Identifier reference
    Ident(String),
    /// Identifier-shaped property name: object keys, method keys and the
    /// right-hand side of `a.b`. Never a variable reference.
    PropName(String),
    This,
    Super,
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    Regex { pattern: String, flags: String },
    /// Template literal; `quasis.len() == exprs.len() + 1`.
    Template { quasis: Vec<String>, exprs: Vec<NodeId> },
    TaggedTemplate { tag: NodeId, quasi: NodeId },
    /// `[a, , b]` (holes are `None`)
    Array(Vec<Option<NodeId>>),
    /// `{...}` (entries are `Property` or `Spread` nodes)
    Object(Vec<NodeId>),
    /// Object literal or object pattern entry.
    ///
    /// `key` is a `PropName`, `Str` or `Number` node, or any expression when
    /// `computed`. Shorthand entries still own separate key and value nodes.
    Property {
        key: NodeId,
        value: NodeId,
        kind: PropertyKind,
        shorthand: bool,
        computed: bool,
    },
    FunctionExpr(Function),
    /// `body` is a `Block` unless `expression` is set.
    Arrow { params: Vec<NodeId>, body: NodeId, expression: bool, is_async: bool },
    ClassExpr(Class),
    /// `value` is a `FunctionExpr`.
    ClassMethod {
        key: NodeId,
        value: NodeId,
        kind: MethodKind,
        is_static: bool,
        computed: bool,
    },
    ClassField { key: NodeId, value: Option<NodeId>, is_static: bool, computed: bool },
    Unary { op: UnaryOp, argument: NodeId },
    Update { op: UpdateOp, prefix: bool, argument: NodeId },
    Binary { op: BinaryOp, left: NodeId, right: NodeId },
    Assign { op: AssignOp, target: NodeId, value: NodeId },
    Conditional { test: NodeId, consequent: NodeId, alternate: NodeId },
    Call { callee: NodeId, args: Vec<NodeId>, optional: bool },
    New { callee: NodeId, args: Vec<NodeId> },
    /// `object.property` or `object[property]`; `property` is a `PropName`
    /// unless `computed`.
    Member { object: NodeId, property: NodeId, computed: bool, optional: bool },
    /// `new.target`; both halves are `Ident` nodes.
    MetaProperty { meta: NodeId, property: NodeId },
    Sequence(Vec<NodeId>),
    Spread(NodeId),
    Yield { argument: Option<NodeId>, delegate: bool },
    Await(NodeId),
}

impl NodeKind {
    /// Whether this node opens a `function` body.
    pub fn is_function(&self) -> bool {
        matches!(
            self,
            NodeKind::FunctionDecl(_) | NodeKind::FunctionExpr(_) | NodeKind::Arrow { .. }
        )
    }
}

/// A function declaration, expression or method body.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    /// `BindingIdent` node, if named.
    pub name: Option<NodeId>,
    pub params: Vec<NodeId>,
    pub body: Vec<NodeId>,
    pub is_async: bool,
    pub is_generator: bool,
}

/// A class declaration or expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Class {
    /// `BindingIdent` node, if named.
    pub name: Option<NodeId>,
    pub super_class: Option<NodeId>,
    /// `ClassMethod`, `ClassField` or `Empty` nodes.
    pub members: Vec<NodeId>,
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Minus,  // -
    Plus,   // +
    Not,    // !
    BitNot, // ~
    Typeof, // typeof
    Void,   // void
    Delete, // delete
}

/// Binary and logical operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add, // +
    Sub, // -
    Mul, // *
    Div, // /
    Mod, // %
    Pow, // **

    Eq,          // ==
    NotEq,       // !=
    StrictEq,    // ===
    StrictNotEq, // !==
    Lt,          // <
    LtEq,        // <=
    Gt,          // >
    GtEq,        // >=

    BitOr,  // |
    BitXor, // ^
    BitAnd, // &
    Shl,    // <<
    Shr,    // >>
    UShr,   // >>>

    And,             // &&
    Or,              // ||
    NullishCoalesce, // ??

    In,         // in
    Instanceof, // instanceof
}

/// Assignment operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,        // =
    AddAssign,     // +=
    SubAssign,     // -=
    MulAssign,     // *=
    DivAssign,     // /=
    ModAssign,     // %=
    PowAssign,     // **=
    ShlAssign,     // <<=
    ShrAssign,     // >>=
    UShrAssign,    // >>>=
    BitOrAssign,   // |=
    BitXorAssign,  // ^=
    BitAndAssign,  // &=
    AndAssign,     // &&=
    OrAssign,      // ||=
    NullishAssign, // ??=
}

/// Update operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp {
    Increment, // ++
    Decrement, // --
}

/// Variable declaration kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Var,
    Let,
    Const,
}

/// Object property kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Init,
    Get,
    Set,
    Method,
}

/// Class method kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    Constructor,
    Method,
    Get,
    Set,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_children() {
        let mut ast = Ast::new();
        let object = ast.push(NodeKind::Ident("o".into()), Span::new(0, 1));
        let property = ast.push(NodeKind::PropName("x".into()), Span::new(2, 3));
        let member = ast.push(
            NodeKind::Member { object, property, computed: false, optional: false },
            Span::new(0, 3),
        );
        assert_eq!(ast.len(), 3);
        assert_eq!(ast.children(member), vec![object, property]);
        assert!(ast.children(object).is_empty());
    }

    #[test]
    fn test_name_mut_only_on_name_nodes() {
        let mut ast = Ast::new();
        let key = ast.push(NodeKind::PropName("foo".into()), Span::default());
        let this = ast.push(NodeKind::This, Span::default());

        if let Some(name) = ast.name_mut(key) {
            *name = "A".into();
        }
        assert_eq!(ast.name(key), Some("A"));
        assert!(ast.name_mut(this).is_none());
    }
}
