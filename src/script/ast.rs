use crate::script::lexer::Span;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Program {
    pub(crate) body: Vec<Stmt>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DeclKind {
    Const,
    Let,
    Var,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Stmt {
    VarDecl {
        kind: DeclKind,
        decls: Vec<Declarator>,
    },
    /// Function declarations are hoisted to the top of their scope.
    Function(Rc<FunctionDef>),
    Return(Option<Expr>),
    If {
        test: Expr,
        cons: Box<Stmt>,
        alt: Option<Box<Stmt>>,
    },
    Block(Vec<Stmt>),
    Expr(Expr),
    For {
        init: Option<Box<Stmt>>,
        test: Option<Expr>,
        update: Option<Expr>,
        body: Box<Stmt>,
    },
    ForOf {
        kind: DeclKind,
        pattern: Pattern,
        iter: Expr,
        body: Box<Stmt>,
    },
    ForIn {
        kind: DeclKind,
        pattern: Pattern,
        object: Expr,
        body: Box<Stmt>,
    },
    While {
        test: Expr,
        body: Box<Stmt>,
    },
    Switch {
        disc: Expr,
        cases: Vec<SwitchCase>,
    },
    Break,
    Continue,
    Throw(Expr),
    Try {
        block: Vec<Stmt>,
        param: Option<Pattern>,
        handler: Option<Vec<Stmt>>,
        finalizer: Option<Vec<Stmt>>,
    },
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SwitchCase {
    /// `None` for `default:`.
    pub(crate) test: Option<Expr>,
    pub(crate) body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Declarator {
    pub(crate) pattern: Pattern,
    pub(crate) init: Option<Expr>,
    /// Start of the declaration in the source; used for source-order component selection.
    pub(crate) span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Pattern {
    Ident(String),
    Object {
        props: Vec<PropPattern>,
        rest: Option<String>,
    },
    Array {
        items: Vec<Option<Pattern>>,
        rest: Option<Box<Pattern>>,
    },
    Default(Box<Pattern>, Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PropPattern {
    pub(crate) key: PropKey,
    pub(crate) value: Pattern,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PropKey {
    Named(String),
    Computed(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum FunctionBody {
    Expr(Box<Expr>),
    Block(Vec<Stmt>),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FunctionDef {
    pub(crate) name: Option<String>,
    pub(crate) params: Vec<Pattern>,
    pub(crate) rest: Option<Pattern>,
    pub(crate) body: FunctionBody,
    pub(crate) is_arrow: bool,
    pub(crate) span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ArrayItem {
    Item(Expr),
    Spread(Expr),
    Hole,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ObjectItem {
    Prop(PropKey, Expr),
    Spread(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TemplateChunk {
    Text(String),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum MemberProp {
    Name(String),
    Computed(Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnaryOp {
    Neg,
    Plus,
    Not,
    TypeOf,
    Void,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    EqLoose,
    NeLoose,
    EqStrict,
    NeStrict,
    Lt,
    Le,
    Gt,
    Ge,
    In,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LogicalOp {
    And,
    Or,
    Nullish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Num(f64),
    Str(Rc<str>),
    Bool(bool),
    Null,
    Undefined,
    Template(Vec<TemplateChunk>),
    Ident(String),
    Array(Vec<ArrayItem>),
    Object(Vec<ObjectItem>),
    Function(Rc<FunctionDef>),
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    Update {
        increment: bool,
        prefix: bool,
        target: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Cond {
        test: Box<Expr>,
        cons: Box<Expr>,
        alt: Box<Expr>,
    },
    Assign {
        op: AssignOp,
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Member {
        object: Box<Expr>,
        prop: MemberProp,
        optional: bool,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<ArrayItem>,
        optional: bool,
    },
    New {
        callee: Box<Expr>,
        args: Vec<ArrayItem>,
    },
    Sequence(Vec<Expr>),
    Jsx(Rc<JsxElement>),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum JsxName {
    /// Lowercase host tag such as `div` or `svg`.
    Intrinsic(String),
    /// Capitalized identifier or member path resolved as an expression.
    Component(Expr),
    Fragment,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum JsxAttr {
    Named(String, Option<Expr>),
    Spread(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum JsxChild {
    Text(String),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct JsxElement {
    pub(crate) name: JsxName,
    pub(crate) attrs: Vec<JsxAttr>,
    pub(crate) children: Vec<JsxChild>,
}
