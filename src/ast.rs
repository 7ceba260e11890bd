use std::rc::Rc;

use crate::diagnostics::SourceSpan;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Decimal digits as written; may exceed machine width.
    Int(String),
    Float(f64),
    Bool(bool),
    String(String),
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    /// `points`: equal and of the same type.
    Identical,
    NotIdentical,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "^",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Less => "<",
            BinaryOp::LessEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::Identical => "points",
            BinaryOp::NotIdentical => "not points",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Not,
}

#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: SourceSpan,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Literal(Literal),
    Variable(String),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    /// Calls are resolved by name: built-ins first, then bound functions.
    Call {
        name: String,
        args: Vec<Expr>,
    },
    /// `receiver.method(args)`, also written `method(args) of receiver`.
    MethodCall {
        receiver: Box<Expr>,
        method: String,
        args: Vec<Expr>,
    },
    ListLiteral(Vec<Expr>),
    SetLiteral(Vec<Expr>),
}

/// A parsed `fn` definition. Shared between the AST and every function
/// value created from it.
#[derive(Debug)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<String>,
    /// `None` for a forward declaration such as `fn f(a, b).`
    pub body: Option<Vec<Stmt>>,
}

#[derive(Debug, Clone)]
pub struct IfBranch {
    pub condition: Expr,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub enum StmtKind {
    /// `var a = 1, b.`; a missing initializer binds `None`.
    VarDecl {
        bindings: Vec<(String, Option<Expr>)>,
    },
    /// `let x be e.`
    LetDecl {
        name: String,
        value: Expr,
    },
    /// `x = e.` or a compound form such as `x += e.` / `x++.`
    Assign {
        name: String,
        op: Option<BinaryOp>,
        value: Expr,
    },
    If {
        branches: Vec<IfBranch>,
        else_branch: Option<Vec<Stmt>>,
    },
    While {
        condition: Expr,
        body: Vec<Stmt>,
    },
    ForRange {
        binding: String,
        from: Expr,
        to: Expr,
        step: Option<Expr>,
        body: Vec<Stmt>,
    },
    ForIn {
        binding: String,
        iterable: Expr,
        body: Vec<Stmt>,
    },
    Function(Rc<FunctionDecl>),
    Expr(Expr),
    Give(Option<Expr>),
    Pass,
}

#[derive(Debug, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, Default)]
pub struct Program {
    pub statements: Vec<Stmt>,
}
