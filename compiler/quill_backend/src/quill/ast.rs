//! Quill syntax tree.

use quill_ir::Span;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompilationUnit {
    pub imports: Vec<Import>,
    pub types: Vec<TypeDecl>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Import {
    pub name: String,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeDecl {
    pub name: String,
    pub name_span: Span,
    pub exported: bool,
    pub members: Vec<Member>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Constructor,
    Method,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Member {
    pub kind: MemberKind,
    /// `new` for constructors.
    pub name: String,
    pub name_span: Span,
    pub params: Vec<Param>,
    pub body: Vec<Statement>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Statement {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StmtKind {
    Return(Option<Expression>),
    Fail(Expression),
    Loop(Vec<Statement>),
    SetField { field: String, value: Expression },
}

impl StmtKind {
    /// Whether control never reaches the statement after this one.
    ///
    /// Quill has no `break`, so a loop only exits by `return` or `fail`.
    pub fn diverges(&self) -> bool {
        matches!(
            self,
            StmtKind::Return(_) | StmtKind::Fail(_) | StmtKind::Loop(_)
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Expression {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExprKind {
    Str(String),
    Int(i64),
    Bool(bool),
    None,
    /// `self.field`
    Field(String),
    /// Bare identifier; must name a parameter.
    Name(String),
    /// `Library.Constant`
    Path {
        library: String,
        member: String,
    },
    Add(Box<Expression>, Box<Expression>),
}
