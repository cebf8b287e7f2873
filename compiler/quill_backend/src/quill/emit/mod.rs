//! Lowering a Quill syntax tree to a `QMOD` module image.
//!
//! Emit resolves every name: imports against the reference catalog,
//! `Library.Constant` paths against the imported images, bare identifiers
//! against method parameters. Library constants are inlined as literals.

use quill_diagnostic::Diagnostic;
use quill_ir::{Expr, MethodDef, ModuleImage, Span, Stmt, TypeDef, Value};
use quill_refs::ReferenceCatalog;
use quill_stack::ensure_sufficient_stack;
use rustc_hash::{FxHashMap, FxHashSet};

use super::ast::{CompilationUnit, ExprKind, Expression, Member, MemberKind, Statement, StmtKind};
use super::{render, ErrorCode, Problem, SyntaxTree};
use crate::{EmitFailure, EmitOptions, Emitted};

pub fn emit(
    syntax: &SyntaxTree,
    references: &ReferenceCatalog,
    options: &EmitOptions,
) -> Result<Emitted, EmitFailure> {
    let mut lowering = Lowering::new(references);
    let image = lowering.unit(&syntax.unit, &options.module_name);
    lowering.unused_imports(&syntax.unit);

    let mut problems = lowering.problems;
    problems.sort_by_key(|p| p.span.start);
    let mut diagnostics: Vec<Diagnostic> = problems
        .iter()
        .map(|p| render(&syntax.source, p.span, p.code, &p.message))
        .collect();

    if quill_diagnostic::has_errors(&diagnostics) {
        tracing::debug!(count = diagnostics.len(), "emit rejected unit");
        return Err(EmitFailure { diagnostics });
    }

    match image.encode() {
        Ok(module) => {
            tracing::debug!(bytes = module.len(), "emitted module image");
            Ok(Emitted {
                module,
                diagnostics,
            })
        }
        Err(err) => {
            diagnostics.push(render(
                &syntax.source,
                Span::DUMMY,
                ErrorCode::Q2099,
                &format!("failed to encode module image: {err}"),
            ));
            Err(EmitFailure { diagnostics })
        }
    }
}

/// An imported library, decoded once per emit.
struct Library {
    image: ModuleImage,
    span: Span,
    used: bool,
}

struct Lowering<'a> {
    references: &'a ReferenceCatalog,
    /// Successfully resolved imports by name.
    libraries: FxHashMap<String, Library>,
    /// Every imported name, resolved or not, to avoid double-reporting.
    imported: FxHashSet<String>,
    problems: Vec<Problem>,
}

impl<'a> Lowering<'a> {
    fn new(references: &'a ReferenceCatalog) -> Self {
        Lowering {
            references,
            libraries: FxHashMap::default(),
            imported: FxHashSet::default(),
            problems: Vec::new(),
        }
    }

    fn report(&mut self, code: ErrorCode, span: Span, message: impl Into<String>) {
        self.problems.push(Problem::new(code, span, message));
    }

    fn unit(&mut self, unit: &CompilationUnit, name: &str) -> ModuleImage {
        for import in &unit.imports {
            if !self.imported.insert(import.name.clone()) {
                continue;
            }
            let Some(reference) = self.references.get(&import.name) else {
                self.report(
                    ErrorCode::Q2001,
                    import.span,
                    format!(
                        "unresolved import `{}`: no such reference in the catalog",
                        import.name
                    ),
                );
                continue;
            };
            match ModuleImage::decode(reference.module.as_bytes()) {
                Ok(image) => {
                    self.libraries.insert(
                        import.name.clone(),
                        Library {
                            image,
                            span: import.span,
                            used: false,
                        },
                    );
                }
                Err(err) => self.report(
                    ErrorCode::Q2009,
                    import.span,
                    format!("reference `{}` is not a valid library image: {err}", import.name),
                ),
            }
        }

        let mut image = ModuleImage::new(name);
        let mut seen_types = FxHashSet::default();
        for decl in &unit.types {
            if !seen_types.insert(decl.name.as_str()) {
                self.report(
                    ErrorCode::Q2005,
                    decl.name_span,
                    format!("type `{}` is defined more than once", decl.name),
                );
                continue;
            }
            let mut ty = TypeDef::new(decl.name.clone(), decl.exported);
            let mut seen_members = FxHashSet::default();
            for member in &decl.members {
                if !seen_members.insert((member.kind, member.name.as_str(), member.params.len())) {
                    self.report(
                        ErrorCode::Q2006,
                        member.name_span,
                        format!(
                            "`{}.{}` with {} parameter(s) is defined more than once",
                            decl.name,
                            member.name,
                            member.params.len()
                        ),
                    );
                    continue;
                }
                let Some(method) = self.member(member) else {
                    continue;
                };
                match member.kind {
                    MemberKind::Constructor => ty.constructors.push(method),
                    MemberKind::Method => ty.methods.push(method),
                }
            }
            if ty.constructors.is_empty() {
                ty.constructors.push(MethodDef::new("new", 0, Vec::new()));
            }
            image.types.push(ty);
        }
        image
    }

    fn member(&mut self, member: &Member) -> Option<MethodDef> {
        let Ok(arity) = u8::try_from(member.params.len()) else {
            self.report(
                ErrorCode::Q2011,
                member.name_span,
                format!("`{}` has more than 255 parameters", member.name),
            );
            return None;
        };
        let scope = MethodScope {
            params: member.params.iter().map(|p| p.name.as_str()).collect(),
            constructor: member.kind == MemberKind::Constructor,
        };
        let body = self.block(&member.body, &scope);
        Some(MethodDef::new(member.name.clone(), arity, body))
    }

    fn block(&mut self, stmts: &[Statement], scope: &MethodScope<'_>) -> Vec<Stmt> {
        ensure_sufficient_stack(|| self.block_inner(stmts, scope))
    }

    fn block_inner(&mut self, stmts: &[Statement], scope: &MethodScope<'_>) -> Vec<Stmt> {
        let mut out = Vec::with_capacity(stmts.len());
        let mut diverged = false;
        for stmt in stmts {
            if diverged {
                self.report(ErrorCode::Q2008, stmt.span, "unreachable statement");
                break;
            }
            out.push(self.statement(stmt, scope));
            diverged = stmt.kind.diverges();
        }
        out
    }

    fn statement(&mut self, stmt: &Statement, scope: &MethodScope<'_>) -> Stmt {
        match &stmt.kind {
            StmtKind::Return(value) => {
                if scope.constructor && value.is_some() {
                    self.report(
                        ErrorCode::Q2010,
                        stmt.span,
                        "constructors cannot return a value",
                    );
                }
                Stmt::Return(value.as_ref().map(|v| self.expression(v, scope)))
            }
            StmtKind::Fail(message) => Stmt::Fail(self.expression(message, scope)),
            StmtKind::Loop(body) => Stmt::Loop(self.block(body, scope)),
            StmtKind::SetField { field, value } => Stmt::SetField {
                field: field.clone(),
                value: self.expression(value, scope),
            },
        }
    }

    fn expression(&mut self, expr: &Expression, scope: &MethodScope<'_>) -> Expr {
        ensure_sufficient_stack(|| self.expression_inner(expr, scope))
    }

    fn expression_inner(&mut self, expr: &Expression, scope: &MethodScope<'_>) -> Expr {
        match &expr.kind {
            ExprKind::Str(s) => Expr::Literal(Value::Str(s.clone())),
            ExprKind::Int(n) => Expr::Literal(Value::Int(*n)),
            ExprKind::Bool(b) => Expr::Literal(Value::Bool(*b)),
            ExprKind::None => Expr::Literal(Value::None),
            ExprKind::Field(name) => Expr::Field(name.clone()),
            ExprKind::Name(name) => match scope.param_index(name) {
                Some(index) => Expr::Param(index),
                None => {
                    self.report(
                        ErrorCode::Q2004,
                        expr.span,
                        format!("cannot find `{name}` in this scope"),
                    );
                    Expr::Literal(Value::None)
                }
            },
            ExprKind::Path { library, member } => self.library_constant(library, member, expr.span),
            ExprKind::Add(lhs, rhs) => Expr::Add(
                Box::new(self.expression(lhs, scope)),
                Box::new(self.expression(rhs, scope)),
            ),
        }
    }

    fn library_constant(&mut self, library: &str, member: &str, span: Span) -> Expr {
        if let Some(lib) = self.libraries.get_mut(library) {
            lib.used = true;
            if let Some(value) = lib.image.constant(member) {
                return Expr::Literal(value.clone());
            }
            self.report(
                ErrorCode::Q2002,
                span,
                format!("library `{library}` has no member `{member}`"),
            );
        } else if !self.imported.contains(library) {
            self.report(
                ErrorCode::Q2003,
                span,
                format!("library `{library}` is not imported; add `import {library};`"),
            );
        }
        // Imported but unresolved: the import itself already carries the error.
        Expr::Literal(Value::None)
    }

    fn unused_imports(&mut self, unit: &CompilationUnit) {
        for import in &unit.imports {
            let unused = self
                .libraries
                .get(&import.name)
                .is_some_and(|lib| !lib.used && lib.span == import.span);
            if unused {
                self.report(
                    ErrorCode::Q2007,
                    import.span,
                    format!("unused import `{}`", import.name),
                );
            }
        }
    }
}

struct MethodScope<'a> {
    params: Vec<&'a str>,
    constructor: bool,
}

impl MethodScope<'_> {
    fn param_index(&self, name: &str) -> Option<u8> {
        self.params
            .iter()
            .position(|p| *p == name)
            .and_then(|idx| u8::try_from(idx).ok())
    }
}
