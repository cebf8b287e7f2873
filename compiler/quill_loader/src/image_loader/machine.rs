use quill_ir::{Expr, Stmt, Value};
use quill_stack::ensure_sufficient_stack;
use rustc_hash::FxHashMap;

use crate::{CancelFlag, UserFault};

enum Flow {
    Next,
    Return(Value),
}

/// Executes one method body against an instance's fields.
pub(super) struct Machine<'a> {
    fields: &'a mut FxHashMap<String, Value>,
    args: &'a [Value],
    cancel: &'a CancelFlag,
    steps: u64,
    budget: u64,
}

impl<'a> Machine<'a> {
    pub(super) fn new(
        fields: &'a mut FxHashMap<String, Value>,
        args: &'a [Value],
        cancel: &'a CancelFlag,
        budget: u64,
    ) -> Self {
        Machine {
            fields,
            args,
            cancel,
            steps: 0,
            budget,
        }
    }

    /// Run `body`; falling off the end yields `none`.
    pub(super) fn run(mut self, body: &[Stmt]) -> Result<Value, UserFault> {
        if self.cancel.is_cancelled() {
            return Err(UserFault::Interrupted);
        }
        match self.block(body)? {
            Flow::Return(value) => Ok(value),
            Flow::Next => Ok(Value::None),
        }
    }

    fn step(&mut self) -> Result<(), UserFault> {
        if self.cancel.is_cancelled() {
            return Err(UserFault::Interrupted);
        }
        self.steps = self.steps.saturating_add(1);
        if self.steps > self.budget {
            return Err(UserFault::BudgetExhausted {
                budget: self.budget,
            });
        }
        Ok(())
    }

    fn block(&mut self, stmts: &[Stmt]) -> Result<Flow, UserFault> {
        ensure_sufficient_stack(|| self.block_inner(stmts))
    }

    fn block_inner(&mut self, stmts: &[Stmt]) -> Result<Flow, UserFault> {
        for stmt in stmts {
            if let Flow::Return(value) = self.stmt(stmt)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Next)
    }

    fn stmt(&mut self, stmt: &Stmt) -> Result<Flow, UserFault> {
        self.step()?;
        match stmt {
            Stmt::Return(None) => Ok(Flow::Return(Value::None)),
            Stmt::Return(Some(expr)) => Ok(Flow::Return(self.eval(expr)?)),
            Stmt::Fail(expr) => Err(UserFault::Raised(self.eval(expr)?.to_string())),
            Stmt::Loop(body) => loop {
                // Counts as a step even when the body is empty.
                self.step()?;
                if let Flow::Return(value) = self.block(body)? {
                    return Ok(Flow::Return(value));
                }
            },
            Stmt::SetField { field, value } => {
                let value = self.eval(value)?;
                self.fields.insert(field.clone(), value);
                Ok(Flow::Next)
            }
        }
    }

    fn eval(&mut self, expr: &Expr) -> Result<Value, UserFault> {
        ensure_sufficient_stack(|| self.eval_inner(expr))
    }

    fn eval_inner(&mut self, expr: &Expr) -> Result<Value, UserFault> {
        self.step()?;
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Param(index) => self.args.get(usize::from(*index)).cloned().ok_or_else(|| {
                UserFault::InvalidProgram(format!("parameter {index} was not supplied"))
            }),
            Expr::Field(name) => self
                .fields
                .get(name)
                .cloned()
                .ok_or_else(|| UserFault::UnassignedField(name.clone())),
            Expr::Add(lhs, rhs) => {
                let lhs = self.eval(lhs)?;
                let rhs = self.eval(rhs)?;
                add(lhs, rhs)
            }
        }
    }
}

/// Ints add; anything else concatenates text forms.
fn add(lhs: Value, rhs: Value) -> Result<Value, UserFault> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => a
            .checked_add(b)
            .map(Value::Int)
            .ok_or(UserFault::Overflow { lhs: a, rhs: b }),
        (lhs, rhs) => Ok(Value::Str(format!("{lhs}{rhs}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add() {
        assert_eq!(add(Value::Int(2), Value::Int(3)), Ok(Value::Int(5)));
        assert_eq!(
            add(Value::string("a"), Value::None),
            Ok(Value::string("a"))
        );
        assert_eq!(
            add(Value::string("v"), Value::Int(7)),
            Ok(Value::string("v7"))
        );
        assert_eq!(
            add(Value::Int(i64::MAX), Value::Int(1)),
            Err(UserFault::Overflow {
                lhs: i64::MAX,
                rhs: 1
            })
        );
    }
}
