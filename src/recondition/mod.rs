use crate::{
    ast::{Block, Expr, FunctionDef, Stmt},
    program::{Program, StructDefinition},
};

/// Rewrites a tree so that every integer operation is total. Rules are local
/// and applied bottom-up; running the pass twice changes nothing further.
pub trait Recondition {
    fn recondition(self) -> Self;
}

impl<T: Recondition> Recondition for Box<T> {
    fn recondition(self) -> Self {
        Box::new((*self).recondition())
    }
}

impl<T: Recondition> Recondition for Option<T> {
    fn recondition(self) -> Self {
        self.map(Recondition::recondition)
    }
}

impl<T: Recondition> Recondition for Vec<T> {
    fn recondition(self) -> Self {
        self.into_iter().map(Recondition::recondition).collect()
    }
}

impl Recondition for Expr {
    fn recondition(self) -> Self {
        match self {
            Expr::Binary { op, lhs, rhs } => {
                let lhs = lhs.recondition();
                let rhs = rhs.recondition();
                if !op.is_arithmetic() || !lhs.ty().is_int() {
                    Expr::Binary { op, lhs, rhs }
                } else if op.is_division() {
                    Expr::GuardedDiv { op, lhs, rhs }
                } else {
                    Expr::Wrapping { op, lhs, rhs }
                }
            }
            Expr::Wrapping { op, lhs, rhs } => Expr::Wrapping {
                op,
                lhs: lhs.recondition(),
                rhs: rhs.recondition(),
            },
            Expr::GuardedDiv { op, lhs, rhs } => Expr::GuardedDiv {
                op,
                lhs: lhs.recondition(),
                rhs: rhs.recondition(),
            },
            Expr::Field { base, field, ty } => Expr::Field {
                base: base.recondition(),
                field,
                ty,
            },
            Expr::Index { base, index, ty } => Expr::Index {
                base: base.recondition(),
                index,
                ty,
            },
            Expr::Not(e) => Expr::Not(e.recondition()),
            Expr::Call { name, args, ty } => Expr::Call {
                name,
                args: args.recondition(),
                ty,
            },
            Expr::MethodCall {
                receiver,
                method,
                args,
                ty,
            } => Expr::MethodCall {
                receiver: receiver.recondition(),
                method,
                args: args.recondition(),
                ty,
            },
            Expr::Tuple(elems) => Expr::Tuple(elems.recondition()),
            Expr::Array(elems, ty) => Expr::Array(elems.recondition(), ty),
            Expr::VecLit(elems, ty) => Expr::VecLit(elems.recondition(), ty),
            Expr::Struct { name, fields } => Expr::Struct {
                name,
                fields: fields
                    .into_iter()
                    .map(|(field, e)| (field, e.recondition()))
                    .collect(),
            },
            Expr::Boxed(e) => Expr::Boxed(e.recondition()),
            Expr::Some(e) => Expr::Some(e.recondition()),
            Expr::Closure { params, body } => Expr::Closure {
                params,
                body: body.recondition(),
            },
            e @ Expr::Lit(_)
            | e @ Expr::Var(..)
            | e @ Expr::Const(..)
            | e @ Expr::SelfRef(_)
            | e @ Expr::None(_)
            | e @ Expr::FuncRef(..)
            | e @ Expr::Default(_) => e,
        }
    }
}

impl Recondition for Stmt {
    fn recondition(self) -> Self {
        match self {
            Stmt::Decl {
                name,
                ty,
                mutable,
                value,
            } => Stmt::Decl {
                name,
                ty,
                mutable,
                value: value.recondition(),
            },
            Stmt::Assign { name, value } => Stmt::Assign {
                name,
                value: value.recondition(),
            },
            Stmt::Expr(e) => Stmt::Expr(e.recondition()),
            Stmt::If {
                cond,
                then,
                otherwise,
            } => Stmt::If {
                cond: cond.recondition(),
                then: then.recondition(),
                otherwise: otherwise.recondition(),
            },
            Stmt::For { iterations, body } => Stmt::For {
                iterations,
                body: body.recondition(),
            },
            s @ Stmt::CliArgs(_) | s @ Stmt::Output { .. } => s,
        }
    }
}

impl Recondition for Block {
    fn recondition(self) -> Self {
        Block {
            stmts: self.stmts.recondition(),
            tail: self.tail.recondition(),
        }
    }
}

impl Recondition for FunctionDef {
    fn recondition(self) -> Self {
        FunctionDef {
            body: self.body.recondition(),
            ..self
        }
    }
}

impl Recondition for StructDefinition {
    fn recondition(self) -> Self {
        StructDefinition {
            methods: self.methods.recondition(),
            ..self
        }
    }
}

impl Recondition for Program {
    fn recondition(self) -> Self {
        Program {
            structs: self.structs.recondition(),
            functions: self.functions.recondition(),
            ..self
        }
    }
}
