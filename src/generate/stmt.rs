use log::trace;
use rand::Rng;

use crate::{
    ast::{Block, NodeKind, Stmt},
    errors::SmithResult,
    generate::{Context, Generator},
    typing::ty::Ty,
};

type Built = SmithResult<Option<Stmt>>;

pub(super) fn always(_: &Generator, _: &Context) -> bool {
    true
}

pub(super) fn has_mutable_variable(g: &Generator, _: &Context) -> bool {
    g.scope.any_variable_where(|_, b| b.mutable)
}

impl Generator {
    /// Generates `count` statements in the current scope, followed by a tail
    /// expression of type `tail` unless that is `()`. Declarations queued
    /// while a statement is built are emitted right before it.
    pub fn generate_block(&mut self, ctx: &Context, count: usize, tail: Option<&Ty>) -> SmithResult<Block> {
        let mut ctx = ctx.clone();
        let mut stmts = vec![];
        for _ in 0..count {
            let mark = self.pending.len();
            let (kind, stmt) = self.generate_stmt(&ctx)?;
            stmts.extend(self.pending.drain(mark..));
            stmts.push(stmt);
            ctx = ctx.increment_statement(kind);
        }

        let tail = match tail {
            Some(ty) if !ty.same_as(&Ty::Unit) => {
                let mark = self.pending.len();
                let expr = self.generate_expr(&ctx, ty)?;
                stmts.extend(self.pending.drain(mark..));
                Some(expr)
            }
            _ => None,
        };
        Ok(Block::new(stmts, tail))
    }

    /// Generates a nested block in a fresh child scope. Moves made inside
    /// survive, declarations do not.
    fn child_block(&mut self, ctx: &Context, is_loop: bool) -> SmithResult<Block> {
        self.scope = if is_loop {
            self.scope.loop_child()
        } else {
            self.scope.child()
        };
        let count = self.rng.gen_range(1..=self.options.max_block_statements.max(1));
        let block = self.generate_block(&ctx.enter_scope(), count, None);
        self.scope = std::mem::take(&mut self.scope).into_parent();
        block
    }
}

pub(super) fn declaration(g: &mut Generator, ctx: &Context) -> Built {
    let ty = g.random_type(true)?;
    let value = g.generate_expr(ctx, &ty)?;
    let name = g.idents.var();
    let mutable = g.rng.gen_bool(0.25);
    g.scope.declare(&name, ty.clone(), mutable);
    trace!("declared {}: {} in {}", name, ty, ctx.function());
    Ok(Some(Stmt::Decl {
        name,
        ty,
        mutable,
        value,
    }))
}

/// Overwrites an owned `mut` binding. The target is pinned while its new
/// value is generated.
pub(super) fn assignment(g: &mut Generator, ctx: &Context) -> Built {
    let (name, ty) = unless!(g.scope.random_variable_where(&mut g.rng, |_, b| b.mutable));
    g.scope.pin(&name);
    let value = g.generate_expr(ctx, &ty);
    g.scope.unpin(&name);
    Ok(Some(Stmt::Assign { name, value: value? }))
}

/// A call whose result is discarded.
pub(super) fn call_statement(g: &mut Generator, ctx: &Context) -> Built {
    let ty = g.random_return_type()?;
    let call = unless!(g.select(ctx, &ty, |k| {
        k == NodeKind::FunctionCall || k == NodeKind::MethodCall
    })?);
    Ok(Some(Stmt::Expr(call)))
}

pub(super) fn if_else(g: &mut Generator, ctx: &Context) -> Built {
    let cond = g.generate_expr(ctx, &Ty::Bool)?;
    let then = g.child_block(ctx, false)?;
    let otherwise = if g.rng.gen_bool(0.5) {
        Some(g.child_block(ctx, false)?)
    } else {
        None
    };
    Ok(Some(Stmt::If {
        cond,
        then,
        otherwise,
    }))
}

pub(super) fn for_loop(g: &mut Generator, ctx: &Context) -> Built {
    let iterations = g.rng.gen_range(1..=g.options.max_loop_iterations.max(1));
    let body = g.child_block(ctx, true)?;
    Ok(Some(Stmt::For { iterations, body }))
}

#[cfg(test)]
mod stmt_builder_tests {
    use crate::{
        ast::{Expr, Stmt},
        generate::{Context, GenOptions, Generator},
        typing::ty::Ty,
    };

    #[test]
    fn test_block_declarations_leave_scope() {
        let mut gen = Generator::new(12, GenOptions::default());
        gen.scope.declare("outer", Ty::i32(), false);
        let ctx = Context::new(20).for_function("fun0", Ty::Unit, None);
        let block = gen.child_block(&ctx, false).unwrap();
        assert!(!block.stmts.is_empty());
        assert_eq!(gen.scope.current_variables(), vec![str!("outer")]);
    }

    #[test]
    fn test_assignment_targets_mutable_binding() {
        let mut gen = Generator::new(6, GenOptions::default());
        gen.scope.declare("var0", Ty::Bool, false);
        gen.scope.declare("var1", Ty::i32(), true);
        let stmt = super::assignment(&mut gen, &Context::new(20)).unwrap().unwrap();
        match stmt {
            Stmt::Assign { name, value } => {
                assert_eq!(name, "var1");
                assert!(value.ty().same_as(&Ty::i32()));
            }
            other => panic!("expected an assignment, got {}", other),
        }
    }

    #[test]
    fn test_assignment_declines_without_mutable_binding() {
        let mut gen = Generator::new(6, GenOptions::default());
        gen.scope.declare("var0", Ty::Bool, false);
        assert!(super::assignment(&mut gen, &Context::new(20)).unwrap().is_none());
    }

    #[test]
    fn test_function_tail_has_return_type() {
        let mut gen = Generator::new(21, GenOptions::default());
        let ty = Ty::Option(Box::new(Ty::Str));
        let block = gen.generate_block(&Context::new(20), 2, Some(&ty)).unwrap();
        let tail = block.tail.unwrap();
        assert!(tail.ty().same_as(&ty));
        assert!(!matches!(tail, Expr::Lit(_)));
    }
}
