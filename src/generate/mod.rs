use log::{debug, trace};
use rand::{
    distributions::{Distribution, WeightedIndex},
    rngs::StdRng,
    SeedableRng,
};

use crate::{
    ast::{Expr, Lit, NodeKind, Stmt},
    errors::{SmithError, SmithResult},
    sema::{FunctionTable, GlobalTable, Scope},
    typing::{ty::Ty, zero_value},
};

mod args;
mod context;
mod expr;
mod func;
mod ident;
mod options;
mod stmt;
mod types;

pub use args::generate_args;
pub use context::Context;
pub use ident::IdentGenerator;
pub use options::GenOptions;

type ExprApplies = fn(&Generator, &Context, &Ty) -> bool;
type ExprBuilder = fn(&mut Generator, &Context, &Ty) -> SmithResult<Option<Expr>>;
type StmtApplies = fn(&Generator, &Context) -> bool;
type StmtBuilder = fn(&mut Generator, &Context) -> SmithResult<Option<Stmt>>;

/// One entry of the expression dispatch table. `applies` is a cheap shape
/// check on the required type; `build` may still decline with `Ok(None)`
/// once it looks at the scope.
struct ExprConstruct {
    kind: NodeKind,
    applies: ExprApplies,
    build: ExprBuilder,
}

struct StmtConstruct {
    kind: NodeKind,
    applies: StmtApplies,
    build: StmtBuilder,
}

macro_rules! construct {
    ($kind:ident, $applies:path, $build:path) => {
        ExprConstruct {
            kind: NodeKind::$kind,
            applies: $applies,
            build: $build,
        }
    };
}

static EXPR_CONSTRUCTS: &[ExprConstruct] = &[
    construct!(IntLiteral, expr::is_int, expr::int_literal),
    construct!(FloatLiteral, expr::is_float, expr::float_literal),
    construct!(BoolLiteral, expr::is_bool, expr::bool_literal),
    construct!(StrLiteral, expr::is_str, expr::str_literal),
    construct!(UnitLiteral, expr::is_unit, expr::unit_literal),
    construct!(NoneLiteral, expr::is_option, expr::none_literal),
    construct!(Variable, expr::any_ty, expr::variable),
    construct!(ConstRef, expr::has_const, expr::const_ref),
    construct!(CliArg, expr::accepts_cli_arg, expr::cli_arg),
    construct!(FieldAccess, expr::has_copy_field, expr::field_access),
    construct!(ArrayIndex, expr::is_indexable_elem, expr::array_index),
    construct!(Add, expr::is_numeric, expr::add),
    construct!(Sub, expr::is_numeric, expr::sub),
    construct!(Mul, expr::is_numeric, expr::mul),
    construct!(Div, expr::is_numeric, expr::div),
    construct!(Rem, expr::is_numeric, expr::rem),
    construct!(Eq, expr::is_bool, expr::eq),
    construct!(Ne, expr::is_bool, expr::ne),
    construct!(Lt, expr::is_bool, expr::lt),
    construct!(Gt, expr::is_bool, expr::gt),
    construct!(And, expr::is_bool, expr::and),
    construct!(Or, expr::is_bool, expr::or),
    construct!(Not, expr::is_bool, expr::not),
    construct!(FunctionCall, expr::is_returnable, expr::function_call),
    construct!(MethodCall, expr::has_method_receiver, expr::method_call),
    construct!(FuncRef, expr::is_func, expr::func_ref),
    construct!(TupleLiteral, expr::is_tuple, expr::tuple_literal),
    construct!(ArrayLiteral, expr::is_array, expr::array_literal),
    construct!(VecLiteral, expr::is_vec, expr::vec_literal),
    construct!(StructLiteral, expr::is_struct, expr::struct_literal),
    construct!(BoxNew, expr::is_box, expr::box_new),
    construct!(SomeValue, expr::is_option, expr::some_value),
];

static STMT_CONSTRUCTS: &[StmtConstruct] = &[
    StmtConstruct {
        kind: NodeKind::Declaration,
        applies: stmt::always,
        build: stmt::declaration,
    },
    StmtConstruct {
        kind: NodeKind::Assignment,
        applies: stmt::has_mutable_variable,
        build: stmt::assignment,
    },
    StmtConstruct {
        kind: NodeKind::CallStatement,
        applies: stmt::always,
        build: stmt::call_statement,
    },
    StmtConstruct {
        kind: NodeKind::IfElse,
        applies: stmt::always,
        build: stmt::if_else,
    },
    StmtConstruct {
        kind: NodeKind::ForLoop,
        applies: stmt::always,
        build: stmt::for_loop,
    },
];

/// State restored when a builder declines after touching the tables.
struct Checkpoint {
    scope: Scope,
    pending: usize,
    cli_args: usize,
}

/// Synthesizes one program. All randomness is drawn from a single stream
/// seeded from the program seed, so a seed and a set of options always
/// yield the same tree.
pub struct Generator {
    seed: u64,
    rng: StdRng,
    options: GenOptions,
    idents: IdentGenerator,
    globals: GlobalTable,
    functions: FunctionTable,
    scope: Scope,
    /// Declarations synthesized mid-expression, emitted ahead of the
    /// statement being generated.
    pending: Vec<Stmt>,
    /// While non-zero, variable reads may only copy.
    frozen: usize,
}

impl Generator {
    pub fn new(seed: u64, options: GenOptions) -> Generator {
        Generator {
            seed,
            rng: StdRng::seed_from_u64(seed),
            options,
            idents: IdentGenerator::new(),
            globals: GlobalTable::new(),
            functions: FunctionTable::new(),
            scope: Scope::new(),
            pending: vec![],
            frozen: 0,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn options(&self) -> &GenOptions {
        &self.options
    }

    pub fn globals(&self) -> &GlobalTable {
        &self.globals
    }

    pub fn functions(&self) -> &FunctionTable {
        &self.functions
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Hands back the tables and the random stream, positioned after the
    /// last draw of generation.
    pub fn finish(self) -> (GlobalTable, FunctionTable, StdRng) {
        (self.globals, self.functions, self.rng)
    }

    pub fn generate_expr(&mut self, ctx: &Context, ty: &Ty) -> SmithResult<Expr> {
        self.generate_expr_where(ctx, ty, |_| true)
    }

    /// Fills a hole of type `ty` with any construct accepted by `filter`,
    /// falling back to a terminal when none can be built.
    pub fn generate_expr_where<F>(&mut self, ctx: &Context, ty: &Ty, filter: F) -> SmithResult<Expr>
    where
        F: Fn(NodeKind) -> bool,
    {
        if let Some(expr) = self.select(ctx, ty, filter)? {
            return Ok(expr);
        }

        debug!(
            "no construct for `{}` in {}, using a terminal",
            ty,
            ctx.function()
        );
        self.terminal(ty)
    }

    /// Like `generate_expr_where` without the fallback: `Ok(None)` when no
    /// accepted construct could be built.
    pub fn select<F>(&mut self, ctx: &Context, ty: &Ty, filter: F) -> SmithResult<Option<Expr>>
    where
        F: Fn(NodeKind) -> bool,
    {
        let ctx = ctx.with_required_ty(ty.clone());
        trace!("filling `{}` in {}", ctx.required(), ctx.function());
        let mut pool = EXPR_CONSTRUCTS
            .iter()
            .filter(|c| filter(c.kind) && self.admissible(&ctx, c.kind) && (c.applies)(self, &ctx, ty))
            .collect::<Vec<_>>();

        while !pool.is_empty() {
            let kinds = pool.iter().map(|c| c.kind).collect::<Vec<_>>();
            let idx = unless!(self.pick(&ctx, &kinds), else break);
            let construct = pool.remove(idx);
            trace!("{:?} for `{}`", construct.kind, ty);

            let checkpoint = self.checkpoint();
            match (construct.build)(self, &ctx.increment(construct.kind), ty)? {
                Some(expr) => return Ok(Some(expr)),
                None => self.restore(checkpoint),
            }
        }

        Ok(None)
    }

    /// Generates one statement of the current block and reports its kind.
    pub fn generate_stmt(&mut self, ctx: &Context) -> SmithResult<(NodeKind, Stmt)> {
        let mut pool = STMT_CONSTRUCTS
            .iter()
            .filter(|c| self.admissible(ctx, c.kind) && (c.applies)(self, ctx))
            .collect::<Vec<_>>();

        while !pool.is_empty() {
            let kinds = pool.iter().map(|c| c.kind).collect::<Vec<_>>();
            let idx = unless!(self.pick(ctx, &kinds), else break);
            let construct = pool.remove(idx);
            trace!("{:?} statement in {}", construct.kind, ctx.function());

            let checkpoint = self.checkpoint();
            match (construct.build)(self, &ctx.increment(construct.kind))? {
                Some(stmt) => return Ok((construct.kind, stmt)),
                None => self.restore(checkpoint),
            }
        }

        match stmt::declaration(self, &ctx.increment(NodeKind::Declaration))? {
            Some(stmt) => Ok((NodeKind::Declaration, stmt)),
            None => Err(SmithError::exhausted(self.seed, &Ty::Unit)),
        }
    }

    fn admissible(&self, ctx: &Context, kind: NodeKind) -> bool {
        if self.options.weight(kind) == 0 {
            return false;
        }

        if kind.is_recursive() && ctx.remaining() == 0 {
            return false;
        }

        ctx.depth_of(kind) < self.options.family_limit(kind.family())
    }

    /// Weighted draw over `kinds`. Repeating the construct just chosen is
    /// half as likely, and statement kinds fade with each use in the block.
    fn pick(&mut self, ctx: &Context, kinds: &[NodeKind]) -> Option<usize> {
        let weights = kinds
            .iter()
            .map(|&kind| {
                let mut weight = self.options.weight(kind) as f64;
                if ctx.previous() == Some(kind) {
                    weight /= 2.0;
                }
                if kind.is_statement() {
                    weight /= (1 + ctx.statements_in_block(kind)) as f64;
                }
                weight
            })
            .collect::<Vec<_>>();
        let dist = WeightedIndex::new(&weights).ok()?;
        Some(dist.sample(&mut self.rng))
    }

    fn terminal(&mut self, ty: &Ty) -> SmithResult<Expr> {
        Ok(match ty.canonical() {
            Ty::Int(i) => self.int_literal(i),
            Ty::Float(f) => self.float_literal(f),
            Ty::Bool => self.bool_literal(),
            Ty::Str => self.str_literal(),
            Ty::Unit => Expr::Lit(Lit::Unit),
            _ if self.options.fail_fast => return Err(SmithError::exhausted(self.seed, ty)),
            _ => zero_value(ty),
        })
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            scope: self.scope.clone(),
            pending: self.pending.len(),
            cli_args: self.globals.cli_args().len(),
        }
    }

    fn restore(&mut self, checkpoint: Checkpoint) {
        self.scope = checkpoint.scope;
        self.pending.truncate(checkpoint.pending);
        self.globals.truncate_cli_args(checkpoint.cli_args);
    }

    /// Declares a fresh immutable variable of type `ty` ahead of the current
    /// statement. Its initializer never moves an existing binding, since
    /// it runs before everything the statement reads.
    fn declare_pending(&mut self, ctx: &Context, ty: &Ty) -> SmithResult<String> {
        self.frozen += 1;
        let value = self.generate_expr(&ctx.increment(NodeKind::Declaration), ty);
        self.frozen -= 1;
        let value = value?;

        let name = self.idents.var();
        self.scope.declare(&name, ty.clone(), false);
        trace!("pending declaration {}: {}", name, ty);
        self.pending.push(Stmt::Decl {
            name: name.clone(),
            ty: ty.clone(),
            mutable: false,
            value,
        });
        Ok(name)
    }
}

#[cfg(test)]
mod generate_tests {
    use super::{Context, GenOptions, Generator};
    use crate::{
        ast::{Expr, NodeKind},
        errors::SmithErrorKind,
        typing::ty::{IntTy, Ty},
    };

    #[test]
    fn test_same_seed_same_expr() {
        let ty = Ty::Tuple(vec![Ty::Int(IntTy::U16), Ty::Vec(Box::new(Ty::Bool))]);
        let render = |seed| {
            let mut gen = Generator::new(seed, GenOptions::default());
            gen.generate_expr(&Context::new(20), &ty).unwrap().to_string()
        };
        assert_eq!(render(7), render(7));
    }

    #[test]
    fn test_generated_expr_has_required_type() {
        let mut gen = Generator::new(3, GenOptions::default());
        let tys = vec![
            Ty::i32(),
            Ty::Bool,
            Ty::Str,
            Ty::Option(Box::new(Ty::Int(IntTy::U8))),
            Ty::Array(Box::new(Ty::Bool), 3),
            Ty::Box(Box::new(Ty::Str)),
        ];
        for ty in tys {
            for _ in 0..8 {
                let expr = gen.generate_expr(&Context::new(20), &ty).unwrap();
                assert!(expr.ty().same_as(&ty), "{} is not a `{}`", expr, ty);
            }
        }
    }

    #[test]
    fn test_exhausted_budget_yields_terminal() {
        let mut gen = Generator::new(11, GenOptions::default());
        let expr = gen.generate_expr(&Context::new(0), &Ty::i32()).unwrap();
        assert!(matches!(
            expr,
            Expr::Lit(_) | Expr::Var(..) | Expr::Index { .. }
        ));
        assert!(expr.ty().same_as(&Ty::i32()));
    }

    #[test]
    fn test_fail_fast_reports_exhaustion() {
        let mut options = GenOptions::default();
        options.fail_fast = true;
        let mut gen = Generator::new(5, options);
        let err = gen
            .generate_expr_where(&Context::new(20), &Ty::Tuple(vec![Ty::Bool]), |k| {
                k == NodeKind::IntLiteral
            })
            .unwrap_err();
        assert_eq!(err.kind, SmithErrorKind::ExhaustedCandidates);
        assert_eq!(err.seed, Some(5));
    }

    #[test]
    fn test_lenient_falls_back_to_zero_value() {
        let mut gen = Generator::new(5, GenOptions::default());
        let expr = gen
            .generate_expr_where(&Context::new(20), &Ty::Tuple(vec![Ty::Bool]), |k| {
                k == NodeKind::IntLiteral
            })
            .unwrap();
        assert_eq!(expr.to_string(), "(false,)");
    }

    #[test]
    fn test_select_without_candidates_is_none() {
        let mut gen = Generator::new(5, GenOptions::default());
        let found = gen
            .select(&Context::new(20), &Ty::Bool, |k| k == NodeKind::FloatLiteral)
            .unwrap();
        assert!(found.is_none());
    }
}
