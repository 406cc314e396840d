use std::collections::BTreeMap;

use proptest::prelude::*;
use smith::{
    ast::{BinOp, Block, Expr, Family, FunctionDef, Stmt},
    generate::GenOptions,
    program::{generate_program, Program},
    typing::ty::Ty,
};

fn options(max_depth: usize, statements: usize) -> GenOptions {
    let mut options = GenOptions::default();
    options.max_depth = max_depth;
    options.statements = statements;
    options
}

fn all_functions(program: &Program) -> Vec<&FunctionDef> {
    program
        .functions
        .iter()
        .chain(program.structs.iter().flat_map(|s| s.methods.iter()))
        .collect()
}

fn children(e: &Expr) -> Vec<&Expr> {
    match e {
        Expr::Field { base, .. } | Expr::Index { base, .. } => vec![base.as_ref()],
        Expr::Not(e) | Expr::Boxed(e) | Expr::Some(e) => vec![e.as_ref()],
        Expr::Closure { body, .. } => vec![body.as_ref()],
        Expr::Binary { lhs, rhs, .. }
        | Expr::Wrapping { lhs, rhs, .. }
        | Expr::GuardedDiv { lhs, rhs, .. } => vec![lhs.as_ref(), rhs.as_ref()],
        Expr::MethodCall { receiver, args, .. } => {
            let mut all = vec![receiver.as_ref()];
            all.extend(args.iter());
            all
        }
        Expr::Call { args, .. }
        | Expr::Tuple(args)
        | Expr::Array(args, _)
        | Expr::VecLit(args, _) => args.iter().collect(),
        Expr::Struct { fields, .. } => fields.iter().map(|(_, e)| e).collect(),
        _ => vec![],
    }
}

/// The family whose occurrence limit and recursion budget a node was built
/// under. Composite and literal nodes also come out of default values,
/// which are not budgeted, so they have none.
fn budgeted_family(e: &Expr) -> Option<Family> {
    Some(match e {
        Expr::Field { .. } | Expr::Index { .. } => Family::Access,
        Expr::Wrapping { .. } | Expr::GuardedDiv { .. } => Family::Arithmetic,
        Expr::Binary { op, .. } => match op {
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Rem => Family::Arithmetic,
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Gt => Family::Comparison,
            BinOp::And | BinOp::Or => Family::Logical,
        },
        Expr::Not(_) => Family::Logical,
        Expr::Call { .. } | Expr::MethodCall { .. } => Family::Call,
        _ => return None,
    })
}

/// Walks every root-to-leaf path of `e`, counting budgeted nodes per family
/// and in total.
fn check_path(
    e: &Expr,
    options: &GenOptions,
    counts: &mut BTreeMap<Family, usize>,
    spent: usize,
) -> Result<(), String> {
    let family = budgeted_family(e);
    let spent = match family {
        Some(family) => {
            let count = counts.entry(family).or_insert(0);
            *count += 1;
            if *count > options.family_limit(family) {
                return Err(format!("{:?} nests {} deep in `{}`", family, count, e));
            }
            // field access and indexing draw no recursion budget
            if family == Family::Access {
                spent
            } else {
                spent + 1
            }
        }
        None => spent,
    };
    if spent > options.max_depth {
        return Err(format!("`{}` spends {} units of budget", e, spent));
    }

    let result = children(e)
        .into_iter()
        .try_for_each(|child| check_path(child, options, counts, spent));
    if let Some(family) = family {
        if let Some(count) = counts.get_mut(&family) {
            *count -= 1;
        }
    }
    result
}

fn block_exprs<'a>(block: &'a Block, out: &mut Vec<&'a Expr>) {
    for stmt in block.stmts.iter() {
        match stmt {
            Stmt::Decl { value, .. } | Stmt::Assign { value, .. } | Stmt::Expr(value) => {
                out.push(value)
            }
            Stmt::If {
                cond,
                then,
                otherwise,
            } => {
                out.push(cond);
                block_exprs(then, out);
                if let Some(otherwise) = otherwise {
                    block_exprs(otherwise, out);
                }
            }
            Stmt::For { body, .. } => block_exprs(body, out),
            Stmt::CliArgs(_) | Stmt::Output { .. } => {}
        }
    }
    if let Some(tail) = &block.tail {
        out.push(tail);
    }
}

struct Frame {
    bindings: BTreeMap<String, (Ty, bool)>,
    is_loop: bool,
}

/// Replays a function body in execution order and reports the first read of
/// a binding that was already moved, or a move out of a loop's enclosing
/// scope.
struct MoveChecker {
    frames: Vec<Frame>,
}

impl MoveChecker {
    fn new(func: &FunctionDef) -> MoveChecker {
        let bindings = func
            .params
            .iter()
            .map(|(name, ty)| (name.clone(), (ty.clone(), true)))
            .collect();
        MoveChecker {
            frames: vec![Frame {
                bindings,
                is_loop: false,
            }],
        }
    }

    fn declare(&mut self, frame: usize, name: &str, ty: &Ty) {
        self.frames[frame]
            .bindings
            .insert(name.to_string(), (ty.clone(), true));
    }

    fn find(&mut self, name: &str) -> Result<(usize, &mut (Ty, bool)), String> {
        for (idx, frame) in self.frames.iter_mut().enumerate().rev() {
            if let Some(binding) = frame.bindings.get_mut(name) {
                return Ok((idx, binding));
            }
        }
        Err(format!("`{}` is not in scope", name))
    }

    fn loop_floor(&self) -> usize {
        self.frames
            .iter()
            .rposition(|f| f.is_loop)
            .unwrap_or(0)
    }

    fn borrow(&mut self, name: &str) -> Result<(), String> {
        let (_, (_, owned)) = self.find(name)?;
        if *owned {
            Ok(())
        } else {
            Err(format!("`{}` borrowed after move", name))
        }
    }

    fn consume(&mut self, name: &str) -> Result<(), String> {
        let floor = self.loop_floor();
        let (frame, (ty, owned)) = self.find(name)?;
        if ty.is_copy() {
            return Ok(());
        }
        if !*owned {
            return Err(format!("`{}` used after move", name));
        }
        if frame < floor {
            return Err(format!("`{}` moved inside a loop", name));
        }
        *owned = false;
        Ok(())
    }

    fn place(&mut self, e: &Expr) -> Result<(), String> {
        match e {
            Expr::Var(name, _) => self.borrow(name),
            Expr::SelfRef(_) => Ok(()),
            other => self.expr(other),
        }
    }

    fn expr(&mut self, e: &Expr) -> Result<(), String> {
        match e {
            Expr::Var(name, _) => self.consume(name),
            Expr::Field { base, .. } | Expr::Index { base, .. } => self.place(base),
            Expr::MethodCall { receiver, args, .. } => {
                self.place(receiver)?;
                for arg in args {
                    self.expr(arg)?;
                }
                self.place(receiver)
            }
            other => {
                for child in children(other) {
                    self.expr(child)?;
                }
                Ok(())
            }
        }
    }

    fn block(&mut self, block: &Block, is_loop: bool) -> Result<(), String> {
        self.frames.push(Frame {
            bindings: BTreeMap::new(),
            is_loop,
        });
        self.stmts(block)?;
        self.frames.pop();
        Ok(())
    }

    fn stmts(&mut self, block: &Block) -> Result<(), String> {
        for stmt in block.stmts.iter() {
            match stmt {
                Stmt::Decl {
                    name, ty, value, ..
                } => {
                    self.expr(value)?;
                    let top = self.frames.len() - 1;
                    self.declare(top, name, ty);
                }
                Stmt::Assign { name, value } => {
                    self.expr(value)?;
                    let (_, (_, owned)) = self.find(name)?;
                    *owned = true;
                }
                Stmt::Expr(e) => self.expr(e)?,
                Stmt::If {
                    cond,
                    then,
                    otherwise,
                } => {
                    self.expr(cond)?;
                    self.block(then, false)?;
                    if let Some(otherwise) = otherwise {
                        self.block(otherwise, false)?;
                    }
                }
                Stmt::For { body, .. } => self.block(body, true)?,
                Stmt::CliArgs(args) => {
                    for (name, ty) in args {
                        self.declare(0, name, ty);
                    }
                }
                Stmt::Output { vars, .. } => {
                    for var in vars {
                        self.borrow(var)?;
                    }
                }
            }
        }
        if let Some(tail) = &block.tail {
            self.expr(tail)?;
        }
        Ok(())
    }
}

fn check_moves(program: &Program) -> Result<(), String> {
    for func in all_functions(program) {
        MoveChecker::new(func)
            .stmts(&func.body)
            .map_err(|err| format!("{}: {}", func.name, err))?;
    }
    Ok(())
}

fn check_types(program: &Program) -> Result<(), String> {
    let sigs = all_functions(program)
        .into_iter()
        .map(|f| (f.name.clone(), f))
        .collect::<BTreeMap<_, _>>();
    let call_ok = |name: &str, args: &[Expr], ty: &Ty| {
        sigs.get(name).map_or(false, |f| {
            f.ret.same_as(ty)
                && f.params.len() == args.len()
                && f.params
                    .iter()
                    .zip(args.iter())
                    .all(|((_, p), a)| a.ty().same_as(p))
        })
    };

    for func in all_functions(program) {
        if func.ret != Ty::Unit {
            let tail = func
                .body
                .tail
                .as_ref()
                .ok_or_else(|| format!("{} has no tail", func.name))?;
            if !tail.ty().same_as(&func.ret) {
                return Err(format!("{} returns `{}`", func.name, tail.ty()));
            }
        }

        let mut exprs = vec![];
        block_exprs(&func.body, &mut exprs);
        for root in exprs {
            let mut bad = None;
            root.walk(&mut |e| {
                let ok = match e {
                    Expr::Binary { lhs, rhs, .. }
                    | Expr::Wrapping { lhs, rhs, .. }
                    | Expr::GuardedDiv { lhs, rhs, .. } => lhs.ty().same_as(&rhs.ty()),
                    Expr::Call { name, args, ty } => call_ok(name, args, ty),
                    Expr::MethodCall {
                        method, args, ty, ..
                    } => call_ok(method, args, ty),
                    Expr::Not(inner) => inner.ty().same_as(&Ty::Bool),
                    _ => true,
                };
                if !ok && bad.is_none() {
                    bad = Some(e.to_string());
                }
            });
            if let Some(e) = bad {
                return Err(format!("{}: ill-typed `{}`", func.name, e));
            }
        }

        let mut decls = vec![];
        collect_decls(&func.body, &mut decls);
        for (name, ty, value) in decls {
            if !value.ty().same_as(ty) {
                return Err(format!("{}: `{}` is not a `{}`", func.name, name, ty));
            }
        }
    }
    Ok(())
}

fn collect_decls<'a>(block: &'a Block, out: &mut Vec<(&'a String, &'a Ty, &'a Expr)>) {
    for stmt in block.stmts.iter() {
        match stmt {
            Stmt::Decl {
                name, ty, value, ..
            } => out.push((name, ty, value)),
            Stmt::If {
                then, otherwise, ..
            } => {
                collect_decls(then, out);
                if let Some(otherwise) = otherwise {
                    collect_decls(otherwise, out);
                }
            }
            Stmt::For { body, .. } => collect_decls(body, out),
            _ => {}
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn same_seed_same_program(seed in any::<u64>()) {
        let options = options(8, 8);
        let (a, a_args) = generate_program(seed, &options).unwrap();
        let (b, b_args) = generate_program(seed, &options).unwrap();
        prop_assert_eq!(a.to_string(), b.to_string());
        prop_assert_eq!(a_args, b_args);
    }

    #[test]
    fn programs_are_well_typed(seed in any::<u64>()) {
        let (program, _) = generate_program(seed, &options(10, 10)).unwrap();
        if let Err(err) = check_types(&program) {
            prop_assert!(false, "seed {}: {}", seed, err);
        }
    }

    #[test]
    fn no_use_after_move(seed in any::<u64>()) {
        let (program, _) = generate_program(seed, &options(10, 10)).unwrap();
        if let Err(err) = check_moves(&program) {
            prop_assert!(false, "seed {}: {}", seed, err);
        }
    }

    #[test]
    fn nesting_respects_budget_and_family_limits(seed in any::<u64>(), max_depth in 0usize..6) {
        let options = options(max_depth, 6);
        let (program, _) = generate_program(seed, &options).unwrap();
        for func in all_functions(&program) {
            let mut exprs = vec![];
            block_exprs(&func.body, &mut exprs);
            for e in exprs {
                let checked = check_path(e, &options, &mut BTreeMap::new(), 0);
                prop_assert!(checked.is_ok(), "seed {}: {}", seed, checked.unwrap_err());
            }
        }
    }

    #[test]
    fn integer_division_is_always_guarded(seed in any::<u64>()) {
        let (program, _) = generate_program(seed, &options(10, 12)).unwrap();
        for func in all_functions(&program) {
            let mut exprs = vec![];
            block_exprs(&func.body, &mut exprs);
            for root in exprs {
                let mut raw = false;
                root.walk(&mut |e| {
                    if let Expr::Binary { op, lhs, .. } = e {
                        if op.is_arithmetic() && lhs.ty().is_int() {
                            raw = true;
                        }
                    }
                    if let Expr::GuardedDiv { op, .. } = e {
                        if !matches!(op, BinOp::Div | BinOp::Rem) {
                            raw = true;
                        }
                    }
                });
                prop_assert!(!raw, "seed {}: unguarded integer arithmetic in `{}`", seed, root);
            }
        }
    }

    #[test]
    fn output_lists_sorted_printable_variables(seed in any::<u64>()) {
        let (program, _) = generate_program(seed, &options(8, 10)).unwrap();
        let main = program.main().unwrap();
        prop_assert_eq!(main.name.as_str(), "main");
        match main.body.stmts.last() {
            Some(Stmt::Output { seed: printed, vars }) => {
                prop_assert_eq!(*printed, seed);
                let mut sorted = vars.clone();
                sorted.sort();
                prop_assert_eq!(&sorted, vars);
            }
            other => prop_assert!(false, "main ends with {:?}", other),
        }
    }
}
