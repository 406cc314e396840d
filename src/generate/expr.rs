use rand::{seq::SliceRandom, Rng};

use crate::{
    ast::{BinOp, Expr, Lit},
    errors::SmithResult,
    generate::{Context, Generator},
    strutils::rand_string,
    typing::ty::{FloatTy, IntTy, Ty},
};

type Built = SmithResult<Option<Expr>>;

pub(super) fn any_ty(_: &Generator, _: &Context, _: &Ty) -> bool {
    true
}

pub(super) fn is_int(_: &Generator, _: &Context, ty: &Ty) -> bool {
    ty.is_int()
}

pub(super) fn is_float(_: &Generator, _: &Context, ty: &Ty) -> bool {
    ty.is_float()
}

pub(super) fn is_numeric(_: &Generator, _: &Context, ty: &Ty) -> bool {
    ty.is_numeric()
}

pub(super) fn is_bool(_: &Generator, _: &Context, ty: &Ty) -> bool {
    ty.canonical() == Ty::Bool
}

pub(super) fn is_str(_: &Generator, _: &Context, ty: &Ty) -> bool {
    ty.canonical() == Ty::Str
}

pub(super) fn is_unit(_: &Generator, _: &Context, ty: &Ty) -> bool {
    ty.canonical() == Ty::Unit
}

pub(super) fn is_option(_: &Generator, _: &Context, ty: &Ty) -> bool {
    matches!(ty.canonical(), Ty::Option(_))
}

pub(super) fn is_tuple(_: &Generator, _: &Context, ty: &Ty) -> bool {
    matches!(ty.canonical(), Ty::Tuple(_))
}

pub(super) fn is_array(_: &Generator, _: &Context, ty: &Ty) -> bool {
    matches!(ty.canonical(), Ty::Array(..))
}

pub(super) fn is_vec(_: &Generator, _: &Context, ty: &Ty) -> bool {
    matches!(ty.canonical(), Ty::Vec(_))
}

pub(super) fn is_box(_: &Generator, _: &Context, ty: &Ty) -> bool {
    matches!(ty.canonical(), Ty::Box(_))
}

pub(super) fn is_struct(_: &Generator, _: &Context, ty: &Ty) -> bool {
    matches!(ty.canonical(), Ty::Struct(_))
}

pub(super) fn is_func(_: &Generator, _: &Context, ty: &Ty) -> bool {
    matches!(ty.canonical(), Ty::Func(..))
}

/// Function pointers are never returned from generated functions.
pub(super) fn is_returnable(_: &Generator, _: &Context, ty: &Ty) -> bool {
    ty.is_printable()
}

pub(super) fn has_method_receiver(g: &Generator, _: &Context, ty: &Ty) -> bool {
    ty.is_printable() && !g.globals.structs().is_empty()
}

pub(super) fn has_const(g: &Generator, _: &Context, ty: &Ty) -> bool {
    g.globals.constants().iter().any(|c| c.ty.same_as(ty))
}

/// Arguments are only parsed in `main`. A `String` argument is consumed on
/// first use, which a loop body would repeat.
pub(super) fn accepts_cli_arg(g: &Generator, ctx: &Context, ty: &Ty) -> bool {
    ctx.is_entry() && ty.is_primitive() && !(ty.canonical() == Ty::Str && g.scope.in_loop())
}

pub(super) fn has_copy_field(g: &Generator, _: &Context, ty: &Ty) -> bool {
    g.globals
        .structs()
        .iter()
        .any(|def| def.copy_fields_of_type(ty).next().is_some())
}

pub(super) fn is_indexable_elem(_: &Generator, _: &Context, ty: &Ty) -> bool {
    ty.is_copy() && ty.is_primitive()
}

impl Generator {
    pub(super) fn int_literal(&mut self, ty: IntTy) -> Expr {
        let bits = match self.rng.gen_range(0..10) {
            0 => ty.min_bits(),
            1 => ty.max_bits(),
            2 => u128::MAX,
            3..=6 => self.rng.gen_range(0..10),
            _ => self.rng.gen::<u128>(),
        };
        Expr::int(bits, ty)
    }

    pub(super) fn float_literal(&mut self, ty: FloatTy) -> Expr {
        // eighths are exact in both widths
        let value = self.rng.gen_range(-1024i32..1024) as f64 / 8.0;
        Expr::Lit(Lit::Float(value, ty))
    }

    pub(super) fn bool_literal(&mut self) -> Expr {
        Expr::Lit(Lit::Bool(self.rng.gen_bool(0.5)))
    }

    pub(super) fn str_literal(&mut self) -> Expr {
        let len = self.rng.gen_range(0..=self.options.max_string_len);
        Expr::Lit(Lit::Str(rand_string(&mut self.rng, len)))
    }

    /// An expression of struct type `name` to borrow from: `self` inside
    /// one of its methods, an owned variable, or a fresh declaration.
    fn struct_place(&mut self, ctx: &Context, name: &str) -> SmithResult<Expr> {
        if ctx.receiver() == Some(name) && self.rng.gen_bool(0.5) {
            return Ok(Expr::SelfRef(name.to_string()));
        }

        let ty = Ty::Struct(name.to_string());
        let var = match self.scope.random_variable_of_type(&mut self.rng, &ty) {
            Some((var, _)) => var,
            None => self.declare_pending(ctx, &ty)?,
        };
        Ok(Expr::Var(var, ty))
    }

    fn generate_all(&mut self, ctx: &Context, tys: &[Ty]) -> SmithResult<Vec<Expr>> {
        tys.iter().map(|ty| self.generate_expr(ctx, ty)).collect()
    }
}

pub(super) fn int_literal(g: &mut Generator, _: &Context, ty: &Ty) -> Built {
    match ty.canonical() {
        Ty::Int(i) => Ok(Some(g.int_literal(i))),
        _ => Ok(None),
    }
}

pub(super) fn float_literal(g: &mut Generator, _: &Context, ty: &Ty) -> Built {
    match ty.canonical() {
        Ty::Float(f) => Ok(Some(g.float_literal(f))),
        _ => Ok(None),
    }
}

pub(super) fn bool_literal(g: &mut Generator, _: &Context, _: &Ty) -> Built {
    Ok(Some(g.bool_literal()))
}

pub(super) fn str_literal(g: &mut Generator, _: &Context, _: &Ty) -> Built {
    Ok(Some(g.str_literal()))
}

pub(super) fn unit_literal(_: &mut Generator, _: &Context, _: &Ty) -> Built {
    Ok(Some(Expr::Lit(Lit::Unit)))
}

pub(super) fn none_literal(_: &mut Generator, _: &Context, ty: &Ty) -> Built {
    match ty.canonical() {
        Ty::Option(inner) => Ok(Some(Expr::None(*inner))),
        _ => Ok(None),
    }
}

/// Reads a variable by value. Anything that is not `Copy` is moved, so only
/// bindings the current loop body owns qualify.
pub(super) fn variable(g: &mut Generator, _: &Context, ty: &Ty) -> Built {
    let found = if ty.is_copy() {
        g.scope.random_variable_of_type(&mut g.rng, ty)
    } else if g.frozen > 0 {
        None
    } else {
        g.scope.movable_variable_of_type(&mut g.rng, ty)
    };

    let (name, var_ty) = unless!(found);
    if !var_ty.is_copy() {
        g.scope.mark_moved(&name)?;
    }
    Ok(Some(Expr::Var(name, var_ty)))
}

pub(super) fn const_ref(g: &mut Generator, _: &Context, ty: &Ty) -> Built {
    let decl = unless!(g.globals.random_const_of_type(&mut g.rng, ty));
    Ok(Some(Expr::Const(decl.name.clone(), decl.ty.clone())))
}

pub(super) fn cli_arg(g: &mut Generator, _: &Context, ty: &Ty) -> Built {
    let ty = ty.canonical();
    let name = g.idents.cli_arg();
    g.scope.declare_in_root(&name, ty.clone(), false);
    g.globals.request_cli_arg(name.clone(), ty.clone());
    if !ty.is_copy() {
        g.scope.mark_moved(&name)?;
    }
    Ok(Some(Expr::Var(name, ty)))
}

pub(super) fn field_access(g: &mut Generator, ctx: &Context, ty: &Ty) -> Built {
    let fields = g
        .globals
        .structs()
        .iter()
        .flat_map(|def| {
            def.copy_fields_of_type(ty)
                .map(move |field| (def.name.clone(), field.clone()))
        })
        .collect::<Vec<_>>();
    let (name, field) = unless!(fields.choose(&mut g.rng).cloned());
    let base = g.struct_place(ctx, &name)?;
    Ok(Some(Expr::Field {
        base: Box::new(base),
        field,
        ty: ty.clone(),
    }))
}

/// Indexes an array with a literal that is in bounds by construction.
pub(super) fn array_index(g: &mut Generator, ctx: &Context, ty: &Ty) -> Built {
    let found = g.scope.random_variable_where(&mut g.rng, |_, b| {
        matches!(b.ty.canonical(), Ty::Array(elem, len) if len > 0 && elem.same_as(ty))
    });
    let (base, base_ty) = match found {
        Some(var) => var,
        None => {
            let len = g.rng.gen_range(1..=g.options.max_array_len.max(1));
            let array = Ty::Array(Box::new(ty.clone()), len);
            (g.declare_pending(ctx, &array)?, array)
        }
    };

    let len = match base_ty.canonical() {
        Ty::Array(_, len) if len > 0 => len,
        _ => return Ok(None),
    };
    let index = g.rng.gen_range(0..len);
    Ok(Some(Expr::Index {
        base: Box::new(Expr::Var(base, base_ty)),
        index,
        ty: ty.clone(),
    }))
}

fn arithmetic(g: &mut Generator, ctx: &Context, ty: &Ty, op: BinOp) -> Built {
    let lhs = g.generate_expr(ctx, ty)?;
    let rhs = g.generate_expr(ctx, ty)?;
    Ok(Some(Expr::binary(op, lhs, rhs)))
}

pub(super) fn add(g: &mut Generator, ctx: &Context, ty: &Ty) -> Built {
    arithmetic(g, ctx, ty, BinOp::Add)
}

pub(super) fn sub(g: &mut Generator, ctx: &Context, ty: &Ty) -> Built {
    arithmetic(g, ctx, ty, BinOp::Sub)
}

pub(super) fn mul(g: &mut Generator, ctx: &Context, ty: &Ty) -> Built {
    arithmetic(g, ctx, ty, BinOp::Mul)
}

pub(super) fn div(g: &mut Generator, ctx: &Context, ty: &Ty) -> Built {
    arithmetic(g, ctx, ty, BinOp::Div)
}

pub(super) fn rem(g: &mut Generator, ctx: &Context, ty: &Ty) -> Built {
    arithmetic(g, ctx, ty, BinOp::Rem)
}

fn comparison(g: &mut Generator, ctx: &Context, op: BinOp) -> Built {
    let operand = g.random_comparable(matches!(op, BinOp::Lt | BinOp::Gt));
    let lhs = g.generate_expr(ctx, &operand)?;
    let rhs = g.generate_expr(ctx, &operand)?;
    Ok(Some(Expr::binary(op, lhs, rhs)))
}

pub(super) fn eq(g: &mut Generator, ctx: &Context, _: &Ty) -> Built {
    comparison(g, ctx, BinOp::Eq)
}

pub(super) fn ne(g: &mut Generator, ctx: &Context, _: &Ty) -> Built {
    comparison(g, ctx, BinOp::Ne)
}

pub(super) fn lt(g: &mut Generator, ctx: &Context, _: &Ty) -> Built {
    comparison(g, ctx, BinOp::Lt)
}

pub(super) fn gt(g: &mut Generator, ctx: &Context, _: &Ty) -> Built {
    comparison(g, ctx, BinOp::Gt)
}

fn logical(g: &mut Generator, ctx: &Context, op: BinOp) -> Built {
    let lhs = g.generate_expr(ctx, &Ty::Bool)?;
    let rhs = g.generate_expr(ctx, &Ty::Bool)?;
    Ok(Some(Expr::binary(op, lhs, rhs)))
}

pub(super) fn and(g: &mut Generator, ctx: &Context, _: &Ty) -> Built {
    logical(g, ctx, BinOp::And)
}

pub(super) fn or(g: &mut Generator, ctx: &Context, _: &Ty) -> Built {
    logical(g, ctx, BinOp::Or)
}

pub(super) fn not(g: &mut Generator, ctx: &Context, _: &Ty) -> Built {
    let operand = g.generate_expr(ctx, &Ty::Bool)?;
    Ok(Some(Expr::Not(Box::new(operand))))
}

pub(super) fn function_call(g: &mut Generator, ctx: &Context, ty: &Ty) -> Built {
    let name = unless!(g.callee(ctx, ty, None)?);
    let sig = unless!(g.functions.get(&name)).clone();
    let args = g.generate_all(ctx, &sig.params)?;
    Ok(Some(Expr::Call {
        name,
        args,
        ty: sig.ret,
    }))
}

/// Calls a `&self` method. The receiver is pinned while the arguments are
/// generated so none of them can move it out from under the borrow.
pub(super) fn method_call(g: &mut Generator, ctx: &Context, ty: &Ty) -> Built {
    let owner = unless!(g.globals.random_struct(&mut g.rng)).name.clone();
    let method = unless!(g.callee(ctx, ty, Some(&owner))?);
    let sig = unless!(g.functions.get(&method)).clone();
    let receiver = g.struct_place(ctx, &owner)?;

    let pinned = match &receiver {
        Expr::Var(name, _) => Some(name.clone()),
        _ => None,
    };
    if let Some(name) = &pinned {
        g.scope.pin(name);
    }
    let args = g.generate_all(ctx, &sig.params);
    if let Some(name) = &pinned {
        g.scope.unpin(name);
    }

    Ok(Some(Expr::MethodCall {
        receiver: Box::new(receiver),
        method,
        args: args?,
        ty: sig.ret,
    }))
}

pub(super) fn func_ref(g: &mut Generator, ctx: &Context, ty: &Ty) -> Built {
    let (params, ret) = match ty.canonical() {
        Ty::Func(params, ret) => (params, *ret),
        _ => return Ok(None),
    };

    let existing = g
        .functions
        .random_with_type(&mut g.rng, ty)
        .map(|sig| sig.name.clone());
    let name = match existing {
        Some(name) => name,
        None if g.functions.len() < g.options.max_functions => {
            g.synthesize_function(ctx, &ret, None, Some(params))?
        }
        None => return Ok(None),
    };
    Ok(Some(Expr::FuncRef(name, ty.clone())))
}

pub(super) fn tuple_literal(g: &mut Generator, ctx: &Context, ty: &Ty) -> Built {
    let tys = match ty.canonical() {
        Ty::Tuple(tys) => tys,
        _ => return Ok(None),
    };
    Ok(Some(Expr::Tuple(g.generate_all(ctx, &tys)?)))
}

pub(super) fn array_literal(g: &mut Generator, ctx: &Context, ty: &Ty) -> Built {
    let (elem, len) = match ty.canonical() {
        Ty::Array(elem, len) => (*elem, len),
        _ => return Ok(None),
    };
    let elems = (0..len)
        .map(|_| g.generate_expr(ctx, &elem))
        .collect::<SmithResult<Vec<_>>>()?;
    Ok(Some(Expr::Array(elems, elem)))
}

pub(super) fn vec_literal(g: &mut Generator, ctx: &Context, ty: &Ty) -> Built {
    let elem = match ty.canonical() {
        Ty::Vec(elem) => *elem,
        _ => return Ok(None),
    };
    let len = g.rng.gen_range(0..=g.options.max_vec_len);
    let elems = (0..len)
        .map(|_| g.generate_expr(ctx, &elem))
        .collect::<SmithResult<Vec<_>>>()?;
    Ok(Some(Expr::VecLit(elems, elem)))
}

pub(super) fn struct_literal(g: &mut Generator, ctx: &Context, ty: &Ty) -> Built {
    let name = match ty.canonical() {
        Ty::Struct(name) => name,
        _ => return Ok(None),
    };
    let fields = unless!(g.globals.struct_def(&name)).fields.clone();
    let mut values = Vec::with_capacity(fields.len());
    for (field, field_ty) in fields {
        values.push((field, g.generate_expr(ctx, &field_ty)?));
    }
    Ok(Some(Expr::Struct {
        name,
        fields: values,
    }))
}

pub(super) fn box_new(g: &mut Generator, ctx: &Context, ty: &Ty) -> Built {
    let inner = match ty.canonical() {
        Ty::Box(inner) => *inner,
        _ => return Ok(None),
    };
    Ok(Some(Expr::Boxed(Box::new(g.generate_expr(ctx, &inner)?))))
}

pub(super) fn some_value(g: &mut Generator, ctx: &Context, ty: &Ty) -> Built {
    let inner = match ty.canonical() {
        Ty::Option(inner) => *inner,
        _ => return Ok(None),
    };
    Ok(Some(Expr::Some(Box::new(g.generate_expr(ctx, &inner)?))))
}
