use crate::{
    ast::{Expr, Lit},
    typing::ty::Ty,
};

/// Canonical default value for `ty`. Deterministic, never fails, and only
/// ever builds expressions that cannot panic when evaluated.
pub fn zero_value(ty: &Ty) -> Expr {
    match ty {
        Ty::Int(i) => Expr::int(0, *i),
        Ty::Float(f) => Expr::Lit(Lit::Float(0.0, *f)),
        Ty::Bool => Expr::Lit(Lit::Bool(false)),
        Ty::Str => Expr::Lit(Lit::Str(str!(""))),
        Ty::Unit => Expr::Lit(Lit::Unit),
        Ty::Func(params, ret) => Expr::Closure {
            params: params.clone(),
            body: Box::new(zero_value(ret)),
        },
        Ty::Tuple(tys) => Expr::Tuple(tys.iter().map(zero_value).collect()),
        Ty::Array(elem, size) => Expr::Array(
            (0..*size).map(|_| zero_value(elem)).collect(),
            elem.as_ref().clone(),
        ),
        Ty::Vec(elem) => Expr::VecLit(vec![], elem.as_ref().clone()),
        Ty::Box(inner) => Expr::Boxed(Box::new(zero_value(inner))),
        Ty::Option(inner) => Expr::None(inner.as_ref().clone()),
        Ty::Struct(name) => Expr::Default(name.clone()),
        Ty::Alias(_, inner) | Ty::Lifetime(inner, _) => zero_value(inner),
    }
}
