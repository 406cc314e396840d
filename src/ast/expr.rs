use crate::{
    typing::ty::{FloatTy, IntTy, Ty},
    utils::{join, map_join},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Gt,
    And,
    Or,
}

impl BinOp {
    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Rem
        )
    }

    pub fn is_division(&self) -> bool {
        matches!(self, BinOp::Div | BinOp::Rem)
    }

    /// Name of the always-defined integer method for this operator.
    pub fn wrapping_method(&self) -> Option<&'static str> {
        Some(match self {
            BinOp::Add => "wrapping_add",
            BinOp::Sub => "wrapping_sub",
            BinOp::Mul => "wrapping_mul",
            BinOp::Div => "wrapping_div",
            BinOp::Rem => "wrapping_rem",
            _ => return None,
        })
    }
}

impl std::fmt::Display for BinOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::And => "&&",
            BinOp::Or => "||",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Lit {
    /// Two's complement bit pattern, truncated to the width of the type.
    Int(u128, IntTy),
    Float(f64, FloatTy),
    Bool(bool),
    Str(String),
    Unit,
}

impl Lit {
    pub fn ty(&self) -> Ty {
        match self {
            Lit::Int(_, i) => Ty::Int(*i),
            Lit::Float(_, f) => Ty::Float(*f),
            Lit::Bool(_) => Ty::Bool,
            Lit::Str(_) => Ty::Str,
            Lit::Unit => Ty::Unit,
        }
    }
}

impl std::fmt::Display for Lit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Lit::Int(bits, ty) => write!(f, "{}", ty.render(*bits)),
            Lit::Float(value, ty) => {
                let value = match ty {
                    FloatTy::F32 => format!("{:?}", *value as f32),
                    FloatTy::F64 => format!("{:?}", value),
                };
                if value.starts_with('-') {
                    write!(f, "({}{})", value, ty)
                } else {
                    write!(f, "{}{}", value, ty)
                }
            }
            Lit::Bool(b) => write!(f, "{}", b),
            Lit::Str(s) if s.is_empty() => write!(f, "String::new()"),
            Lit::Str(s) => write!(f, "String::from(\"{}\")", s),
            Lit::Unit => write!(f, "()"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Lit(Lit),
    Var(String, Ty),
    Const(String, Ty),
    /// The `&self` receiver inside a method of the named struct.
    SelfRef(String),
    Field {
        base: Box<Expr>,
        field: String,
        ty: Ty,
    },
    Index {
        base: Box<Expr>,
        index: usize,
        ty: Ty,
    },
    Not(Box<Expr>),
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// Integer `+ - *` rewritten to the `wrapping_*` method.
    Wrapping {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// Integer `/ %` that yields zero instead of faulting on a zero divisor.
    GuardedDiv {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        name: String,
        args: Vec<Expr>,
        ty: Ty,
    },
    MethodCall {
        receiver: Box<Expr>,
        method: String,
        args: Vec<Expr>,
        ty: Ty,
    },
    Tuple(Vec<Expr>),
    Array(Vec<Expr>, Ty),
    VecLit(Vec<Expr>, Ty),
    Struct {
        name: String,
        fields: Vec<(String, Expr)>,
    },
    Boxed(Box<Expr>),
    Some(Box<Expr>),
    None(Ty),
    Closure {
        params: Vec<Ty>,
        body: Box<Expr>,
    },
    FuncRef(String, Ty),
    Default(String),
}

impl Expr {
    pub fn int(bits: u128, ty: IntTy) -> Expr {
        Expr::Lit(Lit::Int(ty.truncate(bits), ty))
    }

    pub fn binary(op: BinOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Static type of the expression, computed from its already-typed
    /// children. Total over every tree the generator builds.
    pub fn ty(&self) -> Ty {
        match self {
            Expr::Lit(lit) => lit.ty(),
            Expr::Var(_, ty) | Expr::Const(_, ty) | Expr::FuncRef(_, ty) => ty.clone(),
            Expr::SelfRef(name) | Expr::Default(name) => Ty::Struct(name.clone()),
            Expr::Field { ty, .. } | Expr::Index { ty, .. } => ty.clone(),
            Expr::Call { ty, .. } | Expr::MethodCall { ty, .. } => ty.clone(),
            Expr::Not(_) => Ty::Bool,
            Expr::Binary { op, lhs, .. }
            | Expr::Wrapping { op, lhs, .. }
            | Expr::GuardedDiv { op, lhs, .. } => {
                if op.is_arithmetic() {
                    lhs.ty()
                } else {
                    Ty::Bool
                }
            }
            Expr::Tuple(elems) => Ty::Tuple(elems.iter().map(Expr::ty).collect()),
            Expr::Array(elems, ty) => Ty::Array(Box::new(ty.clone()), elems.len()),
            Expr::VecLit(_, ty) => Ty::Vec(Box::new(ty.clone())),
            Expr::Struct { name, .. } => Ty::Struct(name.clone()),
            Expr::Boxed(inner) => Ty::Box(Box::new(inner.ty())),
            Expr::Some(inner) => Ty::Option(Box::new(inner.ty())),
            Expr::None(ty) => Ty::Option(Box::new(ty.clone())),
            Expr::Closure { params, body } => Ty::Func(params.clone(), Box::new(body.ty())),
        }
    }

    /// Calls `f` on this node and every node below it, parents first.
    pub fn walk<F: FnMut(&Expr)>(&self, f: &mut F) {
        f(self);
        match self {
            Expr::Field { base, .. } | Expr::Index { base, .. } => base.walk(f),
            Expr::Not(e) | Expr::Boxed(e) | Expr::Some(e) => e.walk(f),
            Expr::Binary { lhs, rhs, .. }
            | Expr::Wrapping { lhs, rhs, .. }
            | Expr::GuardedDiv { lhs, rhs, .. } => {
                lhs.walk(f);
                rhs.walk(f);
            }
            Expr::Call { args, .. } => args.iter().for_each(|a| a.walk(f)),
            Expr::MethodCall { receiver, args, .. } => {
                receiver.walk(f);
                args.iter().for_each(|a| a.walk(f));
            }
            Expr::Tuple(elems) | Expr::Array(elems, _) | Expr::VecLit(elems, _) => {
                elems.iter().for_each(|e| e.walk(f))
            }
            Expr::Struct { fields, .. } => fields.iter().for_each(|(_, e)| e.walk(f)),
            Expr::Closure { body, .. } => body.walk(f),
            Expr::Lit(_)
            | Expr::Var(..)
            | Expr::Const(..)
            | Expr::SelfRef(_)
            | Expr::None(_)
            | Expr::FuncRef(..)
            | Expr::Default(_) => {}
        }
    }
}

impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Lit(lit) => write!(f, "{}", lit),
            Expr::Var(name, _) | Expr::Const(name, _) | Expr::FuncRef(name, _) => {
                write!(f, "{}", name)
            }
            Expr::SelfRef(_) => write!(f, "self"),
            Expr::Field { base, field, .. } => write!(f, "{}.{}", base, field),
            Expr::Index { base, index, .. } => write!(f, "{}[{}usize]", base, index),
            Expr::Not(e) => write!(f, "(!{})", e),
            Expr::Binary { op, lhs, rhs } => write!(f, "({} {} {})", lhs, op, rhs),
            Expr::Wrapping { op, lhs, rhs } => write!(
                f,
                "({}).{}({})",
                lhs,
                op.wrapping_method().unwrap_or("wrapping_add"),
                rhs
            ),
            Expr::GuardedDiv { op, lhs, rhs } => {
                let zero = match lhs.ty().canonical() {
                    Ty::Int(i) => Expr::int(0, i),
                    _ => Expr::int(0, IntTy::I32),
                };
                write!(
                    f,
                    "{{ let dividend = {}; let divisor = {}; if divisor != {} {{ dividend.{}(divisor) }} else {{ {} }} }}",
                    lhs,
                    rhs,
                    zero,
                    op.wrapping_method().unwrap_or("wrapping_div"),
                    zero
                )
            }
            Expr::Call { name, args, .. } => write!(f, "{}({})", name, join(args, ", ")),
            Expr::MethodCall {
                receiver,
                method,
                args,
                ..
            } => write!(f, "{}.{}({})", receiver, method, join(args, ", ")),
            Expr::Tuple(elems) if elems.len() == 1 => write!(f, "({},)", elems[0]),
            Expr::Tuple(elems) => write!(f, "({})", join(elems, ", ")),
            Expr::Array(elems, _) => write!(f, "[{}]", join(elems, ", ")),
            Expr::VecLit(elems, ty) if elems.is_empty() => write!(f, "Vec::<{}>::new()", ty),
            Expr::VecLit(elems, _) => write!(f, "vec![{}]", join(elems, ", ")),
            Expr::Struct { name, fields } => write!(
                f,
                "{} {{ {} }}",
                name,
                map_join(fields, ", ", |(field, e)| format!("{}: {}", field, e))
            ),
            Expr::Boxed(e) => write!(f, "Box::new({})", e),
            Expr::Some(e) => write!(f, "Some({})", e),
            Expr::None(ty) => write!(f, "None::<{}>", ty),
            Expr::Closure { params, body } => write!(
                f,
                "|{}| {}",
                map_join(params, ", ", |p| format!("_: {}", p)),
                body
            ),
            Expr::Default(name) => write!(f, "{}::default()", name),
        }
    }
}
