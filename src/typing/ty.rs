use std::{collections::BTreeSet, fmt::Display};

use crate::utils::join;

/// Longest tuple the standard library implements `Debug` and `Default` for.
pub const MAX_TUPLE_ARITY: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IntTy {
    I8,
    I16,
    I32,
    I64,
    I128,
    U8,
    U16,
    U32,
    U64,
    U128,
}

impl IntTy {
    pub const ALL: [IntTy; 10] = [
        IntTy::I8,
        IntTy::I16,
        IntTy::I32,
        IntTy::I64,
        IntTy::I128,
        IntTy::U8,
        IntTy::U16,
        IntTy::U32,
        IntTy::U64,
        IntTy::U128,
    ];

    pub fn bits(&self) -> u32 {
        match self {
            IntTy::I8 | IntTy::U8 => 8,
            IntTy::I16 | IntTy::U16 => 16,
            IntTy::I32 | IntTy::U32 => 32,
            IntTy::I64 | IntTy::U64 => 64,
            IntTy::I128 | IntTy::U128 => 128,
        }
    }

    pub fn is_signed(&self) -> bool {
        matches!(
            self,
            IntTy::I8 | IntTy::I16 | IntTy::I32 | IntTy::I64 | IntTy::I128
        )
    }

    /// Mask selecting the low `bits()` bits of a `u128`.
    pub fn mask(&self) -> u128 {
        if self.bits() == 128 {
            u128::MAX
        } else {
            (1u128 << self.bits()) - 1
        }
    }

    /// Truncates `raw` to this width, keeping the two's complement bit pattern.
    pub fn truncate(&self, raw: u128) -> u128 {
        raw & self.mask()
    }

    /// Interprets the low `bits()` bits of `raw` as a value of this type.
    pub fn signed_value(&self, raw: u128) -> i128 {
        let bits = self.truncate(raw);
        if self.is_signed() {
            let shift = 128 - self.bits();
            ((bits << shift) as i128) >> shift
        } else {
            bits as i128
        }
    }

    /// Bit pattern of the smallest value of the type.
    pub fn min_bits(&self) -> u128 {
        if self.is_signed() {
            1u128 << (self.bits() - 1)
        } else {
            0
        }
    }

    /// Bit pattern of the largest value of the type.
    pub fn max_bits(&self) -> u128 {
        if self.is_signed() {
            self.mask() >> 1
        } else {
            self.mask()
        }
    }

    /// Renders a literal with an explicit suffix. Negative literals are
    /// parenthesized so a trailing method call binds to the whole value, and
    /// the minimum of a signed type is spelled `T::MIN` since its magnitude is
    /// not representable.
    pub fn render(&self, raw: u128) -> String {
        let bits = self.truncate(raw);
        if !self.is_signed() {
            return format!("{}{}", bits, self);
        }

        if bits == self.min_bits() {
            return format!("{}::MIN", self);
        }

        let value = self.signed_value(bits);
        if value < 0 {
            format!("(-{}{})", value.unsigned_abs(), self)
        } else {
            format!("{}{}", value, self)
        }
    }
}

impl Display for IntTy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            IntTy::I8 => "i8",
            IntTy::I16 => "i16",
            IntTy::I32 => "i32",
            IntTy::I64 => "i64",
            IntTy::I128 => "i128",
            IntTy::U8 => "u8",
            IntTy::U16 => "u16",
            IntTy::U32 => "u32",
            IntTy::U64 => "u64",
            IntTy::U128 => "u128",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FloatTy {
    F32,
    F64,
}

impl Display for FloatTy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FloatTy::F32 => write!(f, "f32"),
            FloatTy::F64 => write!(f, "f64"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Ty {
    Int(IntTy),
    Float(FloatTy),
    Bool,
    Str,
    Unit,
    Func(Vec<Ty>, Box<Ty>),
    Tuple(Vec<Ty>),
    Array(Box<Ty>, usize),
    Vec(Box<Ty>),
    Box(Box<Ty>),
    Option(Box<Ty>),
    Struct(String),
    Alias(String, Box<Ty>),
    Lifetime(Box<Ty>, Vec<u32>),
}

impl Display for Ty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Ty::Int(i) => write!(f, "{}", i),
            Ty::Float(fl) => write!(f, "{}", fl),
            Ty::Bool => write!(f, "bool"),
            Ty::Str => write!(f, "String"),
            Ty::Unit => write!(f, "()"),
            Ty::Func(params, ret) => write!(f, "fn({}) -> {}", join(params, ", "), ret),
            Ty::Tuple(tys) if tys.len() == 1 => write!(f, "({},)", tys[0]),
            Ty::Tuple(tys) => write!(f, "({})", join(tys, ", ")),
            Ty::Array(ty, size) => write!(f, "[{}; {}]", ty, size),
            Ty::Vec(ty) => write!(f, "Vec<{}>", ty),
            Ty::Box(ty) => write!(f, "Box<{}>", ty),
            Ty::Option(ty) => write!(f, "Option<{}>", ty),
            Ty::Struct(name) => write!(f, "{}", name),
            Ty::Alias(name, _) => write!(f, "{}", name),
            Ty::Lifetime(ty, slots) => match ty.as_ref() {
                Ty::Struct(name) | Ty::Alias(name, _) if !slots.is_empty() => {
                    write!(f, "{}<{}>", name, lifetime_list(slots))
                }
                _ => write!(f, "{}", ty),
            },
        }
    }
}

/// Renders lifetime slots as `'a1, 'a2`, deduplicated in slot order.
pub fn lifetime_list(slots: &[u32]) -> String {
    let mut seen = BTreeSet::new();
    let names = slots
        .iter()
        .filter(|s| seen.insert(**s))
        .map(|s| format!("'a{}", s))
        .collect::<Vec<_>>();
    names.join(", ")
}

impl Ty {
    #[inline(always)]
    pub fn i32() -> Ty {
        Ty::Int(IntTy::I32)
    }

    pub fn is_int(&self) -> bool {
        matches!(self.canonical(), Ty::Int(_))
    }

    pub fn is_float(&self) -> bool {
        matches!(self.canonical(), Ty::Float(_))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.canonical(), Ty::Int(_) | Ty::Float(_))
    }

    /// Types that a literal can be written for and that a program can read
    /// from its command line.
    pub fn is_primitive(&self) -> bool {
        matches!(
            self.canonical(),
            Ty::Int(_) | Ty::Float(_) | Ty::Bool | Ty::Str
        )
    }

    pub fn is_copy(&self) -> bool {
        match self {
            Ty::Int(_) | Ty::Float(_) | Ty::Bool | Ty::Unit | Ty::Func(..) => true,
            Ty::Tuple(tys) => tys.iter().all(Ty::is_copy),
            Ty::Array(ty, _) => ty.is_copy(),
            Ty::Alias(_, ty) | Ty::Lifetime(ty, _) => ty.is_copy(),
            Ty::Str | Ty::Vec(_) | Ty::Box(_) | Ty::Option(_) | Ty::Struct(_) => false,
        }
    }

    /// Function pointers format as addresses, which differ between builds.
    /// Anything that can reach one is kept out of the output dump, as are
    /// tuples too long to implement `Debug`.
    pub fn is_printable(&self) -> bool {
        match self {
            Ty::Func(..) => false,
            Ty::Tuple(tys) => tys.len() <= MAX_TUPLE_ARITY && tys.iter().all(Ty::is_printable),
            Ty::Array(ty, _) | Ty::Vec(ty) | Ty::Box(ty) | Ty::Option(ty) => ty.is_printable(),
            Ty::Alias(_, ty) | Ty::Lifetime(ty, _) => ty.is_printable(),
            _ => true,
        }
    }

    /// The type with every alias and lifetime wrapper replaced by what it
    /// stands for. Two types are interchangeable iff their canonical forms
    /// are equal.
    pub fn canonical(&self) -> Ty {
        match self {
            Ty::Alias(_, ty) | Ty::Lifetime(ty, _) => ty.canonical(),
            Ty::Func(params, ret) => Ty::Func(
                params.iter().map(Ty::canonical).collect(),
                Box::new(ret.canonical()),
            ),
            Ty::Tuple(tys) => Ty::Tuple(tys.iter().map(Ty::canonical).collect()),
            Ty::Array(ty, size) => Ty::Array(Box::new(ty.canonical()), *size),
            Ty::Vec(ty) => Ty::Vec(Box::new(ty.canonical())),
            Ty::Box(ty) => Ty::Box(Box::new(ty.canonical())),
            Ty::Option(ty) => Ty::Option(Box::new(ty.canonical())),
            _ => self.clone(),
        }
    }

    pub fn same_as(&self, other: &Ty) -> bool {
        self == other || self.canonical() == other.canonical()
    }

    /// Every nominal struct named anywhere inside this type, looking through
    /// composite, array, sequence, indirection, alias and lifetime wrappers.
    /// Struct fields are not followed; see `GlobalTable::reachable_structs`.
    pub fn mentions_structs(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        self.collect_structs(&mut names);
        names
    }

    fn collect_structs(&self, names: &mut BTreeSet<String>) {
        match self {
            Ty::Struct(name) => {
                names.insert(name.clone());
            }
            Ty::Func(params, ret) => {
                for p in params {
                    p.collect_structs(names);
                }
                ret.collect_structs(names);
            }
            Ty::Tuple(tys) => {
                for t in tys {
                    t.collect_structs(names);
                }
            }
            Ty::Array(ty, _)
            | Ty::Vec(ty)
            | Ty::Box(ty)
            | Ty::Option(ty)
            | Ty::Alias(_, ty)
            | Ty::Lifetime(ty, _) => ty.collect_structs(names),
            Ty::Int(_) | Ty::Float(_) | Ty::Bool | Ty::Str | Ty::Unit => {}
        }
    }

    /// Lifetime slots this type depends on, in order of appearance.
    pub fn lifetime_params(&self) -> Vec<u32> {
        match self {
            Ty::Lifetime(ty, slots) => {
                let mut params = slots.clone();
                params.extend(ty.lifetime_params());
                params
            }
            Ty::Func(params, ret) => params
                .iter()
                .chain(std::iter::once(ret.as_ref()))
                .flat_map(Ty::lifetime_params)
                .collect(),
            Ty::Tuple(tys) => tys.iter().flat_map(Ty::lifetime_params).collect(),
            Ty::Array(ty, _) | Ty::Vec(ty) | Ty::Box(ty) | Ty::Option(ty) | Ty::Alias(_, ty) => {
                ty.lifetime_params()
            }
            _ => vec![],
        }
    }

    /// Whether `name` occurs in this type somewhere that would embed it
    /// inline. `Vec` always breaks the chain. `Box` breaks it only when the
    /// box itself sits under `Option` or `Vec`, otherwise the value could
    /// never be built.
    pub fn embeds_struct(&self, name: &str) -> bool {
        self.embeds_struct_inner(name, false)
    }

    fn embeds_struct_inner(&self, name: &str, optional: bool) -> bool {
        match self {
            Ty::Struct(n) => n == name,
            Ty::Vec(_) => false,
            Ty::Box(ty) => {
                if optional {
                    false
                } else {
                    ty.embeds_struct_inner(name, false)
                }
            }
            Ty::Option(ty) => ty.embeds_struct_inner(name, true),
            Ty::Tuple(tys) => tys.iter().any(|t| t.embeds_struct_inner(name, false)),
            Ty::Array(ty, _) | Ty::Alias(_, ty) | Ty::Lifetime(ty, _) => {
                ty.embeds_struct_inner(name, optional)
            }
            Ty::Func(..) => false,
            Ty::Int(_) | Ty::Float(_) | Ty::Bool | Ty::Str | Ty::Unit => false,
        }
    }
}
