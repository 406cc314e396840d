use log::debug;
use rand::Rng;

use crate::{
    ast::{AliasDef, ConstDecl},
    errors::SmithResult,
    generate::{ident, Generator},
    typing::{
        structs::StructDef,
        ty::{FloatTy, IntTy, Ty, MAX_TUPLE_ARITY},
    },
};

impl Generator {
    /// A type for a declaration or parameter. Function pointers are only
    /// drawn when `allow_func` is set, and never nested inside another type.
    pub fn random_type(&mut self, allow_func: bool) -> SmithResult<Ty> {
        self.random_type_at(0, allow_func)
    }

    /// Return type for a call whose value may be discarded.
    pub(super) fn random_return_type(&mut self) -> SmithResult<Ty> {
        if self.rng.gen_range(0..5) == 0 {
            Ok(Ty::Unit)
        } else {
            self.random_type(false)
        }
    }

    fn random_type_at(&mut self, depth: usize, allow_func: bool) -> SmithResult<Ty> {
        let nested = depth < self.options.max_type_depth;
        Ok(match self.rng.gen_range(0..20) {
            10 if nested => {
                let max_len = self.options.max_tuple_len.max(1).min(MAX_TUPLE_ARITY);
                let len = self.rng.gen_range(1..=max_len);
                let tys = (0..len)
                    .map(|_| self.random_type_at(depth + 1, false))
                    .collect::<SmithResult<Vec<_>>>()?;
                Ty::Tuple(tys)
            }
            11 if nested => {
                let elem = self.random_type_at(depth + 1, false)?;
                let len = self.rng.gen_range(1..=self.options.max_array_len.max(1));
                Ty::Array(Box::new(elem), len)
            }
            12 if nested => Ty::Vec(Box::new(self.random_type_at(depth + 1, false)?)),
            13 if nested => Ty::Box(Box::new(self.random_type_at(depth + 1, false)?)),
            14 if nested => Ty::Option(Box::new(self.random_type_at(depth + 1, false)?)),
            15 | 16 => self.random_struct(depth)?,
            17 => self.random_alias(depth)?,
            18 | 19 if allow_func => self.random_func_type(),
            _ => self.random_primitive(),
        })
    }

    pub(super) fn random_primitive(&mut self) -> Ty {
        match self.rng.gen_range(0..10) {
            0..=5 => Ty::Int(self.random_int_ty()),
            6 => Ty::Float(self.random_float_ty()),
            7 | 8 => Ty::Bool,
            _ => Ty::Str,
        }
    }

    /// Operand type for a comparison. Only numbers are ordered.
    pub(super) fn random_comparable(&mut self, ordered: bool) -> Ty {
        let upper = if ordered { 8 } else { 9 };
        match self.rng.gen_range(0..upper) {
            0..=5 => Ty::Int(self.random_int_ty()),
            6 | 7 => Ty::Float(self.random_float_ty()),
            _ => Ty::Bool,
        }
    }

    fn random_int_ty(&mut self) -> IntTy {
        IntTy::ALL[self.rng.gen_range(0..IntTy::ALL.len())]
    }

    fn random_float_ty(&mut self) -> FloatTy {
        if self.rng.gen_bool(0.5) {
            FloatTy::F32
        } else {
            FloatTy::F64
        }
    }

    fn random_func_type(&mut self) -> Ty {
        let count = self.rng.gen_range(0..=2);
        let params = (0..count).map(|_| self.random_primitive()).collect();
        Ty::Func(params, Box::new(self.random_primitive()))
    }

    fn random_struct(&mut self, depth: usize) -> SmithResult<Ty> {
        let can_grow = self.globals.structs().len() < self.options.max_structs
            && depth < self.options.max_type_depth;
        let existing = self.globals.random_struct(&mut self.rng).map(StructDef::ty);
        match existing {
            Some(ty) if !can_grow || self.rng.gen_bool(0.6) => Ok(ty),
            _ if can_grow => self.synthesize_struct(depth),
            _ => Ok(self.random_primitive()),
        }
    }

    /// Defines a new struct. Field types may name earlier structs, never
    /// later ones, and at most one field refers back to the struct itself
    /// through `Vec` or `Option<Box<_>>`.
    fn synthesize_struct(&mut self, depth: usize) -> SmithResult<Ty> {
        let name = self.idents.structure();
        let count = self.rng.gen_range(1..=self.options.max_struct_fields.max(1));
        let mut fields = Vec::with_capacity(count + 1);
        for idx in 0..count {
            fields.push((ident::field(idx), self.random_type_at(depth + 1, false)?));
        }

        if self.rng.gen_bool(0.2) {
            let own = Box::new(Ty::Struct(name.clone()));
            let link = if self.rng.gen_bool(0.5) {
                Ty::Vec(own)
            } else {
                Ty::Option(Box::new(Ty::Box(own)))
            };
            fields.push((ident::field(count), link));
        }

        let def = StructDef::new(name, fields)?;
        debug!("defined struct {} with {} fields", def.name, def.fields.len());
        let ty = def.ty();
        self.globals.add_struct(def);
        Ok(ty)
    }

    fn random_alias(&mut self, depth: usize) -> SmithResult<Ty> {
        let can_grow = self.globals.aliases().len() < self.options.max_aliases;
        let existing = self
            .globals
            .random_alias(&mut self.rng)
            .map(|alias| Ty::Alias(alias.name.clone(), Box::new(alias.ty.clone())));
        match existing {
            Some(ty) if !can_grow || self.rng.gen_bool(0.5) => Ok(ty),
            _ if can_grow => {
                let ty = self.random_type_at(depth + 1, false)?;
                let name = self.idents.alias();
                debug!("defined alias {} = {}", name, ty);
                self.globals.add_alias(AliasDef {
                    name: name.clone(),
                    ty: ty.clone(),
                });
                Ok(Ty::Alias(name, Box::new(ty)))
            }
            _ => Ok(self.random_primitive()),
        }
    }

    /// Declares up to `max_constants` constants of numeric or boolean type.
    pub fn generate_constants(&mut self) -> SmithResult<()> {
        let count = self.rng.gen_range(0..=self.options.max_constants);
        for _ in 0..count {
            let ty = self.random_comparable(false);
            let value = self.terminal(&ty)?;
            let name = self.idents.constant();
            self.globals.add_const(ConstDecl { name, ty, value });
        }
        Ok(())
    }
}
