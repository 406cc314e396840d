use fnv::FnvHashMap;
use rand::{seq::SliceRandom, Rng};

use crate::{ast::FunctionDef, typing::ty::Ty};

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSig {
    pub name: String,
    pub params: Vec<Ty>,
    pub ret: Ty,
    pub receiver: Option<String>,
    complete: bool,
}

impl FunctionSig {
    pub fn new(name: String, params: Vec<Ty>, ret: Ty, receiver: Option<String>) -> FunctionSig {
        FunctionSig {
            name,
            params,
            ret,
            receiver,
            complete: false,
        }
    }

    pub fn ty(&self) -> Ty {
        Ty::Func(self.params.clone(), Box::new(self.ret.clone()))
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }
}

/// Signatures of every function and method of the program, in registration
/// order, together with the finished definitions.
#[derive(Debug, Clone, Default)]
pub struct FunctionTable {
    sigs: Vec<FunctionSig>,
    index: FnvHashMap<String, usize>,
    defs: Vec<FunctionDef>,
}

impl FunctionTable {
    pub fn new() -> FunctionTable {
        FunctionTable::default()
    }

    pub fn len(&self) -> usize {
        self.sigs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sigs.is_empty()
    }

    /// Makes the signature visible before its body exists. The function
    /// cannot be called until `complete` is given its definition.
    pub fn register(&mut self, sig: FunctionSig) {
        self.index.insert(sig.name.clone(), self.sigs.len());
        self.sigs.push(sig);
    }

    /// Drops a registered signature whose body was never finished.
    pub fn unregister(&mut self, name: &str) {
        if let Some(idx) = self.index.remove(name) {
            self.sigs.remove(idx);
            for i in self.index.values_mut() {
                if *i > idx {
                    *i -= 1;
                }
            }
        }
    }

    pub fn complete(&mut self, def: FunctionDef) {
        if let Some(&idx) = self.index.get(&def.name) {
            self.sigs[idx].complete = true;
        }
        self.defs.push(def);
    }

    pub fn get(&self, name: &str) -> Option<&FunctionSig> {
        self.index.get(name).map(|&idx| &self.sigs[idx])
    }

    /// Uniform choice among complete functions returning `ret`. With a
    /// receiver only that struct's methods qualify; without one only free
    /// functions do.
    pub fn random_complete<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        ret: &Ty,
        receiver: Option<&str>,
    ) -> Option<&FunctionSig> {
        let candidates = self
            .sigs
            .iter()
            .filter(|sig| {
                sig.complete && sig.ret.same_as(ret) && sig.receiver.as_deref() == receiver
            })
            .collect::<Vec<_>>();
        candidates.choose(rng).copied()
    }

    /// Complete free functions whose pointer type is exactly `ty`.
    pub fn random_with_type<R: Rng + ?Sized>(&self, rng: &mut R, ty: &Ty) -> Option<&FunctionSig> {
        let candidates = self
            .sigs
            .iter()
            .filter(|sig| sig.complete && sig.receiver.is_none() && sig.ty().same_as(ty))
            .collect::<Vec<_>>();
        candidates.choose(rng).copied()
    }

    pub fn methods_of(&self, name: &str) -> impl Iterator<Item = &FunctionDef> {
        let name = name.to_string();
        self.defs
            .iter()
            .filter(move |def| def.receiver.as_deref() == Some(name.as_str()))
    }

    /// Finished free functions in completion order.
    pub fn free_functions(&self) -> impl Iterator<Item = &FunctionDef> {
        self.defs.iter().filter(|def| def.receiver.is_none())
    }
}
