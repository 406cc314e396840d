use std::collections::BTreeSet;

use fnv::FnvHashMap;
use rand::{seq::SliceRandom, Rng};

use crate::{
    ast::{AliasDef, ConstDecl},
    typing::{structs::StructDef, ty::Ty},
};

/// Program-wide declarations: the struct arena, type aliases, constants and
/// the command-line arguments requested by the entry function.
#[derive(Debug, Clone, Default)]
pub struct GlobalTable {
    structs: Vec<StructDef>,
    struct_index: FnvHashMap<String, usize>,
    aliases: Vec<AliasDef>,
    constants: Vec<ConstDecl>,
    cli_args: Vec<(String, Ty)>,
}

impl GlobalTable {
    pub fn new() -> GlobalTable {
        GlobalTable::default()
    }

    pub fn add_struct(&mut self, def: StructDef) {
        self.struct_index.insert(def.name.clone(), self.structs.len());
        self.structs.push(def);
    }

    pub fn struct_def(&self, name: &str) -> Option<&StructDef> {
        self.struct_index.get(name).map(|&idx| &self.structs[idx])
    }

    pub fn struct_def_mut(&mut self, name: &str) -> Option<&mut StructDef> {
        match self.struct_index.get(name) {
            Some(&idx) => Some(&mut self.structs[idx]),
            None => None,
        }
    }

    pub fn structs(&self) -> &[StructDef] {
        &self.structs
    }

    pub fn random_struct<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&StructDef> {
        self.structs.choose(rng)
    }

    pub fn add_alias(&mut self, alias: AliasDef) {
        self.aliases.push(alias);
    }

    pub fn aliases(&self) -> &[AliasDef] {
        &self.aliases
    }

    pub fn random_alias<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&AliasDef> {
        self.aliases.choose(rng)
    }

    pub fn add_const(&mut self, decl: ConstDecl) {
        self.constants.push(decl);
    }

    pub fn constants(&self) -> &[ConstDecl] {
        &self.constants
    }

    pub fn random_const_of_type<R: Rng + ?Sized>(&self, rng: &mut R, ty: &Ty) -> Option<&ConstDecl> {
        let candidates = self
            .constants
            .iter()
            .filter(|c| c.ty.same_as(ty))
            .collect::<Vec<_>>();
        candidates.choose(rng).copied()
    }

    /// Records a command-line argument of type `ty`. Arguments are parsed in
    /// the order they are first requested.
    pub fn request_cli_arg(&mut self, name: String, ty: Ty) {
        self.cli_args.push((name, ty));
    }

    pub fn cli_args(&self) -> &[(String, Ty)] {
        &self.cli_args
    }

    /// Forgets every argument requested after the first `len`.
    pub fn truncate_cli_args(&mut self, len: usize) {
        self.cli_args.truncate(len);
    }

    /// Every struct reachable from `ty`, following struct fields
    /// transitively.
    pub fn reachable_structs(&self, ty: &Ty) -> BTreeSet<String> {
        let mut seen = BTreeSet::new();
        let mut stack = ty.mentions_structs().into_iter().collect::<Vec<_>>();
        while let Some(name) = stack.pop() {
            if !seen.insert(name.clone()) {
                continue;
            }

            if let Some(def) = self.struct_def(&name) {
                for (_, field) in def.fields.iter() {
                    stack.extend(field.mentions_structs());
                }
            }
        }
        seen
    }
}

#[cfg(test)]
mod globals_tests {
    use std::collections::BTreeSet;

    use rand::{rngs::StdRng, SeedableRng};

    use super::GlobalTable;
    use crate::{
        ast::{ConstDecl, Expr},
        typing::{
            structs::StructDef,
            ty::{IntTy, Ty},
        },
    };

    fn st(name: &str) -> Ty {
        Ty::Struct(str!(name))
    }

    #[test]
    fn test_reachable_structs_follows_fields() {
        let mut globals = GlobalTable::new();
        globals.add_struct(StructDef::new(str!("Struct0"), vec![(str!("field0"), Ty::Bool)]).unwrap());
        globals.add_struct(
            StructDef::new(
                str!("Struct1"),
                vec![(str!("field0"), Ty::Vec(Box::new(st("Struct0"))))],
            )
            .unwrap(),
        );
        globals.add_struct(
            StructDef::new(
                str!("Struct2"),
                vec![
                    (str!("field0"), Ty::Option(Box::new(st("Struct1")))),
                    (str!("field1"), Ty::Vec(Box::new(st("Struct2")))),
                ],
            )
            .unwrap(),
        );

        let reached = globals.reachable_structs(&Ty::Tuple(vec![Ty::Bool, st("Struct2")]));
        let expected = ["Struct0", "Struct1", "Struct2"]
            .iter()
            .map(|s| str!(*s))
            .collect::<BTreeSet<_>>();
        assert_eq!(reached, expected);
        assert!(globals.reachable_structs(&Ty::i32()).is_empty());
    }

    #[test]
    fn test_constants_by_type() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut globals = GlobalTable::new();
        globals.add_const(ConstDecl {
            name: str!("CONST0"),
            ty: Ty::Int(IntTy::U8),
            value: Expr::int(3, IntTy::U8),
        });
        assert_eq!(
            globals
                .random_const_of_type(&mut rng, &Ty::Int(IntTy::U8))
                .map(|c| c.name.as_str()),
            Some("CONST0")
        );
        assert!(globals.random_const_of_type(&mut rng, &Ty::Bool).is_none());
    }

    #[test]
    fn test_cli_args_keep_request_order() {
        let mut globals = GlobalTable::new();
        globals.request_cli_arg(str!("cli_arg0"), Ty::Bool);
        globals.request_cli_arg(str!("cli_arg1"), Ty::Str);
        globals.request_cli_arg(str!("cli_arg2"), Ty::i32());
        globals.truncate_cli_args(2);
        let names = globals
            .cli_args()
            .iter()
            .map(|(n, _)| n.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["cli_arg0", "cli_arg1"]);
    }
}
