use crate::{
    ast::Expr,
    errors::{SmithError, SmithResult},
    typing::{
        ty::{Ty, MAX_TUPLE_ARITY},
        zero::zero_value,
    },
};

#[derive(Debug, Clone, PartialEq)]
pub struct StructDef {
    pub name: String,
    pub fields: Vec<(String, Ty)>,
    /// Literal of every field's zero value, the body of `Default::default`.
    pub default: Expr,
    pub method_count: usize,
    pub lifetimes: Vec<u32>,
}

impl StructDef {
    /// Builds a struct definition, rejecting any field that would embed the
    /// struct inside itself.
    pub fn new(name: String, fields: Vec<(String, Ty)>) -> SmithResult<StructDef> {
        for (field, ty) in fields.iter() {
            if ty.embeds_struct(&name) {
                return Err(SmithError::self_referential(&name, field));
            }
        }

        let default = Expr::Struct {
            name: name.clone(),
            fields: fields
                .iter()
                .map(|(field, ty)| (field.clone(), zero_value(ty)))
                .collect(),
        };
        let mut lifetimes = fields
            .iter()
            .flat_map(|(_, ty)| ty.lifetime_params())
            .collect::<Vec<_>>();
        lifetimes.sort();
        lifetimes.dedup();

        Ok(StructDef {
            name,
            fields,
            default,
            method_count: 0,
            lifetimes,
        })
    }

    pub fn ty(&self) -> Ty {
        if self.lifetimes.is_empty() {
            Ty::Struct(self.name.clone())
        } else {
            Ty::Lifetime(Box::new(Ty::Struct(self.name.clone())), self.lifetimes.clone())
        }
    }

    pub fn field(&self, name: &str) -> Option<&Ty> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, ty)| ty)
    }

    /// Fields that can be read out of a borrowed value without moving it.
    pub fn copy_fields_of_type<'a>(&'a self, ty: &'a Ty) -> impl Iterator<Item = &'a String> + 'a {
        self.fields
            .iter()
            .filter(move |(_, t)| t.is_copy() && t == ty)
            .map(|(field, _)| field)
    }

    /// A derived `Default` is only emitted when no member names a user
    /// struct; otherwise the cached recipe is written out by hand.
    pub fn needs_explicit_default(&self) -> bool {
        self.fields
            .iter()
            .any(|(_, ty)| !ty.mentions_structs().is_empty() || !derives_default(ty))
    }
}

/// The standard library only implements `Default` for arrays up to 32
/// elements, tuples up to 12, and never for function pointers.
fn derives_default(ty: &Ty) -> bool {
    match ty {
        Ty::Func(..) => false,
        Ty::Array(elem, len) => *len <= 32 && derives_default(elem),
        Ty::Tuple(tys) => tys.len() <= MAX_TUPLE_ARITY && tys.iter().all(derives_default),
        Ty::Box(inner) | Ty::Alias(_, inner) | Ty::Lifetime(inner, _) => derives_default(inner),
        _ => true,
    }
}

#[cfg(test)]
mod structs_tests {
    use super::StructDef;
    use crate::{
        errors::SmithErrorKind,
        typing::ty::{IntTy, Ty},
    };

    fn node() -> Ty {
        Ty::Struct(str!("Node"))
    }

    #[test]
    fn test_rejects_unboxed_self_reference() {
        let err = StructDef::new(str!("Node"), vec![(str!("next"), node())]).unwrap_err();
        assert_eq!(err.kind, SmithErrorKind::SelfReferentialType);

        let err = StructDef::new(
            str!("Node"),
            vec![(str!("pair"), Ty::Tuple(vec![Ty::Bool, node()]))],
        )
        .unwrap_err();
        assert_eq!(err.kind, SmithErrorKind::SelfReferentialType);
    }

    #[test]
    fn test_accepts_indirect_self_reference() {
        let def = StructDef::new(
            str!("Node"),
            vec![
                (str!("value"), Ty::Int(IntTy::I32)),
                (str!("children"), Ty::Vec(Box::new(node()))),
                (
                    str!("next"),
                    Ty::Option(Box::new(Ty::Box(Box::new(node())))),
                ),
            ],
        )
        .unwrap();
        assert!(def.needs_explicit_default());
        assert_eq!(
            def.default.to_string(),
            "Node { value: 0i32, children: Vec::<Node>::new(), next: None::<Box<Node>> }"
        );
        assert_eq!(def.ty(), node());
    }

    #[test]
    fn test_copy_fields_and_derived_default() {
        let def = StructDef::new(
            str!("Struct0"),
            vec![
                (str!("field0"), Ty::i32()),
                (str!("field1"), Ty::Str),
                (str!("field2"), Ty::i32()),
            ],
        )
        .unwrap();
        assert!(!def.needs_explicit_default());
        let wide = StructDef::new(
            str!("Struct1"),
            vec![(str!("field0"), Ty::Array(Box::new(Ty::Bool), 40))],
        )
        .unwrap();
        assert!(wide.needs_explicit_default());
        let fields = def.copy_fields_of_type(&Ty::i32()).cloned().collect::<Vec<_>>();
        assert_eq!(fields, vec![str!("field0"), str!("field2")]);
        assert_eq!(def.copy_fields_of_type(&Ty::Str).count(), 0);
        assert_eq!(def.field("field1"), Some(&Ty::Str));
    }
}
