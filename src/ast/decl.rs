use crate::{
    ast::{Block, Expr},
    typing::ty::Ty,
    utils::{indent, map_join},
};

#[derive(Debug, Clone, PartialEq)]
pub struct ConstDecl {
    pub name: String,
    pub ty: Ty,
    pub value: Expr,
}

impl std::fmt::Display for ConstDecl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "const {}: {} = {};", self.name, self.ty, self.value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<(String, Ty)>,
    pub ret: Ty,
    /// Struct whose `impl` block holds this function as a `&self` method.
    pub receiver: Option<String>,
    pub body: Block,
}

impl FunctionDef {
    pub fn ty(&self) -> Ty {
        Ty::Func(
            self.params.iter().map(|(_, ty)| ty.clone()).collect(),
            Box::new(self.ret.clone()),
        )
    }
}

impl std::fmt::Display for FunctionDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut params = self
            .params
            .iter()
            .map(|(name, ty)| format!("{}: {}", name, ty))
            .collect::<Vec<_>>();
        if self.receiver.is_some() {
            params.insert(0, str!("&self"));
        }
        let ret = if self.ret == Ty::Unit {
            str!("")
        } else {
            format!(" -> {}", self.ret)
        };
        write!(
            f,
            "fn {}({}){} {{\n{}\n}}",
            self.name,
            params.join(", "),
            ret,
            indent(self.body.to_string(), 1)
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AliasDef {
    pub name: String,
    pub ty: Ty,
}

impl std::fmt::Display for AliasDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let params = self.ty.lifetime_params();
        if params.is_empty() {
            write!(f, "type {} = {};", self.name, self.ty)
        } else {
            write!(
                f,
                "type {}<{}> = {};",
                self.name,
                crate::typing::ty::lifetime_list(&params),
                self.ty
            )
        }
    }
}

/// Renders `fields` as the body of a struct declaration.
pub fn render_fields(fields: &[(String, Ty)]) -> String {
    map_join(fields, "\n", |(name, ty)| format!("{}: {},", name, ty))
}

#[cfg(test)]
mod decl_tests {
    use super::{AliasDef, ConstDecl, FunctionDef};
    use crate::{
        ast::{Block, Expr},
        typing::ty::{IntTy, Ty},
    };

    #[test]
    fn test_function_rendering() {
        let func = FunctionDef {
            name: str!("fun0"),
            params: vec![(str!("var0"), Ty::Bool)],
            ret: Ty::Int(IntTy::I64),
            receiver: None,
            body: Block::new(vec![], Some(Expr::int(9, IntTy::I64))),
        };
        assert_eq!(func.to_string(), "fn fun0(var0: bool) -> i64 {\n    9i64\n}");
        assert_eq!(
            func.ty(),
            Ty::Func(vec![Ty::Bool], Box::new(Ty::Int(IntTy::I64)))
        );

        let method = FunctionDef {
            receiver: Some(str!("Struct0")),
            ret: Ty::Unit,
            body: Block::new(vec![], Some(Expr::Lit(crate::ast::Lit::Unit))),
            ..func
        };
        assert_eq!(method.to_string(), "fn fun0(&self, var0: bool) {\n    ()\n}");
    }

    #[test]
    fn test_const_and_alias_rendering() {
        let c = ConstDecl {
            name: str!("CONST0"),
            ty: Ty::Int(IntTy::I16),
            value: Expr::int(0xffff, IntTy::I16),
        };
        assert_eq!(c.to_string(), "const CONST0: i16 = (-1i16);");
        let alias = AliasDef {
            name: str!("Alias0"),
            ty: Ty::Vec(Box::new(Ty::Str)),
        };
        assert_eq!(alias.to_string(), "type Alias0 = Vec<String>;");
    }
}
