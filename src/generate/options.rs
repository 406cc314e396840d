use std::{collections::BTreeMap, fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    ast::{Family, NodeKind},
    errors::{SmithError, SmithResult},
    typing::ty::MAX_TUPLE_ARITY,
};

/// Knobs for a generation run. Every field has a default, so a config file
/// only needs to name what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenOptions {
    /// Recursion budget shared by every recursive construct on a path.
    pub max_depth: usize,
    /// Number of statements generated directly in `main`.
    pub statements: usize,
    pub max_block_statements: usize,
    pub max_functions: usize,
    pub max_params: usize,
    pub max_structs: usize,
    pub max_struct_fields: usize,
    pub max_aliases: usize,
    pub max_constants: usize,
    pub max_type_depth: usize,
    pub max_array_len: usize,
    pub max_tuple_len: usize,
    pub max_vec_len: usize,
    pub max_string_len: usize,
    pub max_loop_iterations: u32,
    /// Abort instead of falling back to a default value when a hole has no
    /// applicable construct.
    pub fail_fast: bool,
    /// Nesting limit per family. Families not listed use `max_depth`.
    pub family_limits: BTreeMap<Family, usize>,
    /// Selection weight per construct. A weight of zero disables the
    /// construct; kinds not listed use their built-in weight.
    pub weights: BTreeMap<NodeKind, u32>,
}

impl Default for GenOptions {
    fn default() -> Self {
        let mut family_limits = BTreeMap::new();
        family_limits.insert(Family::Access, 2);
        family_limits.insert(Family::Arithmetic, 4);
        family_limits.insert(Family::Comparison, 2);
        family_limits.insert(Family::Logical, 3);
        family_limits.insert(Family::Call, 3);
        family_limits.insert(Family::Composite, 3);
        family_limits.insert(Family::Control, 2);

        GenOptions {
            max_depth: 20,
            statements: 12,
            max_block_statements: 4,
            max_functions: 6,
            max_params: 4,
            max_structs: 4,
            max_struct_fields: 4,
            max_aliases: 3,
            max_constants: 4,
            max_type_depth: 2,
            max_array_len: 8,
            max_tuple_len: 4,
            max_vec_len: 3,
            max_string_len: 8,
            max_loop_iterations: 4,
            fail_fast: false,
            family_limits,
            weights: BTreeMap::new(),
        }
    }
}

impl GenOptions {
    pub fn from_toml_str(s: &str) -> SmithResult<GenOptions> {
        let options: GenOptions = toml::from_str(s)?;
        options.validate()?;
        Ok(options)
    }

    /// Rejects settings that would make programs the toolchain cannot build.
    pub fn validate(&self) -> SmithResult {
        if self.max_tuple_len > MAX_TUPLE_ARITY {
            return Err(SmithError::config(format!(
                "max_tuple_len is {}, but tuples longer than {} cannot be printed",
                self.max_tuple_len, MAX_TUPLE_ARITY
            )));
        }
        Ok(())
    }

    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> SmithResult<GenOptions> {
        let contents = fs::read_to_string(path)?;
        GenOptions::from_toml_str(&contents)
    }

    pub fn weight(&self, kind: NodeKind) -> u32 {
        self.weights
            .get(&kind)
            .copied()
            .unwrap_or_else(|| default_weight(kind))
    }

    pub fn family_limit(&self, family: Family) -> usize {
        self.family_limits
            .get(&family)
            .copied()
            .unwrap_or(self.max_depth)
    }
}

fn default_weight(kind: NodeKind) -> u32 {
    match kind {
        NodeKind::IntLiteral
        | NodeKind::FloatLiteral
        | NodeKind::BoolLiteral
        | NodeKind::StrLiteral
        | NodeKind::UnitLiteral
        | NodeKind::NoneLiteral => 4,
        NodeKind::Variable => 6,
        NodeKind::ConstRef | NodeKind::FuncRef | NodeKind::CliArg | NodeKind::Not => 1,
        NodeKind::FieldAccess | NodeKind::ArrayIndex => 3,
        NodeKind::Add
        | NodeKind::Sub
        | NodeKind::Mul
        | NodeKind::Div
        | NodeKind::Rem => 3,
        NodeKind::Eq | NodeKind::Ne | NodeKind::Lt | NodeKind::Gt => 2,
        NodeKind::And | NodeKind::Or => 2,
        NodeKind::FunctionCall | NodeKind::MethodCall => 2,
        NodeKind::TupleLiteral
        | NodeKind::ArrayLiteral
        | NodeKind::VecLiteral
        | NodeKind::StructLiteral
        | NodeKind::BoxNew
        | NodeKind::SomeValue => 3,
        NodeKind::Declaration => 8,
        NodeKind::Assignment => 3,
        NodeKind::CallStatement => 2,
        NodeKind::IfElse | NodeKind::ForLoop => 2,
    }
}
