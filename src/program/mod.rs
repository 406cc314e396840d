use std::fmt;

use fnv::FnvHashMap;
use log::{debug, warn};
use petgraph::{algo::toposort, graph::DiGraph};

use crate::{
    ast::{render_fields, AliasDef, ConstDecl, FunctionDef},
    errors::SmithResult,
    generate::{generate_args, GenOptions, Generator},
    recondition::Recondition,
    sema::{FunctionTable, GlobalTable},
    typing::{structs::StructDef, ty::lifetime_list},
    utils::{indent, join},
};

/// A struct together with the `&self` methods synthesized for it.
#[derive(Debug, Clone, PartialEq)]
pub struct StructDefinition {
    pub def: StructDef,
    pub methods: Vec<FunctionDef>,
}

impl fmt::Display for StructDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let def = &self.def;
        let generics = if def.lifetimes.is_empty() {
            str!("")
        } else {
            format!("<{}>", lifetime_list(&def.lifetimes))
        };
        let explicit_default = def.needs_explicit_default();

        if explicit_default {
            writeln!(f, "#[derive(Debug, Clone)]")?;
        } else {
            writeln!(f, "#[derive(Debug, Clone, Default)]")?;
        }
        write!(
            f,
            "struct {}{} {{\n{}\n}}",
            def.name,
            generics,
            indent(render_fields(&def.fields), 1)
        )?;

        if explicit_default {
            write!(
                f,
                "\n\nimpl{} Default for {}{} {{\n    fn default() -> Self {{\n{}\n    }}\n}}",
                generics,
                def.name,
                generics,
                indent(def.default.to_string(), 2)
            )?;
        }

        if !self.methods.is_empty() {
            write!(
                f,
                "\n\nimpl{} {}{} {{\n{}\n}}",
                generics,
                def.name,
                generics,
                indent(join(&self.methods, "\n\n"), 1)
            )?;
        }
        Ok(())
    }
}

/// A complete generated program. `functions[0]` is `main`.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub seed: u64,
    pub constants: Vec<ConstDecl>,
    pub aliases: Vec<AliasDef>,
    pub structs: Vec<StructDefinition>,
    pub functions: Vec<FunctionDef>,
}

impl Program {
    pub fn main(&self) -> Option<&FunctionDef> {
        self.functions.first()
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sections = vec![str!("#![allow(warnings)]")];
        if !self.constants.is_empty() {
            sections.push(join(&self.constants, "\n"));
        }
        if !self.aliases.is_empty() {
            sections.push(join(&self.aliases, "\n"));
        }
        sections.extend(self.structs.iter().map(|s| s.to_string()));
        sections.extend(self.functions.iter().map(|func| func.to_string()));
        writeln!(f, "{}", sections.join("\n\n"))
    }
}

/// Struct emission order: every struct after the structs it reaches through
/// its fields. Self references are not dependencies. Registration order is kept if the
/// graph somehow has a cycle.
fn struct_order(globals: &GlobalTable) -> Vec<&StructDef> {
    let structs = globals.structs();
    let mut graph = DiGraph::<usize, ()>::new();
    let nodes = structs
        .iter()
        .enumerate()
        .map(|(idx, def)| (def.name.as_str(), graph.add_node(idx)))
        .collect::<FnvHashMap<_, _>>();

    for def in structs.iter() {
        let to = nodes[def.name.as_str()];
        for name in globals.reachable_structs(&def.ty()) {
            if name == def.name {
                continue;
            }
            if let Some(&from) = nodes.get(name.as_str()) {
                graph.update_edge(from, to, ());
            }
        }
    }

    match toposort(&graph, None) {
        Ok(order) => order.into_iter().map(|node| &structs[graph[node]]).collect(),
        Err(cycle) => {
            warn!(
                "struct dependency cycle through {}",
                structs[graph[cycle.node_id()]].name
            );
            structs.iter().collect()
        }
    }
}

fn assemble(seed: u64, main: FunctionDef, globals: &GlobalTable, functions: &FunctionTable) -> Program {
    let structs = struct_order(globals)
        .into_iter()
        .map(|def| StructDefinition {
            def: def.clone(),
            methods: functions.methods_of(&def.name).cloned().collect(),
        })
        .collect();

    let mut funcs = vec![main];
    funcs.extend(functions.free_functions().cloned());

    Program {
        seed,
        constants: globals.constants().to_vec(),
        aliases: globals.aliases().to_vec(),
        structs,
        functions: funcs,
    }
}

/// Generates the program for `seed` along with the command-line argument
/// values it expects, one per requested argument.
pub fn generate_program(seed: u64, options: &GenOptions) -> SmithResult<(Program, Vec<String>)> {
    let mut gen = Generator::new(seed, options.clone());
    gen.generate_constants().map_err(|err| err.with_seed(seed))?;
    let main = gen.generate_main().map_err(|err| err.with_seed(seed))?;

    let (globals, functions, mut rng) = gen.finish();
    debug!(
        "seed {}: {} structs, {} functions, {} arguments",
        seed,
        globals.structs().len(),
        functions.len(),
        globals.cli_args().len()
    );

    let program = assemble(seed, main, &globals, &functions).recondition();
    let args = generate_args(&mut rng, globals.cli_args());
    Ok((program, args))
}

#[cfg(test)]
mod program_tests {
    use super::{generate_program, struct_order, StructDefinition};
    use crate::{
        generate::GenOptions,
        sema::GlobalTable,
        typing::{structs::StructDef, ty::Ty},
    };

    fn st(name: &str) -> Ty {
        Ty::Struct(str!(name))
    }

    #[test]
    fn test_empty_program() {
        let mut options = GenOptions::default();
        options.statements = 0;
        options.max_constants = 0;
        let (program, args) = generate_program(42, &options).unwrap();
        assert!(args.is_empty());
        assert_eq!(
            program.to_string(),
            "#![allow(warnings)]\n\nfn main() {\n    println!(\"Program Seed: {:?}\", 42u64);\n}\n"
        );
    }

    #[test]
    fn test_same_seed_same_program() {
        let options = GenOptions::default();
        let (a, a_args) = generate_program(1234, &options).unwrap();
        let (b, b_args) = generate_program(1234, &options).unwrap();
        assert_eq!(a.to_string(), b.to_string());
        assert_eq!(a_args, b_args);
    }

    #[test]
    fn test_args_match_prologue() {
        let options = GenOptions::default();
        for seed in 0..16 {
            let (program, args) = generate_program(seed, &options).unwrap();
            let requested = program.to_string().matches("cli_args.get(").count();
            assert_eq!(requested, args.len(), "seed {}", seed);
        }
    }

    #[test]
    fn test_structs_follow_their_dependencies() {
        let mut globals = GlobalTable::new();
        globals.add_struct(
            StructDef::new(
                str!("Struct0"),
                vec![(str!("field0"), Ty::Vec(Box::new(st("Struct0"))))],
            )
            .unwrap(),
        );
        globals.add_struct(
            StructDef::new(str!("Struct1"), vec![(str!("field0"), st("Struct0"))]).unwrap(),
        );
        globals.add_struct(
            StructDef::new(
                str!("Struct2"),
                vec![
                    (str!("field0"), st("Struct1")),
                    (str!("field1"), Ty::Option(Box::new(st("Struct0")))),
                ],
            )
            .unwrap(),
        );

        let order = struct_order(&globals)
            .into_iter()
            .map(|def| def.name.clone())
            .collect::<Vec<_>>();
        let pos = |name: &str| order.iter().position(|n| n == name).unwrap();
        assert_eq!(order.len(), 3);
        assert!(pos("Struct0") < pos("Struct1"));
        assert!(pos("Struct1") < pos("Struct2"));
    }

    #[test]
    fn test_struct_rendering() {
        let plain = StructDefinition {
            def: StructDef::new(str!("Struct0"), vec![(str!("field0"), Ty::Bool)]).unwrap(),
            methods: vec![],
        };
        assert_eq!(
            plain.to_string(),
            "#[derive(Debug, Clone, Default)]\nstruct Struct0 {\n    field0: bool,\n}"
        );

        let nested = StructDefinition {
            def: StructDef::new(str!("Struct1"), vec![(str!("field0"), st("Struct0"))]).unwrap(),
            methods: vec![],
        };
        assert_eq!(
            nested.to_string(),
            "#[derive(Debug, Clone)]\nstruct Struct1 {\n    field0: Struct0,\n}\n\n\
             impl Default for Struct1 {\n    fn default() -> Self {\n        \
             Struct1 { field0: Struct0::default() }\n    }\n}"
        );
    }
}
