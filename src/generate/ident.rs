/// Hands out program-wide unique identifiers. Counters never rewind, so a
/// name handed to an abandoned attempt is simply never reused.
#[derive(Debug, Default)]
pub struct IdentGenerator {
    vars: usize,
    functions: usize,
    structs: usize,
    aliases: usize,
    constants: usize,
    cli_args: usize,
}

fn next(counter: &mut usize, prefix: &str) -> String {
    let name = format!("{}{}", prefix, counter);
    *counter += 1;
    name
}

impl IdentGenerator {
    pub fn new() -> IdentGenerator {
        IdentGenerator::default()
    }

    pub fn var(&mut self) -> String {
        next(&mut self.vars, "var")
    }

    pub fn function(&mut self) -> String {
        next(&mut self.functions, "fun")
    }

    pub fn structure(&mut self) -> String {
        next(&mut self.structs, "Struct")
    }

    pub fn alias(&mut self) -> String {
        next(&mut self.aliases, "Alias")
    }

    pub fn constant(&mut self) -> String {
        next(&mut self.constants, "CONST")
    }

    pub fn cli_arg(&mut self) -> String {
        next(&mut self.cli_args, "cli_arg")
    }
}

pub fn field(idx: usize) -> String {
    format!("field{}", idx)
}

pub fn param(idx: usize) -> String {
    format!("param{}", idx)
}
