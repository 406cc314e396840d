use std::{fs, path::PathBuf};

use itertools::Itertools;
use log::info;
use structopt::StructOpt;

use crate::{errors::SmithResult, generate::GenOptions, program::generate_program};

#[derive(Debug, StructOpt)]
pub struct GenerateOptions {
    #[structopt(long, short, help = "Seed of the first program", default_value = "0")]
    pub seed: u64,

    #[structopt(
        long,
        short = "n",
        help = "Number of programs, seeded consecutively",
        default_value = "1"
    )]
    pub count: u64,

    #[structopt(
        long,
        short,
        help = "Directory for program_<seed>.rs and program_<seed>.args",
        default_value = ".",
        parse(from_os_str)
    )]
    pub output: PathBuf,

    #[structopt(long, help = "TOML file with generation options", parse(from_os_str))]
    pub config: Option<PathBuf>,

    #[structopt(long, help = "Statements generated in main")]
    pub statements: Option<usize>,

    #[structopt(long, help = "Recursion budget for nested constructs")]
    pub max_depth: Option<usize>,

    #[structopt(long, help = "Abort when a hole has no applicable construct")]
    pub fail_fast: bool,

    #[structopt(long = "stdout", help = "Writes programs to stdout")]
    pub to_stdout: bool,
}

impl GenerateOptions {
    /// Options from the config file, if any, with command-line flags on top.
    pub fn gen_options(&self) -> SmithResult<GenOptions> {
        let mut options = match &self.config {
            Some(path) => GenOptions::from_toml_file(path)?,
            None => GenOptions::default(),
        };

        if let Some(statements) = self.statements {
            options.statements = statements;
        }
        if let Some(max_depth) = self.max_depth {
            options.max_depth = max_depth;
        }
        if self.fail_fast {
            options.fail_fast = true;
        }
        Ok(options)
    }
}

pub(super) fn action(options: GenerateOptions) -> SmithResult {
    let gen_options = options.gen_options()?;
    if !options.to_stdout {
        fs::create_dir_all(&options.output)?;
    }

    for offset in 0..options.count {
        let seed = options.seed.wrapping_add(offset);
        let (program, args) = generate_program(seed, &gen_options)?;
        info!("generated program {} with {} arguments", seed, args.len());

        if options.to_stdout {
            println!("{}", program);
            if !args.is_empty() {
                println!("// args: {}", args.iter().join(" "));
            }
            continue;
        }

        let source = options.output.join(format!("program_{}.rs", seed));
        fs::write(&source, program.to_string())?;

        let mut contents = args.iter().join("\n");
        if !contents.is_empty() {
            contents.push('\n');
        }
        fs::write(options.output.join(format!("program_{}.args", seed)), contents)?;
        info!("wrote {}", source.display());
    }
    Ok(())
}
