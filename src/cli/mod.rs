use colored::{Color, ColoredString, Colorize};
use log::Level;
use std::io;
use structopt::StructOpt;

mod generate;

pub use generate::GenerateOptions;

#[derive(Debug, StructOpt)]
#[structopt(name = "smith", about = "Generates random well-typed Rust programs")]
pub struct Cli {
    #[structopt(
        long, env = "LOG_LEVEL",
        help = "Sets the log level",
        default_value = "info",
        possible_values = &["off", "error", "warn", "info", "debug", "trace"],
        global = true
    )]
    log_level: log::LevelFilter,

    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(Debug, StructOpt)]
pub enum Command {
    Generate(GenerateOptions),
}

pub fn run() {
    // get the subcommand
    let cli: Cli = Cli::from_args();

    // set up logging
    let logger = fern::Dispatch::new()
        .format(move |out, message, record| {
            let level = record.level();
            let color = match level {
                Level::Error => Color::Red,
                Level::Warn => Color::Yellow,
                Level::Info => Color::Blue,
                Level::Debug => Color::Magenta,
                Level::Trace => Color::Green,
            };
            out.finish(format_args!(
                "{} {}",
                ColoredString::from((level.to_string().to_lowercase() + ":").as_str())
                    .color(color)
                    .to_string(),
                message
            ))
        })
        .level(cli.log_level)
        .chain(io::stderr())
        .apply();
    if let Err(err) = logger {
        eprintln!("{} {}", "logging error:".red(), err);
    }

    let result = match cli.cmd {
        Command::Generate(options) => generate::action(options),
    };

    if let Err(err) = result {
        err.emit();
        std::process::exit(1);
    }
}
