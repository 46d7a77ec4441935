use std::{fs, path::PathBuf, process::ExitCode};

use action_dispatch::resolver::ParameterNaming;
use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::commands::{describe, ConfigFile, Input, Outcome};

mod commands;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct CliArgs {
    /// Log at debug level, unless RUST_LOG says otherwise
    #[clap(short, long, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate the dispatch wrapper and the handler interface
    Generate {
        #[clap(short, long)]
        input: PathBuf,

        #[clap(short, long)]
        config: Option<PathBuf>,

        #[clap(short, long, arg_enum)]
        naming: Option<Naming>,

        #[clap(short, long)]
        output: Option<PathBuf>,
    },
    /// Check the annotated declaration only
    Validate {
        #[clap(short, long)]
        input: PathBuf,

        #[clap(short, long)]
        config: Option<PathBuf>,
    },
    /// List the types nested in the action enum
    NestedTypes {
        #[clap(short, long)]
        input: PathBuf,

        #[clap(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum, Debug)]
enum Naming {
    TypeDerived,
    Positional,
}

impl From<Naming> for ParameterNaming {
    fn from(value: Naming) -> Self {
        match value {
            Naming::TypeDerived => ParameterNaming::TypeDerived,
            Naming::Positional => ParameterNaming::Positional,
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .with(filter)
        .init();
}

fn main() -> anyhow::Result<ExitCode> {
    let cli_args = CliArgs::parse();
    init_tracing(cli_args.verbose);

    let (outcome, output) = match cli_args.command {
        Command::Generate {
            input,
            config,
            naming,
            output,
        } => {
            let config = ConfigFile::load(config.as_deref())?
                .into_generator_config(naming.map(ParameterNaming::from));
            (commands::generate(Input::load(&input)?, &config), output)
        }
        Command::Validate { input, config } => {
            let config = ConfigFile::load(config.as_deref())?.into_generator_config(None);
            (commands::validate(Input::load(&input)?, &config), None)
        }
        Command::NestedTypes { input, config } => {
            let config = ConfigFile::load(config.as_deref())?.into_generator_config(None);
            (commands::nested_types(Input::load(&input)?, &config), None)
        }
    };

    match outcome {
        Outcome::Success(text) => {
            match output {
                Some(path) => fs::write(&path, text)
                    .with_context(|| format!("cannot write {}", path.display()))?,
                None => print!("{}", text),
            }
            Ok(ExitCode::SUCCESS)
        }
        Outcome::Diagnostics(diagnostics) => {
            for diagnostic in &diagnostics {
                eprintln!("{}", describe(diagnostic));
            }
            Ok(ExitCode::FAILURE)
        }
    }
}
