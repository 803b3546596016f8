#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

mod commands;
mod logging;

use clap::{Parser, ValueEnum};
use miette::Result;
use propmangle_core::AlphabetKind;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "propmangle")]
#[command(author, version, about = "Deterministic property and global name mangling for JavaScript", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit JSON formatted output (stable, machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Override the working directory
    #[arg(long, global = true, value_name = "PATH")]
    cwd: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print version information
    Version,

    /// Rename properties and unresolved globals in JavaScript files
    Mangle {
        /// Files or directories to mangle (directories are searched for .js, .cjs and .mjs files)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Write mangled files here, keeping their relative layout (default: stdout)
        #[arg(long, short = 'o', value_name = "DIR")]
        out_dir: Option<PathBuf>,

        /// Config file (default: propmangle.json in the working directory, if present)
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Never rename this name (repeatable)
        #[arg(long, value_name = "NAME")]
        reserved: Vec<String>,

        /// Treat this name as the global object (repeatable, replaces the defaults)
        #[arg(long, value_name = "NAME")]
        global_alias: Vec<String>,

        /// Emit readable `_$name$suffix_` substitutes
        #[arg(long)]
        debug: bool,

        /// Suffix used in debug substitutes
        #[arg(long, value_name = "SUFFIX")]
        debug_suffix: Option<String>,

        /// Prefix prepended to every generated name
        #[arg(long, value_name = "PREFIX")]
        prefix: Option<String>,

        /// Alphabet used for generated names
        #[arg(long, value_enum)]
        alphabet: Option<AlphabetArg>,

        /// Shuffle the alphabet once before generating names
        #[arg(long)]
        randomise_alphabet: bool,

        /// Seed for --randomise-alphabet (random when omitted)
        #[arg(long, value_name = "N")]
        alphabet_seed: Option<u64>,

        /// Write the name table to this file as JSON
        #[arg(long, value_name = "FILE")]
        name_map: Option<PathBuf>,

        /// Continue from a name table written by --name-map
        #[arg(long, value_name = "FILE")]
        load_name_map: Option<PathBuf>,

        /// Minify output
        #[arg(long)]
        minify: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AlphabetArg {
    /// Uppercase first character; never collides with lowercase local names
    Disjoint,
    /// One alphabet of letters, digits, `_` and `$`
    Shared,
}

impl From<AlphabetArg> for AlphabetKind {
    fn from(arg: AlphabetArg) -> Self {
        match arg {
            AlphabetArg::Disjoint => AlphabetKind::Disjoint,
            AlphabetArg::Shared => AlphabetKind::Shared,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Determine working directory
    let cwd = cli
        .cwd
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));

    logging::init(cli.verbose, cli.json);

    match cli.command {
        Some(Commands::Version) | None => commands::version::run(cli.json),
        Some(Commands::Mangle {
            inputs,
            out_dir,
            config,
            reserved,
            global_alias,
            debug,
            debug_suffix,
            prefix,
            alphabet,
            randomise_alphabet,
            alphabet_seed,
            name_map,
            load_name_map,
            minify,
        }) => commands::mangle::run(
            commands::mangle::MangleAction {
                cwd,
                inputs,
                out_dir,
                config,
                reserved,
                global_aliases: global_alias,
                debug,
                debug_suffix,
                prefix,
                alphabet: alphabet.map(AlphabetKind::from),
                randomise_alphabet,
                alphabet_seed,
                name_map,
                load_name_map,
                minify,
            },
            cli.json,
        ),
    }
}
