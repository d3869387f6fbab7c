use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use treelox::ast::Stmt;
use treelox::ast_printer::AstPrinter;
use treelox::driver;
use treelox::error::LoxError;
use treelox::interpreter::Interpreter;
use treelox::scanner::Scanner;
use treelox::token::Token;

/// Exit status for scan and parse errors.
const EXIT_STATIC: i32 = 65;

/// Exit status for runtime errors.
const EXIT_RUNTIME: i32 = 70;

#[derive(ClapParser, Debug)]
#[command(version, about = "Tree-walking interpreter for a small class-based scripting language", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable debug logging to a file
    #[arg(long, global = true)]
    log: bool,

    /// Log file used with --log
    #[arg(long, global = true, default_value = "app.log")]
    log_file: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: Option<PathBuf>,

        /// Print the tokens as JSON
        #[arg(long)]
        json: bool,
    },

    /// Parses a program from a file and prints its syntax tree
    Parse {
        filename: Option<PathBuf>,

        /// Print the syntax tree as JSON
        #[arg(long)]
        json: bool,
    },

    /// Runs a program from a file
    Run { filename: Option<PathBuf> },
}

/// Reads the contents of a file into a String
fn read_file(filename: PathBuf) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(&filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    let bytes = reader
        .read_to_end(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    String::from_utf8(buf).context(format!("File {:?} is not valid UTF-8", filename))
}

fn init_logger(path: &Path) -> Result<()> {
    let log_file = File::create(path).context(format!("Failed to create {:?}", path))?;

    Builder::new()
        .format(|buf, record| {
            // Strip 'treelox::' from module path
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("treelox::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "{} [{}:{}] - {}",
                Local::now().format("%H:%M:%S%.3f"),
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug)
        .parse_default_env() // RUST_LOG still narrows or widens
        .init();

    info!("Logger initialized, writing to {:?}", path);
    Ok(())
}

/// Exit status for a failed phase.
fn exit_code(error: &LoxError) -> i32 {
    match error {
        LoxError::Runtime(_) => EXIT_RUNTIME,
        _ => EXIT_STATIC,
    }
}

fn report_and_exit(error: LoxError) -> ! {
    let code: i32 = exit_code(&error);

    debug!("Pipeline failed, exiting with code {}: {}", code, error);
    eprintln!("{}", error);
    process::exit(code);
}

fn no_input() {
    info!("No filepath provided");
    println!("No input filepath was provided. Exiting...");
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger(&args.log_file)?;
    } else {
        // Quiet by default; RUST_LOG can still turn logging on (stderr).
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .parse_default_env()
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands {
        Commands::Tokenize { filename, json } => {
            let Some(filename) = filename else {
                no_input();
                return Ok(());
            };

            info!("Running Tokenize subcommand");
            let source = read_file(filename)?;
            let mut tokenized = true;
            let mut tokens: Vec<Token> = Vec::new();

            for result in Scanner::new(&source) {
                match result {
                    Ok(token) if json => tokens.push(token),
                    Ok(token) => println!("{}", token),
                    Err(e) => {
                        tokenized = false;
                        eprintln!("{}", e);
                    }
                }
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&tokens)?);
            }

            if !tokenized {
                debug!("Tokenization failed, exiting with code {}", EXIT_STATIC);
                process::exit(EXIT_STATIC);
            }

            info!("Tokenization completed successfully");
        }

        Commands::Parse { filename, json } => {
            let Some(filename) = filename else {
                no_input();
                return Ok(());
            };

            info!("Running Parse subcommand");
            let source = read_file(filename)?;
            let statements: Vec<Stmt> =
                driver::parse(&source).unwrap_or_else(|e| report_and_exit(e));

            if json {
                println!("{}", serde_json::to_string_pretty(&statements)?);
            } else {
                println!("{}", AstPrinter::print_program(&statements));
            }

            info!("Parse subcommand completed");
        }

        Commands::Run { filename } => {
            let Some(filename) = filename else {
                no_input();
                return Ok(());
            };

            info!("Running Run subcommand");
            let source = read_file(filename)?;
            let mut interpreter = Interpreter::new();

            if let Err(e) = driver::run(&source, &mut interpreter) {
                report_and_exit(e);
            }

            info!("Program executed successfully");
        }
    }

    Ok(())
}
