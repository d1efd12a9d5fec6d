use std::fs;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;

use simple_asm::asm::encoding::{BinaryFormat, ObjFileFormat, TextFormat, BFMT_MAGIC};
use simple_asm::asm::{assemble, assemble_instrs, ObjectFile};
use simple_asm::err::report;
use simple_asm::parse::{parse_ast, parse_line};
use simple_asm::sim::debug::Breakpoint;
use simple_asm::sim::{Machine, SimErr, SimFlags, StopReason, RESULT_ADDR};

/// Assembles and runs programs for the simple-asm machine.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Most verbose level of log messages written to stderr.
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Warn)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Assemble (or load an object file) and run it.
    Run {
        /// Assembly source, or an object file (`.obj` or binary object format).
        file: PathBuf,
        #[command(flatten)]
        opts: RunOpts,
    },
    /// Read instructions from stdin until `END`, then run them.
    Repl {
        #[command(flatten)]
        opts: RunOpts,
    },
    /// Assemble a source file into an object file.
    Assemble {
        /// Assembly source.
        file: PathBuf,
        /// Where to write the object file.
        #[arg(short, long)]
        output: PathBuf,
        /// Write the text object format instead of the binary one.
        #[arg(long)]
        text: bool,
    },
}

#[derive(Args)]
struct RunOpts {
    /// Stop after executing this many instructions.
    #[arg(long)]
    max_steps: Option<u64>,
    /// Start from cleared memory instead of seeding the data array.
    #[arg(long)]
    no_data: bool,
    /// Stop when the PC reaches this address (repeatable).
    #[arg(long = "break-pc")]
    break_pc: Vec<u32>,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}
impl From<LogLevel> for LevelFilter {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Off   => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn  => LevelFilter::WARN,
            LogLevel::Info  => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let stderr_format = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_filter(LevelFilter::from(cli.log_level));
    tracing_subscriber::registry().with(stderr_format).init();

    match cli.command {
        Command::Run { file, opts } => {
            let obj = load_program(&file)?;
            run(&obj, &opts)
        },
        Command::Repl { opts } => {
            let obj = read_repl(io::stdin().lock())?;
            run(&obj, &opts)
        },
        Command::Assemble { file, output, text } => {
            let obj = load_program(&file)?;
            let bytes = match text {
                true  => TextFormat::serialize(&obj).into_bytes(),
                false => BinaryFormat::serialize(&obj),
            };
            fs::write(&output, bytes)
                .with_context(|| format!("could not write {}", output.display()))?;
            tracing::info!(path = %output.display(), words = obj.len(), "wrote object file");
            Ok(())
        },
    }
}

/// Reads a program from disk, assembling it if it is not an object file.
fn load_program(path: &Path) -> anyhow::Result<ObjectFile> {
    let bytes = fs::read(path)
        .with_context(|| format!("could not read {}", path.display()))?;
    decode_program(path, bytes)
}

/// Converts the contents of a program file into an object file.
///
/// Files starting with the binary object magic or named `*.obj` are object files.
/// Anything else is assembly source.
fn decode_program(path: &Path, bytes: Vec<u8>) -> anyhow::Result<ObjectFile> {
    let binary = bytes.starts_with(BFMT_MAGIC);
    if binary || path.extension().is_some_and(|ext| ext == "obj") {
        let obj = match binary {
            true  => BinaryFormat::deserialize(&bytes),
            false => std::str::from_utf8(&bytes).ok().and_then(TextFormat::deserialize),
        };
        return obj.with_context(|| format!("{} is not a valid object file", path.display()));
    }

    let src = String::from_utf8(bytes)
        .with_context(|| format!("{} is not valid UTF-8", path.display()))?;
    let ast = parse_ast(&src).map_err(|e| anyhow!(report(&e, &src)))?;
    assemble(ast).map_err(|e| anyhow!(report(&e, &src)))
}

/// Reads instructions line by line until a line holding `END`.
///
/// Lines that fail to parse are reported and skipped.
fn read_repl(input: impl BufRead) -> anyhow::Result<ObjectFile> {
    println!("Enter instructions (e.g., LOAD R0, 100). Type 'END' to finish:");

    let mut instrs = vec![];
    for line in input.lines() {
        let line = line.context("could not read stdin")?;
        if line.trim().eq_ignore_ascii_case("END") {
            break;
        }
        match parse_line(&line) {
            Ok(Some(stmt)) => instrs.push(stmt.instr),
            Ok(None) => {},
            Err(e) => eprintln!("{}", report(&e, &line)),
        }
    }

    Ok(assemble_instrs(instrs)?)
}

/// Runs a program on a fresh machine and prints its final state.
fn run(obj: &ObjectFile, opts: &RunOpts) -> anyhow::Result<()> {
    let mut machine = Machine::new(SimFlags { seed_data: !opts.no_data });
    machine.breakpoints.extend(opts.break_pc.iter().map(|&pc| Breakpoint::PC(pc)));
    machine.load_obj_file(obj);

    let outcome = match opts.max_steps {
        Some(n) => machine.run_with_limit(n),
        None => machine.run(),
    };

    print_report(&machine, opts, outcome);
    outcome.context("execution failed")?;
    Ok(())
}

fn print_report(machine: &Machine, opts: &RunOpts, outcome: Result<StopReason, SimErr>) {
    println!();
    match outcome {
        Ok(StopReason::Tripwire) if opts.max_steps.is_some() => println!("Execution stopped: step limit reached."),
        Ok(StopReason::Breakpoint) => println!("Execution stopped: hit breakpoint at PC={}.", machine.pc),
        Ok(reason) => println!("Execution finished: {reason}."),
        Err(e) => println!("Execution failed: {e}."),
    }
    println!("State: {}", machine.state());
    if machine.flags.seed_data {
        println!("Array: {:?}", machine.preload().values());
    }
    println!("Final Registers: {}", machine.reg_file);
    println!("Memory[{RESULT_ADDR}]: {}", machine.result());
    println!(
        "Instructions: {} executed, {} skipped, {} unknown",
        machine.instructions_run(),
        machine.skipped_operations(),
        machine.unmapped_opcodes(),
    );
}
