//! fsmconvert CLI - convert LLFSM machine directories
//!
//! Takes one or more machine directories and re-serializes them, singly
//! or as an arrangement, under a requested output language.

use std::path::PathBuf;
use std::process::ExitCode;

use fsmconvert::binding::Format;
use fsmconvert::convert::{convert, ConversionOptions, MACHINE_SUFFIX};
use fsmconvert::VERSION;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let parsed = match parse_args(&args) {
        Ok(Some(parsed)) => parsed,
        Ok(None) => return ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("Error: {message}");
            print_usage();
            return ExitCode::from(1);
        }
    };

    init_tracing(parsed.verbose);

    match convert(&parsed.inputs, &parsed.options) {
        Ok(summary) => {
            if parsed.verbose {
                println!(
                    "Converted {} machine(s): {} state(s), {} transition(s).",
                    summary.machines, summary.states, summary.transitions
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

struct ParsedArgs {
    inputs: Vec<PathBuf>,
    options: ConversionOptions,
    verbose: bool,
}

/// Parse the argument list. `Ok(None)` means help/version was printed.
fn parse_args(args: &[String]) -> Result<Option<ParsedArgs>, String> {
    let mut inputs: Vec<PathBuf> = Vec::new();
    let mut format: Option<Format> = None;
    let mut arrangement = false;
    let mut suspensible = true;
    let mut introspectable = false;
    let mut verbose = false;
    let mut output: Option<PathBuf> = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--format" | "-f" => {
                let value = iter.next().ok_or("--format requires a value")?;
                format = Some(value.parse::<Format>().map_err(|e| e.to_string())?);
            }
            "--output" | "-o" => {
                let value = iter.next().ok_or("--output requires a value")?;
                output = Some(PathBuf::from(value));
            }
            "--arrangement" | "-a" => arrangement = true,
            "--introspectable" | "-i" => introspectable = true,
            "--non-suspensible" | "-n" => suspensible = false,
            "--verbose" | "-v" => verbose = true,
            "--version" => {
                println!("fsmconvert {VERSION}");
                return Ok(None);
            }
            "--help" | "-h" => {
                print_usage();
                return Ok(None);
            }
            other if other.starts_with('-') => {
                return Err(format!("Unknown option: {other}"));
            }
            path => inputs.push(PathBuf::from(path)),
        }
    }

    if inputs.is_empty() {
        return Err("No input machines given".to_string());
    }

    let output = output.unwrap_or_else(|| default_output(&inputs, arrangement));
    Ok(Some(ParsedArgs {
        inputs,
        options: ConversionOptions {
            format,
            arrangement,
            suspensible,
            introspectable,
            output,
        },
        verbose,
    }))
}

/// Without --output, write next to the first input: `<stem>.out.machine`
/// for a single machine, `<stem>.arrangement` when arranging.
fn default_output(inputs: &[PathBuf], arrangement: bool) -> PathBuf {
    let first = &inputs[0];
    let stem = first
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Machine".to_string());
    let name = if arrangement || inputs.len() > 1 {
        format!("{stem}.arrangement")
    } else {
        format!("{stem}.out{MACHINE_SUFFIX}")
    };
    first.parent().map(|p| p.join(&name)).unwrap_or_else(|| PathBuf::from(name))
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_usage() {
    println!(
        r#"
fsmconvert - convert LLFSM machine directories

USAGE:
    fsmconvert [OPTIONS] <machine>...

ARGS:
    <machine>...    Input machine directories (the .machine suffix may be omitted)

OPTIONS:
    -f, --format <c|objc++|vhdl>   Output language (default: the first input's language)
    -o, --output <dir>             Output directory (default: next to the first input)
    -a, --arrangement              Produce an arrangement even for one input
    -i, --introspectable           Emit state-name introspection data
    -n, --non-suspensible          Omit suspend/resume plumbing
    -v, --verbose                  Report totals and enable debug logging
        --version                  Print version
    -h, --help                     Print this help

EXAMPLES:
    fsmconvert Traffic.machine
    fsmconvert --format vhdl --output out.machine Traffic
    fsmconvert --arrangement --output City.arrangement Traffic.machine Signals.machine
"#
    );
}
