use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use colored::Colorize;
use intcode_vm::{
    find_best_phases, load_program, run_diagnostics, AmplifierChain, AmplifierError,
    DiagnosticError, LoopMode, Pause, ProgramError, VMError, VM,
};
use log::debug;
use serde::Serialize;
use std::process;
use thiserror::Error;

#[derive(Debug, Error)]
enum AppError {
    #[error("VM error: {0}")]
    VM(#[from] VMError),

    #[error("Program error: {0}")]
    Program(#[from] ProgramError),

    #[error("Amplifier error: {0}")]
    Amplifier(#[from] AmplifierError),

    #[error("Diagnostic error: {0}")]
    Diagnostic(#[from] DiagnosticError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl From<&str> for AppError {
    fn from(s: &str) -> Self {
        AppError::Other(s.to_string())
    }
}

/// Result of `intcode run --json`
#[derive(Debug, Serialize)]
struct RunReport {
    outputs: Vec<i64>,
    instruction_pointer: usize,
    relative_base: i64,
    memory_words: usize,
}

fn program_arg() -> Arg {
    Arg::new("program")
        .value_name("FILE")
        .help("Program file (comma-separated integers, or a JSON array with .json)")
        .required(true)
}

fn cli() -> Command {
    Command::new("intcode")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Intcode virtual machine")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Log pauses (-v) or every instruction (-vv)")
                .action(ArgAction::Count)
                .global(true),
        )
        .subcommand(
            Command::new("run")
                .about("Run a program to completion and print its outputs")
                .arg(program_arg())
                .arg(
                    Arg::new("input")
                        .short('i')
                        .long("input")
                        .value_name("N")
                        .help("Queue an input value (can be used multiple times)")
                        .value_parser(value_parser!(i64))
                        .allow_negative_numbers(true)
                        .action(ArgAction::Append),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print a JSON report instead of one output per line")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("amplify")
                .about("Drive a chain of amplifiers running the program")
                .arg(program_arg())
                .arg(
                    Arg::new("phases")
                        .short('p')
                        .long("phases")
                        .value_name("A,B,..")
                        .help("Phase settings to run; searches all orderings when omitted")
                        .value_parser(value_parser!(i64))
                        .value_delimiter(',')
                        .allow_negative_numbers(true)
                        .num_args(1),
                )
                .arg(
                    Arg::new("feedback")
                        .short('f')
                        .long("feedback")
                        .help("Feed the last amplifier back into the first")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("signal")
                        .short('s')
                        .long("signal")
                        .value_name("N")
                        .help("Initial input signal")
                        .value_parser(value_parser!(i64))
                        .allow_negative_numbers(true)
                        .default_value("0"),
                ),
        )
        .subcommand(
            Command::new("diagnose")
                .about("Run a diagnostic program and check its self-tests")
                .arg(program_arg())
                .arg(
                    Arg::new("system-id")
                        .long("system-id")
                        .value_name("N")
                        .help("System ID fed to the diagnostic program")
                        .value_parser(value_parser!(i64))
                        .allow_negative_numbers(true)
                        .required(true),
                ),
        )
}

fn main() {
    let matches = cli().get_matches();
    let Some((command, sub)) = matches.subcommand() else {
        eprintln!("{} no command given", "Error:".red().bold());
        process::exit(2);
    };

    let level = match sub.get_count("verbose") {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let result = match command {
        "run" => run_program(sub),
        "amplify" => run_amplifiers(sub),
        "diagnose" => run_diagnostic(sub),
        _ => Err("Unknown command".into()),
    };

    if let Err(err) = result {
        eprintln!("{} {}", "Error:".red().bold(), err);
        process::exit(1);
    }
}

fn program_path(matches: &ArgMatches) -> Result<&String, AppError> {
    matches
        .get_one::<String>("program")
        .ok_or_else(|| "Missing program file".into())
}

fn run_program(matches: &ArgMatches) -> Result<(), AppError> {
    let memory = load_program(program_path(matches)?)?;
    let inputs: Vec<i64> = matches
        .get_many::<i64>("input")
        .map(|values| values.copied().collect())
        .unwrap_or_default();
    let json = matches.get_flag("json");

    debug!("Running with inputs {:?}", inputs);
    let mut vm = VM::with_inputs(memory, inputs);
    let mut outputs = Vec::new();

    loop {
        match vm.run()? {
            Pause::ProducedOutput(value) => {
                if !json {
                    println!("{}", value);
                }
                outputs.push(value);
            }
            Pause::Halted => break,
            Pause::AwaitingInput => {
                return Err(AppError::Other(format!(
                    "program is waiting for input at address {}",
                    vm.instruction_pointer()
                )));
            }
        }
    }

    if json {
        let report = RunReport {
            outputs,
            instruction_pointer: vm.instruction_pointer(),
            relative_base: vm.relative_base(),
            memory_words: vm.memory().len(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}

fn run_amplifiers(matches: &ArgMatches) -> Result<(), AppError> {
    let memory = load_program(program_path(matches)?)?;
    let mode = if matches.get_flag("feedback") {
        LoopMode::Feedback
    } else {
        LoopMode::Series
    };
    let signal = matches.get_one::<i64>("signal").copied().unwrap_or(0);

    match matches.get_many::<i64>("phases") {
        Some(values) => {
            let phases: Vec<i64> = values.copied().collect();
            let output = AmplifierChain::new(&memory, &phases)?.run(mode, signal)?;
            println!("{}", output);
        }
        None => {
            let (phases, output) =
                find_best_phases(&memory, &mode.default_phases(), mode, signal)?;
            let sequence: Vec<String> = phases.iter().map(i64::to_string).collect();
            println!("{} {}", "Best phase sequence:".green(), sequence.join(","));
            println!("{} {}", "Signal:".green(), output);
        }
    }
    Ok(())
}

fn run_diagnostic(matches: &ArgMatches) -> Result<(), AppError> {
    let memory = load_program(program_path(matches)?)?;
    let system_id = *matches
        .get_one::<i64>("system-id")
        .ok_or("Missing system ID")?;

    let report = run_diagnostics(memory, system_id)?;
    println!(
        "{} {} self-tests passed",
        "✅".green(),
        report.passed_tests
    );
    println!("Diagnostic code: {}", report.code);
    Ok(())
}
