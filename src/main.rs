use std::env;
use std::fs;
use std::process;

use stepvm::{Session, SessionConfig, SessionError, StepOutcome};
use tracing_subscriber::EnvFilter;

fn print_usage() {
    eprintln!("stepvm - compile a JSON AST and run it one statement at a time");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  stepvm <ast.json> [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <file>   Read session settings from a JSON file");
    eprintln!("  --steps <n>       Stop after n statements (default: run to the end,");
    eprintln!("                    bounded by maxStepsPerRun)");
    eprintln!("  --dump-ast        Print the desugared AST instead of running");
    eprintln!("  --disassemble     Print the instruction tape instead of running");
    eprintln!("  -h, --help        Show this help message");
    eprintln!("  -V, --version     Show version information");
    eprintln!();
    eprintln!("Logging is controlled with RUST_LOG (e.g. RUST_LOG=stepvm=debug).");
}

struct Options {
    input: String,
    config: Option<String>,
    steps: Option<usize>,
    dump_ast: bool,
    disassemble: bool,
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    let mut input = None;
    let mut config = None;
    let mut steps = None;
    let mut dump_ast = false;
    let mut disassemble = false;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                config = Some(iter.next().ok_or("--config needs a file")?.clone());
            }
            "--steps" => {
                let value = iter.next().ok_or("--steps needs a number")?;
                steps = Some(
                    value
                        .parse()
                        .map_err(|_| format!("invalid step count '{value}'"))?,
                );
            }
            "--dump-ast" => dump_ast = true,
            "--disassemble" => disassemble = true,
            flag if flag.starts_with('-') => return Err(format!("unknown option '{flag}'")),
            path => {
                if input.replace(path.to_string()).is_some() {
                    return Err("only one input file is accepted".to_string());
                }
            }
        }
    }

    Ok(Options {
        input: input.ok_or("missing input file")?,
        config,
        steps,
        dump_ast,
        disassemble,
    })
}

fn run(options: Options) -> Result<(), SessionError> {
    let config = match &options.config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };
    let source = fs::read_to_string(&options.input).map_err(|source| SessionError::Io {
        path: options.input.clone().into(),
        source,
    })?;

    let mut session = Session::new(config);
    let summary = session.compile(&source)?;
    eprintln!(
        "compiled {} classes: {} instructions, {} statements",
        summary.classes, summary.instructions, summary.statements
    );

    if options.dump_ast {
        if let Some(unit) = session.desugared() {
            println!("{}", unit.to_json()?);
        }
        return Ok(());
    }
    if options.disassemble {
        if let Some(tape) = session.tape() {
            print!("{}", tape.disassemble());
        }
        return Ok(());
    }

    let run_limit = session.config().max_steps_per_run;
    let mut taken = 0usize;
    while options.steps.is_none_or(|limit| taken < limit) {
        match session.step()? {
            StepOutcome::Yielded(snapshot) => {
                if options.steps.is_none() && run_limit.is_some_and(|limit| taken >= limit) {
                    return Err(SessionError::RunLimitExceeded { steps: taken });
                }
                taken += 1;
                println!("{}", serde_json::to_string(&snapshot).unwrap_or_default());
            }
            StepOutcome::Finished => break,
        }
    }

    let snapshot = session.snapshot()?;
    println!("{}", serde_json::to_string_pretty(&snapshot).unwrap_or_default());
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        print_usage();
        process::exit(0);
    }
    if args.iter().any(|arg| arg == "--version" || arg == "-V") {
        println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        process::exit(0);
    }

    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("error: {message}");
            print_usage();
            process::exit(2);
        }
    };

    if let Err(err) = run(options) {
        eprintln!("error: {err}");
        process::exit(1);
    }
}
