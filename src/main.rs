//! `member-ledger`: local host runner for the member chaincode.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Load config
//!   3. Init logger at configured level
//!   4. Open world state
//!   5. Run the requested command and print the response
//!
//! # Usage
//!
//! ```text
//! member-ledger [--config <path>] <command>
//!
//! Commands:
//!   init                        run the instantiate hook
//!   invoke <function> [args..]  invoke one function
//!   -c '<json>'                 invoke from {"Args":[...]} JSON
//!   batch                       one JSON invocation per stdin line
//! ```

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use tracing::{debug, info};

use member_ledger::config::{self, DEFAULT_CONFIG_PATH};
use member_ledger::contract::{self, Chaincode, Invocation, MemberContract, Response};
use member_ledger::error::AppError;
use member_ledger::ledger::{self, WorldState};
use member_ledger::logger;

/// Status reported in batch mode for lines that are not valid invocations.
const BATCH_BAD_REQUEST: i32 = 400;

#[derive(Debug, PartialEq)]
enum Command {
    Init,
    Invoke(Invocation),
    Batch,
    Help,
}

#[derive(Debug)]
struct Args {
    config: PathBuf,
    command: Command,
}

fn parse_args<I>(args: I) -> Result<Args, String>
where
    I: IntoIterator<Item = String>,
{
    let mut config = PathBuf::from(DEFAULT_CONFIG_PATH);
    let mut command = None;
    let mut iter = args.into_iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                config = iter.next().map(PathBuf::from).ok_or("usage: --config <path>")?;
            }
            "--help" | "-h" => return Ok(Args { config, command: Command::Help }),
            "-c" | "--ctor" => {
                let json = iter.next().ok_or("usage: -c '{\"Args\":[...]}'")?;
                let invocation = Invocation::from_json(&json).map_err(|e| e.to_string())?;
                command = Some(Command::Invoke(invocation));
            }
            "init" => command = Some(Command::Init),
            "batch" => command = Some(Command::Batch),
            "invoke" => {
                // Everything after `invoke` belongs to the invocation.
                command = Some(Command::Invoke(Invocation::from_args(iter.by_ref())));
            }
            other => return Err(format!("unknown argument: {other}\n  run 'member-ledger --help' for usage")),
        }
    }

    let command = command.ok_or("no command given\n  run 'member-ledger --help' for usage")?;
    Ok(Args { config, command })
}

fn print_help() {
    eprintln!("usage: member-ledger [--config <path>] <command>");
    eprintln!();
    eprintln!("commands:");
    eprintln!("  init                        run the chaincode instantiate hook");
    eprintln!("  invoke <function> [args..]  invoke memberc | memberu | memberd | query");
    eprintln!("  -c '<json>'                 invoke from {{\"Args\":[\"query\",\"001\"]}}");
    eprintln!("  batch                       read one JSON invocation per stdin line");
    eprintln!();
    eprintln!("flags:");
    eprintln!("  --config <path>   config file (default: {DEFAULT_CONFIG_PATH})");
    eprintln!("  --help, -h        print this help");
}

fn main() -> ExitCode {
    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if args.command == Command::Help {
        print_help();
        return ExitCode::SUCCESS;
    }

    match run(args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Returns `Ok(false)` when the chaincode answered with an error response.
fn run(args: Args) -> Result<bool, AppError> {
    // Load .env if present: the file is optional.
    let _ = dotenvy::dotenv();

    let config = config::load(&args.config)?;
    logger::init(&config.log_level, true, config.log_file.as_deref())?;

    info!(
        name = %config.name,
        work_dir = %config.work_dir.display(),
        backend = ?config.state.backend,
        "config loaded"
    );

    let state = ledger::open(&config.state)?;
    let chaincode = MemberContract::new();

    match args.command {
        Command::Init => {
            let response = contract::instantiate(&chaincode, state.as_ref(), Invocation::new("init", Vec::new()));
            Ok(print_response(&response))
        }
        Command::Invoke(invocation) => {
            let response = contract::execute(&chaincode, state.as_ref(), invocation);
            Ok(print_response(&response))
        }
        Command::Batch => {
            debug!(name = %config.name, "batch mode: reading invocations from stdin");
            run_batch(
                &chaincode,
                state.as_ref(),
                std::io::stdin().lock(),
                std::io::stdout().lock(),
            )
        }
        Command::Help => Ok(true),
    }
}

/// Print a single response the way the peer CLI does.
fn print_response(response: &Response) -> bool {
    if response.is_ok() {
        if response.payload.is_some() {
            println!("{}", response.payload_lossy());
        }
        true
    } else {
        eprintln!("Error: chaincode response {}, {}", response.status, response.message);
        false
    }
}

/// Run every invocation read from `input`, writing one JSON line per
/// non-blank input line to `output`. Lines that are not valid UTF-8 or not a
/// valid invocation get a status-400 line and the batch carries on.
///
/// Returns `Ok(false)` if any line failed.
fn run_batch<R, W>(
    chaincode: &dyn Chaincode,
    state: &dyn WorldState,
    mut input: R,
    mut output: W,
) -> Result<bool, AppError>
where
    R: BufRead,
    W: Write,
{
    let mut all_ok = true;
    let mut buf = Vec::new();
    let mut line_no = 0usize;

    loop {
        buf.clear();
        if input.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        line_no += 1;

        let out = match std::str::from_utf8(&buf) {
            Err(e) => {
                all_ok = false;
                bad_request_line(&format!("invalid UTF-8 on line {line_no}: {e}"))
            }
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => match Invocation::from_json(line.trim_end_matches(['\r', '\n'])) {
                Ok(invocation) => {
                    let tx_id = invocation.tx_id.clone();
                    let response = contract::execute(chaincode, state, invocation);
                    all_ok &= response.is_ok();
                    batch_line(Some(&tx_id), &response)
                }
                Err(e) => {
                    all_ok = false;
                    bad_request_line(&e.to_string())
                }
            },
        };
        writeln!(output, "{out}")?;
    }

    output.flush()?;
    Ok(all_ok)
}

fn bad_request_line(message: &str) -> serde_json::Value {
    serde_json::json!({
        "tx_id": null,
        "status": BATCH_BAD_REQUEST,
        "message": message,
        "payload": null,
    })
}

fn batch_line(tx_id: Option<&str>, response: &Response) -> serde_json::Value {
    serde_json::json!({
        "tx_id": tx_id,
        "status": response.status,
        "message": response.message,
        "payload": response.payload.as_ref().map(|_| response.payload_lossy()),
    })
}
