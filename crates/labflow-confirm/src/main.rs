//! `labflow` command line: validate or apply a confirmation request
//! against a store snapshot.

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use labflow_confirm::{ConfirmError, ConfirmService, ConfirmationRequest, EngineConfig};
use labflow_model::User;
use labflow_store::{MemoryStore, Snapshot};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn input_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("store")
                .long("store")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("Store snapshot JSON to load"),
        )
        .arg(
            Arg::new("request")
                .long("request")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("Confirmation request JSON"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_parser(value_parser!(PathBuf))
                .help("Engine configuration TOML"),
        )
}

fn cli() -> Command {
    Command::new("labflow")
        .version(labflow_confirm::VERSION)
        .about("Confirm planned lab work against recorded plans")
        .subcommand_required(true)
        .arg(
            Arg::new("json-logs")
                .long("json-logs")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(input_args(
            Command::new("validate").about("Check a confirmation request without applying it"),
        ))
        .subcommand(
            input_args(Command::new("confirm").about("Validate and apply a confirmation request"))
                .arg(
                    Arg::new("user")
                        .long("user")
                        .required(true)
                        .help("Username recorded on created operations"),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .value_parser(value_parser!(PathBuf))
                        .help("Write the store snapshot after a successful commit"),
                ),
        )
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_service(args: &ArgMatches) -> Result<(ConfirmService<MemoryStore>, ConfirmationRequest)> {
    let store_path = args
        .get_one::<PathBuf>("store")
        .context("--store is required")?;
    let request_path = args
        .get_one::<PathBuf>("request")
        .context("--request is required")?;

    let config = match args.get_one::<PathBuf>("config") {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let snapshot = Snapshot::load(store_path)
        .with_context(|| format!("loading store snapshot {}", store_path.display()))?;
    let store = MemoryStore::from_snapshot(snapshot)?;

    let text = std::fs::read_to_string(request_path)
        .with_context(|| format!("reading request {}", request_path.display()))?;
    let request: ConfirmationRequest = serde_json::from_str(&text)
        .with_context(|| format!("parsing request {}", request_path.display()))?;

    Ok((ConfirmService::with_config(store, config), request))
}

fn print_problems(problems: &[String]) -> Result<()> {
    let body = serde_json::json!({ "valid": false, "problems": problems });
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

fn run(matches: &ArgMatches) -> Result<bool> {
    match matches.subcommand() {
        Some(("validate", args)) => {
            let (service, request) = load_service(args)?;
            let validated = service.validate(&request);
            if validated.is_valid() {
                println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "valid": true }))?);
                Ok(true)
            } else {
                let problems: Vec<String> = validated.problems.into_iter().collect();
                print_problems(&problems)?;
                Ok(false)
            }
        }
        Some(("confirm", args)) => {
            let (service, request) = load_service(args)?;
            let user = args
                .get_one::<String>("user")
                .map(User::new)
                .context("--user is required")?;

            match service.confirm(&user, &request) {
                Ok(result) => {
                    println!("{}", serde_json::to_string_pretty(&result)?);
                    if let Some(path) = args.get_one::<PathBuf>("output") {
                        service
                            .store()
                            .snapshot()
                            .save(path)
                            .with_context(|| format!("writing snapshot {}", path.display()))?;
                    }
                    Ok(true)
                }
                Err(ConfirmError::Validation(failure)) => {
                    print_problems(failure.problems())?;
                    Ok(false)
                }
                Err(e) => Err(e.into()),
            }
        }
        _ => unreachable!("subcommand is required"),
    }
}

fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_logging(matches.get_flag("json-logs"));

    if !run(&matches)? {
        std::process::exit(1);
    }
    Ok(())
}
