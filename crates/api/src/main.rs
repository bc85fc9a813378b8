//! Analytics CLI: bootstrap, retrain, regenerate, or serve one request.

use std::io::Read;

use anyhow::{Context, Result, anyhow, bail};
use serde_json::Value;

use forgeml_api::app::{self, Route};
use forgeml_infra::{AnalyticsConfig, LogFormat};
use forgeml_observability::OutputFormat;

#[derive(Debug)]
enum Command {
    /// Load persisted models or train a fresh set.
    Init,
    Retrain,
    Regenerate,
    Routes,
    /// Handle one request; the body is a JSON argument or `-` for stdin.
    Call { path: String, body: Option<String> },
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let command = parse_args(&args)?;

    let config = AnalyticsConfig::from_env().context("invalid FORGEML_* configuration")?;
    forgeml_observability::init_with(match config.log_format {
        LogFormat::Json => OutputFormat::Json,
        LogFormat::Pretty => OutputFormat::Pretty,
    });

    let request = match command {
        Command::Routes => {
            for route in Route::ALL {
                println!("{}", route.path());
            }
            return Ok(());
        }
        Command::Init => None,
        Command::Retrain => Some((Route::RetrainModels.path().to_string(), Value::Null)),
        Command::Regenerate => Some((Route::RegenerateDatasets.path().to_string(), Value::Null)),
        Command::Call { path, body } => Some((path, read_body(body)?)),
    };

    let services = app::build_app(&config).context("failed to open analytics stores")?;
    let response = match request {
        None => {
            let outcome = services.lifecycle.initialize()?;
            tracing::info!(?outcome, "analytics initialized");
            app::call(&services, Route::Health.path(), &Value::Null)
        }
        Some((path, body)) => app::call(&services, &path, &body),
    };

    println!("{}", serde_json::to_string_pretty(&response.body)?);
    services.lifecycle.shutdown();
    if !response.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

fn read_body(body: Option<String>) -> Result<Value> {
    let raw = match body.as_deref() {
        None => return Ok(Value::Object(Default::default())),
        Some("-") => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read request body from stdin")?;
            buf
        }
        Some(text) => text.to_string(),
    };
    serde_json::from_str(&raw).context("request body is not valid JSON")
}

fn parse_args(args: &[String]) -> Result<Command> {
    let program = args.first().map(String::as_str).unwrap_or("forgeml-api");
    let Some(name) = args.get(1) else {
        print_usage(program);
        bail!("missing command");
    };

    match name.as_str() {
        "init" => Ok(Command::Init),
        "retrain" => Ok(Command::Retrain),
        "regenerate" => Ok(Command::Regenerate),
        "routes" => Ok(Command::Routes),
        "call" => {
            let path = args
                .get(2)
                .cloned()
                .ok_or_else(|| anyhow!("call requires a route, e.g. predict/project-cost"))?;
            Ok(Command::Call {
                path,
                body: args.get(3).cloned(),
            })
        }
        "-h" | "--help" => {
            print_usage(program);
            std::process::exit(0);
        }
        other => {
            print_usage(program);
            Err(anyhow!("Unknown command: {other}"))
        }
    }
}

fn print_usage(program_name: &str) {
    println!("ForgeML analytics");
    println!();
    println!("USAGE:");
    println!("    {program_name} <COMMAND>");
    println!();
    println!("COMMANDS:");
    println!("    init                  Load persisted models or train a fresh set");
    println!("    retrain               Regenerate datasets and retrain every model");
    println!("    regenerate            Regenerate datasets without retraining");
    println!("    routes                List request routes");
    println!("    call <route> [body]   Handle one request; body is JSON or - for stdin");
    println!();
    println!("ENVIRONMENT:");
    println!("    FORGEML_MODELS_DIR, FORGEML_DATASETS_DIR, FORGEML_SEED, FORGEML_LOG_FORMAT,");
    println!("    FORGEML_PROJECT_SAMPLES, FORGEML_CUSTOMER_SAMPLES, FORGEML_EMPLOYEE_SAMPLES,");
    println!("    FORGEML_INVENTORY_DAYS, FORGEML_FALLBACK_WINDOW, RUST_LOG");
}
