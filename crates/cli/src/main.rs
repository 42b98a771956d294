use crate::{
    args::{Cli, ConnectionArgs},
    env::ParamResolver,
    error::CliError,
    output::render,
    shutdown::{ExitCode, ShutdownCoordinator},
};
use clap::Parser;
use connectors::{adapter::Adapter, params::ConnectionTarget};
use engine_core::{
    backoff::PollSettings,
    config::{TailConfig, parse_timezone},
    registry::FieldSelection,
    sink::WriterSink,
    tail::TailEngine,
};
use std::{sync::Arc, time::Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

mod args;
mod conn;
mod env;
mod error;
mod output;
mod shutdown;
mod template;

const BACKOFF_MULTIPLIER: u32 = 2;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let coordinator = ShutdownCoordinator::new(CancellationToken::new());
    coordinator.register_handlers();

    let code = match run(cli, coordinator.cancel_token()).await {
        Ok(()) if coordinator.is_shutdown_requested() => ExitCode::ShutdownRequested,
        Ok(()) => ExitCode::Success,
        Err(CliError::ShutdownRequested) => ExitCode::ShutdownRequested,
        Err(err) => {
            eprintln!("{}", report(&err));
            ExitCode::GeneralError
        }
    };

    std::process::exit(code.as_i32());
}

// Logs go to stderr; stdout carries only tailed rows and getter output.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(log_directive(level)).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Also accepts the `warning`, `critical` and `fatal` level names.
fn log_directive(level: &str) -> String {
    match level.trim().to_ascii_lowercase().as_str() {
        "warning" => "warn".to_string(),
        "critical" | "fatal" => "error".to_string(),
        other => other.to_string(),
    }
}

fn report(err: &CliError) -> String {
    match err {
        CliError::Tail(err) if err.is_configuration() => format!("Configuration error: {err}"),
        err => format!("Error: {err}"),
    }
}

async fn run(cli: Cli, cancel: CancellationToken) -> Result<(), CliError> {
    let config = tail_config(&cli)?;
    let timeout = timeout(&cli)?;

    let target = connection_target(&cli.connection)?;

    let adapter = conn::connect(cli.connection.driver, &target, cli.retry(), &cancel).await?;
    let result = tail(&cli, config, timeout, adapter.clone(), cancel).await;

    if let Err(err) = adapter.close().await {
        warn!(%err, "Failed to close the database connection");
    }
    result
}

async fn tail(
    cli: &Cli,
    config: TailConfig,
    timeout: Option<Duration>,
    adapter: Adapter,
    cancel: CancellationToken,
) -> Result<(), CliError> {
    let mut engine = TailEngine::new(Arc::new(adapter), config)
        .await?
        .with_cancellation(cancel);

    if cli.get_template {
        println!("{}", render(&engine.field_template(), cli.output_format)?);
        return Ok(());
    }
    if cli.get_columns {
        println!("{}", render(engine.columns(), cli.output_format)?);
        return Ok(());
    }

    engine.add_sink(WriterSink::new(std::io::stdout()));
    let summary = engine.run(timeout).await?;
    debug!(?summary, "Tail finished");
    Ok(())
}

/// `--url` is used as given; otherwise each parameter is resolved from flags,
/// environment and option files.
fn connection_target(args: &ConnectionArgs) -> Result<ConnectionTarget, CliError> {
    match &args.url {
        Some(url) => Ok(ConnectionTarget::Url(url.clone())),
        None => ParamResolver::from_system(args.config_file.as_deref())?
            .params(args)
            .map(ConnectionTarget::Params),
    }
}

fn tail_config(cli: &Cli) -> Result<TailConfig, CliError> {
    let fields = match &cli.template {
        Some(arg) => FieldSelection::Template(template::load_template(arg)?),
        None => FieldSelection::from_list(cli.columns.as_deref().unwrap_or_default()),
    };
    let filters = cli.filters.as_deref().map(split_list).unwrap_or_default();
    let poll = PollSettings::new(
        Duration::from_millis(cli.poll_floor_ms),
        Duration::from_millis(cli.poll_ceiling_ms),
        BACKOFF_MULTIPLIER,
    );

    Ok(TailConfig::new(&cli.table)
        .key_column(&cli.key_column)
        .fields(fields)
        .filters(filters)
        .timezone(parse_timezone(&cli.timezone)?)
        .delimiter(&cli.delimiter)
        .poll(poll)
        .batch_limit(cli.batch_limit))
}

fn timeout(cli: &Cli) -> Result<Option<Duration>, CliError> {
    cli.timeout
        .map(|secs| {
            Duration::try_from_secs_f64(secs)
                .map_err(|_| CliError::Config(format!("invalid timeout '{secs}'")))
        })
        .transpose()
}

fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}
