use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use clap::{ArgMatches, CommandFactory, FromArgMatches};

use endpoint_probe::args::{Command, TesterArgs};
use endpoint_probe::error::{AppError, AppResult, ValidationError};
use endpoint_probe::http::{ClientSettings, Harness, ReqwestTransport};
use endpoint_probe::report::{self, ReportContext};
use endpoint_probe::suite::{
    CatalogueOptions, build_catalogue, load_fixtures, probe_endpoints, probe_server, run_groups,
};
use endpoint_probe::system::logger::init_logging;
use endpoint_probe::telemetry::{SinkConfig, TelemetrySink};
use endpoint_probe::workflow::load_workflows;

pub(crate) fn run() -> AppResult<ExitCode> {
    let (args, matches) = parse_args()?;
    let args = apply_config(args, &matches)?;

    init_logging(args.verbose, args.no_color);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::validation(ValidationError::RuntimeBuildFailed { source: err }))?;

    let code = runtime.block_on(async {
        match args.run_mode() {
            Command::Probe => run_probe(&args).await,
            Command::Run => run_suite(&args).await,
        }
    })?;
    Ok(exit_code(code))
}

fn parse_args() -> AppResult<(TesterArgs, ArgMatches)> {
    let matches = TesterArgs::command().get_matches();
    let args = TesterArgs::from_arg_matches(&matches)?;
    Ok((args, matches))
}

fn apply_config(mut args: TesterArgs, matches: &ArgMatches) -> AppResult<TesterArgs> {
    if let Some(config) = endpoint_probe::config::load_config(args.config.as_deref())? {
        endpoint_probe::config::apply_config(&mut args, matches, &config)?;
    }
    Ok(args)
}

fn exit_code(code: i32) -> ExitCode {
    u8::try_from(code).map_or(ExitCode::FAILURE, ExitCode::from)
}

fn build_harness(args: &TesterArgs, sink: &Arc<TelemetrySink>) -> AppResult<Harness> {
    let settings = ClientSettings {
        api_key: args.api_key.clone(),
        headers: args.headers.clone(),
        timeout: args.timeout,
    };
    let transport = ReqwestTransport::new(&settings)?;
    Harness::new(
        Arc::new(transport),
        Arc::clone(sink),
        &args.base_url,
        args.timeout,
    )
}

async fn run_probe(args: &TesterArgs) -> AppResult<i32> {
    let sink = Arc::new(TelemetrySink::open(&SinkConfig {
        log_path: None,
        truncate: false,
        details: false,
    })?);
    let harness = build_harness(args, &sink)?;
    let report = probe_server(&harness, &probe_endpoints(&args.endpoints)).await;
    report.print();
    Ok(report.exit_code())
}

async fn run_suite(args: &TesterArgs) -> AppResult<i32> {
    let workflow_paths: Vec<PathBuf> = args.workflows.iter().map(PathBuf::from).collect();
    let workflows = load_workflows(&workflow_paths)?;
    let fixtures = load_fixtures(Path::new(&args.fixtures_dir))?;

    let sink = Arc::new(TelemetrySink::open(&SinkConfig {
        log_path: Some(PathBuf::from(&args.log_file)),
        truncate: args.truncate_log,
        details: !args.no_details,
    })?);
    let harness = build_harness(args, &sink)?;
    let started = Instant::now();

    let probe = probe_server(&harness, &probe_endpoints(&args.endpoints)).await;
    probe.print();

    let groups = build_catalogue(CatalogueOptions {
        fixtures: &fixtures,
        workflows: &workflows,
        concurrent_requests: args.concurrent_requests.get(),
    });
    let responses = run_groups(&harness, groups, args.concurrency.get()).await;
    tracing::debug!("Suite issued {} tracked requests", responses.len());

    let summary = report::finalize(&sink);
    report::print_summary(
        &summary,
        &ReportContext {
            base_url: args.base_url.clone(),
            server: probe.server_status(),
            wall_time: started.elapsed(),
            log_path: sink.log_path().map(|path| path.display().to_string()),
        },
    );
    Ok(summary.exit_code())
}
