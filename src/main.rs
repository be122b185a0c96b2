mod cli;
mod config;

use cli::Args;
use config::{
    discover_config, load_config_from_path, ConfigFile, Settings, CONFIG_FILENAME, SIGNER_ID_ENV,
};
use std::path::Path;
use std::process;
use std::sync::Arc;
use tracing::debug;
use vcn_bom::adapters::outbound::console::StderrProgressReporter;
use vcn_bom::adapters::outbound::ecosystems::EcosystemContext;
use vcn_bom::adapters::outbound::ledger::JsonFileLedger;
use vcn_bom::adapters::outbound::network::{
    CachingHashSource, MavenChecksumSource, PyPiHashSource, SumDbClient,
};
use vcn_bom::adapters::outbound::process::SystemCommandRunner;
use vcn_bom::application::dto::BomRequest;
use vcn_bom::application::use_cases::GenerateBomUseCase;
use vcn_bom::bom::services::TrustPolicyOptions;
use vcn_bom::ports::outbound::ProgressReporter;
use vcn_bom::shared::error::ExitCode;
use vcn_bom::shared::Result;

#[tokio::main]
async fn main() {
    let args = Args::parse_args();

    tracing_subscriber::fmt()
        .with_env_filter(args.log_filter())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let progress_reporter = Arc::new(StderrProgressReporter::new());
    let result = run(args, Arc::clone(&progress_reporter)).await;
    progress_reporter.finish_progress_bar();

    if let Err(e) = result {
        eprintln!("\n❌ An error occurred:\n");
        eprintln!("{}", e);

        // Display error chain
        for cause in e.chain().skip(1) {
            eprintln!("\nCaused by: {}", cause);
        }

        eprintln!();
        process::exit(ExitCode::for_error(&e).as_i32());
    }
}

async fn run(args: Args, progress_reporter: Arc<StderrProgressReporter>) -> Result<()> {
    let config = match &args.config {
        Some(path) => {
            let config = load_config_from_path(path)?;
            progress_reporter.report(&format!("📄 Loaded config from: {}", path.display()));
            config
        }
        None => match discover_config(Path::new("."))? {
            Some(config) => {
                progress_reporter.report(&format!("📄 Auto-discovered config file: {}", CONFIG_FILENAME));
                config
            }
            None => ConfigFile::default(),
        },
    };
    let settings = Settings::resolve(&args, config, std::env::var(SIGNER_ID_ENV).ok())?;
    debug!(?settings, "Effective settings");

    // Create adapters (Dependency Injection)
    let runner = SystemCommandRunner::new(settings.command_timeout);
    let sumdb = SumDbClient::from_env_or(&settings.sumdb, settings.http_timeout)?;
    let pypi = PyPiHashSource::new(&settings.pypi_url, settings.http_timeout)?;
    let maven = MavenChecksumSource::new(&settings.maven_repo, settings.http_timeout)?;
    let reporter: Arc<dyn ProgressReporter> = progress_reporter;

    let context = EcosystemContext::new(
        Arc::new(runner),
        Arc::new(CachingHashSource::new(sumdb)),
        Arc::new(CachingHashSource::new(pypi)),
        Arc::new(CachingHashSource::new(maven)),
    )
    .with_workers(settings.workers)
    .with_progress(Arc::clone(&reporter));

    let ledger = JsonFileLedger::open(&settings.ledger)?;

    // Create use case with injected dependencies
    let use_case = GenerateBomUseCase::new(ledger, context, reporter);

    let request = BomRequest::new(
        args.path,
        TrustPolicyOptions {
            signer_id: settings.signer_id,
            trust_level: settings.trust_level,
            auto_notarize: settings.auto_notarize,
            max_unsupported: settings.max_unsupported,
        },
        settings.bom_file,
    )
    .with_spdx_file(settings.spdx);

    use_case.execute(request).await?;
    Ok(())
}
