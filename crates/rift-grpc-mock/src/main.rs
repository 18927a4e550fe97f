use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

use rift_grpc_mock::config::{init_logging, MockConfig};
use rift_grpc_mock::proxy::GrpcConnector;
use rift_grpc_mock::stub::load_stubs_file;
use rift_grpc_mock::{CompositeMockService, ErrorDetailEngine, MockEngine, MockService, StubStore};

/// Load, validate and summarize gRPC mock stub files
#[derive(Parser, Debug)]
#[command(name = "rift-grpc-mock", version)]
struct Args {
    /// Configuration file (YAML)
    #[arg(short, long, env = "RIFT_GRPC_CONFIG")]
    config: Option<PathBuf>,

    /// Stub files (JSON or YAML), loaded after those listed in the config
    stubs: Vec<PathBuf>,

    /// Override the configured log level
    #[arg(long)]
    log_level: Option<String>,

    /// Exit with an error if any stub is invalid or conflicts with another
    #[arg(long)]
    strict: bool,
}

#[derive(Debug, Default)]
struct LoadReport {
    loaded: usize,
    invalid: usize,
    conflicts: usize,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => MockConfig::from_file(path)?,
        None => MockConfig::default(),
    };
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }

    config.validate()?;
    init_logging(&config.logging)?;

    let service: Arc<dyn MockService> = Arc::new(CompositeMockService::default());
    let engine = MockEngine::new(
        Arc::new(StubStore::mock()),
        Arc::new(StubStore::recording()),
        Arc::new(ErrorDetailEngine::default()),
        Arc::new(GrpcConnector::from_config(service, &config.forward)),
    );
    let store = engine.stubs();
    let builder = engine.builder();
    let mut report = LoadReport::default();

    for path in config.stubs.files.iter().chain(&args.stubs) {
        let stubs = load_stubs_file(path)?;
        info!(file = %path.display(), count = stubs.len(), "Loaded stub file");

        for stub in stubs {
            let mut errors = stub.validation_errors();
            if errors.is_empty() {
                if let Err(e) = builder.check_details(&stub) {
                    errors.push(format!("Error details could not be expanded: {e}"));
                }
            }
            if !errors.is_empty() {
                warn!(
                    file = %path.display(),
                    method = %stub.full_method,
                    errors = ?errors,
                    "Invalid stub"
                );
                report.invalid += 1;
                continue;
            }

            match store.add(stub) {
                Ok(()) => report.loaded += 1,
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "Stub rejected");
                    report.conflicts += 1;
                }
            }
        }
    }

    let mut per_method: BTreeMap<String, usize> = BTreeMap::new();
    for stub in store.get_all() {
        *per_method.entry(stub.full_method.clone()).or_default() += 1;
    }
    for (method, count) in &per_method {
        info!(method = %method, stubs = count, "Stubs ready");
    }
    info!(
        loaded = report.loaded,
        invalid = report.invalid,
        conflicts = report.conflicts,
        "Stub loading complete"
    );

    if args.strict && (report.invalid > 0 || report.conflicts > 0) {
        anyhow::bail!(
            "{} invalid and {} conflicting stubs",
            report.invalid,
            report.conflicts
        );
    }
    Ok(())
}
