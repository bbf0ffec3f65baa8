//! Command handlers for the webfile CLI
//!
//! The binary is a reference host: it owns the main context, issues requests
//! through one coordinator and ticks it until every callback has fired.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::app::{ManualScheduler, WebFile};
use crate::cli::{ConfigAction, ConfigArgs, GetArgs};
use crate::config::AppConfig;
use crate::errors::{AppError, Result};

/// Handle the get command
///
/// Issues every requested download at once and reports each result as it is
/// delivered. Fails if any download failed.
pub async fn handle_get(args: GetArgs, config: &AppConfig) -> Result<()> {
    let (webfile, scheduler) = build_coordinator(config);
    let downloads = args.downloads();
    let results: Arc<Mutex<Vec<(PathBuf, bool)>>> = Arc::new(Mutex::new(Vec::new()));

    info!("Requesting {} downloads", downloads.len());
    for (url, dest) in &downloads {
        let results = Arc::clone(&results);
        let reported = dest.clone();
        webfile.get(url, dest, move |ok| {
            if ok {
                println!("✅ {}", reported.display());
            } else {
                println!("❌ {}", reported.display());
            }
            results.lock().push((reported, ok));
        });
    }

    let expected = downloads.len();
    run_main_loop(&webfile, &scheduler, || results.lock().len() == expected).await;

    let failed = results.lock().iter().filter(|(_, ok)| !ok).count();
    if failed > 0 {
        return Err(AppError::generic(format!(
            "{} of {} downloads failed",
            failed, expected
        )));
    }
    Ok(())
}

/// Handle the clear command
pub async fn handle_clear(config: &AppConfig) -> Result<()> {
    let (webfile, scheduler) = build_coordinator(config);
    let outcome = Arc::new(Mutex::new(None));

    let slot = Arc::clone(&outcome);
    webfile.clear_storage(move |ok| {
        *slot.lock() = Some(ok);
    });

    run_main_loop(&webfile, &scheduler, || outcome.lock().is_some()).await;

    let outcome = *outcome.lock();
    match outcome {
        Some(true) => {
            println!("✅ Storage cleared");
            Ok(())
        }
        _ => Err(AppError::generic("Clearing storage failed")),
    }
}

/// Handle configuration management
pub async fn handle_config(args: ConfigArgs, config: &AppConfig) -> Result<()> {
    match args.action {
        ConfigAction::Init { path } => {
            let path = path
                .or_else(AppConfig::default_config_path)
                .ok_or_else(|| AppError::generic("Could not determine user config directory"))?;
            if AppConfig::write_default(&path).await? {
                println!("📁 Created default configuration file:");
            } else {
                println!("Configuration file already exists:");
            }
            println!("   {}", path.display());
            Ok(())
        }
        ConfigAction::Show => {
            let rendered = toml::to_string_pretty(config)
                .map_err(|e| AppError::generic(format!("Failed to render config: {}", e)))?;
            print!("{}", rendered);
            Ok(())
        }
    }
}

fn build_coordinator(config: &AppConfig) -> (Arc<WebFile>, Arc<ManualScheduler>) {
    let (client_config, poll_config) = config.to_runtime_config();
    let scheduler = Arc::new(ManualScheduler::new());
    let webfile = WebFile::with_client_config(
        Handle::current(),
        scheduler.clone(),
        client_config,
        poll_config,
    );
    (webfile, scheduler)
}

/// Tick `webfile` at the scheduled interval until `done` holds
///
/// Runs on the calling task, which therefore becomes the main context.
async fn run_main_loop(
    webfile: &WebFile,
    scheduler: &ManualScheduler,
    mut done: impl FnMut() -> bool,
) {
    let started = Instant::now();
    let mut last_tick = started;

    while !done() {
        let Some(interval) = scheduler.interval() else {
            // Nothing asked to be ticked yet; every callback so far was synchronous
            warn!("Waiting for callbacks but polling was never requested");
            break;
        };
        tokio::time::sleep(interval).await;

        let now = Instant::now();
        let delivered = webfile.tick(now - last_tick);
        last_tick = now;
        if delivered > 0 {
            debug!("Tick delivered {} callbacks", delivered);
        }
    }

    info!("Main loop finished after {:?}", started.elapsed());
}
