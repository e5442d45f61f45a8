use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use trip_monitor::api::{self, AppState};
use trip_monitor::config::MonitorConfig;
use trip_monitor::logger::init_logger;
use trip_monitor::monitor::{CheckMonitoredTrip, LogNotificationSender, Scheduler};
use trip_monitor::planner::OtpPlanner;
use trip_monitor::segment::{
    load_segment_actions, InteractionHandler, LogInteractionHandler, WebhookInteractionHandler,
};
use trip_monitor::store::MemoryStore;
use trip_monitor::tracking::Locator;

#[derive(Parser)]
#[command(name = "trip-monitor")]
#[command(about = "Monitors saved transit trips and guides riders along them")]
struct Args {
    /// Port to run the HTTP server on
    #[arg(short, long, env = "SERVER_PORT", default_value = "8080")]
    port: u16,

    /// JSON configuration file; defaults apply when omitted
    #[arg(short, long, env = "TRIP_MONITOR_CONFIG")]
    config: Option<PathBuf>,

    /// JSON file holding trips, users and journey states
    #[arg(short, long, env = "TRIP_MONITOR_STORE", default_value = "trip_store.json")]
    store: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logger()?;

    let config = match &args.config {
        Some(path) => MonitorConfig::load(path)?,
        None => MonitorConfig::default(),
    };
    info!(planner_url = %config.planner_url, "starting trip monitor");

    let store = Arc::new(
        MemoryStore::load_or_default(&args.store)
            .with_context(|| format!("could not load store {}", args.store.display()))?,
    );
    info!(trips = store.trip_count().await, "loaded trip store");

    let planner = OtpPlanner::new(&config.planner_url, config.planner_timeout())
        .context("could not build planner client")?;
    let job = Arc::new(CheckMonitoredTrip::new(
        Arc::new(planner),
        store.clone(),
        Arc::new(LogNotificationSender),
        config.planner_timeout(),
    ));
    let scheduler = Scheduler::new(job, store.clone(), config.check_interval(), config.time_zone);

    let actions = match &config.segment_actions_path {
        Some(path) => load_segment_actions(path)
            .with_context(|| format!("could not load segment actions {}", path.display()))?,
        None => Vec::new(),
    };
    let interactions: Arc<dyn InteractionHandler> = match &config.interaction_endpoint {
        Some(endpoint) => Arc::new(
            WebhookInteractionHandler::new(endpoint, config.planner_timeout())
                .context("could not build interaction client")?,
        ),
        None => Arc::new(LogInteractionHandler),
    };
    let locator = Locator::new(config.locator_settings(), Arc::new(actions), interactions);
    let state = AppState::new(store, locator);

    let scheduler_handle = tokio::spawn(async move {
        scheduler.run().await;
    });

    let port = args.port;
    let api_handle = tokio::spawn(async move { api::run_server(state, port).await });

    tokio::select! {
        _ = scheduler_handle => error!("scheduler exited"),
        result = api_handle => match result {
            Ok(Ok(())) => error!("api server exited"),
            Ok(Err(err)) => error!(error = %err, "api server failed"),
            Err(err) => error!(error = %err, "api server task panicked"),
        },
    }

    Ok(())
}
