use std::process::ExitCode;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use kai_server::cache::ResultCache;
use kai_server::config::Settings;
use kai_server::schedule::ScheduleService;
use kai_server::stations::{StationClient, StationDirectory, StationStore};
use kai_server::web::{AppState, create_router};

#[tokio::main]
async fn main() -> ExitCode {
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_logging(&settings);

    match run(settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "server stopped");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_level.to_lowercase()));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if settings.log_json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(settings: Settings) -> Result<(), Box<dyn std::error::Error>> {
    let kai_config = settings.kai_config();

    // Load station codes (fail fast if neither the file nor the site has them)
    let station_client = StationClient::new(kai_config.clone());
    let station_store = StationStore::new(&settings.stations_file);
    let stations = StationDirectory::load(station_client, station_store).await?;
    info!(count = stations.len().await, "station directory ready");

    // Refresh at startup, then on a fixed interval
    let refresh_interval = settings.station_refresh_interval();
    let stations_refresh = stations.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(refresh_interval);
        loop {
            interval.tick().await;
            match stations_refresh.refresh().await {
                Ok(count) => info!(count, "refreshed station list"),
                Err(e) => warn!(error = %e, "failed to refresh station list, keeping previous"),
            }
        }
    });

    let cache = ResultCache::new(&settings.cache_config());
    let schedules = ScheduleService::new(kai_config, cache, stations);
    let app = create_router(AppState::new(schedules));

    let listener = tokio::net::TcpListener::bind(settings.bind_addr).await?;
    info!(addr = %settings.bind_addr, base_url = %settings.base_url, "KAI schedule API listening");
    info!("endpoints: GET / | GET /health | GET /stations[?search=] | GET /search?origin=&destination=&departure_date=");

    axum::serve(listener, app).await?;
    Ok(())
}
