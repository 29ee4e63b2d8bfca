use anyhow::{bail, Context, Result};
use atlas_core::{map::LatLng, stores::SelectedPlace, Explorer, ExplorerConfig};
use atlas_transit::{PlaceLevel, RouteCode};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

mod output;

use output::{merge_sources, read_geojson, write_geojson};

#[derive(Parser, Debug)]
#[command(
    name = "transit-probe",
    author,
    version,
    about = "Query the transit atlas services from the command line",
    long_about = "Drives the explorer core against a live API: nearby route and stop \
                  searches, route lookups, place outlines and viewport fitting.\n\n\
                  Results can be written as GeoJSON for inspection in any GIS tool."
)]
struct Args {
    /// Explorer configuration file (JSON); every field is optional
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overrides the API base URL from the configuration
    #[arg(long)]
    api_url: Option<String>,

    /// Overrides the request timeout, in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Verbose output (show debug messages)
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Routes and stops around a point
    Nearby {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lng: f64,

        /// Search radius in kilometres, clamped to the configured range
        #[arg(short, long)]
        radius: Option<f64>,

        /// Write the map sources to this GeoJSON file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// A single route and its stops
    Route {
        code: String,

        /// Write the route and its stops to this GeoJSON file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// The place catalog, or one place outline
    Places {
        /// Fetch the outline of this place
        #[arg(long)]
        name: Option<String>,

        #[arg(long, value_enum, default_value_t = Level::Department)]
        level: Level,
    },

    /// Fit a viewport to a GeoJSON file; does not contact the API
    Fit {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(long)]
        width: Option<f64>,

        #[arg(long)]
        height: Option<f64>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Level {
    Department,
    Municipality,
    District,
}

impl From<Level> for PlaceLevel {
    fn from(level: Level) -> Self {
        match level {
            Level::Department => PlaceLevel::Department,
            Level::Municipality => PlaceLevel::Municipality,
            Level::District => PlaceLevel::District,
        }
    }
}

fn load_config(args: &Args) -> Result<ExplorerConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            ExplorerConfig::from_json_str(&text).context("Failed to parse config")?
        }
        None => ExplorerConfig::default(),
    };

    if let Some(url) = &args.api_url {
        config.api_base_url = url.clone();
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config.request_timeout_ms = timeout_ms;
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if args.verbose { "debug" } else { "info" }),
    )
    .format_timestamp(None)
    .init();

    let config = load_config(&args)?;

    log::info!("API: {}", config.api_base_url);
    let explorer = Explorer::new(config).context("Failed to set up the explorer")?;

    // Failures inside the core resolve to empty results; surface them here
    let mut notices = explorer.subscribe_notices();
    let report_notices = tokio::spawn(async move {
        while let Ok(notice) = notices.recv().await {
            log::warn!("{}", notice.message);
        }
    });

    match args.command {
        Command::Nearby {
            lat,
            lng,
            radius,
            output,
        } => {
            let location = LatLng::new(lat, lng);
            if !location.is_finite() {
                bail!("Invalid location: {lat}, {lng}");
            }

            let outcome = explorer.search_nearby(location, radius).await;
            log::debug!("{outcome:?}");

            let routes = explorer.routes().read().await;
            log::info!(
                "{} routes within {:.1} km",
                routes.nearby().len(),
                routes.radius_km()
            );
            for route in routes.nearby() {
                log::info!(
                    "  {:<10} {:>7.0} m  {} ({})",
                    route.code().as_str(),
                    route.distance_meters,
                    route.info.name,
                    route.info.direction.code()
                );
            }
            drop(routes);

            let stops = explorer.stops().read().await;
            log::info!("{} stops", stops.nearby().len());
            for stop in stops.nearby() {
                log::info!("  {:<10} {} [{}]", stop.id.as_str(), stop.name, stop.route_code);
            }
            drop(stops);

            if let Some(path) = output {
                write_geojson(merge_sources(&explorer.sources().await), &path)?;
            }
        }

        Command::Route { code, output } => {
            if !explorer.select_route(RouteCode::new(&code)).await {
                bail!("Route {code} could not be loaded");
            }

            {
                let routes = explorer.routes().read().await;
                if let Some(route) = routes.selected() {
                    log::info!(
                        "{} {} | {} {} | {:.1} km | {}",
                        route.code(),
                        route.info.name,
                        route.info.kind,
                        route.info.subtype,
                        route.info.length_km,
                        route.info.department
                    );
                }
                let stops = explorer.stops().read().await;
                log::info!("{} stops", stops.route_stops().len());
            }

            if let Some(path) = output {
                write_geojson(merge_sources(&explorer.sources().await), &path)?;
            }
        }

        Command::Places { name, level } => {
            if !explorer.load_places().await {
                bail!("Place catalog could not be loaded");
            }

            {
                let places = explorer.places().read().await;
                let catalog = places.catalog();
                log::info!(
                    "{} departments, {} municipalities, {} districts",
                    catalog.departments.len(),
                    catalog.municipalities.len(),
                    catalog.districts.len()
                );
            }

            if let Some(name) = name {
                let commands = explorer
                    .select_place(SelectedPlace::new(name.as_str(), level.into()))
                    .await;
                match commands.first() {
                    Some(command) => log::info!("{name}: {command:?}"),
                    None => log::warn!("{name}: no outline available"),
                }
            }
        }

        Command::Fit { input, width, height } => {
            let viewport_settings = &explorer.config().viewport;
            let (width, height) = (
                width.unwrap_or(viewport_settings.width_px),
                height.unwrap_or(viewport_settings.height_px),
            );
            explorer.set_viewport_frame(width, height).await;

            let geojson = read_geojson(&input)?;
            let collection = geo::GeometryCollection::<f64>::try_from(&geojson)
                .context("Unsupported geometry in input")?;
            let viewport = explorer.fit(&geo::Geometry::GeometryCollection(collection)).await;

            log::info!(
                "center {:.5}, {:.5} zoom {} ({width}x{height} px)",
                viewport.center.lat,
                viewport.center.lng,
                viewport.zoom
            );
        }
    }

    drop(explorer);
    report_notices.abort();
    log::info!("Done!");
    Ok(())
}
