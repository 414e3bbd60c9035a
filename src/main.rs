//! Command-line entry point: plan deliveries from order and fleet files.

use clap::Parser;
use delivery_router::allocation::AllocationStrategy;
use delivery_router::clustering::ClusterMethod;
use delivery_router::config::Config;
use delivery_router::problem::{load_orders, load_vehicles, Coordinate};
use delivery_router::sequencing::SequencingStrategy;
use delivery_router::utils::{format_duration, format_summaries, save_plan, write_records};
use delivery_router::Planner;
use log::{info, warn};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Orders file (CSV or JSON)
    orders: PathBuf,

    /// Fleet file (CSV or JSON)
    vehicles: PathBuf,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Where to write the augmented order table (CSV)
    #[arg(short, long, default_value = "deliveries.csv")]
    output: PathBuf,

    /// Optional text report
    #[arg(long)]
    report: Option<PathBuf>,

    /// Clustering method: kmeans or dbscan
    #[arg(long)]
    method: Option<String>,

    /// Number of regions for kmeans
    #[arg(long, default_value_t = 3)]
    clusters: usize,

    /// Neighborhood radius in km for dbscan
    #[arg(long, default_value_t = 5.0)]
    radius_km: f64,

    /// Minimum neighborhood size for dbscan
    #[arg(long, default_value_t = 3)]
    min_points: usize,

    /// Cluster each city separately
    #[arg(long)]
    city_scoped: bool,

    /// Fleet utilization percentage (0-100)
    #[arg(long)]
    utilization: Option<f64>,

    /// Maximum orders per load
    #[arg(long)]
    max_orders: Option<usize>,

    /// Allocation strategy: greedy, random or genetic
    #[arg(long)]
    strategy: Option<String>,

    /// Sequencing strategy: genetic or nearest_neighbor
    #[arg(long)]
    sequencing: Option<String>,

    /// Latitude of the route origin
    #[arg(long, requires = "origin_lon", allow_hyphen_values = true)]
    origin_lat: Option<f64>,

    /// Longitude of the route origin
    #[arg(long, requires = "origin_lat", allow_hyphen_values = true)]
    origin_lon: Option<f64>,

    /// Seed for every stochastic stage
    #[arg(long)]
    seed: Option<u64>,
}

fn build_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::new(),
    };

    if let Some(method) = &args.method {
        config = config.with_cluster_method(ClusterMethod::from_name(
            method,
            args.clusters,
            args.radius_km,
            args.min_points,
        )?);
    }
    if args.city_scoped {
        config = config.with_city_scope(true);
    }
    if let Some(utilization) = args.utilization {
        config = config.with_fleet_utilization(utilization);
    }
    if let Some(max_orders) = args.max_orders {
        config = config.with_max_orders_per_load(max_orders);
    }
    if let Some(strategy) = &args.strategy {
        let seed = args.seed.unwrap_or(config.allocation.genetic.seed);
        config = config.with_allocation_strategy(AllocationStrategy::from_name(strategy, seed)?);
    }
    if let Some(sequencing) = &args.sequencing {
        config = config.with_sequencing_strategy(sequencing.parse::<SequencingStrategy>()?);
    }
    if let (Some(lat), Some(lon)) = (args.origin_lat, args.origin_lon) {
        config = config.with_origin(Coordinate::new(lat, lon));
    }
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }

    Ok(config)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();
    let config = build_config(&args)?;

    info!("Loading orders from: {}", args.orders.display());
    let orders = load_orders(&args.orders)?;
    info!("Loading fleet from: {}", args.vehicles.display());
    let vehicles = load_vehicles(&args.vehicles)?;
    println!("Loaded {} orders and {} vehicles", orders.len(), vehicles.len());

    let mut planner = Planner::new(config);
    let plan = planner.plan(orders, &vehicles)?;

    if let Some(shortfall) = plan.allocation.shortfall() {
        warn!("{}", shortfall);
    }
    for violation in &plan.allocation.violations {
        warn!("{}", violation);
    }

    println!("Planning completed in {}", format_duration(plan.run_time));
    println!("{}", plan.statistics().format());
    println!();
    print!("{}", format_summaries(&plan.summaries));

    println!("Saving deliveries to: {}", args.output.display());
    write_records(&plan.records(), &args.output)?;

    if let Some(report) = &args.report {
        println!("Saving report to: {}", report.display());
        save_plan(&plan, report)?;
    }

    Ok(())
}
