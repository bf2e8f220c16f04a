use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use linegraph_common::Coordinate;
use linegraph_route::weight::DEFAULT_WEIGHT_PROPERTY;
use linegraph_route::{
    DistanceWeight, FeatureCollection, PathFinder, PathFinderOptions, PreparedGraph, PropertyCollector,
    SegmentIndex, Topology, ZeroWeightPolicy,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "linegraph-route")]
#[command(about = "Shortest paths over GeoJSON line networks", long_about = None)]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compact a GeoJSON network into a prepared graph
    Build {
        /// Input GeoJSON FeatureCollection
        input: PathBuf,
        /// Output prepared graph (JSON)
        output: PathBuf,
        #[command(flatten)]
        graph: GraphArgs,
    },
    /// Find the shortest path between two coordinates
    Route {
        /// GeoJSON network used to snap the query points
        network: PathBuf,
        /// Start coordinate (lng,lat)
        #[arg(long)]
        from: String,
        /// End coordinate (lng,lat)
        #[arg(long)]
        to: String,
        /// Prepared graph from `build`; the network is compacted when omitted
        #[arg(long)]
        prepared: Option<PathBuf>,
        /// Write the route as a GeoJSON Feature
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        graph: GraphArgs,
    },
    /// Print statistics of a prepared graph
    Inspect {
        /// Prepared graph file
        prepared: PathBuf,
    },
}

#[derive(Args)]
struct GraphArgs {
    /// Decimal places used to key vertices
    #[arg(
        long,
        default_value_t = linegraph_common::DEFAULT_PRECISION,
        value_parser = clap::value_parser!(u32).range(0..=linegraph_common::MAX_PRECISION as i64)
    )]
    precision: u32,
    /// Meaning of a zero edge weight: impassable or free
    #[arg(long, default_value = "impassable")]
    zero_weight: ZeroWeightPolicy,
    /// Feature property holding the weight factor
    #[arg(long, default_value = DEFAULT_WEIGHT_PROPERTY)]
    weight_property: String,
    /// Collect the distinct values of this property along every edge
    #[arg(long)]
    collect_property: Option<String>,
}

impl GraphArgs {
    fn options(&self) -> PathFinderOptions {
        let mut options = PathFinderOptions::default()
            .with_precision(self.precision)
            .with_zero_weight(self.zero_weight)
            .with_weight_fn(DistanceWeight::new(&self.weight_property).into_weight_fn());
        if let Some(property) = &self.collect_property {
            options = options.with_edge_data(Arc::new(PropertyCollector::new(property)));
        }
        options
    }
}

fn parse_coord(s: &str) -> Result<Coordinate> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 2 {
        anyhow::bail!("Coordinate must be in format 'lng,lat'");
    }
    let lng = parts[0].trim().parse::<f64>()?;
    let lat = parts[1].trim().parse::<f64>()?;
    Ok(Coordinate::new(lng, lat))
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match cli.command {
        Commands::Build { input, output, graph } => {
            println!("Reading network: {}", input.display());
            let start = Instant::now();

            let collection = FeatureCollection::from_path(&input)
                .with_context(|| format!("reading {}", input.display()))?;
            let finder = PathFinder::from_geojson(&collection, graph.options())?;
            println!("Compaction took {:.2}s", start.elapsed().as_secs_f64());

            let prepared = finder.serialize();
            println!(
                "Forks: {}, compacted edges: {} (from {} raw edges)",
                prepared.fork_count(),
                prepared.compacted_edge_count(),
                prepared.raw_edge_count()
            );

            println!("\nSaving to {}...", output.display());
            prepared
                .save(&output)
                .with_context(|| format!("writing {}", output.display()))?;
            println!("Graph saved successfully!");
        }
        Commands::Route {
            network,
            from,
            to,
            prepared,
            output,
            graph,
        } => {
            let options = graph.options();
            let collection = FeatureCollection::from_path(&network)
                .with_context(|| format!("reading {}", network.display()))?;
            let topology = Topology::from_geojson(&collection, &options)?;
            let index = SegmentIndex::from_topology(&topology, &graph.weight_property);

            let mut finder = match prepared {
                Some(path) => {
                    println!("Loading prepared graph from {}...", path.display());
                    let prepared = PreparedGraph::load(&path)
                        .with_context(|| format!("reading {}", path.display()))?;
                    PathFinder::from_prepared(prepared, options)?
                }
                None => PathFinder::new(&topology, options)?,
            };

            let from_coord = parse_coord(&from)?;
            let to_coord = parse_coord(&to)?;

            println!("Finding route from {} to {}...", from_coord, to_coord);
            let start = Instant::now();
            let route = finder
                .find_path(&index, from_coord, to_coord)
                .ok_or_else(|| anyhow::anyhow!("No route found"))?;

            println!("\nRoute found in {:.3}s", start.elapsed().as_secs_f64());
            println!("Weight: {:.1}", route.weight);
            println!("Points: {}", route.path.len());
            if let Some(edge_datas) = &route.edge_datas {
                println!("Edge data: {}", serde_json::to_string(edge_datas)?);
            }

            if let Some(output) = output {
                let feature = serde_json::json!({
                    "type": "Feature",
                    "geometry": {"type": "LineString", "coordinates": &route.path},
                    "properties": {"weight": route.weight, "edgeDatas": &route.edge_datas},
                });
                std::fs::write(&output, serde_json::to_vec_pretty(&feature)?)
                    .with_context(|| format!("writing {}", output.display()))?;
                println!("Route written to {}", output.display());
            }
        }
        Commands::Inspect { prepared } => {
            let graph = PreparedGraph::load(&prepared)
                .with_context(|| format!("reading {}", prepared.display()))?;

            let vertices = graph.vertices.len();
            let forks = graph.fork_count();
            println!("Raw vertices:      {}", vertices);
            println!("Raw edges:         {}", graph.raw_edge_count());
            println!("Forks:             {}", forks);
            println!("Pass-through:      {}", vertices.saturating_sub(forks));
            println!("Compacted edges:   {}", graph.compacted_edge_count());
            println!("Edge data:         {}", graph.compacted_edges.is_some());
        }
    }

    Ok(())
}
