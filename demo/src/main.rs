//! `gridzone`: decompose an ASCII map into zones and run region queries.
//!
//! ```text
//! gridzone demo/maps/wall.txt --chunk 5x10 --metric manhattan --from 1,0 --to 8,0
//! ```

mod terrain;

use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, ValueEnum};
use env_logger::Env;
use gridzone_core::{DistanceMetric, Point, Range, TileConfig};
use gridzone_paths::SearchResult;
use gridzone_regions::debug::{dump_connectivity, dump_edges, dump_zones};
use gridzone_regions::{ModeId, ModeTable, RegionConfig, RegionGraph, ZoneLayer};

use terrain::{FLY, WALK};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Metric {
    Manhattan,
    Chebyshev,
    Euclidean,
}

impl From<Metric> for DistanceMetric {
    fn from(m: Metric) -> Self {
        match m {
            Metric::Manhattan => DistanceMetric::Manhattan,
            Metric::Chebyshev => DistanceMetric::Chebyshev,
            Metric::Euclidean => DistanceMetric::Euclidean,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    Walk,
    Fly,
}

impl Mode {
    fn id(self) -> ModeId {
        match self {
            Mode::Walk => WALK,
            Mode::Fly => FLY,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "gridzone", version, about = "Zone decomposition and region queries on ASCII maps")]
struct Cli {
    /// Map file: `.` floor, `~` marsh, `#` wall
    map: PathBuf,
    /// JSON region configuration; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,
    /// Chunk size as `N` or `WxH`
    #[arg(long, value_parser = parse_chunk)]
    chunk: Option<TileConfig>,
    #[arg(long, value_enum, default_value_t = Metric::Chebyshev)]
    metric: Metric,
    #[arg(long, value_enum, default_value_t = Mode::Walk)]
    mode: Mode,
    /// Query start as `x,y`
    #[arg(long, value_parser = parse_point, requires = "to")]
    from: Option<Point>,
    /// Query goal as `x,y`
    #[arg(long, value_parser = parse_point, requires = "from")]
    to: Option<Point>,
    /// Also print the connectivity blocks of every chunk
    #[arg(long)]
    connectivity: bool,
    /// Default log filter when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log: String,
}

fn parse_point(s: &str) -> Result<Point, String> {
    let (x, y) = s.split_once(',').ok_or("expected x,y")?;
    let x = x.trim().parse().map_err(|e| format!("bad x: {e}"))?;
    let y = y.trim().parse().map_err(|e| format!("bad y: {e}"))?;
    Ok(Point::new(x, y))
}

fn parse_chunk(s: &str) -> Result<TileConfig, String> {
    let (w, h) = s.split_once('x').unwrap_or((s, s));
    let w: i32 = w.trim().parse().map_err(|e| format!("bad width: {e}"))?;
    let h: i32 = h.trim().parse().map_err(|e| format!("bad height: {e}"))?;
    if w <= 0 || h <= 0 {
        return Err("chunk dimensions must be positive".into());
    }
    Ok(TileConfig::new(w, h))
}

fn load_config(cli: &Cli, bounds: Range) -> Result<RegionConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => RegionConfig::default(),
    };
    if let Some(chunk) = cli.chunk {
        config = config.with_chunk(chunk);
    }
    if config.world_bounds.is_none() {
        config = config.with_world_bounds(bounds);
    }
    Ok(config)
}

fn chunks_covering(layer: &ZoneLayer, bounds: Range) -> Range {
    let lo = layer.chunk_of(bounds.min);
    let hi = layer.chunk_of(bounds.max.shift(-1, -1));
    Range::new(lo.x, lo.y, hi.x + 1, hi.y + 1)
}

fn print_layer(layer: &ZoneLayer, chunks: Range, connectivity: bool) {
    for chunk in chunks.iter() {
        let zones = layer.zones(chunk).map_or(0, <[_]>::len);
        println!("chunk {chunk} {}: {zones} zone(s)", layer.chunk_bounds(chunk));
        print!("{}", dump_zones(layer, chunk));
        if connectivity {
            print!("{}", dump_connectivity(layer, chunk));
        }
        print!("{}", dump_edges(layer, chunk));
        println!();
    }
}

fn print_result(res: &SearchResult) {
    println!(
        "{:?}: {} step(s), cost {:.2}, {} abstract node(s)",
        res.status,
        res.len(),
        res.cost,
        res.nodes_evaluated
    );
    let path: Vec<String> = res.points().map(|p| p.to_string()).collect();
    println!("{}", path.join(" "));
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or(cli.log.as_str()))
        .try_init();

    let text = std::fs::read_to_string(&cli.map)
        .with_context(|| format!("reading map {}", cli.map.display()))?;
    let map = terrain::parse(&text)
        .with_context(|| format!("parsing map {}", cli.map.display()))?;
    let map = Rc::new(map);
    let bounds = map.bounds();
    let config = load_config(&cli, bounds)?;
    let metric = DistanceMetric::from(cli.metric);
    log::info!(
        "map {} with {}x{} chunks, {:?}",
        bounds,
        config.chunk.width,
        config.chunk.height,
        metric
    );

    let modes = ModeTable::new()
        .with(terrain::walker(Rc::clone(&map)), &[metric])
        .with(terrain::flyer(Rc::clone(&map)), &[metric]);
    let mut graph = RegionGraph::new(modes, config);
    let mode = cli.mode.id();

    let chunks = graph
        .layer(mode, metric)
        .map(|l| chunks_covering(l, bounds))
        .ok_or_else(|| anyhow!("no layer for {mode} under {metric:?}"))?;
    for chunk in chunks.iter() {
        graph.ensure_chunk(chunk);
    }
    let layer = graph
        .layer(mode, metric)
        .ok_or_else(|| anyhow!("no layer for {mode} under {metric:?}"))?;
    print_layer(layer, chunks, cli.connectivity);
    let stats = layer.stats();
    println!(
        "{} decomposition(s), {} edge(s), {} record(s)",
        stats.decompositions,
        stats.edges,
        layer.record_count()
    );

    if let (Some(from), Some(to)) = (cli.from, cli.to) {
        let res = graph.find_path(mode, metric, from, to);
        print_result(&res);
        // second run is served from the segment cache
        let again = graph.find_path(mode, metric, from, to);
        if let Some(l) = graph.layer(mode, metric) {
            let s = l.stats();
            log::info!(
                "{} segment(s) computed, {} cache hit(s), repeat cost {:.2}",
                s.segment_computations,
                s.segment_hits,
                again.cost
            );
        }
    }
    Ok(())
}
