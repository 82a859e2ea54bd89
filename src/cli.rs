use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, ValueEnum};

use crate::config::load_config;
use crate::dump::{RoutingDump, write_routing_dump};
use crate::filter::visible_subgraph;
use crate::ir::parse_graph;
use crate::layout::assign_layout;
use crate::render::{render_svg, write_output_svg};
use crate::route::route_batch;

#[derive(Parser, Debug)]
#[command(name = "orthoflow", version, about = "Orthogonal edge router for node-link diagrams")]
pub struct Args {
    /// Input diagram JSON (nodes + edges) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file. Defaults to stdout.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'f', long = "format", value_enum, default_value = "svg")]
    pub format: OutputFormat,

    /// Config JSON file overriding routing/layout/render defaults
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Keep host-provided node positions instead of running the layered
    /// layout
    #[arg(long = "keep-positions")]
    pub keep_positions: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Svg,
    Json,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    let input = read_input(args.input.as_deref())?;
    let graph = parse_graph(&input)?;

    let mut graph = visible_subgraph(&graph);
    if !args.keep_positions {
        assign_layout(&mut graph, &config.layout);
    }
    let routes = route_batch(&graph, &config.routing);

    match args.format {
        OutputFormat::Svg => {
            let svg = render_svg(&graph, &routes, &config.render);
            write_output_svg(&svg, args.output.as_deref())?;
        }
        OutputFormat::Json => {
            let dump = RoutingDump::from_result(&graph, &routes);
            write_routing_dump(&dump, args.output.as_deref())?;
        }
    }
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path
        && path != Path::new("-")
    {
        return Ok(std::fs::read_to_string(path)?);
    }
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    Ok(buffer)
}
