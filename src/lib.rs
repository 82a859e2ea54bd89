pub mod cli;
pub mod config;
pub mod dump;
pub mod filter;
pub mod geometry;
pub mod ir;
pub mod layout;
pub mod render;
pub mod route;

pub use cli::run;
pub use config::{Config, LayoutConfig, RenderConfig, RoutingConfig};
pub use filter::visible_subgraph;
pub use ir::{EdgeSpec, Graph, NodeSpec, Side, parse_graph};
pub use layout::assign_layout;
pub use render::render_svg;
pub use route::{RoutedEdge, Router, RoutingResult, route_batch};
