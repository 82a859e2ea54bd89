use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ir::Side;

/// Options consumed by the single-edge router, the separator and the path
/// renderer. Negative values are treated as zero/disabled at the point of
/// use; the struct itself stores whatever the host handed over.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    pub padding: f32,
    pub source_stub_length: f32,
    pub target_stub_length: f32,
    pub bend_penalty: f32,
    /// Slope in y added to horizontal-segment costs. The orchestrator applies
    /// it only to labelled edges, so the first bend lands near the source and
    /// leaves room for the label.
    pub early_bend_bias: f32,
    pub edge_separation: f32,
    pub bend_radius: f32,
    pub source_dir: Side,
    pub target_dir: Side,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            padding: 20.0,
            source_stub_length: 20.0,
            target_stub_length: 20.0,
            bend_penalty: 1.0,
            early_bend_bias: 0.05,
            edge_separation: 5.0,
            bend_radius: 8.0,
            source_dir: Side::Bottom,
            target_dir: Side::Top,
        }
    }
}

impl RoutingConfig {
    /// Per-edge overrides layered on top of this config.
    pub fn with_overrides(&self, overrides: &RoutingOverrides) -> Self {
        let mut merged = self.clone();
        if let Some(value) = overrides.padding {
            merged.padding = value;
        }
        if let Some(value) = overrides.source_stub_length {
            merged.source_stub_length = value;
        }
        if let Some(value) = overrides.target_stub_length {
            merged.target_stub_length = value;
        }
        if let Some(value) = overrides.bend_penalty {
            merged.bend_penalty = value;
        }
        if let Some(value) = overrides.early_bend_bias {
            merged.early_bend_bias = value;
        }
        if let Some(value) = overrides.bend_radius {
            merged.bend_radius = value;
        }
        if let Some(value) = overrides.source_dir {
            merged.source_dir = value;
        }
        if let Some(value) = overrides.target_dir {
            merged.target_dir = value;
        }
        merged
    }
}

/// Per-edge routing overrides as they appear on `EdgeSpec::routingConfig`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingOverrides {
    pub padding: Option<f32>,
    pub source_stub_length: Option<f32>,
    pub target_stub_length: Option<f32>,
    pub bend_penalty: Option<f32>,
    pub early_bend_bias: Option<f32>,
    pub bend_radius: Option<f32>,
    pub source_dir: Option<Side>,
    pub target_dir: Option<Side>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub horizontal_gap: f32,
    pub vertical_gap: f32,
    /// Gap used between rank pairs whose connecting edges carry no labels
    /// when `compact_unlabeled` is set.
    pub compact_vertical_gap: f32,
    pub compact_unlabeled: bool,
    /// Fallback dimensions for nodes the host has not measured.
    pub node_width: f32,
    pub node_height: f32,
    pub order_passes: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            horizontal_gap: 40.0,
            vertical_gap: 60.0,
            compact_vertical_gap: 40.0,
            compact_unlabeled: false,
            node_width: 150.0,
            node_height: 60.0,
            order_passes: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub background: String,
    pub node_fill: String,
    pub node_stroke: String,
    pub line_color: String,
    pub text_color: String,
    pub label_background: String,
    pub font_family: String,
    pub font_size: f32,
    pub margin: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            background: "#FFFFFF".to_string(),
            node_fill: "#ECECFF".to_string(),
            node_stroke: "#9370DB".to_string(),
            line_color: "#333333".to_string(),
            text_color: "#131300".to_string(),
            label_background: "rgba(232,232,232, 0.8)".to_string(),
            font_family: "Inter, Helvetica, sans-serif".to_string(),
            font_size: 14.0,
            margin: 24.0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub routing: RoutingConfig,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RoutingConfigFile {
    padding: Option<f32>,
    source_stub_length: Option<f32>,
    target_stub_length: Option<f32>,
    bend_penalty: Option<f32>,
    early_bend_bias: Option<f32>,
    edge_separation: Option<f32>,
    bend_radius: Option<f32>,
    source_dir: Option<Side>,
    target_dir: Option<Side>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct LayoutConfigFile {
    horizontal_gap: Option<f32>,
    vertical_gap: Option<f32>,
    compact_vertical_gap: Option<f32>,
    compact_unlabeled: Option<bool>,
    node_width: Option<f32>,
    node_height: Option<f32>,
    order_passes: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RenderConfigFile {
    background: Option<String>,
    node_fill: Option<String>,
    node_stroke: Option<String>,
    line_color: Option<String>,
    text_color: Option<String>,
    label_background: Option<String>,
    font_family: Option<String>,
    font_size: Option<f32>,
    margin: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    routing: Option<RoutingConfigFile>,
    layout: Option<LayoutConfigFile>,
    render: Option<RenderConfigFile>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path)?;
    let parsed: ConfigFile = serde_json::from_str(&contents)?;

    if let Some(routing) = parsed.routing {
        if let Some(value) = routing.padding {
            config.routing.padding = value;
        }
        if let Some(value) = routing.source_stub_length {
            config.routing.source_stub_length = value;
        }
        if let Some(value) = routing.target_stub_length {
            config.routing.target_stub_length = value;
        }
        if let Some(value) = routing.bend_penalty {
            config.routing.bend_penalty = value;
        }
        if let Some(value) = routing.early_bend_bias {
            config.routing.early_bend_bias = value;
        }
        if let Some(value) = routing.edge_separation {
            config.routing.edge_separation = value;
        }
        if let Some(value) = routing.bend_radius {
            config.routing.bend_radius = value;
        }
        if let Some(value) = routing.source_dir {
            config.routing.source_dir = value;
        }
        if let Some(value) = routing.target_dir {
            config.routing.target_dir = value;
        }
    }

    if let Some(layout) = parsed.layout {
        if let Some(value) = layout.horizontal_gap {
            config.layout.horizontal_gap = value;
        }
        if let Some(value) = layout.vertical_gap {
            config.layout.vertical_gap = value;
        }
        if let Some(value) = layout.compact_vertical_gap {
            config.layout.compact_vertical_gap = value;
        }
        if let Some(value) = layout.compact_unlabeled {
            config.layout.compact_unlabeled = value;
        }
        if let Some(value) = layout.node_width {
            config.layout.node_width = value;
        }
        if let Some(value) = layout.node_height {
            config.layout.node_height = value;
        }
        if let Some(value) = layout.order_passes {
            config.layout.order_passes = value;
        }
    }

    if let Some(render) = parsed.render {
        if let Some(value) = render.background {
            config.render.background = value;
        }
        if let Some(value) = render.node_fill {
            config.render.node_fill = value;
        }
        if let Some(value) = render.node_stroke {
            config.render.node_stroke = value;
        }
        if let Some(value) = render.line_color {
            config.render.line_color = value;
        }
        if let Some(value) = render.text_color {
            config.render.text_color = value;
        }
        if let Some(value) = render.label_background {
            config.render.label_background = value;
        }
        if let Some(value) = render.font_family {
            config.render.font_family = value;
        }
        if let Some(value) = render.font_size {
            config.render.font_size = value;
        }
        if let Some(value) = render.margin {
            config.render.margin = value;
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_surface() {
        let config = RoutingConfig::default();
        assert_eq!(config.padding, 20.0);
        assert_eq!(config.source_stub_length, 20.0);
        assert_eq!(config.target_stub_length, 20.0);
        assert_eq!(config.bend_penalty, 1.0);
        assert_eq!(config.edge_separation, 5.0);
        assert_eq!(config.bend_radius, 8.0);
        assert_eq!(config.source_dir, Side::Bottom);
        assert_eq!(config.target_dir, Side::Top);
    }

    #[test]
    fn per_edge_overrides_layer_over_globals() {
        let base = RoutingConfig::default();
        let merged = base.with_overrides(&RoutingOverrides {
            padding: Some(12.0),
            target_dir: Some(Side::Left),
            ..Default::default()
        });
        assert_eq!(merged.padding, 12.0);
        assert_eq!(merged.target_dir, Side::Left);
        assert_eq!(merged.bend_penalty, base.bend_penalty);
    }

    #[test]
    fn override_document_parses_camel_case() {
        let overrides: RoutingOverrides =
            serde_json::from_str(r#"{"bendPenalty": 3.5, "sourceDir": "right"}"#).unwrap();
        assert_eq!(overrides.bend_penalty, Some(3.5));
        assert_eq!(overrides.source_dir, Some(Side::Right));
    }
}
