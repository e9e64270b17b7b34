//! Project files: everything needed to reproduce one image, as JSON.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use mandelgrid_core::{ComplexViewport, PlaneBounds};
use mandelgrid_render::{RenderConfig, RenderError, Rgb};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_min")]
    pub min_re: f64,
    #[serde(default = "default_min")]
    pub min_im: f64,
    #[serde(default = "default_max")]
    pub max_re: f64,
    #[serde(default = "default_max")]
    pub max_im: f64,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    /// `#rrggbb`
    #[serde(default = "default_color_inside")]
    pub color_inside: String,
    /// Gradient stops, first stop for the slowest escapes.
    #[serde(default = "default_color_gradient")]
    pub color_gradient: Vec<String>,
}

fn default_width() -> u32 {
    600
}
fn default_height() -> u32 {
    600
}
fn default_min() -> f64 {
    PlaneBounds::DEFAULT.min_re
}
fn default_max() -> f64 {
    PlaneBounds::DEFAULT.max_re
}
fn default_max_iterations() -> u32 {
    100
}
fn default_color_inside() -> String {
    Rgb::BLACK.to_string()
}
fn default_color_gradient() -> Vec<String> {
    vec!["#ff003c".into(), "#ffffff".into()]
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            min_re: default_min(),
            min_im: default_min(),
            max_re: default_max(),
            max_im: default_max(),
            max_iterations: default_max_iterations(),
            color_inside: default_color_inside(),
            color_gradient: default_color_gradient(),
        }
    }
}

impl ProjectConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        let project = serde_json::from_str(&json)?;
        info!("Loaded project from {}", path.display());
        Ok(project)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        debug!("Saved project to {}", path.display());
        Ok(())
    }

    pub fn bounds(&self) -> PlaneBounds {
        PlaneBounds::new(self.min_re, self.min_im, self.max_re, self.max_im)
    }

    /// Validate through the core constructors and parse the colors.
    pub fn to_render_config(&self) -> Result<RenderConfig> {
        let viewport = ComplexViewport::new(self.bounds(), self.width, self.height)?;
        let inside_color = self.color_inside.parse::<Rgb>()?;
        let gradient = self
            .color_gradient
            .iter()
            .map(|s| s.parse::<Rgb>())
            .collect::<std::result::Result<Vec<_>, RenderError>>()?;
        Ok(RenderConfig {
            viewport,
            max_iterations: self.max_iterations,
            inside_color,
            gradient,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CliError;

    #[test]
    fn empty_document_takes_defaults() {
        let project: ProjectConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(project, ProjectConfig::default());
        assert_eq!((project.width, project.height), (600, 600));
        assert_eq!(project.bounds(), PlaneBounds::DEFAULT);
        assert_eq!(project.color_inside, "#000000");
    }

    #[test]
    fn partial_document_keeps_given_fields() {
        let project: ProjectConfig =
            serde_json::from_str(r#"{"width": 320, "max_iterations": 500}"#).unwrap();
        assert_eq!(project.width, 320);
        assert_eq!(project.height, 600);
        assert_eq!(project.max_iterations, 500);
    }

    #[test]
    fn default_project_converts() {
        let cfg = ProjectConfig::default().to_render_config().unwrap();
        assert_eq!(cfg.viewport.area_width(), 600);
        assert_eq!(cfg.max_iterations, 100);
        assert_eq!(cfg.inside_color, Rgb::BLACK);
        assert_eq!(cfg.gradient, vec![Rgb::new(255, 0, 60), Rgb::WHITE]);
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let project = ProjectConfig {
            min_re: 1.0,
            max_re: -1.0,
            ..ProjectConfig::default()
        };
        assert!(matches!(
            project.to_render_config(),
            Err(CliError::Core(_))
        ));
    }

    #[test]
    fn bad_color_is_rejected() {
        let project = ProjectConfig {
            color_gradient: vec!["#ff003c".into(), "white".into()],
            ..ProjectConfig::default()
        };
        assert!(matches!(
            project.to_render_config(),
            Err(CliError::Render(RenderError::InvalidColor(_)))
        ));
    }

    #[test]
    fn save_then_load() {
        let dir = std::env::temp_dir().join("mandelgrid_test_project");
        let path = dir.join("nested").join("project.json");
        let project = ProjectConfig {
            width: 800,
            height: 450,
            ..ProjectConfig::default()
        };
        project.save(&path).unwrap();
        assert_eq!(ProjectConfig::load(&path).unwrap(), project);
        let _ = fs::remove_dir_all(&dir);
    }
}
