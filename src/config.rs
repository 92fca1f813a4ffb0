//! Tree configuration: grammar, geometry and export options in one
//! serializable value.

use crate::error::TreeError;
use crate::grammar::RuleSet;
use crate::interpreter::GeometryParameters;
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Largest iteration count accepted; growth is exponential in it.
pub const MAX_ITERATIONS: u32 = 5;

/// Mesh used for leaf instances.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeafStyle {
    /// Two-sided textured leaf card.
    #[default]
    Leaf,
    /// Foliage sphere of radius `leaf_radius`.
    Sphere,
}

/// Multipliers applied to branch height and radius once the instruction
/// string exists, before placement and mesh construction.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PostGenerationScale {
    pub height: f32,
    pub radius: f32,
}

impl Default for PostGenerationScale {
    fn default() -> Self {
        Self {
            height: 1.2,
            radius: 1.3,
        }
    }
}

/// Everything needed to generate one tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    pub axiom: String,
    /// Newline-separated `<symbol>=<replacement>` lines.
    pub rules: String,
    pub iterations: u32,
    /// Pick uniformly among alternative rules instead of always the first.
    pub stochastic: bool,
    pub leaf_style: LeafStyle,
    /// Disabled by default.
    pub post_generation_scale: Option<PostGenerationScale>,
    pub geometry: GeometryParameters,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            axiom: "X".to_string(),
            rules: "X=F[<X][>X]\nF=FF".to_string(),
            iterations: 3,
            stochastic: false,
            leaf_style: LeafStyle::default(),
            post_generation_scale: None,
            geometry: GeometryParameters::default(),
        }
    }
}

impl TreeConfig {
    pub fn from_json_str(json: &str) -> Result<Self, TreeError> {
        let config: Self = serde_json::from_str(json)?;
        config.validated()
    }

    /// Reads a JSON config file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TreeError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            TreeError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&text)
    }

    pub fn to_json(&self) -> Result<String, TreeError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Clamps the iteration count and checks geometry.
    pub fn validated(mut self) -> Result<Self, TreeError> {
        if self.iterations > MAX_ITERATIONS {
            warn!(
                "iterations {} clamped to {}",
                self.iterations, MAX_ITERATIONS
            );
            self.iterations = MAX_ITERATIONS;
        }
        if let Some(scale) = self.post_generation_scale
            && (!(scale.height > 0.0) || !(scale.radius > 0.0))
        {
            return Err(TreeError::InvalidParameters(
                "post_generation_scale factors must be > 0".into(),
            ));
        }
        self.geometry.validate()?;
        Ok(self)
    }

    pub fn rule_set(&self) -> RuleSet {
        RuleSet::parse(&self.rules)
    }

    /// Geometry used for placement and meshes, with the post-generation
    /// scale folded in.
    pub fn effective_geometry(&self) -> GeometryParameters {
        let mut geometry = self.geometry.clone();
        if let Some(scale) = self.post_generation_scale {
            geometry.branch_height *= scale.height;
            geometry.branch_radius *= scale.radius;
        }
        geometry
    }
}
