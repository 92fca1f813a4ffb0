//! One configured tree: its instruction string, placements and meshes.
//!
//! [`TreeGenerator`] is what a host UI drives. Each [`regenerate`] discards
//! the previous result and rebuilds everything from the config; nothing is
//! updated incrementally.
//!
//! [`regenerate`]: TreeGenerator::regenerate

use crate::config::{LeafStyle, TreeConfig};
use crate::error::TreeError;
use crate::export::{self, ExportPaths, MaterialDocument, MeshDocument, ObjExporter};
use crate::grammar::{self, RuleSet};
use crate::interpreter::{TreeInstances, TreeInterpreter};
use crate::mesh::MeshData;
use crate::random::RandomSource;
use bevy_math::primitives::{Cylinder, Rectangle, Sphere};
use glam::{Mat4, Vec2};
use log::{debug, info};
use std::path::Path;

/// Uniform receiving the full clip-space transform of each instance.
pub const TRANSFORM_UNIFORM: &str = "transform";

/// A shader program as seen by the tree: named uniforms and draw calls.
pub trait Program {
    fn set_uniform(&mut self, name: &str, value: Mat4);
    fn draw(&mut self, mesh: &MeshData);
}

/// Canonical meshes for one geometry configuration.
#[derive(Clone, Debug)]
pub struct TreeMeshes {
    pub branch: MeshData,
    pub leaf: MeshData,
    pub sphere: MeshData,
}

/// Generated tree state.
#[derive(Clone, Debug)]
pub struct TreeGenerator {
    config: TreeConfig,
    rules: RuleSet,
    interpreter: TreeInterpreter,
    codes: String,
    instances: TreeInstances,
    meshes: TreeMeshes,
}

impl TreeGenerator {
    /// Validates `config` and generates the first tree.
    pub fn new<R: RandomSource + ?Sized>(
        config: TreeConfig,
        rng: &mut R,
    ) -> Result<Self, TreeError> {
        let config = config.validated()?;
        let geometry = config.effective_geometry();
        let meshes = build_meshes(&config);
        let mut generator = Self {
            rules: config.rule_set(),
            interpreter: TreeInterpreter::new(geometry)?,
            config,
            codes: String::new(),
            instances: TreeInstances::default(),
            meshes,
        };
        generator.regenerate(rng);
        Ok(generator)
    }

    /// Replaces the configuration and regenerates from scratch.
    pub fn reconfigure<R: RandomSource + ?Sized>(
        &mut self,
        config: TreeConfig,
        rng: &mut R,
    ) -> Result<(), TreeError> {
        *self = Self::new(config, rng)?;
        Ok(())
    }

    /// Re-expands the grammar and re-places every instance.
    pub fn regenerate<R: RandomSource + ?Sized>(&mut self, rng: &mut R) {
        self.codes = grammar::expand(
            &self.config.axiom,
            &self.rules,
            self.config.iterations,
            self.config.stochastic,
            rng,
        );
        self.instances = self.interpreter.interpret(&self.codes, rng);
        info!(
            "generated tree: {} symbols, {} branches, {} leaves",
            self.codes.len(),
            self.instances.branches.len(),
            self.instances.leaves.len()
        );
    }

    /// Moves the root on the ground plane, re-placing the existing
    /// instruction string. No-op when the offset is unchanged.
    pub fn move_root<R: RandomSource + ?Sized>(
        &mut self,
        x: f32,
        z: f32,
        rng: &mut R,
    ) -> Result<(), TreeError> {
        let offset = Vec2::new(x, z);
        if self.interpreter.params().root_offset == offset {
            return Ok(());
        }
        let mut geometry = self.interpreter.params().clone();
        geometry.root_offset = offset;
        self.interpreter = TreeInterpreter::new(geometry)?;
        self.config.geometry.root_offset = offset;
        self.instances = self.interpreter.interpret(&self.codes, rng);
        debug!("moved root to ({x}, {z})");
        Ok(())
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    pub fn codes(&self) -> &str {
        &self.codes
    }

    /// True when the instruction string is empty and there is nothing to draw.
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn instances(&self) -> &TreeInstances {
        &self.instances
    }

    pub fn meshes(&self) -> &TreeMeshes {
        &self.meshes
    }

    /// Mesh the current leaf style instances.
    pub fn leaf_mesh(&self) -> &MeshData {
        match self.config.leaf_style {
            LeafStyle::Leaf => &self.meshes.leaf,
            LeafStyle::Sphere => &self.meshes.sphere,
        }
    }

    /// Issues one draw per instance: branches through `branch_program`,
    /// leaves through `leaf_program`.
    pub fn draw(
        &self,
        projection: Mat4,
        view: Mat4,
        branch_program: &mut dyn Program,
        leaf_program: &mut dyn Program,
    ) {
        if self.is_empty() {
            return;
        }
        let view_projection = projection * view;
        let drop = export::branch_drop(self.interpreter.params().branch_height);
        for instance in &self.instances.branches {
            branch_program.set_uniform(TRANSFORM_UNIFORM, view_projection * *instance * drop);
            branch_program.draw(&self.meshes.branch);
        }
        let leaf_mesh = self.leaf_mesh();
        for instance in &self.instances.leaves {
            leaf_program.set_uniform(TRANSFORM_UNIFORM, view_projection * *instance);
            leaf_program.draw(leaf_mesh);
        }
    }

    /// Bakes the current instances into an OBJ document.
    pub fn to_document(&self) -> MeshDocument {
        ObjExporter::new(self.interpreter.params().branch_height).export(
            &self.meshes.branch,
            self.leaf_mesh(),
            &self.instances,
        )
    }

    /// Writes `<stem>.obj` and `<stem>.mtl` (or a suffixed free name) into `dir`.
    pub fn export_to_dir(&self, dir: &Path, stem: &str) -> Result<ExportPaths, TreeError> {
        export::write_obj_files(dir, stem, &self.to_document(), &MaterialDocument::default())
    }
}

fn build_meshes(config: &TreeConfig) -> TreeMeshes {
    let g = config.effective_geometry();
    TreeMeshes {
        branch: MeshData::branch(Cylinder::new(g.branch_radius, g.branch_height), g.radius_scaling),
        leaf: MeshData::leaf(Rectangle::new(g.leaf_radius, g.leaf_height)),
        sphere: MeshData::sphere(Sphere::new(g.leaf_radius)),
    }
}
