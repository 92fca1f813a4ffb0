//! Interpreter that walks an instruction string and places branch and leaf
//! instances.
//!
//! The entry point is [`TreeInterpreter`]. Build it from a validated
//! [`GeometryParameters`], then call [`TreeInterpreter::interpret`] with the
//! output of [`crate::grammar::expand`], or
//! [`TreeInterpreter::interpret_symbios`] with a [`symbios::SymbiosState`].

use crate::error::TreeError;
use crate::random::RandomSource;
use crate::turtle::{Frame, TurtleOp, TurtleStack};
use glam::{Mat4, Vec2, Vec3};
use log::debug;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use symbios::{SymbiosState, SymbolTable};

/// Characters the interpreter understands, used to resolve symbios symbols.
const ALPHABET: [char; 13] = ['F', 'X', 'A', 'C', '+', '-', '^', '&', '<', '>', '|', '[', ']'];

/// Geometry for one generation run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryParameters {
    /// Radius of the trunk segment.
    pub branch_radius: f32,
    /// Length of the trunk segment.
    pub branch_height: f32,
    /// Leaf width (or sphere radius for sphere leaves).
    pub leaf_radius: f32,
    /// Leaf length.
    pub leaf_height: f32,
    /// Per-segment radius factor applied on every advance.
    pub radius_scaling: f32,
    /// Per-segment length factor applied on every advance.
    pub height_scaling: f32,
    /// Mean turn angle in degrees.
    pub angle: f32,
    /// Standard deviation of the turn angle in degrees.
    pub angle_jitter: f32,
    /// Weight of the lateral shift that accompanies `^ & < >` turns.
    pub lateral_weight: f32,
    /// Divisor of the forward step: `height * (height_scaling + 1) / spacing`.
    pub segment_spacing: f32,
    /// Deviation of the per-advance leaf roll.
    pub advance_leaf_spread: f32,
    /// Deviation of the branch-tip leaf roll made on `]`.
    pub tip_leaf_spread: f32,
    /// Root position on the ground plane as `(x, z)`.
    pub root_offset: Vec2,
}

impl Default for GeometryParameters {
    fn default() -> Self {
        Self {
            branch_radius: 0.1,
            branch_height: 1.0,
            leaf_radius: 0.3,
            leaf_height: 0.5,
            radius_scaling: 0.8,
            height_scaling: 0.9,
            angle: 25.0,
            angle_jitter: 4.0,
            lateral_weight: 1.5,
            segment_spacing: 2.2,
            advance_leaf_spread: 2.0,
            tip_leaf_spread: 0.5,
            root_offset: Vec2::ZERO,
        }
    }
}

impl GeometryParameters {
    /// Rejects values that would make the placement matrices degenerate.
    pub fn validate(&self) -> Result<(), TreeError> {
        let positive = [
            ("branch_radius", self.branch_radius),
            ("branch_height", self.branch_height),
            ("radius_scaling", self.radius_scaling),
            ("height_scaling", self.height_scaling),
            ("segment_spacing", self.segment_spacing),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(TreeError::InvalidParameters(format!(
                    "{name} must be finite and > 0, got {value}"
                )));
            }
        }
        let deviations = [
            ("angle_jitter", self.angle_jitter),
            ("advance_leaf_spread", self.advance_leaf_spread),
            ("tip_leaf_spread", self.tip_leaf_spread),
        ];
        for (name, value) in deviations {
            if !value.is_finite() || value < 0.0 {
                return Err(TreeError::InvalidParameters(format!(
                    "{name} must be finite and >= 0, got {value}"
                )));
            }
        }
        if !self.angle.is_finite() || !self.root_offset.is_finite() {
            return Err(TreeError::InvalidParameters(
                "angle and root_offset must be finite".into(),
            ));
        }
        Ok(())
    }

    fn root(&self) -> Mat4 {
        Mat4::from_translation(Vec3::new(self.root_offset.x, 0.0, self.root_offset.y))
    }
}

/// Placement matrices produced by one interpretation.
///
/// Branches are in instruction order; each is the cumulative transform after
/// its advance. Leaves already carry the inverse of the branch tapering.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TreeInstances {
    pub branches: Vec<Mat4>,
    pub leaves: Vec<Mat4>,
}

impl TreeInstances {
    pub fn is_empty(&self) -> bool {
        self.branches.is_empty() && self.leaves.is_empty()
    }
}

/// Turns instruction strings into [`TreeInstances`].
#[derive(Clone, Debug)]
pub struct TreeInterpreter {
    params: GeometryParameters,
}

impl TreeInterpreter {
    /// Creates an interpreter after validating `params`.
    pub fn new(params: GeometryParameters) -> Result<Self, TreeError> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &GeometryParameters {
        &self.params
    }

    /// Interprets an instruction string.
    ///
    /// Characters outside the alphabet are skipped. An empty string yields
    /// empty instance lists.
    pub fn interpret<R: RandomSource + ?Sized>(&self, codes: &str, rng: &mut R) -> TreeInstances {
        self.run(codes.chars().map(TurtleOp::from_symbol), rng)
    }

    /// Interprets a symbios derivation.
    ///
    /// Each symbol is resolved through `symbols`; only symbols whose name is a
    /// single character of the instruction alphabet carry meaning, and
    /// parameters are ignored.
    pub fn interpret_symbios<R: RandomSource + ?Sized>(
        &self,
        state: &SymbiosState,
        symbols: &SymbolTable,
        rng: &mut R,
    ) -> TreeInstances {
        let mut op_map: Vec<Option<TurtleOp>> = Vec::new();
        for c in ALPHABET {
            let name = c.to_string();
            let Some(id) = symbols.resolve_id(name.as_str()) else {
                continue;
            };
            let idx = id as usize;
            if idx >= op_map.len() {
                op_map.resize(idx + 1, None);
            }
            op_map[idx] = TurtleOp::from_symbol(c);
        }

        let ops = (0..state.len())
            .map_while(|i| state.get_view(i))
            .map(|view| op_map.get(view.sym as usize).copied().flatten());
        self.run(ops, rng)
    }

    /// Walks a decoded instruction stream. `None` entries are ignored
    /// characters: they push nothing but do break advance adjacency.
    fn run<I, R>(&self, ops: I, rng: &mut R) -> TreeInstances
    where
        I: IntoIterator<Item = Option<TurtleOp>>,
        R: RandomSource + ?Sized,
    {
        let p = &self.params;
        let mut stack = TurtleStack::new(p.root());
        let mut out = TreeInstances::default();
        let (advance, inverse) = self.advance_deltas();
        let mut last_was_advance = false;

        for op in ops {
            let Some(op) = op else {
                last_was_advance = false;
                continue;
            };

            match op {
                TurtleOp::Advance => {
                    let frame = *stack.push_scaled(advance, inverse);
                    out.branches.push(frame.transform);
                    if rolls_zero(rng, p.advance_leaf_spread) {
                        out.leaves.push(self.leaf_at(&frame));
                    }
                }
                TurtleOp::YawRight => {
                    let a = self.jittered_angle(rng);
                    stack.push_transform(Mat4::from_rotation_y(a));
                }
                TurtleOp::YawLeft => {
                    let a = self.jittered_angle(rng);
                    stack.push_transform(Mat4::from_rotation_y(-a));
                }
                TurtleOp::PitchUp => {
                    let a = self.jittered_angle(rng);
                    let shift = Vec3::new(0.0, 0.0, self.lateral_shift(a));
                    stack.push_transform(Mat4::from_rotation_x(a) * Mat4::from_translation(shift));
                }
                TurtleOp::PitchDown => {
                    let a = self.jittered_angle(rng);
                    let shift = Vec3::new(0.0, 0.0, -self.lateral_shift(a));
                    stack.push_transform(Mat4::from_rotation_x(-a) * Mat4::from_translation(shift));
                }
                TurtleOp::RollLeft => {
                    let a = self.jittered_angle(rng);
                    let shift = Vec3::new(-self.lateral_shift(a), 0.0, 0.0);
                    stack.push_transform(Mat4::from_rotation_z(a) * Mat4::from_translation(shift));
                }
                TurtleOp::RollRight => {
                    let a = self.jittered_angle(rng);
                    let shift = Vec3::new(self.lateral_shift(a), 0.0, 0.0);
                    stack.push_transform(Mat4::from_rotation_z(-a) * Mat4::from_translation(shift));
                }
                TurtleOp::TurnAround => {
                    stack.push_transform(Mat4::from_rotation_y(PI));
                }
                TurtleOp::Push => stack.open_branch(),
                TurtleOp::Pop => {
                    // Tip leaves only close a branch that ended on a segment.
                    if stack.open_branches() > 0
                        && last_was_advance
                        && rolls_zero(rng, p.tip_leaf_spread)
                    {
                        out.leaves.push(self.leaf_at(stack.top()));
                    }
                    stack.close_branch();
                }
            }
            last_was_advance = op == TurtleOp::Advance;
        }

        if stack.open_branches() > 0 {
            debug!("{} branches left open at end of input", stack.open_branches());
        }
        debug!(
            "placed {} branches and {} leaves",
            out.branches.len(),
            out.leaves.len()
        );
        out
    }

    /// Forward step for one segment and the matching inverse taper.
    fn advance_deltas(&self) -> (Mat4, Mat4) {
        let p = &self.params;
        let taper = Vec3::new(p.radius_scaling, p.height_scaling, p.radius_scaling);
        let step = p.branch_height * (p.height_scaling + 1.0) / p.segment_spacing;
        let advance = Mat4::from_scale(taper) * Mat4::from_translation(Vec3::new(0.0, step, 0.0));
        (advance, Mat4::from_scale(taper.recip()))
    }

    fn jittered_angle<R: RandomSource + ?Sized>(&self, rng: &mut R) -> f32 {
        rng.normal(self.params.angle, self.params.angle_jitter)
            .to_radians()
    }

    fn lateral_shift(&self, angle: f32) -> f32 {
        self.params.lateral_weight * angle.sin() * (self.params.branch_height / 2.0)
    }

    /// Leaf hanging half a segment below the frame, without the taper.
    fn leaf_at(&self, frame: &Frame) -> Mat4 {
        let drop = Mat4::from_translation(Vec3::new(0.0, -self.params.branch_height / 2.0, 0.0));
        frame.transform * drop * frame.inverse_scale
    }
}

/// Normal draw around zero that floors to exactly 0.
fn rolls_zero<R: RandomSource + ?Sized>(rng: &mut R, spread: f32) -> bool {
    rng.normal(0.0, spread).floor() == 0.0
}
