//! Turtle instructions and the frame stack they operate on.

use glam::Mat4;
use log::error;
use serde::{Deserialize, Serialize};

/// Operations encoded by the instruction alphabet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TurtleOp {
    /// Place one branch segment and advance along local +Y (`F`, `X`, `A`, `C`).
    Advance,
    /// Rotate around local Y by `+angle` (`+`).
    YawRight,
    /// Rotate around local Y by `-angle` (`-`).
    YawLeft,
    /// Rotate around local X by `+angle`, shifted along +Z (`^`).
    PitchUp,
    /// Rotate around local X by `-angle`, shifted along -Z (`&`).
    PitchDown,
    /// Rotate around local Z by `+angle`, shifted along -X (`<`).
    RollLeft,
    /// Rotate around local Z by `-angle`, shifted along +X (`>`).
    RollRight,
    /// Turn 180 degrees around local Y (`|`).
    TurnAround,
    /// Open a branch (`[`).
    Push,
    /// Close the innermost branch (`]`).
    Pop,
}

impl TurtleOp {
    /// Decodes one instruction character. Returns `None` for characters the
    /// turtle ignores, such as grammar-only placeholders.
    pub fn from_symbol(c: char) -> Option<Self> {
        let op = match c {
            'F' | 'X' | 'A' | 'C' => Self::Advance,
            '+' => Self::YawRight,
            '-' => Self::YawLeft,
            '^' => Self::PitchUp,
            '&' => Self::PitchDown,
            '<' => Self::RollLeft,
            '>' => Self::RollRight,
            '|' => Self::TurnAround,
            '[' => Self::Push,
            ']' => Self::Pop,
            _ => return None,
        };
        Some(op)
    }

    /// True for operations that push a frame and therefore count toward the
    /// enclosing branch.
    pub fn pushes_frame(self) -> bool {
        !matches!(self, Self::Push | Self::Pop)
    }
}

/// Accumulated turtle state at one point of the walk.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Cumulative placement from the tree root.
    pub transform: Mat4,
    /// Inverse of the accumulated branch tapering, used to size leaves.
    pub inverse_scale: Mat4,
}

/// Stack of turtle frames with branch marks.
///
/// Transform and inverse scale travel together in one [`Frame`], and every
/// open branch records the stack height it started at. Closing a branch
/// truncates back to that height, which undoes exactly the pushes made inside
/// it. The root frame can never be popped.
#[derive(Clone, Debug)]
pub struct TurtleStack {
    frames: Vec<Frame>,
    marks: Vec<usize>,
}

impl TurtleStack {
    /// Starts a stack whose root frame is `root` with no tapering.
    pub fn new(root: Mat4) -> Self {
        Self {
            frames: vec![Frame {
                transform: root,
                inverse_scale: Mat4::IDENTITY,
            }],
            marks: Vec::new(),
        }
    }

    /// The innermost frame.
    pub fn top(&self) -> &Frame {
        // The root frame is never removed.
        &self.frames[self.frames.len() - 1]
    }

    /// Right-multiplies the top transform by `delta` and pushes the product.
    /// The inverse scale is carried over unchanged.
    pub fn push_transform(&mut self, delta: Mat4) -> &Frame {
        let top = *self.top();
        self.frames.push(Frame {
            transform: top.transform * delta,
            inverse_scale: top.inverse_scale,
        });
        self.top()
    }

    /// Pushes a frame that advances the transform by `delta` and the inverse
    /// scale by `inverse_delta`.
    pub fn push_scaled(&mut self, delta: Mat4, inverse_delta: Mat4) -> &Frame {
        let top = *self.top();
        self.frames.push(Frame {
            transform: top.transform * delta,
            inverse_scale: top.inverse_scale * inverse_delta,
        });
        self.top()
    }

    /// Opens a branch at the current height.
    pub fn open_branch(&mut self) {
        self.marks.push(self.frames.len());
    }

    /// Closes the innermost branch, returning how many frames were popped.
    ///
    /// Returns `None` and leaves the stack untouched when no branch is open.
    pub fn close_branch(&mut self) -> Option<usize> {
        let Some(mark) = self.marks.pop() else {
            error!("unmatched ']': no open branch to close");
            return None;
        };
        let popped = self.frames.len().saturating_sub(mark);
        self.frames.truncate(mark.max(1));
        Some(popped)
    }

    /// Number of frames, including the root.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Number of branches currently open.
    pub fn open_branches(&self) -> usize {
        self.marks.len()
    }
}
