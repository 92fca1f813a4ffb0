//! # symbios-tree
//!
//! Procedural trees from stochastic L-Systems, for [Symbios](https://crates.io/crates/symbios)
//! and standalone use.
//!
//! The pipeline has three stages: [`grammar::expand`] rewrites an axiom into an
//! instruction string, [`TreeInterpreter`] walks that string as a turtle program
//! and places branch and leaf instances as `glam` matrices, and [`ObjExporter`]
//! bakes those instances into a Wavefront OBJ document. [`TreeGenerator`] ties the
//! stages to a [`TreeConfig`] for hosts that regenerate on demand.

pub mod config;
pub mod error;
pub mod export;
pub mod generator;
pub mod grammar;
pub mod interpreter;
pub mod mesh;
pub mod random;
pub mod turtle;

pub use config::*;
pub use error::*;
pub use export::*;
pub use generator::*;
pub use grammar::*;
pub use interpreter::*;
pub use mesh::*;
pub use random::*;
pub use turtle::*;
