//! # Ampere Core
//!
//! A steady-state DC solver for passive linear circuits.
//!
//! Clients submit a circuit as a graph of nodes and branches, each branch
//! carrying resistors, voltage sources, and current sources; the solver
//! returns node potentials and directional branch currents.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`wire`] - JSON circuit descriptions in, solution payloads out
//! - [`circuit`] - Arena-based circuit graph representation
//! - [`elements`] - Element models and per-branch aggregation
//! - [`solver`] - The three solving strategies and the dense LU engine
//! - [`error`] - Unified error type
//!
//! ## Solving Strategy
//!
//! The dispatcher counts independent loops (`branches - nodes + 1`) and
//! picks the cheapest strategy:
//!
//! 1. A single loop needs no matrix at all: Ohm's law.
//! 2. Fewer nodes than loops: nodal analysis (Kirchhoff's current law),
//!    solving for node potentials.
//! 3. Otherwise: mesh analysis (Kirchhoff's voltage law), solving for loop
//!    currents over a maximum spanning tree's chords.
//!
//! Branches without a resistor ("specific" branches) have undefined
//! conductance and get constraint handling instead of ordinary
//! current-law terms.
//!
//! ## Usage
//!
//! ```no_run
//! use ampere_core::wire;
//!
//! let result = wire::solve_json(r#"{"elements": [
//!     {"type": "resistor", "value": 10.0},
//!     {"type": "voltageSource", "value": 5.0}
//! ]}"#)?;
//! # Ok::<(), ampere_core::AmpereError>(())
//! ```
//!
//! Each request builds its own graph: nothing is shared or reused between
//! solves, so a concurrent boundary can run independent solves in parallel
//! without locking.

pub mod circuit;
pub mod elements;
pub mod error;
pub mod solver;
pub mod wire;

// Re-export main types for convenience
pub use circuit::CircuitGraph;
pub use error::{AmpereError, Result};
pub use solver::{solve, Solution};
pub use wire::{solve_description, CircuitDescription, SolutionResult};
