//! Correctness checks for flow results

pub mod invariants;

pub use self::invariants::{capacity_respected, flow_conserved, min_cut, residual_in_sync, InvariantViolation, MinCut};
