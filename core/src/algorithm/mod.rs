//! Flow algorithms over rail networks
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

pub mod traits;
pub mod graph;
pub mod state;

pub use self::traits::*;
pub use self::graph::*;
pub use self::state::{bottleneck, SearchState};
