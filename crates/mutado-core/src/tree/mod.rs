//! Configuration tree: nodes, edges, and traversal
//!
//! The navigable tree of path nodes mirroring a data model's shape, the
//! edges connecting them, and the traveler that resolves compound access
//! expressions into nodes.
//!
//! Copyright (c) 2025 Mutado Team
//! Licensed under the Apache-2.0 license

pub mod edge;
pub mod node;
pub mod traveler;

pub use edge::{Edge, ARRAY_LENGTH};
pub use node::{Attached, ConfigTree, NodeId};
pub use traveler::{Travelled, TreeTraveler};
