//! fusion-search - the concurrent best-first search tree plus the
//! bounded perfect-clear sub-search.

mod hash;
mod node;
mod pc;
mod tree;

pub use hash::state_hash;
pub use node::{Children, Edge, Node, WeakNode};
pub use pc::{PcPlan, PcSearchResult};
pub use tree::{PcPriority, SearchConfig, SearchTree};
