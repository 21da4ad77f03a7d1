//! YANG-shaped tree engine: the hierarchical path map, the data selector,
//! and the data tree RPC interfaces.

pub mod pathmap;
pub mod rpc;
pub mod select;

pub use pathmap::{KeyedList, Node, PathError, PathMap};
pub use rpc::{DataRead, DataWrite};
pub use select::{SelectError, Selector};
