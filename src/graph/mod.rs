//! In-memory model of an experiment graph and its wire codec.

pub mod codec;
pub mod index;
pub mod model;
pub mod port;

pub use codec::{parse, serialize};
pub use index::{GraphIndex, GraphIssue, validate};
pub use model::*;
pub use port::*;
