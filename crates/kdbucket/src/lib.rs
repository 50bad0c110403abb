#![doc = include_str!("../README.md")]
#![allow(clippy::bool_comparison)]

pub mod accessor;
pub mod error;
pub mod macros;
pub mod param;
pub mod primitive;
pub mod tree;

// Reexport necessary items.
pub use accessor::{Accessor, Axes, FnAccessor, Point};
pub use error::{DeleteError, DimensionNotFound, ParameterError};
pub use param::TreeParameter;
pub use tree::{Dump, NodeRef, Tree, TreeEvent, TreeNodeIndex};

pub extern crate num;
