//! Workflow graph construction and compilation.
//!
//! [`builder::GraphBuilder`] collects stage registrations and edge
//! declarations; [`GraphBuilder::compile`] validates the topology and
//! produces an executable [`crate::app::App`].

pub mod builder;
pub mod compilation;
pub mod edges;

pub use builder::GraphBuilder;
pub use compilation::GraphError;
pub use edges::{ConditionalEdge, Route, RoutePredicate};
