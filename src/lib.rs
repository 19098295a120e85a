//! Graph-driven, concurrent audit deliberation engine.
//!
//! Tribunal audits a software artifact (a repository plus an accompanying
//! document) by running a fixed workflow graph: a context stage loads the
//! scoring rubric, collector stages gather evidence in parallel, an
//! aggregation stage gates on evidence quality, three reviewer personas
//! deliberate concurrently, and a synthesis stage resolves their opinions
//! into deterministic verdicts and a markdown report.
//!
//! # Architecture
//!
//! - [`graph::GraphBuilder`] assembles stages and edges, then compiles to an
//!   executable [`app::App`] after structural validation (cycles, reachability,
//!   undeclared stages).
//! - [`scheduler::Scheduler`] runs each frontier as a bounded concurrent wave;
//!   stages blocked on incomplete predecessors are deferred to a later wave.
//! - [`reducers::ReducerRegistry`] merges the partial updates produced by a
//!   wave into the shared [`state::AuditState`] at a single-threaded barrier.
//! - [`synthesis`] turns accumulated opinions into final verdicts using
//!   deterministic conflict-resolution rules.
//!
//! Stages never mutate shared state directly: they receive an immutable
//! [`state::StateSnapshot`] and return a [`stage::StagePartial`] describing
//! the channels they want to update.

pub mod app;
pub mod collaborators;
pub mod config;
pub mod errors;
pub mod evidence;
pub mod graph;
pub mod opinion;
pub mod pipeline;
pub mod providers;
pub mod reducers;
pub mod rubric;
pub mod runner;
pub mod scheduler;
pub mod stage;
pub mod stages;
pub mod state;
pub mod synthesis;
pub mod telemetry;
pub mod types;
