#![warn(missing_docs)]
//! # sum-product-bn
//!
//! Exact marginal inference over discrete Bayesian networks via factor-graph
//! reduction and sum-product belief propagation.
//!
//! A [`graph::FactorGraph`] is a bipartite tree of [`graph::VariableNode`]s
//! and [`graph::FactorNode`]s. [`graph::FactorGraph::propagate`] runs the
//! sum-product algorithm to completion by passing [`message::Message`]s
//! along every edge in both directions; [`graph::FactorGraph::marginal`]
//! then reads off each variable's normalized marginal distribution.
//! [`graph::FactorGraph::add_evidence`] pins a variable to an observed
//! value without altering graph topology, and
//! [`graph::FactorGraph::reset`] clears mailboxes and evidence so the same
//! graph can be reused for a new query.

/// Cartesian-product enumeration over argument domains.
pub mod domain;
/// Factor functions: dense tables over a cartesian product of domains.
pub mod factor;
/// The bipartite factor graph of variable and factor nodes.
pub mod graph;
/// The marginalization engine shared by message construction and queries.
pub mod marginalize;
/// Messages passed along graph edges during propagation.
pub mod message;
/// Support types: error taxonomy and fast, order-preserving collections.
pub mod types;
