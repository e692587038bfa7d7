//! The bipartite factor graph: variable nodes and factor nodes connected by
//! undirected edges, owned in a single arena.
//!
//! The graph owns every node; no node owns another. Edges are recorded
//! twice, once on each endpoint, and validated for mutual consistency when
//! the graph is built.

mod factor_node;
mod variable;

pub use factor_node::FactorNode;
pub use variable::VariableNode;

use log::{debug, trace};

use crate::{
    message::Message,
    types::{Error, FxIndexMap, Result},
};

/// An index into a [`FactorGraph`]'s node arena.
pub type NodeId = usize;

/// Either kind of node in the bipartite graph.
#[derive(Clone, Debug)]
pub enum Node {
    /// A random variable.
    Variable(VariableNode),
    /// A factor function.
    Factor(FactorNode),
}

impl Node {
    fn name(&self) -> &str {
        match self {
            Self::Variable(v) => v.name(),
            Self::Factor(f) => f.name(),
        }
    }

    fn parent_names(&self) -> &[String] {
        match self {
            Self::Variable(v) => v.parent_names(),
            Self::Factor(f) => f.parent_names(),
        }
    }

    fn child_names(&self) -> &[String] {
        match self {
            Self::Variable(v) => v.child_names(),
            Self::Factor(f) => f.child_names(),
        }
    }

    fn set_resolved_edges(&mut self, parents: Vec<NodeId>, children: Vec<NodeId>) {
        match self {
            Self::Variable(v) => v.set_resolved_edges(parents, children),
            Self::Factor(f) => f.set_resolved_edges(parents, children),
        }
    }

    fn neighbors(&self) -> Vec<NodeId> {
        match self {
            Self::Variable(v) => v.neighbors().collect(),
            Self::Factor(f) => f.neighbors().collect(),
        }
    }

    fn is_leaf(&self) -> bool {
        match self {
            Self::Variable(v) => v.is_leaf(),
            Self::Factor(f) => f.is_leaf(),
        }
    }

    fn get_target(&self, graph: &FactorGraph) -> Option<NodeId> {
        match self {
            Self::Variable(v) => v.get_target(graph),
            Self::Factor(f) => f.get_target(graph),
        }
    }

    fn construct_message(&self, graph: &FactorGraph) -> Result<Message> {
        match self {
            Self::Variable(v) => v.construct_message(graph),
            Self::Factor(f) => f.construct_message(graph),
        }
    }

    fn receive(&mut self, message: Message) -> Result<()> {
        match self {
            Self::Variable(v) => v.receive(message),
            Self::Factor(f) => f.receive(message),
        }
    }

    fn record_sent(&mut self, message: Message) {
        match self {
            Self::Variable(v) => v.record_sent(message),
            Self::Factor(f) => f.record_sent(message),
        }
    }

    fn reset(&mut self) {
        match self {
            Self::Variable(v) => v.reset(),
            Self::Factor(f) => f.reset(),
        }
    }

    /// A human-readable summary of this node's mailbox, for diagnostics.
    pub fn message_report(&self) -> String {
        match self {
            Self::Variable(v) => v.message_report(),
            Self::Factor(f) => f.message_report(),
        }
    }
}

impl From<VariableNode> for Node {
    fn from(v: VariableNode) -> Self {
        Self::Variable(v)
    }
}

impl From<FactorNode> for Node {
    fn from(f: FactorNode) -> Self {
        Self::Factor(f)
    }
}

/// A bipartite factor graph of variable and factor nodes, validated to be a
/// tree at construction time.
#[derive(Clone, Debug)]
pub struct FactorGraph {
    nodes: Vec<Node>,
    name_to_id: FxIndexMap<String, NodeId>,
}

impl FactorGraph {
    /// Builds a factor graph from a collection of variable and factor nodes,
    /// resolving their string-named `parents`/`children` declarations into
    /// [`NodeId`]s and validating the result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotATree`] if any two nodes share a name, if the
    /// graph is disconnected, or if it contains a cycle (edge count must be
    /// exactly `nodes.len() - 1` for a connected graph to be a tree);
    /// [`Error::UnknownNode`] if a declared neighbor name does not resolve
    /// to any node; [`Error::DanglingArgument`] if a factor's own declared
    /// scope names an argument with no corresponding variable edge;
    /// [`Error::InconsistentEdges`] if a variable and a factor disagree on
    /// the direction of the edge between them; [`Error::DomainMismatch`] if
    /// two factors disagree on a shared variable's domain.
    pub fn new(nodes: impl IntoIterator<Item = Node>) -> Result<Self> {
        let nodes: Vec<Node> = nodes.into_iter().collect();

        let mut name_to_id = FxIndexMap::default();
        for (id, node) in nodes.iter().enumerate() {
            if name_to_id.insert(node.name().to_string(), id).is_some() {
                return Err(Error::NotATree(format!(
                    "duplicate node name `{}`",
                    node.name()
                )));
            }
        }

        let resolve = |names: &[String]| -> Result<Vec<NodeId>> {
            names
                .iter()
                .map(|n| {
                    name_to_id
                        .get(n)
                        .copied()
                        .ok_or_else(|| Error::UnknownNode(n.clone()))
                })
                .collect()
        };

        let mut resolved: Vec<(Vec<NodeId>, Vec<NodeId>)> = Vec::with_capacity(nodes.len());
        for node in &nodes {
            resolved.push((resolve(node.parent_names())?, resolve(node.child_names())?));
        }

        let mut nodes = nodes;
        for (node, (parents, children)) in nodes.iter_mut().zip(resolved) {
            node.set_resolved_edges(parents, children);
        }

        let graph = Self { nodes, name_to_id };
        graph.validate_topology()?;

        debug!(
            "built factor graph with {} nodes, {} edges",
            graph.nodes.len(),
            graph.edge_count()
        );

        Ok(graph)
    }

    fn edge_count(&self) -> usize {
        self.nodes.iter().map(|n| n.neighbors().len()).sum::<usize>() / 2
    }

    fn validate_topology(&self) -> Result<()> {
        for (id, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Factor(factor) => {
                    let neighbors: Vec<NodeId> = node.neighbors();
                    for argument in factor.function().scope().keys() {
                        let argument_id = self.name_to_id.get(argument).ok_or_else(|| {
                            Error::DanglingArgument {
                                factor: factor.name().to_string(),
                                argument: argument.clone(),
                            }
                        })?;
                        if !neighbors.contains(argument_id) {
                            return Err(Error::DanglingArgument {
                                factor: factor.name().to_string(),
                                argument: argument.clone(),
                            });
                        }
                    }
                    for &neighbor in &neighbors {
                        let variable = match &self.nodes[neighbor] {
                            Node::Variable(v) => v,
                            Node::Factor(_) => {
                                return Err(Error::InconsistentEdges {
                                    variable: self.nodes[neighbor].name().to_string(),
                                    factor: factor.name().to_string(),
                                })
                            }
                        };
                        if !variable.neighbors().any(|n| n == id) {
                            return Err(Error::InconsistentEdges {
                                variable: variable.name().to_string(),
                                factor: factor.name().to_string(),
                            });
                        }
                        if let Some(declared) = factor.function().scope().get(variable.name()) {
                            if declared != variable.domain() {
                                return Err(Error::DomainMismatch {
                                    variable: variable.name().to_string(),
                                    expected: declared.iter().cloned().collect(),
                                    found: variable.domain().iter().cloned().collect(),
                                });
                            }
                        }
                    }
                }
                Node::Variable(variable) => {
                    for &neighbor in &node.neighbors() {
                        if !matches!(&self.nodes[neighbor], Node::Factor(_)) {
                            return Err(Error::InconsistentEdges {
                                variable: variable.name().to_string(),
                                factor: self.nodes[neighbor].name().to_string(),
                            });
                        }
                    }
                }
            }
        }

        let n = self.nodes.len();
        if n == 0 {
            return Ok(());
        }
        if self.edge_count() != n - 1 {
            return Err(Error::NotATree(format!(
                "expected {} edges for {n} nodes, found {}",
                n - 1,
                self.edge_count()
            )));
        }
        if !self.is_connected() {
            return Err(Error::NotATree("graph is disconnected".to_string()));
        }

        Ok(())
    }

    fn is_connected(&self) -> bool {
        if self.nodes.is_empty() {
            return true;
        }
        let mut visited = vec![false; self.nodes.len()];
        let mut stack = vec![0usize];
        visited[0] = true;
        let mut count = 1;
        while let Some(id) = stack.pop() {
            for neighbor in self.nodes[id].neighbors() {
                if !visited[neighbor] {
                    visited[neighbor] = true;
                    count += 1;
                    stack.push(neighbor);
                }
            }
        }
        count == self.nodes.len()
    }

    /// Resolves a node's name to its id.
    pub fn id_of(&self, name: &str) -> Option<NodeId> {
        self.name_to_id.get(name).copied()
    }

    /// Resolves a node id to its name.
    pub fn name_of(&self, id: NodeId) -> &str {
        self.nodes[id].name()
    }

    /// Borrows a node by id.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    /// Borrows a node by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownNode`] if `name` does not resolve.
    pub fn node_by_name(&self, name: &str) -> Result<&Node> {
        self.id_of(name)
            .map(|id| &self.nodes[id])
            .ok_or_else(|| Error::UnknownNode(name.to_string()))
    }

    /// Iterates every node id in the graph, in arena order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        0..self.nodes.len()
    }

    /// The nodes with exactly one (or zero) incident edges.
    pub fn get_leaves(&self) -> Vec<NodeId> {
        self.node_ids().filter(|&id| self.nodes[id].is_leaf()).collect()
    }

    /// The nodes currently ready to send a message: those with a non-`None`
    /// [`get_target`](VariableNode::get_target) whose message to that target
    /// has not already been sent.
    pub fn get_eligible_senders(&self) -> Vec<NodeId> {
        self.node_ids()
            .filter_map(|id| {
                let node = &self.nodes[id];
                let target = node.get_target(self)?;
                let target_name = self.name_of(target);
                let already_sent = match node {
                    Node::Variable(v) => v.sent_messages().contains_key(target_name),
                    Node::Factor(f) => f.sent_messages().contains_key(target_name),
                };
                (!already_sent).then_some(id)
            })
            .collect()
    }

    /// Computes every currently eligible sender's message from a snapshot of
    /// the mailbox state, then delivers the whole round at once, returning
    /// the number of messages delivered (zero once propagation is complete).
    ///
    /// Messages are computed before any are delivered within a round so
    /// that no node's readiness or mailbox contents shift mid-round: any
    /// order among a round's eligible senders yields the same final
    /// mailbox contents. Exposed as a standalone step (rather than folded
    /// entirely into [`FactorGraph::propagate`]) so a caller — or a test —
    /// can observe the graph's readiness between rounds.
    ///
    /// # Errors
    ///
    /// Propagates any error raised while constructing or delivering a
    /// round's messages.
    pub fn step(&mut self) -> Result<usize> {
        let eligible = self.get_eligible_senders();
        if eligible.is_empty() {
            return Ok(0);
        }

        trace!("propagation round: {} eligible senders", eligible.len());

        let mut round = Vec::with_capacity(eligible.len());
        for sender in eligible {
            let message = self.nodes[sender].construct_message(self)?;
            round.push((sender, message));
        }

        for (sender, message) in &round {
            let destination = self
                .id_of(&message.destination)
                .ok_or_else(|| Error::UnknownNode(message.destination.clone()))?;
            self.nodes[destination].receive(message.clone())?;
            self.nodes[*sender].record_sent(message.clone());
            trace!("{}", self.nodes[destination].message_report());
        }

        Ok(round.len())
    }

    /// Runs sum-product to completion by calling [`FactorGraph::step`] until
    /// no sender remains eligible.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SchedulingStall`] if propagation halts before every
    /// edge has carried a message in both directions — this should not
    /// happen on a graph [`FactorGraph::new`] accepted, and indicates a bug
    /// rather than a caller error.
    pub fn propagate(&mut self) -> Result<()> {
        while self.step()? > 0 {}

        let total_edges = self.edge_count();
        let delivered: usize = self
            .node_ids()
            .map(|id| match &self.nodes[id] {
                Node::Variable(v) => v.sent_messages().len(),
                Node::Factor(f) => f.sent_messages().len(),
            })
            .sum();
        if delivered != 2 * total_edges {
            return Err(Error::SchedulingStall);
        }

        debug!("propagation complete: {delivered} messages delivered");
        Ok(())
    }

    /// Clears every node's mailbox, sent-message record, and evidence pin,
    /// without altering graph topology. Always succeeds.
    pub fn reset(&mut self) {
        for node in &mut self.nodes {
            node.reset();
        }
    }

    /// Pins a variable node to an observed value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownNode`] if `variable` does not resolve to a
    /// variable node, or [`Error::ValueNotInDomain`] if `value` is outside
    /// its domain.
    pub fn add_evidence(&mut self, variable: &str, value: impl Into<String>) -> Result<()> {
        let id = self
            .id_of(variable)
            .ok_or_else(|| Error::UnknownNode(variable.to_string()))?;
        match &mut self.nodes[id] {
            Node::Variable(v) => v.add_evidence(value),
            Node::Factor(_) => Err(Error::UnknownNode(variable.to_string())),
        }
    }

    /// The marginal distribution of a variable, normalized to sum to one
    /// over its domain.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownNode`] if `variable` does not resolve to a
    /// variable node, [`Error::SchedulingStall`] if [`FactorGraph::propagate`]
    /// has not yet been run to completion, or [`Error::ZeroNormalizer`] if
    /// every value's unnormalized marginal is zero.
    pub fn marginal(&self, variable: &str) -> Result<FxIndexMap<String, f64>> {
        let id = self
            .id_of(variable)
            .ok_or_else(|| Error::UnknownNode(variable.to_string()))?;
        let node = match &self.nodes[id] {
            Node::Variable(v) => v,
            Node::Factor(_) => return Err(Error::UnknownNode(variable.to_string())),
        };

        let mut unnormalized = FxIndexMap::default();
        let mut total = 0.0;
        for value in node.domain() {
            let p = node.marginal(self, value, 1.0)?;
            total += p;
            unnormalized.insert(value.clone(), p);
        }

        if total == 0.0 {
            return Err(Error::ZeroNormalizer(variable.to_string()));
        }

        for p in unnormalized.values_mut() {
            *p /= total;
        }
        Ok(unnormalized)
    }

    /// A human-readable, full report of every node's received messages, for
    /// diagnostics.
    pub fn message_report(&self) -> String {
        self.nodes
            .iter()
            .map(Node::message_report)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
