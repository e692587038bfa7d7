//! Factor nodes of the bipartite factor graph.

use std::rc::Rc;

use crate::{
    factor::Factor,
    graph::{FactorGraph, NodeId},
    message::{Message, Multiplicand},
    types::{Error, FxIndexMap, Result},
};

/// A factor function's place in the graph.
///
/// `parents` are the variable nodes this factor's function takes as
/// arguments but does not itself constrain via a direct edge label beyond
/// membership; `children` likewise. As with [`VariableNode`](crate::graph::VariableNode),
/// the split is purely topological bookkeeping inherited from the
/// originating directed network and carries no special sum-product meaning.
#[derive(Clone, Debug)]
pub struct FactorNode {
    name: String,
    func: Rc<Factor>,
    parent_names: Vec<String>,
    child_names: Vec<String>,
    parents: Vec<NodeId>,
    children: Vec<NodeId>,
    mailbox: FxIndexMap<String, Message>,
    sent: FxIndexMap<String, Message>,
}

impl FactorNode {
    /// Creates a new factor node wrapping `func`, with no declared neighbors
    /// yet. Use [`FactorNode::with_parents`] and [`FactorNode::with_children`]
    /// to wire it up by name, resolved when the
    /// [`FactorGraph`](crate::graph::FactorGraph) itself is built.
    pub fn new(name: impl Into<String>, func: Factor) -> Self {
        Self {
            name: name.into(),
            func: Rc::new(func),
            parent_names: Vec::new(),
            child_names: Vec::new(),
            parents: Vec::new(),
            children: Vec::new(),
            mailbox: FxIndexMap::default(),
            sent: FxIndexMap::default(),
        }
    }

    /// Declares the variable nodes this factor receives from as parents.
    pub fn with_parents<I, S>(mut self, parents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parent_names = parents.into_iter().map(Into::into).collect();
        self
    }

    /// Declares the variable nodes this factor receives from as children.
    pub fn with_children<I, S>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.child_names = children.into_iter().map(Into::into).collect();
        self
    }

    /// The factor node's name. By convention distinct from the wrapped
    /// [`Factor::name`], though nothing enforces that.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The wrapped factor function.
    #[inline]
    pub fn function(&self) -> &Factor {
        &self.func
    }

    pub(crate) fn parent_names(&self) -> &[String] {
        &self.parent_names
    }

    pub(crate) fn child_names(&self) -> &[String] {
        &self.child_names
    }

    pub(crate) fn set_resolved_edges(&mut self, parents: Vec<NodeId>, children: Vec<NodeId>) {
        self.parents = parents;
        self.children = children;
    }

    pub(crate) fn neighbors(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.parents.iter().chain(self.children.iter()).copied()
    }

    /// True iff this node has at most one incident edge.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.parents.len() + self.children.len() <= 1
    }

    /// The most recently received message from each neighbor, keyed by
    /// neighbor name.
    #[inline]
    pub fn received_messages(&self) -> &FxIndexMap<String, Message> {
        &self.mailbox
    }

    /// The messages this node has itself sent this propagation, keyed by
    /// destination name.
    #[inline]
    pub fn sent_messages(&self) -> &FxIndexMap<String, Message> {
        &self.sent
    }

    /// Returns the unique neighbor eligible to receive a message now, or
    /// `None` if this node is not yet ready to send: it may send to `v` iff
    /// it has received messages from every other neighbor.
    pub fn get_target(&self, graph: &FactorGraph) -> Option<NodeId> {
        let mut missing = self.neighbors().filter(|&n| {
            let name = graph.name_of(n);
            !self.mailbox.contains_key(name)
        });
        let first = missing.next()?;
        match missing.next() {
            None => Some(first),
            Some(_) => None,
        }
    }

    /// Clears mailboxes and sent-message records.
    pub(crate) fn reset(&mut self) {
        self.mailbox.clear();
        self.sent.clear();
    }

    /// Delivers a received message into this node's mailbox.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateDelivery`] if a message from the same
    /// neighbor was already delivered this propagation.
    pub(crate) fn receive(&mut self, message: Message) -> Result<()> {
        if self.mailbox.contains_key(&message.source) {
            return Err(Error::DuplicateDelivery {
                node: self.name.clone(),
                neighbor: message.source.clone(),
            });
        }
        self.mailbox.insert(message.source.clone(), message);
        Ok(())
    }

    /// Records a message this node has sent, for readiness/scheduling
    /// bookkeeping.
    pub(crate) fn record_sent(&mut self, message: Message) {
        self.sent.insert(message.destination.clone(), message);
    }

    /// Constructs the outgoing message to [`FactorNode::get_target`]'s
    /// destination: the own factor function, together with the incoming
    /// messages from every neighbor except the destination, restricted to
    /// the destination's name — the factor-to-variable rule of sum-product.
    /// Summation over every other declared argument is deferred to the
    /// message's own evaluation (see [`crate::marginalize`]).
    ///
    /// # Errors
    ///
    /// Returns [`Error::SchedulingStall`] if this node is not yet ready to
    /// send.
    pub fn construct_message(&self, graph: &FactorGraph) -> Result<Message> {
        let destination = self.get_target(graph).ok_or(Error::SchedulingStall)?;
        let destination_name = graph.name_of(destination).to_string();

        let mut factors = vec![Multiplicand::Factor(Rc::clone(&self.func))];
        for neighbor in self.neighbors() {
            if neighbor == destination {
                continue;
            }
            let neighbor_name = graph.name_of(neighbor);
            let incoming = self
                .mailbox
                .get(neighbor_name)
                .ok_or(Error::SchedulingStall)?;
            factors.extend(incoming.factors.iter().cloned());
        }

        let argspec = vec![destination_name.clone()];

        Ok(Message {
            source: self.name.clone(),
            destination: destination_name,
            argspec,
            factors,
        })
    }

    /// A human-readable summary of this node's mailbox, for diagnostics.
    pub fn message_report(&self) -> String {
        let mut lines = vec![format!("factor `{}` ({})", self.name, self.func.name())];
        for (neighbor, message) in &self.mailbox {
            lines.push(format!(
                "  from {neighbor}: argspec={:?} factors={}",
                message.argspec,
                message.factors.len()
            ));
        }
        lines.join("\n")
    }
}
