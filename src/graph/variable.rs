//! Variable nodes of the bipartite factor graph.

use std::rc::Rc;

use ndarray::IxDyn;

use crate::{
    domain::{Assignment, Scope},
    factor::Factor,
    graph::{FactorGraph, NodeId},
    message::{Message, Multiplicand},
    types::{Domain, Error, FxIndexMap, Result},
};

/// A random variable in the factor graph.
///
/// `parents` are the factors supplying a probability for this variable's
/// value; `children` are the factors consuming this variable as an
/// argument. The split carries no semantics beyond graph traversal — both
/// are simply neighbors — and reflects the originating directed network.
#[derive(Clone, Debug)]
pub struct VariableNode {
    name: String,
    domain: Domain,
    parent_names: Vec<String>,
    child_names: Vec<String>,
    parents: Vec<NodeId>,
    children: Vec<NodeId>,
    mailbox: FxIndexMap<String, Message>,
    sent: FxIndexMap<String, Message>,
    evidence: Option<String>,
}

impl VariableNode {
    /// Creates a new variable node over the given domain, with no declared
    /// neighbors yet. Use [`VariableNode::with_parents`] and
    /// [`VariableNode::with_children`] to wire it up; names may reference
    /// factor nodes not yet constructed, resolved when the
    /// [`FactorGraph`](crate::graph::FactorGraph) itself is built.
    pub fn new(name: impl Into<String>, domain: Domain) -> Self {
        Self {
            name: name.into(),
            domain,
            parent_names: Vec::new(),
            child_names: Vec::new(),
            parents: Vec::new(),
            children: Vec::new(),
            mailbox: FxIndexMap::default(),
            sent: FxIndexMap::default(),
            evidence: None,
        }
    }

    /// Declares the factor nodes that supply a probability for this
    /// variable's value.
    pub fn with_parents<I, S>(mut self, parents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parent_names = parents.into_iter().map(Into::into).collect();
        self
    }

    /// Declares the factor nodes that consume this variable as an argument.
    pub fn with_children<I, S>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.child_names = children.into_iter().map(Into::into).collect();
        self
    }

    /// The variable's name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The variable's domain.
    #[inline]
    pub const fn domain(&self) -> &Domain {
        &self.domain
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

    /// The observed value pinning this variable, if evidence was added.
    #[inline]
    pub fn evidence(&self) -> Option<&str> {
        self.evidence.as_deref()
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

    /// Pins this variable to an observed value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValueNotInDomain`] if `value` is not in this
    /// variable's domain.
    pub fn add_evidence(&mut self, value: impl Into<String>) -> Result<()> {
        let value = value.into();
        if !self.domain.contains(&value) {
            return Err(Error::ValueNotInDomain {
                variable: self.name.clone(),
                value,
            });
        }
        self.evidence = Some(value);
        Ok(())
    }

    /// Clears mailboxes, sent-message records, and the evidence pin.
    pub(crate) fn reset(&mut self) {
        self.mailbox.clear();
        self.sent.clear();
        self.evidence = None;
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

    /// Builds the indicator factor `1{self == value}` used to express
    /// evidence as an ordinary multiplicand, without mutating graph
    /// topology.
    fn indicator(&self, value: &str) -> Result<Factor> {
        let position = self
            .domain
            .get_index_of(value)
            .ok_or_else(|| Error::ValueNotInDomain {
                variable: self.name.clone(),
                value: value.to_string(),
            })?;

        let mut table = ndarray::ArrayD::zeros(IxDyn(&[self.domain.len()]));
        table[IxDyn(&[position])] = 1.0;

        let mut scope = Scope::default();
        scope.insert(self.name.clone(), self.domain.clone());

        Factor::new(format!("{}#evidence", self.name), scope, table)
    }

    /// Constructs the outgoing message to [`VariableNode::get_target`]'s
    /// destination: the product of incoming messages from every neighbor
    /// except the destination (and, if evidence is pinned, the indicator
    /// factor), performing no summation — the variable-to-factor rule of
    /// sum-product.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SchedulingStall`] if this node is not yet ready to
    /// send.
    pub fn construct_message(&self, graph: &FactorGraph) -> Result<Message> {
        let destination = self.get_target(graph).ok_or(Error::SchedulingStall)?;
        let destination_name = graph.name_of(destination).to_string();

        let mut factors = Vec::new();
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

        let informative = !factors.is_empty() || self.evidence.is_some();

        if let Some(value) = &self.evidence {
            factors.push(Multiplicand::Factor(Rc::new(self.indicator(value)?)));
        }

        let argspec = if informative {
            vec![self.name.clone()]
        } else {
            Vec::new()
        };

        if factors.is_empty() {
            factors.push(Multiplicand::Constant(1.0));
        }

        Ok(Message {
            source: self.name.clone(),
            destination: destination_name,
            argspec,
            factors,
        })
    }

    /// The unnormalized marginal of this variable at `value`: the product,
    /// over every neighbor, of that neighbor's most recent message
    /// evaluated at `{self.name: value}` (and, if evidence is pinned, the
    /// indicator factor), divided by `normalizer`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValueNotInDomain`] if `value` is outside this
    /// variable's domain, [`Error::SchedulingStall`] if propagation has not
    /// completed, or [`Error::ZeroNormalizer`] if `normalizer` is zero.
    pub fn marginal(&self, graph: &FactorGraph, value: &str, normalizer: f64) -> Result<f64> {
        if !self.domain.contains(value) {
            return Err(Error::ValueNotInDomain {
                variable: self.name.clone(),
                value: value.to_string(),
            });
        }
        if normalizer == 0.0 {
            return Err(Error::ZeroNormalizer(self.name.clone()));
        }

        let mut assignment = Assignment::default();
        assignment.insert(self.name.clone(), value.to_string());

        let mut product = 1.0;
        for neighbor in self.neighbors() {
            let neighbor_name = graph.name_of(neighbor);
            let message = self
                .mailbox
                .get(neighbor_name)
                .ok_or(Error::SchedulingStall)?;
            product *= message.evaluate(&assignment)?;
        }
        if let Some(observed) = &self.evidence {
            product *= self.indicator(observed)?.evaluate(&assignment)?;
        }

        Ok(product / normalizer)
    }

    /// A human-readable summary of this node's mailbox, for diagnostics.
    pub fn message_report(&self) -> String {
        let mut lines = vec![format!("variable `{}` ({} values)", self.name, self.domain.len())];
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

#[cfg(test)]
mod tests {
    use super::*;

    fn domain() -> Domain {
        ["True", "False"].iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn duplicate_delivery_from_same_neighbor_is_rejected() {
        let mut v = VariableNode::new("x", domain());
        v.receive(Message::identity("fA", "x")).unwrap();
        let err = v.receive(Message::identity("fA", "x")).unwrap_err();
        assert!(matches!(err, Error::DuplicateDelivery { .. }));
    }
}
