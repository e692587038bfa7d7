use thiserror::Error;

/// The error type for this crate.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A variable or factor name does not exist in the graph.
    #[error("unknown node `{0}`")]
    UnknownNode(String),
    /// A factor declares an argument with no corresponding incident variable edge.
    #[error(
        "factor `{factor}` declares argument `{argument}` with no corresponding variable node"
    )]
    DanglingArgument {
        /// The factor declaring the argument.
        factor: String,
        /// The undeclared argument.
        argument: String,
    },
    /// A variable's `parents`/`children` list disagrees with a factor's own list.
    #[error(
        "edge between `{variable}` and `{factor}` is inconsistent: \
         variable and factor disagree on its direction"
    )]
    InconsistentEdges {
        /// The variable endpoint.
        variable: String,
        /// The factor endpoint.
        factor: String,
    },
    /// Two factors declare different domains for the same variable.
    #[error("variable `{variable}` has conflicting domains: {expected:?} != {found:?}")]
    DomainMismatch {
        /// The variable with conflicting domains.
        variable: String,
        /// The domain first observed.
        expected: Vec<String>,
        /// The conflicting domain observed afterwards.
        found: Vec<String>,
    },
    /// A caller passed a value outside a variable's domain.
    #[error("value `{value}` is not in the domain of variable `{variable}`")]
    ValueNotInDomain {
        /// The variable being queried or pinned.
        variable: String,
        /// The offending value.
        value: String,
    },
    /// The graph is not a tree (disconnected, or contains a cycle).
    #[error("graph is not a tree: {0}")]
    NotATree(String),
    /// `get_eligible_senders` became empty before every edge carried a
    /// message in both directions.
    #[error("scheduling stalled: not every edge has carried a message in both directions")]
    SchedulingStall,
    /// A mailbox entry on one edge was about to be overwritten within a
    /// single propagation.
    #[error("node `{node}` already received a message from `{neighbor}` in this propagation")]
    DuplicateDelivery {
        /// The node whose mailbox would be overwritten.
        node: String,
        /// The neighbor that already delivered a message this propagation.
        neighbor: String,
    },
    /// A caller attempted to normalize a marginal by zero.
    #[error("normalizer is zero: cannot normalize the marginal of `{0}`")]
    ZeroNormalizer(String),
    /// A shape mismatch between a factor's declared scope and its table.
    #[error("factor `{factor}` table shape {found:?} does not match its scope shape {expected:?}")]
    ShapeMismatch {
        /// The factor with the mismatched table.
        factor: String,
        /// The shape implied by the factor's scope.
        expected: Vec<usize>,
        /// The shape of the supplied table.
        found: Vec<usize>,
    },
}

/// A specialized [`Result`] type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
