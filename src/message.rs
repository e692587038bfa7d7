//! Messages: partial factors sent along one edge in one direction.

use std::rc::Rc;

use crate::{
    domain::{Assignment, Scope},
    factor::Factor,
    marginalize,
    types::Result,
};

/// One multiplicand of a [`Message`]'s product.
///
/// Either a numeric constant — the identity `1` used by leaf variable nodes
/// — or a factor function with its own declared argument list.
#[derive(Clone, Debug)]
pub enum Multiplicand {
    /// A constant value, contributed unchanged regardless of assignment.
    Constant(f64),
    /// A factor function, evaluated at the restriction of an assignment to
    /// its own declared arguments.
    Factor(Rc<Factor>),
}

impl Multiplicand {
    /// The scope this multiplicand is declared over; empty for a constant.
    pub fn scope(&self) -> Scope {
        match self {
            Self::Constant(_) => Scope::default(),
            Self::Factor(f) => f.scope().clone(),
        }
    }

    /// Evaluates this multiplicand at an assignment covering (at least) its
    /// declared arguments.
    pub fn evaluate(&self, assignment: &Assignment) -> Result<f64> {
        match self {
            Self::Constant(c) => Ok(*c),
            Self::Factor(f) => f.evaluate(assignment),
        }
    }
}

/// A partial factor sent from `source` to `destination` along one edge.
///
/// Evaluating a message at an assignment of its `argspec` sums, over every
/// free variable declared by some multiplicand but absent from `argspec`,
/// the product of the multiplicands — see [`crate::marginalize`].
#[derive(Clone, Debug)]
pub struct Message {
    /// The sending node's name.
    pub source: String,
    /// The receiving node's name.
    pub destination: String,
    /// The free variables this message is a function of.
    pub argspec: Vec<String>,
    /// The ordered list of multiplicands whose product (after marginalizing
    /// out every variable not in `argspec`) is this message's value.
    pub factors: Vec<Multiplicand>,
}

impl Message {
    /// Builds the identity message: `argspec = []`, `factors = [1]`.
    ///
    /// Sent by a leaf variable node with no evidence: it carries no
    /// information beyond "marginalize me out".
    pub fn identity(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            argspec: Vec::new(),
            factors: vec![Multiplicand::Constant(1.0)],
        }
    }

    /// Evaluates this message at an assignment of (at least) its `argspec`.
    pub fn evaluate(&self, assignment: &Assignment) -> Result<f64> {
        marginalize::sum_product(&self.argspec, &self.factors, assignment)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;
    use crate::domain::Scope;

    fn domain(values: &[&str]) -> crate::types::Domain {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn identity_message_evaluates_to_one() -> Result<()> {
        let message = Message::identity("x4", "fD");
        assert_eq!(message.argspec, Vec::<String>::new());
        assert_eq!(message.evaluate(&Assignment::default())?, 1.0);
        Ok(())
    }

    #[test]
    fn message_wrapping_a_factor_evaluates_the_factor() -> Result<()> {
        let mut scope = Scope::default();
        scope.insert("x1".to_string(), domain(&["True", "False"]));
        let factor = Factor::new("fA", scope, array![0.1, 0.9].into_dyn())?;

        let message = Message {
            source: "fA".to_string(),
            destination: "x1".to_string(),
            argspec: vec!["x1".to_string()],
            factors: vec![Multiplicand::Factor(Rc::new(factor))],
        };

        let mut a = Assignment::default();
        a.insert("x1".to_string(), "True".to_string());
        assert_eq!(message.evaluate(&a)?, 0.1);

        Ok(())
    }
}
