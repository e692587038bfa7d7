//! Factor functions: pure, total, referentially transparent mappings from an
//! assignment of declared arguments to a non-negative real.

use ndarray::{ArrayD, IxDyn};

use crate::{
    domain::{Assignment, Scope},
    types::{Error, Result},
};

/// A factor function, represented as a dense table over the cartesian
/// product of its declared arguments' domains.
///
/// This is the one representation used throughout the crate for both priors
/// (zero-argument-parent factors) and conditionals: a conditional `P(X | Z)`
/// is simply a factor whose scope is `Z` followed by `X`.
#[derive(Clone, Debug, PartialEq)]
pub struct Factor {
    name: String,
    scope: Scope,
    table: ArrayD<f64>,
}

impl Factor {
    /// Creates a new factor function.
    ///
    /// # Arguments
    ///
    /// * `name` - A unique name for this factor.
    /// * `scope` - The ordered argument names and their domains; the table's
    ///   axes must appear in this same order.
    /// * `table` - The non-negative values of the factor, one per
    ///   combination of argument values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] if `table`'s shape does not match the
    /// shape implied by `scope`.
    pub fn new(name: impl Into<String>, scope: Scope, table: ArrayD<f64>) -> Result<Self> {
        let name = name.into();
        let expected: Vec<usize> = scope.values().map(|d| d.len()).collect();

        if table.shape() != expected.as_slice() {
            return Err(Error::ShapeMismatch {
                factor: name,
                expected,
                found: table.shape().to_vec(),
            });
        }

        Ok(Self { name, scope, table })
    }

    /// The factor's name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The factor's declared arguments and their domains, in table-axis order.
    #[inline]
    pub const fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Evaluates the factor at an assignment.
    ///
    /// The assignment must cover at least every argument in this factor's
    /// scope; extra entries for variables outside the scope are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownNode`] if the assignment is missing a value
    /// for one of this factor's declared arguments, or
    /// [`Error::ValueNotInDomain`] if a supplied value is outside that
    /// argument's domain.
    pub fn evaluate(&self, assignment: &Assignment) -> Result<f64> {
        let mut index = Vec::with_capacity(self.scope.len());

        for (argument, domain) in &self.scope {
            let value = assignment
                .get(argument)
                .ok_or_else(|| Error::UnknownNode(argument.clone()))?;
            let position = domain
                .get_index_of(value)
                .ok_or_else(|| Error::ValueNotInDomain {
                    variable: argument.clone(),
                    value: value.clone(),
                })?;
            index.push(position);
        }

        Ok(self.table[IxDyn(&index)])
    }
}
