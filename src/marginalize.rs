//! The marginalization engine: the single numerical kernel behind both
//! message construction and marginal queries.
//!
//! Given a list of multiplicands and the set of "free" argument names
//! (`argspec`) that remain unsummed, [`sum_product`] sums, over every
//! assignment of the variables the multiplicands declare but `argspec`
//! does not, the product of the multiplicands evaluated at the combined
//! assignment. `argspec` itself is resolved from the caller-supplied
//! assignment, not enumerated.

use itertools::Itertools;

use crate::{
    domain::{assignments, Assignment, Scope},
    message::Multiplicand,
    types::{Error, Result},
};

/// Computes the summation set `S`: the union of every factor multiplicand's
/// declared arguments, minus `argspec`, checking that any variable declared
/// by more than one factor agrees on its domain.
fn summation_scope(argspec: &[String], factors: &[Multiplicand]) -> Result<Scope> {
    let mut scope = Scope::default();

    for multiplicand in factors {
        for (argument, domain) in multiplicand.scope() {
            if argspec.contains(&argument) {
                continue;
            }
            match scope.get(&argument) {
                None => {
                    scope.insert(argument, domain);
                }
                Some(existing) if existing == &domain => {}
                Some(existing) => {
                    return Err(Error::DomainMismatch {
                        variable: argument,
                        expected: existing.iter().cloned().collect(),
                        found: domain.iter().cloned().collect(),
                    });
                }
            }
        }
    }

    Ok(scope)
}

/// Evaluates a message (or a marginal query, which is the degenerate case
/// of a single-multiplicand product) at `assignment`, restricted to
/// `argspec`, summing out every other free variable the multiplicands
/// declare.
///
/// # Errors
///
/// Returns [`Error::DomainMismatch`] if two multiplicands disagree on the
/// domain of a shared free variable, or any error a multiplicand's own
/// evaluation raises (missing argument, out-of-domain value).
pub fn sum_product(argspec: &[String], factors: &[Multiplicand], assignment: &Assignment) -> Result<f64> {
    let free = summation_scope(argspec, factors)?;

    // Base case: no free variables to sum over, the plain product suffices.
    if free.is_empty() {
        return factors
            .iter()
            .try_fold(1.0, |acc, m| Ok(acc * m.evaluate(assignment)?));
    }

    let mut total = 0.0;
    for free_assignment in assignments(&free) {
        let mut extended = assignment.clone();
        extended.extend(free_assignment);

        let product = factors
            .iter()
            .try_fold(1.0, |acc, m| -> Result<f64> { Ok(acc * m.evaluate(&extended)?) })?;
        total += product;
    }

    Ok(total)
}

/// Returns the set of free-variable names `sum_product` would sum over for
/// the given `argspec`/`factors`, useful for diagnostics.
pub fn free_variables(argspec: &[String], factors: &[Multiplicand]) -> Result<Vec<String>> {
    Ok(summation_scope(argspec, factors)?
        .keys()
        .cloned()
        .sorted()
        .collect())
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use ndarray::array;

    use super::*;
    use crate::factor::Factor;

    fn domain(values: &[&str]) -> crate::types::Domain {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn no_free_variables_is_a_plain_product() -> Result<()> {
        let factors = vec![Multiplicand::Constant(0.5), Multiplicand::Constant(0.25)];
        assert_eq!(sum_product(&[], &factors, &Assignment::default())?, 0.125);
        Ok(())
    }

    #[test]
    fn sums_over_a_single_free_variable() -> Result<()> {
        // P(x3 | x1, x2) with x1, x2 free: sum_{x1, x2} fC(x1, x2, x3) * 1 * 1
        let mut scope = Scope::default();
        scope.insert("x1".to_string(), domain(&["True", "False"]));
        scope.insert("x2".to_string(), domain(&["True", "False"]));
        scope.insert("x3".to_string(), domain(&["True", "False"]));
        let table = array![[[0.05, 0.95], [0.02, 0.98]], [[0.03, 0.97], [0.001, 0.999]]].into_dyn();
        let fc = Factor::new("fC", scope, table)?;

        let argspec = vec!["x3".to_string()];
        let factors = vec![Multiplicand::Factor(Rc::new(fc))];

        let mut a = Assignment::default();
        a.insert("x3".to_string(), "True".to_string());
        let value = sum_product(&argspec, &factors, &a)?;

        // 0.05 + 0.02 + 0.03 + 0.001
        assert!((value - 0.101).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn disagreeing_domains_are_rejected() {
        let mut scope_a = Scope::default();
        scope_a.insert("x".to_string(), domain(&["True", "False"]));
        let a = Factor::new("a", scope_a, array![0.5, 0.5].into_dyn()).unwrap();

        let mut scope_b = Scope::default();
        scope_b.insert("x".to_string(), domain(&["Yes", "No"]));
        let b = Factor::new("b", scope_b, array![0.5, 0.5].into_dyn()).unwrap();

        let factors = vec![
            Multiplicand::Factor(Rc::new(a)),
            Multiplicand::Factor(Rc::new(b)),
        ];
        let err = sum_product(&[], &factors, &Assignment::default()).unwrap_err();
        assert!(matches!(err, Error::DomainMismatch { .. }));
    }
}
