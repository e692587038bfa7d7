//! Cartesian-product enumeration over argument domains.
//!
//! A [`Scope`] names, in order, the arguments a factor or message depends on
//! and the discrete domain of each. [`assignments`] enumerates every way of
//! assigning each argument a value from its domain — the free-variable
//! enumeration the marginalization engine (see [`crate::marginalize`]) and
//! the factor-graph builder both fold over.

use itertools::Itertools;

use crate::types::{Domain, FxIndexMap};

/// An ordered map from argument name to its declared domain.
///
/// Order matters: it fixes the axis order of a factor's table (see
/// [`crate::factor::Factor`]) and the order in which [`assignments`]
/// generates the cartesian product.
pub type Scope = FxIndexMap<String, Domain>;

/// A partial or complete assignment of argument names to one of their
/// domain's values.
pub type Assignment = FxIndexMap<String, String>;

/// Enumerates every assignment of `scope`'s arguments to a value drawn from
/// each one's domain, in lexicographic product order (the first-listed
/// argument varies slowest).
///
/// An empty scope yields exactly one assignment: the empty one.
pub fn assignments(scope: &Scope) -> impl Iterator<Item = Assignment> + '_ {
    let names: Vec<&String> = scope.keys().collect();

    scope
        .values()
        .map(|domain| domain.iter().cloned())
        .multi_cartesian_product()
        .map(move |values| names.iter().map(|&n| n.clone()).zip(values).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domain(values: &[&str]) -> Domain {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn empty_scope_yields_one_empty_assignment() {
        let scope = Scope::default();
        let all: Vec<_> = assignments(&scope).collect();
        assert_eq!(all, vec![Assignment::default()]);
    }

    #[test]
    fn single_argument() {
        let mut scope = Scope::default();
        scope.insert("x".to_string(), domain(&["a", "b", "c"]));

        let all: Vec<_> = assignments(&scope).collect();
        assert_eq!(all.len(), 3);
        for (i, value) in ["a", "b", "c"].iter().enumerate() {
            assert_eq!(all[i]["x"], *value);
        }
    }

    #[test]
    fn cartesian_product_size() {
        let mut scope = Scope::default();
        scope.insert("x".to_string(), domain(&["T", "F"]));
        scope.insert("y".to_string(), domain(&["T", "F"]));
        scope.insert("z".to_string(), domain(&["T", "F"]));

        let all: Vec<_> = assignments(&scope).collect();
        assert_eq!(all.len(), 8);

        // Every assignment must be distinct.
        let unique: std::collections::HashSet<_> = all
            .iter()
            .map(|a| (a["x"].clone(), a["y"].clone(), a["z"].clone()))
            .collect();
        assert_eq!(unique.len(), 8);
    }
}
