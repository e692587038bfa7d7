use std::hint::black_box as _b;

use criterion::{Criterion, criterion_group, criterion_main};
use ndarray::array;
use sum_product_bn::{
    domain::Scope,
    factor::Factor,
    graph::{FactorGraph, FactorNode, Node, VariableNode},
    types::{Domain, Result},
};

fn boolean() -> Domain {
    ["True", "False"].iter().map(|v| v.to_string()).collect()
}

fn reference_network() -> Result<FactorGraph> {
    let mut scope_a = Scope::default();
    scope_a.insert("x1".to_string(), boolean());
    let fa = Factor::new("fA", scope_a, array![0.1, 0.9].into_dyn())?;

    let mut scope_b = Scope::default();
    scope_b.insert("x2".to_string(), boolean());
    let fb = Factor::new("fB", scope_b, array![0.3, 0.7].into_dyn())?;

    let mut scope_c = Scope::default();
    scope_c.insert("x1".to_string(), boolean());
    scope_c.insert("x2".to_string(), boolean());
    scope_c.insert("x3".to_string(), boolean());
    let fc_table = array![[[0.05, 0.95], [0.02, 0.98]], [[0.03, 0.97], [0.001, 0.999]]];
    let fc = Factor::new("fC", scope_c, fc_table.into_dyn())?;

    let mut scope_d = Scope::default();
    scope_d.insert("x3".to_string(), boolean());
    scope_d.insert("x4".to_string(), boolean());
    let fd = Factor::new("fD", scope_d, array![[0.9, 0.1], [0.2, 0.8]].into_dyn())?;

    let mut scope_e = Scope::default();
    scope_e.insert("x3".to_string(), boolean());
    scope_e.insert("x5".to_string(), boolean());
    let fe = Factor::new("fE", scope_e, array![[0.65, 0.35], [0.3, 0.7]].into_dyn())?;

    let nodes: Vec<Node> = vec![
        VariableNode::new("x1", boolean())
            .with_parents(["fA"])
            .with_children(["fC"])
            .into(),
        VariableNode::new("x2", boolean())
            .with_parents(["fB"])
            .with_children(["fC"])
            .into(),
        VariableNode::new("x3", boolean())
            .with_parents(["fC"])
            .with_children(["fD", "fE"])
            .into(),
        VariableNode::new("x4", boolean()).with_parents(["fD"]).into(),
        VariableNode::new("x5", boolean()).with_parents(["fE"]).into(),
        FactorNode::new("fA", fa).with_children(["x1"]).into(),
        FactorNode::new("fB", fb).with_children(["x2"]).into(),
        FactorNode::new("fC", fc)
            .with_parents(["x1", "x2"])
            .with_children(["x3"])
            .into(),
        FactorNode::new("fD", fd)
            .with_parents(["x3"])
            .with_children(["x4"])
            .into(),
        FactorNode::new("fE", fe)
            .with_parents(["x3"])
            .with_children(["x5"])
            .into(),
    ];

    FactorGraph::new(nodes)
}

fn bench_factor_graph(c: &mut Criterion) {
    let mut group = c.benchmark_group("factor_graph");

    group.bench_function("build", |b| {
        b.iter(|| -> Result<()> {
            _b(reference_network()?);
            Ok(())
        })
    });

    group.bench_function("propagate", |b| {
        b.iter(|| -> Result<()> {
            let mut graph = reference_network()?;
            graph.propagate()?;
            _b(&graph);
            Ok(())
        })
    });

    group.bench_function("propagate_with_evidence", |b| {
        b.iter(|| -> Result<()> {
            let mut graph = reference_network()?;
            graph.add_evidence("x5", "True")?;
            graph.propagate()?;
            _b(&graph);
            Ok(())
        })
    });

    group.bench_function("marginal", |b| {
        let mut graph = reference_network().unwrap();
        graph.propagate().unwrap();
        b.iter(|| graph.marginal(_b("x3")).unwrap())
    });

    group.finish();
}

criterion_group!(benches, bench_factor_graph);
criterion_main!(benches);
