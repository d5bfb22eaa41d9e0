use densegraph::{
    AdjacencyMatrix, DenseGraphError, EdgeDensity, MatrixGenerator, NO_PARENT, single_pass_claim,
};

#[test]
fn test_claimed_parents_are_real_edges() {
    let graph = MatrixGenerator::new(4)
        .unwrap()
        .with_threshold(EdgeDensity::from_percent(10).unwrap().threshold())
        .with_seed(5)
        .generate(120)
        .unwrap();
    for threads in [1, 3, 8] {
        let parents = single_pass_claim(&graph, threads).unwrap();
        assert_eq!(parents.len(), 120);
        for vertex in 0..120 {
            if let Some(parent) = parents.parent_of(vertex) {
                assert_ne!(parent, vertex);
                assert!(graph.has_edge(parent, vertex));
            }
        }
    }
}

#[test]
fn test_claim_marks_every_vertex_with_an_in_edge() {
    let graph = AdjacencyMatrix::from_edges(5, &[(0, 1), (2, 1), (3, 3), (4, 2), (1, 4)]).unwrap();
    for threads in [1, 2, 5] {
        let parents = single_pass_claim(&graph, threads).unwrap();
        for vertex in 0..graph.vertices() {
            let has_in_edge =
                (0..graph.vertices()).any(|from| from != vertex && graph.has_edge(from, vertex));
            assert_eq!(
                parents.parent_of(vertex).is_some(),
                has_in_edge,
                "vertex {vertex} threads {threads}"
            );
        }
        let slice = parents.as_slice();
        assert!(slice[1] == 0 || slice[1] == 2);
        assert_eq!(slice[0], NO_PARENT);
        assert_eq!(slice[3], NO_PARENT);
    }
}

#[test]
fn test_claim_pass_cycles_still_yield_distances() {
    let graph = AdjacencyMatrix::from_edges(2, &[(0, 1), (1, 0)]).unwrap();
    let parents = single_pass_claim(&graph, 2).unwrap();
    assert_eq!(parents.hop_distances().len(), 2);
}

#[test]
fn test_claim_pass_requires_workers() {
    let graph = AdjacencyMatrix::new(2).unwrap();
    assert!(matches!(
        single_pass_claim(&graph, 0),
        Err(DenseGraphError::Contract(_))
    ));
}
