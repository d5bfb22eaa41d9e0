use densegraph::{EdgeDensity, EdgeThreshold, GraphMode, MatrixGenerator};

fn generator(threads: usize, percent: u8, mode: GraphMode, seed: u64) -> MatrixGenerator {
    MatrixGenerator::new(threads)
        .expect("generator")
        .with_threshold(EdgeDensity::from_percent(percent).unwrap().threshold())
        .with_mode(mode)
        .with_seed(seed)
}

#[test]
fn test_directed_zero_density_has_no_edges() {
    let graph = generator(3, 0, GraphMode::Directed, 1).generate(40).unwrap();
    assert_eq!(graph.vertices(), 40);
    assert_eq!(graph.edge_count(), 0);
}

#[test]
fn test_full_density_sets_every_cell() {
    for mode in [GraphMode::Directed, GraphMode::Undirected] {
        let graph = generator(4, 100, mode, 2).generate(33).unwrap();
        assert_eq!(graph.edge_count(), 33 * 33, "mode {mode:?}");
    }
}

#[test]
fn test_undirected_graph_is_symmetric_with_true_diagonal() {
    for threads in [1, 2, 5, 16] {
        let graph = generator(threads, 35, GraphMode::Undirected, 9)
            .generate(57)
            .unwrap();
        assert!(graph.is_symmetric(), "threads {threads}");
        for vertex in 0..graph.vertices() {
            assert!(graph.has_edge(vertex, vertex), "diagonal {vertex}");
        }
    }
}

#[test]
fn test_undirected_zero_density_keeps_only_diagonal() {
    let graph = generator(2, 0, GraphMode::Undirected, 3).generate(12).unwrap();
    assert_eq!(graph.edge_count(), 12);
}

#[test]
fn test_seeded_generation_is_reproducible() {
    let make = || generator(4, 20, GraphMode::Directed, 0xAB).generate(64).unwrap();
    assert_eq!(make(), make());
}

#[test]
fn test_density_lands_near_requested_rate() {
    let graph = generator(4, 20, GraphMode::Directed, 77).generate(300).unwrap();
    let rate = graph.edge_count() as f64 / (300.0 * 300.0);
    // threshold 52 out of 256
    assert!((rate - 52.0 / 256.0).abs() < 0.02, "rate {rate}");
}

#[test]
fn test_zero_vertices_and_more_threads_than_rows() {
    let empty = generator(8, 50, GraphMode::Undirected, 4).generate(0).unwrap();
    assert!(empty.is_empty());
    let small = generator(16, 100, GraphMode::Directed, 4).generate(3).unwrap();
    assert_eq!(small.edge_count(), 9);
}

#[test]
fn test_fill_overwrites_existing_cells() {
    let mut graph = generator(2, 100, GraphMode::Directed, 5).generate(10).unwrap();
    MatrixGenerator::new(2)
        .unwrap()
        .with_threshold(EdgeThreshold::NONE)
        .fill(&mut graph)
        .unwrap();
    assert_eq!(graph.edge_count(), 0);
}
