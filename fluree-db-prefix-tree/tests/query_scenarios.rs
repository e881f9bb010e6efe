//! End-to-end query scenarios over built indexes.

use fluree_db_prefix_tree::{
    CellCodec, ContextConfig, GridType, PrefixTreeConfig, SearchOptions, Shape, SpatialArgs,
    SpatialCreateConfig, SpatialError, SpatialIndexBuilder, SpatialIndexSnapshot,
    SpatialOperation,
};

const OPERATIONS: [SpatialOperation; 4] = [
    SpatialOperation::Intersects,
    SpatialOperation::IsWithin,
    SpatialOperation::Contains,
    SpatialOperation::IsDisjointTo,
];

fn create_config(grid_type: GridType, max_levels: u8) -> SpatialCreateConfig {
    SpatialCreateConfig::new("location").with_tree_config(
        PrefixTreeConfig::default()
            .with_grid_type(grid_type)
            .with_max_levels(max_levels),
    )
}

fn build(config: SpatialCreateConfig, shapes: &[(u64, String)]) -> SpatialIndexSnapshot {
    let mut builder = SpatialIndexBuilder::new(config).unwrap();
    for (doc_id, text) in shapes {
        assert!(builder.add_wkt(*doc_id, text), "rejected {}", text);
    }
    builder.build().into_snapshot()
}

/// Deterministic pseudo-random coordinates.
struct Lcg(u64);

impl Lcg {
    fn next_f64(&mut self) -> f64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }

    fn range(&mut self, min: f64, max: f64) -> f64 {
        min + self.next_f64() * (max - min)
    }
}

/// A mix of all shape kinds in `[min, max]` on both axes.
fn random_shapes(seed: u64, count: usize, min: f64, max: f64) -> Vec<(u64, String)> {
    let mut rng = Lcg(seed);
    let span = max - min;
    (0..count)
        .map(|i| {
            let x = rng.range(min + span * 0.1, max - span * 0.1);
            let y = rng.range(min + span * 0.1, max - span * 0.1);
            let size = rng.range(span * 0.005, span * 0.08);
            let text = match i % 4 {
                0 => format!("POINT({} {})", x, y),
                1 => format!("ENVELOPE({}, {}, {}, {})", x, x + size, y + size, y),
                2 => format!("BUFFER(POINT({} {}), {})", x, y, size),
                _ => format!(
                    "POLYGON(({} {}, {} {}, {} {}, {} {}))",
                    x,
                    y,
                    x + size,
                    y + size * 0.3,
                    x + size * 0.4,
                    y + size,
                    x,
                    y
                ),
            };
            (i as u64, text)
        })
        .collect()
}

/// Compare indexed answers with a brute-force exact scan.
fn assert_matches_brute_force(snapshot: &SpatialIndexSnapshot, query: &Shape) {
    for op in OPERATIONS {
        let args = SpatialArgs::new(op, query.clone());
        let filter = snapshot.filter(&args).unwrap();

        let mut expected: Vec<u64> = snapshot
            .term_index()
            .iter()
            .map(|e| e.doc_id)
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .filter(|&doc| filter.recheck(&snapshot.entry_for_doc(doc).unwrap().shape))
            .collect();
        expected.sort_unstable();

        let results = snapshot.query(&args, SearchOptions::default()).unwrap();
        assert_eq!(results.doc_ids, expected, "{} {:?}", op, query);

        // Skipping the re-check may add false positives, never lose matches
        let approx = snapshot
            .query(&args, SearchOptions::default().without_recheck())
            .unwrap();
        for doc in &expected {
            assert!(approx.doc_ids.contains(doc), "{} lost doc {}", op, doc);
        }
        assert_eq!(approx.approximate, !filter.is_exact());
    }
}

#[test]
fn point_at_max_level_three_yields_three_chained_terms() {
    let snapshot = build(
        create_config(GridType::Quad, 3),
        &[(1, "POINT(10 10)".to_string())],
    );
    let terms = &snapshot.entry_for_doc(1).unwrap().terms;

    assert_eq!(terms.len(), 3);
    let tokens: Vec<&str> = terms.iter().map(|t| t.trim_end_matches('+')).collect();
    for (level, token) in tokens.iter().enumerate() {
        assert_eq!(token.len(), level + 1);
    }
    assert!(tokens[1].starts_with(tokens[0]));
    assert!(tokens[2].starts_with(tokens[1]));
    assert!(terms[2].ends_with('+'));
    assert_eq!(tokens[0], "B");
}

#[test]
fn rectangle_across_midline_emits_partial_siblings() {
    let snapshot = build(
        create_config(GridType::Quad, 2),
        &[(1, "ENVELOPE(-10, 10, 40, 20)".to_string())],
    );
    let terms = &snapshot.entry_for_doc(1).unwrap().terms;

    let level_one: Vec<&str> = terms
        .iter()
        .filter(|t| t.len() == 1)
        .map(|t| t.as_str())
        .collect();
    assert_eq!(level_one, vec!["A", "B"]);
    // The southern quadrants are disjoint and pruned
    assert!(!terms.iter().any(|t| t.starts_with('C') || t.starts_with('D')));
    assert!(terms.iter().filter(|t| t.len() == 3).all(|t| t.ends_with('+')));
}

#[test]
fn world_query_returns_every_shape_within_it() {
    let shapes = random_shapes(7, 40, -80.0, 80.0)
        .into_iter()
        .chain([(1000, "ENVELOPE(-180, 180, 90, -90)".to_string())])
        .collect::<Vec<_>>();
    let snapshot = build(create_config(GridType::Quad, 8), &shapes);
    let world: Shape = snapshot.context().world_bounds().into();

    let within = snapshot
        .query(
            &SpatialArgs::new(SpatialOperation::IsWithin, world.clone()),
            SearchOptions::default(),
        )
        .unwrap();
    assert_eq!(within.len(), shapes.len());

    let intersects = snapshot
        .query(
            &SpatialArgs::new(SpatialOperation::Intersects, world.clone()),
            SearchOptions::default(),
        )
        .unwrap();
    assert_eq!(intersects.len(), shapes.len());
    assert!(!intersects.approximate);

    // Only a world-covering shape contains the world
    let contains = snapshot
        .query(
            &SpatialArgs::new(SpatialOperation::Contains, world),
            SearchOptions::default(),
        )
        .unwrap();
    assert_eq!(contains.doc_ids, vec![1000]);
}

#[test]
fn decode_rejects_symbols_outside_the_alphabet() {
    let quad = CellCodec::new(GridType::Quad, 8);
    assert!(matches!(quad.decode("ABE"), Err(SpatialError::Decode(_))));
    assert!(matches!(quad.decode("ab"), Err(SpatialError::Decode(_))));
    assert!(matches!(quad.decode("A+B"), Err(SpatialError::Decode(_))));
    assert!(matches!(quad.decode("ABCDABCDA"), Err(SpatialError::Decode(_))));
    assert_eq!(quad.decode("ABCD").unwrap().indices(), &[0u8, 1, 2, 3][..]);

    let geohash = CellCodec::new(GridType::Geohash, 6);
    assert!(matches!(geohash.decode("ezs4a"), Err(SpatialError::Decode(_))));
    assert!(matches!(geohash.parse_term("ezs42++"), Err(SpatialError::Decode(_))));
    assert!(geohash.parse_term("ezs42+").unwrap().is_leaf());
}

#[test]
fn quad_index_agrees_with_brute_force() {
    let shapes = random_shapes(42, 80, -60.0, 60.0);
    let snapshot = build(create_config(GridType::Quad, 8), &shapes);
    let ctx = snapshot.context();

    for text in [
        "ENVELOPE(-20.3, 15.7, 30.1, -12.9)",
        "BUFFER(POINT(3.3 -7.1), 18.2)",
        "POLYGON((-20.1 -15.2, 17.3 -10.7, 5.9 20.4, -20.1 -15.2))",
        "POINT(12.34 -5.67)",
    ] {
        assert_matches_brute_force(&snapshot, &ctx.read_shape(text).unwrap());
    }
    // Query shapes equal to indexed ones
    for (_, text) in shapes.iter().take(8) {
        assert_matches_brute_force(&snapshot, &ctx.read_shape(text).unwrap());
    }
}

#[test]
fn geohash_index_agrees_with_brute_force() {
    let shapes = random_shapes(9, 60, -30.0, 30.0);
    let snapshot = build(create_config(GridType::Geohash, 4), &shapes);
    let ctx = snapshot.context();

    for text in [
        "ENVELOPE(-10.3, 12.7, 8.1, -9.9)",
        "BUFFER(POINT(1.1 2.2), 6.5)",
        "POINT(-3.21 4.56)",
    ] {
        assert_matches_brute_force(&snapshot, &ctx.read_shape(text).unwrap());
    }
}

#[test]
fn cartesian_index_agrees_with_brute_force() {
    let config = create_config(GridType::Quad, 9)
        .with_context_config(ContextConfig::cartesian([0.0, 1000.0, 0.0, 500.0]));
    let shapes = random_shapes(3, 60, 0.0, 500.0);
    let snapshot = build(config, &shapes);
    let ctx = snapshot.context();
    assert!(!ctx.is_geo());

    for text in [
        "ENVELOPE(100.5, 320.25, 410.75, 90.5)",
        "BUFFER(POINT(250.1 250.3), 60.7)",
        "POLYGON((60.1 70.2, 380.3 90.7, 200.9 400.4, 60.1 70.2))",
    ] {
        assert_matches_brute_force(&snapshot, &ctx.read_shape(text).unwrap());
    }
}

#[test]
fn dateline_rectangle_query() {
    let snapshot = build(
        create_config(GridType::Quad, 8),
        &[
            (1, "POINT(175 5)".to_string()),
            (2, "POINT(-175 5)".to_string()),
            (3, "POINT(0 5)".to_string()),
            (4, "ENVELOPE(178, -178, 2, -2)".to_string()),
        ],
    );
    let query = snapshot
        .context()
        .read_shape("ENVELOPE(170, -170, 10, -10)")
        .unwrap();

    let within = snapshot
        .query(
            &SpatialArgs::new(SpatialOperation::IsWithin, query.clone()),
            SearchOptions::default(),
        )
        .unwrap();
    assert_eq!(within.doc_ids, vec![1, 2, 4]);
    assert_matches_brute_force(&snapshot, &query);
}

#[test]
fn dateline_circle_matches_polygon_and_rectangle_alike() {
    let snapshot = build(
        create_config(GridType::Quad, 8),
        &[
            (
                1,
                "POLYGON((-179 -0.5, -178 -0.5, -178 0.5, -179 0.5, -179 -0.5))".to_string(),
            ),
            (2, "ENVELOPE(-179, -178, 0.5, -0.5)".to_string()),
            (3, "POLYGON((175 3, 179 3, 179 6, 175 6, 175 3))".to_string()),
            (4, "POLYGON((-170 -1, -165 -1, -165 1, -170 1, -170 -1))".to_string()),
            (5, "POINT(0 5)".to_string()),
        ],
    );
    let query = snapshot
        .context()
        .read_shape("BUFFER(POINT(178 0), 5)")
        .unwrap();

    let run = |op| {
        snapshot
            .query(&SpatialArgs::new(op, query.clone()), SearchOptions::default())
            .unwrap()
            .doc_ids
    };
    let intersects = run(SpatialOperation::Intersects);
    let disjoint = run(SpatialOperation::IsDisjointTo);

    assert_eq!(intersects, vec![1, 2, 3]);
    assert_eq!(run(SpatialOperation::IsWithin), vec![1, 2]);
    assert_eq!(run(SpatialOperation::Contains), Vec::<u64>::new());
    assert_eq!(disjoint, vec![4, 5]);

    // Every document lands on exactly one side
    for doc in 1..=5u64 {
        assert_ne!(intersects.contains(&doc), disjoint.contains(&doc), "doc {}", doc);
    }
    assert_matches_brute_force(&snapshot, &query);
}

#[test]
fn exists_and_limit_stop_early() {
    let shapes = random_shapes(11, 50, -40.0, 40.0);
    let snapshot = build(create_config(GridType::Quad, 8), &shapes);
    let args = SpatialArgs::new(
        SpatialOperation::Intersects,
        snapshot
            .context()
            .read_shape("ENVELOPE(-40, 40, 40, -40)")
            .unwrap(),
    );

    let (all, _) = snapshot
        .query_with_stats(&args, SearchOptions::default())
        .unwrap();
    assert!(all.len() > 3);

    let (limited, stats) = snapshot
        .query_with_stats(&args, SearchOptions::default().with_limit(3))
        .unwrap();
    assert_eq!(limited.doc_ids, all.doc_ids[..3].to_vec());
    assert!(stats.exact_checks <= 3);

    assert!(snapshot.exists(&args).unwrap());
}

#[test]
fn query_dist_err_pct_override() {
    let shapes = random_shapes(5, 30, -50.0, 50.0);
    let snapshot = build(create_config(GridType::Quad, 10), &shapes);
    let query = snapshot
        .context()
        .read_shape("ENVELOPE(-20.3, 15.7, 30.1, -12.9)")
        .unwrap();

    let coarse = SpatialArgs::new(SpatialOperation::Intersects, query.clone()).with_dist_err_pct(0.5);
    let fine = SpatialArgs::new(SpatialOperation::Intersects, query).with_dist_err_pct(0.0);

    let (coarse_results, coarse_stats) = snapshot
        .query_with_stats(&coarse, SearchOptions::default())
        .unwrap();
    let (fine_results, fine_stats) = snapshot
        .query_with_stats(&fine, SearchOptions::default())
        .unwrap();

    assert!(coarse_stats.detail_level < fine_stats.detail_level);
    assert!(coarse_stats.cells_visited < fine_stats.cells_visited);
    assert_eq!(coarse_results.doc_ids, fine_results.doc_ids);
}

#[test]
fn geohash_on_cartesian_context_is_rejected() {
    let config = create_config(GridType::Geohash, 4)
        .with_context_config(ContextConfig::cartesian([0.0, 10.0, 0.0, 10.0]));
    assert!(matches!(
        SpatialIndexBuilder::new(config),
        Err(SpatialError::Config(_))
    ));
}
