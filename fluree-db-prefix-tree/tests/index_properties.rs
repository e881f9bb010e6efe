//! Structural properties of indexing and query compilation.
//!
//! Every term an index walk produces must decode back to the cell it came
//! from, child tokens must extend their parent's, a shape must find itself,
//! and well-separated shapes must not match each other's terms.

use fluree_db_prefix_tree::{
    GridCell, GridType, PrefixTreeConfig, RecursivePrefixTreeStrategy, Shape, SpatialArgs,
    SpatialContext, SpatialOperation, SpatialRelation,
};
use std::sync::Arc;

fn strategy(grid_type: GridType, max_levels: u8, dist_err_pct: f64) -> RecursivePrefixTreeStrategy {
    let config = PrefixTreeConfig::default()
        .with_grid_type(grid_type)
        .with_max_levels(max_levels)
        .with_dist_err_pct(dist_err_pct);
    RecursivePrefixTreeStrategy::new(Arc::new(SpatialContext::geo()), &config).unwrap()
}

fn sample_shapes(ctx: &SpatialContext) -> Vec<Shape> {
    [
        "POINT(10 10)",
        "POINT(-122.4194 37.7749)",
        "ENVELOPE(-10.5, 20.25, 15.75, -5.5)",
        "ENVELOPE(170, -170, 10, -10)",
        "BUFFER(POINT(2.35 48.85), 3.3)",
        "BUFFER(POINT(179.2 -3.1), 2.4)",
        "POLYGON((-179.6 -1.2, -176.9 -1.2, -176.9 1.3, -179.6 1.3, -179.6 -1.2))",
        "POLYGON((0.3 0.7, 30.1 0.9, 15.2 25.3, 0.3 0.7))",
        "POLYGON((-60 -40, -20 -40, -20 -10, -60 -10, -60 -40), (-50 -30, -30 -30, -30 -20, -50 -20, -50 -30))",
    ]
    .iter()
    .map(|text| ctx.read_shape(text).unwrap())
    .collect()
}

#[test]
fn produced_terms_decode_to_their_cells() {
    for (grid_type, max_levels) in [(GridType::Quad, 8), (GridType::Geohash, 4)] {
        let s = strategy(grid_type, max_levels, 0.025);
        let codec = s.tree().codec();

        for shape in sample_shapes(s.context()) {
            for term in s.index_terms(&shape) {
                let text = term.to_term();
                let parsed = codec.parse_term(&text).unwrap();
                assert_eq!(parsed, term);

                let path = codec.decode(term.token()).unwrap();
                assert_eq!(codec.encode(&path).unwrap(), term.token());

                let cell = s.tree().cell_from_token(term.token()).unwrap();
                assert_eq!(cell.path(), &path);
                assert_eq!(cell.level(), term.level());
                // Every emitted cell touches the shape
                assert_ne!(cell.relate(&shape, s.context()), SpatialRelation::Disjoint);
            }
        }
    }
}

#[test]
fn child_tokens_extend_parent_token() {
    for (grid_type, max_levels) in [(GridType::Quad, 4), (GridType::Geohash, 2)] {
        let s = strategy(grid_type, max_levels, 0.0);
        let tree = s.tree();

        let mut stack: Vec<GridCell> = vec![tree.world_cell()];
        let mut cells = 0usize;
        while let Some(cell) = stack.pop() {
            cells += 1;
            for child in tree.subdivide(&cell) {
                assert!(child.token().starts_with(cell.token()));
                assert_eq!(child.token().len(), cell.token().len() + 1);
                assert!(cell.path().is_ancestor_of(child.path()));
                stack.push(child);
            }
        }
        let fan_out = grid_type.fan_out();
        let expected: usize = (0..=max_levels as u32).map(|l| fan_out.pow(l)).sum();
        assert_eq!(cells, expected);
    }
}

#[test]
fn intersects_query_finds_the_indexed_shape_itself() {
    for (grid_type, max_levels) in [(GridType::Quad, 10), (GridType::Geohash, 5)] {
        let s = strategy(grid_type, max_levels, 0.025);
        for shape in sample_shapes(s.context()) {
            let terms = s.index_term_strings(&shape);
            let filter = s
                .make_filter(&SpatialArgs::new(SpatialOperation::Intersects, shape.clone()))
                .unwrap();
            assert!(filter.matches_terms(&terms), "{:?} did not match itself", shape);
            assert!(s.intersects_doc_terms(&shape, &terms));
            assert!(filter.recheck(&shape));
        }
    }
}

#[test]
fn separated_shapes_do_not_match_each_other() {
    // Gap of 10 degrees; level 8 quad cells are 1.40625 x 0.703125
    let s = strategy(GridType::Quad, 8, 0.0);
    let ctx = s.context();
    let a: Shape = ctx.make_rectangle(0.1, 10.1, 0.1, 10.1).unwrap().into();
    let b: Shape = ctx.make_rectangle(20.1, 30.1, 0.1, 10.1).unwrap().into();
    assert_eq!(a.relate(&b, ctx), SpatialRelation::Disjoint);

    let a_terms = s.index_term_strings(&a);
    let b_terms = s.index_term_strings(&b);

    let filter = s
        .make_filter(&SpatialArgs::new(SpatialOperation::Intersects, b.clone()))
        .unwrap();
    assert!(!filter.matches_terms(&a_terms));
    assert!(!s.intersects_doc_terms(&b, &a_terms));

    // Shared terms can only be coarse ancestors, never where either walk stopped
    for term in a_terms.iter().filter(|t| b_terms.contains(t)) {
        assert!(!term.ends_with('+'), "shared leaf term {}", term);
        let (w, _) = s.tree().cell_dimensions(term.len() as u8);
        assert!(w > 10.0, "shared term {} below separation level", term);
    }

    let disjoint = s
        .make_filter(&SpatialArgs::new(SpatialOperation::IsDisjointTo, b))
        .unwrap();
    assert!(disjoint.matches_terms(&a_terms));
    assert!(!disjoint.matches_terms(&b_terms));
}

#[test]
fn indexing_is_deterministic_across_threads() {
    let s = Arc::new(strategy(GridType::Quad, 10, 0.025));
    let shapes = Arc::new(sample_shapes(s.context()));
    let expected: Vec<Vec<String>> = shapes.iter().map(|sh| s.index_term_strings(sh)).collect();

    let results: Vec<Vec<Vec<String>>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let s = Arc::clone(&s);
                let shapes = Arc::clone(&shapes);
                scope.spawn(move || {
                    shapes
                        .iter()
                        .rev()
                        .map(|sh| s.index_term_strings(sh))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for mut result in results {
        result.reverse();
        assert_eq!(result, expected);
    }
}

#[test]
fn max_levels_bounds_every_term() {
    let s = strategy(GridType::Quad, 6, 0.0);
    for shape in sample_shapes(s.context()) {
        let terms = s.index_terms(&shape);
        assert!(!terms.is_empty());
        assert!(terms.iter().all(|t| t.level() <= 6));
        // Every walk that reaches max levels ends in leaves there
        assert!(terms.iter().filter(|t| t.level() == 6).all(|t| t.is_leaf()));
    }
}
