//! End-to-end routing scenarios over the block store.

use gridflow_core::{
    Block, BlockStore, GridConfig, RouteKind, Side, anchor_point, nearest_in_direction, route,
    snap_to_grid,
};
use kurbo::{Point, Rect};

const UNIT: f64 = 40.0;

fn rect(x: f64, y: f64, w: f64, h: f64) -> Rect {
    Rect::from_origin_size((x, y), (w, h))
}

/// Check that no segment passes through the open interior of `r`.
fn segment_avoids(a: Point, b: Point, r: Rect) -> bool {
    if a.x == b.x {
        let (y0, y1) = (a.y.min(b.y), a.y.max(b.y));
        !(a.x > r.x0 && a.x < r.x1 && y1 > r.y0 && y0 < r.y1)
    } else {
        let (x0, x1) = (a.x.min(b.x), a.x.max(b.x));
        !(a.y > r.y0 && a.y < r.y1 && x1 > r.x0 && x0 < r.x1)
    }
}

#[test]
fn scenario_a_clear_gap_gives_single_bend() {
    let from = rect(0.0, 0.0, 160.0, 80.0);
    let to = rect(400.0, 0.0, 160.0, 80.0);
    let path = route(from, Side::Right, to, Side::Left, UNIT);

    assert_eq!(path.len(), 4);
    assert_eq!(path.kind(), RouteKind::Step);
    assert_eq!(path.start(), Point::new(160.0, 40.0));
    assert_eq!(path.end(), Point::new(400.0, 40.0));
    assert_eq!(path.points()[1].x, 200.0);
    assert_eq!(path.points()[2].x, 200.0);
    assert!(path.is_rectilinear());
}

#[test]
fn scenario_b_overlap_gives_detour_outside_both() {
    let from = rect(0.0, 0.0, 160.0, 80.0);
    let to = rect(180.0, 0.0, 160.0, 80.0);
    let path = route(from, Side::Right, to, Side::Left, UNIT);

    assert_eq!(path.len(), 6);
    assert_eq!(path.kind(), RouteKind::Detour);
    assert_eq!(path.start(), anchor_point(from, Side::Right));
    assert_eq!(path.end(), anchor_point(to, Side::Left));

    let lane = path.points()[2].y;
    assert_eq!(path.points()[3].y, lane);
    let top = from.y0.min(to.y0);
    let bottom = from.y1.max(to.y1);
    assert!(lane < top || lane > bottom, "lane {lane} inside [{top}, {bottom}]");

    // The traversal along the lane clears both rectangles
    let (a, b) = (path.points()[2], path.points()[3]);
    assert!(segment_avoids(a, b, from));
    assert!(segment_avoids(a, b, to));
}

#[test]
fn scenario_c_directional_query_requires_overlap() {
    let reference = rect(0.0, 0.0, 100.0, 100.0);
    let candidates = [rect(200.0, 0.0, 100.0, 100.0), rect(50.0, 300.0, 100.0, 100.0)];
    let found = nearest_in_direction(&reference, &candidates, Side::Right);
    assert_eq!(found, Some(&candidates[0]));
}

#[test]
fn endpoints_and_rectilinearity_hold_for_every_side_pair() {
    let layouts = [
        (rect(0.0, 0.0, 160.0, 80.0), rect(400.0, 0.0, 160.0, 80.0)),
        (rect(0.0, 0.0, 160.0, 80.0), rect(180.0, 40.0, 160.0, 80.0)),
        (rect(0.0, 0.0, 160.0, 80.0), rect(-300.0, 200.0, 80.0, 80.0)),
        (rect(0.0, 0.0, 160.0, 80.0), rect(40.0, 400.0, 120.0, 120.0)),
        (rect(0.0, 0.0, 160.0, 80.0), rect(10.0, 10.0, 20.0, 20.0)),
        (rect(0.0, 0.0, 0.0, 0.0), rect(100.0, 100.0, 0.0, 0.0)),
    ];
    for (from, to) in layouts {
        for from_side in Side::ALL {
            for to_side in Side::ALL {
                let path = route(from, from_side, to, to_side, UNIT);
                assert!(path.len() == 4 || path.len() == 6);
                assert_eq!(path.start(), anchor_point(from, from_side));
                assert_eq!(path.end(), anchor_point(to, to_side));
                assert!(path.is_rectilinear(), "{from_side:?} -> {to_side:?}: {:?}", path.points());
                assert_eq!(path.to_flat().len() % 2, 0);

                // The first segment leaves perpendicular to the source side
                let first = path.points()[1] - path.start();
                let normal = from_side.normal();
                assert!(first.dot(normal) >= 0.0);
                assert_eq!(first.cross(normal), 0.0);
            }
        }
    }
}

#[test]
fn clearance_case_always_has_four_points() {
    let from = rect(0.0, 0.0, 120.0, 120.0);
    for gap in [80.0, 81.0, 120.0, 400.0] {
        for offset in [-300.0, -40.0, 0.0, 55.0, 500.0] {
            let to = rect(120.0 + gap, offset, 120.0, 120.0);
            assert_eq!(route(from, Side::Right, to, Side::Left, UNIT).len(), 4);

            let below = rect(offset, 120.0 + gap, 120.0, 120.0);
            assert_eq!(route(from, Side::Bottom, below, Side::Top, UNIT).len(), 4);
        }
    }
}

#[test]
fn detour_lane_clears_both_rectangles() {
    let from = rect(0.0, 0.0, 160.0, 80.0);
    for (x, y) in [(100.0, 20.0), (-100.0, -30.0), (0.0, 0.0), (60.0, 200.0), (100.0, -250.0)] {
        let to = rect(x, y, 160.0, 80.0);
        let path = route(from, Side::Right, to, Side::Left, UNIT);
        assert_eq!(path.kind(), RouteKind::Detour);
        let (a, b) = (path.points()[2], path.points()[3]);
        assert!(segment_avoids(a, b, from), "lane crosses source for {to:?}");
        assert!(segment_avoids(a, b, to), "lane crosses target for {to:?}");
    }
}

#[test]
fn store_routes_auto_connected_blocks() {
    let grid = GridConfig::default();
    let mut store = BlockStore::new();
    let a = store.insert(Block::rectangle(rect(0.0, 0.0, 160.0, 80.0))).unwrap();
    let b = store.insert(Block::rectangle(rect(400.0, 0.0, 160.0, 80.0))).unwrap();
    let _far = store.insert(Block::rectangle(rect(900.0, 0.0, 160.0, 80.0))).unwrap();

    let connection = store.auto_connect(a, Side::Right).unwrap().unwrap();
    assert_eq!(connection.to, b);
    assert_eq!(connection.to_side, Side::Left);

    let connectors = store.connectors(&grid);
    assert_eq!(connectors.len(), 1);
    let path = &connectors[0].path;
    assert_eq!(path.to_flat(), vec![160.0, 40.0, 200.0, 40.0, 200.0, 40.0, 400.0, 40.0]);

    // Moving the target next to the source switches to a detour
    store.move_to(b, Point::new(180.0, 0.0)).unwrap();
    let connectors = store.connectors(&grid);
    assert_eq!(connectors[0].path.kind(), RouteKind::Detour);

    // Removing the target drops the connector
    store.remove(b);
    assert!(store.connectors(&grid).is_empty());
}

#[test]
fn snapped_blocks_route_on_grid_lines() {
    let unit = GridConfig::default().unit();
    let from = Rect::from_origin_size(
        (snap_to_grid(13.0, unit), snap_to_grid(29.0, unit)),
        (snap_to_grid(150.0, unit), snap_to_grid(82.0, unit)),
    );
    let to = Rect::from_origin_size(
        (snap_to_grid(517.0, unit), snap_to_grid(203.0, unit)),
        (snap_to_grid(161.0, unit), snap_to_grid(79.0, unit)),
    );
    let path = route(from, Side::Right, to, Side::Left, unit);
    for point in &path.points()[1..3] {
        assert_eq!(snap_to_grid(point.x, unit), point.x);
    }
}
