use chrono::NaiveDate;
use streetrouter::prelude::*;
use streetrouter::{
    Error, Location, PlanRequest, RouterConfig, bulk_reachability, distance_matrix, plan,
    plan_many, reachability,
};

const BLOCK_MM: u32 = 111_200;

/// 3x3 grid with 0.001 degree blocks. Rows are named "Row N", columns "Col N".
///
/// ```text
/// 6 - 7 - 8
/// |   |   |
/// 3 - 4 - 5
/// |   |   |
/// 0 - 1 - 2
/// ```
fn grid() -> StreetLayer {
    let mut layer = StreetLayer::default();
    for row in 0..3 {
        for col in 0..3 {
            layer.add_vertex(
                f64::from(row) * 0.001,
                f64::from(col) * 0.001,
                i64::from(row * 3 + col + 1),
                None,
            );
        }
    }
    let walk = EdgeFlags::ALLOWS_PEDESTRIAN;
    for row in 0..3usize {
        for col in 0..3usize {
            let v = row * 3 + col;
            if col < 2 {
                let name = format!("Row {row}");
                let source_id = 2_000 + row as i64;
                layer
                    .add_edge_pair(v, v + 1, BLOCK_MM, source_id, Some(&name), 0, 0, walk, walk)
                    .unwrap();
            }
            if row < 2 {
                let name = format!("Col {col}");
                let source_id = 1_000 + col as i64;
                layer
                    .add_edge_pair(v, v + 3, BLOCK_MM, source_id, Some(&name), 0, 0, walk, walk)
                    .unwrap();
            }
        }
    }
    layer
}

fn noon() -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

fn request(arrive_by: bool) -> PlanRequest {
    let mut request = PlanRequest::new(
        Location::new(0.0, 0.0005).named("Bakery"),
        Location::new(0.002, 0.0015),
        noon(),
    );
    request.arrive_by = arrive_by;
    request
}

#[test]
fn plan_walks_along_the_shortest_streets() {
    let layer = grid();
    let itinerary = plan(&layer, &RouterConfig::default(), &request(false)).unwrap();

    assert!((itinerary.walk_distance_m - 333.6).abs() < 1e-6);
    assert_eq!(itinerary.start_time, noon());
    assert!(itinerary.end_time > itinerary.start_time);
    assert_eq!(
        (itinerary.end_time - itinerary.start_time).num_milliseconds(),
        itinerary.duration_ms as i64
    );
    // 333.6 m at 1.33 m/s
    assert!((itinerary.duration_ms as f64 / 1000.0 - 250.8).abs() < 0.5);
    assert!(!itinerary.walk_limit_exceeded);

    assert_eq!(itinerary.from.name, "Bakery");
    assert_eq!(itinerary.from.orig.as_deref(), Some("Bakery"));
    assert_eq!(itinerary.from.vertex, 1);
    assert_eq!(itinerary.to.vertex, 7);
    assert_eq!(itinerary.to.name, "osm:id:8");

    let leg = &itinerary.legs[0];
    assert_eq!(leg.walk_steps.len(), 1);
    assert_eq!(leg.walk_steps[0].street_name, "Col 1");
    assert!((leg.walk_steps[0].distance_m - 222.4).abs() < 1e-6);
    assert_eq!(leg.geometry.0.first().map(|c| (c.y, c.x)), Some((0.0, 0.0005)));
    assert_eq!(leg.geometry.0.len(), 5);
}

#[test]
fn arrive_by_plans_the_same_trip_backwards() {
    let layer = grid();
    let config = RouterConfig::default();
    let depart = plan(&layer, &config, &request(false)).unwrap();
    let arrive = plan(&layer, &config, &request(true)).unwrap();

    assert_eq!(arrive.end_time, noon());
    assert_eq!(arrive.duration_ms, depart.duration_ms);
    assert!((arrive.walk_distance_m - depart.walk_distance_m).abs() < 1e-9);
    assert_eq!(arrive.legs[0].walk_steps, depart.legs[0].walk_steps);
    assert_eq!(arrive.from.vertex, depart.from.vertex);
    assert_eq!(arrive.to.vertex, depart.to.vertex);
}

#[test]
fn plan_reports_unsnappable_points() {
    let layer = grid();
    let mut request = request(false);
    request.to = Location::new(1.0, 1.0);

    let result = plan(&layer, &RouterConfig::default(), &request);
    assert!(matches!(result, Err(Error::NoSplitFound { .. })));
}

#[test]
fn plan_reports_disconnected_streets() {
    let mut layer = grid();
    let a = layer.add_vertex(0.01, 0.01, 100, None);
    let b = layer.add_vertex(0.01, 0.011, 101, None);
    let walk = EdgeFlags::ALLOWS_PEDESTRIAN;
    layer
        .add_edge_pair(a, b, BLOCK_MM, 3_000, Some("Island"), 0, 0, walk, walk)
        .unwrap();

    let mut request = request(false);
    request.to = Location::new(0.01, 0.0105);
    let result = plan(&layer, &RouterConfig::default(), &request);
    assert!(matches!(result, Err(Error::PathNotFound)));
}

#[test]
fn walk_limit_is_flagged_when_exceeded() {
    let layer = grid();
    let mut request = request(false);
    request.max_walk_meters = Some(100.0);

    let itinerary = plan(&layer, &RouterConfig::default(), &request).unwrap();
    assert!(itinerary.walk_limit_exceeded);
}

#[test]
fn itineraries_serialize_to_json() {
    let layer = grid();
    let itinerary = plan(&layer, &RouterConfig::default(), &request(false)).unwrap();
    let json = serde_json::to_value(&itinerary).unwrap();

    assert_eq!(json["legs"][0]["walk_steps"][0]["street_name"], "Col 1");
    assert_eq!(json["from"]["name"], "Bakery");
    assert_eq!(json["start_time"], "2024-05-01T12:00:00");
    assert_eq!(json["legs"][0]["mode"], "foot");
}

#[test]
fn plan_many_keeps_request_order() {
    let layer = grid();
    let mut failing = request(false);
    failing.from = Location::new(1.0, 1.0);

    let requests = [request(false), failing, request(true)];
    let results = plan_many(&layer, &RouterConfig::default(), &requests);
    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(Error::NoSplitFound { .. })));
    assert_eq!(results[2].as_ref().unwrap().end_time, noon());
}

#[test]
fn reachability_stops_at_the_limit() {
    let layer = grid();
    let config = RouterConfig::default();
    let tree = reachability(&layer, &config, 0.0, 0.0005, Some(100.0), None).unwrap();

    assert_eq!(tree.limit_m, 100);
    let vertices: Vec<_> = tree.reached.iter().map(|r| r.vertex).collect();
    assert_eq!(vertices, vec![0, 1]);
    assert!((tree.distance_to(1).unwrap() - 55.6).abs() < 1e-6);
    assert_eq!(tree.distance_to(4), None);

    let everything = reachability(&layer, &config, 0.0, 0.0005, None, None).unwrap();
    assert_eq!(everything.len(), 9);
}

#[test]
fn bulk_reachability_marks_failures() {
    let layer = grid();
    let trees = bulk_reachability(
        &layer,
        &RouterConfig::default(),
        &[(0.0, 0.0005), (1.0, 1.0)],
        Some(100.0),
        None,
    );
    assert_eq!(trees.len(), 2);
    assert_eq!(trees[0].as_ref().map(|t| t.len()), Some(2));
    assert!(trees[1].is_none());
}

#[test]
fn distance_matrix_is_symmetric_on_two_way_streets() {
    let layer = grid();
    let points = [(0.0, 0.0005), (0.002, 0.0015), (1.0, 1.0), (0.0, 0.0008)];
    let config = RouterConfig::default();
    let matrix = distance_matrix(&layer, &config, &points, Some(TransportMode::Foot));

    assert_eq!(matrix.len(), 4);
    assert_eq!(matrix[0][0], Some(0.0));
    assert!((matrix[0][1].unwrap() - 333.6).abs() < 1e-6);
    assert!((matrix[1][0].unwrap() - 333.6).abs() < 1e-6);
    assert!(matrix[2].iter().all(Option::is_none));
    assert!(matrix.iter().all(|row| row[2].is_none()));
    // Both points on the same block
    assert!((matrix[0][3].unwrap() - 33.36).abs() < 0.01);
}

fn trip(from: (f64, f64), to: (f64, f64)) -> PlanRequest {
    PlanRequest::new(
        Location::new(from.0, from.1),
        Location::new(to.0, to.1),
        noon(),
    )
}

#[test]
fn second_target_endpoint_gets_the_shortest_path() {
    // The origin lies halfway along OV0 - S; the destination is close to TV1
    // on a long street running west to TV0.
    let mut layer = StreetLayer::default();
    let tv0 = layer.add_vertex(0.0, -0.05, 1, None);
    let tv1 = layer.add_vertex(0.0, 0.01, 2, None);
    let ov0 = layer.add_vertex(0.005, 0.0, 3, None);
    let s = layer.add_vertex(0.003, 0.009, 4, None);
    let walk = EdgeFlags::ALLOWS_PEDESTRIAN;
    for (from, to, length_mm) in [
        (tv0, tv1, 6_672_000),
        (ov0, tv1, 1_250_000),
        (s, tv1, 360_000),
        (ov0, s, 1_030_000),
    ] {
        layer
            .add_edge_pair(from, to, length_mm, 10, None, 0, 0, walk, walk)
            .unwrap();
    }

    let config = RouterConfig::default();
    let request = trip((0.004, 0.0045), (0.0, 0.0095));
    let itinerary = plan(&layer, &config, &request).unwrap();
    // 515 m to S, 360 m to TV1, 55.6 m back along the long street
    assert!((itinerary.walk_distance_m - 930.6).abs() < 1e-6);
    assert_eq!(itinerary.from.vertex, s);
    assert_eq!(itinerary.to.vertex, tv1);

    let points = [(0.004, 0.0045), (0.0, 0.0095)];
    let matrix = distance_matrix(&layer, &config, &points, None);
    assert!((matrix[0][1].unwrap() - itinerary.walk_distance_m).abs() < 1e-6);
}

#[test]
fn points_on_the_same_street_are_joined_directly() {
    let mut layer = StreetLayer::default();
    let a = layer.add_vertex(0.0, 0.0, 1, None);
    let b = layer.add_vertex(0.0, 0.01, 2, None);
    let walk = EdgeFlags::ALLOWS_PEDESTRIAN;
    layer
        .add_edge_pair(a, b, 1_112_000, 10, Some("Main Street"), 0, 0, walk, walk)
        .unwrap();
    let config = RouterConfig::default();

    let request = trip((0.0, 0.004), (0.0, 0.006));
    let itinerary = plan(&layer, &config, &request).unwrap();
    assert!((itinerary.walk_distance_m - 222.4).abs() < 1e-6);
    // 222.4 m at 1.33 m/s
    assert!((itinerary.duration_ms as f64 / 1000.0 - 167.2).abs() < 0.1);

    let leg = &itinerary.legs[0];
    assert_eq!(leg.walk_steps.len(), 1);
    assert_eq!(leg.walk_steps[0].street_name, "Main Street");
    assert!((leg.walk_steps[0].distance_m - 222.4).abs() < 1e-6);
    let coords: Vec<_> = leg.geometry.0.iter().map(|c| (c.y, c.x)).collect();
    assert_eq!(coords, vec![(0.0, 0.004), (0.0, 0.006)]);

    let mut backwards = trip((0.0, 0.006), (0.0, 0.004));
    backwards.arrive_by = true;
    let itinerary = plan(&layer, &config, &backwards).unwrap();
    assert!((itinerary.walk_distance_m - 222.4).abs() < 1e-6);
    assert_eq!(itinerary.end_time, noon());
}

#[test]
fn one_way_destination_street_is_respected() {
    // Cars may only drive A -> B; pedestrians walk both ways
    let mut layer = StreetLayer::default();
    let a = layer.add_vertex(0.0, 0.0, 1, None);
    let b = layer.add_vertex(0.0, 0.01, 2, None);
    let c = layer.add_vertex(0.01, 0.01, 3, None);
    let all = EdgeFlags::ALLOWS_ALL;
    let walk = EdgeFlags::ALLOWS_PEDESTRIAN;
    layer
        .add_edge_pair(a, b, 1_112_000, 10, None, 0, 0, all, walk)
        .unwrap();
    layer
        .add_edge_pair(b, c, 1_112_000, 11, None, 0, 0, all, all)
        .unwrap();
    let config = RouterConfig::default();

    let mut drive = trip((0.005, 0.01), (0.0, 0.005));
    drive.mode = Some(TransportMode::Car);
    let result = plan(&layer, &config, &drive);
    assert!(matches!(result, Err(Error::PathNotFound)));

    drive.arrive_by = true;
    let result = plan(&layer, &config, &drive);
    assert!(matches!(result, Err(Error::PathNotFound)));

    let walk = trip((0.005, 0.01), (0.0, 0.005));
    let itinerary = plan(&layer, &config, &walk).unwrap();
    assert!((itinerary.walk_distance_m - 1112.0).abs() < 1e-6);
}

#[test]
fn leg_geometry_follows_bent_streets() {
    // An L-shaped street from A around a corner to B, then straight on to C
    let mut layer = StreetLayer::default();
    let a = layer.add_vertex(0.0, 0.0, 1, None);
    let b = layer.add_vertex(0.002, 0.002, 2, None);
    let c = layer.add_vertex(0.002, 0.004, 3, None);
    let walk = EdgeFlags::ALLOWS_PEDESTRIAN;
    let bent = layer
        .add_edge_pair(a, b, 444_800, 10, None, 0, 0, walk, walk)
        .unwrap();
    let corner = floating_to_fixed(0.002);
    layer
        .set_edge_geometry(bent, &[(0, 0), (0, corner), (corner, corner)])
        .unwrap();
    layer
        .add_edge_pair(b, c, 222_400, 11, None, 0, 0, walk, walk)
        .unwrap();

    let config = RouterConfig::default();
    let request = trip((0.0, 0.001), (0.002, 0.003));
    let itinerary = plan(&layer, &config, &request).unwrap();
    assert!((itinerary.walk_distance_m - 444.8).abs() < 1e-6);

    let coords: Vec<_> = itinerary.legs[0]
        .geometry
        .0
        .iter()
        .map(|c| (c.y, c.x))
        .collect();
    let expected = [(0.0, 0.001), (0.0, 0.002), (0.002, 0.002), (0.002, 0.003)];
    assert_eq!(coords.len(), expected.len());
    for (got, want) in coords.iter().zip(expected) {
        assert!((got.0 - want.0).abs() < 1e-9 && (got.1 - want.1).abs() < 1e-9);
    }
}
