use geo::HaversineDistance;
use geo::Point;
use linegraph_common::Coordinate;

/// Great-circle distance between two coordinates in metres
#[allow(deprecated)]
pub fn haversine_distance(a: Coordinate, b: Coordinate) -> f64 {
    let p1 = Point::new(a.lng, a.lat);
    let p2 = Point::new(b.lng, b.lat);
    p1.haversine_distance(&p2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let d = haversine_distance(Coordinate::new(4.35, 50.0), Coordinate::new(4.35, 51.0));
        assert!((d - 111_195.0).abs() < 100.0, "got {d}");
    }

    #[test]
    fn distance_is_symmetric_and_zero_on_identity() {
        let a = Coordinate::new(7.4246, 43.7384);
        let b = Coordinate::new(7.4268, 43.7403);
        assert_eq!(haversine_distance(a, a), 0.0);
        assert!((haversine_distance(a, b) - haversine_distance(b, a)).abs() < 1e-9);
    }
}
