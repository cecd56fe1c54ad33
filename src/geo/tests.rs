#[cfg(test)]
mod distance_tests {
    use crate::common::constants::test_constants::*;
    use crate::geo::{Coordinate, haversine_distance, is_near_home};

    fn coord(latitude: f64, longitude: f64) -> Coordinate {
        Coordinate::new(latitude, longitude).unwrap()
    }

    fn tokyo() -> Coordinate {
        coord(TEST_HOME_LATITUDE, TEST_HOME_LONGITUDE)
    }

    /// A sample a few meters east of home is inside a 100 m radius.
    #[test]
    fn test_tokyo_nearby_sample_is_home() {
        let sample = coord(35.6762, 139.6504);
        let distance = haversine_distance(&sample, &tokyo());
        assert!(
            (8.5..9.5).contains(&distance),
            "expected ~9 m at this latitude, got {distance}"
        );
        assert!(is_near_home(Some(&sample), &tokyo(), TEST_RADIUS));
    }

    /// A sample ~1.1 km north is outside a 100 m radius.
    #[test]
    fn test_tokyo_distant_sample_is_not_home() {
        let sample = coord(35.6862, 139.6503);
        let distance = haversine_distance(&sample, &tokyo());
        assert!((1100.0..1125.0).contains(&distance), "got {distance}");
        assert!(!is_near_home(Some(&sample), &tokyo(), TEST_RADIUS));
    }

    #[test]
    fn test_absent_sample_is_never_home() {
        assert!(!is_near_home(None, &tokyo(), TEST_RADIUS));
        assert!(!is_near_home(None, &tokyo(), 1_000_000.0));
    }

    #[test]
    fn test_invalid_radius_is_never_home() {
        let home = tokyo();
        assert!(!is_near_home(Some(&home), &home, -1.0));
        assert!(!is_near_home(Some(&home), &home, f64::NAN));
        assert!(!is_near_home(Some(&home), &home, f64::INFINITY));
    }

    #[test]
    fn test_zero_radius_matches_only_home_itself() {
        let home = tokyo();
        assert!(is_near_home(Some(&home), &home, 0.0));
        assert!(!is_near_home(Some(&coord(35.6762, 139.65031)), &home, 0.0));
    }

    /// One degree of longitude near the pole is a few hundred meters, not ~111 km.
    #[test]
    fn test_longitude_shrinks_near_pole() {
        let a = coord(89.99, 0.0);
        let b = coord(89.99, 1.0);
        let distance = haversine_distance(&a, &b);
        assert!(distance < 200.0, "got {distance}");
        assert!(distance > 0.0);
    }

    /// Points either side of the antimeridian are close, not half a world apart.
    #[test]
    fn test_antimeridian_is_continuous() {
        let west = coord(0.0, 179.9995);
        let east = coord(0.0, -179.9995);
        let distance = haversine_distance(&west, &east);
        assert!((100.0..125.0).contains(&distance), "got {distance}");
        assert!(is_near_home(Some(&west), &east, 150.0));
    }

    #[test]
    fn test_antipodal_points_are_finite() {
        let distance = haversine_distance(&coord(90.0, 0.0), &coord(-90.0, 0.0));
        assert!(distance.is_finite());
        let half_circumference = std::f64::consts::PI * 6_371_008.8;
        assert!((distance - half_circumference).abs() < 1.0);
    }

    #[test]
    fn test_poles_ignore_longitude() {
        let a = coord(90.0, -120.0);
        let b = coord(90.0, 45.0);
        assert!(haversine_distance(&a, &b) < 1e-6);
    }
}

#[cfg(test)]
mod coordinate_tests {
    use crate::common::validation::ValidationError;
    use crate::geo::{Coordinate, HomeLocation};

    #[test]
    fn test_coordinate_validation() {
        assert!(Coordinate::new(40.7128, -74.0060).is_ok());
        assert!(Coordinate::new(90.0, 180.0).is_ok());
        assert!(Coordinate::new(-90.0, -180.0).is_ok());

        assert!(matches!(
            Coordinate::new(91.0, 0.0),
            Err(ValidationError::CoordinateOutOfRange { field: "latitude", .. })
        ));
        assert!(matches!(
            Coordinate::new(0.0, -181.0),
            Err(ValidationError::CoordinateOutOfRange { field: "longitude", .. })
        ));
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_coordinate_parse() {
        let c = Coordinate::parse(" 35.6762", "139.6503 ").unwrap();
        assert_eq!(c.latitude, 35.6762);
        assert_eq!(c.longitude, 139.6503);

        assert!(matches!(
            Coordinate::parse("north", "139.0"),
            Err(ValidationError::Invalid { .. })
        ));
        assert!(Coordinate::parse("120", "0").is_err());
    }

    #[test]
    fn test_home_location_label() {
        let c = Coordinate::new(35.6762, 139.6503).unwrap();
        let home = HomeLocation::new(c, Some("  ".to_string()));
        assert_eq!(home.address, None);
        assert_eq!(home.label(), "35.676°N, 139.650°E");

        let home = HomeLocation::new(c, Some("Setagaya, Tokyo".to_string()));
        assert_eq!(home.label(), "Setagaya, Tokyo");
    }

    #[test]
    fn test_home_location_json_shape() {
        let c = Coordinate::new(35.6762, 139.6503).unwrap();
        let json = serde_json::to_string(&HomeLocation::new(c, None)).unwrap();
        assert_eq!(
            json,
            r#"{"coordinate":{"latitude":35.6762,"longitude":139.6503}}"#
        );
    }
}
