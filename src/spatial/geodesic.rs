//! Distances on the WGS-84 ellipsoid.

use crate::types::Point;

const WGS84_A: f64 = 6_378_137.0;
const WGS84_F: f64 = 1.0 / 298.257_223_563;
const WGS84_B: f64 = WGS84_A * (1.0 - WGS84_F);
const MEAN_EARTH_RADIUS_M: f64 = 6_371_008.8;
const MAX_ITERATIONS: usize = 200;

/// Approximate metres per degree of latitude, used to turn metric radii
/// into coordinate-space radii.
pub const METERS_PER_DEGREE: f64 = 111_139.0;

/// Geodesic distance in metres between two lon/lat points (Vincenty's
/// inverse formula). Falls back to the great-circle distance for the
/// nearly antipodal pairs where the iteration does not converge.
pub fn geodesic_distance(a: &Point, b: &Point) -> f64 {
    if a == b {
        return 0.0;
    }
    let l = (b.x - a.x).to_radians();
    let u1 = ((1.0 - WGS84_F) * a.y.to_radians().tan()).atan();
    let u2 = ((1.0 - WGS84_F) * b.y.to_radians().tan()).atan();
    let (sin_u1, cos_u1) = u1.sin_cos();
    let (sin_u2, cos_u2) = u2.sin_cos();

    let mut lambda = l;
    for _ in 0..MAX_ITERATIONS {
        let (sin_lambda, cos_lambda) = lambda.sin_cos();
        let sin_sigma = ((cos_u2 * sin_lambda).powi(2)
            + (cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda).powi(2))
        .sqrt();
        if sin_sigma == 0.0 {
            return 0.0;
        }
        let cos_sigma = sin_u1 * sin_u2 + cos_u1 * cos_u2 * cos_lambda;
        let sigma = sin_sigma.atan2(cos_sigma);
        let sin_alpha = cos_u1 * cos_u2 * sin_lambda / sin_sigma;
        let cos2_alpha = 1.0 - sin_alpha * sin_alpha;
        let cos_2sigma_m = if cos2_alpha == 0.0 {
            0.0
        } else {
            cos_sigma - 2.0 * sin_u1 * sin_u2 / cos2_alpha
        };
        let c = WGS84_F / 16.0 * cos2_alpha * (4.0 + WGS84_F * (4.0 - 3.0 * cos2_alpha));
        let previous = lambda;
        lambda = l
            + (1.0 - c)
                * WGS84_F
                * sin_alpha
                * (sigma
                    + c * sin_sigma
                        * (cos_2sigma_m + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)));

        if (lambda - previous).abs() < 1e-12 {
            let u_sq = cos2_alpha * (WGS84_A * WGS84_A - WGS84_B * WGS84_B) / (WGS84_B * WGS84_B);
            let big_a = 1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
            let big_b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));
            let delta_sigma = big_b
                * sin_sigma
                * (cos_2sigma_m
                    + big_b / 4.0
                        * (cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)
                            - big_b / 6.0
                                * cos_2sigma_m
                                * (-3.0 + 4.0 * sin_sigma * sin_sigma)
                                * (-3.0 + 4.0 * cos_2sigma_m * cos_2sigma_m)));
            return WGS84_B * big_a * (sigma - delta_sigma);
        }
    }
    haversine_distance(a, b)
}

pub fn haversine_distance(a: &Point, b: &Point) -> f64 {
    let d_lat = (b.y - a.y).to_radians();
    let d_lon = (b.x - a.x).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.y.to_radians().cos() * b.y.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * MEAN_EARTH_RADIUS_M * h.sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_degree_of_latitude_at_equator() {
        let d = geodesic_distance(&Point::new(0.0, 0.0), &Point::new(0.0, 1.0));
        assert!((d - 110_574.4).abs() < 1.0, "got {}", d);
    }

    #[test]
    fn chicago_block_distance_is_close_to_haversine() {
        let a = Point::new(-87.6298, 41.8781);
        let b = Point::new(-87.6244, 41.8569);
        let vincenty = geodesic_distance(&a, &b);
        let haversine = haversine_distance(&a, &b);
        assert!((vincenty - haversine).abs() / vincenty < 0.01);
        assert!(vincenty > 2_000.0 && vincenty < 3_000.0);
    }

    #[test]
    fn identical_points_are_zero_apart() {
        let p = Point::new(-87.6, 41.8);
        assert_eq!(geodesic_distance(&p, &p), 0.0);
    }
}
