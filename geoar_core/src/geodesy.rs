//! The Geodetic Transform - geographic ⇄ ECEF ⇄ local ENU
//!
//! Pure, stateless functions over an ellipsoidal earth model:
//! - Geodetic (lat/lon/alt) to Earth-Centered Earth-Fixed (ECEF) and back
//! - ECEF displacements rotated into the East-North-Up tangent plane of an
//!   observer, and ENU offsets rotated back into geographic points
//!
//! # Numeric edge cases
//!
//! No input validation is performed. Callers must keep latitude within
//! [-90, 90] and longitude within [-180, 180]. The closed-form ECEF inverse
//! is ill-conditioned at the poles and for points with `r ≈ 0` (on the
//! rotation axis); coincident or polar inputs may produce NaN or very large
//! values. This is deliberate: no clamping strategy is applied.

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::location::{AltitudeMode, GeoPoint};

/// Reference ellipsoid parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ellipsoid {
    /// Equatorial radius `a`, in meters
    pub equatorial_radius_m: f64,

    /// First eccentricity squared `e²`
    pub first_eccentricity_squared: f64,
}

impl Default for Ellipsoid {
    fn default() -> Self {
        Self::WGS84
    }
}

/// A horizontal displacement in the local tangent plane, in meters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EnuVector {
    pub east: f64,
    pub north: f64,
}

impl EnuVector {
    /// Length of the displacement, in meters.
    pub fn magnitude(&self) -> f64 {
        self.east.hypot(self.north)
    }
}

/// A 3D displacement between two geographic points, in meters.
///
/// Components are named rather than positional so altitude handling stays
/// explicit; `to_world_vector()` packs them in the (x = east, y = height,
/// z = north) order used by the placement layer.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Displacement {
    pub east: f64,
    pub height: f64,
    pub north: f64,
}

impl Displacement {
    /// Packs the displacement as `(east, height, north)`.
    pub fn to_world_vector(&self) -> Vector3<f64> {
        Vector3::new(self.east, self.height, self.north)
    }
}

impl Ellipsoid {
    /// The WGS84 reference ellipsoid.
    pub const WGS84: Ellipsoid = Ellipsoid {
        equatorial_radius_m: 6_378_137.0,
        first_eccentricity_squared: 0.00669437999014,
    };

    /// Geodetic to ECEF.
    ///
    /// Uses the prime-vertical radius of curvature
    /// `N = a / sqrt(1 - e²·sin²(lat))`. The point's effective altitude is
    /// added along the ellipsoid normal, so `Ignore` mode points sit on the
    /// ellipsoid surface.
    pub fn to_ecef(&self, p: &GeoPoint) -> Vector3<f64> {
        let a = self.equatorial_radius_m;
        let e2 = self.first_eccentricity_squared;

        let lat = p.latitude.to_radians();
        let lon = p.longitude.to_radians();
        let h = p.effective_altitude();

        let (slat, clat) = lat.sin_cos();
        let (slon, clon) = lon.sin_cos();

        let n = a / (1.0 - e2 * slat * slat).sqrt();

        Vector3::new(
            (n + h) * clat * clon,
            (n + h) * clat * slon,
            ((1.0 - e2) * n + h) * slat,
        )
    }

    /// ECEF to geodetic, closed form (no iteration).
    ///
    /// The returned point uses `GroundRelative` altitude mode. Undefined at
    /// the poles and on the rotation axis (`r = 0`).
    pub fn ecef_to_geo(&self, ecef: &Vector3<f64>) -> GeoPoint {
        let a = self.equatorial_radius_m;
        let e2 = self.first_eccentricity_squared;
        let b = a * (1.0 - e2).sqrt();

        let (x, y, z) = (ecef.x, ecef.y, ecef.z);

        let a2 = a * a;
        let b2 = b * b;
        let z2 = z * z;

        let r = (x * x + y * y).sqrt();
        let r2 = r * r;

        let big_e2 = (a2 - b2) / b2;
        let f = 54.0 * b2 * z2;
        let g = r2 + (1.0 - e2) * z2 - e2 * (a2 - b2);
        let c = (e2 * e2 * f * r2) / (g * g * g);
        let s = (1.0 + c + (c * c + 2.0 * c).sqrt()).cbrt();
        let k = s + 1.0 / s + 1.0;
        let p = f / (3.0 * k * k * g * g);
        let q = (1.0 + 2.0 * e2 * e2 * p).sqrt();
        let r0 = -(p * e2 * r) / (1.0 + q)
            + (0.5 * a2 * (1.0 + 1.0 / q) - (p * (1.0 - e2) * z2) / (q * (1.0 + q)) - 0.5 * p * r2)
                .sqrt();
        let t = r - e2 * r0;
        let u = (t * t + z2).sqrt();
        let v = (t * t + (1.0 - e2) * z2).sqrt();
        let z0 = (b2 * z) / (a * v);

        let h = u * (1.0 - b2 / (a * v));
        let phi = ((z + big_e2 * z0) / r).atan();
        let lambda = y.atan2(x);

        GeoPoint {
            latitude: phi.to_degrees(),
            longitude: lambda.to_degrees(),
            altitude: h,
            altitude_mode: AltitudeMode::GroundRelative,
            label: None,
        }
    }

    /// Horizontal ENU displacement from `origin` to `target`.
    ///
    /// The ECEF delta is rotated into the tangent plane at `origin`. The
    /// "up" component is not computed.
    pub fn enu_vector(&self, origin: &GeoPoint, target: &GeoPoint) -> EnuVector {
        let delta = self.to_ecef(target) - self.to_ecef(origin);
        let enu = ecef_to_enu_rotation(origin) * delta;

        EnuVector {
            east: enu.x,
            north: enu.y,
        }
    }

    /// Geographic point at ENU offset `(e, n, u)` meters from `origin`.
    pub fn point_from_enu(&self, origin: &GeoPoint, e: f64, n: f64, u: f64) -> GeoPoint {
        let delta = ecef_to_enu_rotation(origin).transpose() * Vector3::new(e, n, u);
        self.ecef_to_geo(&(self.to_ecef(origin) + delta))
    }

    /// Magnitude of `enu_vector(a, b)`, in meters.
    pub fn horizontal_distance(&self, a: &GeoPoint, b: &GeoPoint) -> f64 {
        self.enu_vector(a, b).magnitude()
    }

    /// Straight-line distance combining horizontal distance and altitude difference.
    pub fn distance_with_altitude(&self, a: &GeoPoint, b: &GeoPoint) -> f64 {
        let d = self.horizontal_distance(a, b);
        let h = (a.effective_altitude() - b.effective_altitude()).abs();

        (d * d + h * h).sqrt()
    }

    /// 3D displacement from `a` to `b`.
    ///
    /// If `ignore_height` is set the height component is zero.
    pub fn vector_from_to(&self, a: &GeoPoint, b: &GeoPoint, ignore_height: bool) -> Displacement {
        let horizontal = self.enu_vector(a, b);
        let height = if ignore_height {
            0.0
        } else {
            b.effective_altitude() - a.effective_altitude()
        };

        Displacement {
            east: horizontal.east,
            height,
            north: horizontal.north,
        }
    }

    /// World-space position for `object_location`, given the observer's
    /// world position and geographic location.
    ///
    /// World axes are x = east, y = up, z = north. With `height_is_relative`
    /// the object's altitude is taken as an absolute world `y` instead of an
    /// offset from the observer.
    pub fn position_for_location(
        &self,
        user_position: &Vector3<f64>,
        user_location: &GeoPoint,
        object_location: &GeoPoint,
        height_is_relative: bool,
    ) -> Vector3<f64> {
        let displacement = self
            .vector_from_to(
                user_location,
                object_location,
                object_location.ignore_altitude() || height_is_relative,
            )
            .to_world_vector();

        let y_correction = if height_is_relative && !object_location.ignore_altitude() {
            object_location.altitude - user_position.y
        } else {
            0.0
        };

        user_position + displacement + Vector3::new(0.0, y_correction, 0.0)
    }

    /// Geographic location of a world-space position, given the observer's
    /// world position (`center`) and geographic location.
    ///
    /// Only the horizontal offset is used.
    pub fn location_for_world_position(
        &self,
        center: &Vector3<f64>,
        user_location: &GeoPoint,
        world_position: &Vector3<f64>,
    ) -> GeoPoint {
        let n = world_position.z - center.z;
        let e = world_position.x - center.x;

        self.point_from_enu(user_location, e, n, 0.0)
    }
}

/// Rotation taking ECEF deltas into (east, north, up) at `origin`.
fn ecef_to_enu_rotation(origin: &GeoPoint) -> Matrix3<f64> {
    let (slat, clat) = origin.latitude.to_radians().sin_cos();
    let (slon, clon) = origin.longitude.to_radians().sin_cos();

    Matrix3::new(
        -slon, clon, 0.0,
        -slat * clon, -slat * slon, clat,
        clat * clon, clat * slon, slat,
    )
}

// ========== WGS84 convenience functions ==========

/// Geodetic to ECEF on WGS84.
pub fn to_ecef(p: &GeoPoint) -> Vector3<f64> {
    Ellipsoid::WGS84.to_ecef(p)
}

/// ECEF to geodetic on WGS84.
pub fn ecef_to_geo(ecef: &Vector3<f64>) -> GeoPoint {
    Ellipsoid::WGS84.ecef_to_geo(ecef)
}

/// Horizontal ENU displacement on WGS84.
pub fn enu_vector(origin: &GeoPoint, target: &GeoPoint) -> EnuVector {
    Ellipsoid::WGS84.enu_vector(origin, target)
}

/// Point at an ENU offset on WGS84.
pub fn point_from_enu(origin: &GeoPoint, e: f64, n: f64, u: f64) -> GeoPoint {
    Ellipsoid::WGS84.point_from_enu(origin, e, n, u)
}

/// Horizontal distance on WGS84, in meters.
pub fn horizontal_distance(a: &GeoPoint, b: &GeoPoint) -> f64 {
    Ellipsoid::WGS84.horizontal_distance(a, b)
}

/// Distance including altitude difference on WGS84, in meters.
pub fn distance_with_altitude(a: &GeoPoint, b: &GeoPoint) -> f64 {
    Ellipsoid::WGS84.distance_with_altitude(a, b)
}

/// 3D displacement on WGS84.
pub fn vector_from_to(a: &GeoPoint, b: &GeoPoint, ignore_height: bool) -> Displacement {
    Ellipsoid::WGS84.vector_from_to(a, b, ignore_height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use proptest::prelude::*;

    #[test]
    fn test_equator_prime_meridian_ecef() {
        let ecef = to_ecef(&GeoPoint::new(0.0, 0.0, 0.0));
        assert_relative_eq!(ecef.x, 6_378_137.0, epsilon = 1e-6);
        assert_abs_diff_eq!(ecef.y, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(ecef.z, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_round_trip_known_point() {
        let p = GeoPoint::new(-22.9068, -43.1729, 11.0);
        let back = ecef_to_geo(&to_ecef(&p));
        assert_abs_diff_eq!(back.latitude, p.latitude, epsilon = 1e-6);
        assert_abs_diff_eq!(back.longitude, p.longitude, epsilon = 1e-6);
        assert_abs_diff_eq!(back.altitude, p.altitude, epsilon = 1e-3);
    }

    #[test]
    fn test_one_millidegree_north_at_equator() {
        let a = GeoPoint::new(0.0, 0.0, 0.0);
        let b = GeoPoint::new(0.001, 0.0, 0.0);
        let v = enu_vector(&a, &b);

        // One millidegree of latitude is ~110.57 m at the equator
        assert_abs_diff_eq!(v.east, 0.0, epsilon = 1e-6);
        assert!((v.north - 110.57).abs() < 0.05, "north = {}", v.north);
    }

    #[test]
    fn test_east_offset_is_positive_east() {
        let a = GeoPoint::new(45.0, 7.0, 0.0);
        let b = GeoPoint::new(45.0, 7.001, 0.0);
        let v = enu_vector(&a, &b);
        assert!(v.east > 78.0 && v.east < 79.0, "east = {}", v.east);
        assert!(v.north.abs() < 0.01);
    }

    #[test]
    fn test_altitude_does_not_affect_horizontal_distance_directly_above() {
        let a = GeoPoint::new(51.5, -0.12, 0.0);
        let b = GeoPoint::new(51.5, -0.12, 300.0);
        assert_abs_diff_eq!(horizontal_distance(&a, &b), 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(distance_with_altitude(&a, &b), 300.0, epsilon = 1e-6);
    }

    #[test]
    fn test_ignore_mode_drops_altitude_from_distance() {
        let a = GeoPoint::new(51.5, -0.12, 0.0);
        let b = GeoPoint::new(51.5, -0.12, 300.0).with_altitude_mode(AltitudeMode::Ignore);
        assert_abs_diff_eq!(distance_with_altitude(&a, &b), 0.0, epsilon = 1e-6);
        assert_eq!(vector_from_to(&a, &b, false).height, 0.0);
    }

    #[test]
    fn test_vector_from_to_ignore_height() {
        let a = GeoPoint::new(10.0, 10.0, 5.0);
        let b = GeoPoint::new(10.0005, 10.0005, 25.0);
        let with_height = vector_from_to(&a, &b, false);
        let flat = vector_from_to(&a, &b, true);

        assert_relative_eq!(with_height.height, 20.0, epsilon = 1e-9);
        assert_eq!(flat.height, 0.0);
        assert_relative_eq!(with_height.east, flat.east, epsilon = 1e-9);
        assert_relative_eq!(with_height.north, flat.north, epsilon = 1e-9);

        let w = with_height.to_world_vector();
        assert_eq!(w.x, with_height.east);
        assert_eq!(w.y, with_height.height);
        assert_eq!(w.z, with_height.north);
    }

    #[test]
    fn test_position_and_location_for_world_position_invert() {
        let user = GeoPoint::new(48.8584, 2.2945, 0.0);
        let object = GeoPoint::new(48.8590, 2.2950, 0.0);
        let user_position = Vector3::new(3.0, 1.5, -2.0);

        let world = Ellipsoid::WGS84.position_for_location(&user_position, &user, &object, false);
        let back = Ellipsoid::WGS84.location_for_world_position(&user_position, &user, &world);

        assert!(horizontal_distance(&back, &object) < 1e-3);
    }

    #[test]
    fn test_position_for_location_relative_height() {
        let user = GeoPoint::new(48.8584, 2.2945, 100.0);
        let object = GeoPoint::new(48.8584, 2.2946, 4.0);
        let user_position = Vector3::new(0.0, 1.5, 0.0);

        let world = Ellipsoid::WGS84.position_for_location(&user_position, &user, &object, true);

        // Height is the object's altitude taken as world y
        assert_relative_eq!(world.y, 4.0, epsilon = 1e-9);
    }

    proptest! {
        #[test]
        fn prop_ecef_round_trip(
            lat in -80.0f64..80.0,
            lon in -180.0f64..180.0,
            alt in -1000.0f64..10000.0,
        ) {
            let p = GeoPoint::new(lat, lon, alt);
            let back = ecef_to_geo(&to_ecef(&p));
            prop_assert!((back.latitude - lat).abs() < 1e-6);
            prop_assert!((back.longitude - lon).abs() < 1e-6);
            prop_assert!((back.altitude - alt).abs() < 1e-3);
        }

        #[test]
        fn prop_enu_inverse_consistency(
            lat in -80.0f64..80.0,
            lon in -179.0f64..179.0,
            alt in -100.0f64..2000.0,
            dlat in -0.005f64..0.005,
            dlon in -0.005f64..0.005,
        ) {
            let origin = GeoPoint::new(lat, lon, alt);
            let target = GeoPoint::new(lat + dlat, lon + dlon, alt);
            let v = enu_vector(&origin, &target);
            let back = point_from_enu(&origin, v.east, v.north, 0.0);
            prop_assert!(horizontal_distance(&target, &back) < 1e-4);
        }
    }
}
