//! Ellipsoid geometry: geodetic <-> Cartesian conversion, surface normals
//! and tangent plane projection.

use crate::models::Waypoint;
use std::ops::{Add, Mul, Sub};

/// WGS-84 semi-major axis in meters
pub const WGS84_A: f64 = 6_378_137.0;
/// WGS-84 semi-minor axis in meters
pub const WGS84_B: f64 = 6_356_752.314_245_179;

const GEODETIC_ITERATIONS: usize = 10;

/// Cartesian vector in meters (Earth-centered, Earth-fixed).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn dot(&self, other: &Vec3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn length_squared(&self) -> f64 {
        self.dot(self)
    }

    pub fn length(&self) -> f64 {
        self.length_squared().sqrt()
    }

    /// Unit vector in the same direction, or zero for a zero vector.
    pub fn normalize(&self) -> Vec3 {
        let len = self.length();
        if len <= f64::EPSILON {
            return Vec3::ZERO;
        }
        *self * (1.0 / len)
    }

    /// Component of `self` orthogonal to `normal`.
    ///
    /// `normal` need not be unit length. A zero normal yields a zero vector.
    pub fn project_onto_plane(&self, normal: &Vec3) -> Vec3 {
        let n2 = normal.length_squared();
        if n2 <= f64::EPSILON {
            return Vec3::ZERO;
        }
        *self - *normal * (self.dot(normal) / n2)
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Vec3;
    fn mul(self, rhs: f64) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// Rotational ellipsoid described by its equatorial and polar radii.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    equatorial_radius_m: f64,
    polar_radius_m: f64,
    /// First eccentricity squared
    e2: f64,
}

impl Default for Ellipsoid {
    fn default() -> Self {
        Self::WGS84
    }
}

impl Ellipsoid {
    pub const WGS84: Ellipsoid = Ellipsoid {
        equatorial_radius_m: WGS84_A,
        polar_radius_m: WGS84_B,
        e2: 1.0 - (WGS84_B * WGS84_B) / (WGS84_A * WGS84_A),
    };

    pub fn new(equatorial_radius_m: f64, polar_radius_m: f64) -> Self {
        let a2 = equatorial_radius_m * equatorial_radius_m;
        let b2 = polar_radius_m * polar_radius_m;
        Self {
            equatorial_radius_m,
            polar_radius_m,
            e2: 1.0 - b2 / a2,
        }
    }

    pub fn sphere(radius_m: f64) -> Self {
        Self::new(radius_m, radius_m)
    }

    pub fn equatorial_radius_m(&self) -> f64 {
        self.equatorial_radius_m
    }

    pub fn polar_radius_m(&self) -> f64 {
        self.polar_radius_m
    }

    /// Prime vertical radius of curvature at a geodetic latitude.
    fn prime_vertical_radius(&self, sin_lat: f64) -> f64 {
        self.equatorial_radius_m / (1.0 - self.e2 * sin_lat * sin_lat).sqrt()
    }

    /// Convert a geodetic position (degrees, meters) to Cartesian.
    pub fn to_cartesian(&self, point: &Waypoint) -> Vec3 {
        let lat = point.lat.to_radians();
        let lon = point.lon.to_radians();
        let (sin_lat, cos_lat) = lat.sin_cos();
        let (sin_lon, cos_lon) = lon.sin_cos();

        let n = self.prime_vertical_radius(sin_lat);

        Vec3 {
            x: (n + point.height_m) * cos_lat * cos_lon,
            y: (n + point.height_m) * cos_lat * sin_lon,
            z: (n * (1.0 - self.e2) + point.height_m) * sin_lat,
        }
    }

    /// Convert a Cartesian position back to geodetic coordinates.
    pub fn to_geodetic(&self, point: Vec3) -> Waypoint {
        let p = (point.x * point.x + point.y * point.y).sqrt();
        let lon = point.y.atan2(point.x);

        if p <= f64::EPSILON {
            // On the polar axis
            let lat = if point.z >= 0.0 { 90.0 } else { -90.0 };
            return Waypoint::new(0.0, lat, point.z.abs() - self.polar_radius_m);
        }

        let a2 = self.equatorial_radius_m * self.equatorial_radius_m;
        let mut lat = point.z.atan2(p * (1.0 - self.e2));
        let mut height = 0.0;
        for _ in 0..GEODETIC_ITERATIONS {
            let (sin_lat, cos_lat) = lat.sin_cos();
            let n = self.prime_vertical_radius(sin_lat);
            // Stable at any latitude, unlike p / cos(lat) - n.
            height = p * cos_lat + point.z * sin_lat - a2 / n;
            lat = point.z.atan2(p * (1.0 - self.e2 * n / (n + height)));
        }

        Waypoint::new(lon.to_degrees(), lat.to_degrees(), height)
    }

    /// Outward unit geodetic normal at a Cartesian position.
    pub fn surface_normal(&self, point: Vec3) -> Vec3 {
        let a2 = self.equatorial_radius_m * self.equatorial_radius_m;
        let b2 = self.polar_radius_m * self.polar_radius_m;
        Vec3::new(point.x / a2, point.y / a2, point.z / b2).normalize()
    }
}
