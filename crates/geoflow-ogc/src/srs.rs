//! Coordinate reference system transforms.
//!
//! Supports geographic WGS84 (EPSG:4326), spherical Web Mercator
//! (EPSG:3857, alias 900913) and the WGS84 UTM zones (EPSG:32601-32660 north,
//! EPSG:32701-32760 south). UTM uses the Krüger series to third order in `n`,
//! which is accurate to well below a millimetre inside a zone.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use crate::error::{OgcError, Result};

/// WGS84 semi-major axis in metres.
const WGS84_A: f64 = 6_378_137.0;
/// WGS84 flattening.
const WGS84_F: f64 = 1.0 / 298.257_223_563;
/// UTM central meridian scale factor.
const UTM_K0: f64 = 0.9996;
const UTM_FALSE_EASTING: f64 = 500_000.0;
const UTM_FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// A supported spatial reference system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Srs {
    /// Longitude/latitude in degrees.
    Wgs84,
    /// Spherical Web Mercator in metres.
    WebMercator,
    /// A UTM zone on WGS84.
    Utm { zone: u8, north: bool },
}

impl Srs {
    /// Resolve an EPSG code.
    pub fn from_epsg(code: i32) -> Result<Self> {
        match code {
            4326 => Ok(Self::Wgs84),
            3857 | 900913 => Ok(Self::WebMercator),
            32601..=32660 => Ok(Self::Utm {
                zone: (code - 32600) as u8,
                north: true,
            }),
            32701..=32760 => Ok(Self::Utm {
                zone: (code - 32700) as u8,
                north: false,
            }),
            other => Err(OgcError::UnsupportedSrid(other)),
        }
    }

    /// Convert a coordinate in this system to longitude/latitude degrees.
    fn to_geographic(self, [x, y]: [f64; 2]) -> [f64; 2] {
        match self {
            Self::Wgs84 => [x, y],
            Self::WebMercator => [
                (x / WGS84_A).to_degrees(),
                (2.0 * (y / WGS84_A).exp().atan() - FRAC_PI_2).to_degrees(),
            ],
            Self::Utm { zone, north } => utm_inverse(x, y, zone, north),
        }
    }

    /// Convert longitude/latitude degrees to this system.
    fn from_geographic(self, [lon, lat]: [f64; 2]) -> [f64; 2] {
        match self {
            Self::Wgs84 => [lon, lat],
            Self::WebMercator => [
                WGS84_A * lon.to_radians(),
                WGS84_A * (FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln(),
            ],
            Self::Utm { zone, north } => utm_forward(lon, lat, zone, north),
        }
    }
}

/// Transform a point between two EPSG codes.
pub fn transform_point(coord: [f64; 2], from: i32, to: i32) -> Result<[f64; 2]> {
    let source = Srs::from_epsg(from)?;
    let target = Srs::from_epsg(to)?;
    if source == target {
        return Ok(coord);
    }
    Ok(target.from_geographic(source.to_geographic(coord)))
}

/// Extract an EPSG code from the usual CRS spellings.
///
/// Accepts `EPSG:4326`, `urn:ogc:def:crs:EPSG::4326`,
/// `http://www.opengis.net/def/crs/EPSG/0/4326` and a bare `4326`.
pub fn parse_epsg(crs: &str) -> Option<i32> {
    let code = crs
        .trim()
        .rsplit(|c| c == ':' || c == '/')
        .next()?;
    code.parse().ok()
}

// ─────────────────────────────────────────────────────────────────────────────
// Transverse Mercator (Krüger series)
// ─────────────────────────────────────────────────────────────────────────────

struct Series {
    /// Rectifying radius.
    a: f64,
    alpha: [f64; 3],
    beta: [f64; 3],
    delta: [f64; 3],
    n: f64,
}

fn series() -> Series {
    let n = WGS84_F / (2.0 - WGS84_F);
    let n2 = n * n;
    let n3 = n2 * n;
    Series {
        a: WGS84_A / (1.0 + n) * (1.0 + n2 / 4.0 + n2 * n2 / 64.0),
        alpha: [
            n / 2.0 - 2.0 * n2 / 3.0 + 5.0 * n3 / 16.0,
            13.0 * n2 / 48.0 - 3.0 * n3 / 5.0,
            61.0 * n3 / 240.0,
        ],
        beta: [
            n / 2.0 - 2.0 * n2 / 3.0 + 37.0 * n3 / 96.0,
            n2 / 48.0 + n3 / 15.0,
            17.0 * n3 / 480.0,
        ],
        delta: [
            2.0 * n - 2.0 * n2 / 3.0 - 2.0 * n3,
            7.0 * n2 / 3.0 - 8.0 * n3 / 5.0,
            56.0 * n3 / 15.0,
        ],
        n,
    }
}

fn central_meridian(zone: u8) -> f64 {
    (f64::from(zone) - 1.0) * 6.0 - 180.0 + 3.0
}

fn utm_forward(lon: f64, lat: f64, zone: u8, north: bool) -> [f64; 2] {
    let s = series();
    let phi = lat.to_radians();
    let lambda = (lon - central_meridian(zone)).to_radians();

    let e = 2.0 * s.n.sqrt() / (1.0 + s.n);
    let t = (phi.sin().atanh() - e * (e * phi.sin()).atanh()).sinh();
    let xi_p = t.atan2(lambda.cos());
    let eta_p = (lambda.sin() / (1.0 + t * t).sqrt()).atanh();

    let mut xi = xi_p;
    let mut eta = eta_p;
    for (j, alpha) in s.alpha.iter().enumerate() {
        let k = 2.0 * (j as f64 + 1.0);
        xi += alpha * (k * xi_p).sin() * (k * eta_p).cosh();
        eta += alpha * (k * xi_p).cos() * (k * eta_p).sinh();
    }

    let northing_offset = if north { 0.0 } else { UTM_FALSE_NORTHING_SOUTH };
    [
        UTM_FALSE_EASTING + UTM_K0 * s.a * eta,
        northing_offset + UTM_K0 * s.a * xi,
    ]
}

fn utm_inverse(easting: f64, northing: f64, zone: u8, north: bool) -> [f64; 2] {
    let s = series();
    let northing_offset = if north { 0.0 } else { UTM_FALSE_NORTHING_SOUTH };
    let xi = (northing - northing_offset) / (UTM_K0 * s.a);
    let eta = (easting - UTM_FALSE_EASTING) / (UTM_K0 * s.a);

    let mut xi_p = xi;
    let mut eta_p = eta;
    for (j, beta) in s.beta.iter().enumerate() {
        let k = 2.0 * (j as f64 + 1.0);
        xi_p -= beta * (k * xi).sin() * (k * eta).cosh();
        eta_p -= beta * (k * xi).cos() * (k * eta).sinh();
    }

    let chi = (xi_p.sin() / eta_p.cosh()).asin();
    let mut phi = chi;
    for (j, delta) in s.delta.iter().enumerate() {
        let k = 2.0 * (j as f64 + 1.0);
        phi += delta * (k * chi).sin();
    }
    let lambda = eta_p.sinh().atan2(xi_p.cos());

    [central_meridian(zone) + lambda.to_degrees(), phi.to_degrees()]
}
