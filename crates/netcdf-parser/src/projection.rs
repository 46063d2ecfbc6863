//! GOES ABI fixed-grid projection.
//!
//! ABI rasters are laid out on scan angles (radians) as seen from the
//! satellite. `x` is the east-west sweep angle and `y` the north-south
//! elevation angle; both are zero at the sub-satellite point.
//!
//! Formulas follow the GOES-R Product Definition and Users' Guide (PUG)
//! Volume 4, Section 4.2.8.

use serde::{Deserialize, Serialize};

/// Parameters of the `goes_imager_projection` variable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoesProjection {
    /// Longitude of the sub-satellite point (degrees)
    pub lon0: f64,
    /// Satellite height above the ellipsoid (meters)
    pub h: f64,
    /// Equatorial radius (meters)
    pub semi_major_axis: f64,
    /// Polar radius (meters)
    pub semi_minor_axis: f64,
}

impl Default for GoesProjection {
    /// GOES-16 operational position (GOES-East, 75.2°W).
    fn default() -> Self {
        Self {
            lon0: -75.2,
            h: 35_786_023.0,
            semi_major_axis: 6_378_137.0,
            semi_minor_axis: 6_356_752.314_14,
        }
    }
}

impl GoesProjection {
    /// Scan angles (radians) to `(longitude, latitude)` in degrees.
    ///
    /// Returns `None` when the line of sight misses the Earth.
    pub fn to_geographic(&self, x_rad: f64, y_rad: f64) -> Option<(f64, f64)> {
        let req = self.semi_major_axis;
        let rpol = self.semi_minor_axis;
        let axis_ratio_sq = (req / rpol).powi(2);
        let dist = self.h + req;

        let (sin_x, cos_x) = x_rad.sin_cos();
        let (sin_y, cos_y) = y_rad.sin_cos();

        // Distance from the satellite to the surface along the line of sight
        // is the smaller root of a*rs^2 + b*rs + c = 0.
        let a = sin_x.powi(2) + cos_x.powi(2) * (cos_y.powi(2) + axis_ratio_sq * sin_y.powi(2));
        let b = -2.0 * dist * cos_x * cos_y;
        let c = dist.powi(2) - req.powi(2);

        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 {
            return None;
        }
        let rs = (-b - discriminant.sqrt()) / (2.0 * a);

        let sx = rs * cos_x * cos_y;
        let sy = -rs * sin_x;
        let sz = rs * cos_x * sin_y;

        let lat = (axis_ratio_sq * sz / (dist - sx).hypot(sy)).atan();
        let lon = self.lon0.to_radians() - sy.atan2(dist - sx);

        Some((lon.to_degrees(), lat.to_degrees()))
    }

    /// `(longitude, latitude)` in degrees to scan angles (radians).
    ///
    /// Returns `None` for points on the far side of the Earth.
    pub fn from_geographic(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        let req = self.semi_major_axis;
        let rpol = self.semi_minor_axis;
        let dist = self.h + req;

        let phi_c = ((rpol / req).powi(2) * lat.to_radians().tan()).atan();
        let e2 = 1.0 - (rpol / req).powi(2);
        let rc = rpol / (1.0 - e2 * phi_c.cos().powi(2)).sqrt();

        let dlon = lon.to_radians() - self.lon0.to_radians();
        let sx = dist - rc * phi_c.cos() * dlon.cos();
        let sy = -rc * phi_c.cos() * dlon.sin();
        let sz = rc * phi_c.sin();

        // Hidden behind the limb.
        if dist * (dist - sx) < sy.powi(2) + (req / rpol).powi(2) * sz.powi(2) {
            return None;
        }

        let range = (sx.powi(2) + sy.powi(2) + sz.powi(2)).sqrt();
        let x_rad = (-sy / range).asin();
        let y_rad = (sz / sx).atan();

        Some((x_rad, y_rad))
    }

    /// Projection-plane meters (scan angle times `h`) to geographic degrees.
    pub fn meters_to_geographic(&self, x_m: f64, y_m: f64) -> Option<(f64, f64)> {
        self.to_geographic(x_m / self.h, y_m / self.h)
    }
}
