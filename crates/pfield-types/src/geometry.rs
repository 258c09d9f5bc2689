// ─────────────────────────────────────────────────────────────────────
// PField — Geometry
// License: GNU AGPL v3
// ─────────────────────────────────────────────────────────────────────
//! Electrode shapes.
//!
//! One tagged enum covers every shape the GUI can emit. The `type` tag and
//! field names follow the `ElectrodeConfig_<n>.json` schema, so a file
//! deserializes straight into `Vec<Electrode>`. All containment tests are
//! inclusive on the surface.

use crate::error::{PfieldError, PfieldResult};
use serde::{de, Deserialize, Deserializer, Serialize};

/// Symmetry axis of a rotational shape.
///
/// The GUI stores the axis as free text: blank means `z`, otherwise the
/// first character decides, case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Axis {
    #[serde(rename = "x")]
    X,
    #[serde(rename = "y")]
    Y,
    #[default]
    #[serde(rename = "z")]
    Z,
}

impl<'de> Deserialize<'de> for Axis {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Axis::from_text(&raw).ok_or_else(|| {
            de::Error::custom(format!("axis must be blank or start with x, y or z, got '{raw}'"))
        })
    }
}

impl Axis {
    /// Parse GUI axis text; `None` when the first character is not an axis.
    pub fn from_text(raw: &str) -> Option<Axis> {
        match raw.trim().chars().next().map(|c| c.to_ascii_lowercase()) {
            None => Some(Axis::Z),
            Some('x') => Some(Axis::X),
            Some('y') => Some(Axis::Y),
            Some('z') => Some(Axis::Z),
            Some(_) => None,
        }
    }

    /// Split a point into (axial coordinate, two transverse coordinates),
    /// all relative to `centre`.
    #[inline]
    fn decompose(self, p: [f64; 3], centre: [f64; 3]) -> (f64, f64, f64) {
        let d = [p[0] - centre[0], p[1] - centre[1], p[2] - centre[2]];
        match self {
            Axis::X => (d[0], d[1], d[2]),
            Axis::Y => (d[1], d[0], d[2]),
            Axis::Z => (d[2], d[0], d[1]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Electrode {
    /// Solid cylinder from the base centre `c` along `axis` for `height`.
    Cylinder {
        potential: f64,
        cx: f64,
        cy: f64,
        cz: f64,
        radius: f64,
        height: f64,
        #[serde(default)]
        axis: Axis,
    },
    /// Slab of `thickness` centred on the plane `A x + B y + C z + D = 0`.
    Plate {
        potential: f64,
        #[serde(rename = "A")]
        a: f64,
        #[serde(rename = "B")]
        b: f64,
        #[serde(rename = "C")]
        c: f64,
        #[serde(rename = "D")]
        d: f64,
        thickness: f64,
    },
    /// Tube of wall `thickness` centred on `radius`.
    HollowRod {
        potential: f64,
        cx: f64,
        cy: f64,
        cz: f64,
        radius: f64,
        thickness: f64,
        height: f64,
        #[serde(default)]
        axis: Axis,
    },
    #[serde(rename = "Ellipsoidal", alias = "Ellipsoid")]
    Ellipsoid {
        potential: f64,
        cx: f64,
        cy: f64,
        cz: f64,
        rx: f64,
        ry: f64,
        rz: f64,
    },
    /// Quadric `Σ ((p - c)/s)^2` with the `axis` term negated, filled up
    /// to the level `waist^2`. `waist` is dimensionless.
    #[serde(rename = "Hyperboloidal", alias = "Hyperboloid")]
    Hyperboloid {
        potential: f64,
        cx: f64,
        cy: f64,
        cz: f64,
        a: f64,
        b: f64,
        c: f64,
        waist: f64,
        #[serde(default)]
        axis: Axis,
    },
    #[serde(rename = "Spherical", alias = "Sphere")]
    Sphere {
        potential: f64,
        cx: f64,
        cy: f64,
        cz: f64,
        radius: f64,
    },
    /// Axis-aligned box between two opposite corners.
    Box {
        potential: f64,
        x0: f64,
        y0: f64,
        z0: f64,
        x1: f64,
        y1: f64,
        z1: f64,
    },
}

impl Electrode {
    /// Boundary potential (V).
    pub fn potential(&self) -> f64 {
        match *self {
            Electrode::Cylinder { potential, .. }
            | Electrode::Plate { potential, .. }
            | Electrode::HollowRod { potential, .. }
            | Electrode::Ellipsoid { potential, .. }
            | Electrode::Hyperboloid { potential, .. }
            | Electrode::Sphere { potential, .. }
            | Electrode::Box { potential, .. } => potential,
        }
    }

    /// Tag as written in the JSON `type` field.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Electrode::Cylinder { .. } => "Cylinder",
            Electrode::Plate { .. } => "Plate",
            Electrode::HollowRod { .. } => "HollowRod",
            Electrode::Ellipsoid { .. } => "Ellipsoidal",
            Electrode::Hyperboloid { .. } => "Hyperboloidal",
            Electrode::Sphere { .. } => "Spherical",
            Electrode::Box { .. } => "Box",
        }
    }

    /// Point containment, in the same length unit as the shape parameters.
    pub fn contains(&self, x: f64, y: f64, z: f64) -> bool {
        let p = [x, y, z];
        match *self {
            Electrode::Cylinder {
                cx,
                cy,
                cz,
                radius,
                height,
                axis,
                ..
            } => {
                let (h, u, v) = axis.decompose(p, [cx, cy, cz]);
                u * u + v * v <= radius * radius && (0.0..=height).contains(&h)
            }
            Electrode::Plate {
                a,
                b,
                c,
                d,
                thickness,
                ..
            } => {
                let norm = (a * a + b * b + c * c).sqrt();
                ((a * x + b * y + c * z + d) / norm).abs() <= thickness / 2.0
            }
            Electrode::HollowRod {
                cx,
                cy,
                cz,
                radius,
                thickness,
                height,
                axis,
                ..
            } => {
                let (h, u, v) = axis.decompose(p, [cx, cy, cz]);
                let r2 = u * u + v * v;
                let r_in = (radius - thickness / 2.0).max(0.0);
                let r_out = radius + thickness / 2.0;
                r2 >= r_in * r_in && r2 <= r_out * r_out && (0.0..=height).contains(&h)
            }
            Electrode::Ellipsoid {
                cx,
                cy,
                cz,
                rx,
                ry,
                rz,
                ..
            } => {
                let ux = (x - cx) / rx;
                let uy = (y - cy) / ry;
                let uz = (z - cz) / rz;
                ux * ux + uy * uy + uz * uz <= 1.0
            }
            Electrode::Hyperboloid {
                cx,
                cy,
                cz,
                a,
                b,
                c,
                waist,
                axis,
                ..
            } => {
                let ux = (x - cx) / a;
                let uy = (y - cy) / b;
                let uz = (z - cz) / c;
                let (sx, sy, sz) = match axis {
                    Axis::X => (-1.0, 1.0, 1.0),
                    Axis::Y => (1.0, -1.0, 1.0),
                    Axis::Z => (1.0, 1.0, -1.0),
                };
                sx * ux * ux + sy * uy * uy + sz * uz * uz <= waist * waist
            }
            Electrode::Sphere {
                cx, cy, cz, radius, ..
            } => {
                let dx = x - cx;
                let dy = y - cy;
                let dz = z - cz;
                dx * dx + dy * dy + dz * dz <= radius * radius
            }
            Electrode::Box {
                x0,
                y0,
                z0,
                x1,
                y1,
                z1,
                ..
            } => {
                x >= x0.min(x1)
                    && x <= x0.max(x1)
                    && y >= y0.min(y1)
                    && y <= y0.max(y1)
                    && z >= z0.min(z1)
                    && z <= z0.max(z1)
            }
        }
    }

    /// Copy with every length multiplied by `s`. Potentials, plate normal
    /// coefficients and the hyperboloid waist level are unit-free and kept.
    pub fn scaled(&self, s: f64) -> Electrode {
        match *self {
            Electrode::Cylinder {
                potential,
                cx,
                cy,
                cz,
                radius,
                height,
                axis,
            } => Electrode::Cylinder {
                potential,
                cx: cx * s,
                cy: cy * s,
                cz: cz * s,
                radius: radius * s,
                height: height * s,
                axis,
            },
            Electrode::Plate {
                potential,
                a,
                b,
                c,
                d,
                thickness,
            } => Electrode::Plate {
                potential,
                a,
                b,
                c,
                d: d * s,
                thickness: thickness * s,
            },
            Electrode::HollowRod {
                potential,
                cx,
                cy,
                cz,
                radius,
                thickness,
                height,
                axis,
            } => Electrode::HollowRod {
                potential,
                cx: cx * s,
                cy: cy * s,
                cz: cz * s,
                radius: radius * s,
                thickness: thickness * s,
                height: height * s,
                axis,
            },
            Electrode::Ellipsoid {
                potential,
                cx,
                cy,
                cz,
                rx,
                ry,
                rz,
            } => Electrode::Ellipsoid {
                potential,
                cx: cx * s,
                cy: cy * s,
                cz: cz * s,
                rx: rx * s,
                ry: ry * s,
                rz: rz * s,
            },
            Electrode::Hyperboloid {
                potential,
                cx,
                cy,
                cz,
                a,
                b,
                c,
                waist,
                axis,
            } => Electrode::Hyperboloid {
                potential,
                cx: cx * s,
                cy: cy * s,
                cz: cz * s,
                a: a * s,
                b: b * s,
                c: c * s,
                waist,
                axis,
            },
            Electrode::Sphere {
                potential,
                cx,
                cy,
                cz,
                radius,
            } => Electrode::Sphere {
                potential,
                cx: cx * s,
                cy: cy * s,
                cz: cz * s,
                radius: radius * s,
            },
            Electrode::Box {
                potential,
                x0,
                y0,
                z0,
                x1,
                y1,
                z1,
            } => Electrode::Box {
                potential,
                x0: x0 * s,
                y0: y0 * s,
                z0: z0 * s,
                x1: x1 * s,
                y1: y1 * s,
                z1: z1 * s,
            },
        }
    }

    /// Check parameters before rasterization. `label` prefixes messages.
    pub fn validate(&self, label: &str) -> PfieldResult<()> {
        let err = |what: String| Err(PfieldError::ConfigError(format!("{label}: {what}")));

        let potential = self.potential();
        if !potential.is_finite() {
            return err(format!("potential must be finite, got {potential}"));
        }

        let (finite, positive): (Vec<(&str, f64)>, Vec<(&str, f64)>) = match *self {
            Electrode::Cylinder {
                cx,
                cy,
                cz,
                radius,
                height,
                ..
            } => (
                vec![("cx", cx), ("cy", cy), ("cz", cz)],
                vec![("radius", radius), ("height", height)],
            ),
            Electrode::Plate {
                a,
                b,
                c,
                d,
                thickness,
                ..
            } => {
                if a * a + b * b + c * c == 0.0 {
                    return err("plate normal (A, B, C) must be non-zero".to_string());
                }
                (
                    vec![("A", a), ("B", b), ("C", c), ("D", d)],
                    vec![("thickness", thickness)],
                )
            }
            Electrode::HollowRod {
                cx,
                cy,
                cz,
                radius,
                thickness,
                height,
                ..
            } => (
                vec![("cx", cx), ("cy", cy), ("cz", cz)],
                vec![
                    ("radius", radius),
                    ("thickness", thickness),
                    ("height", height),
                ],
            ),
            Electrode::Ellipsoid {
                cx,
                cy,
                cz,
                rx,
                ry,
                rz,
                ..
            } => (
                vec![("cx", cx), ("cy", cy), ("cz", cz)],
                vec![("rx", rx), ("ry", ry), ("rz", rz)],
            ),
            Electrode::Hyperboloid {
                cx,
                cy,
                cz,
                a,
                b,
                c,
                waist,
                ..
            } => (
                vec![("cx", cx), ("cy", cy), ("cz", cz), ("waist", waist)],
                vec![("a", a), ("b", b), ("c", c)],
            ),
            Electrode::Sphere {
                cx, cy, cz, radius, ..
            } => (
                vec![("cx", cx), ("cy", cy), ("cz", cz)],
                vec![("radius", radius)],
            ),
            Electrode::Box {
                x0,
                y0,
                z0,
                x1,
                y1,
                z1,
                ..
            } => (
                vec![
                    ("x0", x0),
                    ("y0", y0),
                    ("z0", z0),
                    ("x1", x1),
                    ("y1", y1),
                    ("z1", z1),
                ],
                Vec::new(),
            ),
        };

        for (name, value) in finite {
            if !value.is_finite() {
                return err(format!("{name} must be finite, got {value}"));
            }
        }
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return err(format!("{name} must be finite and > 0, got {value}"));
            }
        }
        Ok(())
    }
}
