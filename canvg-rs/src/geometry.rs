//! Points, bounding boxes, affine matrices and curve math.

use std::f64::consts::PI;

/// Substitute for zero where a divisor or scale must not vanish.
pub const PSEUDO_ZERO: f64 = 0.00000001;

/// A point in user space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Angle of the vector from `self` to `other`, in radians.
    pub fn angle_to(&self, other: &Point) -> f64 {
        (other.y - self.y).atan2(other.x - self.x)
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        ((other.x - self.x).powi(2) + (other.y - self.y).powi(2)).sqrt()
    }

    pub fn transformed(&self, matrix: &Matrix) -> Point {
        matrix.apply_to_point(*self)
    }

    /// Parses `"x y"` / `"x,y"` into a point. Missing coordinates become 0.
    pub fn parse(value: &str) -> Point {
        let numbers = crate::util::to_numbers(value);
        Point::new(
            numbers.first().copied().unwrap_or(0.0),
            numbers.get(1).copied().unwrap_or(0.0),
        )
    }

    /// Parses a scale pair where a single value applies to both axes.
    pub fn parse_scale(value: &str) -> Point {
        let numbers = crate::util::to_numbers(value);
        let x = numbers.first().copied().unwrap_or(1.0);
        let y = numbers.get(1).copied().unwrap_or(x);
        Point::new(x, y)
    }

    /// Parses a `points` attribute into pairs, dropping a trailing odd value.
    pub fn parse_path(value: &str) -> Vec<Point> {
        crate::util::to_numbers(value)
            .chunks_exact(2)
            .map(|pair| Point::new(pair[0], pair[1]))
            .collect()
    }
}

/// A 2D affine matrix in canvas order: `[a c e; b d f; 0 0 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl Matrix {
    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub fn translation(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    pub fn scaling(sx: f64, sy: f64) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    pub fn rotation(radians: f64) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self::new(cos, sin, -sin, cos, 0.0, 0.0)
    }

    /// Returns `self * other`: `other` is applied to points first.
    pub fn multiply(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    pub fn invert(&self) -> Option<Matrix> {
        let det = self.determinant();
        if det.abs() < f64::EPSILON || !det.is_finite() {
            return None;
        }
        let inv = 1.0 / det;
        Some(Matrix {
            a: self.d * inv,
            b: -self.b * inv,
            c: -self.c * inv,
            d: self.a * inv,
            e: (self.c * self.f - self.d * self.e) * inv,
            f: (self.b * self.e - self.a * self.f) * inv,
        })
    }

    pub fn apply_to_point(&self, point: Point) -> Point {
        Point::new(
            point.x * self.a + point.y * self.c + self.e,
            point.x * self.b + point.y * self.d + self.f,
        )
    }

    pub fn approx_eq(&self, other: &Matrix, epsilon: f64) -> bool {
        (self.a - other.a).abs() < epsilon
            && (self.b - other.b).abs() < epsilon
            && (self.c - other.c).abs() < epsilon
            && (self.d - other.d).abs() < epsilon
            && (self.e - other.e).abs() < epsilon
            && (self.f - other.f).abs() < epsilon
    }
}

/// Axis-aligned box grown point by point. Starts empty (all NaN).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::empty()
    }
}

impl BoundingBox {
    pub fn empty() -> Self {
        Self {
            x1: f64::NAN,
            y1: f64::NAN,
            x2: f64::NAN,
            y2: f64::NAN,
        }
    }

    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        let mut bbox = Self::empty();
        bbox.add_point(x1, y1);
        bbox.add_point(x2, y2);
        bbox
    }

    pub fn is_empty(&self) -> bool {
        self.x1.is_nan() || self.y1.is_nan()
    }

    pub fn x(&self) -> f64 {
        self.x1
    }

    pub fn y(&self) -> f64 {
        self.y1
    }

    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    pub fn add_x(&mut self, x: f64) {
        if x.is_nan() {
            return;
        }
        if self.x1.is_nan() || self.x2.is_nan() {
            self.x1 = x;
            self.x2 = x;
        }
        self.x1 = self.x1.min(x);
        self.x2 = self.x2.max(x);
    }

    pub fn add_y(&mut self, y: f64) {
        if y.is_nan() {
            return;
        }
        if self.y1.is_nan() || self.y2.is_nan() {
            self.y1 = y;
            self.y2 = y;
        }
        self.y1 = self.y1.min(y);
        self.y2 = self.y2.max(y);
    }

    pub fn add_point(&mut self, x: f64, y: f64) {
        self.add_x(x);
        self.add_y(y);
    }

    pub fn add_bounding_box(&mut self, other: Option<&BoundingBox>) {
        if let Some(other) = other {
            self.add_point(other.x1, other.y1);
            self.add_point(other.x2, other.y2);
        }
    }

    /// Extends the box along one axis with the interior extrema of a cubic,
    /// found where the derivative `a t² + b t + c` vanishes.
    fn add_cubic_extrema(&mut self, for_x: bool, p0: f64, p1: f64, p2: f64, p3: f64) {
        let b = 6.0 * p0 - 12.0 * p1 + 6.0 * p2;
        let a = -3.0 * p0 + 9.0 * p1 - 9.0 * p2 + 3.0 * p3;
        let c = 3.0 * p1 - 3.0 * p0;
        let add = |bbox: &mut Self, t: f64| {
            if 0.0 < t && t < 1.0 {
                let value = sum_cubic(t, p0, p1, p2, p3);
                if for_x {
                    bbox.add_x(value);
                } else {
                    bbox.add_y(value);
                }
            }
        };

        if a == 0.0 {
            if b == 0.0 {
                return;
            }
            add(self, -c / b);
            return;
        }

        let b2ac = b * b - 4.0 * c * a;
        if b2ac < 0.0 {
            return;
        }
        add(self, (-b + b2ac.sqrt()) / (2.0 * a));
        add(self, (-b - b2ac.sqrt()) / (2.0 * a));
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add_bezier_curve(
        &mut self,
        p0x: f64,
        p0y: f64,
        p1x: f64,
        p1y: f64,
        p2x: f64,
        p2y: f64,
        p3x: f64,
        p3y: f64,
    ) {
        self.add_point(p0x, p0y);
        self.add_point(p3x, p3y);
        self.add_cubic_extrema(true, p0x, p1x, p2x, p3x);
        self.add_cubic_extrema(false, p0y, p1y, p2y, p3y);
    }

    /// Elevates the quadratic to a cubic and reuses the cubic extrema.
    pub fn add_quadratic_curve(&mut self, p0x: f64, p0y: f64, p1x: f64, p1y: f64, p2x: f64, p2y: f64) {
        let cp1x = p0x + 2.0 / 3.0 * (p1x - p0x);
        let cp1y = p0y + 2.0 / 3.0 * (p1y - p0y);
        let cp2x = cp1x + 1.0 / 3.0 * (p2x - p0x);
        let cp2y = cp1y + 1.0 / 3.0 * (p2y - p0y);
        self.add_bezier_curve(p0x, p0y, cp1x, cp1y, cp2x, cp2y, p2x, p2y);
    }

    pub fn is_point_in_box(&self, x: f64, y: f64) -> bool {
        self.x1 <= x && x <= self.x2 && self.y1 <= y && y <= self.y2
    }
}

pub fn sum_cubic(t: f64, p0: f64, p1: f64, p2: f64, p3: f64) -> f64 {
    let mt = 1.0 - t;
    mt.powi(3) * p0 + 3.0 * mt.powi(2) * t * p1 + 3.0 * mt * t.powi(2) * p2 + t.powi(3) * p3
}

// Bernstein basis, highest control point first.
pub fn cb1(t: f64) -> f64 {
    t * t * t
}

pub fn cb2(t: f64) -> f64 {
    3.0 * t * t * (1.0 - t)
}

pub fn cb3(t: f64) -> f64 {
    3.0 * t * (1.0 - t) * (1.0 - t)
}

pub fn cb4(t: f64) -> f64 {
    (1.0 - t) * (1.0 - t) * (1.0 - t)
}

pub fn qb1(t: f64) -> f64 {
    t * t
}

pub fn qb2(t: f64) -> f64 {
    2.0 * t * (1.0 - t)
}

pub fn qb3(t: f64) -> f64 {
    (1.0 - t) * (1.0 - t)
}

pub fn vector_magnitude(v: [f64; 2]) -> f64 {
    (v[0] * v[0] + v[1] * v[1]).sqrt()
}

/// Cosine of the angle between two vectors.
pub fn vectors_ratio(u: [f64; 2], v: [f64; 2]) -> f64 {
    (u[0] * v[0] + u[1] * v[1]) / (vector_magnitude(u) * vector_magnitude(v))
}

/// Signed angle from `u` to `v`.
pub fn vectors_angle(u: [f64; 2], v: [f64; 2]) -> f64 {
    let sign = if u[0] * v[1] < u[1] * v[0] { -1.0 } else { 1.0 };
    sign * vectors_ratio(u, v).clamp(-1.0, 1.0).acos()
}

pub fn to_radians(degrees: f64) -> f64 {
    degrees * PI / 180.0
}
