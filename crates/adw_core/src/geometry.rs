//! Geometry primitives
//!
//! Points and the 2D affine transform handed to the renderer when a
//! widget is allocated.

/// A 2D point
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// 2D affine transformation
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Affine2D {
    /// Matrix elements [a, b, c, d, tx, ty]
    /// | a  c  tx |
    /// | b  d  ty |
    /// | 0  0   1 |
    pub elements: [f64; 6],
}

impl Default for Affine2D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine2D {
    pub const IDENTITY: Affine2D = Affine2D {
        elements: [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
    };

    pub fn translation(x: f64, y: f64) -> Self {
        Self {
            elements: [1.0, 0.0, 0.0, 1.0, x, y],
        }
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Self {
            elements: [sx, 0.0, 0.0, sy, 0.0, 0.0],
        }
    }

    /// Rotation by `angle` radians
    pub fn rotation(angle: f64) -> Self {
        let c = angle.cos();
        let s = angle.sin();
        Self {
            elements: [c, s, -s, c, 0.0, 0.0],
        }
    }

    /// Rotation by `degrees`, snapping exact quarter turns so that axis
    /// aligned layouts stay pixel exact
    pub fn rotation_degrees(degrees: f64) -> Self {
        let turns = degrees / 90.0;
        if turns.fract() == 0.0 {
            let (c, s) = match (turns as i64).rem_euclid(4) {
                0 => (1.0, 0.0),
                1 => (0.0, 1.0),
                2 => (-1.0, 0.0),
                _ => (0.0, -1.0),
            };
            return Self {
                elements: [c, s, -s, c, 0.0, 0.0],
            };
        }
        Self::rotation(degrees.to_radians())
    }

    pub fn transform_point(&self, point: Point) -> Point {
        let [a, b, c, d, tx, ty] = self.elements;
        Point::new(
            a * point.x + c * point.y + tx,
            b * point.x + d * point.y + ty,
        )
    }

    /// Concatenate this transform with another (self * other)
    /// The resulting transform first applies `other`, then `self`.
    pub fn then(&self, other: &Affine2D) -> Affine2D {
        let [a1, b1, c1, d1, tx1, ty1] = self.elements;
        let [a2, b2, c2, d2, tx2, ty2] = other.elements;

        Affine2D {
            elements: [
                a1 * a2 + c1 * b2,
                b1 * a2 + d1 * b2,
                a1 * c2 + c1 * d2,
                b1 * c2 + d1 * d2,
                a1 * tx2 + c1 * ty2 + tx1,
                b1 * tx2 + d1 * ty2 + ty1,
            ],
        }
    }

    /// Translation part of the transform
    pub fn translation_part(&self) -> Point {
        Point::new(self.elements[4], self.elements[5])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
    }

    #[test]
    fn test_then_applies_right_operand_first() {
        let t = Affine2D::translation(10.0, 0.0).then(&Affine2D::scale(2.0, 2.0));
        let p = t.transform_point(Point::new(1.0, 1.0));
        assert!(approx(p, Point::new(12.0, 2.0)));
    }

    #[test]
    fn test_quarter_turn_is_exact() {
        let r = Affine2D::rotation_degrees(90.0);
        assert_eq!(r.transform_point(Point::new(1.0, 0.0)), Point::new(0.0, 1.0));

        let r = Affine2D::rotation_degrees(-90.0);
        assert_eq!(r.transform_point(Point::new(1.0, 0.0)), Point::new(0.0, -1.0));
    }

    #[test]
    fn test_arbitrary_rotation() {
        let r = Affine2D::rotation_degrees(45.0);
        let p = r.transform_point(Point::new(1.0, 0.0));
        let h = std::f64::consts::FRAC_1_SQRT_2;
        assert!(approx(p, Point::new(h, h)));
    }
}
