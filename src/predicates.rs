//! Geometric predicates for crossing detection.
//!
//! nalgebra supplies the vector arithmetic (add, subtract, dot, cross,
//! normalize); this module holds the sign-based predicates built on top of
//! it: plane-side classification, the in-plane 2D frame used to project
//! candidate crossing points, and the inclusive point-in-triangle test.

use nalgebra::{Point3, Vector3};

use crate::geom::Face;


/// Signed side of a point relative to an oriented plane.
///
/// `Zero` occurs only on an exact numerical coincidence with the plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Negative,
    Zero,
    Positive,
}

impl Side {
    fn from_det(det: f32) -> Self {
        if det < 0.0 {
            Side::Negative
        } else if det > 0.0 {
            Side::Positive
        } else {
            Side::Zero
        }
    }
}

/// Classifies `x` against the plane through `a`, `b` and `c`.
///
/// The sign is that of the scalar triple product of (b - a), (c - a) and
/// (x - a), with the handedness of a right-handed cross product. Swapping
/// `b` and `c` negates the result for points off the plane.
pub fn side_of_plane(x: &Point3<f32>, a: &Point3<f32>, b: &Point3<f32>, c: &Point3<f32>) -> Side {
    let b_ = b - a;
    let c_ = c - a;
    let x_ = x - a;

    Side::from_det(b_.cross(&c_).dot(&x_))
}

/// Reflects `v` about the plane with unit normal `normal`.
pub fn reflect(v: &Vector3<f32>, normal: &Vector3<f32>) -> Vector3<f32> {
    v - normal * (2.0 * v.dot(normal))
}

/// In-plane coordinate frame of a face.
///
/// The frame is anchored at the first vertex, with the x axis along the
/// first edge and the y axis perpendicular to it within the face plane.
/// Projecting through it reduces the triangle test to 2D.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaneBasis {
    origin: Point3<f32>,
    x_axis: Vector3<f32>,
    y_axis: Vector3<f32>,
}

impl PlaneBasis {
    /// Builds the frame spanned by the face's first edge and its flat
    /// normal. The face must be non-degenerate, which is checked once at
    /// cast setup.
    pub fn new(face: &Face) -> Self {
        let origin = face.vertices[0];
        let x_axis = (face.vertices[1] - face.vertices[0]).normalize();
        let normal = face.normals[0].normalize();
        let y_axis = normal.cross(&x_axis);

        Self {
            origin,
            x_axis,
            y_axis,
        }
    }

    /// Projects a 3D point into the in-plane frame. The out-of-plane
    /// component is discarded.
    pub fn project(&self, p: &Point3<f32>) -> (f32, f32) {
        let rel = p - self.origin;
        (rel.dot(&self.x_axis), rel.dot(&self.y_axis))
    }
}

/// Inclusive 2D point-in-triangle test.
///
/// Classifies `p` against each directed edge of the triangle; the point is
/// inside, or on the boundary, iff the edge signs are not a mix of
/// strictly positive and strictly negative values.
pub fn point_in_triangle(p: (f32, f32), a: (f32, f32), b: (f32, f32), c: (f32, f32)) -> bool {
    let d1 = edge_sign(p, a, b);
    let d2 = edge_sign(p, b, c);
    let d3 = edge_sign(p, c, a);

    let has_negative = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_positive = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;

    !(has_negative && has_positive)
}

fn edge_sign(p: (f32, f32), a: (f32, f32), b: (f32, f32)) -> f32 {
    (p.0 - b.0) * (a.1 - b.1) - (a.0 - b.0) * (p.1 - b.1)
}
