//! Ray casting and inside/outside crossing detection.
//!
//! A [`Ray`] advances a point along a fixed-length step vector and tracks
//! the signed side of the point relative to every face's supporting plane.
//! A sign flip means the point crossed the infinite plane; the crossing is
//! confirmed as a true face crossing by backing the point up to the plane,
//! projecting it into the face's in-plane frame, and running an inclusive
//! point-in-triangle test. Confirmed crossings toggle the containment
//! state and are recorded with their distance from the ray origin.
//!
//! The cast system provides:
//! - Plane-crossing detection via per-face side classification
//! - Backward refinement of crossing positions with a bounded retry
//! - Triangle confirmation to reject crossings outside a face's extent
//! - An append-only crossing record of alternating containment states

use itertools::Itertools;
use nalgebra::{Point3, Vector3};
use serde::Serialize;
use std::fmt;

use crate::error::CastError;
use crate::geom::Mesh;
use crate::predicates::{self, PlaneBasis, Side};
use crate::settings::{CastParams, VEC_LENGTH_THRESHOLD};

#[cfg(test)]
mod tests {

    use super::*;
    use crate::geom::Face;

    fn unit_cube() -> Mesh {
        let p = Point3::new;
        let corners = [
            p(-0.5, -0.5, -0.5),
            p(0.5, -0.5, -0.5),
            p(0.5, 0.5, -0.5),
            p(-0.5, 0.5, -0.5),
            p(-0.5, -0.5, 0.5),
            p(0.5, -0.5, 0.5),
            p(0.5, 0.5, 0.5),
            p(-0.5, 0.5, 0.5),
        ];
        let quads: [[usize; 4]; 6] = [
            [0, 1, 2, 3], // z = -0.5
            [4, 5, 6, 7], // z = +0.5
            [0, 1, 5, 4], // y = -0.5
            [3, 2, 6, 7], // y = +0.5
            [0, 3, 7, 4], // x = -0.5
            [1, 2, 6, 5], // x = +0.5
        ];

        let mut mesh = Mesh::new();
        for corner in corners {
            mesh.add_vertex(corner);
        }
        for quad in quads {
            mesh.add_face(Face::from_vertices([
                corners[quad[0]],
                corners[quad[1]],
                corners[quad[2]],
            ]));
            mesh.add_face(Face::from_vertices([
                corners[quad[0]],
                corners[quad[2]],
                corners[quad[3]],
            ]));
        }
        mesh
    }

    #[test]
    fn cube_pass_through() {
        let mesh = unit_cube();
        let mut ray = Ray::new(
            Point3::new(0.1, 5.0, 0.2),
            Vector3::new(0.0, -1.0, 0.0),
            &mesh,
            10.0,
            CastParams::default(),
        )
        .unwrap();

        let crossings = ray.trace().unwrap();

        assert_eq!(crossings.len(), 2);
        assert!(
            (crossings[0].distance - 4.5).abs() < 0.02,
            "distance: {}",
            crossings[0].distance
        );
        assert_eq!(crossings[0].state, Containment::Inside);
        assert!(
            (crossings[1].distance - 5.5).abs() < 0.02,
            "distance: {}",
            crossings[1].distance
        );
        assert_eq!(crossings[1].state, Containment::Outside);
    }

    #[test]
    fn cube_cast_away_is_empty() {
        let mesh = unit_cube();
        let mut ray = Ray::new(
            Point3::new(0.1, 5.0, 0.2),
            Vector3::new(0.0, 1.0, 0.0),
            &mesh,
            10.0,
            CastParams::default(),
        )
        .unwrap();

        assert!(ray.trace().unwrap().is_empty());
    }

    #[test]
    fn short_cast_stops_before_mesh() {
        let mesh = unit_cube();
        let mut ray = Ray::new(
            Point3::new(0.1, 5.0, 0.2),
            Vector3::new(0.0, -1.0, 0.0),
            &mesh,
            4.0,
            CastParams::default(),
        )
        .unwrap();

        assert!(ray.trace().unwrap().is_empty());
    }

    #[test]
    fn oblique_pass_through_alternates() {
        let mesh = unit_cube();
        // enters through the top face, leaves through the bottom face;
        // crosses the x = 0.5 and x = -0.5 planes outside the cube
        let mut ray = Ray::new(
            Point3::new(2.0, 3.0, 1.0),
            Vector3::new(-1.95, -2.98, -0.97),
            &mesh,
            10.0,
            CastParams::default(),
        )
        .unwrap();

        let crossings = ray.trace().unwrap();

        assert_eq!(crossings.len(), 2);
        assert_eq!(crossings[0].state, Containment::Inside);
        assert_eq!(crossings[1].state, Containment::Outside);
        assert!(crossings[0].distance < crossings[1].distance);
    }

    #[test]
    fn empty_mesh_trace_is_trivial() {
        let mesh = Mesh::new();
        let mut ray = Ray::new(
            Point3::origin(),
            Vector3::new(1.0, 0.0, 0.0),
            &mesh,
            1.0,
            CastParams::default(),
        )
        .unwrap();

        assert!(ray.trace().unwrap().is_empty());
    }

    #[test]
    fn zero_direction_is_rejected() {
        let mesh = unit_cube();
        let result = Ray::new(
            Point3::origin(),
            Vector3::zeros(),
            &mesh,
            1.0,
            CastParams::default(),
        );

        assert!(matches!(result, Err(CastError::DegenerateDirection)));
    }

    #[test]
    fn degenerate_face_is_rejected() {
        let p = Point3::new(0.0, 0.0, 0.0);
        let q = Point3::new(1.0, 0.0, 0.0);
        let mut mesh = Mesh::new();
        mesh.add_face(Face::new([p, p, q], [Vector3::z(); 3]));

        let result = Ray::new(
            Point3::new(0.0, 5.0, 0.0),
            Vector3::new(0.0, -1.0, 0.0),
            &mesh,
            1.0,
            CastParams::default(),
        );

        assert!(matches!(
            result,
            Err(CastError::DegenerateFace { face: 0 })
        ));
    }

    #[test]
    fn refinement_bound_fails_instead_of_hanging() {
        let mesh = unit_cube();
        let params = CastParams {
            refine_limit: 100,
            ..CastParams::default()
        };
        let mut ray = Ray::new(
            Point3::new(0.1, 5.0, 0.2),
            Vector3::new(0.0, -1.0, 0.0),
            &mesh,
            10.0,
            params,
        )
        .unwrap();

        // demand a side the position can never return to
        let result = ray.refine(0, Side::Zero);
        assert_eq!(result, Err(CastError::RefinementDiverged { face: 0 }));
    }

    #[test]
    fn toggled_alternates() {
        assert_eq!(Containment::Outside.toggled(), Containment::Inside);
        assert_eq!(Containment::Inside.toggled(), Containment::Outside);
    }
}

/// Whether the traced point is currently inside or outside the mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Containment {
    Inside,
    Outside,
}

impl Containment {
    /// The opposite state, applied on each confirmed crossing.
    pub fn toggled(self) -> Self {
        match self {
            Containment::Inside => Containment::Outside,
            Containment::Outside => Containment::Inside,
        }
    }
}

impl fmt::Display for Containment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Containment::Inside => write!(f, "inside"),
            Containment::Outside => write!(f, "outside"),
        }
    }
}

/// One confirmed face crossing along a traced ray.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Crossing {
    /// Distance from the ray origin to the refined crossing position.
    pub distance: f32,
    /// Containment state after the crossing.
    pub state: Containment,
}

/// Mutable state of a single cast through an immutable mesh.
///
/// A ray owns its own traversal state and only reads the mesh, so many
/// rays can be cast against the same mesh concurrently.
#[derive(Debug, Clone)]
pub struct Ray<'a> {
    mesh: &'a Mesh,
    origin: Point3<f32>,
    step: Vector3<f32>, // forward step, scaled to the configured step length
    position: Point3<f32>,
    sqr_max_distance: f32,
    sides: Vec<Side>, // one entry per face, replaced wholesale after every step
    state: Containment,
    crossings: Vec<Crossing>,
    params: CastParams,
}

impl<'a> Ray<'a> {
    /// Prepares a cast from `origin` along `direction`, classifying the
    /// origin against every face plane.
    ///
    /// The direction is normalized and rescaled to the configured step
    /// length, which fixes the spatial resolution of the cast: faces
    /// thinner than one step can be missed entirely.
    pub fn new(
        origin: Point3<f32>,
        direction: Vector3<f32>,
        mesh: &'a Mesh,
        max_distance: f32,
        params: CastParams,
    ) -> Result<Self, CastError> {
        if direction.norm() < VEC_LENGTH_THRESHOLD {
            return Err(CastError::DegenerateDirection);
        }
        mesh.validate()?;

        let step = direction.normalize() * params.step_length;
        let sides = Self::classify(mesh, &origin);

        Ok(Self {
            mesh,
            origin,
            step,
            position: origin,
            sqr_max_distance: max_distance * max_distance,
            sides,
            state: Containment::Outside,
            crossings: Vec::new(),
            params,
        })
    }

    /// Classifies a point against every face plane in the mesh.
    fn classify(mesh: &Mesh, point: &Point3<f32>) -> Vec<Side> {
        mesh.faces
            .iter()
            .map(|face| {
                predicates::side_of_plane(
                    point,
                    &face.vertices[0],
                    &face.vertices[1],
                    &face.vertices[2],
                )
            })
            .collect()
    }

    /// Advances the cast to its distance bound and returns the crossing
    /// record.
    ///
    /// Termination is strictly distance-bounded; the number of crossings
    /// found along the way is unconstrained. An empty mesh yields an
    /// empty record.
    pub fn trace(&mut self) -> Result<&[Crossing], CastError> {
        while (self.position - self.origin).norm_squared() < self.sqr_max_distance {
            self.position += self.step;
            let sides = Self::classify(self.mesh, &self.position);

            let changed: Vec<usize> = self
                .sides
                .iter()
                .zip_eq(sides.iter())
                .positions(|(old, new)| old != new)
                .collect();

            for i in changed {
                let original = self.sides[i];
                self.refine(i, original)?;

                let face = &self.mesh.faces[i];
                let basis = PlaneBasis::new(face);
                let p = basis.project(&self.position);
                let a = basis.project(&face.vertices[0]);
                let b = basis.project(&face.vertices[1]);
                let c = basis.project(&face.vertices[2]);

                if predicates::point_in_triangle(p, a, b, c) {
                    self.state = self.state.toggled();
                    self.crossings.push(Crossing {
                        distance: (self.position - self.origin).norm(),
                        state: self.state,
                    });
                }
            }

            // Always replace the stored sides with the classification of
            // the stepped position, not the refined one.
            self.sides = sides;
        }

        Ok(&self.crossings)
    }

    /// Backs the position up toward the crossed plane of face `i`.
    ///
    /// Reverse sub-steps of `refine_scale` times the forward step are
    /// taken until the point returns to its pre-crossing side, then one
    /// scaled forward step is applied. The loop is bounded: a cast where
    /// the original side never reappears fails rather than hanging.
    fn refine(&mut self, i: usize, original: Side) -> Result<(), CastError> {
        let face = &self.mesh.faces[i];
        let backward = -self.step * self.params.refine_scale;

        let mut sub_steps = 0;
        while predicates::side_of_plane(
            &self.position,
            &face.vertices[0],
            &face.vertices[1],
            &face.vertices[2],
        ) != original
        {
            if sub_steps >= self.params.refine_limit {
                return Err(CastError::RefinementDiverged { face: i });
            }
            self.position += backward;
            sub_steps += 1;
        }
        self.position += self.step * self.params.refine_scale;

        Ok(())
    }

    /// Consumes the ray and hands over its crossing record.
    pub fn into_crossings(self) -> Vec<Crossing> {
        self.crossings
    }
}
