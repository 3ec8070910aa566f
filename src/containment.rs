//! Point-in-mesh queries and spatial pre-filtering.
//!
//! A containment query casts a ray from the probe point along a random
//! direction far enough to leave the geometry, then takes the parity of
//! confirmed face crossings: a point that is inside a closed mesh must
//! cross its boundary an odd number of times on the way out.
//!
//! The containment system provides:
//! - Axis-aligned bounding boxes for cheap probe rejection
//! - Single-point queries against a shared read-only mesh
//! - Parallel batch scans with progress tracking
//! - Deterministic results for seeded runs

use indicatif::{ProgressBar, ProgressStyle};
use nalgebra::{Point3, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::error::CastError;
use crate::geom::Mesh;
use crate::ray::Ray;
use crate::settings::CastParams;


/// Axis-aligned bounding box used to pre-filter containment probes.
///
/// A probe outside the smallest box containing the mesh cannot be inside
/// the mesh, so no ray needs to be cast for it.
#[derive(Debug, Clone, PartialEq)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Aabb {
    /// Smallest box containing every face vertex of the mesh. `None` for
    /// a mesh without faces.
    pub fn from_mesh(mesh: &Mesh) -> Option<Aabb> {
        if mesh.faces.is_empty() {
            return None;
        }

        let mut min = Point3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY);
        let mut max = Point3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY);
        for face in &mesh.faces {
            for vertex in &face.vertices {
                for k in 0..3 {
                    min[k] = min[k].min(vertex[k]);
                    max[k] = max[k].max(vertex[k]);
                }
            }
        }

        Some(Aabb { min, max })
    }

    /// Whether the point lies inside or on the box.
    pub fn contains(&self, point: &Point3<f32>) -> bool {
        (0..3).all(|k| point[k] >= self.min[k] && point[k] <= self.max[k])
    }

    /// Length of the box diagonal.
    pub fn diagonal(&self) -> f32 {
        (self.max - self.min).norm()
    }
}

/// Random unit vector, used as a cast direction for containment probes.
fn random_direction(rng: &mut impl Rng) -> Vector3<f32> {
    loop {
        let v = Vector3::new(
            rng.random_range(-0.5..=0.5),
            rng.random_range(-0.5..=0.5),
            rng.random_range(-0.5..=0.5),
        );
        if v.norm() > 1e-3 {
            return v.normalize();
        }
    }
}

/// Tests whether a point lies inside the mesh.
///
/// Probes outside the bounding box are rejected without casting. Anything
/// else is traced along a random direction to past the far side of the
/// box; an odd number of confirmed crossings means the boundary was
/// crossed an odd number of times on the way out, so the point was inside.
pub fn contains(
    mesh: &Mesh,
    point: &Point3<f32>,
    params: CastParams,
    rng: &mut impl Rng,
) -> Result<bool, CastError> {
    let Some(aabb) = Aabb::from_mesh(mesh) else {
        return Ok(false);
    };
    if !aabb.contains(point) {
        return Ok(false);
    }

    // long enough to leave the box from anywhere inside it
    let max_distance = 2.0 * aabb.diagonal();
    let direction = random_direction(rng);

    let mut ray = Ray::new(*point, direction, mesh, max_distance, params)?;
    let crossings = ray.trace()?;

    Ok(crossings.len() % 2 == 1)
}

/// Classifies many probe points against the same mesh in parallel.
///
/// Each probe owns an independent [`Ray`], so nothing needs locking
/// beyond sharing the read-only mesh. Seeded runs are deterministic:
/// probe `i` derives its generator from `seed + i`, independent of
/// scheduling order.
pub fn scan(
    mesh: &Mesh,
    probes: &[Point3<f32>],
    params: CastParams,
    seed: Option<u64>,
) -> Result<Vec<bool>, CastError> {
    let seed = seed.unwrap_or_else(|| rand::rng().random());

    let pb = ProgressBar::new(probes.len() as u64);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] {bar:40.green/blue} {pos:>5}/{len:5} {msg}",
        )
        .unwrap()
        .progress_chars("█▇▆▅▄▃▂▁"),
    );
    pb.set_message("probe".to_string());

    let results = probes
        .par_iter()
        .enumerate()
        .map(|(i, point)| {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(i as u64));
            let result = contains(mesh, point, params, &mut rng);
            pb.inc(1);
            result
        })
        .collect::<Result<Vec<bool>, CastError>>();

    pb.finish();

    results
}
