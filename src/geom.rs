use anyhow::{anyhow, Result};
use nalgebra::{Point3, Vector3};

use crate::error::CastError;
use crate::settings::VEC_LENGTH_THRESHOLD;


/// A triangular facet of a surface mesh.
///
/// Only the first normal is consulted when confirming crossings; it acts
/// as the facet's flat normal.
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    pub vertices: [Point3<f32>; 3],
    pub normals: [Vector3<f32>; 3],
}

impl Face {
    pub fn new(vertices: [Point3<f32>; 3], normals: [Vector3<f32>; 3]) -> Self {
        Self { vertices, normals }
    }

    /// Builds a face from bare vertices, deriving a flat normal from the
    /// winding. Used for OBJ files without `vn` records.
    pub fn from_vertices(vertices: [Point3<f32>; 3]) -> Self {
        let normal = Self::compute_normal(&vertices);
        Self {
            vertices,
            normals: [normal; 3],
        }
    }

    /// Compute the normal vector for the face.
    fn compute_normal(vertices: &[Point3<f32>; 3]) -> Vector3<f32> {
        let u = vertices[1] - vertices[0];
        let v = vertices[2] - vertices[0];

        let normal = u.cross(&v);

        // Degenerate windings are left as the zero vector and rejected at
        // cast setup.
        normal.try_normalize(f32::EPSILON).unwrap_or(normal)
    }
}

/// A triangulated 3D surface mesh.
///
/// Read-only once loaded; a mesh can be shared across any number of
/// concurrent casts.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Point3<f32>>, // List of all vertices in the mesh
    pub num_vertices: usize,        // Number of vertices in the mesh
    pub normals: Vec<Vector3<f32>>, // List of all vertex normals in the mesh
    pub num_normals: usize,         // Number of vertex normals in the mesh
    pub faces: Vec<Face>,           // List of all facets in the mesh
    pub num_faces: usize,           // Number of facets in the mesh
}

impl Mesh {
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            num_vertices: 0,
            normals: Vec::new(),
            num_normals: 0,
            faces: Vec::new(),
            num_faces: 0,
        }
    }

    /// Loads a triangulated mesh from a Wavefront OBJ file.
    ///
    /// The file must contain exactly one mesh made of triangles. Faces
    /// without `vn` records get a flat normal computed from their winding.
    pub fn from_file(filename: &str) -> Result<Mesh> {
        let (models, _) = tobj::load_obj(filename, &tobj::LoadOptions::default())?;

        let mut mesh = Mesh::new();

        for (i, m) in models.iter().enumerate() {
            if i > 0 {
                return Err(anyhow!("found more than 1 mesh in OBJ file"));
            }

            let data = &m.mesh;
            for vtx in 0..data.positions.len() / 3 {
                mesh.add_vertex(Point3::new(
                    data.positions[3 * vtx],
                    data.positions[3 * vtx + 1],
                    data.positions[3 * vtx + 2],
                ));
            }
            for nrm in 0..data.normals.len() / 3 {
                mesh.add_normal(Vector3::new(
                    data.normals[3 * nrm],
                    data.normals[3 * nrm + 1],
                    data.normals[3 * nrm + 2],
                ));
            }

            let mut next_face = 0;
            for face in 0..data.face_arities.len() {
                let arity = data.face_arities[face] as usize;
                if arity != 3 {
                    return Err(anyhow!(
                        "face {} has {} vertices, expected a triangulated mesh",
                        face,
                        arity
                    ));
                }
                let end = next_face + arity;

                let face_indices = &data.indices[next_face..end];
                let vertices = [
                    mesh.vertices[face_indices[0] as usize],
                    mesh.vertices[face_indices[1] as usize],
                    mesh.vertices[face_indices[2] as usize],
                ];

                if data.normal_indices.is_empty() {
                    mesh.add_face(Face::from_vertices(vertices));
                } else {
                    let normal_indices = &data.normal_indices[next_face..end];
                    let normals = [
                        mesh.normals[normal_indices[0] as usize],
                        mesh.normals[normal_indices[1] as usize],
                        mesh.normals[normal_indices[2] as usize],
                    ];
                    mesh.add_face(Face::new(vertices, normals));
                }

                next_face = end;
            }
        }

        Ok(mesh)
    }

    /// Adds a vertex to the mesh.
    pub fn add_vertex(&mut self, vertex: Point3<f32>) {
        self.vertices.push(vertex);
        self.num_vertices += 1;
    }

    /// Adds a vertex normal to the mesh.
    pub fn add_normal(&mut self, normal: Vector3<f32>) {
        self.normals.push(normal);
        self.num_normals += 1;
    }

    /// Adds a facet to the mesh.
    pub fn add_face(&mut self, face: Face) {
        self.faces.push(face);
        self.num_faces += 1;
    }

    /// Checks every face for a usable tangent and flat normal.
    ///
    /// Crossing confirmation projects points into a frame spanned by the
    /// first edge and the flat normal, so zero-length edges or normals
    /// cannot be classified.
    pub fn validate(&self) -> Result<(), CastError> {
        for (i, face) in self.faces.iter().enumerate() {
            let tangent = face.vertices[1] - face.vertices[0];
            if tangent.norm() < VEC_LENGTH_THRESHOLD
                || face.normals[0].norm() < VEC_LENGTH_THRESHOLD
            {
                return Err(CastError::DegenerateFace { face: i });
            }
        }

        Ok(())
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}
