use std::sync::Arc;

use nalgebra::{Vector2, Vector3};
use obj::{Obj, TexturedVertex};

use crate::error::{RasterError, Result};
use crate::material::Material;

/// One polygon corner: indices into the vertex, texture coordinate and normal lists of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Face {
    pub vertex: usize,
    pub texture: Option<usize>,
    pub normal: Option<usize>,
}

impl Face {
    pub fn new(vertex: usize, texture: Option<usize>, normal: Option<usize>) -> Face {
        return Face { vertex, texture, normal };
    }

    /// Corner that uses the same index for position, texture coordinate and normal.
    pub fn uniform(index: usize) -> Face {
        return Face {
            vertex: index,
            texture: Some(index),
            normal: Some(index),
        };
    }
}

/// Three indices into the face list of a model plus the material the triangle is painted with.
#[derive(Debug, Clone, PartialEq)]
pub struct Triangle {
    pub faces: [usize; 3],
    pub material: Option<Arc<Material>>,
}

impl Triangle {
    pub fn new(faces: [usize; 3], material: Option<Arc<Material>>) -> Triangle {
        return Triangle { faces, material };
    }
}

/// Immutable triangle mesh. All indices are validated when the model is built.
#[derive(Debug, Clone)]
pub struct Model {
    vertices: Vec<Vector3<f64>>,
    texture_coords: Vec<Vector2<f64>>,
    normals: Vec<Vector3<f64>>,
    faces: Vec<Face>,
    triangles: Vec<Triangle>,
}

impl Model {
    pub fn new(
        vertices: Vec<Vector3<f64>>,
        texture_coords: Vec<Vector2<f64>>,
        normals: Vec<Vector3<f64>>,
        faces: Vec<Face>,
        triangles: Vec<Triangle>,
    ) -> Result<Model> {
        for (i, face) in faces.iter().enumerate() {
            if face.vertex >= vertices.len() {
                return Err(RasterError::InvalidModel(format!(
                    "face {} uses vertex {} of {}",
                    i,
                    face.vertex,
                    vertices.len()
                )));
            }
            if let Some(texture) = face.texture.filter(|&t| t >= texture_coords.len()) {
                return Err(RasterError::InvalidModel(format!(
                    "face {} uses texture coordinate {} of {}",
                    i,
                    texture,
                    texture_coords.len()
                )));
            }
            if let Some(normal) = face.normal.filter(|&n| n >= normals.len()) {
                return Err(RasterError::InvalidModel(format!(
                    "face {} uses normal {} of {}",
                    i,
                    normal,
                    normals.len()
                )));
            }
        }
        for (i, triangle) in triangles.iter().enumerate() {
            if let Some(&face) = triangle.faces.iter().find(|&&f| f >= faces.len()) {
                return Err(RasterError::InvalidModel(format!(
                    "triangle {} uses face {} of {}",
                    i,
                    face,
                    faces.len()
                )));
            }
        }

        return Ok(Model {
            vertices,
            texture_coords,
            normals,
            faces,
            triangles,
        });
    }

    pub fn vertices(&self) -> &[Vector3<f64>] {
        return &self.vertices;
    }

    pub fn texture_coords(&self) -> &[Vector2<f64>] {
        return &self.texture_coords;
    }

    pub fn normals(&self) -> &[Vector3<f64>] {
        return &self.normals;
    }

    pub fn faces(&self) -> &[Face] {
        return &self.faces;
    }

    pub fn triangles(&self) -> &[Triangle] {
        return &self.triangles;
    }

    /// Paints every triangle with `material`.
    pub fn with_material(mut self, material: Option<Arc<Material>>) -> Model {
        for triangle in &mut self.triangles {
            triangle.material = material.clone();
        }
        return self;
    }

    /// Position of a face corner.
    pub fn position(&self, face: &Face) -> Vector3<f64> {
        return self.vertices[face.vertex];
    }

    /// Texture coordinate of a face corner, zero when the corner has none.
    pub fn texture_coord(&self, face: &Face) -> Vector2<f64> {
        return face.texture.map_or_else(Vector2::zeros, |t| self.texture_coords[t]);
    }

    /// Normal of a face corner, zero when the corner has none.
    pub fn normal(&self, face: &Face) -> Vector3<f64> {
        return face.normal.map_or_else(Vector3::zeros, |n| self.normals[n]);
    }

    /// Square of side `size * sqrt(2)` in the z = 0 plane facing -z, made of two triangles.
    pub fn plane(size: f64, material: Option<Arc<Material>>) -> Model {
        let r = size * std::f64::consts::FRAC_1_SQRT_2;
        let mut builder = ModelBuilder::new();
        let normal = builder.normal(Vector3::new(0.0, 0.0, -1.0));
        let corners = [
            (Vector3::new(-r, r, 0.0), Vector2::new(0.0, 1.0)),
            (Vector3::new(r, r, 0.0), Vector2::new(1.0, 1.0)),
            (Vector3::new(r, -r, 0.0), Vector2::new(1.0, 0.0)),
            (Vector3::new(-r, -r, 0.0), Vector2::new(0.0, 0.0)),
        ];
        let faces: Vec<Face> = corners
            .iter()
            .map(|&(position, uv)| Face::new(builder.vertex(position), Some(builder.texture_coord(uv)), Some(normal)))
            .collect();
        builder.polygon_unchecked(&faces, material);
        return builder.build_unchecked();
    }

    /// Axis aligned cube centered at the origin with edges of length `size`.
    /// Every side is wound clockwise when looked at from outside.
    pub fn cube(size: f64, material: Option<Arc<Material>>) -> Model {
        let s = size / 2.0;
        // (outward normal, up direction on that side)
        let sides = [
            (Vector3::new(0.0, 0.0, -1.0), Vector3::y()),
            (Vector3::new(0.0, 0.0, 1.0), Vector3::y()),
            (Vector3::new(1.0, 0.0, 0.0), Vector3::y()),
            (Vector3::new(-1.0, 0.0, 0.0), Vector3::y()),
            (Vector3::new(0.0, 1.0, 0.0), Vector3::z()),
            (Vector3::new(0.0, -1.0, 0.0), Vector3::z()),
        ];
        let uvs = [
            Vector2::new(0.0, 1.0),
            Vector2::new(1.0, 1.0),
            Vector2::new(1.0, 0.0),
            Vector2::new(0.0, 0.0),
        ];

        let mut builder = ModelBuilder::new();
        let uv_indices: Vec<usize> = uvs.iter().map(|&uv| builder.texture_coord(uv)).collect();
        for (normal, up) in sides {
            // Screen right for a viewer looking at the side along -normal.
            let right = up.cross(&-normal);
            let center = normal * s;
            let corners = [
                center + (up - right) * s,
                center + (up + right) * s,
                center + (right - up) * s,
                center - (up + right) * s,
            ];
            let normal_index = builder.normal(normal);
            let faces: Vec<Face> = corners
                .iter()
                .zip(&uv_indices)
                .map(|(&corner, &uv)| Face::new(builder.vertex(corner), Some(uv), Some(normal_index)))
                .collect();
            builder.polygon_unchecked(&faces, material.clone());
        }
        return builder.build_unchecked();
    }

    /// Adapts a mesh parsed by `obj-rs`. Every vertex becomes one face corner with matching
    /// position, texture coordinate and normal indices; normals are normalized.
    pub fn from_obj(obj: &Obj<TexturedVertex, u32>) -> Result<Model> {
        if obj.indices.len() % 3 != 0 {
            return Err(RasterError::InvalidModel(format!(
                "{} indices do not form whole triangles",
                obj.indices.len()
            )));
        }

        let mut vertices = Vec::with_capacity(obj.vertices.len());
        let mut texture_coords = Vec::with_capacity(obj.vertices.len());
        let mut normals = Vec::with_capacity(obj.vertices.len());
        for vertex in &obj.vertices {
            let [x, y, z] = vertex.position;
            vertices.push(Vector3::new(x as f64, y as f64, z as f64));
            texture_coords.push(Vector2::new(vertex.texture[0] as f64, vertex.texture[1] as f64));
            let [nx, ny, nz] = vertex.normal;
            let normal = Vector3::new(nx as f64, ny as f64, nz as f64);
            normals.push(normal.try_normalize(f64::EPSILON).unwrap_or(normal));
        }
        let faces = (0..obj.vertices.len()).map(Face::uniform).collect();
        let triangles = obj
            .indices
            .chunks_exact(3)
            .map(|c| Triangle::new([c[0] as usize, c[1] as usize, c[2] as usize], None))
            .collect();

        return Model::new(vertices, texture_coords, normals, faces, triangles);
    }
}

/// Incremental model construction. Polygons are split into triangle fans.
#[derive(Debug, Default)]
pub struct ModelBuilder {
    vertices: Vec<Vector3<f64>>,
    texture_coords: Vec<Vector2<f64>>,
    normals: Vec<Vector3<f64>>,
    faces: Vec<Face>,
    triangles: Vec<Triangle>,
}

impl ModelBuilder {
    pub fn new() -> ModelBuilder {
        return ModelBuilder::default();
    }

    pub fn vertex(&mut self, position: Vector3<f64>) -> usize {
        self.vertices.push(position);
        return self.vertices.len() - 1;
    }

    pub fn texture_coord(&mut self, uv: Vector2<f64>) -> usize {
        self.texture_coords.push(uv);
        return self.texture_coords.len() - 1;
    }

    pub fn normal(&mut self, normal: Vector3<f64>) -> usize {
        self.normals.push(normal);
        return self.normals.len() - 1;
    }

    /// Adds a convex polygon. Corners 0, k - 1, k form the k-th triangle of the fan.
    pub fn polygon(&mut self, corners: &[Face], material: Option<Arc<Material>>) -> Result<&mut ModelBuilder> {
        if corners.len() < 3 {
            return Err(RasterError::InvalidModel(format!(
                "polygon with {} corners",
                corners.len()
            )));
        }
        self.polygon_unchecked(corners, material);
        return Ok(self);
    }

    fn polygon_unchecked(&mut self, corners: &[Face], material: Option<Arc<Material>>) {
        let base = self.faces.len();
        self.faces.extend_from_slice(corners);
        for k in 2..corners.len() {
            self.triangles
                .push(Triangle::new([base, base + k - 1, base + k], material.clone()));
        }
    }

    pub fn build(self) -> Result<Model> {
        return Model::new(self.vertices, self.texture_coords, self.normals, self.faces, self.triangles);
    }

    // Only for the built-in meshes, whose indices are valid by construction.
    fn build_unchecked(self) -> Model {
        return Model {
            vertices: self.vertices,
            texture_coords: self.texture_coords,
            normals: self.normals,
            faces: self.faces,
            triangles: self.triangles,
        };
    }
}
