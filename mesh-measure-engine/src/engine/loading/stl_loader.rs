//! STL model asset and its loader.
//!
//! Decodes binary or ASCII STL into an indexed triangle list kept around for
//! ray casting, separate from the renderable `Mesh` built from it.

use bevy::asset::{AssetLoader, LoadContext, io::Reader};
use bevy::prelude::*;
use bevy::render::mesh::PrimitiveTopology;
use bevy::render::render_asset::RenderAssetUsages;
use std::io::Cursor;
use thiserror::Error;

/// Indexed triangle geometry decoded from an STL file.
#[derive(Asset, Debug, Clone, TypePath)]
pub struct StlModel {
    pub positions: Vec<Vec3>,
    pub triangles: Vec<[u32; 3]>,
}

#[derive(Debug, Error)]
pub enum StlLoadError {
    #[error("failed to read STL bytes: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse STL data: {0}")]
    Parse(std::io::Error),
    #[error("STL file contains no triangles")]
    EmptyModel,
}

impl StlModel {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StlLoadError> {
        let mut cursor = Cursor::new(bytes);
        let indexed = stl_io::read_stl(&mut cursor).map_err(StlLoadError::Parse)?;
        if indexed.faces.is_empty() {
            return Err(StlLoadError::EmptyModel);
        }

        let positions = indexed
            .vertices
            .iter()
            .map(|v| Vec3::new(v[0], v[1], v[2]))
            .collect();
        let triangles = indexed
            .faces
            .iter()
            .map(|face| {
                [
                    face.vertices[0] as u32,
                    face.vertices[1] as u32,
                    face.vertices[2] as u32,
                ]
            })
            .collect();

        Ok(Self {
            positions,
            triangles,
        })
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Corner positions of triangle `index`, model frame.
    pub fn triangle(&self, index: usize) -> [Vec3; 3] {
        self.triangles[index].map(|i| self.positions[i as usize])
    }

    /// Axis-aligned bounding box, `None` for an empty model.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.positions.first()?;
        let mut min = first;
        let mut max = first;
        for p in &self.positions {
            min = min.min(*p);
            max = max.max(*p);
        }
        Some((min, max))
    }

    /// Translate all vertices so the bounding-box centre sits at the origin.
    /// Drag rotation then spins the model around its own middle.
    pub fn recentre(&mut self) {
        let Some((min, max)) = self.bounds() else {
            return;
        };
        let centre = (min + max) * 0.5;
        for p in &mut self.positions {
            *p -= centre;
        }
    }

    /// Build a renderable mesh with flat per-face normals. Corners are
    /// duplicated per triangle; the indexed form stays authoritative for
    /// ray casting.
    pub fn to_render_mesh(&self) -> Mesh {
        let mut positions = Vec::with_capacity(self.triangles.len() * 3);
        let mut normals = Vec::with_capacity(self.triangles.len() * 3);
        for index in 0..self.triangles.len() {
            let [a, b, c] = self.triangle(index);
            let normal = (b - a).cross(c - a).normalize_or_zero();
            for corner in [a, b, c] {
                positions.push(corner.to_array());
                normals.push(normal.to_array());
            }
        }
        Mesh::new(
            PrimitiveTopology::TriangleList,
            RenderAssetUsages::default(),
        )
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
        .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, normals)
    }
}

#[derive(Default)]
pub struct StlModelLoader;

impl AssetLoader for StlModelLoader {
    type Asset = StlModel;
    type Settings = ();
    type Error = StlLoadError;

    async fn load(
        &self,
        reader: &mut dyn Reader,
        _settings: &(),
        _load_context: &mut LoadContext<'_>,
    ) -> Result<StlModel, StlLoadError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).await?;
        StlModel::from_bytes(&bytes)
    }

    fn extensions(&self) -> &[&str] {
        &["stl"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ascii_triangle() -> Vec<u8> {
        let mut stl = String::from("solid test\n");
        stl.push_str("  facet normal 0 0 1\n    outer loop\n");
        stl.push_str("      vertex 0 0 0\n      vertex 2 0 0\n      vertex 0 2 0\n");
        stl.push_str("    endloop\n  endfacet\n");
        stl.push_str("endsolid test\n");
        stl.into_bytes()
    }

    fn binary_quad() -> Vec<u8> {
        // 80-byte header, u32 triangle count, then 50 bytes per triangle.
        let mut bytes = vec![0u8; 80];
        bytes.extend_from_slice(&2u32.to_le_bytes());
        let triangles: [[[f32; 3]; 4]; 2] = [
            // Normal, then three corners.
            [
                [0.0, 0.0, 1.0],
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
            ],
            [
                [0.0, 0.0, 1.0],
                [0.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
            ],
        ];
        for triangle in triangles {
            for vector in triangle {
                for component in vector {
                    bytes.extend_from_slice(&component.to_le_bytes());
                }
            }
            bytes.extend_from_slice(&0u16.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn parses_ascii_stl() {
        let model = StlModel::from_bytes(&ascii_triangle()).expect("should parse");
        assert_eq!(model.triangle_count(), 1);
        let (min, max) = model.bounds().unwrap();
        assert_eq!(min, Vec3::ZERO);
        assert_eq!(max, Vec3::new(2.0, 2.0, 0.0));
    }

    #[test]
    fn parses_binary_stl_and_welds_shared_corners() {
        let model = StlModel::from_bytes(&binary_quad()).expect("should parse");
        assert_eq!(model.triangle_count(), 2);
        // Four distinct corners across the two triangles of the quad.
        assert_eq!(model.positions.len(), 4);
    }

    #[test]
    fn rejects_geometry_without_triangles() {
        // Valid binary STL declaring zero triangles.
        let mut empty = vec![0u8; 80];
        empty.extend_from_slice(&0u32.to_le_bytes());
        assert!(matches!(
            StlModel::from_bytes(&empty),
            Err(StlLoadError::EmptyModel)
        ));
    }

    #[test]
    fn recentre_moves_the_bounding_box_centre_to_origin() {
        let mut model = StlModel::from_bytes(&ascii_triangle()).unwrap();
        model.recentre();
        let (min, max) = model.bounds().unwrap();
        assert!(((min + max) * 0.5).length() < 1.0e-6);
    }

    #[test]
    fn render_mesh_duplicates_corners_per_triangle() {
        let model = StlModel::from_bytes(&binary_quad()).unwrap();
        let mesh = model.to_render_mesh();
        assert_eq!(mesh.count_vertices(), 6);
    }
}
