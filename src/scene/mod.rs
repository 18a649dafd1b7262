//! Thin adapter over Bevy's scene graph: baking meshes into world space,
//! bounds, downward ray casts and name lookup on the glTF hierarchy.
pub mod bounds;
pub mod raycast;

use bevy::prelude::*;
use bevy::render::mesh::{PrimitiveTopology, VertexAttributeValues};

pub use bounds::SceneBounds;
pub use raycast::{GroundHit, GroundQuery, GroundSet, SurfaceMesh, floor_quad};

/// Bake a triangle-list mesh into world-space triangles.
///
/// Meshes with other topologies or without float positions yield nothing;
/// they can't be stood on.
#[must_use]
pub fn bake_world_triangles(mesh: &Mesh, transform: &GlobalTransform) -> Vec<[Vec3; 3]> {
    if mesh.primitive_topology() != PrimitiveTopology::TriangleList {
        return Vec::new();
    }
    let Some(VertexAttributeValues::Float32x3(positions)) = mesh.attribute(Mesh::ATTRIBUTE_POSITION) else {
        return Vec::new();
    };

    let affine = transform.affine();
    let world: Vec<Vec3> = positions
        .iter()
        .map(|p| affine.transform_point3(Vec3::from(*p)))
        .collect();

    let corner = |i: usize| world.get(i).copied();
    match mesh.indices() {
        Some(indices) => {
            let idx: Vec<usize> = indices.iter().collect();
            idx.chunks_exact(3)
                .filter_map(|c| Some([corner(c[0])?, corner(c[1])?, corner(c[2])?]))
                .collect()
        }
        None => world.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect(),
    }
}

/// The authored name for a mesh entity.
///
/// glTF nodes carry the name the modeller typed; the mesh primitive entity
/// under them is named after the mesh data. The node name wins when present.
#[must_use]
pub fn node_name(entity: Entity, names: &Query<&Name>, parents: &Query<&Parent>) -> Option<(Entity, String)> {
    if let Ok(parent) = parents.get(entity)
        && let Ok(name) = names.get(parent.get())
    {
        return Some((parent.get(), name.as_str().to_string()));
    }
    names.get(entity).ok().map(|n| (entity, n.as_str().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::render::mesh::Indices;
    use bevy::render::render_asset::RenderAssetUsages;

    fn quad_mesh() -> Mesh {
        Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default())
            .with_inserted_attribute(
                Mesh::ATTRIBUTE_POSITION,
                vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 0.0, 1.0], [0.0, 0.0, 1.0]],
            )
            .with_inserted_indices(Indices::U32(vec![0, 1, 2, 0, 2, 3]))
    }

    #[test]
    fn bakes_indexed_mesh_with_transform() {
        let tf = GlobalTransform::from(Transform::from_xyz(10.0, 2.0, 0.0));
        let tris = bake_world_triangles(&quad_mesh(), &tf);
        assert_eq!(tris.len(), 2);
        assert_eq!(tris[0][0], Vec3::new(10.0, 2.0, 0.0));
        assert_eq!(tris[1][2], Vec3::new(10.0, 2.0, 1.0));
    }

    #[test]
    fn non_triangle_meshes_are_skipped() {
        let lines = Mesh::new(PrimitiveTopology::LineList, RenderAssetUsages::default())
            .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
        assert!(bake_world_triangles(&lines, &GlobalTransform::IDENTITY).is_empty());
    }
}
