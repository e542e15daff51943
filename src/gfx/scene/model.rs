//! OBJ model import
//!
//! Parses a model file with tobj (triangulation and single-indexing
//! enabled), flattens it into a list of drawable objects, pulls the MTL
//! materials into the scene's material manager and resolves their texture
//! references through a model-scoped, path-keyed cache so a texture shared
//! by several meshes is decoded exactly once.

use std::path::Path;

use cgmath::{Matrix4, Vector3};

use crate::{
    error::AssetError,
    gfx::resources::{
        material::{Material, MaterialManager, TextureKind},
        texture_resource::{TextureHandle, TextureResource, TextureStore},
    },
};

use super::object::{compose_trs, Mesh, Object};
use super::vertex::Vertex3D;

/// Path-keyed texture cache, scoped to a single model import.
///
/// A linear scan with string comparison; imports touch at most a handful of
/// textures, so nothing fancier is warranted.
pub struct TextureCache {
    entries: Vec<(String, TextureHandle)>,
}

impl TextureCache {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Return the cached handle for `path`, or invoke `load` and remember
    /// its result. `load` runs at most once per distinct path.
    pub fn resolve<F>(&mut self, path: &str, load: F) -> Result<TextureHandle, AssetError>
    where
        F: FnOnce(&str) -> Result<TextureHandle, AssetError>,
    {
        for (cached_path, handle) in &self.entries {
            if cached_path == path {
                return Ok(*handle);
            }
        }

        let handle = load(path)?;
        self.entries.push((path.to_string(), handle));
        Ok(handle)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for TextureCache {
    fn default() -> Self {
        Self::new()
    }
}

/// A loaded model: the objects flattened out of one file plus the model's
/// own transform, composed onto every child (`world = parent * local`).
pub struct Model {
    pub name: String,
    pub objects: Vec<Object>,
    pub position: Vector3<f32>,
    /// Euler angles in radians, same convention as [`Object`].
    pub rotation: Vector3<f32>,
    pub scale: Vector3<f32>,
}

impl Model {
    pub fn parent_matrix(&self) -> Matrix4<f32> {
        compose_trs(self.position, self.rotation, self.scale)
    }

    /// Recompute and upload every child's world matrix under the model's
    /// current transform. Do not call `update_transform` directly on a
    /// child; it would drop the parent term.
    pub fn update_transforms(&mut self, queue: &wgpu::Queue) {
        let parent = self.parent_matrix();
        for object in &mut self.objects {
            object.update_transform_with_parent(queue, &parent);
        }
    }
}

/// Load a model file, appending its meshes to `meshes` and its textures to
/// `textures`, and registering its materials in `materials`.
pub fn load_model(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    meshes: &mut Vec<Mesh>,
    textures: &mut TextureStore,
    materials: &mut MaterialManager,
    path: &Path,
) -> Result<Model, AssetError> {
    log::info!("loading model {}...", path.display());

    let (models, obj_materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )
    .map_err(|source| AssetError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let obj_materials = obj_materials.unwrap_or_else(|e| {
        log::warn!("no usable MTL for {}: {}", path.display(), e);
        Vec::new()
    });

    let model_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut cache = TextureCache::new();

    // material names as tobj reports them, in index order, for mesh lookup
    let mut material_names = Vec::with_capacity(obj_materials.len());

    for (i, mtl) in obj_materials.iter().enumerate() {
        let material_name = if mtl.name.is_empty() {
            format!("material_{}", i)
        } else {
            mtl.name.clone()
        };
        material_names.push(material_name.clone());

        if materials.get_material(&material_name).is_some() {
            continue;
        }

        let diffuse = mtl.diffuse.unwrap_or([1.0, 1.0, 1.0]);
        let specular = mtl.specular.unwrap_or([1.0, 1.0, 1.0]);
        let specular_strength = (specular[0] + specular[1] + specular[2]) / 3.0;
        let mut material = Material::new(
            &material_name,
            diffuse,
            mtl.shininess.unwrap_or(64.0),
            specular_strength,
        );

        let slots = [
            (TextureKind::Diffuse, &mtl.diffuse_texture, true),
            (TextureKind::Specular, &mtl.specular_texture, false),
        ];
        for (kind, reference, srgb) in slots {
            let Some(reference) = reference else { continue };
            let joined = model_dir.join(reference);
            let joined_key = joined.display().to_string();

            let resolved = cache.resolve(&joined_key, |_| {
                let texture = TextureResource::from_path(device, queue, &joined, srgb)?;
                Ok(textures.insert(texture))
            });

            match resolved {
                Ok(handle) => {
                    if let Err(e) = material.push_texture(kind, handle) {
                        log::warn!("{}: {}", material_name, e);
                    }
                }
                Err(e) => log::warn!("{}", e),
            }
        }

        materials.add_material(material);
    }

    let mut objects = Vec::new();

    for m in models.iter() {
        let mesh = &m.mesh;

        let normals = if !mesh.normals.is_empty() && mesh.normals.len() == mesh.positions.len() {
            mesh.normals.clone()
        } else {
            Mesh::calculate_face_normals(&mesh.positions, &mesh.indices)
        };

        let vertices = (0..mesh.positions.len() / 3)
            .map(|i| Vertex3D {
                position: [
                    mesh.positions[i * 3],
                    mesh.positions[i * 3 + 1],
                    mesh.positions[i * 3 + 2],
                ],
                tex_coords: [
                    mesh.texcoords.get(i * 2).map_or(0.0, |f| *f),
                    // OBJ texture space starts at the bottom
                    1.0 - mesh.texcoords.get(i * 2 + 1).map_or(0.0, |f| *f),
                ],
                normal: [normals[i * 3], normals[i * 3 + 1], normals[i * 3 + 2]],
            })
            .collect::<Vec<_>>();

        let mut gpu_mesh = Mesh::new(vertices, Some(mesh.indices.clone()));
        gpu_mesh.upload(device);
        meshes.push(gpu_mesh);
        let mesh_id = meshes.len() - 1;

        let mut object = Object::new(
            if m.name.is_empty() { "mesh" } else { &m.name },
            mesh_id,
        );
        if let Some(material_id) = mesh.material_id {
            if let Some(name) = material_names.get(material_id) {
                object.material_id = Some(name.clone());
            }
        }
        object.init_gpu_resources(device);
        objects.push(object);
    }

    log::info!(
        "model {} parsed: {} meshes, {} cached textures",
        path.display(),
        objects.len(),
        cache.len()
    );

    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".to_string());

    Ok(Model {
        name,
        objects,
        position: Vector3::new(0.0, 0.0, 0.0),
        rotation: Vector3::new(0.0, 0.0, 0.0),
        scale: Vector3::new(1.0, 1.0, 1.0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{InnerSpace, Vector4};

    #[test]
    fn test_cache_reuses_handle_and_loads_once() {
        let mut cache = TextureCache::new();
        let mut loads = 0;

        let first = cache
            .resolve("models/container.png", |_| {
                loads += 1;
                Ok(7)
            })
            .unwrap();
        let second = cache
            .resolve("models/container.png", |_| {
                loads += 1;
                Ok(99)
            })
            .unwrap();

        assert_eq!(first, 7);
        assert_eq!(second, 7);
        assert_eq!(loads, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_distinguishes_paths() {
        let mut cache = TextureCache::new();
        cache.resolve("a/tex.png", |_| Ok(0)).unwrap();
        let other = cache.resolve("b/tex.png", |_| Ok(1)).unwrap();
        assert_eq!(other, 1);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_cache_does_not_remember_failures() {
        let mut cache = TextureCache::new();
        let result = cache.resolve("broken.png", |path| {
            Err(AssetError::Missing {
                path: path.into(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
            })
        });
        assert!(result.is_err());
        assert!(cache.is_empty());

        // a later successful load goes through
        let handle = cache.resolve("broken.png", |_| Ok(3)).unwrap();
        assert_eq!(handle, 3);
    }

    #[test]
    fn test_parent_transform_composes_rather_than_adds() {
        let mut model = Model {
            name: "test".to_string(),
            objects: Vec::new(),
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Vector3::new(0.0, std::f32::consts::FRAC_PI_2, 0.0),
            scale: Vector3::new(1.0, 1.0, 1.0),
        };

        let child_local = compose_trs(
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 1.0, 1.0),
        );
        let world = model.parent_matrix() * child_local;
        let origin = world * Vector4::new(0.0, 0.0, 0.0, 1.0);

        // a 90 degree parent yaw swings the child's +x offset onto -z;
        // additive flattening would have left it at +x
        assert!((origin.truncate() - Vector3::new(0.0, 0.0, -1.0)).magnitude() < 1e-6);

        model.rotation = Vector3::new(0.0, 0.0, 0.0);
        model.position = Vector3::new(0.0, 2.0, 0.0);
        let world = model.parent_matrix() * child_local;
        let origin = world * Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert!((origin.truncate() - Vector3::new(1.0, 2.0, 0.0)).magnitude() < 1e-6);
    }
}
