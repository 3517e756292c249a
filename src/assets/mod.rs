//! Mesh and texture arena.
//!
//! Meshes are loaded once per path and handed out as copyable handles, so
//! any number of placed objects can instance the same geometry. A failed
//! import never aborts the session: the handle points at an empty mesh that
//! draws nothing.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(u32);

impl MeshHandle {
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[cfg(test)]
    pub fn from_index(index: usize) -> Self {
        Self(index as u32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(u32);

#[derive(Debug, Clone)]
pub struct TextureData {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct SubMesh {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub texcoords: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
    pub diffuse: Option<TextureHandle>,
}

#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub name: String,
    pub path: String,
    pub sub_meshes: Vec<SubMesh>,
}

impl MeshData {
    fn empty(path: &str) -> Self {
        Self {
            name: file_name(path),
            path: path.to_string(),
            sub_meshes: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sub_meshes.iter().all(|sub| sub.indices.is_empty())
    }

    pub fn triangle_count(&self) -> usize {
        self.sub_meshes.iter().map(|sub| sub.indices.len() / 3).sum()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to load OBJ at {path}: {source}")]
    Obj {
        path: String,
        #[source]
        source: tobj::LoadError,
    },
    #[error("failed to decode texture at {path}: {source}")]
    Texture {
        path: String,
        #[source]
        source: image::ImageError,
    },
}

/// Resolves a model path to a shared mesh handle.
pub trait MeshResolver {
    fn resolve(&mut self, path: &str) -> MeshHandle;
}

#[derive(Default)]
pub struct AssetManager {
    meshes: Vec<MeshData>,
    mesh_by_path: HashMap<String, MeshHandle>,
    textures: Vec<TextureData>,
    texture_by_path: HashMap<PathBuf, TextureHandle>,
}

impl AssetManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn mesh(&self, handle: MeshHandle) -> Option<&MeshData> {
        self.meshes.get(handle.index())
    }

    pub fn texture(&self, handle: TextureHandle) -> Option<&TextureData> {
        self.textures.get(handle.0 as usize)
    }

    pub fn loaded_paths(&self) -> impl Iterator<Item = &str> {
        self.meshes.iter().map(|mesh| mesh.path.as_str())
    }

    /// Returns the handle for `path`, importing it on first use.
    pub fn load_model(&mut self, path: &str) -> MeshHandle {
        if let Some(handle) = self.mesh_by_path.get(path) {
            return *handle;
        }
        let mesh = match self.import_obj(path) {
            Ok(mesh) => {
                log::info!(
                    "Loaded model '{}' ({} sub-meshes, {} triangles)",
                    path,
                    mesh.sub_meshes.len(),
                    mesh.triangle_count()
                );
                mesh
            }
            Err(err) => {
                log::warn!("{}; drawing nothing for it", err);
                MeshData::empty(path)
            }
        };
        let handle = MeshHandle(self.meshes.len() as u32);
        self.meshes.push(mesh);
        self.mesh_by_path.insert(path.to_string(), handle);
        handle
    }

    fn import_obj(&mut self, path: &str) -> Result<MeshData, AssetError> {
        let (models, materials) = tobj::load_obj(
            path,
            &tobj::LoadOptions {
                triangulate: true,
                single_index: true,
                ..Default::default()
            },
        )
        .map_err(|source| AssetError::Obj {
            path: path.to_string(),
            source,
        })?;

        let materials = materials.unwrap_or_else(|err| {
            log::debug!("No materials for {}: {}", path, err);
            Vec::new()
        });
        let directory = Path::new(path)
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let mut sub_meshes = Vec::with_capacity(models.len());
        for model in models {
            let mesh = model.mesh;
            let diffuse = mesh
                .material_id
                .and_then(|id| materials.get(id))
                .and_then(|material| material.diffuse_texture.as_deref())
                .filter(|texture| !texture.is_empty())
                .and_then(|texture| self.load_texture(&directory.join(texture)));

            sub_meshes.push(SubMesh {
                positions: mesh
                    .positions
                    .chunks_exact(3)
                    .map(|p| [p[0], p[1], p[2]])
                    .collect(),
                normals: mesh
                    .normals
                    .chunks_exact(3)
                    .map(|n| [n[0], n[1], n[2]])
                    .collect(),
                texcoords: mesh
                    .texcoords
                    .chunks_exact(2)
                    .map(|t| [t[0], t[1]])
                    .collect(),
                indices: mesh.indices,
                diffuse,
            });
        }

        Ok(MeshData {
            name: file_name(path),
            path: path.to_string(),
            sub_meshes,
        })
    }

    fn load_texture(&mut self, path: &Path) -> Option<TextureHandle> {
        if let Some(handle) = self.texture_by_path.get(path) {
            return Some(*handle);
        }
        match decode_texture(path) {
            Ok(texture) => {
                let handle = TextureHandle(self.textures.len() as u32);
                self.textures.push(texture);
                self.texture_by_path.insert(path.to_path_buf(), handle);
                Some(handle)
            }
            Err(err) => {
                log::warn!("{}", err);
                None
            }
        }
    }
}

impl MeshResolver for AssetManager {
    fn resolve(&mut self, path: &str) -> MeshHandle {
        self.load_model(path)
    }
}

fn decode_texture(path: &Path) -> Result<TextureData, AssetError> {
    let image = image::open(path)
        .map_err(|source| AssetError::Texture {
            path: path.display().to_string(),
            source,
        })?
        .to_rgba8();
    Ok(TextureData {
        path: path.to_path_buf(),
        width: image.width(),
        height: image.height(),
        rgba: image.into_raw(),
    })
}

fn file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|value| value.to_str())
        .unwrap_or("model")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        let nonce = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        path.push(format!("stereoview_{}_{}_{}", std::process::id(), nonce, name));
        path
    }

    #[test]
    fn missing_model_yields_empty_mesh() {
        let mut assets = AssetManager::new();
        let handle = assets.load_model("does/not/exist.obj");
        let mesh = assets.mesh(handle).unwrap();
        assert!(mesh.is_empty());
        assert_eq!(mesh.name, "exist.obj");
    }

    #[test]
    fn same_path_shares_one_mesh() {
        let mut assets = AssetManager::new();
        let a = assets.load_model("objs/missing.obj");
        let b = assets.resolve("objs/missing.obj");
        let c = assets.load_model("objs/other.obj");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(assets.len(), 2);
    }

    #[test]
    fn triangle_obj_is_imported() {
        let path = temp_path("triangle.obj");
        std::fs::write(&path, "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();

        let mut assets = AssetManager::new();
        let handle = assets.load_model(path.to_str().unwrap());
        let mesh = assets.mesh(handle).unwrap();
        assert!(!mesh.is_empty());
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.sub_meshes[0].positions.len(), 3);
        assert_eq!(mesh.sub_meshes[0].positions[1], [1.0, 0.0, 0.0]);
        assert!(mesh.sub_meshes[0].diffuse.is_none());

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn undecodable_texture_is_skipped() {
        let path = temp_path("not_an_image.png");
        std::fs::write(&path, b"definitely not a png").unwrap();

        let mut assets = AssetManager::new();
        assert!(assets.load_texture(&path).is_none());
        assert!(assets.textures.is_empty());

        let _ = std::fs::remove_file(path);
    }
}
