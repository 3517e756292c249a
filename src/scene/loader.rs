//! Scene description reader.
//!
//! The format is a flat stream of whitespace separated tokens. A record is
//! recognised by a marker appearing anywhere inside a token and is followed
//! by a fixed number of floats:
//!
//! ```text
//! objs/chair.obj   tx ty tz   angle ax ay az   sx sy sz
//! camera           x y z
//! deltaeye         dx dy dz
//! light_ambient    r g b
//! light_diffuse    r g b
//! ```
//!
//! Anything else is skipped. Fields are read positionally, so a short or
//! malformed record shifts the following values; bad numbers read as zero.

use crate::assets::MeshResolver;
use crate::render::EyeSide;
use crate::scene::{PlacedObject, Rotation, SceneModel};
use glam::Vec3;
use std::path::Path;
use std::str::SplitWhitespace;

pub const MODEL_MARKER: &str = ".obj";
pub const CAMERA_MARKER: &str = "camera";
pub const DELTA_EYE_MARKER: &str = "deltaeye";
pub const AMBIENT_MARKER: &str = "light_ambient";
pub const DIFFUSE_MARKER: &str = "light_diffuse";

#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("scene file does not exist: {path}")]
    NotFound {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read scene file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, SceneError>;

/// Reads `path` and applies its records to `scene`.
pub fn load_scene_file<R: MeshResolver>(
    path: &Path,
    scene: &mut SceneModel,
    meshes: &mut R,
) -> Result<()> {
    let source = std::fs::read_to_string(path).map_err(|source| {
        let path = path.display().to_string();
        if source.kind() == std::io::ErrorKind::NotFound {
            SceneError::NotFound { path, source }
        } else {
            SceneError::Read { path, source }
        }
    })?;
    parse_scene(&source, scene, meshes);
    log::info!(
        "Scene {} loaded: {} objects, left eye {:?}, eye delta {:?}",
        path.display(),
        scene.objects().len(),
        scene.camera.left_eye(),
        scene.camera.eye_delta()
    );
    Ok(())
}

pub fn parse_scene<R: MeshResolver>(source: &str, scene: &mut SceneModel, meshes: &mut R) {
    let mut fields = Fields {
        tokens: source.split_whitespace(),
    };
    while let Some(token) = fields.tokens.next() {
        if token.contains(MODEL_MARKER) {
            let position = fields.vec3(token);
            let rotation = Rotation::from_array([
                fields.float(token),
                fields.float(token),
                fields.float(token),
                fields.float(token),
            ]);
            let scale = fields.vec3(token);
            let mesh = meshes.resolve(token);
            scene.add_object(PlacedObject::new(mesh, token, position, rotation, scale));
        } else if token.contains(CAMERA_MARKER) {
            let left_eye = fields.vec3(token);
            scene.camera.place_left_eye(left_eye);
        } else if token.contains(DELTA_EYE_MARKER) {
            let delta = fields.vec3(token);
            scene.camera.set_eye_delta(delta);
        } else if token.contains(AMBIENT_MARKER) {
            scene.light.ambient = fields.vec3(token);
        } else if token.contains(DIFFUSE_MARKER) {
            scene.light.diffuse = fields.vec3(token);
        }
    }
    if scene.camera.eye_on_view_at(EyeSide::Right) {
        log::warn!(
            "Right eye {:?} coincides with the view-at point; it will render nothing until the camera turns",
            scene.camera.right_eye()
        );
    }
}

struct Fields<'a> {
    tokens: SplitWhitespace<'a>,
}

impl Fields<'_> {
    fn float(&mut self, record: &str) -> f32 {
        match self.tokens.next() {
            Some(token) => token.parse().unwrap_or_else(|_| {
                log::warn!("'{}': expected a number, found '{}'", record, token);
                0.0
            }),
            None => {
                log::warn!("'{}': scene file ended inside the record", record);
                0.0
            }
        }
    }

    fn vec3(&mut self, record: &str) -> Vec3 {
        Vec3::new(self.float(record), self.float(record), self.float(record))
    }
}
