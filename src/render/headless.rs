use super::{EyeFrame, EyeSide, RenderBackend, RenderError, ShaderKind};
use crate::assets::{AssetManager, SubMesh};
use glam::UVec2;

/// Backend that validates submissions and traces them instead of drawing.
/// Used when no GPU backend is linked in.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    window: UVec2,
    pending_eyes: Vec<EyeSide>,
    frames_presented: u64,
    triangles_submitted: usize,
    vertices_submitted: usize,
}

#[derive(Debug, Default)]
struct EyeStats {
    vertices: usize,
    triangles: usize,
    texels: usize,
    inert: usize,
    markers: usize,
}

impl EyeStats {
    /// Checks the vertex streams and bound texture a GPU upload would rely on.
    fn add_sub_mesh(
        &mut self,
        sub: &SubMesh,
        assets: &AssetManager,
        mesh_path: &str,
    ) -> Result<(), RenderError> {
        let vertices = sub.positions.len();
        let mismatched = |len: usize| len != 0 && len != vertices;
        if mismatched(sub.normals.len()) || mismatched(sub.texcoords.len()) {
            return Err(RenderError::Backend(format!(
                "{}: {} positions, {} normals, {} texcoords",
                mesh_path,
                vertices,
                sub.normals.len(),
                sub.texcoords.len()
            )));
        }
        if let Some(texture) = sub.diffuse.and_then(|handle| assets.texture(handle)) {
            let texels = texture.width as usize * texture.height as usize;
            if texture.rgba.len() != texels * 4 {
                return Err(RenderError::Backend(format!(
                    "texture {} holds {} bytes for {}x{} texels",
                    texture.path.display(),
                    texture.rgba.len(),
                    texture.width,
                    texture.height
                )));
            }
            self.texels += texels;
        }
        self.vertices += vertices;
        self.triangles += sub.indices.len() / 3;
        Ok(())
    }
}

impl HeadlessBackend {
    pub fn new(window: UVec2) -> Self {
        Self {
            window,
            ..Self::default()
        }
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    pub fn triangles_submitted(&self) -> usize {
        self.triangles_submitted
    }

    pub fn vertices_submitted(&self) -> usize {
        self.vertices_submitted
    }
}

impl RenderBackend for HeadlessBackend {
    fn resize(&mut self, window: UVec2) {
        self.window = window;
    }

    fn render_eye(&mut self, frame: &EyeFrame, assets: &AssetManager) -> Result<(), RenderError> {
        if frame.viewport.x + frame.viewport.width > self.window.x {
            return Err(RenderError::TargetLost(format!(
                "{:?} viewport {:?} exceeds window {}x{}",
                frame.eye, frame.viewport, self.window.x, self.window.y
            )));
        }

        let mut stats = EyeStats::default();
        for draw in &frame.draws {
            let Some(mesh) = assets.mesh(draw.mesh) else {
                return Err(RenderError::Backend(format!(
                    "unknown mesh handle {:?}",
                    draw.mesh
                )));
            };
            if draw.shader == ShaderKind::LightMarker {
                stats.markers += 1;
            }
            if mesh.is_empty() {
                stats.inert += 1;
                continue;
            }
            for sub in &mesh.sub_meshes {
                stats.add_sub_mesh(sub, assets, &mesh.path)?;
            }
            let light = frame.light_for(draw);
            log::trace!(
                "  {:?} '{}': attenuation {:.3}/{:.3}/{:.3}",
                draw.role,
                mesh.name,
                light.attenuation.constant,
                light.attenuation.linear,
                light.attenuation.quadratic
            );
        }
        self.triangles_submitted += stats.triangles;
        self.vertices_submitted += stats.vertices;
        self.pending_eyes.push(frame.eye);

        log::trace!(
            "{:?} eye: viewport {:?}, {} draws ({} inert, {} light markers), {} vertices, {} triangles, {} texels",
            frame.eye,
            frame.viewport,
            frame.draws.len(),
            stats.inert,
            stats.markers,
            stats.vertices,
            stats.triangles,
            stats.texels
        );
        Ok(())
    }

    fn present(&mut self) -> Result<(), RenderError> {
        if self.pending_eyes != EyeSide::BOTH {
            let pending = std::mem::take(&mut self.pending_eyes);
            return Err(RenderError::Backend(format!(
                "present after eyes {:?}, expected left then right",
                pending
            )));
        }
        self.pending_eyes.clear();
        self.frames_presented += 1;
        Ok(())
    }
}
