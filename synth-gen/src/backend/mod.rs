//! Narrow capability surface over the 3D engine.
//!
//! The engine's scene graph, rigid-body solver, and rasterizer live behind
//! [`RenderBackend`]; the pipeline only ever talks to this trait, so the
//! orchestration logic is testable without a real engine.

use crate::common::*;

pub use headless::*;
pub mod headless;

/// Opaque handle to an object owned by the render backend. Handles are only
/// valid until the next `reset_scene` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectHandle(pub(crate) usize);

/// Light source variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightKind {
    Point,
    Directional,
    Area,
}

/// Rigid body participation variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RigidBodyKind {
    /// Simulated body responding to gravity and collisions.
    Active,
    /// Static collider, e.g. the ground plane.
    Passive,
}

/// A concrete light placement produced by the lighting randomizer.
#[derive(Debug, Clone, PartialEq)]
pub struct LightSpec {
    pub kind: LightKind,
    /// Light intensity in engine energy units.
    pub energy: f64,
    pub location: DVec3,
    /// RGB tint derived from the sampled color temperature.
    pub color: [f64; 3],
}

/// A concrete camera placement produced by the camera randomizer.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraView {
    pub location: DVec3,
    pub look_at: DVec3,
    /// Focal length in millimeters.
    pub focal_length: f64,
}

/// Scene, physics, camera, and rasterization operations consumed by the
/// generation pipeline. One backend instance owns one logical scene; all
/// per-image steps run sequentially on it.
pub trait RenderBackend {
    /// Remove every object, light, and rigid body from the scene.
    fn reset_scene(&mut self);

    /// Scene-level physics setup.
    fn configure_physics(&mut self, gravity: DVec3, substeps: u32);

    /// Scene-level render setup (engine, resolution, output format).
    fn configure_render(&mut self, config: &crate::config::RenderConfig);

    /// Add a square ground plane of the given size centered at `location`.
    fn add_plane(&mut self, size: f64, location: DVec3) -> ObjectHandle;

    fn add_light(&mut self, light: &LightSpec);

    fn set_background(&mut self, rgba: [f64; 4]);

    /// Load a model into the scene at the given uniform scale and location.
    /// Returns `None` when the asset is missing or corrupt.
    fn load_model(&mut self, path: &Path, scale: f64, location: DVec3) -> Option<ObjectHandle>;

    fn apply_rigid_body(
        &mut self,
        handle: ObjectHandle,
        kind: RigidBodyKind,
        mass: f64,
        friction: f64,
        restitution: f64,
    );

    /// Advance the rigid-body simulation over the given frame range and
    /// freeze object poses at the final frame.
    fn step_physics(&mut self, start_frame: u32, end_frame: u32);

    fn set_camera_pose(&mut self, location: DVec3, look_at: DVec3, focal_length: f64);

    /// Project a world-space point into camera-normalized view coordinates:
    /// `(x, y)` span the view frame in `[0, 1]` and `depth` is the distance
    /// in front of the camera (negative behind it).
    fn project_world_to_camera(&self, point: DVec3) -> (f64, f64, f64);

    /// World-space vertex positions of a loaded object, reflecting its
    /// post-physics transform.
    fn object_vertices(&self, handle: ObjectHandle) -> Vec<DVec3>;

    /// Shift the object's material base color and roughness, clamped to
    /// valid parameter ranges by the backend.
    fn jitter_material(&mut self, handle: ObjectHandle, color_shift: [f64; 3], roughness_shift: f64);

    /// Rasterize the scene to `path`. `Ok(false)` signals a render failure
    /// that should discard the current image without aborting the job.
    fn render(&mut self, path: &Path) -> Result<bool>;
}

impl CameraView {
    /// Apply this view to a backend.
    pub fn apply<B>(&self, backend: &mut B)
    where
        B: RenderBackend,
    {
        backend.set_camera_pose(self.location, self.look_at, self.focal_length);
    }
}
