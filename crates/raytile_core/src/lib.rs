//! raytile core - scene model for the tile ray tracer.
//!
//! This crate provides:
//!
//! - **Scene types**: `Scene`, `SceneObject`, `Geometry`, `Material`, `Light`
//! - **Validation**: the lighting model needs four lights, see [`Scene::validate`]
//! - **Showcase scene**: the stock five-wall box used by the CLI
//!
//! # Example
//!
//! ```ignore
//! use raytile_core::showcase;
//!
//! let scene = showcase::scene();
//! scene.validate()?;
//! println!("{} objects, {} lights", scene.objects.len(), scene.lights.len());
//! ```

pub mod scene;
pub mod showcase;

// Re-export commonly used types
pub use scene::{
    CameraRig, Color, Geometry, Light, LightKind, Material, Scene, SceneError, SceneObject,
    SceneResult, Transform, REQUIRED_LIGHTS,
};
