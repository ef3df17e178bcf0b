//! raytile renderer - tile-parallel recursive ray casting
//!
//! Turns a [`raytile_core::Scene`] into an RGBA8 frame. Each pixel is
//! shaded by following mirror bounces and summing four lights; the frame
//! is split into square tiles that a pool of worker threads renders
//! independently while a [`Coordinator`] stitches the results together.
//!
//! For single-process use without the worker pool, see [`render_local`].

mod camera;
mod codec;
mod coordinator;
mod hittable;
mod job;
mod lighting;
mod local;
mod settings;
mod shading;
mod supersample;
mod tile;
mod worker;

pub use camera::Camera;
pub use codec::{byte_len, decode_channel, encode_channel, ColorBuffer, Frame};
pub use coordinator::{Coordinator, CoordinatorError, CoordinatorResult, RenderEvent, RenderState};
pub use hittable::{hit_object, Intersection, IntersectionOracle, RAY_EPSILON};
pub use job::{RenderJob, ShadingParams, Size, TileResult, WorkerCommand, WorkerMessage};
pub use lighting::{LightRig, LightSample, LightSource};
pub use local::render_local;
pub use settings::{RenderSettings, SettingsError, SettingsResult};
pub use shading::{reflect_view, tone_map, Shader};
pub use supersample::{render_pixel, sample_positions, supersample, MAX_SUPER_SAMPLING_RATE};
pub use tile::{render_tile, tile_size_from_exponent, Tile, TileGrid};
pub use worker::{run_job, spawn_worker, QueueError, WorkerHandle, JOB_QUEUE_DEPTH};
