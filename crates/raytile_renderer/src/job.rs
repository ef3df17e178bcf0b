//! Render jobs and the coordinator/worker message protocol.
//!
//! Messages are plain data. In-process they travel over channels as Rust
//! values; they also serialize to JSON in the shape a remote worker
//! would speak:
//!
//! ```text
//! {"command":"raytrace","frame":1,"size":{"x":960,"y":720},"superSamplingRate":0,...}
//! {"command":"close"}
//! {"message":"raytraceResult","frame":1,"tileIndex":3,"data":{...},"startX":192,"startY":0}
//! ```

use raytile_core::Color;
use serde::{Deserialize, Serialize};

use crate::codec::ColorBuffer;
use crate::tile::{Tile, TileGrid};

/// Shading switches and limits shared by every pixel of a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShadingParams {
    /// Sub-pixel samples minus one (0-3)
    pub super_sampling_rate: u32,
    /// Maximum number of mirror bounces
    pub max_recursion_depth: u32,
    /// Multiplier on the specular highlight
    pub phong_magnitude: f32,
    /// Shade with all four lights, or only the first one
    pub all_lights: bool,
    pub calc_diffuse: bool,
    pub calc_phong: bool,
    pub use_mirrors: bool,
    /// Color of rays that escape the scene or see no light
    pub background: [f32; 3],
}

impl Default for ShadingParams {
    fn default() -> Self {
        Self {
            super_sampling_rate: 0,
            max_recursion_depth: 4,
            phong_magnitude: 50.0,
            all_lights: true,
            calc_diffuse: true,
            calc_phong: true,
            use_mirrors: true,
            background: [0.0, 0.0, 0.0],
        }
    }
}

impl ShadingParams {
    pub fn background(&self) -> Color {
        Color::from_array(self.background)
    }

    /// True when either lighting term is enabled.
    pub fn lit(&self) -> bool {
        self.calc_diffuse || self.calc_phong
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub x: u32,
    pub y: u32,
}

/// Everything one worker needs to render its share of a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderJob {
    /// Frame this job belongs to; results echo it back
    pub frame: u64,
    pub size: Size,
    /// Tile edge length in pixels
    pub section_size: u32,
    pub worker_index: usize,
    pub worker_count: usize,
    /// Explicit tile indices. `None` means the strided share
    /// `worker_index, worker_index + worker_count, ...`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiles: Option<Vec<usize>>,
    #[serde(flatten)]
    pub shading: ShadingParams,
}

impl RenderJob {
    /// Tile grid of the frame this job renders.
    pub fn grid(&self) -> TileGrid {
        TileGrid::new(self.size.x, self.size.y, self.section_size)
    }

    /// The tiles this job covers, in render order.
    pub fn assigned_tiles(&self) -> Vec<Tile> {
        let grid = self.grid();
        match &self.tiles {
            Some(indices) => indices
                .iter()
                .filter(|&&i| i < grid.total())
                .map(|&i| grid.tile(i))
                .collect(),
            None => grid.assigned(self.worker_index, self.worker_count).collect(),
        }
    }
}

/// Coordinator -> worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum WorkerCommand {
    Raytrace(RenderJob),
    /// Finish queued work and exit. In-process workers get this by
    /// having their job channel closed instead.
    Close,
}

/// One rendered tile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileResult {
    pub frame: u64,
    pub tile_index: usize,
    pub data: ColorBuffer,
    pub start_x: u32,
    pub start_y: u32,
}

/// Worker -> coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "message", rename_all = "camelCase")]
pub enum WorkerMessage {
    RaytraceResult(TileResult),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn job() -> RenderJob {
        RenderJob {
            frame: 1,
            size: Size { x: 100, y: 60 },
            section_size: 32,
            worker_index: 1,
            worker_count: 3,
            tiles: None,
            shading: ShadingParams::default(),
        }
    }

    #[test]
    fn test_raytrace_command_wire_shape() {
        let value = serde_json::to_value(WorkerCommand::Raytrace(job())).unwrap();

        assert_eq!(value["command"], "raytrace");
        assert_eq!(value["size"], json!({"x": 100, "y": 60}));
        assert_eq!(value["superSamplingRate"], 0);
        assert_eq!(value["maxRecursionDepth"], 4);
        assert_eq!(value["allLights"], true);
        assert_eq!(value["useMirrors"], true);
        assert_eq!(value["sectionSize"], 32);
        assert_eq!(value["workerIndex"], 1);
        assert_eq!(value["workerCount"], 3);
        assert!(value.get("tiles").is_none());
    }

    #[test]
    fn test_commands_parse_back() {
        let close: WorkerCommand = serde_json::from_value(json!({"command": "close"})).unwrap();
        assert_eq!(close, WorkerCommand::Close);

        let text = serde_json::to_string(&WorkerCommand::Raytrace(job())).unwrap();
        let parsed: WorkerCommand = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, WorkerCommand::Raytrace(job()));
    }

    #[test]
    fn test_result_wire_shape() {
        let message = WorkerMessage::RaytraceResult(TileResult {
            frame: 2,
            tile_index: 5,
            data: ColorBuffer::new(1, 1),
            start_x: 64,
            start_y: 32,
        });
        let value = serde_json::to_value(&message).unwrap();

        assert_eq!(value["message"], "raytraceResult");
        assert_eq!(value["startX"], 64);
        assert_eq!(value["startY"], 32);
        assert_eq!(value["data"]["width"], 1);
    }

    #[test]
    fn test_strided_assignment() {
        // 100x60 with 32px tiles: 4 x 2 grid
        let tiles = job().assigned_tiles();
        let indices: Vec<usize> = tiles.iter().map(|t| t.index).collect();
        assert_eq!(indices, vec![1, 4, 7]);
    }

    #[test]
    fn test_explicit_assignment_skips_out_of_range() {
        let mut job = job();
        job.tiles = Some(vec![6, 2, 40]);
        let indices: Vec<usize> = job.assigned_tiles().iter().map(|t| t.index).collect();
        assert_eq!(indices, vec![6, 2]);
    }
}
