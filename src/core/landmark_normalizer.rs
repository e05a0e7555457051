// Landmark normalizer - maps unit-normalized engine output into pixel space

use crate::models::pose::{EngineOutput, Landmark, NormalizedLandmark, Pose, PoseResult};

/// Likelihood reported when the engine gives no visibility score
pub const DEFAULT_LIKELIHOOD: f32 = 1.0;

/// Scale every landmark of every detected pose to the frame size.
///
/// x and y are multiplied by the image width and height, z is passed through
/// unchanged, and a missing visibility becomes full confidence. Landmarks keep
/// the engine's index as their key.
pub fn normalize(output: &EngineOutput, image_width: u32, image_height: u32) -> PoseResult {
    let width = image_width as f32;
    let height = image_height as f32;

    let poses = output
        .poses
        .iter()
        .map(|landmarks| Pose {
            landmarks: landmarks
                .iter()
                .enumerate()
                .map(|(index, landmark)| (index, to_pixel_space(landmark, width, height)))
                .collect(),
        })
        .collect();

    PoseResult { poses }
}

fn to_pixel_space(landmark: &NormalizedLandmark, width: f32, height: f32) -> Landmark {
    Landmark {
        x: landmark.x * width,
        y: landmark.y * height,
        z: landmark.z,
        likelihood: landmark.visibility.unwrap_or(DEFAULT_LIKELIHOOD),
    }
}
