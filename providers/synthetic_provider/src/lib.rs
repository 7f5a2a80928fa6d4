// Native provider that fakes a face-mesh camera: a face that blinks on a fixed
// cadence and now and then leaves the frame. Useful for running the daemon
// without a camera.

use anyhow::Result;
use api::{
    FaceFrame, LandmarkProvider, ProviderLogger, FACE_MESH_POINTS, LEFT_EYE_INDICES,
    RIGHT_EYE_INDICES,
};
use glam::Vec3;

const EYE_WIDTH: f32 = 0.06;
const OPEN_EAR: f32 = 0.3;
const CLOSED_EAR: f32 = 0.05;

pub struct SyntheticProvider {
    frame_count: u64,
    /// Frames between blink onsets.
    blink_every: u64,
    /// Frames the eyes stay shut per blink.
    closed_for: u64,
    /// Frames between stretches of no face.
    away_every: u64,
    away_for: u64,
    logger: Option<ProviderLogger>,
}

impl SyntheticProvider {
    pub fn new() -> Self {
        Self {
            frame_count: 0,
            blink_every: 120,
            closed_for: 3,
            away_every: 1800,
            away_for: 45,
            logger: None,
        }
    }

    fn face_away(&self) -> bool {
        self.frame_count % self.away_every >= self.away_every - self.away_for
    }

    fn eyes_closed(&self) -> bool {
        self.frame_count % self.blink_every < self.closed_for
    }
}

impl Default for SyntheticProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Writes an eye with the given aspect ratio around `center`, in EAR point order.
fn place_eye(landmarks: &mut [Vec3], indices: &[usize; 6], center: Vec3, ear: f32) {
    let half_w = EYE_WIDTH / 2.0;
    let half_h = EYE_WIDTH * ear / 2.0;
    let offsets = [
        Vec3::new(-half_w, 0.0, 0.0),
        Vec3::new(-half_w / 3.0, -half_h, 0.0),
        Vec3::new(half_w / 3.0, -half_h, 0.0),
        Vec3::new(half_w, 0.0, 0.0),
        Vec3::new(half_w / 3.0, half_h, 0.0),
        Vec3::new(-half_w / 3.0, half_h, 0.0),
    ];
    for (index, offset) in indices.iter().zip(offsets) {
        landmarks[*index] = center + offset;
    }
}

pub fn synthetic_face(ear: f32) -> FaceFrame {
    let mut landmarks = vec![Vec3::new(0.5, 0.5, 0.0); FACE_MESH_POINTS];
    place_eye(&mut landmarks, &LEFT_EYE_INDICES, Vec3::new(0.4, 0.4, 0.0), ear);
    place_eye(&mut landmarks, &RIGHT_EYE_INDICES, Vec3::new(0.6, 0.4, 0.0), ear);
    FaceFrame::detected(landmarks)
}

impl LandmarkProvider for SyntheticProvider {
    fn initialize(&mut self, logger: ProviderLogger) -> Result<()> {
        logger.info(&format!(
            "Synthetic face: blink every {} frames, away {} of every {} frames",
            self.blink_every, self.away_for, self.away_every
        ));
        self.logger = Some(logger);
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<FaceFrame>> {
        self.frame_count += 1;

        let frame = if self.face_away() {
            FaceFrame::no_face()
        } else if self.eyes_closed() {
            synthetic_face(CLOSED_EAR)
        } else {
            synthetic_face(OPEN_EAR)
        };

        if let Some(logger) = &self.logger {
            if self.frame_count.is_multiple_of(1000) {
                logger.debug(&format!("Frame {}", self.frame_count));
            }
        }

        Ok(Some(frame))
    }

    fn unload(&mut self) {
        if let Some(logger) = &self.logger {
            logger.info(&format!(
                "Synthetic provider stopped after {} frames",
                self.frame_count
            ));
        }
    }
}

#[no_mangle]
#[allow(improper_ctypes_definitions)]
pub extern "C" fn create_provider() -> *mut dyn LandmarkProvider {
    Box::into_raw(Box::new(SyntheticProvider::new()))
}
