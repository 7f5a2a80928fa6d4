//! Eye aspect ratio from face-mesh landmarks.
//!
//! Each eye is described by six points ordered outer corner, upper-outer,
//! upper-inner, inner corner, lower-inner, lower-outer:
//!
//! ```text
//! EAR = (|p2 - p6| + |p3 - p5|) / (2 * |p1 - p4|)
//! ```

use glam::Vec3;

use crate::FaceFrame;
pub use api::{LEFT_EYE_INDICES, RIGHT_EYE_INDICES};

/// Horizontal eye widths below this are treated as collapsed geometry.
pub const MIN_HORIZONTAL_DISTANCE: f32 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum SampleError {
    #[error("eye sample needs 6 points, got {0}")]
    TooFewPoints(usize),
    #[error("landmark {index} missing from a {available}-point face")]
    MissingLandmark { index: usize, available: usize },
    #[error("degenerate eye geometry: horizontal distance {0}")]
    DegenerateGeometry(f32),
    #[error("non-finite landmark coordinate")]
    NonFinite,
}

/// Six ordered landmarks of one eye.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeSample {
    points: [Vec3; 6],
}

impl EyeSample {
    pub fn new(points: [Vec3; 6]) -> Self {
        Self { points }
    }

    pub fn from_points(points: &[Vec3]) -> Result<Self, SampleError> {
        let points: [Vec3; 6] = points
            .get(..6)
            .and_then(|p| p.try_into().ok())
            .ok_or(SampleError::TooFewPoints(points.len()))?;
        Ok(Self { points })
    }

    /// Picks the six points named by `indices` out of a full face mesh.
    pub fn from_face(landmarks: &[Vec3], indices: &[usize; 6]) -> Result<Self, SampleError> {
        let mut points = [Vec3::ZERO; 6];
        for (slot, &index) in points.iter_mut().zip(indices) {
            *slot = *landmarks.get(index).ok_or(SampleError::MissingLandmark {
                index,
                available: landmarks.len(),
            })?;
        }
        Ok(Self { points })
    }

    pub fn aspect_ratio(&self) -> Result<f32, SampleError> {
        let [p1, p2, p3, p4, p5, p6] = self.points;
        if !self.points.iter().all(|p| p.is_finite()) {
            return Err(SampleError::NonFinite);
        }

        let horizontal = p1.distance(p4);
        if horizontal < MIN_HORIZONTAL_DISTANCE {
            return Err(SampleError::DegenerateGeometry(horizontal));
        }

        let ear = (p2.distance(p6) + p3.distance(p5)) / (2.0 * horizontal);
        if ear.is_finite() {
            Ok(ear)
        } else {
            Err(SampleError::NonFinite)
        }
    }
}

/// EAR of an arbitrary point slice; only the first six points are used.
pub fn eye_aspect_ratio(points: &[Vec3]) -> Result<f32, SampleError> {
    EyeSample::from_points(points)?.aspect_ratio()
}

/// Per-eye readings extracted from one detected face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeReadings {
    pub left: Result<f32, SampleError>,
    pub right: Result<f32, SampleError>,
}

impl EyeReadings {
    pub fn from_frame(frame: &FaceFrame) -> Option<Self> {
        if !frame.face_detected {
            return None;
        }
        let read = |indices: &[usize; 6]| {
            EyeSample::from_face(&frame.landmarks, indices).and_then(|s| s.aspect_ratio())
        };
        Some(Self {
            left: read(&LEFT_EYE_INDICES),
            right: read(&RIGHT_EYE_INDICES),
        })
    }

    /// Both eyes have to be readable; a single broken eye voids the frame.
    pub fn average(&self) -> Option<f32> {
        match (&self.left, &self.right) {
            (Ok(l), Ok(r)) => Some((l + r) / 2.0),
            _ => None,
        }
    }
}
