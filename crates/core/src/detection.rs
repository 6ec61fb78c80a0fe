//! Structured detections returned by the inference collaborator.

use serde::{Deserialize, Serialize};

/// Per-stage timing reported by the model, in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Speed {
    pub preprocess: f64,
    pub inference: f64,
    pub postprocess: f64,
    #[serde(default)]
    pub total: Option<f64>,
}

/// One detected object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Bounding box `[x1, y1, x2, y2]` in source pixels.
    #[serde(rename = "box")]
    pub bbox: Vec<f64>,
    pub class: String,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<Speed>,
}

/// Class label stored when the model found nothing.
pub const UNKNOWN_CLASS: &str = "unknown";

/// Headline class and confidence for a detection list: the first detection
/// as ordered by the model, or `unknown` with zero confidence.
pub fn headline(detections: &[Detection]) -> (String, f64) {
    detections
        .first()
        .map(|d| (d.class.clone(), d.confidence))
        .unwrap_or_else(|| (UNKNOWN_CLASS.to_string(), 0.0))
}
