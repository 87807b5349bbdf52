use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageDims {
    pub w: Option<f32>,
    pub h: Option<f32>,
}

impl ImageDims {
    pub fn new(w: f32, h: f32) -> Self {
        Self {
            w: Some(w),
            h: Some(h),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(rename = "box")]
    pub bbox: [f32; 4],
}

impl Detection {
    pub fn new(label: impl Into<String>, bbox: [f32; 4]) -> Self {
        Self {
            label: Some(label.into()),
            bbox,
        }
    }

    pub fn unlabeled(bbox: [f32; 4]) -> Self {
        Self { label: None, bbox }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcrResult {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
    #[serde(default)]
    pub boxes: Vec<Detection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_dims: Option<ImageDims>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

impl OcrResult {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn has_boxes(&self) -> bool {
        !self.boxes.is_empty()
    }
}

pub fn parse_result(bytes: &[u8]) -> Result<OcrResult> {
    serde_json::from_slice(bytes).with_context(|| "failed to parse OCR result payload")
}

pub fn summarize_boxes(boxes: &[Detection]) -> Vec<String> {
    boxes
        .iter()
        .enumerate()
        .map(|(idx, detection)| {
            let [x1, y1, x2, y2] = detection.bbox;
            let coords = format!(
                "[{}, {}, {}, {}]",
                x1.round() as i64,
                y1.round() as i64,
                x2.round() as i64,
                y2.round() as i64
            );
            match detection.label.as_deref().filter(|label| !label.is_empty()) {
                Some(label) => format!("Box {}: {} {}", idx + 1, label, coords),
                None => format!("Box {}: {}", idx + 1, coords),
            }
        })
        .collect()
}
