use crate::payload::{Detection, ImageDims, OcrResult};

const REF_OPEN: &str = "<|ref|>";
const REF_CLOSE: &str = "<|/ref|>";
const DET_OPEN: &str = "<|det|>";
const DET_CLOSE: &str = "<|/det|>";
const GROUNDING_MARK: &str = "<|grounding|>";

pub fn has_grounding_markers(text: &str) -> bool {
    text.contains(DET_OPEN) || text.contains(REF_OPEN) || text.contains(GROUNDING_MARK)
}

pub fn parse_transcript(raw: &str, image_dims: Option<ImageDims>) -> OcrResult {
    let transcript = raw.trim();
    let boxes = if transcript.contains(DET_OPEN) || transcript.contains(REF_OPEN) {
        parse_detections(transcript)
    } else {
        Vec::new()
    };
    let mut text = if transcript.contains(REF_OPEN) || transcript.contains(GROUNDING_MARK) {
        clean_grounding_text(transcript)
    } else {
        transcript.to_string()
    };
    if text.is_empty() && !boxes.is_empty() {
        text = boxes
            .iter()
            .map(|detection| detection.label.as_deref().unwrap_or_default())
            .collect::<Vec<_>>()
            .join(", ");
    }
    OcrResult {
        text,
        raw_text: Some(raw.to_string()),
        boxes,
        image_dims,
        metadata: None,
    }
}

pub fn parse_detections(text: &str) -> Vec<Detection> {
    let mut boxes = Vec::new();
    let mut cursor = 0;
    while let Some(block) = find_detection_block(text, cursor) {
        if let Some(bbox) = parse_coords(&text[block.det_start..block.det_end]) {
            let label = text[block.label_start..block.label_end].trim();
            boxes.push(Detection {
                label: (!label.is_empty()).then(|| label.to_string()),
                bbox,
            });
        }
        cursor = block.end;
    }
    boxes
}

pub fn clean_grounding_text(text: &str) -> String {
    let mut cleaned = String::new();
    let mut cursor = 0;
    while let Some(block) = find_detection_block(text, cursor) {
        cleaned.push_str(&text[cursor..block.start]);
        cleaned.push_str(&text[block.label_start..block.label_end]);
        cursor = block.end;
    }
    cleaned.push_str(&text[cursor..]);
    let cleaned = cleaned.replace(GROUNDING_MARK, "");
    cleaned.trim().to_string()
}

struct DetBlock {
    start: usize,
    end: usize,
    label_start: usize,
    label_end: usize,
    det_start: usize,
    det_end: usize,
}

fn find_detection_block(text: &str, from: usize) -> Option<DetBlock> {
    let bytes = text.as_bytes();
    let mut search = from;
    while let Some(open_rel) = text[search..].find(REF_OPEN) {
        let start = search + open_rel;
        let label_start = start + REF_OPEN.len();
        let mut close_search = label_start;
        while let Some(close_rel) = text[close_search..].find(REF_CLOSE) {
            let label_end = close_search + close_rel;
            let mut det_open = label_end + REF_CLOSE.len();
            while det_open < bytes.len() && bytes[det_open].is_ascii_whitespace() {
                det_open += 1;
            }
            if text[det_open..].starts_with(DET_OPEN) {
                let det_start = det_open + DET_OPEN.len();
                if let Some(det_rel) = text[det_start..].find(DET_CLOSE) {
                    let det_end = det_start + det_rel;
                    if coord_list(&text[det_start..det_end]).is_some() {
                        return Some(DetBlock {
                            start,
                            end: det_end + DET_CLOSE.len(),
                            label_start,
                            label_end,
                            det_start,
                            det_end,
                        });
                    }
                }
            }
            close_search = label_end + REF_CLOSE.len();
        }
        search = label_start;
    }
    None
}

fn coord_list(det_inner: &str) -> Option<&str> {
    let trimmed = det_inner.trim();
    let rest = trimmed.strip_prefix('[')?.trim_start();
    let rest = rest.strip_prefix('[')?;
    let end = rest.find(']')?;
    if end == 0 {
        return None;
    }
    if rest[end + 1..].trim() != "]" {
        return None;
    }
    Some(rest[..end].trim())
}

fn parse_coords(det_inner: &str) -> Option<[f32; 4]> {
    let list = coord_list(det_inner)?;
    let mut nums = Vec::with_capacity(4);
    for part in list.split(',').take(4) {
        nums.push(part.trim().parse::<f32>().ok()?);
    }
    if nums.len() != 4 {
        return None;
    }
    Some([nums[0], nums[1], nums[2], nums[3]])
}
