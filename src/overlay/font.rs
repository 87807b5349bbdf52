use anyhow::{Context, Result, anyhow};
use std::path::Path;
use std::sync::Arc;
use ttf_parser::Face;
use ttf_parser::name_id;

#[derive(Clone)]
pub struct FontMetrics {
    data: Arc<Vec<u8>>,
    units_per_em: u16,
    space_advance: u16,
    family: Option<String>,
    face_index: u32,
}

impl FontMetrics {
    pub fn family(&self) -> Option<&str> {
        self.family.as_deref()
    }

    pub fn data(&self) -> &[u8] {
        self.data.as_ref()
    }
}

pub fn load_font_metrics(path: &Path) -> Result<FontMetrics> {
    let data =
        std::fs::read(path).with_context(|| format!("failed to read font: {}", path.display()))?;
    load_font_metrics_from_data(&data)
        .map_err(|err| anyhow!("failed to parse font: {} ({})", path.display(), err))
}

fn load_font_metrics_from_data(data: &[u8]) -> Result<FontMetrics> {
    let count = ttf_parser::fonts_in_collection(data).unwrap_or(1);
    for index in 0..count {
        if let Ok(face) = Face::parse(data, index) {
            let units_per_em = face.units_per_em().max(1);
            let space_advance = face
                .glyph_index(' ')
                .and_then(|id| face.glyph_hor_advance(id))
                .unwrap_or(units_per_em / 2);
            return Ok(FontMetrics {
                data: Arc::new(data.to_vec()),
                units_per_em,
                space_advance,
                family: extract_family_name(&face),
                face_index: index,
            });
        }
    }
    Err(anyhow!("failed to parse font data"))
}

pub(crate) fn measure_text_width_px(text: &str, font_size: f32, font: Option<&FontMetrics>) -> f32 {
    let Some(font) = font else {
        return estimate_text_width_units(text) * font_size;
    };
    let Ok(face) = Face::parse(&font.data, font.face_index) else {
        return estimate_text_width_units(text) * font_size;
    };
    let mut advance = 0u32;
    for ch in text.chars() {
        let units = match ch {
            '\n' => 0,
            ' ' => font.space_advance,
            _ => face
                .glyph_index(ch)
                .and_then(|glyph| face.glyph_hor_advance(glyph))
                .unwrap_or(font.space_advance),
        };
        advance = advance.saturating_add(units as u32);
    }
    advance as f32 * (font_size / font.units_per_em.max(1) as f32)
}

fn estimate_char_units_for_width(ch: char) -> f32 {
    match ch {
        ch if ch.is_whitespace() => 0.25,
        ch if ch.is_ascii_alphanumeric() => 0.55,
        ch if ch.is_ascii() => 0.35,
        '\u{4E00}'..='\u{9FFF}' | '\u{3040}'..='\u{30FF}' | '\u{31F0}'..='\u{31FF}' => 1.0,
        _ => 0.9,
    }
}

fn estimate_text_width_units(text: &str) -> f32 {
    text.chars().map(estimate_char_units_for_width).sum()
}

fn extract_family_name(face: &Face<'_>) -> Option<String> {
    face.names()
        .into_iter()
        .filter(|name| name.name_id == name_id::TYPOGRAPHIC_FAMILY)
        .find_map(|name| name.to_string())
        .or_else(|| {
            face.names()
                .into_iter()
                .filter(|name| name.name_id == name_id::FAMILY)
                .find_map(|name| name.to_string())
        })
}
