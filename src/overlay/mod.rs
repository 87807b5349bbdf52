use anyhow::{Context, Result, anyhow};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use resvg::render;
use std::io::Cursor;
use std::sync::Arc;
use tiny_skia::Pixmap;
use usvg::{Options, Tree, fontdb};

mod font;

pub use font::{FontMetrics, load_font_metrics};

use crate::observe::{NullObserver, RenderObserver, SkipReason};
use crate::payload::{Detection, OcrResult};
use crate::surface::{Scale, Surface, SurfaceGeometry};

pub const PALETTE: [&str; 5] = ["#00ff00", "#00ffff", "#ff00ff", "#ffff00", "#ff0066"];
pub const LABEL_TEXT_COLOR: &str = "#000";

const FILL_ALPHA: &str = "33";
const LABEL_BASELINE_RISE: f32 = 7.0;

#[derive(Clone)]
pub struct OverlayStyle {
    pub stroke_width: f32,
    pub label_font_size: f32,
    pub label_chip_height: f32,
    pub label_padding: f32,
    pub font_family: Option<String>,
    pub font_metrics: Option<FontMetrics>,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            stroke_width: 4.0,
            label_font_size: 14.0,
            label_chip_height: 24.0,
            label_padding: 8.0,
            font_family: None,
            font_metrics: None,
        }
    }
}

pub fn palette_color(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeStatus {
    Composed { drawn: usize, skipped: usize },
    Empty,
    Unmeasured,
    Degraded,
}

struct OverlayBody {
    markup: String,
    drawn: usize,
    skipped: usize,
}

fn overlay_body(
    scale: Scale,
    boxes: &[Detection],
    style: &OverlayStyle,
    observer: &dyn RenderObserver,
) -> OverlayBody {
    let mut markup = String::new();
    let mut drawn = 0;
    let mut skipped = 0;
    for (index, detection) in boxes.iter().enumerate() {
        if push_box(&mut markup, index, detection, scale, style) {
            drawn += 1;
        } else {
            observer.box_skipped(index, &detection.bbox);
            skipped += 1;
        }
    }
    OverlayBody {
        markup,
        drawn,
        skipped,
    }
}

fn push_box(
    svg: &mut String,
    index: usize,
    detection: &Detection,
    scale: Scale,
    style: &OverlayStyle,
) -> bool {
    let [sx1, sy1, sx2, sy2] = scale.apply(detection.bbox);
    let width = sx2 - sx1;
    let height = sy2 - sy1;
    if !(width > 0.0 && height > 0.0) {
        return false;
    }
    let color = palette_color(index);
    svg.push_str(&format!(
        r##"<rect x="{x}" y="{y}" width="{w}" height="{h}" fill="{color}{alpha}" stroke="{color}" stroke-width="{stroke}"/>"##,
        x = sx1,
        y = sy1,
        w = width,
        h = height,
        color = color,
        alpha = FILL_ALPHA,
        stroke = style.stroke_width
    ));
    if let Some(label) = detection.label.as_deref().filter(|label| !label.is_empty()) {
        push_label_chip(svg, label, sx1, sy1, color, style);
    }
    true
}

fn push_label_chip(
    svg: &mut String,
    label: &str,
    box_x: f32,
    box_y: f32,
    color: &str,
    style: &OverlayStyle,
) {
    let text_width =
        font::measure_text_width_px(label, style.label_font_size, style.font_metrics.as_ref());
    let chip_width = text_width + style.label_padding * 2.0;
    svg.push_str(&format!(
        r#"<rect x="{x}" y="{y}" width="{w}" height="{h}" fill="{color}"/>"#,
        x = box_x,
        y = box_y - style.label_chip_height,
        w = chip_width,
        h = style.label_chip_height,
        color = color
    ));
    let font_family = style
        .font_family
        .as_deref()
        .or_else(|| style.font_metrics.as_ref().and_then(|m| m.family()));
    if let Some(family) = font_family {
        svg.push_str(&format!(
            r#"<text x="{x}" y="{y}" font-size="{size}" font-weight="bold" fill="{color}" font-family="{family}">{text}</text>"#,
            x = box_x + style.label_padding,
            y = box_y - LABEL_BASELINE_RISE,
            size = style.label_font_size,
            color = LABEL_TEXT_COLOR,
            family = escape_xml(family),
            text = escape_xml(label)
        ));
    } else {
        svg.push_str(&format!(
            r#"<text x="{x}" y="{y}" font-size="{size}" font-weight="bold" fill="{color}">{text}</text>"#,
            x = box_x + style.label_padding,
            y = box_y - LABEL_BASELINE_RISE,
            size = style.label_font_size,
            color = LABEL_TEXT_COLOR,
            text = escape_xml(label)
        ));
    }
}

fn wrap_svg(width: u32, height: u32, body: &str) -> String {
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">{body}</svg>"#,
        w = width,
        h = height,
        body = body
    )
}

pub fn overlay_svg(
    geometry: &SurfaceGeometry,
    result: &OcrResult,
    style: &OverlayStyle,
) -> Option<String> {
    if !geometry.is_displayable() || !result.has_boxes() {
        return None;
    }
    let scale = Scale::derive(geometry, result.image_dims)?;
    let body = overlay_body(scale, &result.boxes, style, &NullObserver);
    Some(wrap_svg(
        geometry.display_width,
        geometry.display_height,
        &body.markup,
    ))
}

pub fn annotated_svg(
    image_bytes: &[u8],
    image_mime: &str,
    geometry: &SurfaceGeometry,
    result: &OcrResult,
    style: &OverlayStyle,
) -> String {
    let encoded = BASE64.encode(image_bytes);
    let data_uri = format!("data:{};base64,{}", image_mime, encoded);

    let mut svg = String::new();
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = geometry.display_width,
        h = geometry.display_height
    ));
    svg.push_str(&format!(
        r#"<image href="{uri}" xlink:href="{uri}" x="0" y="0" width="{w}" height="{h}" preserveAspectRatio="none"/>"#,
        uri = data_uri,
        w = geometry.display_width,
        h = geometry.display_height
    ));
    if let Some(scale) = Scale::derive(geometry, result.image_dims) {
        let body = overlay_body(scale, &result.boxes, style, &NullObserver);
        svg.push_str(&body.markup);
    }
    svg.push_str("</svg>");
    svg
}

pub struct Compositor {
    style: OverlayStyle,
    fontdb: Arc<fontdb::Database>,
}

impl Compositor {
    pub fn new(style: OverlayStyle) -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        if let Some(metrics) = style.font_metrics.as_ref() {
            db.load_font_data(metrics.data().to_vec());
        }
        Self {
            style,
            fontdb: Arc::new(db),
        }
    }

    pub fn style(&self) -> &OverlayStyle {
        &self.style
    }

    pub fn compose(
        &self,
        surface: &mut Surface,
        result: &OcrResult,
        observer: &dyn RenderObserver,
    ) -> ComposeStatus {
        let Some(geometry) = surface.geometry().copied() else {
            observer.compose_skipped(SkipReason::MissingSurface);
            return ComposeStatus::Unmeasured;
        };
        if !geometry.is_displayable() {
            observer.compose_skipped(SkipReason::MissingSurface);
            return ComposeStatus::Unmeasured;
        }
        if !result.has_boxes() {
            observer.compose_skipped(SkipReason::NoBoxes);
            return ComposeStatus::Empty;
        }
        let Some(scale) = Scale::derive(&geometry, result.image_dims) else {
            observer.compose_skipped(SkipReason::MissingSurface);
            return ComposeStatus::Unmeasured;
        };
        let Some(pixmap) =
            surface.prepare_pixmap(geometry.display_width, geometry.display_height)
        else {
            observer.compose_skipped(SkipReason::MissingSurface);
            return ComposeStatus::Unmeasured;
        };

        observer.compose_begin(&geometry, scale, result.boxes.len());
        let body = overlay_body(scale, &result.boxes, &self.style, observer);
        if body.drawn > 0 {
            let svg = wrap_svg(geometry.display_width, geometry.display_height, &body.markup);
            let options = Options {
                fontdb: self.fontdb.clone(),
                ..Options::default()
            };
            match Tree::from_str(&svg, &options) {
                Ok(tree) => {
                    let mut pixmap_mut = pixmap.as_mut();
                    render(&tree, tiny_skia::Transform::identity(), &mut pixmap_mut);
                }
                Err(_) => {
                    observer.compose_skipped(SkipReason::RasterizeFailed);
                    return ComposeStatus::Degraded;
                }
            }
        }
        observer.compose_end(body.drawn, body.skipped);
        ComposeStatus::Composed {
            drawn: body.drawn,
            skipped: body.skipped,
        }
    }

    pub fn annotated_png(
        &self,
        image_bytes: &[u8],
        image_mime: &str,
        geometry: &SurfaceGeometry,
        result: &OcrResult,
    ) -> Result<Vec<u8>> {
        let svg = annotated_svg(image_bytes, image_mime, geometry, result, &self.style);
        let options = Options {
            fontdb: self.fontdb.clone(),
            ..Options::default()
        };
        let tree = Tree::from_str(&svg, &options).with_context(|| "failed to parse overlay SVG")?;
        let size = tree.size().to_int_size();
        let mut pixmap = Pixmap::new(size.width(), size.height())
            .ok_or_else(|| anyhow!("empty overlay size"))?;
        let mut pixmap_mut = pixmap.as_mut();
        render(&tree, tiny_skia::Transform::identity(), &mut pixmap_mut);
        let image =
            image::RgbaImage::from_raw(size.width(), size.height(), pixmap.data().to_vec())
                .ok_or_else(|| anyhow!("failed to build image buffer from overlay"))?;
        let mut bytes = Vec::new();
        let mut cursor = Cursor::new(&mut bytes);
        image::DynamicImage::ImageRgba8(image)
            .write_to(&mut cursor, image::ImageFormat::Png)
            .with_context(|| "failed to encode annotated image")?;
        Ok(bytes)
    }
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
