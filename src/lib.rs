use anyhow::{Context, Result, anyhow};
use image::GenericImageView;
use std::fs;
use std::path::Path;

pub mod classify;
pub mod content;
pub mod grounding;
pub mod lifecycle;
pub mod logging;
pub mod observe;
pub mod overlay;
pub mod payload;
pub mod settings;
pub mod store;
pub mod surface;

pub use classify::{ContentKind, classify};
pub use content::{RenderedContent, render_content};
pub use lifecycle::{EventOutcome, LifecycleController, Phase};
pub use observe::{NullObserver, RenderObserver, TraceObserver};
pub use overlay::{ComposeStatus, Compositor, OverlayStyle, annotated_svg, overlay_svg};
pub use payload::{Detection, ImageDims, OcrResult, parse_result, summarize_boxes};
pub use store::{Generation, ResultStore};
pub use surface::{Scale, Surface, SurfaceGeometry};

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub payload_path: Option<String>,
    pub transcript_path: Option<String>,
    pub image_path: String,
    pub annotated_out: Option<String>,
    pub text_out: Option<String>,
    pub payload_out: Option<String>,
    pub display_width: Option<u32>,
    pub settings_path: Option<String>,
    pub show_boxes: bool,
}

pub fn run(config: Config) -> Result<String> {
    let settings_path = config.settings_path.as_deref().map(Path::new);
    let settings = settings::load_settings(settings_path)?;
    let style = settings.overlay_style()?;

    let image_bytes = fs::read(&config.image_path)
        .with_context(|| format!("failed to read image: {}", config.image_path))?;
    let image_mime = sniff_image_mime(&image_bytes)
        .ok_or_else(|| anyhow!("unsupported image type: {}", config.image_path))?;
    let decoded = image::load_from_memory(&image_bytes)
        .with_context(|| format!("failed to decode image: {}", config.image_path))?;
    let (natural_width, natural_height) = decoded.dimensions();

    let result = load_result(&config, natural_width, natural_height)?;
    let geometry = display_geometry(
        config.display_width.unwrap_or(natural_width),
        natural_width,
        natural_height,
    )?;

    let mut controller = LifecycleController::new(Compositor::new(style));
    let token = controller.assign(result, true);
    let outcome = controller.image_loaded(token, geometry);
    let result = controller
        .result()
        .cloned()
        .ok_or_else(|| anyhow!("result store is empty"))?;

    let rendered = render_content(&result.text);

    let mut lines = Vec::new();
    lines.push(format!(
        "image: {}x{} ({})",
        natural_width, natural_height, image_mime
    ));
    lines.push(format!(
        "display: {}x{}",
        geometry.display_width, geometry.display_height
    ));
    lines.push(format!("content: {}", rendered.kind.as_str()));
    match outcome {
        EventOutcome::Composed(ComposeStatus::Composed { drawn, skipped }) => {
            lines.push(format!("boxes: {} drawn, {} skipped", drawn, skipped));
        }
        EventOutcome::Composed(ComposeStatus::Unmeasured) => {
            lines.push("boxes: not rendered (no display geometry)".to_string());
        }
        EventOutcome::Composed(ComposeStatus::Degraded) => {
            lines.push("boxes: not rendered (rasterizer rejected overlay)".to_string());
        }
        EventOutcome::Composed(ComposeStatus::Empty)
        | EventOutcome::Ignored
        | EventOutcome::Stale => {
            lines.push("boxes: none".to_string());
        }
    }
    if config.show_boxes {
        lines.extend(summarize_boxes(&result.boxes));
    }

    if let Some(path) = config.text_out.as_deref() {
        fs::write(path, rendered.html.as_bytes())
            .with_context(|| format!("failed to write text view: {}", path))?;
        lines.push(format!("wrote {}", path));
    }
    if let Some(path) = config.annotated_out.as_deref() {
        let png = controller
            .compositor()
            .annotated_png(&image_bytes, image_mime, &geometry, &result)?;
        fs::write(path, &png)
            .with_context(|| format!("failed to write annotated image: {}", path))?;
        lines.push(format!("wrote {}", path));
    }
    if let Some(path) = config.payload_out.as_deref() {
        let json = serde_json::to_string_pretty(result.as_ref())
            .with_context(|| "failed to serialize result payload")?;
        fs::write(path, json).with_context(|| format!("failed to write payload: {}", path))?;
        lines.push(format!("wrote {}", path));
    }

    Ok(lines.join("\n"))
}

fn load_result(config: &Config, natural_width: u32, natural_height: u32) -> Result<OcrResult> {
    match (
        config.payload_path.as_deref(),
        config.transcript_path.as_deref(),
    ) {
        (Some(path), None) => {
            let bytes =
                fs::read(path).with_context(|| format!("failed to read payload: {}", path))?;
            parse_result(&bytes)
        }
        (None, Some(path)) => {
            let transcript = fs::read_to_string(path)
                .with_context(|| format!("failed to read transcript: {}", path))?;
            Ok(grounding::parse_transcript(
                &transcript,
                Some(ImageDims::new(natural_width as f32, natural_height as f32)),
            ))
        }
        (Some(_), Some(_)) => Err(anyhow!("choose either a payload or a transcript, not both")),
        (None, None) => Err(anyhow!("no payload or transcript given")),
    }
}

fn display_geometry(
    display_width: u32,
    natural_width: u32,
    natural_height: u32,
) -> Result<SurfaceGeometry> {
    if natural_width == 0 || natural_height == 0 {
        return Err(anyhow!("image has empty dimensions"));
    }
    if display_width == 0 {
        return Err(anyhow!("display width must be positive"));
    }
    let display_height = if display_width == natural_width {
        natural_height
    } else {
        let ratio = display_width as f32 / natural_width as f32;
        ((natural_height as f32 * ratio).round() as u32).max(1)
    };
    Ok(SurfaceGeometry {
        display_width,
        display_height,
        natural_width,
        natural_height,
    })
}

fn sniff_image_mime(bytes: &[u8]) -> Option<&'static str> {
    let kind = infer::get(bytes)?;
    let mime = kind.mime_type();
    if mime.starts_with("image/") {
        return Some(mime);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_geometry_keeps_aspect_ratio() {
        let geometry = display_geometry(500, 1000, 2000).expect("geometry");
        assert_eq!(geometry.display_width, 500);
        assert_eq!(geometry.display_height, 1000);
        assert_eq!(geometry.natural_width, 1000);
        assert_eq!(geometry.natural_height, 2000);
    }

    #[test]
    fn display_geometry_defaults_to_natural_size() {
        let geometry = display_geometry(640, 640, 480).expect("geometry");
        assert_eq!(geometry.display_height, 480);
    }

    #[test]
    fn display_geometry_rejects_empty_images() {
        assert!(display_geometry(100, 0, 100).is_err());
        assert!(display_geometry(0, 100, 100).is_err());
    }

    #[test]
    fn sniff_accepts_only_images() {
        let png_magic = [
            0x89u8, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0, 0, 0, 0,
        ];
        assert_eq!(sniff_image_mime(&png_magic), Some("image/png"));
        assert_eq!(sniff_image_mime(b"%PDF-1.4 ..."), None);
        assert_eq!(sniff_image_mime(b"plain text"), None);
    }
}
