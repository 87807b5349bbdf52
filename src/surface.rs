use tiny_skia::{Color, Pixmap};

use crate::payload::ImageDims;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceGeometry {
    pub display_width: u32,
    pub display_height: u32,
    pub natural_width: u32,
    pub natural_height: u32,
}

impl SurfaceGeometry {
    pub fn uniform(width: u32, height: u32) -> Self {
        Self {
            display_width: width,
            display_height: height,
            natural_width: width,
            natural_height: height,
        }
    }

    pub fn is_displayable(&self) -> bool {
        self.display_width > 0 && self.display_height > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale {
    pub x: f32,
    pub y: f32,
}

impl Scale {
    pub fn derive(geometry: &SurfaceGeometry, image_dims: Option<ImageDims>) -> Option<Scale> {
        let reference_w = image_dims
            .and_then(|dims| dims.w)
            .filter(|w| *w > 0.0)
            .unwrap_or(geometry.natural_width as f32);
        let reference_h = image_dims
            .and_then(|dims| dims.h)
            .filter(|h| *h > 0.0)
            .unwrap_or(geometry.natural_height as f32);
        if reference_w <= 0.0 || reference_h <= 0.0 {
            return None;
        }
        Some(Scale {
            x: geometry.display_width as f32 / reference_w,
            y: geometry.display_height as f32 / reference_h,
        })
    }

    pub fn apply(&self, bbox: [f32; 4]) -> [f32; 4] {
        let [x1, y1, x2, y2] = bbox;
        [x1 * self.x, y1 * self.y, x2 * self.x, y2 * self.y]
    }
}

#[derive(Debug, Default)]
pub struct Surface {
    geometry: Option<SurfaceGeometry>,
    pixmap: Option<Pixmap>,
}

impl Surface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn measure(&mut self, geometry: SurfaceGeometry) {
        self.geometry = Some(geometry);
    }

    pub fn invalidate(&mut self) {
        self.geometry = None;
        self.pixmap = None;
    }

    pub fn geometry(&self) -> Option<&SurfaceGeometry> {
        self.geometry.as_ref()
    }

    pub fn is_measured(&self) -> bool {
        self.geometry.is_some()
    }

    pub fn pixmap(&self) -> Option<&Pixmap> {
        self.pixmap.as_ref()
    }

    pub(crate) fn prepare_pixmap(&mut self, width: u32, height: u32) -> Option<&mut Pixmap> {
        let needs_alloc = self
            .pixmap
            .as_ref()
            .map(|pixmap| pixmap.width() != width || pixmap.height() != height)
            .unwrap_or(true);
        if needs_alloc {
            self.pixmap = Pixmap::new(width, height);
        } else if let Some(pixmap) = self.pixmap.as_mut() {
            pixmap.fill(Color::TRANSPARENT);
        }
        self.pixmap.as_mut()
    }
}
