use tracing::{debug, trace};

use crate::store::Generation;
use crate::surface::{Scale, SurfaceGeometry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingSurface,
    NoBoxes,
    RasterizeFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    ImageLoad,
    Resize,
}

pub trait RenderObserver {
    fn compose_begin(&self, _geometry: &SurfaceGeometry, _scale: Scale, _box_count: usize) {}

    fn compose_skipped(&self, _reason: SkipReason) {}

    fn box_skipped(&self, _index: usize, _bbox: &[f32; 4]) {}

    fn compose_end(&self, _drawn: usize, _skipped: usize) {}

    fn stale_event(&self, _event: EventKind, _seen: Generation, _current: Generation) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl RenderObserver for NullObserver {}

#[derive(Debug, Default, Clone, Copy)]
pub struct TraceObserver;

impl RenderObserver for TraceObserver {
    fn compose_begin(&self, geometry: &SurfaceGeometry, scale: Scale, box_count: usize) {
        debug!(
            "overlay: composing {} boxes at {}x{} (scale {:.3}x{:.3})",
            box_count, geometry.display_width, geometry.display_height, scale.x, scale.y
        );
    }

    fn compose_skipped(&self, reason: SkipReason) {
        debug!("overlay: compose skipped ({:?})", reason);
    }

    fn box_skipped(&self, index: usize, bbox: &[f32; 4]) {
        trace!("overlay: skipped degenerate box {} {:?}", index, bbox);
    }

    fn compose_end(&self, drawn: usize, skipped: usize) {
        debug!("overlay: composed {} boxes ({} skipped)", drawn, skipped);
    }

    fn stale_event(&self, event: EventKind, seen: Generation, current: Generation) {
        debug!(
            "lifecycle: discarded stale {:?} event (generation {} != {})",
            event, seen, current
        );
    }
}
