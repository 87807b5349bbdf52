use std::sync::Arc;

use crate::observe::{EventKind, RenderObserver, TraceObserver};
use crate::overlay::{ComposeStatus, Compositor};
use crate::payload::OcrResult;
use crate::store::{Generation, ResultStore};
use crate::surface::{Surface, SurfaceGeometry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    AwaitingImageLoad,
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    Stale,
    Ignored,
    Composed(ComposeStatus),
}

pub struct LifecycleController<O: RenderObserver = TraceObserver> {
    store: ResultStore,
    compositor: Compositor,
    surface: Surface,
    phase: Phase,
    observer: O,
}

impl LifecycleController<TraceObserver> {
    pub fn new(compositor: Compositor) -> Self {
        Self::with_observer(compositor, TraceObserver)
    }
}

impl<O: RenderObserver> LifecycleController<O> {
    pub fn with_observer(compositor: Compositor, observer: O) -> Self {
        Self {
            store: ResultStore::new(),
            compositor,
            surface: Surface::new(),
            phase: Phase::Idle,
            observer,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn generation(&self) -> Generation {
        self.store.generation()
    }

    pub fn result(&self) -> Option<&Arc<OcrResult>> {
        self.store.current()
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    pub fn assign(&mut self, result: OcrResult, preview_available: bool) -> Generation {
        let has_boxes = result.has_boxes();
        let token = self.store.assign(result);
        self.surface.invalidate();
        self.phase = if has_boxes && preview_available {
            Phase::AwaitingImageLoad
        } else {
            Phase::Idle
        };
        token
    }

    pub fn reset(&mut self) -> Generation {
        let token = self.store.clear();
        self.surface.invalidate();
        self.phase = Phase::Idle;
        token
    }

    pub fn image_loaded(&mut self, token: Generation, geometry: SurfaceGeometry) -> EventOutcome {
        if !self.store.is_current(token) {
            self.observer
                .stale_event(EventKind::ImageLoad, token, self.store.generation());
            return EventOutcome::Stale;
        }
        if self.phase != Phase::AwaitingImageLoad {
            return EventOutcome::Ignored;
        }
        self.surface.measure(geometry);
        self.phase = Phase::Ready;
        EventOutcome::Composed(self.compose())
    }

    pub fn resized(&mut self, token: Generation, geometry: SurfaceGeometry) -> EventOutcome {
        if !self.store.is_current(token) {
            self.observer
                .stale_event(EventKind::Resize, token, self.store.generation());
            return EventOutcome::Stale;
        }
        if self.phase != Phase::Ready {
            return EventOutcome::Ignored;
        }
        self.surface.measure(geometry);
        EventOutcome::Composed(self.compose())
    }

    pub fn teardown(self) {}

    fn compose(&mut self) -> ComposeStatus {
        let Some(result) = self.store.snapshot() else {
            return ComposeStatus::Empty;
        };
        self.compositor
            .compose(&mut self.surface, &result, &self.observer)
    }
}
