//! Explicit crop session.
//!
//! [`CropSession`] ties the crop view to its collaborators. Gestures and
//! toolbar actions are applied synchronously on the caller's thread; loads
//! and crops run on background workers and are applied when the caller
//! drains replies with [`CropSession::poll`] or [`CropSession::wait`].

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::CropOptions;
use crate::crop_window::{AspectRatio, OverlayShape};
use crate::decode::{LoadError, SourceImage};
use crate::error::CropError;
use crate::geometry::AffineTransform;
use crate::gesture::{GestureInterpreter, TouchEvent};
use crate::io::{FsImageLoader, FsImageSink, ImageLoader, ImageRef, ImageSink};
use crate::render::{render_crop, CropRequest, CropResult, RenderError};
use crate::transform::{CropState, CropView, OperationKind, TransformAnimation};
use crate::worker::{TaskReply, TaskSlot};

/// Session callbacks, invoked on the thread that drives the session.
pub trait CropListener {
    fn on_transform_changed(&mut self, _transform: AffineTransform) {}

    fn on_load_complete(&mut self, _result: &Result<Arc<SourceImage>, CropError>) {}

    fn on_crop_complete(&mut self, _result: &CropResult) {}
}

type LoadOutcome = Result<SourceImage, LoadError>;
type CropOutcome = Result<SourceImage, CropError>;

pub struct CropSession {
    view: CropView,
    gestures: GestureInterpreter,
    loader: Arc<dyn ImageLoader>,
    sink: Arc<dyn ImageSink>,
    listener: Box<dyn CropListener>,
    loads: TaskSlot<LoadOutcome>,
    crops: TaskSlot<CropOutcome>,
    // what the current request was issued for, taken when its reply lands
    pending_load: Option<ImageRef>,
    pending_crop: Option<CropRequest>,
}

impl CropSession {
    pub fn create(
        options: CropOptions,
        loader: Arc<dyn ImageLoader>,
        sink: Arc<dyn ImageSink>,
        listener: Box<dyn CropListener>,
    ) -> Result<Self, CropError> {
        let gestures = GestureInterpreter::new(options.allow_gesture_rotation);
        let view = CropView::new(options)?;
        Ok(Self {
            view,
            gestures,
            loader,
            sink,
            listener,
            loads: TaskSlot::new("load", |message| Err(LoadError::Decode(message))),
            crops: TaskSlot::new("crop", |message| {
                Err(CropError::crop(None, RenderError::Worker(message)))
            }),
            pending_load: None,
            pending_crop: None,
        })
    }

    /// Session reading sources from and writing results to the filesystem.
    pub fn with_filesystem(
        options: CropOptions,
        listener: Box<dyn CropListener>,
    ) -> Result<Self, CropError> {
        let loader = FsImageLoader::new(options.load_options());
        Self::create(options, Arc::new(loader), Arc::new(FsImageSink), listener)
    }

    pub fn view(&self) -> &CropView {
        &self.view
    }

    pub fn state(&self) -> CropState {
        self.view.state()
    }

    pub fn transform(&self) -> AffineTransform {
        self.view.transform()
    }

    pub fn set_view_size(&mut self, width: f64, height: f64) {
        let changed = self.view.set_view_size(width, height);
        self.notify(changed);
    }

    pub fn set_aspect_ratio(&mut self, aspect: AspectRatio) -> Result<(), CropError> {
        let changed = self.view.set_aspect_ratio(aspect)?;
        self.notify(changed);
        Ok(())
    }

    pub fn set_crop_size(&mut self, crop_size: f64) -> Result<(), CropError> {
        let changed = self.view.set_crop_size(crop_size)?;
        self.notify(changed);
        Ok(())
    }

    pub fn set_overlay_shape(&mut self, shape: OverlayShape) {
        self.view.set_overlay_shape(shape);
    }

    /// Start loading `reference` in the background. Supersedes any load in
    /// flight and any crop not yet applied; the crop's reply is never
    /// delivered. Returns the request id.
    pub fn load(&mut self, reference: ImageRef) -> u32 {
        self.crops.supersede();
        self.pending_crop = None;
        self.view.begin(OperationKind::Load);
        self.pending_load = Some(reference.clone());

        let loader = Arc::clone(&self.loader);
        let id = self
            .loads
            .start(move |token| loader.load(&reference, token));
        info!(id, "load requested");
        id
    }

    /// Install an already decoded image. Pending loads and crops are
    /// superseded and their replies are never delivered.
    pub fn load_image(&mut self, image: SourceImage, reference: Option<ImageRef>) {
        self.loads.supersede();
        self.pending_load = None;
        self.crops.supersede();
        self.pending_crop = None;
        let image = Arc::new(image);
        self.view.load_image(Arc::clone(&image), reference);
        self.notify(true);
        self.listener.on_load_complete(&Ok(image));
    }

    /// Feed one touch event through the gesture interpreters. Returns
    /// whether the transform changed.
    pub fn gesture(&mut self, event: &TouchEvent) -> bool {
        let deltas = self.gestures.on_touch(event);
        let mut changed = false;
        for delta in deltas {
            changed |= self.view.apply_gesture(delta);
        }
        self.notify(changed);
        changed
    }

    pub fn rotate_by(&mut self, quarter_turns: i32) -> Option<TransformAnimation> {
        let animation = self.view.rotate_by(quarter_turns);
        self.notify(animation.is_some());
        animation
    }

    pub fn reset(&mut self) -> bool {
        let changed = self.view.reset();
        self.notify(changed);
        changed
    }

    /// Snapshot the view and render it in the background. Returns the
    /// request id.
    pub fn confirm(&mut self) -> Result<u32, CropError> {
        let request = self.view.snapshot()?;
        self.view.begin(OperationKind::Crop);
        self.pending_crop = Some(request.clone());

        let sink = Arc::clone(&self.sink);
        let id = self.crops.start(move |token| {
            render_crop(&request, sink.as_ref(), token)
                .map_err(|cause| CropError::crop(request.destination.clone(), cause))
        });
        info!(id, "crop requested");
        Ok(id)
    }

    /// Cancel the load and the crop in flight. Their replies still arrive,
    /// as [`CropError::Cancelled`] unless the work had already finished.
    pub fn cancel(&self) {
        self.loads.cancel();
        self.crops.cancel();
    }

    /// Apply every reply that has arrived. Returns how many were applied.
    pub fn poll(&mut self) -> usize {
        let mut applied = 0;
        while let Some(reply) = self.loads.try_next() {
            self.finish_load(reply);
            applied += 1;
        }
        while let Some(reply) = self.crops.try_next() {
            self.finish_crop(reply);
            applied += 1;
        }
        applied
    }

    /// Block until nothing is in flight, applying replies as they arrive.
    pub fn wait(&mut self) {
        while self.loads.is_in_flight() {
            let Some(reply) = self.loads.wait_next() else {
                break;
            };
            self.finish_load(reply);
        }
        while self.crops.is_in_flight() {
            let Some(reply) = self.crops.wait_next() else {
                break;
            };
            self.finish_crop(reply);
        }
    }

    /// End the session. Work in flight is cancelled and its replies are
    /// dropped.
    pub fn destroy(self) {
        self.cancel();
        debug!(state = ?self.view.state(), "session destroyed");
    }

    fn finish_load(&mut self, reply: TaskReply<LoadOutcome>) {
        let Some(reference) = self.pending_load.take() else {
            warn!(id = reply.id, "load reply without a pending request");
            return;
        };
        let result = reply
            .result
            .map(Arc::new)
            .map_err(|cause| CropError::load(reference.clone(), cause));

        match &result {
            Ok(_) => {}
            Err(e) if e.is_cancelled() => debug!(id = reply.id, "load cancelled"),
            Err(e) => warn!(id = reply.id, error = %e, "load failed"),
        }

        let installed = self.view.finish_load(&result, Some(reference));
        self.notify(installed);
        self.listener.on_load_complete(&result);
    }

    fn finish_crop(&mut self, reply: TaskReply<CropOutcome>) {
        let Some(request) = self.pending_crop.take() else {
            warn!(id = reply.id, "crop reply without a pending request");
            return;
        };
        match &reply.result {
            Ok(image) => info!(
                id = reply.id,
                width = image.width,
                height = image.height,
                "crop finished"
            ),
            Err(e) if e.is_cancelled() => debug!(id = reply.id, "crop cancelled"),
            Err(e) => warn!(id = reply.id, error = %e, "crop failed"),
        }

        self.view.finish_crop(&reply.result);
        let result = CropResult {
            source: request.source,
            source_ref: request.source_ref,
            cropped: reply.result,
            destination: request.destination,
        };
        self.listener.on_crop_complete(&result);
    }

    fn notify(&mut self, changed: bool) {
        if changed {
            self.listener.on_transform_changed(self.view.transform());
        }
    }
}
