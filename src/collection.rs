use crate::asset::{AssetId, AssetListEntry, AssetRecord, Size};
use crate::common::file_dialog::AssetPicker;
use crate::media::{fit_within, has_extension, MediaError, MediaLoader};
use crate::overlay::{OverlayWindow, ViewportCtx};
use crate::store::{AssetStore, StoreError};
use crate::transcode::{TranscodeError, Transcoder};
use image::RgbaImage;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Fixed size of the preview pane in the main window.
pub const PREVIEW_SIZE: Size = Size::new(200, 200);

/// Where the first overlay appears; later ones are offset diagonally.
const SPAWN_ORIGIN: (i32, i32) = (100, 100);
const SPAWN_STEP: i32 = 30;
const SPAWN_SLOTS: u32 = 10;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error(transparent)]
    Transcode(#[from] TranscodeError),
    #[error(transparent)]
    Media(#[from] MediaError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("asset id {0} leaves no room for further ids")]
    IdExhausted(AssetId),
}

/// Still frame chosen for the preview pane.
pub struct Preview<'a> {
    pub id: AssetId,
    pub frame_index: usize,
    pub image: &'a RgbaImage,
    pub display_size: Size,
}

/// Outcome of replaying the saved asset list.
#[derive(Debug, Default)]
pub struct RestoreReport {
    pub restored: usize,
    pub failed: Vec<(PathBuf, AssetError)>,
}

/// Owns every open overlay, the list shown in the main window and the id
/// counter.
pub struct AssetCollection {
    overlays: BTreeMap<AssetId, OverlayWindow>,
    entries: Vec<AssetListEntry>,
    next_id: AssetId,
    store: AssetStore,
    loader: Box<dyn MediaLoader>,
    transcoder: Box<dyn Transcoder>,
}

impl AssetCollection {
    pub fn new(
        store: AssetStore,
        loader: Box<dyn MediaLoader>,
        transcoder: Box<dyn Transcoder>,
    ) -> Self {
        Self {
            overlays: BTreeMap::new(),
            entries: Vec::new(),
            next_id: 0,
            store,
            loader,
            transcoder,
        }
    }

    pub fn len(&self) -> usize {
        self.overlays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }

    pub fn next_id(&self) -> AssetId {
        self.next_id
    }

    pub fn ids(&self) -> Vec<AssetId> {
        self.overlays.keys().copied().collect()
    }

    pub fn list_entries(&self) -> &[AssetListEntry] {
        &self.entries
    }

    pub fn get(&self, id: AssetId) -> Option<&OverlayWindow> {
        self.overlays.get(&id)
    }

    pub fn get_mut(&mut self, id: AssetId) -> Option<&mut OverlayWindow> {
        self.overlays.get_mut(&id)
    }

    pub fn overlays_mut(&mut self) -> impl Iterator<Item = &mut OverlayWindow> {
        self.overlays.values_mut()
    }

    /// Ask `picker` for a file and open it. `Ok(None)` when the user cancels.
    pub fn select_asset(
        &mut self,
        picker: &dyn AssetPicker,
    ) -> Result<Option<AssetId>, AssetError> {
        match picker.pick_asset() {
            Some(path) => self.open_asset(&path, false, None).map(Some),
            None => {
                tracing::debug!("asset selection cancelled");
                Ok(None)
            }
        }
    }

    /// Open `path` as a new overlay under the next free id.
    ///
    /// APNG files are converted to a GIF first. On error nothing changes,
    /// including the id counter.
    pub fn open_asset(
        &mut self,
        path: &Path,
        is_hidden: bool,
        size: Option<Size>,
    ) -> Result<AssetId, AssetError> {
        let id = self.next_id;
        self.insert(id, path, is_hidden, size)?;
        Ok(id)
    }

    fn insert(
        &mut self,
        id: AssetId,
        path: &Path,
        is_hidden: bool,
        size: Option<Size>,
    ) -> Result<(), AssetError> {
        let after = id.checked_add(1).ok_or(AssetError::IdExhausted(id))?;
        let path = if has_extension(path, "apng") {
            self.transcoder.transcode(path)?
        } else {
            path.to_path_buf()
        };
        let media = self.loader.load(&path)?;

        let mut window = OverlayWindow::new(id, path, media, spawn_position(id));
        // Not on screen yet, so the viewport builder carries these.
        let detached = Detached;
        if let Some(size) = size {
            window.resize_to(&detached, size);
        }
        if is_hidden {
            window.set_hidden(&detached, true);
        }

        tracing::info!(id, path = %window.path().display(), hidden = is_hidden, "asset opened");
        self.entries.push(AssetListEntry::new(id, window.path()));
        self.overlays.insert(id, window);
        self.next_id = self.next_id.max(after);
        Ok(())
    }

    pub fn show_all(&mut self, ctx: &impl ViewportCtx) {
        for window in self.overlays.values_mut() {
            window.set_hidden(ctx, false);
        }
    }

    /// Destroy every overlay and clear the list. Ids are not reused afterwards.
    pub fn close_assets(&mut self) {
        if !self.overlays.is_empty() {
            tracing::info!(count = self.overlays.len(), "closing all assets");
        }
        self.overlays.clear();
        self.entries.clear();
    }

    /// Flip one overlay's hidden flag. Returns the new flag.
    pub fn toggle_visibility(&mut self, ctx: &impl ViewportCtx, id: AssetId) -> Option<bool> {
        let window = self.overlays.get_mut(&id)?;
        window.toggle_hidden(ctx);
        Some(window.is_hidden())
    }

    pub fn delete_asset(&mut self, id: AssetId) -> bool {
        let removed = self.overlays.remove(&id).is_some();
        self.entries.retain(|e| e.id != id);
        if removed {
            tracing::info!(id, "asset deleted");
        }
        removed
    }

    pub fn preview(&self, id: AssetId) -> Option<Preview<'_>> {
        let window = self.overlays.get(&id)?;
        let frame_index = if window.media().is_animated() {
            window.animation().current_frame()
        } else {
            0
        };
        let image = window.media().frame(frame_index);
        let native = Size::new(image.width(), image.height());
        Some(Preview {
            id,
            frame_index,
            image,
            display_size: fit_within(native, PREVIEW_SIZE),
        })
    }

    /// Advance every animation. Returns the delay until the next frame change.
    pub fn advance_animations(&mut self, dt: Duration) -> Option<Duration> {
        self.overlays
            .values_mut()
            .filter_map(|w| {
                w.animation_mut().advance(dt);
                w.animation().time_to_next_frame()
            })
            .min()
    }

    pub fn snapshot(&self) -> Vec<AssetRecord> {
        self.overlays.values().map(OverlayWindow::record).collect()
    }

    pub fn save(&self) -> Result<(), AssetError> {
        let records = self.snapshot();
        self.store.save(&records)?;
        tracing::info!(count = records.len(), path = %self.store.path().display(), "assets saved");
        Ok(())
    }

    /// Replay the saved list, keeping each record's id, hidden flag and size.
    ///
    /// Records that fail to open are reported and skipped.
    pub fn load_on_startup(&mut self) -> Result<RestoreReport, AssetError> {
        let records = self.store.load()?.into_records();
        let mut report = RestoreReport::default();
        for record in records {
            let id = if self.overlays.contains_key(&record.id) {
                tracing::warn!(id = record.id, "duplicate asset id in saved list; assigning a new one");
                self.next_id
            } else {
                record.id
            };
            match self.insert(id, &record.path, record.is_hidden, Some(record.size)) {
                Ok(()) => report.restored += 1,
                Err(e) => {
                    tracing::warn!(path = %record.path.display(), error = %e, "failed to restore asset");
                    report.failed.push((record.path, e));
                }
            }
        }
        Ok(report)
    }
}

fn spawn_position(id: AssetId) -> (i32, i32) {
    let slot = (id % SPAWN_SLOTS) as i32;
    (
        SPAWN_ORIGIN.0 + slot * SPAWN_STEP,
        SPAWN_ORIGIN.1 + slot * SPAWN_STEP,
    )
}

/// Drops commands for windows that have not been created yet.
struct Detached;

impl ViewportCtx for Detached {
    fn send_viewport_cmd_to(&self, _id: eframe::egui::ViewportId, _cmd: eframe::egui::ViewportCommand) {}

    fn request_repaint(&self) {}
}
