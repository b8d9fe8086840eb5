use std::time::Duration;

use egui::Vec2;

use crate::clock::{Clock, SystemClock};
use crate::config::{RasterTarget, Settings};
use crate::error::{PreviewError, SaveError, ShareError, StoreError};
use crate::raster;
use crate::record::{self, SignatureRecord};
use crate::share::{ShareRequest, ShareTarget, SystemShare};
use crate::state::{StrokeAccumulator, StrokeStyle};
use crate::store::{DirectoryStore, RecordStore};

// partials older than this belong to an interrupted save
const STALE_PARTIAL_AGE: Duration = Duration::from_secs(60);

/// Saved signatures plus everything needed to create, share and delete them.
pub struct SignatureLibrary {
    store: Box<dyn RecordStore>,
    clock: Box<dyn Clock>,
    share: Box<dyn ShareTarget>,
    raster_target: RasterTarget,
    export_style: StrokeStyle,
}

impl SignatureLibrary {
    pub fn new(
        store: Box<dyn RecordStore>,
        clock: Box<dyn Clock>,
        share: Box<dyn ShareTarget>,
    ) -> Self {
        Self {
            store,
            clock,
            share,
            raster_target: RasterTarget::default(),
            export_style: StrokeStyle::export(StrokeStyle::EXPORT_WIDTH),
        }
    }

    /// The desktop setup: records on disk, wall clock, system file handler.
    pub fn open(settings: &Settings) -> Self {
        let root = settings.storage_dir();
        log::info!("signatures are kept in {}", root.display());
        let store = DirectoryStore::new(root);
        store.remove_stale_partials(STALE_PARTIAL_AGE);
        let mut library = Self::new(
            Box::new(store),
            Box::new(SystemClock),
            Box::new(SystemShare),
        );
        library.apply_settings(settings);
        library
    }

    pub fn apply_settings(&mut self, settings: &Settings) {
        self.raster_target = settings.raster_target;
        self.export_style = settings.export_style();
    }

    /// Rasterizes the committed strokes and stores them as
    /// `<label>_<timestamp>.png`.
    ///
    /// The strokes are cleared only once the record is safely written; on
    /// any error they are left as they were so the user can retry.
    ///
    /// # Errors
    /// Refuses an empty canvas and a blank or unsafe label before touching
    /// storage. Raster and storage failures abort the whole save.
    pub fn save(
        &mut self,
        strokes: &mut StrokeAccumulator,
        label: &str,
        surface: Option<Vec2>,
    ) -> Result<SignatureRecord, SaveError> {
        if !strokes.has_strokes() {
            return Err(SaveError::NothingToSave);
        }
        let label = validate_label(label)?;

        let size = self.raster_target.resolve(surface);
        let pixmap = raster::rasterize(strokes.completed(), size, surface, &self.export_style)?;
        let bytes = raster::encode_png(&pixmap)?;
        drop(pixmap);

        let name = record::record_file_name(label, self.clock.now());
        let saved = self.store.write_record(&name, &bytes)?;
        log::info!(
            "saved {} ({} strokes, {}x{})",
            saved.id,
            strokes.completed().len(),
            size.width,
            size.height
        );

        strokes.clear();
        Ok(saved)
    }

    /// Fresh listing, most recent first.
    pub fn records(&self) -> Result<Vec<SignatureRecord>, StoreError> {
        self.store.list_records()
    }

    pub fn delete(&mut self, id: &str) -> Result<(), StoreError> {
        self.store.delete_record(id)
    }

    pub fn share(&self, id: &str) -> Result<(), ShareError> {
        let path = self.store.locate(id)?;
        self.share.share(&ShareRequest::png(path))
    }

    pub fn load_preview(&self, id: &str) -> Result<image::RgbaImage, PreviewError> {
        let bytes = self.store.read_record(id)?;
        let decoded = image::load_from_memory_with_format(&bytes, image::ImageFormat::Png)?;
        Ok(decoded.to_rgba8())
    }
}

/// Trimmed label, or why it cannot name a file.
pub fn validate_label(label: &str) -> Result<&str, SaveError> {
    let label = label.trim();
    if label.is_empty() {
        return Err(SaveError::EmptyLabel);
    }
    if let Some(bad) = label
        .chars()
        .find(|c| matches!(c, '/' | '\\') || c.is_control())
    {
        return Err(SaveError::InvalidLabel(bad));
    }
    // hidden files never show up in the gallery
    if label.starts_with('.') {
        return Err(SaveError::InvalidLabel('.'));
    }
    Ok(label)
}
