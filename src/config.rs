use egui::Vec2;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::ops::RangeInclusive;
use std::path::PathBuf;

use crate::raster::RasterSize;
use crate::state::StrokeStyle;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThemeMode {
    System, // follow the OS
    Light,
    Dark,
}

/// Pixel size of saved signatures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RasterTarget {
    /// Fixed export format. The canvas is scaled to fit, keeping its aspect.
    Fixed { width: u32, height: u32 },
    /// Same size as the canvas at the moment of saving.
    MatchSurface,
}

impl RasterTarget {
    pub const DEFAULT_FIXED: Self = Self::Fixed {
        width: 800,
        height: 400,
    };

    /// Raster size for a save, given the measured canvas size (if any).
    pub fn resolve(&self, surface: Option<Vec2>) -> RasterSize {
        match (*self, surface) {
            (Self::Fixed { width, height }, _) => RasterSize { width, height },
            (Self::MatchSurface, Some(size)) => RasterSize::covering(size),
            (Self::MatchSurface, None) => Self::DEFAULT_FIXED.resolve(None),
        }
    }
}

impl Default for RasterTarget {
    fn default() -> Self {
        Self::DEFAULT_FIXED
    }
}

/// User settings, restored through eframe persistence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub storage_dir: Option<PathBuf>,
    pub raster_target: RasterTarget,
    pub live_stroke_width: f32,
    pub export_stroke_width: f32,
    pub theme_mode: ThemeMode,
    pub notice_seconds: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            storage_dir: None,
            raster_target: RasterTarget::default(),
            live_stroke_width: StrokeStyle::LIVE_WIDTH,
            export_stroke_width: StrokeStyle::EXPORT_WIDTH,
            theme_mode: ThemeMode::System,
            notice_seconds: 2.5,
        }
    }
}

impl Settings {
    pub const STORAGE_DIR_ENV: &'static str = "SIGNATURE_PAD_DIR";
    pub const STORAGE_KEY: &'static str = eframe::APP_KEY;
    pub const STROKE_WIDTH_RANGE: RangeInclusive<f32> = 1.0..=20.0;
    pub const NOTICE_SECONDS_RANGE: RangeInclusive<f64> = 0.5..=30.0;

    pub fn load(storage: Option<&dyn eframe::Storage>) -> Self {
        match storage.and_then(|s| eframe::get_value::<Self>(s, Self::STORAGE_KEY)) {
            Some(settings) => {
                log::info!("restored settings");
                settings.sanitized()
            }
            None => {
                log::info!("no stored settings, using defaults");
                Self::default()
            }
        }
    }

    /// Pulls hand-edited or corrupt numbers back into the ranges the UI offers.
    fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        let (min, max) = Self::STROKE_WIDTH_RANGE.into_inner();
        for (width, fallback) in [
            (&mut self.live_stroke_width, defaults.live_stroke_width),
            (&mut self.export_stroke_width, defaults.export_stroke_width),
        ] {
            *width = if width.is_finite() {
                (*width).clamp(min, max)
            } else {
                fallback
            };
        }
        let (min, max) = Self::NOTICE_SECONDS_RANGE.into_inner();
        if self.notice_seconds.is_finite() {
            self.notice_seconds = self.notice_seconds.clamp(min, max);
        } else {
            self.notice_seconds = defaults.notice_seconds;
        }
        self
    }

    pub fn persist(&self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, Self::STORAGE_KEY, self);
    }

    /// Where records live: `$SIGNATURE_PAD_DIR`, then the configured
    /// directory, then the per-user data directory.
    pub fn storage_dir(&self) -> PathBuf {
        self.storage_dir_with(std::env::var_os(Self::STORAGE_DIR_ENV))
    }

    fn storage_dir_with(&self, env_override: Option<OsString>) -> PathBuf {
        if let Some(dir) = env_override.filter(|dir| !dir.is_empty()) {
            return PathBuf::from(dir);
        }
        if let Some(dir) = &self.storage_dir {
            return dir.clone();
        }
        dirs::data_dir()
            .or_else(dirs::home_dir)
            .map(|base| base.join("signature-pad"))
            .unwrap_or_default()
            .join("signatures")
    }

    pub fn live_style(&self) -> StrokeStyle {
        StrokeStyle::live(self.live_stroke_width)
    }

    pub fn export_style(&self) -> StrokeStyle {
        StrokeStyle::export(self.export_stroke_width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::vec2;

    #[test]
    fn fixed_target_ignores_the_surface() {
        let size = RasterTarget::DEFAULT_FIXED.resolve(Some(vec2(320.0, 500.0)));
        assert_eq!(size, RasterSize { width: 800, height: 400 });
    }

    #[test]
    fn match_surface_follows_the_canvas() {
        let size = RasterTarget::MatchSurface.resolve(Some(vec2(359.6, 200.2)));
        assert_eq!(size, RasterSize { width: 360, height: 201 });
        let unmeasured = RasterTarget::MatchSurface.resolve(None);
        assert_eq!(unmeasured, RasterSize { width: 800, height: 400 });
    }

    #[test]
    fn storage_dir_precedence() {
        let mut settings = Settings::default();
        assert!(settings.storage_dir_with(None).ends_with("signatures"));

        settings.storage_dir = Some(PathBuf::from("/srv/sigs"));
        assert_eq!(settings.storage_dir_with(None), PathBuf::from("/srv/sigs"));
        assert_eq!(
            settings.storage_dir_with(Some(OsString::from("/tmp/override"))),
            PathBuf::from("/tmp/override")
        );
        assert_eq!(
            settings.storage_dir_with(Some(OsString::new())),
            PathBuf::from("/srv/sigs"),
            "an empty override is ignored"
        );
    }

    #[derive(Default)]
    struct MemoryStorage(std::collections::HashMap<String, String>);

    impl eframe::Storage for MemoryStorage {
        fn get_string(&self, key: &str) -> Option<String> {
            self.0.get(key).cloned()
        }

        fn set_string(&mut self, key: &str, value: String) {
            self.0.insert(key.to_owned(), value);
        }

        fn flush(&mut self) {}
    }

    #[test]
    fn corrupt_numbers_are_pulled_back_into_range() {
        let mut storage = MemoryStorage::default();
        Settings {
            notice_seconds: 1e9,
            live_stroke_width: -4.0,
            export_stroke_width: 500.0,
            ..Settings::default()
        }
        .persist(&mut storage);

        let settings = Settings::load(Some(&storage));
        assert_eq!(settings.notice_seconds, 30.0);
        assert_eq!(settings.live_stroke_width, 1.0);
        assert_eq!(settings.export_stroke_width, 20.0);
    }

    #[test]
    fn non_finite_values_fall_back_to_defaults() {
        let settings = Settings {
            notice_seconds: f64::NAN,
            live_stroke_width: f32::INFINITY,
            ..Settings::default()
        }
        .sanitized();
        assert_eq!(settings.notice_seconds, 2.5);
        assert_eq!(settings.live_stroke_width, StrokeStyle::LIVE_WIDTH);
        assert!(std::time::Duration::try_from_secs_f64(settings.notice_seconds).is_ok());
    }

    #[test]
    fn settings_survive_a_restart() {
        let mut storage = MemoryStorage::default();
        assert_eq!(Settings::load(Some(&storage)), Settings::default());

        let settings = Settings {
            raster_target: RasterTarget::MatchSurface,
            theme_mode: ThemeMode::Dark,
            export_stroke_width: 5.0,
            ..Settings::default()
        };
        settings.persist(&mut storage);
        assert_eq!(Settings::load(Some(&storage)), settings);
        assert_eq!(Settings::load(None), Settings::default());
    }
}
