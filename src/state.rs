use egui::{Color32, Pos2, Stroke, Vec2};
use std::collections::{HashMap, HashSet};

use crate::config::Settings;
use crate::record::SignatureRecord;

/// Pointer moves closer than this to the previous point are dropped.
pub const MIN_POINT_SPACING: f32 = 1.0;

// Screens reachable from the bottom navigation bar
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    Create,  // draw and save
    Gallery, // browse saved signatures
}

// Anything that can paint itself onto the live canvas
pub trait Draw {
    fn draw(&self, painter: &egui::Painter, origin: Pos2, style: &StrokeStyle);
}

/// Uniform rendering parameters for every stroke.
///
/// Caps and joins are always round and strokes are always anti-aliased, so
/// only the width and the solid colour vary between the live canvas and the
/// exported raster.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrokeStyle {
    pub width: f32,
    pub color: Color32,
}

impl StrokeStyle {
    pub const INK: Color32 = Color32::from_rgb(0x2D, 0x37, 0x48);
    pub const LIVE_WIDTH: f32 = 6.0;
    pub const EXPORT_WIDTH: f32 = 8.0;

    pub fn live(width: f32) -> Self {
        Self {
            width,
            color: Self::INK,
        }
    }

    pub fn export(width: f32) -> Self {
        Self {
            width,
            color: Color32::BLACK,
        }
    }

    pub fn stroke(&self) -> Stroke {
        Stroke::new(self.width, self.color)
    }
}

/// One continuous drag, in canvas-local coordinates.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SignaturePath {
    points: Vec<Pos2>,
}

impl SignaturePath {
    pub fn starting_at(point: Pos2) -> Self {
        Self {
            points: vec![point],
        }
    }

    pub fn points(&self) -> &[Pos2] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn last(&self) -> Option<Pos2> {
        self.points.last().copied()
    }

    fn line_to(&mut self, point: Pos2) -> bool {
        match self.points.last() {
            Some(last) if last.distance(point) < MIN_POINT_SPACING => false,
            _ => {
                self.points.push(point);
                true
            }
        }
    }
}

impl Draw for SignaturePath {
    fn draw(&self, painter: &egui::Painter, origin: Pos2, style: &StrokeStyle) {
        crate::utils::AppUtils::draw_path(painter, &self.points, origin, style);
    }
}

/// Turns drag gestures into committed paths.
///
/// `start` opens a path, `extend`/`extend_by` append to it while a drag is in
/// progress and `commit` moves it into the completed list. Move and end
/// events that arrive without a preceding start are ignored.
#[derive(Clone, Debug, Default)]
pub struct StrokeAccumulator {
    completed: Vec<SignaturePath>,
    current: SignaturePath,
    drawing: bool,
}

impl StrokeAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, point: Pos2) {
        self.current = SignaturePath::starting_at(point);
        self.drawing = true;
    }

    /// Extends the in-progress path to an absolute pointer position.
    pub fn extend(&mut self, point: Pos2) -> bool {
        if !self.drawing {
            return false;
        }
        self.current.line_to(point)
    }

    /// Extends the in-progress path by the delta since the previous move.
    pub fn extend_by(&mut self, delta: Vec2) -> bool {
        if !self.drawing {
            return false;
        }
        match self.current.last() {
            Some(last) => self.current.line_to(last + delta),
            None => false,
        }
    }

    pub fn commit(&mut self) {
        if !self.drawing {
            return;
        }
        self.completed.push(std::mem::take(&mut self.current));
        self.drawing = false;
    }

    pub fn clear(&mut self) {
        self.completed.clear();
        self.current = SignaturePath::default();
        self.drawing = false;
    }

    pub fn completed(&self) -> &[SignaturePath] {
        &self.completed
    }

    pub fn current(&self) -> &SignaturePath {
        &self.current
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    pub fn has_strokes(&self) -> bool {
        !self.completed.is_empty()
    }

    // nothing to show: the canvas displays the placeholder instead
    pub fn is_empty(&self) -> bool {
        self.completed.is_empty() && !self.drawing
    }

    /// Paths in draw order: committed ones first, then the live one.
    pub fn visible_paths(&self) -> impl Iterator<Item = &SignaturePath> {
        let live = self.drawing.then_some(&self.current);
        self.completed.iter().chain(live)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

/// A transient, non-blocking message shown above the navigation bar.
#[derive(Clone, Debug, PartialEq)]
pub struct Notice {
    pub text: String,
    pub kind: NoticeKind,
    pub expires_at: f64,
}

#[derive(Default)]
pub struct Notices {
    queue: Vec<Notice>,
}

impl Notices {
    pub fn push(&mut self, text: impl Into<String>, kind: NoticeKind, now: f64, duration: f64) {
        let text = text.into();
        match kind {
            NoticeKind::Info => log::info!("notice: {text}"),
            NoticeKind::Error => log::warn!("notice: {text}"),
        }
        self.queue.push(Notice {
            text,
            kind,
            expires_at: now + duration,
        });
    }

    pub fn expire(&mut self, now: f64) {
        self.queue.retain(|notice| notice.expires_at > now);
    }

    pub fn active(&self) -> &[Notice] {
        &self.queue
    }

    pub fn next_expiry(&self) -> Option<f64> {
        self.queue
            .iter()
            .map(|notice| notice.expires_at)
            .min_by(f64::total_cmp)
    }
}

// Gallery preview texture, or the reason there is none
pub enum Preview {
    Ready(egui::TextureHandle),
    Unavailable,
}

// Everything the UI keeps between frames
pub struct AppState {
    pub screen: Screen,
    pub strokes: StrokeAccumulator,
    pub surface_size: Option<Vec2>,        // last measured canvas size
    pub save_dialog: Option<String>,       // label being typed, when the dialog is open
    pub pending_delete: Option<String>,    // record awaiting confirmation
    pub show_settings: bool,
    pub records: Vec<SignatureRecord>,     // gallery listing, most recent first
    pub expanded: HashSet<String>,         // record ids with an open card
    pub previews: HashMap<String, Preview>, // decoded on first expand
    pub notices: Notices,
    pub settings: Settings,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self {
            screen: Screen::Create,
            strokes: StrokeAccumulator::new(),
            surface_size: None,
            save_dialog: None,
            pending_delete: None,
            show_settings: false,
            records: Vec::new(),
            expanded: HashSet::new(),
            previews: HashMap::new(),
            notices: Notices::default(),
            settings,
        }
    }

    // drop per-record UI state for records that no longer exist
    pub fn prune_gallery_state(&mut self) {
        let ids: HashSet<&str> = self.records.iter().map(|r| r.id.as_str()).collect();
        self.expanded.retain(|id| ids.contains(id.as_str()));
        self.previews.retain(|id, _| ids.contains(id.as_str()));
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::{pos2, vec2};

    fn drag(acc: &mut StrokeAccumulator, points: &[Pos2]) {
        let (first, rest) = points.split_first().expect("drag needs a start point");
        acc.start(*first);
        for p in rest {
            acc.extend(*p);
        }
        acc.commit();
    }

    #[test]
    fn commit_adds_exactly_one_path_and_resets_current() {
        let mut acc = StrokeAccumulator::new();
        drag(&mut acc, &[pos2(0.0, 0.0), pos2(10.0, 0.0), pos2(10.0, 10.0)]);
        assert_eq!(acc.completed().len(), 1);
        assert!(acc.current().is_empty());
        assert!(!acc.is_drawing());

        drag(&mut acc, &[pos2(50.0, 50.0)]);
        assert_eq!(acc.completed().len(), 2, "a tap still commits a path");
        assert!(acc.current().is_empty());
    }

    #[test]
    fn committed_paths_keep_insertion_order() {
        let mut acc = StrokeAccumulator::new();
        drag(&mut acc, &[pos2(1.0, 1.0), pos2(5.0, 5.0)]);
        drag(&mut acc, &[pos2(100.0, 1.0), pos2(105.0, 5.0)]);
        let firsts: Vec<Pos2> = acc
            .completed()
            .iter()
            .filter_map(|p| p.points().first().copied())
            .collect();
        assert_eq!(firsts, vec![pos2(1.0, 1.0), pos2(100.0, 1.0)]);
    }

    #[test]
    fn moves_without_a_start_are_ignored() {
        let mut acc = StrokeAccumulator::new();
        assert!(!acc.extend(pos2(3.0, 3.0)));
        assert!(!acc.extend_by(vec2(3.0, 3.0)));
        acc.commit();
        assert!(acc.completed().is_empty());
        assert!(acc.current().is_empty());
        assert!(acc.is_empty());
    }

    #[test]
    fn relative_moves_accumulate_from_the_last_point() {
        let mut acc = StrokeAccumulator::new();
        acc.start(pos2(10.0, 10.0));
        acc.extend_by(vec2(5.0, 0.0));
        acc.extend_by(vec2(0.0, 5.0));
        assert_eq!(
            acc.current().points(),
            &[pos2(10.0, 10.0), pos2(15.0, 10.0), pos2(15.0, 15.0)]
        );
    }

    #[test]
    fn sub_pixel_jitter_is_dropped() {
        let mut acc = StrokeAccumulator::new();
        acc.start(pos2(0.0, 0.0));
        assert!(!acc.extend(pos2(0.3, 0.3)));
        assert!(acc.extend(pos2(2.0, 0.0)));
        assert_eq!(acc.current().len(), 2);
    }

    #[test]
    fn clear_resets_from_any_state() {
        let mut acc = StrokeAccumulator::new();
        acc.clear();
        assert!(acc.is_empty());

        drag(&mut acc, &[pos2(0.0, 0.0), pos2(4.0, 4.0)]);
        acc.start(pos2(8.0, 8.0));
        acc.extend(pos2(12.0, 12.0));
        acc.clear();
        assert!(acc.completed().is_empty());
        assert!(acc.current().is_empty());
        assert!(!acc.is_drawing());

        acc.clear();
        assert!(acc.is_empty());
    }

    #[test]
    fn visible_paths_include_the_live_stroke_last() {
        let mut acc = StrokeAccumulator::new();
        drag(&mut acc, &[pos2(0.0, 0.0), pos2(4.0, 4.0)]);
        assert_eq!(acc.visible_paths().count(), 1);

        acc.start(pos2(20.0, 20.0));
        let visible: Vec<&SignaturePath> = acc.visible_paths().collect();
        assert_eq!(visible.len(), 2);
        assert_eq!(visible.last().and_then(|p| p.last()), Some(pos2(20.0, 20.0)));
        assert!(!acc.is_empty());
    }

    #[test]
    fn notices_expire_in_order() {
        let mut notices = Notices::default();
        notices.push("first", NoticeKind::Info, 0.0, 2.0);
        notices.push("second", NoticeKind::Error, 1.0, 2.0);
        assert_eq!(notices.next_expiry(), Some(2.0));

        notices.expire(2.5);
        assert_eq!(notices.active().len(), 1);
        assert_eq!(notices.active().first().map(|n| n.text.as_str()), Some("second"));

        notices.expire(3.0);
        assert!(notices.active().is_empty());
        assert_eq!(notices.next_expiry(), None);
    }
}
