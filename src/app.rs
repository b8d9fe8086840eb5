use crate::config::{RasterTarget, Settings, ThemeMode};
use crate::library::SignatureLibrary;
use crate::state::{AppState, Draw, NoticeKind, Preview, Screen};
use crate::utils::AppUtils;
use eframe::Frame;
use egui::{Align2, Color32, Pos2, Rect, RichText, Sense, Stroke, Vec2};
use std::time::Duration;

const ACCENT: Color32 = Color32::from_rgb(0xFF, 0x6B, 0x35);
const DANGER: Color32 = Color32::from_rgb(0xDC, 0x35, 0x45);
const SHARE: Color32 = Color32::from_rgb(0x00, 0x7B, 0xFF);
const CONFIRM: Color32 = Color32::from_rgb(0x28, 0xA7, 0x45);
const CANVAS_FILL: Color32 = Color32::from_rgb(0xFF, 0xFA, 0xF9);
const CANVAS_BORDER: Color32 = Color32::from_rgb(0xFF, 0xE0, 0xD6);

const PLACEHOLDER: &str = "Draw your signature here";
const BUTTON_ROW_HEIGHT: f32 = 44.0;

enum DialogAction {
    Confirm,
    Cancel,
}

enum GalleryAction {
    Toggle(String),
    LoadPreview(String),
    Share(String),
    AskDelete(String),
}

pub struct App {
    state: AppState,
    library: SignatureLibrary,
}

impl App {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let settings = Settings::load(cc.storage);
        let library = SignatureLibrary::open(&settings);
        Self::with_library(settings, library)
    }

    pub fn with_library(settings: Settings, library: SignatureLibrary) -> Self {
        let mut app = Self {
            state: AppState::new(settings),
            library,
        };
        app.refresh_records(0.0);
        app
    }

    fn notify(&mut self, now: f64, text: impl Into<String>, kind: NoticeKind) {
        let duration = self.state.settings.notice_seconds;
        self.state.notices.push(text, kind, now, duration);
    }

    // Re-reads the store; the gallery never trusts an old listing
    fn refresh_records(&mut self, now: f64) {
        match self.library.records() {
            Ok(records) => {
                log::debug!("gallery has {} records", records.len());
                self.state.records = records;
            }
            Err(err) => {
                log::error!("listing signatures failed: {err}");
                self.state.records.clear();
                self.notify(now, format!("Error loading signatures: {err}"), NoticeKind::Error);
            }
        }
        self.state.prune_gallery_state();
    }

    fn save_signature(&mut self, now: f64) {
        let label = self.state.save_dialog.clone().unwrap_or_default();
        match self
            .library
            .save(&mut self.state.strokes, &label, self.state.surface_size)
        {
            Ok(record) => {
                log::info!("saved signature {:?} as {}", record.label, record.id);
                self.state.save_dialog = None;
                self.notify(now, "Signature saved successfully!", NoticeKind::Info);
                self.refresh_records(now);
            }
            Err(err) if err.is_validation() => {
                if !self.state.strokes.has_strokes() {
                    self.state.save_dialog = None;
                }
                self.notify(now, err.to_string(), NoticeKind::Error);
            }
            Err(err) => {
                log::error!("saving signature {label:?} failed: {err}");
                self.notify(now, format!("Error saving signature: {err}"), NoticeKind::Error);
            }
        }
    }

    fn delete_record(&mut self, id: &str, now: f64) {
        if let Err(err) = self.library.delete(id) {
            log::error!("deleting {id} failed: {err}");
            self.notify(now, format!("Error deleting signature: {err}"), NoticeKind::Error);
        }
        self.state.previews.remove(id);
        self.refresh_records(now);
    }

    fn load_preview(&mut self, ctx: &egui::Context, id: String) {
        let preview = match self.library.load_preview(&id) {
            Ok(image) => {
                let size = [image.width() as usize, image.height() as usize];
                let color_image = egui::ColorImage::from_rgba_unmultiplied(size, image.as_raw());
                Preview::Ready(ctx.load_texture(
                    format!("preview-{id}"),
                    color_image,
                    egui::TextureOptions::LINEAR,
                ))
            }
            Err(err) => {
                log::warn!("no preview for {id}: {err}");
                Preview::Unavailable
            }
        };
        self.state.previews.insert(id, preview);
    }
}

impl eframe::App for App {
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        self.state.settings.persist(storage);
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        // Apply theme setting
        ctx.set_theme(match self.state.settings.theme_mode {
            ThemeMode::System => egui::ThemePreference::System,
            ThemeMode::Light => egui::ThemePreference::Light,
            ThemeMode::Dark => egui::ThemePreference::Dark,
        });

        let now = ctx.input(|i| i.time);
        self.state.notices.expire(now);

        egui::TopBottomPanel::bottom("navigation").show(ctx, |ui| {
            self.render_navigation(ui, now);
        });

        egui::CentralPanel::default().show(ctx, |ui| match self.state.screen {
            Screen::Create => self.render_create(ui, now),
            Screen::Gallery => self.render_gallery(ui, now),
        });

        self.render_save_dialog(ctx, now);
        self.render_delete_dialog(ctx, now);
        self.render_settings(ctx);
        self.render_notices(ctx, now);
    }
}

impl App {
    fn render_navigation(&mut self, ui: &mut egui::Ui, now: f64) {
        ui.add_space(6.0);
        ui.horizontal(|ui| {
            ui.selectable_value(&mut self.state.screen, Screen::Create, "✏ Create");
            let to_gallery = ui
                .selectable_value(&mut self.state.screen, Screen::Gallery, "🖼 Gallery")
                .changed();

            if to_gallery {
                self.refresh_records(now);
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("⚙").on_hover_text("Settings").clicked() {
                    self.state.show_settings = !self.state.show_settings;
                }
            });
        });
        ui.add_space(6.0);
    }

    fn render_header(ui: &mut egui::Ui, title: &str, subtitle: &str) {
        ui.vertical_centered(|ui| {
            ui.label(RichText::new(title).size(24.0).strong().color(ACCENT));
            ui.label(RichText::new(subtitle).color(Color32::GRAY));
        });
        ui.add_space(12.0);
    }

    fn render_create(&mut self, ui: &mut egui::Ui, now: f64) {
        Self::render_header(ui, "✍ Digital Signature", "Create your digital signature");
        ui.label(RichText::new("Sign Here").strong().color(ACCENT));

        let height = (ui.available_height() - BUTTON_ROW_HEIGHT - 12.0).max(120.0);
        let (rect, response) =
            ui.allocate_exact_size(Vec2::new(ui.available_width(), height), Sense::drag());
        self.state.surface_size = Some(rect.size());
        self.handle_canvas_input(ui, rect, &response);

        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 12.0, CANVAS_FILL);
        painter.rect_stroke(
            rect,
            12.0,
            Stroke::new(2.0, CANVAS_BORDER),
            egui::StrokeKind::Inside,
        );

        let style = self.state.settings.live_style();
        for path in self.state.strokes.visible_paths() {
            path.draw(&painter, rect.min, &style);
        }
        if self.state.strokes.is_empty() {
            AppUtils::draw_placeholder(&painter, rect, PLACEHOLDER);
        }

        ui.add_space(12.0);
        ui.horizontal(|ui| {
            let width = (ui.available_width() - ui.spacing().item_spacing.x) / 2.0;
            if ui
                .add_sized([width, BUTTON_ROW_HEIGHT], egui::Button::new("✖ Clear"))
                .clicked()
            {
                self.state.strokes.clear();
            }
            let save = egui::Button::new(RichText::new("💾 Save").color(Color32::WHITE)).fill(CONFIRM);
            if ui.add_sized([width, BUTTON_ROW_HEIGHT], save).clicked() {
                if self.state.strokes.has_strokes() {
                    self.state.save_dialog = Some(String::new());
                } else {
                    self.notify(now, "Please create a signature first", NoticeKind::Info);
                }
            }
        });
    }

    fn handle_canvas_input(&mut self, ui: &egui::Ui, rect: Rect, response: &egui::Response) {
        let to_local = |pos: Pos2| (pos - rect.min).to_pos2();

        if response.drag_started() {
            // start where the finger landed, not where the drag was recognised
            let origin = ui
                .input(|i| i.pointer.press_origin())
                .or_else(|| response.interact_pointer_pos());
            if let Some(pos) = origin.filter(|pos| rect.contains(*pos)) {
                self.state.strokes.start(to_local(pos));
            }
        }

        if response.dragged() {
            if let Some(pos) = response.interact_pointer_pos() {
                self.state.strokes.extend(to_local(pos));
            }
        }

        if response.drag_stopped() {
            self.state.strokes.commit();
        }
    }

    fn render_gallery(&mut self, ui: &mut egui::Ui, now: f64) {
        let count = AppUtils::saved_count_label(self.state.records.len());
        Self::render_header(ui, "📁 Saved Signatures", &count);

        if self.state.records.is_empty() {
            ui.vertical_centered(|ui| {
                ui.add_space(ui.available_height() / 4.0);
                ui.label(RichText::new("📝").size(72.0));
                ui.label(RichText::new("No Signatures Yet").size(24.0).strong());
                ui.label(
                    RichText::new("Create your first signature using the Create tab")
                        .color(Color32::GRAY),
                );
            });
            return;
        }

        let mut actions = Vec::new();
        egui::ScrollArea::vertical()
            .auto_shrink(false)
            .show(ui, |ui| {
                for record in &self.state.records {
                    let expanded = self.state.expanded.contains(&record.id);
                    egui::Frame::group(ui.style()).show(ui, |ui| {
                        ui.set_width(ui.available_width());

                        let arrow = if expanded { "▲" } else { "▼" };
                        let title = RichText::new(format!("{}  {arrow}", record.label))
                            .size(18.0)
                            .strong();
                        if ui.add(egui::Button::new(title).frame(false)).clicked() {
                            actions.push(GalleryAction::Toggle(record.id.clone()));
                        }
                        ui.label(RichText::new(record.display_date()).small().color(Color32::GRAY));

                        if !expanded {
                            return;
                        }
                        ui.add_space(8.0);
                        match self.state.previews.get(&record.id) {
                            Some(Preview::Ready(texture)) => {
                                ui.add(
                                    egui::Image::new(egui::load::SizedTexture::from_handle(texture))
                                        .max_height(120.0)
                                        .max_width(ui.available_width()),
                                );
                            }
                            Some(Preview::Unavailable) => {
                                ui.label(RichText::new("Preview unavailable").color(Color32::GRAY));
                            }
                            None => {
                                actions.push(GalleryAction::LoadPreview(record.id.clone()));
                                ui.spinner();
                            }
                        }

                        ui.add_space(8.0);
                        ui.horizontal(|ui| {
                            let share = egui::Button::new(RichText::new("📤 Share").color(Color32::WHITE))
                                .fill(SHARE);
                            if ui.add(share).clicked() {
                                actions.push(GalleryAction::Share(record.id.clone()));
                            }
                            let delete = egui::Button::new(RichText::new("🗑 Delete").color(Color32::WHITE))
                                .fill(DANGER);
                            if ui.add(delete).clicked() {
                                actions.push(GalleryAction::AskDelete(record.id.clone()));
                            }
                        });
                    });
                    ui.add_space(8.0);
                }
            });

        for action in actions {
            match action {
                GalleryAction::Toggle(id) => {
                    if !self.state.expanded.remove(&id) {
                        self.state.expanded.insert(id);
                    }
                }
                GalleryAction::LoadPreview(id) => self.load_preview(ui.ctx(), id),
                GalleryAction::Share(id) => {
                    if let Err(err) = self.library.share(&id) {
                        log::error!("sharing {id} failed: {err}");
                        self.notify(now, format!("Error sharing signature: {err}"), NoticeKind::Error);
                    }
                }
                GalleryAction::AskDelete(id) => self.state.pending_delete = Some(id),
            }
        }
    }

    fn render_save_dialog(&mut self, ctx: &egui::Context, now: f64) {
        let Some(label) = self.state.save_dialog.as_mut() else {
            return;
        };

        let mut action = None;
        egui::Window::new(RichText::new("Save Signature").strong().color(ACCENT))
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label("Enter a name for your signature:");
                let edit = ui.add(egui::TextEdit::singleline(label).hint_text("Signature name"));
                let submitted = edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

                ui.horizontal(|ui| {
                    if ui.button("Cancel").clicked() {
                        action = Some(DialogAction::Cancel);
                    }
                    let save = egui::Button::new(RichText::new("Save").color(Color32::WHITE)).fill(ACCENT);
                    if ui.add(save).clicked() || submitted {
                        action = Some(DialogAction::Confirm);
                    }
                });
            });

        match action {
            Some(DialogAction::Confirm) => self.save_signature(now),
            Some(DialogAction::Cancel) => self.state.save_dialog = None,
            None => {}
        }
    }

    fn render_delete_dialog(&mut self, ctx: &egui::Context, now: f64) {
        let Some(id) = self.state.pending_delete.clone() else {
            return;
        };

        let mut action = None;
        egui::Window::new(RichText::new("Delete Signature").strong().color(ACCENT))
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label("Are you sure you want to delete this signature? This action cannot be undone.");
                ui.horizontal(|ui| {
                    if ui.button("Cancel").clicked() {
                        action = Some(DialogAction::Cancel);
                    }
                    let delete = egui::Button::new(RichText::new("Delete").color(Color32::WHITE)).fill(DANGER);
                    if ui.add(delete).clicked() {
                        action = Some(DialogAction::Confirm);
                    }
                });
            });

        match action {
            Some(DialogAction::Confirm) => {
                self.state.pending_delete = None;
                self.delete_record(&id, now);
            }
            Some(DialogAction::Cancel) => self.state.pending_delete = None,
            None => {}
        }
    }

    fn render_settings(&mut self, ctx: &egui::Context) {
        if !self.state.show_settings {
            return;
        }

        let before = self.state.settings.clone();
        let storage_dir = before.storage_dir();
        let mut open = true;
        egui::Window::new("Settings")
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                let settings = &mut self.state.settings;

                ui.horizontal(|ui| {
                    ui.label("Theme:");
                    ui.selectable_value(&mut settings.theme_mode, ThemeMode::System, "System");
                    ui.selectable_value(&mut settings.theme_mode, ThemeMode::Light, "Light");
                    ui.selectable_value(&mut settings.theme_mode, ThemeMode::Dark, "Dark");
                });

                ui.horizontal(|ui| {
                    ui.label("Saved size:");
                    ui.selectable_value(
                        &mut settings.raster_target,
                        RasterTarget::DEFAULT_FIXED,
                        "800 × 400",
                    );
                    ui.selectable_value(
                        &mut settings.raster_target,
                        RasterTarget::MatchSurface,
                        "Match canvas",
                    );
                });

                ui.horizontal(|ui| {
                    ui.label("Pen width:");
                    ui.add(egui::Slider::new(&mut settings.live_stroke_width, Settings::STROKE_WIDTH_RANGE));
                });

                ui.horizontal(|ui| {
                    ui.label("Saved stroke width:");
                    ui.add(egui::Slider::new(&mut settings.export_stroke_width, Settings::STROKE_WIDTH_RANGE));
                });

                ui.separator();
                ui.label(
                    RichText::new(format!("Signatures are kept in {}", storage_dir.display()))
                        .small()
                        .color(Color32::GRAY),
                );
            });
        self.state.show_settings = open;

        if self.state.settings != before {
            self.library.apply_settings(&self.state.settings);
        }
    }

    fn render_notices(&mut self, ctx: &egui::Context, now: f64) {
        if self.state.notices.active().is_empty() {
            return;
        }

        egui::Area::new(egui::Id::new("notices"))
            .anchor(Align2::CENTER_BOTTOM, [0.0, -72.0])
            .interactable(false)
            .show(ctx, |ui| {
                for notice in self.state.notices.active() {
                    let fill = match notice.kind {
                        NoticeKind::Info => Color32::from_gray(48),
                        NoticeKind::Error => DANGER,
                    };
                    egui::Frame::NONE
                        .fill(fill)
                        .corner_radius(8.0)
                        .inner_margin(10.0)
                        .show(ui, |ui| {
                            ui.label(RichText::new(&notice.text).color(Color32::WHITE));
                        });
                    ui.add_space(4.0);
                }
            });

        let remaining = self
            .state
            .notices
            .next_expiry()
            .and_then(|expires_at| Duration::try_from_secs_f64((expires_at - now).max(0.0)).ok());
        if let Some(remaining) = remaining {
            ctx.request_repaint_after(remaining);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::share::RecordingShare;
    use crate::store::{MemoryStore, RecordStore};
    use chrono::NaiveDate;
    use egui::pos2;

    fn app_with(store: MemoryStore) -> App {
        let time = NaiveDate::from_ymd_opt(2024, 1, 15)
            .and_then(|d| d.and_hms_opt(9, 30, 0))
            .expect("valid test time");
        let library = SignatureLibrary::new(
            Box::new(store),
            Box::new(FixedClock(time)),
            Box::new(RecordingShare::new()),
        );
        App::with_library(Settings::default(), library)
    }

    #[test]
    fn startup_lists_existing_records() {
        let mut store = MemoryStore::new();
        store.write_record("A_20240101_000000.png", b"x").expect("seed");
        let app = app_with(store);
        assert_eq!(app.state.records.len(), 1);
        assert_eq!(app.state.screen, Screen::Create);
    }

    #[test]
    fn successful_save_closes_dialog_and_refreshes() {
        let mut app = app_with(MemoryStore::new());
        app.state.strokes.start(pos2(10.0, 10.0));
        app.state.strokes.extend(pos2(60.0, 30.0));
        app.state.strokes.commit();
        app.state.save_dialog = Some(" Alice ".to_owned());

        app.save_signature(1.0);
        assert!(app.state.save_dialog.is_none());
        assert!(app.state.strokes.is_empty());
        assert_eq!(
            app.state.records.first().map(|r| r.id.as_str()),
            Some("Alice_20240115_093000.png")
        );
        assert_eq!(
            app.state.notices.active().first().map(|n| n.text.as_str()),
            Some("Signature saved successfully!")
        );
    }

    #[test]
    fn failed_save_keeps_dialog_and_strokes() {
        let mut app = app_with(MemoryStore::failing());
        app.state.strokes.start(pos2(10.0, 10.0));
        app.state.strokes.extend(pos2(60.0, 30.0));
        app.state.strokes.commit();
        app.state.save_dialog = Some("Alice".to_owned());

        app.save_signature(1.0);
        assert!(app.state.save_dialog.is_some());
        assert!(app.state.strokes.has_strokes());
        let notice = app.state.notices.active().first().cloned().expect("error notice");
        assert_eq!(notice.kind, NoticeKind::Error);
        assert!(notice.text.starts_with("Error saving signature"));
    }

    #[test]
    fn delete_refreshes_and_drops_ui_state() {
        let mut store = MemoryStore::new();
        store.write_record("A_20240101_000000.png", b"x").expect("seed");
        store.write_record("B_20240101_000000.png", b"x").expect("seed");
        let mut app = app_with(store);
        app.state.expanded.insert("A_20240101_000000.png".to_owned());
        app.state.previews.insert("A_20240101_000000.png".to_owned(), Preview::Unavailable);

        app.delete_record("A_20240101_000000.png", 1.0);
        assert_eq!(app.state.records.len(), 1);
        assert!(app.state.expanded.is_empty());
        assert!(app.state.previews.is_empty());
        assert!(app.state.notices.active().is_empty());
    }
}
