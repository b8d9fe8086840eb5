use egui::{Align2, Color32, FontId, Painter, Pos2, Rect, Shape, Vec2};

use crate::state::StrokeStyle;

/// Maps live-canvas coordinates into raster coordinates.
///
/// The canvas is scaled uniformly to fit the raster and centred in it, so a
/// signature keeps its proportions whatever the export size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FitTransform {
    pub scale: f32,
    pub offset: Vec2,
}

impl FitTransform {
    pub const IDENTITY: Self = Self {
        scale: 1.0,
        offset: Vec2::ZERO,
    };

    pub fn new(surface: Option<Vec2>, target: Vec2) -> Self {
        let Some(surface) = surface.filter(|s| s.x > 0.0 && s.y > 0.0) else {
            return Self::IDENTITY;
        };
        let scale = (target.x / surface.x).min(target.y / surface.y);
        Self {
            scale,
            offset: (target - surface * scale) / 2.0,
        }
    }

    pub fn apply(&self, p: Pos2) -> Pos2 {
        Pos2::new(p.x * self.scale + self.offset.x, p.y * self.scale + self.offset.y)
    }
}

pub struct AppUtils;

impl AppUtils {
    // Draws one stroke; `points` are relative to `origin`
    pub fn draw_path(painter: &Painter, points: &[Pos2], origin: Pos2, style: &StrokeStyle) {
        let screen: Vec<Pos2> = points.iter().map(|p| origin + p.to_vec2()).collect();
        let radius = style.width / 2.0;

        // egui strokes have butt ends and mitred corners; a disc on every
        // vertex gives the round caps and joins
        for p in &screen {
            painter.circle_filled(*p, radius, style.color);
        }
        if screen.len() >= 2 {
            painter.add(Shape::Path(egui::epaint::PathShape::line(
                screen,
                style.stroke(),
            )));
        }
    }

    pub fn draw_placeholder(painter: &Painter, rect: Rect, text: &str) {
        painter.text(
            rect.center(),
            Align2::CENTER_CENTER,
            text,
            FontId::proportional(16.0),
            Color32::from_gray(128).gamma_multiply(0.4),
        );
    }

    // "1 signature saved", "3 signatures saved"
    pub fn saved_count_label(count: usize) -> String {
        let plural = if count == 1 { "" } else { "s" };
        format!("{count} signature{plural} saved")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::{pos2, vec2};

    #[test]
    fn wide_target_centres_horizontally() {
        let fit = FitTransform::new(Some(vec2(400.0, 400.0)), vec2(800.0, 400.0));
        assert_eq!(fit.scale, 1.0);
        assert_eq!(fit.apply(pos2(0.0, 0.0)), pos2(200.0, 0.0));
        assert_eq!(fit.apply(pos2(400.0, 400.0)), pos2(600.0, 400.0));
    }

    #[test]
    fn small_canvas_is_scaled_up() {
        let fit = FitTransform::new(Some(vec2(400.0, 200.0)), vec2(800.0, 400.0));
        assert_eq!(fit.scale, 2.0);
        assert_eq!(fit.apply(pos2(400.0, 200.0)), pos2(800.0, 400.0));
    }

    #[test]
    fn tall_canvas_centres_horizontally() {
        let fit = FitTransform::new(Some(vec2(200.0, 400.0)), vec2(800.0, 400.0));
        assert_eq!(fit.scale, 1.0);
        assert_eq!(fit.offset, vec2(300.0, 0.0));
    }

    #[test]
    fn wide_canvas_is_scaled_down_and_centred_vertically() {
        let fit = FitTransform::new(Some(vec2(1600.0, 400.0)), vec2(800.0, 400.0));
        assert_eq!(fit.scale, 0.5);
        assert_eq!(fit.offset, vec2(0.0, 100.0));
    }

    #[test]
    fn unknown_or_degenerate_surface_is_identity() {
        assert_eq!(FitTransform::new(None, vec2(800.0, 400.0)), FitTransform::IDENTITY);
        assert_eq!(
            FitTransform::new(Some(vec2(0.0, 300.0)), vec2(800.0, 400.0)),
            FitTransform::IDENTITY
        );
    }

    #[test]
    fn saved_count_is_pluralised() {
        assert_eq!(AppUtils::saved_count_label(0), "0 signatures saved");
        assert_eq!(AppUtils::saved_count_label(1), "1 signature saved");
        assert_eq!(AppUtils::saved_count_label(2), "2 signatures saved");
    }
}
