//! Offscreen rendering of committed strokes into a PNG.

use egui::{Pos2, Vec2};
use tiny_skia::{Color, FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};

use crate::error::RasterError;
use crate::state::{SignaturePath, StrokeStyle};
use crate::utils::FitTransform;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RasterSize {
    pub width: u32,
    pub height: u32,
}

impl RasterSize {
    /// Smallest whole-pixel size that covers `size`, at least 1x1.
    pub fn covering(size: Vec2) -> Self {
        Self {
            width: size.x.ceil().max(1.0) as u32,
            height: size.y.ceil().max(1.0) as u32,
        }
    }

    pub fn as_vec2(self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }
}

/// Draws `paths` onto a white raster of `size`.
///
/// Points are in live-canvas coordinates; `surface` is the size of that
/// canvas and decides how they are mapped into the raster. The stroke width
/// is applied in raster pixels, after mapping.
pub fn rasterize(
    paths: &[SignaturePath],
    size: RasterSize,
    surface: Option<Vec2>,
    style: &StrokeStyle,
) -> Result<Pixmap, RasterError> {
    let mut pixmap = Pixmap::new(size.width, size.height).ok_or(RasterError::Allocation {
        width: size.width,
        height: size.height,
    })?;
    pixmap.fill(Color::WHITE);

    let fit = FitTransform::new(surface, size.as_vec2());

    let mut paint = Paint::default();
    let [r, g, b, a] = style.color.to_srgba_unmultiplied();
    paint.set_color_rgba8(r, g, b, a);
    paint.anti_alias = true;

    let stroke = Stroke {
        width: style.width,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    };

    for path in paths {
        let points: Vec<Pos2> = path.points().iter().map(|p| fit.apply(*p)).collect();
        match build_path(&points) {
            Some(outline) => {
                pixmap.stroke_path(&outline, &paint, &stroke, Transform::identity(), None);
            }
            None => {
                // a tap, or a drag that never left its first pixel
                if let Some(dot) = points
                    .first()
                    .and_then(|p| PathBuilder::from_circle(p.x, p.y, style.width / 2.0))
                {
                    pixmap.fill_path(&dot, &paint, FillRule::Winding, Transform::identity(), None);
                }
            }
        }
    }

    Ok(pixmap)
}

fn build_path(points: &[Pos2]) -> Option<tiny_skia::Path> {
    let (first, rest) = points.split_first()?;
    if rest.iter().all(|p| p.distance(*first) < f32::EPSILON) {
        return None;
    }
    let mut pb = PathBuilder::new();
    pb.move_to(first.x, first.y);
    for p in rest {
        pb.line_to(p.x, p.y);
    }
    pb.finish()
}

pub fn encode_png(pixmap: &Pixmap) -> Result<Vec<u8>, RasterError> {
    pixmap
        .encode_png()
        .map_err(|err| RasterError::Encode(err.to_string()))
}
