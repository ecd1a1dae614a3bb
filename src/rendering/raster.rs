//! Built-in rasterizer: paints a `PreviewTree` with tiny-skia and encodes it.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbImage, RgbaImage};
use log::{debug, warn};
use tiny_skia::{
    Color, FillRule, FilterQuality, GradientStop, LinearGradient, Paint, Path, PathBuilder,
    Pattern, Pixmap, Point, Rect as SkRect, SpreadMode, Stroke, Transform,
};

use crate::rendering::font::{self, FontSystem};
use crate::rendering::layout::{aligned_x, Rect, ICON_GAP};
use crate::rendering::paint::{IconKind, ImageFit, PaintCommand, Rgba, TextStyle};
use crate::rendering::{PreviewTree, Screenshot};
use crate::{Error, ExportOptions, OutputFormat, Rasterizer, Result, StoryConfig};

pub struct SkiaRasterizer {
    fonts: FontSystem,
}

impl SkiaRasterizer {
    pub fn new(config: &StoryConfig) -> Result<Self> {
        let fonts = FontSystem::new(
            &config.font_families,
            config.font_file.as_deref(),
            config.load_system_fonts,
        )?;
        Ok(Self { fonts })
    }

    pub fn with_fonts(fonts: FontSystem) -> Self {
        Self { fonts }
    }

    /// Paint `tree` at `scale` without encoding.
    pub fn paint(&self, tree: &PreviewTree, scale: u32) -> Result<Pixmap> {
        let width = tree.viewport.width * scale;
        let height = tree.viewport.height * scale;
        let mut pixmap = Pixmap::new(width, height).ok_or_else(|| {
            Error::RenderError(format!("cannot allocate {}x{} canvas", width, height))
        })?;
        let ts = Transform::from_scale(scale as f32, scale as f32);

        for cmd in &tree.commands {
            self.paint_command(&mut pixmap, cmd, ts);
        }
        Ok(pixmap)
    }

    fn paint_command(&self, pixmap: &mut Pixmap, cmd: &PaintCommand, ts: Transform) {
        match cmd {
            PaintCommand::SolidRect { rect, rgba } => {
                if let Some(r) = sk_rect(rect) {
                    pixmap.fill_rect(r, &solid(*rgba), ts, None);
                }
            }
            PaintCommand::RoundedRect { rect, radius, rgba } => {
                if let Some(path) = rounded_rect_path(rect, *radius) {
                    pixmap.fill_path(&path, &solid(*rgba), FillRule::Winding, ts, None);
                }
            }
            PaintCommand::VerticalGradient { rect, stops } => {
                let stops = stops
                    .iter()
                    .map(|(pos, c)| GradientStop::new(*pos, color(*c)))
                    .collect();
                let shader = LinearGradient::new(
                    Point::from_xy(rect.x, rect.y),
                    Point::from_xy(rect.x, rect.bottom()),
                    stops,
                    SpreadMode::Pad,
                    Transform::identity(),
                );
                if let (Some(shader), Some(r)) = (shader, sk_rect(rect)) {
                    let paint = Paint {
                        shader,
                        anti_alias: true,
                        ..Paint::default()
                    };
                    pixmap.fill_rect(r, &paint, ts, None);
                }
            }
            PaintCommand::Image { rect, photo, fit } => {
                let Some(src) = to_pixmap(photo.image()) else {
                    warn!("Skipping empty image {}", photo.source());
                    return;
                };
                let placement = place_image(rect, src.width(), src.height(), *fit);
                if let Some(path) = sk_rect(rect).map(PathBuilder::from_rect) {
                    pixmap.fill_path(&path, &pattern(&src, placement), FillRule::Winding, ts, None);
                }
            }
            PaintCommand::Medallion {
                cx,
                cy,
                radius,
                border,
                border_rgba,
                fill_rgba,
                silhouette_rgba,
                photo,
            } => {
                let inner_r = (radius - border).max(0.0);
                if let Some(outer) = PathBuilder::from_circle(*cx, *cy, *radius) {
                    pixmap.fill_path(&outer, &solid(*border_rgba), FillRule::Winding, ts, None);
                }
                let Some(inner) = PathBuilder::from_circle(*cx, *cy, inner_r) else {
                    return;
                };
                pixmap.fill_path(&inner, &solid(*fill_rgba), FillRule::Winding, ts, None);

                let image = photo.as_ref().and_then(|p| to_pixmap(p.image()));
                match image {
                    Some(src) => {
                        let square = Rect::new(cx - inner_r, cy - inner_r, inner_r * 2.0, inner_r * 2.0);
                        let placement = place_image(&square, src.width(), src.height(), ImageFit::Cover);
                        pixmap.fill_path(&inner, &pattern(&src, placement), FillRule::Winding, ts, None);
                    }
                    None => {
                        if let Some(path) = silhouette_path(*cx, *cy, inner_r) {
                            pixmap.fill_path(&path, &solid(*silhouette_rgba), FillRule::Winding, ts, None);
                        }
                    }
                }
            }
            PaintCommand::Text {
                rect, lines, style, ..
            } => self.paint_text(pixmap, rect, lines, style, ts),
        }
    }

    /// Paint `lines` as broken by the layout, one per line box.
    fn paint_text(&self, pixmap: &mut Pixmap, rect: &Rect, lines: &[String], style: &TextStyle, ts: Transform) {
        let Some(face) = self.fonts.face(style.weight).and_then(|f| f.parse()) else {
            debug!("No font for weight {}; skipping {:?}", style.weight, lines);
            return;
        };

        let icon_w = if style.icon.is_some() { style.size + ICON_GAP } else { 0.0 };
        let baseline = font::baseline_offset(&face, style.size, style.line_height);

        for (i, line) in lines.iter().enumerate() {
            let top = rect.y + i as f32 * style.line_height;
            let text_w = font::measure(&face, line, style.size);
            let run_x = aligned_x(rect, icon_w + text_w, style.align);

            if let (Some(kind), 0) = (style.icon, i) {
                let icon_top = top + (style.line_height - style.size) / 2.0;
                paint_icon(pixmap, kind, run_x, icon_top, style.size, style.rgba, ts);
            }

            let Some(path) = font::text_path(&face, line, style.size, run_x + icon_w, top + baseline) else {
                continue;
            };
            if let Some(shadow) = style.shadow {
                let shadow_ts = ts.pre_translate(0.0, 2.0);
                pixmap.fill_path(&path, &solid(shadow), FillRule::Winding, shadow_ts, None);
            }
            pixmap.fill_path(&path, &solid(style.rgba), FillRule::Winding, ts, None);
        }
    }
}

impl Rasterizer for SkiaRasterizer {
    fn rasterize(&self, tree: &PreviewTree, options: &ExportOptions) -> Result<Screenshot> {
        let pixmap = self.paint(tree, options.pixel_ratio)?;
        let (width, height) = (pixmap.width(), pixmap.height());

        let mut rgb = Vec::with_capacity((width * height * 3) as usize);
        for px in pixmap.pixels() {
            let c = px.demultiply();
            rgb.extend_from_slice(&[c.red(), c.green(), c.blue()]);
        }
        let rgb = RgbImage::from_raw(width, height, rgb)
            .ok_or_else(|| Error::RenderError("pixel buffer size mismatch".into()))?;

        let data = encode(rgb, options)?;
        debug!("Rasterized {}x{} into {} bytes", width, height, data.len());
        Ok(Screenshot {
            width,
            height,
            format: options.format,
            data,
        })
    }
}

fn encode(rgb: RgbImage, options: &ExportOptions) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    match options.format {
        OutputFormat::Jpeg => {
            let mut encoder = JpegEncoder::new_with_quality(&mut out, options.jpeg_quality());
            encoder
                .encode_image(&rgb)
                .map_err(|e| Error::EncodeError(e.to_string()))?;
        }
        OutputFormat::Png => {
            DynamicImage::ImageRgb8(rgb)
                .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
                .map_err(|e| Error::EncodeError(e.to_string()))?;
        }
    }
    Ok(out)
}

fn color((r, g, b, a): Rgba) -> Color {
    Color::from_rgba8(r, g, b, a)
}

fn solid(rgba: Rgba) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(color(rgba));
    paint.anti_alias = true;
    paint
}

fn sk_rect(rect: &Rect) -> Option<SkRect> {
    SkRect::from_xywh(rect.x, rect.y, rect.width, rect.height)
}

/// Premultiplied copy of a decoded photo.
fn to_pixmap(image: &RgbaImage) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(image.width(), image.height())?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(image.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = tiny_skia::ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Some(pixmap)
}

/// Transform mapping image pixels into `rect` for the given fit.
fn place_image(rect: &Rect, img_w: u32, img_h: u32, fit: ImageFit) -> Transform {
    let (iw, ih) = (img_w as f32, img_h as f32);
    match fit {
        ImageFit::Stretch => Transform::from_row(rect.width / iw, 0.0, 0.0, rect.height / ih, rect.x, rect.y),
        ImageFit::Cover => {
            let s = (rect.width / iw).max(rect.height / ih);
            let tx = rect.x + (rect.width - iw * s) / 2.0;
            let ty = rect.y + (rect.height - ih * s) / 2.0;
            Transform::from_row(s, 0.0, 0.0, s, tx, ty)
        }
    }
}

fn pattern(src: &Pixmap, placement: Transform) -> Paint<'_> {
    Paint {
        shader: Pattern::new(
            src.as_ref(),
            SpreadMode::Pad,
            FilterQuality::Bicubic,
            1.0,
            placement,
        ),
        anti_alias: true,
        ..Paint::default()
    }
}

fn rounded_rect_path(rect: &Rect, radius: f32) -> Option<Path> {
    let r = radius.min(rect.width / 2.0).min(rect.height / 2.0).max(0.0);
    let (x, y, w, h) = (rect.x, rect.y, rect.width, rect.height);
    let mut pb = PathBuilder::new();
    pb.move_to(x + r, y);
    pb.line_to(x + w - r, y);
    pb.quad_to(x + w, y, x + w, y + r);
    pb.line_to(x + w, y + h - r);
    pb.quad_to(x + w, y + h, x + w - r, y + h);
    pb.line_to(x + r, y + h);
    pb.quad_to(x, y + h, x, y + h - r);
    pb.line_to(x, y + r);
    pb.quad_to(x, y, x + r, y);
    pb.close();
    pb.finish()
}

/// Head and shoulders in a 20-unit box, sized to fill half the circle.
fn silhouette_path(cx: f32, cy: f32, radius: f32) -> Option<Path> {
    let s = radius / 20.0;
    let (ox, oy) = (cx - 10.0 * s, cy - 10.0 * s);
    let p = |x: f32, y: f32| (ox + x * s, oy + y * s);
    let mut pb = PathBuilder::new();
    let (hx, hy) = p(10.0, 6.0);
    pb.push_circle(hx, hy, 3.0 * s);

    // Upper half of a radius-7 disc sitting on y = 18
    let k = 7.0 * 0.5523;
    let (x0, y0) = p(3.0, 18.0);
    pb.move_to(x0, y0);
    let (c1x, c1y) = p(3.0, 18.0 - k);
    let (c2x, c2y) = p(10.0 - k, 11.0);
    let (mx, my) = p(10.0, 11.0);
    pb.cubic_to(c1x, c1y, c2x, c2y, mx, my);
    let (c3x, c3y) = p(10.0 + k, 11.0);
    let (c4x, c4y) = p(17.0, 18.0 - k);
    let (ex, ey) = p(17.0, 18.0);
    pb.cubic_to(c3x, c3y, c4x, c4y, ex, ey);
    pb.close();
    pb.finish()
}

fn paint_icon(pixmap: &mut Pixmap, kind: IconKind, x: f32, y: f32, size: f32, rgba: Rgba, ts: Transform) {
    let s = size / 16.0;
    match kind {
        IconKind::Phone => {
            // Handset body outline with a speaker slot
            let body = Rect::new(x + 3.5 * s, y + 0.5 * s, 9.0 * s, 15.0 * s);
            if let Some(path) = rounded_rect_path(&body, 2.0 * s) {
                let stroke = Stroke {
                    width: 1.5 * s,
                    ..Stroke::default()
                };
                pixmap.stroke_path(&path, &solid(rgba), &stroke, ts, None);
            }
            if let Some(slot) = SkRect::from_xywh(x + 6.5 * s, y + 12.0 * s, 3.0 * s, 1.5 * s) {
                pixmap.fill_rect(slot, &solid(rgba), ts, None);
            }
        }
        IconKind::MapPin => {
            let mut pb = PathBuilder::new();
            pb.push_circle(x + 8.0 * s, y + 6.0 * s, 5.0 * s);
            pb.move_to(x + 3.6 * s, y + 8.4 * s);
            pb.line_to(x + 12.4 * s, y + 8.4 * s);
            pb.line_to(x + 8.0 * s, y + 16.0 * s);
            pb.close();
            if let Some(path) = pb.finish() {
                pixmap.fill_path(&path, &solid(rgba), FillRule::Winding, ts, None);
            }
            if let Some(dot) = PathBuilder::from_circle(x + 8.0 * s, y + 6.0 * s, 2.0 * s) {
                pixmap.fill_path(&dot, &solid((0, 0, 0, 90)), FillRule::Winding, ts, None);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::photo::PhotoHandle;
    use crate::rendering::render_preview;
    use crate::state::StoryState;
    use image::Rgba as Px;

    fn no_font_rasterizer() -> SkiaRasterizer {
        SkiaRasterizer::with_fonts(FontSystem::empty())
    }

    #[test]
    fn default_export_is_story_sized_jpeg() {
        let tree = render_preview(&StoryState::new());
        let shot = no_font_rasterizer()
            .rasterize(&tree, &ExportOptions::default())
            .unwrap();
        assert_eq!((shot.width, shot.height), (1080, 1920));
        assert_eq!(&shot.data[0..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory(&shot.data).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (1080, 1920));
    }

    #[test]
    fn png_output_is_supported() {
        let tree = render_preview(&StoryState::new());
        let options = ExportOptions {
            format: OutputFormat::Png,
            pixel_ratio: 1,
            ..Default::default()
        };
        let shot = no_font_rasterizer().rasterize(&tree, &options).unwrap();
        assert_eq!(&shot.data[0..8], b"\x89PNG\r\n\x1a\n");
        assert_eq!((shot.width, shot.height), (360, 640));
    }

    #[test]
    fn portfolio_photo_shows_through_overlay() {
        let mut state = StoryState::new();
        state.photos.portfolio = Some(PhotoHandle::new(
            "red",
            RgbaImage::from_pixel(32, 18, Px([255, 0, 0, 255])),
        ));
        let pixmap = no_font_rasterizer()
            .paint(&render_preview(&state), 1)
            .unwrap();
        // Top-left corner: red photo under 70% violet
        let c = pixmap.pixel(2, 2).unwrap().demultiply();
        assert!(c.red() > c.green(), "red should survive the overlay: {:?}", c);

        let empty = no_font_rasterizer()
            .paint(&render_preview(&StoryState::new()), 1)
            .unwrap();
        let e = empty.pixel(2, 2).unwrap().demultiply();
        assert_ne!((c.red(), c.green(), c.blue()), (e.red(), e.green(), e.blue()));
    }

    #[test]
    fn medallion_border_is_white() {
        let pixmap = no_font_rasterizer()
            .paint(&render_preview(&StoryState::new()), 1)
            .unwrap();
        // 4px inside the 72px radius, straight above the center
        let c = pixmap.pixel(180, 320 - 68).unwrap().demultiply();
        assert_eq!((c.red(), c.green(), c.blue()), (255, 255, 255));
    }

    #[test]
    fn cover_placement_fills_and_centers() {
        let rect = Rect::new(0.0, 0.0, 360.0, 640.0);
        let t = place_image(&rect, 1600, 900, ImageFit::Cover);
        // Height-bound: 640 / 900
        assert!((t.sy - 640.0 / 900.0).abs() < 1e-6);
        assert!(t.tx < 0.0);
        assert!(t.ty.abs() < 1e-3);
    }

    #[test]
    fn rounded_rect_clamps_radius() {
        assert!(rounded_rect_path(&Rect::new(0.0, 0.0, 10.0, 4.0), 50.0).is_some());
    }
}
