#![cfg(feature = "skia")]

use resital_story::listing::Field;
use resital_story::rendering::font::FontSystem;
use resital_story::rendering::layout::{TextMeasure, ICON_GAP};
use resital_story::rendering::paint::{IconKind, PaintCommand};
use resital_story::rendering::raster::SkiaRasterizer;
use resital_story::rendering::{render_preview, render_preview_measured};
use resital_story::{ExportOptions, OutputFormat, Rasterizer, StoryConfig, StoryState, Viewport};

#[test]
fn smoke_rasterize_empty_story() {
    let raster = SkiaRasterizer::with_fonts(FontSystem::empty());
    let tree = render_preview(&StoryState::new());
    let s = raster.rasterize(&tree, &ExportOptions::default()).unwrap();
    assert_eq!(s.width, 1080);
    assert_eq!(s.height, 1920);
    assert_eq!(&s.data[..2], &[0xFF, 0xD8]);
}

#[test]
fn smoke_rasterize_png_preview_scale() {
    let mut state = StoryState::new();
    Field::Price.apply(&mut state.listing, "990000").unwrap();
    let raster = SkiaRasterizer::with_fonts(FontSystem::empty());
    let opts = ExportOptions {
        pixel_ratio: 1,
        format: OutputFormat::Png,
        ..ExportOptions::default()
    };
    let s = raster.rasterize(&render_preview(&state), &opts).unwrap();
    let img = image::load_from_memory(&s.data).unwrap();
    assert_eq!((img.width(), img.height()), (360, 640));
    assert!(s.data_url().starts_with("data:image/png;base64,"));
}

#[test]
fn long_fields_are_painted_in_full_with_system_fonts() {
    let config = StoryConfig::default();
    let fonts = FontSystem::new(&config.font_families, None, true).unwrap();
    if fonts.is_empty() {
        println!("No system fonts available. Skipping.");
        return;
    }

    let name = "Ayşe Nur Yılmaz Karaosmanoğlu Demirbaş";
    let location = "İstanbul, Kadıköy, Caferağa Mahallesi, Moda Caddesi No 12";
    let mut state = StoryState::new();
    Field::ConsultantName.apply(&mut state.listing, name).unwrap();
    Field::Location.apply(&mut state.listing, location).unwrap();
    let tree = render_preview_measured(&state, Viewport::default(), &fonts);

    for expected in [name, location] {
        let (rect, lines, style) = tree
            .commands
            .iter()
            .find_map(|c| match c {
                PaintCommand::Text {
                    rect,
                    text,
                    lines,
                    style,
                } if text == expected => Some((*rect, lines, style)),
                _ => None,
            })
            .unwrap();
        assert_eq!(lines.join(" "), expected);
        assert_eq!(rect.height, lines.len() as f32 * style.line_height);

        let icon_w = if style.icon == Some(IconKind::MapPin) {
            style.size + ICON_GAP
        } else {
            0.0
        };
        for line in lines.iter().filter(|l| l.contains(' ')) {
            assert!(
                fonts.text_width(line, style.size, style.weight) <= rect.width - icon_w,
                "{:?} overflows",
                line
            );
        }
    }

    let shot = SkiaRasterizer::with_fonts(fonts)
        .rasterize(&tree, &ExportOptions::default())
        .unwrap();
    assert_eq!((shot.width, shot.height), (1080, 1920));
}
