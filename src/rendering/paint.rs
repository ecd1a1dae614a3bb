//! Paint command set produced by the story layout.
//!
//! Coordinates are logical pixels of the card; the rasterizer applies the
//! export pixel ratio.

use std::fmt;

use crate::photo::PhotoHandle;
use crate::rendering::layout::Rect;

pub type Rgba = (u8, u8, u8, u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFit {
    /// Scale to fill the rect, cropping the overflow (centered)
    Cover,
    /// Scale into exactly the rect; the layout already kept the aspect ratio
    Stretch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconKind {
    Phone,
    MapPin,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub size: f32,
    pub line_height: f32,
    /// CSS-style weight (400 regular, 700 bold, 800 extra bold)
    pub weight: u16,
    pub rgba: Rgba,
    pub align: TextAlign,
    /// Shadow color drawn 2px below the glyphs
    pub shadow: Option<Rgba>,
    /// Icon placed before the text, sized to the font size
    pub icon: Option<IconKind>,
}

impl TextStyle {
    pub fn new(size: f32, line_height: f32, weight: u16, rgba: Rgba) -> Self {
        Self {
            size,
            line_height,
            weight,
            rgba,
            align: TextAlign::Center,
            shadow: None,
            icon: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    SolidRect {
        rect: Rect,
        rgba: Rgba,
    },
    RoundedRect {
        rect: Rect,
        radius: f32,
        rgba: Rgba,
    },
    /// Top-to-bottom gradient; stop offsets are in 0..=1
    VerticalGradient {
        rect: Rect,
        stops: Vec<(f32, Rgba)>,
    },
    Image {
        rect: Rect,
        photo: PhotoHandle,
        fit: ImageFit,
    },
    /// Bordered circle showing a photo, or a person silhouette without one
    Medallion {
        cx: f32,
        cy: f32,
        radius: f32,
        border: f32,
        border_rgba: Rgba,
        fill_rgba: Rgba,
        silhouette_rgba: Rgba,
        photo: Option<PhotoHandle>,
    },
    /// `text` is the full run; `lines` is how the layout broke it.
    Text {
        rect: Rect,
        text: String,
        lines: Vec<String>,
        style: TextStyle,
    },
}

struct Px(f32);

impl fmt::Display for Px {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Normalize -0 so outlines stay stable
        write!(f, "{}", self.0 + 0.0)
    }
}

fn write_rect(f: &mut fmt::Formatter<'_>, r: &Rect) -> fmt::Result {
    write!(
        f,
        "{},{} {}x{}",
        Px(r.x),
        Px(r.y),
        Px(r.width),
        Px(r.height)
    )
}

fn write_rgba(f: &mut fmt::Formatter<'_>, (r, g, b, a): Rgba) -> fmt::Result {
    write!(f, "#{:02x}{:02x}{:02x}{:02x}", r, g, b, a)
}

/// One-line outline of the command, used for golden digests.
impl fmt::Display for PaintCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaintCommand::SolidRect { rect, rgba } => {
                f.write_str("solid ")?;
                write_rect(f, rect)?;
                f.write_str(" ")?;
                write_rgba(f, *rgba)
            }
            PaintCommand::RoundedRect { rect, radius, rgba } => {
                f.write_str("rounded ")?;
                write_rect(f, rect)?;
                write!(f, " r={} ", Px(*radius))?;
                write_rgba(f, *rgba)
            }
            PaintCommand::VerticalGradient { rect, stops } => {
                f.write_str("gradient ")?;
                write_rect(f, rect)?;
                for (pos, rgba) in stops {
                    write!(f, " {}:", Px(*pos))?;
                    write_rgba(f, *rgba)?;
                }
                Ok(())
            }
            PaintCommand::Image { rect, photo, fit } => {
                f.write_str("image ")?;
                write_rect(f, rect)?;
                write!(f, " {:?} {}x{}", fit, photo.width(), photo.height())
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
                write!(
                    f,
                    "medallion {},{} r={} border={} ",
                    Px(*cx),
                    Px(*cy),
                    Px(*radius),
                    Px(*border)
                )?;
                write_rgba(f, *border_rgba)?;
                f.write_str(" ")?;
                write_rgba(f, *fill_rgba)?;
                match photo {
                    Some(p) => write!(f, " photo {}x{}", p.width(), p.height()),
                    None => {
                        f.write_str(" silhouette ")?;
                        write_rgba(f, *silhouette_rgba)
                    }
                }
            }
            PaintCommand::Text { rect, lines, style, .. } => {
                f.write_str("text ")?;
                write_rect(f, rect)?;
                write!(
                    f,
                    " {}/{} w{} {:?} ",
                    Px(style.size),
                    Px(style.line_height),
                    style.weight,
                    style.align
                )?;
                write_rgba(f, style.rgba)?;
                if let Some(shadow) = style.shadow {
                    f.write_str(" shadow ")?;
                    write_rgba(f, shadow)?;
                }
                if let Some(icon) = style.icon {
                    write!(f, " icon={:?}", icon)?;
                }
                write!(f, " {:?}", lines.join(" | "))
            }
        }
    }
}
