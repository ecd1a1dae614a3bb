//! Story card layout: turns the session state into paint commands.
//!
//! All measurements are logical pixels on the 360x640 card. Text is broken
//! into lines here, against a [`TextMeasure`], so the bottom section can
//! stack upward from the real line counts.

use log::warn;

use crate::format::{display_phone, display_price};
use crate::rendering::paint::{IconKind, ImageFit, PaintCommand, Rgba, TextAlign, TextStyle};
use crate::state::StoryState;
use crate::Viewport;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }
}

pub const SLATE_700: Rgba = (51, 65, 85, 255);
pub const SLATE_400: Rgba = (148, 163, 184, 255);
pub const SLATE_200: Rgba = (226, 232, 240, 255);
pub const GRAY_200: Rgba = (229, 231, 235, 255);
pub const GRAY_400: Rgba = (156, 163, 175, 255);
pub const WHITE: Rgba = (255, 255, 255, 255);
pub const WHITE_20: Rgba = (255, 255, 255, 51);
pub const WHITE_60: Rgba = (255, 255, 255, 153);
pub const BRAND_VIOLET: (u8, u8, u8) = (76, 29, 149);
pub const BRAND_GOLD: Rgba = (212, 175, 55, 255);
pub const TEXT_SHADOW: Rgba = (0, 0, 0, 128);

pub const PORTFOLIO_PLACEHOLDER: &str = "Portföy Görseli Yüklenecek";
pub const LOGO_PLACEHOLDER: &str = "Logo Alanı";
pub const HEADLINE_FALLBACK: &str = "İlan Başlığı";
pub const NAME_FALLBACK: &str = "Ad Soyad";
pub const PHONE_FALLBACK: &str = "(5xx) xxx xx xx";

/// Appended to the last kept line when a run needs more lines than allowed.
pub const ELLIPSIS: char = '…';

/// Space between an inline icon and its text.
pub const ICON_GAP: f32 = 8.0;

pub const HEADLINE_MAX_LINES: usize = 2;
pub const NAME_MAX_LINES: usize = 3;
pub const LOCATION_MAX_LINES: usize = 3;
pub const TAG_MAX_LINES: usize = 2;
pub const PRICE_MAX_LINES: usize = 2;

const PADDING_X: f32 = 24.0;
const PADDING_TOP: f32 = 32.0;
const PADDING_BOTTOM: f32 = 48.0;
const LOGO_WIDTH: f32 = 240.0;
const LOGO_PLACEHOLDER_HEIGHT: f32 = 40.0;
const MEDALLION_SIZE: f32 = 144.0;
const MEDALLION_BORDER: f32 = 8.0;
const TAG_GAP: f32 = 16.0;

/// Horizontal extent of text runs.
pub trait TextMeasure {
    /// Advance width of `text` at `size` px and CSS `weight`.
    fn text_width(&self, text: &str, size: f32, weight: u16) -> f32;
}

/// Font-free width estimate from per-character em fractions.
///
/// Slightly wider than typical sans faces, so lines broken with it still fit
/// when painted with a real font.
#[derive(Debug, Clone, Copy, Default)]
pub struct EstimatedMetrics;

impl TextMeasure for EstimatedMetrics {
    fn text_width(&self, text: &str, size: f32, weight: u16) -> f32 {
        let ems: f32 = text.chars().map(char_em).sum();
        let bold = if weight >= 700 { 1.0625 } else { 1.0 };
        ems * size * bold
    }
}

fn char_em(ch: char) -> f32 {
    match ch {
        ' ' => 0.25,
        'i' | 'ı' | 'j' | 'l' | 'I' | 'İ' | '.' | ',' | ':' | ';' | '\'' | '!' | '|' => 0.3125,
        'M' | 'W' | 'm' | 'w' => 0.875,
        '0'..='9' => 0.625,
        c if c.is_uppercase() => 0.6875,
        _ => 0.5625,
    }
}

fn violet(alpha: f32) -> Rgba {
    let (r, g, b) = BRAND_VIOLET;
    (r, g, b, (alpha * 255.0).round() as u8)
}

/// Break `text` for a box of `width`, logging when it had to be ellipsized.
fn break_lines(
    measure: &dyn TextMeasure,
    text: &str,
    width: f32,
    max_lines: usize,
    style: &TextStyle,
) -> Vec<String> {
    let icon_w = if style.icon.is_some() {
        style.size + ICON_GAP
    } else {
        0.0
    };
    let wrapped = wrap_text(text, (width - icon_w).max(0.0), max_lines, |s| {
        measure.text_width(s, style.size, style.weight)
    });
    if wrapped.truncated {
        warn!(
            "Text {:?} needs more than {} line(s); painting it ellipsized",
            text, max_lines
        );
    }
    wrapped.lines
}

/// Height of a block of `lines` (at least one line tall).
fn block_height(lines: &[String], style: &TextStyle) -> f32 {
    lines.len().max(1) as f32 * style.line_height
}

/// Lay out the story card for `state` inside `viewport`.
///
/// Paint order matches the visual stacking: background, overlay, top
/// section, bottom section, then the medallion above everything.
pub fn layout_story(
    state: &StoryState,
    viewport: Viewport,
    measure: &dyn TextMeasure,
) -> Vec<PaintCommand> {
    let width = viewport.width as f32;
    let height = viewport.height as f32;
    let card = Rect::new(0.0, 0.0, width, height);
    let content_w = (width - 2.0 * PADDING_X).max(0.0);
    let listing = &state.listing;
    let mut cmds = Vec::new();

    cmds.push(PaintCommand::SolidRect {
        rect: card,
        rgba: SLATE_700,
    });

    match &state.photos.portfolio {
        Some(photo) => cmds.push(PaintCommand::Image {
            rect: card,
            photo: photo.clone(),
            fit: ImageFit::Cover,
        }),
        None => {
            let style = TextStyle::new(16.0, 24.0, 400, SLATE_400);
            let lines = break_lines(measure, PORTFOLIO_PLACEHOLDER, width, 1, &style);
            cmds.push(PaintCommand::Text {
                rect: Rect::new(0.0, (height - 24.0) / 2.0, width, 24.0),
                text: PORTFOLIO_PLACEHOLDER.to_string(),
                lines,
                style,
            });
        }
    }

    // Bottom reads darkest so the price stays legible
    cmds.push(PaintCommand::VerticalGradient {
        rect: card,
        stops: vec![(0.0, violet(0.7)), (0.5, violet(0.5)), (1.0, violet(0.9))],
    });

    // Top section
    let logo_x = (width - LOGO_WIDTH) / 2.0;
    let logo_h = match &state.photos.logo {
        Some(logo) if logo.width() > 0 => {
            let h = LOGO_WIDTH * logo.height() as f32 / logo.width() as f32;
            cmds.push(PaintCommand::Image {
                rect: Rect::new(logo_x, PADDING_TOP, LOGO_WIDTH, h),
                photo: logo.clone(),
                fit: ImageFit::Stretch,
            });
            h
        }
        _ => {
            let rect = Rect::new(logo_x, PADDING_TOP, LOGO_WIDTH, LOGO_PLACEHOLDER_HEIGHT);
            cmds.push(PaintCommand::RoundedRect {
                rect,
                radius: 6.0,
                rgba: WHITE_20,
            });
            let style = TextStyle::new(14.0, 20.0, 400, WHITE_60);
            let lines = break_lines(measure, LOGO_PLACEHOLDER, rect.width, 1, &style);
            cmds.push(PaintCommand::Text {
                rect: Rect::new(rect.x, rect.y + 10.0, rect.width, 20.0),
                text: LOGO_PLACEHOLDER.to_string(),
                lines,
                style,
            });
            LOGO_PLACEHOLDER_HEIGHT
        }
    };

    let headline = if listing.headline.is_empty() {
        HEADLINE_FALLBACK
    } else {
        listing.headline.as_str()
    };
    let mut headline_style = TextStyle::new(30.0, 37.5, 700, WHITE);
    headline_style.shadow = Some(TEXT_SHADOW);
    let headline_lines = break_lines(
        measure,
        headline,
        content_w,
        HEADLINE_MAX_LINES,
        &headline_style,
    );
    cmds.push(PaintCommand::Text {
        rect: Rect::new(
            PADDING_X,
            PADDING_TOP + logo_h + 16.0,
            content_w,
            block_height(&headline_lines, &headline_style),
        ),
        text: headline.to_string(),
        lines: headline_lines,
        style: headline_style,
    });

    // Bottom section, stacked upwards from the bottom padding
    let price_text = display_price(&listing.price);
    let price_style = TextStyle::new(36.0, 40.0, 800, BRAND_GOLD);
    let price_lines = break_lines(measure, &price_text, content_w, PRICE_MAX_LINES, &price_style);
    let price_h = block_height(&price_lines, &price_style);
    let price = Rect::new(PADDING_X, height - PADDING_BOTTOM - price_h, content_w, price_h);

    let mut location_style = TextStyle::new(16.0, 24.0, 400, SLATE_200);
    location_style.icon = Some(IconKind::MapPin);
    let location_lines = break_lines(
        measure,
        &listing.location,
        content_w,
        LOCATION_MAX_LINES,
        &location_style,
    );
    let location_h = block_height(&location_lines, &location_style);
    let location = Rect::new(PADDING_X, price.y - 16.0 - location_h, content_w, location_h);

    let col_w = ((content_w - TAG_GAP) / 2.0).max(0.0);
    let tag_style = TextStyle::new(18.0, 28.0, 700, WHITE);
    let tags: Vec<(f32, &str, Vec<String>)> = [
        (PADDING_X, listing.listing_type.map(|t| t.label())),
        (PADDING_X + col_w + TAG_GAP, listing.portfolio_type.map(|t| t.label())),
    ]
    .into_iter()
    .filter_map(|(x, label)| {
        label.map(|l| (x, l, break_lines(measure, l, col_w, TAG_MAX_LINES, &tag_style)))
    })
    .collect();
    let tag_lines = tags.iter().map(|(_, _, l)| l.len()).max().unwrap_or(1).max(1);
    let tags_h = tag_lines as f32 * tag_style.line_height;
    let tags_y = location.y - 12.0 - tags_h;

    let rule = Rect::new(PADDING_X, tags_y - 16.0 - 1.0, content_w, 1.0);

    let phone_text = match display_phone(&listing.gsm_number) {
        s if s.is_empty() => PHONE_FALLBACK.to_string(),
        s => s,
    };
    let mut phone_style = TextStyle::new(16.0, 24.0, 400, SLATE_200);
    phone_style.icon = Some(IconKind::Phone);
    let phone_lines = break_lines(measure, &phone_text, content_w, 1, &phone_style);
    let phone = Rect::new(PADDING_X, rule.y - 16.0 - 24.0, content_w, 24.0);

    let consultant = if listing.consultant_name.is_empty() {
        NAME_FALLBACK
    } else {
        listing.consultant_name.as_str()
    };
    let name_style = TextStyle::new(24.0, 32.0, 700, WHITE);
    let name_lines = break_lines(measure, consultant, content_w, NAME_MAX_LINES, &name_style);
    let name_h = block_height(&name_lines, &name_style);
    let name = Rect::new(PADDING_X, phone.y - 4.0 - name_h, content_w, name_h);

    cmds.push(PaintCommand::Text {
        rect: name,
        text: consultant.to_string(),
        lines: name_lines,
        style: name_style,
    });

    cmds.push(PaintCommand::Text {
        rect: phone,
        text: phone_text,
        lines: phone_lines,
        style: phone_style,
    });

    cmds.push(PaintCommand::SolidRect {
        rect: rule,
        rgba: WHITE_20,
    });

    for (x, label, lines) in tags {
        cmds.push(PaintCommand::Text {
            rect: Rect::new(x, tags_y, col_w, tags_h),
            text: label.to_string(),
            lines,
            style: tag_style.clone(),
        });
    }

    if !listing.location.is_empty() {
        cmds.push(PaintCommand::Text {
            rect: location,
            text: listing.location.clone(),
            lines: location_lines,
            style: location_style,
        });
    }

    cmds.push(PaintCommand::Text {
        rect: price,
        text: price_text,
        lines: price_lines,
        style: price_style,
    });

    cmds.push(PaintCommand::Medallion {
        cx: width / 2.0,
        cy: height / 2.0,
        radius: MEDALLION_SIZE / 2.0,
        border: MEDALLION_BORDER,
        border_rgba: WHITE,
        fill_rgba: GRAY_200,
        silhouette_rgba: GRAY_400,
        photo: state.photos.consultant.clone(),
    });

    cmds
}

/// Lines produced by [`wrap_text`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WrappedText {
    pub lines: Vec<String>,
    /// Lines past the limit were dropped and the last kept line ellipsized.
    pub truncated: bool,
}

/// Greedy word wrap against a width measure.
///
/// Words wider than `max_width` get a line of their own. When more than
/// `max_lines` lines are needed, the rest is replaced by [`ELLIPSIS`] on the
/// last kept line.
pub fn wrap_text<F>(text: &str, max_width: f32, max_lines: usize, measure: F) -> WrappedText
where
    F: Fn(&str) -> f32,
{
    let mut lines = Vec::new();
    let mut cur = String::new();
    for word in text.split_whitespace() {
        if cur.is_empty() {
            cur.push_str(word);
            continue;
        }
        let candidate = format!("{} {}", cur, word);
        if measure(&candidate) > max_width {
            lines.push(std::mem::replace(&mut cur, word.to_string()));
        } else {
            cur = candidate;
        }
    }
    if !cur.is_empty() {
        lines.push(cur);
    }

    let max_lines = max_lines.max(1);
    if lines.len() <= max_lines {
        return WrappedText {
            lines,
            truncated: false,
        };
    }
    lines.truncate(max_lines);
    if let Some(last) = lines.last_mut() {
        ellipsize(last, max_width, &measure);
    }
    WrappedText {
        lines,
        truncated: true,
    }
}

fn ellipsize<F>(line: &mut String, max_width: f32, measure: &F)
where
    F: Fn(&str) -> f32,
{
    loop {
        let candidate = format!("{}{}", line.trim_end(), ELLIPSIS);
        if line.chars().count() <= 1 || measure(&candidate) <= max_width {
            *line = candidate;
            return;
        }
        line.pop();
    }
}

/// Left edge of a run of `run_width` inside `rect` for the given alignment.
pub fn aligned_x(rect: &Rect, run_width: f32, align: TextAlign) -> f32 {
    match align {
        TextAlign::Left => rect.x,
        TextAlign::Center => rect.center_x() - run_width / 2.0,
    }
}
