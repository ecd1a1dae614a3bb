//! Preview rendering: story layout, paint commands and the built-in rasterizer.

pub mod layout;
pub mod paint;

#[cfg(feature = "skia")]
pub mod font;
#[cfg(feature = "skia")]
pub mod raster;

use base64::Engine as _;
use sha2::{Digest, Sha256};

use crate::state::StoryState;
use crate::{OutputFormat, Viewport};
use layout::{EstimatedMetrics, TextMeasure};
use paint::PaintCommand;

/// The realized visual tree of the preview: what the export rasterizes.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewTree {
    pub viewport: Viewport,
    pub commands: Vec<PaintCommand>,
}

impl PreviewTree {
    /// Every text run in paint order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|c| match c {
            PaintCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    /// Number of photo draws (background, logo, medallion photo).
    pub fn image_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| match c {
                PaintCommand::Image { .. } => true,
                PaintCommand::Medallion { photo, .. } => photo.is_some(),
                _ => false,
            })
            .count()
    }

    /// One line per paint command, headed by the viewport.
    pub fn outline(&self) -> String {
        let mut out = format!("viewport {}x{}\n", self.viewport.width, self.viewport.height);
        for cmd in &self.commands {
            out.push_str(&cmd.to_string());
            out.push('\n');
        }
        out
    }

    /// Content-addressed digest of the outline, used by golden tests.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.outline().as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// Render the story preview for `state` at the default 360x640 viewport.
///
/// Text is broken with [`EstimatedMetrics`]; use [`render_preview_measured`]
/// to break it with the fonts the export will paint with.
pub fn render_preview(state: &StoryState) -> PreviewTree {
    render_preview_with(state, Viewport::default())
}

pub fn render_preview_with(state: &StoryState, viewport: Viewport) -> PreviewTree {
    render_preview_measured(state, viewport, &EstimatedMetrics)
}

pub fn render_preview_measured(
    state: &StoryState,
    viewport: Viewport,
    measure: &dyn TextMeasure,
) -> PreviewTree {
    PreviewTree {
        viewport,
        commands: layout::layout_story(state, viewport, measure),
    }
}

/// Encoded output of one rasterization.
#[derive(Debug, Clone)]
pub struct Screenshot {
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
    pub data: Vec<u8>,
}

impl Screenshot {
    /// `data:` URL of the encoded bytes.
    pub fn data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.format.mime_type(),
            base64::engine::general_purpose::STANDARD.encode(&self.data)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::Field;

    #[test]
    fn data_url_carries_mime_and_payload() {
        let s = Screenshot {
            width: 1,
            height: 1,
            format: OutputFormat::Jpeg,
            data: vec![0xFF, 0xD8, 0xFF],
        };
        assert_eq!(s.data_url(), "data:image/jpeg;base64,/9j/");
    }

    #[test]
    fn digest_tracks_content() {
        let mut state = StoryState::new();
        let before = render_preview(&state).digest();
        assert_eq!(before, render_preview(&state).digest());
        Field::Price.apply(&mut state.listing, "100").unwrap();
        assert_ne!(before, render_preview(&state).digest());
    }

    #[test]
    fn outline_heads_with_viewport_and_lists_every_command() {
        let tree = render_preview(&StoryState::new());
        let outline = tree.outline();
        let mut lines = outline.lines();
        assert_eq!(lines.next(), Some("viewport 360x640"));
        assert_eq!(lines.next(), Some("solid 0,0 360x640 #334155ff"));
        assert_eq!(outline.lines().count(), tree.commands.len() + 1);
        assert!(outline
            .lines()
            .last()
            .is_some_and(|l| l.starts_with("medallion 180,320 r=72 border=8")));
    }

    #[test]
    fn empty_story_outline() {
        let expected = [
            r#"viewport 360x640"#,
            r#"solid 0,0 360x640 #334155ff"#,
            r#"text 0,308 360x24 16/24 w400 Center #94a3b8ff "Portföy Görseli Yüklenecek""#,
            r#"gradient 0,0 360x640 0:#4c1d95b3 0.5:#4c1d9580 1:#4c1d95e6"#,
            r#"rounded 60,32 240x40 r=6 #ffffff33"#,
            r#"text 60,42 240x20 14/20 w400 Center #ffffff99 "Logo Alanı""#,
            r#"text 24,88 312x75 30/37.5 w700 Center #ffffffff shadow #00000080 "30 Karakterlik İlan | Başlığı""#,
            r#"text 24,379 312x32 24/32 w700 Center #ffffffff "Ad Soyad""#,
            r#"text 24,415 312x24 16/24 w400 Center #e2e8f0ff icon=Phone "(5xx) xxx xx xx""#,
            r#"solid 24,455 312x1 #ffffff33"#,
            r#"text 24,512 312x24 16/24 w400 Center #e2e8f0ff icon=MapPin "İl, İlçe, Mahalle""#,
            r#"text 24,552 312x40 36/40 w800 Center #d4af37ff "Belirtilmemiş""#,
            r#"medallion 180,320 r=72 border=8 #ffffffff #e5e7ebff silhouette #9ca3afff"#,
        ];
        let outline = render_preview(&StoryState::new()).outline();
        assert_eq!(outline.lines().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn preview_reads_formatted_values() {
        let mut state = StoryState::new();
        Field::GsmNumber.apply(&mut state.listing, "5551234567").unwrap();
        let tree = render_preview(&state);
        assert!(tree.texts().any(|t| t == "(555) 123 45 67"));
        assert_eq!(tree.image_count(), 0);
    }
}
