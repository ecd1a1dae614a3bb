//! Font discovery and glyph outlines for the rasterizer.
//!
//! Faces are found through `fontdb` (an optional font file first, then the
//! system fonts), parsed with `ttf-parser`, and their outlines are emitted as
//! `tiny-skia` paths in card coordinates.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use log::{debug, warn};
use tiny_skia::PathBuilder;

use crate::rendering::layout::{EstimatedMetrics, TextMeasure};
use crate::{Error, Result};

/// Weights the story layout asks for.
pub const STORY_WEIGHTS: [u16; 3] = [400, 700, 800];

/// Raw bytes of one face inside a font file or collection.
#[derive(Clone)]
pub struct LoadedFace {
    data: Arc<[u8]>,
    index: u32,
}

impl LoadedFace {
    pub fn from_bytes(data: Vec<u8>, index: u32) -> Result<Self> {
        ttf_parser::Face::parse(&data, index)
            .map_err(|e| Error::FontError(format!("unparseable face: {}", e)))?;
        Ok(Self {
            data: Arc::from(data),
            index,
        })
    }

    pub fn parse(&self) -> Option<ttf_parser::Face<'_>> {
        ttf_parser::Face::parse(&self.data, self.index).ok()
    }
}

/// Faces resolved once per rasterizer, keyed by weight.
#[derive(Clone)]
pub struct FontSystem {
    faces: HashMap<u16, LoadedFace>,
}

impl FontSystem {
    /// Resolve faces for the story weights from `families`, in priority order.
    ///
    /// A system without usable fonts yields an empty font system rather than
    /// an error; text is then skipped when painting.
    pub fn new(families: &[String], font_file: Option<&Path>, system_fonts: bool) -> Result<Self> {
        let mut db = Database::new();
        let mut file_family: Option<String> = None;
        if let Some(path) = font_file {
            db.load_font_file(path)
                .map_err(|e| Error::FontError(format!("{}: {}", path.display(), e)))?;
            file_family = db
                .faces()
                .next()
                .and_then(|f| f.families.first().map(|(name, _)| name.clone()));
        }
        if system_fonts {
            db.load_system_fonts();
        }

        let mut names: Vec<Family<'_>> = Vec::new();
        // An explicit font file wins over the configured families
        if let Some(name) = file_family.as_deref() {
            names.push(Family::Name(name));
        }
        for f in families {
            let s = f.trim();
            if s.eq_ignore_ascii_case("sans-serif") || s.eq_ignore_ascii_case("sans") {
                names.push(Family::SansSerif);
            } else if s.eq_ignore_ascii_case("serif") {
                names.push(Family::Serif);
            } else if !s.is_empty() {
                names.push(Family::Name(s));
            }
        }
        names.push(Family::SansSerif);

        let mut faces = HashMap::new();
        for weight in STORY_WEIGHTS {
            let query = Query {
                families: &names,
                weight: Weight(weight),
                stretch: Stretch::Normal,
                style: Style::Normal,
            };
            let id = db.query(&query).or_else(|| db.faces().next().map(|f| f.id));
            let Some(id) = id else {
                continue;
            };
            let loaded = db.with_face_data(id, |data, index| LoadedFace::from_bytes(data.to_vec(), index));
            match loaded {
                Some(Ok(face)) => {
                    debug!("Resolved weight {} to face {:?}", weight, id);
                    faces.insert(weight, face);
                }
                Some(Err(e)) => warn!("Skipping face for weight {}: {}", weight, e),
                None => warn!("Face {:?} has no data", id),
            }
        }

        if faces.is_empty() {
            warn!("No usable fonts found; story text will not be painted");
        }
        Ok(Self { faces })
    }

    /// A font system over a single face used for every weight.
    pub fn from_face(face: LoadedFace) -> Self {
        let faces = STORY_WEIGHTS.iter().map(|w| (*w, face.clone())).collect();
        Self { faces }
    }

    pub fn empty() -> Self {
        Self {
            faces: HashMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Closest resolved face to `weight`.
    pub fn face(&self, weight: u16) -> Option<&LoadedFace> {
        self.faces.get(&weight).or_else(|| {
            self.faces
                .iter()
                .min_by_key(|(w, _)| w.abs_diff(weight))
                .map(|(_, f)| f)
        })
    }
}

/// Layout measure backed by the resolved faces. Weights without a face fall
/// back to the estimate.
impl TextMeasure for FontSystem {
    fn text_width(&self, text: &str, size: f32, weight: u16) -> f32 {
        match self.face(weight).and_then(|f| f.parse()) {
            Some(face) => measure(&face, text, size),
            None => EstimatedMetrics.text_width(text, size, weight),
        }
    }
}

/// Horizontal advance of `text` at `size` px.
pub fn measure(face: &ttf_parser::Face<'_>, text: &str, size: f32) -> f32 {
    text.chars().map(|ch| advance(face, ch, size)).sum()
}

fn advance(face: &ttf_parser::Face<'_>, ch: char, size: f32) -> f32 {
    let scale = size / face.units_per_em() as f32;
    match face.glyph_index(ch).and_then(|g| face.glyph_hor_advance(g)) {
        Some(adv) => adv as f32 * scale,
        // Missing glyphs keep half an em so spacing stays readable
        None => size * 0.5,
    }
}

/// Baseline offset from the top of a line box of `line_height`.
pub fn baseline_offset(face: &ttf_parser::Face<'_>, size: f32, line_height: f32) -> f32 {
    let scale = size / face.units_per_em() as f32;
    let ascent = face.ascender() as f32 * scale;
    let descent = face.descender() as f32 * scale;
    (line_height - (ascent - descent)) / 2.0 + ascent
}

/// Outline of `text` starting at `x` on `baseline`, or `None` when nothing
/// in the run has an outline (e.g. only spaces).
pub fn text_path(
    face: &ttf_parser::Face<'_>,
    text: &str,
    size: f32,
    x: f32,
    baseline: f32,
) -> Option<tiny_skia::Path> {
    let mut sink = OutlineSink {
        pb: PathBuilder::new(),
        scale: size / face.units_per_em() as f32,
        dx: x,
        baseline,
    };
    for ch in text.chars() {
        if let Some(gid) = face.glyph_index(ch) {
            face.outline_glyph(gid, &mut sink);
        }
        sink.dx += advance(face, ch, size);
    }
    sink.pb.finish()
}

/// Maps font units (y up) into card pixels (y down).
struct OutlineSink {
    pb: PathBuilder,
    scale: f32,
    dx: f32,
    baseline: f32,
}

impl OutlineSink {
    fn pt(&self, x: f32, y: f32) -> (f32, f32) {
        (self.dx + x * self.scale, self.baseline - y * self.scale)
    }
}

impl ttf_parser::OutlineBuilder for OutlineSink {
    fn move_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.pt(x, y);
        self.pb.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.pt(x, y);
        self.pb.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (x1, y1) = self.pt(x1, y1);
        let (x, y) = self.pt(x, y);
        self.pb.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (x1, y1) = self.pt(x1, y1);
        let (x2, y2) = self.pt(x2, y2);
        let (x, y) = self.pt(x, y);
        self.pb.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.pb.close();
    }
}
