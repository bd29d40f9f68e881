//! Runtime TTF loading for chart text.
//!
//! Plotters draws text through `ab_glyph`, which needs font bytes registered up
//! front. Registration is process-wide, so it happens at most once; the first
//! caller's preferred path wins.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use plotters::style::{FontStyle, register_font};
use tracing::{debug, warn};

pub const FAMILY: &str = "sans-serif";

const CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

static REGISTERED: OnceLock<Option<PathBuf>> = OnceLock::new();

/// Make a font available under [`FAMILY`]; returns whether text can be drawn.
pub fn ensure_registered(preferred: Option<&Path>) -> bool {
    REGISTERED
        .get_or_init(|| {
            let found = resolve(preferred).and_then(|path| register(&path).then_some(path));
            match &found {
                Some(path) => debug!(font = %path.display(), "chart font registered"),
                None => warn!("no usable TTF font found; chart text will be omitted"),
            }
            found
        })
        .is_some()
}

/// Preferred path if it exists, else the first existing system candidate.
pub fn resolve(preferred: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = preferred {
        if path.is_file() {
            return Some(path.to_path_buf());
        }
        warn!(font = %path.display(), "configured font not found, searching system fonts");
    }
    CANDIDATES.iter().map(PathBuf::from).find(|p| p.is_file())
}

fn register(path: &Path) -> bool {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(font = %path.display(), error = %e, "failed to read font");
            return false;
        }
    };
    // ab_glyph keeps a 'static reference; this runs once per process.
    let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
    for style in [FontStyle::Normal, FontStyle::Bold] {
        if register_font(FAMILY, style, bytes).is_err() {
            warn!(font = %path.display(), "font rejected: not a valid TTF/OTF file");
            return false;
        }
    }
    true
}
