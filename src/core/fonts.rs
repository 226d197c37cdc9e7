//! Font resolution with an ordered fallback chain.
//!
//! Each resolver produces candidate file paths for a requested family;
//! the chain tries them in order and the first face that loads wins.
//! Load failures are swallowed (logged at debug) and the chain moves on,
//! so resolution always returns a usable handle, worst case the built-in
//! bitmap face.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ab_glyph::FontArc;
use once_cell::sync::Lazy;
use parking_lot::Mutex;

/// Families advertised by `/fonts` even before any file is installed.
pub const DEFAULT_FAMILIES: &[&str] = &[
    "Noto Nastaliq Urdu",
    "Jameel Noori Nastaleeq",
    "Alvi Nastaleeq",
    "Nafees Web Naskh",
];

/// Known family names mapped to their conventional file names.
static FONT_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("Noto Nastaliq Urdu", "NotoNastaliqUrdu.ttf"),
        ("NotoNastaliqUrdu", "NotoNastaliqUrdu.ttf"),
        ("Jameel Noori Nastaleeq", "JameelNooriNastaleeq.ttf"),
        ("Nafees Web Naskh", "NafeesWebNaskh.ttf"),
    ])
});

const SYSTEM_FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/noto/NotoNastaliqUrdu-Regular.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/System/Library/Fonts/NotoNastaliqUrdu.ttc",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
];

const FONT_EXTENSIONS: &[&str] = &["ttf", "otf"];

/// A usable face for raster drawing: a parsed outline font, or the
/// fixed-size built-in bitmap face as the last resort.
#[derive(Clone)]
pub enum FontHandle {
    Outline(FontArc),
    Bitmap,
}

impl FontHandle {
    pub fn is_bitmap(&self) -> bool {
        matches!(self, Self::Bitmap)
    }
}

type Resolver = fn(&FontCatalog, &str) -> Vec<PathBuf>;

/// Candidate resolvers in priority order.
const RESOLVERS: &[Resolver] = &[
    FontCatalog::alias_candidates,
    FontCatalog::file_candidates,
    FontCatalog::system_candidates,
];

/// Looks up faces for requested family names under an injected font
/// directory, caching parsed faces per path.
#[derive(Clone)]
pub struct FontCatalog {
    font_dir: PathBuf,
    cache: Arc<Mutex<HashMap<PathBuf, FontArc>>>,
}

impl FontCatalog {
    pub fn new(font_dir: impl Into<PathBuf>) -> Self {
        Self {
            font_dir: font_dir.into(),
            cache: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn font_dir(&self) -> &Path {
        &self.font_dir
    }

    /// Resolve a family to a drawable face. Never fails.
    pub fn resolve(&self, family: &str) -> FontHandle {
        for resolver in RESOLVERS {
            for candidate in resolver(self, family) {
                if let Some(face) = self.load(&candidate) {
                    return FontHandle::Outline(face);
                }
            }
        }
        tracing::debug!(family, "no outline face found, using bitmap fallback");
        FontHandle::Bitmap
    }

    /// Candidate files from the font directory only (alias + probe
    /// tiers). The PDF path registers fonts from these and falls back to
    /// the built-in PDF face instead of the system tiers.
    pub fn local_candidates(&self, family: &str) -> Vec<PathBuf> {
        let mut paths = self.alias_candidates(family);
        paths.extend(self.file_candidates(family));
        paths
    }

    /// Load and cache the outline face at a path, absorbing failures.
    pub fn load(&self, path: &Path) -> Option<FontArc> {
        if let Some(face) = self.cache.lock().get(path) {
            return Some(face.clone());
        }
        let data = match fs::read(path) {
            Ok(data) => data,
            Err(err) => {
                tracing::debug!(path = %path.display(), %err, "font file unreadable");
                return None;
            }
        };
        match FontArc::try_from_vec(data) {
            Ok(face) => {
                self.cache
                    .lock()
                    .insert(path.to_path_buf(), face.clone());
                Some(face)
            }
            Err(err) => {
                tracing::debug!(path = %path.display(), %err, "font file unparsable");
                None
            }
        }
    }

    /// Default family names plus the stems of any font files installed
    /// in the font directory, deduplicated.
    pub fn list_families(&self) -> Vec<String> {
        let mut families: Vec<String> =
            DEFAULT_FAMILIES.iter().map(|f| f.to_string()).collect();
        if let Ok(entries) = fs::read_dir(&self.font_dir) {
            let mut discovered: Vec<String> = entries
                .flatten()
                .filter_map(|entry| {
                    let path = entry.path();
                    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
                    if !FONT_EXTENSIONS.contains(&ext.as_str()) {
                        return None;
                    }
                    Some(path.file_stem()?.to_str()?.to_string())
                })
                .collect();
            discovered.sort();
            for name in discovered {
                if !families.contains(&name) {
                    families.push(name);
                }
            }
        }
        families
    }

    fn alias_candidates(&self, family: &str) -> Vec<PathBuf> {
        FONT_ALIASES
            .get(family)
            .map(|file| vec![self.font_dir.join(file)])
            .unwrap_or_default()
    }

    fn file_candidates(&self, family: &str) -> Vec<PathBuf> {
        let compact = family.replace(' ', "");
        let stripped = compact.replace('-', "");
        let mut stems = vec![family.to_string()];
        for variant in [compact, stripped] {
            if !stems.contains(&variant) {
                stems.push(variant);
            }
        }
        let mut paths = Vec::new();
        for stem in &stems {
            for ext in FONT_EXTENSIONS {
                paths.push(self.font_dir.join(format!("{stem}.{ext}")));
            }
        }
        paths
    }

    fn system_candidates(&self, _family: &str) -> Vec<PathBuf> {
        SYSTEM_FONT_PATHS.iter().map(PathBuf::from).collect()
    }
}
