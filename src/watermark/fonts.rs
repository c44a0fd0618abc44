//! Font discovery and resolution.
//!
//! A [`FontResolver`] turns a family name (or a font file path) plus style
//! flags into a [`FontHandle`]. Resolution never fails: when nothing on the
//! system matches, the built-in bitmap font is returned.
//!
//! Resolution order:
//! 1. The family is a path to an existing font file, or a known family whose
//!    regular/bold/italic/bold-italic file is in the index.
//! 2. Normalized-name lookup in the index of installed font files.
//! 3. The configured fallback families, in order.
//! 4. The built-in bitmap font.
//!
//! The index is built lazily on first use and never changes afterwards.

use ab_glyph::FontVec;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// File extensions considered font files.
const FONT_EXTENSIONS: &[&str] = &["ttf", "ttc", "otf"];

/// Requested font style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontStyle {
    Regular,
    Bold,
    Italic,
    BoldItalic,
}

impl FontStyle {
    pub fn from_flags(bold: bool, italic: bool) -> Self {
        match (bold, italic) {
            (false, false) => Self::Regular,
            (true, false) => Self::Bold,
            (false, true) => Self::Italic,
            (true, true) => Self::BoldItalic,
        }
    }

    fn slot(self) -> usize {
        match self {
            Self::Regular => 0,
            Self::Bold => 1,
            Self::Italic => 2,
            Self::BoldItalic => 3,
        }
    }

    fn is_bold(self) -> bool {
        matches!(self, Self::Bold | Self::BoldItalic)
    }

    fn is_italic(self) -> bool {
        matches!(self, Self::Italic | Self::BoldItalic)
    }
}

/// A family with well-known per-style file names.
struct KnownFamily {
    names: &'static [&'static str],
    /// Regular, bold, italic, bold-italic
    files: [&'static str; 4],
}

impl KnownFamily {
    /// Which of the requested styles the variant file for `style` really carries.
    ///
    /// A slot only carries bold if its file differs from the same slot without
    /// bold; likewise for italic.
    fn variant_styles(&self, style: FontStyle) -> (bool, bool) {
        let file = self.files[style.slot()];
        let differs = |other: FontStyle| !file.eq_ignore_ascii_case(self.files[other.slot()]);
        (
            style.is_bold() && differs(FontStyle::from_flags(false, style.is_italic())),
            style.is_italic() && differs(FontStyle::from_flags(style.is_bold(), false)),
        )
    }
}

const KNOWN_FAMILIES: &[KnownFamily] = &[
    KnownFamily {
        names: &["Arial"],
        files: ["arial.ttf", "arialbd.ttf", "ariali.ttf", "arialbi.ttf"],
    },
    KnownFamily {
        names: &["Times New Roman"],
        files: ["times.ttf", "timesbd.ttf", "timesi.ttf", "timesbi.ttf"],
    },
    KnownFamily {
        names: &["Courier New"],
        files: ["cour.ttf", "courbd.ttf", "couri.ttf", "courbi.ttf"],
    },
    KnownFamily {
        names: &["Verdana"],
        files: ["verdana.ttf", "verdanab.ttf", "verdanai.ttf", "verdanaz.ttf"],
    },
    KnownFamily {
        names: &["Microsoft YaHei", "微软雅黑"],
        files: ["msyh.ttc", "msyhbd.ttc", "msyh.ttc", "msyhbd.ttc"],
    },
    KnownFamily {
        names: &["SimSun", "宋体"],
        files: ["simsun.ttc", "simsun.ttc", "simsun.ttc", "simsun.ttc"],
    },
    KnownFamily {
        names: &["SimHei", "黑体"],
        files: ["simhei.ttf", "simhei.ttf", "simhei.ttf", "simhei.ttf"],
    },
    KnownFamily {
        names: &["KaiTi", "楷体"],
        files: ["simkai.ttf", "simkai.ttf", "simkai.ttf", "simkai.ttf"],
    },
    KnownFamily {
        names: &["DejaVu Sans"],
        files: [
            "DejaVuSans.ttf",
            "DejaVuSans-Bold.ttf",
            "DejaVuSans-Oblique.ttf",
            "DejaVuSans-BoldOblique.ttf",
        ],
    },
    KnownFamily {
        names: &["Liberation Sans"],
        files: [
            "LiberationSans-Regular.ttf",
            "LiberationSans-Bold.ttf",
            "LiberationSans-Italic.ttf",
            "LiberationSans-BoldItalic.ttf",
        ],
    },
];

/// Fallback families tried when the requested family cannot be found.
pub fn default_fallback_families() -> Vec<String> {
    ["Microsoft YaHei", "SimSun", "SimHei", "Arial", "DejaVu Sans", "Liberation Sans"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Platform font directories.
pub fn default_font_directories() -> Vec<PathBuf> {
    let home = std::env::var_os("HOME").map(PathBuf::from);
    let mut dirs = Vec::new();

    if cfg!(target_os = "windows") {
        let windir = std::env::var_os("WINDIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("C:\\Windows"));
        dirs.push(windir.join("Fonts"));
        if let Some(local) = std::env::var_os("LOCALAPPDATA") {
            dirs.push(PathBuf::from(local).join("Microsoft").join("Windows").join("Fonts"));
        }
    } else if cfg!(target_os = "macos") {
        dirs.push(PathBuf::from("/System/Library/Fonts"));
        dirs.push(PathBuf::from("/Library/Fonts"));
        if let Some(home) = &home {
            dirs.push(home.join("Library/Fonts"));
        }
    } else {
        dirs.push(PathBuf::from("/usr/share/fonts"));
        dirs.push(PathBuf::from("/usr/local/share/fonts"));
        if let Some(home) = &home {
            dirs.push(home.join(".fonts"));
            dirs.push(home.join(".local/share/fonts"));
        }
    }

    dirs
}

/// Lowercase and strip separators: "DejaVu Sans-Bold" -> "dejavusansbold".
fn compact(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

fn is_font_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| FONT_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Index of installed font files keyed by normalized name.
#[derive(Debug, Default, Clone)]
pub struct FontIndex {
    entries: HashMap<String, PathBuf>,
}

impl FontIndex {
    /// Scan directories recursively for font files.
    ///
    /// Missing or unreadable directories are skipped.
    pub fn build(directories: &[PathBuf]) -> Self {
        let files = directories.iter().flat_map(|dir| {
            WalkDir::new(dir)
                .follow_links(true)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file() && is_font_file(e.path()))
                .map(|e| e.into_path())
        });
        Self::from_paths(files)
    }

    /// Build an index from explicit file paths.
    ///
    /// When two files share a key the first one wins.
    pub fn from_paths(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut entries = HashMap::new();
        for path in paths {
            for key in Self::keys_for(&path) {
                entries.entry(key).or_insert_with(|| path.clone());
            }
        }
        Self { entries }
    }

    fn keys_for(path: &Path) -> Vec<String> {
        let mut keys = Vec::with_capacity(3);
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            keys.push(name.to_lowercase());
        }
        if let Some(stem) = path.file_stem().and_then(|n| n.to_str()) {
            keys.push(stem.to_lowercase());
            keys.push(compact(stem));
        }
        keys
    }

    /// Look up a family or file name.
    ///
    /// Tries the lowercase name, then variants with spaces removed or
    /// replaced by `-` / `_`, then the fully compacted form.
    pub fn lookup(&self, name: &str) -> Option<&Path> {
        let lower = name.trim().to_lowercase();
        if lower.is_empty() {
            return None;
        }
        let candidates = [
            lower.clone(),
            lower.replace(' ', ""),
            lower.replace(' ', "-"),
            lower.replace(' ', "_"),
            compact(&lower),
        ];
        candidates
            .iter()
            .find_map(|key| self.entries.get(key))
            .map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A loaded font face.
#[derive(Clone)]
pub enum FontFace {
    /// TrueType / OpenType outlines
    Outline(Arc<FontVec>),
    /// The built-in 5x7 bitmap font
    Builtin,
}

impl fmt::Debug for FontFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Outline(_) => f.write_str("Outline"),
            Self::Builtin => f.write_str("Builtin"),
        }
    }
}

/// A face plus the style effects that must be simulated when drawing.
#[derive(Debug, Clone)]
pub struct FontHandle {
    pub face: FontFace,
    /// Bold was requested but the face is not a bold face.
    pub synthetic_bold: bool,
    /// Italic was requested but the face is not an italic face.
    pub synthetic_italic: bool,
}

impl FontHandle {
    /// Built-in bitmap font with both styles simulated as requested.
    pub fn builtin(bold: bool, italic: bool) -> Self {
        Self {
            face: FontFace::Builtin,
            synthetic_bold: bold,
            synthetic_italic: italic,
        }
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self.face, FontFace::Builtin)
    }
}

/// Result of font resolution.
#[derive(Debug, Clone)]
pub enum FontResolution {
    /// The requested family (or file) was found.
    Resolved(FontHandle),
    /// A fallback family or the built-in font is used instead.
    Fallback(FontHandle),
}

impl FontResolution {
    pub fn handle(&self) -> &FontHandle {
        match self {
            Self::Resolved(handle) | Self::Fallback(handle) => handle,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

/// Resolves font families to loaded faces.
///
/// Owns a lazily built [`FontIndex`] and a cache of parsed faces, so a batch
/// parses each font file once.
pub struct FontResolver {
    directories: Vec<PathBuf>,
    fallback_families: Vec<String>,
    index: OnceLock<FontIndex>,
    faces: Mutex<HashMap<PathBuf, Option<Arc<FontVec>>>>,
}

impl fmt::Debug for FontResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontResolver")
            .field("directories", &self.directories)
            .field("fallback_families", &self.fallback_families)
            .field("indexed", &self.index.get().map(FontIndex::len))
            .finish()
    }
}

impl Default for FontResolver {
    fn default() -> Self {
        Self::new(default_font_directories(), default_fallback_families())
    }
}

impl FontResolver {
    pub fn new(directories: Vec<PathBuf>, fallback_families: Vec<String>) -> Self {
        Self {
            directories,
            fallback_families,
            index: OnceLock::new(),
            faces: Mutex::new(HashMap::new()),
        }
    }

    /// A resolver with no font directories; only explicit font file paths
    /// resolve, everything else uses the built-in font.
    pub fn builtin_only() -> Self {
        Self::new(Vec::new(), Vec::new())
    }

    /// The font index, built on first access.
    pub fn index(&self) -> &FontIndex {
        self.index.get_or_init(|| {
            let index = FontIndex::build(&self.directories);
            debug!(
                directories = self.directories.len(),
                entries = index.len(),
                "Built font index"
            );
            index
        })
    }

    /// Resolve a family name or font file path.
    pub fn resolve(&self, family: &str, bold: bool, italic: bool) -> FontResolution {
        let style = FontStyle::from_flags(bold, italic);

        if let Some(handle) = self.resolve_family(family, style) {
            debug!(family = %family, ?style, "Resolved font");
            return FontResolution::Resolved(handle);
        }

        for fallback in &self.fallback_families {
            if let Some(handle) = self.resolve_family(fallback, style) {
                debug!(family = %family, fallback = %fallback, "Using fallback font");
                return FontResolution::Fallback(handle);
            }
        }

        warn!(family = %family, "No usable font found, using built-in bitmap font");
        FontResolution::Fallback(FontHandle::builtin(bold, italic))
    }

    fn resolve_family(&self, family: &str, style: FontStyle) -> Option<FontHandle> {
        let path = Path::new(family);
        if is_font_file(path) && path.is_file() {
            return self.handle_for(path, style, false, false);
        }

        if let Some(known) = find_known_family(family) {
            let wanted = known.files[style.slot()];
            let regular = known.files[FontStyle::Regular.slot()];
            if let Some(found) = self.index().lookup(wanted) {
                let (real_bold, real_italic) = known.variant_styles(style);
                if let Some(handle) = self.handle_for(found, style, real_bold, real_italic) {
                    return Some(handle);
                }
            }
            if let Some(found) = self.index().lookup(regular) {
                if let Some(handle) = self.handle_for(found, style, false, false) {
                    return Some(handle);
                }
            }
        }

        let found = self.index().lookup(family)?;
        self.handle_for(found, style, false, false)
    }

    fn handle_for(
        &self,
        path: &Path,
        style: FontStyle,
        real_bold: bool,
        real_italic: bool,
    ) -> Option<FontHandle> {
        let font = self.load_face(path)?;
        Some(FontHandle {
            face: FontFace::Outline(font),
            synthetic_bold: style.is_bold() && !real_bold,
            synthetic_italic: style.is_italic() && !real_italic,
        })
    }

    fn load_face(&self, path: &Path) -> Option<Arc<FontVec>> {
        let mut faces = self.faces.lock();
        if let Some(cached) = faces.get(path) {
            return cached.clone();
        }

        let loaded = match std::fs::read(path) {
            Ok(data) => match FontVec::try_from_vec_and_index(data, 0) {
                Ok(font) => Some(Arc::new(font)),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to parse font file");
                    None
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read font file");
                None
            }
        };

        faces.insert(path.to_path_buf(), loaded.clone());
        loaded
    }
}

fn find_known_family(family: &str) -> Option<&'static KnownFamily> {
    let wanted = compact(family);
    KNOWN_FAMILIES
        .iter()
        .find(|known| known.names.iter().any(|name| compact(name) == wanted))
}
