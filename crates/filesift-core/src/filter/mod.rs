/// File type selection based on filename suffixes.
///
/// A [`FileTypeSelector`] picks which files a copy session cares about:
/// the fixed image set, the fixed video set, both, or a user-supplied
/// list of extensions. [`is_eligible`] is the single classification entry
/// point used by the scanner.
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// Extensions treated as images.
pub const IMAGE_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg", ".gif", ".bmp"];

/// Extensions treated as videos.
pub const VIDEO_EXTENSIONS: &[&str] = &[
    ".mp4", ".avi", ".mov", ".wmv", ".mkv", ".flv", ".webm", ".mpeg", ".mpg", ".3gp", ".3g2",
    ".ogg",
];

/// Which files a copy session should pick up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileTypeSelector {
    Images,
    Videos,
    ImagesAndVideos,
    Custom(CustomExtensions),
}

impl FileTypeSelector {
    /// Human-readable label for display.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Images => "Images",
            Self::Videos => "Videos",
            Self::ImagesAndVideos => "Images + Videos",
            Self::Custom(_) => "Custom",
        }
    }
}

/// Errors raised while parsing a user-supplied extension list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("no file extensions were given")]
    Empty,
    #[error("`{0}` is not a valid file extension")]
    Malformed(String),
}

/// A non-empty set of normalised extensions (lowercase, dot-prefixed).
///
/// The only way to build one is [`CustomExtensions::parse`], so every
/// value upholds the normalisation invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomExtensions(BTreeSet<String>);

impl CustomExtensions {
    /// Parse a free-form list such as `"txt, *.Doc; .md"`.
    ///
    /// Tokens are separated by commas, semicolons or whitespace. A leading
    /// `*` is dropped, a missing leading dot is added and the result is
    /// lowercased. Each dot-separated segment must be non-empty and made of
    /// ASCII letters, digits, `_` or `-`.
    pub fn parse(input: &str) -> Result<Self, FilterError> {
        let mut set = BTreeSet::new();

        for raw in input
            .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
            .filter(|t| !t.is_empty())
        {
            let token = raw.strip_prefix('*').unwrap_or(raw);
            let body = token.strip_prefix('.').unwrap_or(token);

            let well_formed = !body.is_empty()
                && body.split('.').all(|segment| {
                    !segment.is_empty()
                        && segment
                            .bytes()
                            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
                });
            if !well_formed {
                return Err(FilterError::Malformed(raw.to_string()));
            }

            set.insert(format!(".{}", body.to_ascii_lowercase()));
        }

        if set.is_empty() {
            return Err(FilterError::Empty);
        }
        Ok(Self(set))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CustomExtensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, ext) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(ext)?;
        }
        Ok(())
    }
}

/// Decide whether `filename` should be picked up under `selector`.
///
/// Matching is ASCII case-insensitive on the tail of the name and does
/// not allocate.
pub fn is_eligible(filename: &str, selector: &FileTypeSelector) -> bool {
    match selector {
        FileTypeSelector::Images => matches_any(filename, IMAGE_EXTENSIONS.iter().copied()),
        FileTypeSelector::Videos => matches_any(filename, VIDEO_EXTENSIONS.iter().copied()),
        FileTypeSelector::ImagesAndVideos => matches_any(
            filename,
            IMAGE_EXTENSIONS.iter().chain(VIDEO_EXTENSIONS).copied(),
        ),
        FileTypeSelector::Custom(custom) => matches_any(filename, custom.iter()),
    }
}

fn matches_any<'a>(filename: &str, mut extensions: impl Iterator<Item = &'a str>) -> bool {
    extensions.any(|ext| ends_with_ignore_ascii_case(filename, ext))
}

#[inline]
fn ends_with_ignore_ascii_case(name: &str, suffix: &str) -> bool {
    let (name, suffix) = (name.as_bytes(), suffix.as_bytes());
    name.len() >= suffix.len() && name[name.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn custom(input: &str) -> FileTypeSelector {
        FileTypeSelector::Custom(CustomExtensions::parse(input).unwrap())
    }

    // ── is_eligible ──────────────────────────────────────────────────────

    #[test]
    fn images_selector_accepts_image_extensions() {
        for name in &["test.jpg", "test.png", "test.jpeg", "a.gif", "b.bmp"] {
            assert!(
                is_eligible(name, &FileTypeSelector::Images),
                "expected {name} to be an image"
            );
        }
        assert!(!is_eligible("test.mp4", &FileTypeSelector::Images));
        assert!(!is_eligible("test.txt", &FileTypeSelector::Images));
    }

    #[test]
    fn videos_selector_accepts_video_extensions() {
        for name in &["test.mp4", "test.avi", "test.mov", "clip.3g2", "clip.ogg"] {
            assert!(
                is_eligible(name, &FileTypeSelector::Videos),
                "expected {name} to be a video"
            );
        }
        assert!(!is_eligible("test.jpg", &FileTypeSelector::Videos));
        assert!(!is_eligible("test.txt", &FileTypeSelector::Videos));
    }

    #[test]
    fn combined_selector_accepts_both_sets() {
        let sel = FileTypeSelector::ImagesAndVideos;
        assert!(is_eligible("test.jpg", &sel));
        assert!(is_eligible("test.mp4", &sel));
        assert!(is_eligible("test.png", &sel));
        assert!(is_eligible("test.avi", &sel));
        assert!(!is_eligible("test.txt", &sel));
    }

    #[test]
    fn custom_selector_uses_only_its_set() {
        let sel = custom(".txt, .doc");
        assert!(is_eligible("test.txt", &sel));
        assert!(is_eligible("test.doc", &sel));
        assert!(!is_eligible("test.jpg", &sel));
        assert!(!is_eligible("test.mp4", &sel));
    }

    /// Upper-casing a name must never change the verdict.
    #[test]
    fn eligibility_is_case_insensitive() {
        let selectors = [
            FileTypeSelector::Images,
            FileTypeSelector::Videos,
            FileTypeSelector::ImagesAndVideos,
            custom("txt tar.gz"),
        ];
        let names = [
            "a.jpg", "c.PNG", "Movie.Mkv", "notes.TXT", "x.tar.gz", "b.txt", "README", "",
            ".jpg", "photo.jpg.bak",
        ];
        for sel in &selectors {
            for name in &names {
                assert_eq!(
                    is_eligible(name, sel),
                    is_eligible(&name.to_uppercase(), sel),
                    "case changed the result for {name:?} under {}",
                    sel.label()
                );
            }
        }
    }

    #[test]
    fn suffix_must_be_at_the_end() {
        assert!(!is_eligible("photo.jpg.bak", &FileTypeSelector::Images));
        assert!(!is_eligible("jpg", &FileTypeSelector::Images));
        assert!(!is_eligible("", &FileTypeSelector::Images));
    }

    // ── CustomExtensions::parse ──────────────────────────────────────────

    #[test]
    fn parse_normalises_tokens() {
        let parsed = CustomExtensions::parse("TXT, *.Doc;.md").unwrap();
        let got: Vec<&str> = parsed.iter().collect();
        assert_eq!(got, vec![".doc", ".md", ".txt"]);
        assert_eq!(parsed.to_string(), ".doc, .md, .txt");
    }

    #[test]
    fn parse_collapses_duplicates() {
        let parsed = CustomExtensions::parse(".txt txt .TXT").unwrap();
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn parse_accepts_multi_segment_extensions() {
        let parsed = CustomExtensions::parse("tar.gz").unwrap();
        assert_eq!(parsed.iter().collect::<Vec<_>>(), vec![".tar.gz"]);
    }

    #[test]
    fn parse_rejects_empty_input() {
        assert_eq!(CustomExtensions::parse(""), Err(FilterError::Empty));
        assert_eq!(CustomExtensions::parse(" ,; "), Err(FilterError::Empty));
    }

    #[test]
    fn parse_rejects_malformed_tokens() {
        for bad in &[".", "., txt", "..txt", ".txt.", "*", "a/b", "t?t", "ü"] {
            assert!(
                matches!(CustomExtensions::parse(bad), Err(FilterError::Malformed(_))),
                "expected {bad:?} to be rejected"
            );
        }
    }
}
