/// Default destination pattern.
///
/// Files land in a year folder, then a `MM-YYYY` folder, then the fixed sub-path for their
/// media kind (empty for images), keeping their original name with the resolved location
/// appended.
pub const DEFAULT_PATTERN: &str =
    "/{year}/{month}-{year}/{fixedpath}/{filename}{separator}{location}{extension}";

/// Separator placed between the file name and the location when a location is known.
pub const DEFAULT_SEPARATOR: &str = " - ";

/// Every token understood by [`resolve_pattern`], with a short description for help output.
pub const TOKENS: &[(&str, &str)] = &[
    ("{year}", "capture year"),
    ("{month}", "capture month, two digits"),
    ("{camera}", "camera make and model"),
    ("{filename}", "file name without extension"),
    ("{extension}", "file extension, including the dot"),
    ("{location}", "place name resolved from GPS"),
    ("{fixedpath}", "fixed path for the media kind (e.g. video)"),
    ("{separator}", "separator, only present together with a location"),
];

/// The values substituted into a destination pattern for one file.
///
/// Built once per processed file by the metadata extractor. The location starts empty and
/// is filled in with [`DestinationFields::with_location`] once the GPS coordinate has been
/// resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct DestinationFields {
    pub year: i32,
    /// 1–12.
    pub month: u32,
    /// Original file name including its extension.
    pub filename: String,
    pub location: String,
    pub camera: String,
    pub fixed_path: String,
    pub separator: String,
}

impl DestinationFields {
    pub fn new(year: i32, month: u32, filename: impl Into<String>) -> Self {
        Self {
            year,
            month,
            filename: filename.into(),
            location: String::new(),
            camera: String::new(),
            fixed_path: String::new(),
            separator: DEFAULT_SEPARATOR.to_string(),
        }
    }

    pub fn with_location(self, location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            ..self
        }
    }

    pub fn with_camera(self, camera: impl Into<String>) -> Self {
        Self {
            camera: camera.into(),
            ..self
        }
    }

    pub fn with_fixed_path(self, fixed_path: impl Into<String>) -> Self {
        Self {
            fixed_path: fixed_path.into(),
            ..self
        }
    }

    pub fn with_separator(self, separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
            ..self
        }
    }
}

/// Split a file name at its last `.` into stem and extension (dot included).
///
/// A name without a dot, or whose only dot is the first character (`.hidden`), has an
/// empty extension.
pub fn split_filename(filename: &str) -> (&str, &str) {
    match filename.rfind('.') {
        Some(pos) if pos > 0 => filename.split_at(pos),
        _ => (filename, ""),
    }
}

/// Substitute `fields` into `pattern`, producing a destination path relative to the
/// destination root.
///
/// Each token is replaced independently with plain find-and-replace, so a value that
/// itself contains token text is not guarded against. `{location}` and `{separator}`
/// collapse to nothing together when no location is known. A single pass then folds `//`
/// into `/`.
pub fn resolve_pattern(pattern: &str, fields: &DestinationFields) -> String {
    let (stem, extension) = split_filename(&fields.filename);

    let mut path = pattern
        .replace("{year}", &fields.year.to_string())
        .replace("{month}", &format!("{:02}", fields.month))
        .replace("{filename}", stem)
        .replace("{extension}", extension)
        .replace("{camera}", &fields.camera)
        .replace("{fixedpath}", &fields.fixed_path);

    path = if fields.location.is_empty() {
        path.replace("{location}", "").replace("{separator}", "")
    } else {
        path.replace("{location}", &fields.location)
            .replace("{separator}", &fields.separator)
    };

    path.replace("//", "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> DestinationFields {
        DestinationFields::new(2022, 3, "IMG_0001.JPG")
    }

    // ── split_filename ───────────────────────────────────────────────

    #[test]
    fn split_on_last_dot() {
        assert_eq!(split_filename("IMG_0001.JPG"), ("IMG_0001", ".JPG"));
        assert_eq!(split_filename("archive.tar.gz"), ("archive.tar", ".gz"));
    }

    #[test]
    fn split_without_extension() {
        assert_eq!(split_filename("noext"), ("noext", ""));
        assert_eq!(split_filename(".hidden"), (".hidden", ""));
        assert_eq!(split_filename(""), ("", ""));
    }

    // ── resolve_pattern ──────────────────────────────────────────────

    #[test]
    fn filename_and_extension_tokens() {
        let path = resolve_pattern("{filename}|{extension}", &fields());
        assert_eq!(path, "IMG_0001|.JPG");
    }

    #[test]
    fn missing_extension_resolves_empty() {
        let f = DestinationFields::new(2022, 3, "noext");
        assert_eq!(resolve_pattern("/{filename}{extension}", &f), "/noext");
    }

    #[test]
    fn month_is_zero_padded() {
        for month in 1..=12 {
            let f = DestinationFields::new(2022, month, "a.jpg");
            let rendered = resolve_pattern("{month}", &f);
            assert_eq!(rendered.len(), 2, "month {month} rendered as {rendered}");
            assert_eq!(rendered, format!("{month:02}"));
        }
        assert_eq!(resolve_pattern("{month}", &fields()), "03");
    }

    #[test]
    fn year_is_not_padded() {
        let f = DestinationFields::new(999, 1, "a.jpg");
        assert_eq!(resolve_pattern("{year}", &f), "999");
    }

    #[test]
    fn camera_token() {
        let f = fields().with_camera("Acme - X1");
        assert_eq!(
            resolve_pattern("/{year}/{month}/{camera}/{filename}{extension}", &f),
            "/2022/03/Acme - X1/IMG_0001.JPG"
        );
    }

    #[test]
    fn empty_camera_collapses_double_slash() {
        assert_eq!(
            resolve_pattern("/{year}/{camera}/{filename}{extension}", &fields()),
            "/2022/IMG_0001.JPG"
        );
    }

    #[test]
    fn location_and_separator_present() {
        let f = fields().with_location("Jordaan, Amsterdam");
        assert_eq!(
            resolve_pattern("{filename}{separator}{location}{extension}", &f),
            "IMG_0001 - Jordaan, Amsterdam.JPG"
        );
    }

    #[test]
    fn empty_location_suppresses_separator() {
        let f = fields().with_separator("#SEP#");
        let path = resolve_pattern("{filename}{separator}{location}{extension}", &f);
        assert_eq!(path, "IMG_0001.JPG");
        assert!(!path.contains("#SEP#"));
    }

    #[test]
    fn custom_separator_used_with_location() {
        let f = fields().with_location("Paris").with_separator("_");
        assert_eq!(resolve_pattern("{filename}{separator}{location}", &f), "IMG_0001_Paris");
    }

    #[test]
    fn default_pattern_for_image() {
        assert_eq!(
            resolve_pattern(DEFAULT_PATTERN, &fields()),
            "/2022/03-2022/IMG_0001.JPG"
        );
    }

    #[test]
    fn default_pattern_for_video() {
        let f = DestinationFields::new(2020, 12, "clip.mp4")
            .with_fixed_path("video")
            .with_separator("")
            .with_location("Berlin");
        assert_eq!(
            resolve_pattern(DEFAULT_PATTERN, &f),
            "/2020/12-2020/video/clipBerlin.mp4"
        );
    }

    #[test]
    fn double_slash_folded_once() {
        assert_eq!(resolve_pattern("a///b", &fields()), "a//b");
        assert_eq!(resolve_pattern("a////b", &fields()), "a//b");
    }

    #[test]
    fn unknown_tokens_left_alone() {
        assert_eq!(resolve_pattern("{day}/{filename}", &fields()), "{day}/IMG_0001");
    }

    #[test]
    fn value_containing_token_text_substituted_as_is() {
        // {filename} runs before {camera}, so token text inside the file name is replaced
        // by later passes.
        let f = DestinationFields::new(2022, 3, "{camera}.jpg").with_camera("Acme");
        assert_eq!(resolve_pattern("{filename}", &f), "Acme");
    }

    #[test]
    fn resolution_is_deterministic() {
        let f = fields().with_location("Rome").with_camera("Acme - X1");
        assert_eq!(
            resolve_pattern(DEFAULT_PATTERN, &f),
            resolve_pattern(DEFAULT_PATTERN, &f)
        );
    }
}
