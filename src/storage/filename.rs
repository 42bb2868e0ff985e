//! Upload filename handling
//!
//! Client-supplied names are reduced to a flat ASCII name before they touch
//! the filesystem, and output names are derived from them deterministically.

/// Suffix appended to the input stem to name the output file
const OUTPUT_SUFFIX: &str = "_converted";

/// Reduce a client filename to a safe, flat file name
///
/// Non-ASCII characters are dropped, `/` and whitespace runs become `_`,
/// anything outside `[A-Za-z0-9_.-]` is removed (including `\`, which is
/// not a separator on POSIX) and leading or trailing `.`/`_` are trimmed.
/// May return an empty string.
pub fn secure_filename(name: &str) -> String {
    let flattened: String = name
        .chars()
        .filter(char::is_ascii)
        .map(|c| if c == '/' { ' ' } else { c })
        .collect();

    let joined = flattened.split_ascii_whitespace().collect::<Vec<_>>().join("_");

    joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect::<String>()
        .trim_matches(|c| c == '.' || c == '_')
        .to_string()
}

/// Name without its last extension (`archive.tar.gz` -> `archive.tar`)
pub fn file_stem(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) if name[..idx].chars().any(|c| c != '.') => &name[..idx],
        _ => name,
    }
}

/// `<stem>_converted.<target>`, sanitized so the target cannot add path components
pub fn output_file_name(safe_input: &str, target: &str) -> String {
    secure_filename(&format!(
        "{}{OUTPUT_SUFFIX}.{target}",
        file_stem(safe_input)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_names_unchanged() {
        assert_eq!(secure_filename("photo.png"), "photo.png");
        assert_eq!(secure_filename("clip-01_final.mov"), "clip-01_final.mov");
    }

    #[test]
    fn test_whitespace_becomes_underscore() {
        assert_eq!(secure_filename("My cool movie.mov"), "My_cool_movie.mov");
        assert_eq!(secure_filename("  spaced \t out .mp4"), "spaced_out_.mp4");
    }

    #[test]
    fn test_path_components_are_flattened() {
        assert_eq!(secure_filename("../../../etc/passwd"), "etc_passwd");
        assert_eq!(secure_filename("/abs/path/photo.png"), "abs_path_photo.png");
    }

    #[test]
    fn test_backslash_is_stripped_not_split() {
        assert_eq!(secure_filename("C:\\Users\\me\\clip.mov"), "CUsersmeclip.mov");
        assert_eq!(secure_filename("..\\..\\evil.png"), "evil.png");
    }

    #[test]
    fn test_unsafe_and_non_ascii_removed() {
        assert_eq!(secure_filename("ph<o>to|?.png"), "photo.png");
        assert_eq!(secure_filename("caf\u{e9}.jpg"), "caf.jpg");
        assert_eq!(secure_filename(".hidden"), "hidden");
    }

    #[test]
    fn test_name_can_sanitize_to_empty() {
        assert_eq!(secure_filename(""), "");
        assert_eq!(secure_filename("../.."), "");
        assert_eq!(secure_filename("\u{65e5}\u{672c}"), "");
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("photo.png"), "photo");
        assert_eq!(file_stem("archive.tar.gz"), "archive.tar");
        assert_eq!(file_stem("README"), "README");
        assert_eq!(file_stem("trailing."), "trailing");
    }

    #[test]
    fn test_output_file_name() {
        assert_eq!(output_file_name("photo.png", "jpg"), "photo_converted.jpg");
        assert_eq!(output_file_name("clip.mov", "mp4"), "clip_converted.mp4");
        assert_eq!(output_file_name("README", "txt"), "README_converted.txt");
    }

    #[test]
    fn test_output_target_cannot_escape() {
        let name = output_file_name("photo.png", "../../etc/x");
        assert!(!name.contains('/'));
        assert!(name.starts_with("photo_converted"));
    }
}
