//! ffmetadata parsing and Vorbis-comment remapping
//!
//! ffmpeg dumps tags as flat `key=value` lines; opusenc wants repeated
//! `--comment KEY=VALUE` arguments with the conventional Vorbis comment
//! names. The remap table covers the keys whose canonical name differs
//! from a plain uppercase of the ffmetadata key.

/// Remap an ffmetadata key (already lower-cased and trimmed) to its
/// Vorbis comment name. Returns `None` for keys that are dropped.
fn remap_key(key: &str) -> Option<String> {
    let canonical = match key {
        // Dropped outright: ffmpeg's own `encoder` stamp and free-form
        // `comment` (we synthesize our own DESCRIPTION)
        "comment" | "encoder" => return None,
        "track" => "TRACKNUMBER",
        "organization" => "ORGANIZATION",
        "version" => "VERSION",
        "performer" => "PERFORMER",
        "copyright" => "COPYRIGHT",
        "license" => "LICENSE",
        "description" => "DESCRIPTION",
        "disk" => "DISKNUMBER",
        other => return Some(other.to_uppercase()),
    };
    Some(canonical.to_string())
}

/// Strip control characters from a tag value before it becomes an
/// opusenc argument. Values are passed as argv elements (never through a
/// shell), so embedded `=` and quotes are harmless; embedded newlines
/// would corrupt the comment block.
fn sanitize_value(value: &str) -> String {
    value.chars().filter(|c| !c.is_control()).collect()
}

/// Parse ffmetadata text into `KEY=VALUE` comment strings
///
/// Lines without `=` (including the `;FFMETADATA1` header) are ignored.
pub fn parse_metadata(text: &str) -> Vec<String> {
    let mut comments = Vec::new();
    for line in text.lines() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim().to_lowercase();
        let Some(canonical) = remap_key(&key) else {
            continue;
        };
        comments.push(format!("{}={}", canonical, sanitize_value(value)));
    }
    comments
}

/// Synthesize the DESCRIPTION comment recording what the clip guard did
///
/// The gain is stated only when one was actually applied; a clip warning
/// is appended when the guard hit its floor without resolving the clip.
pub fn gain_description(gain_db: f64, clip_warning: Option<&str>) -> String {
    let mut description = String::from("auto gain(-G).");
    if gain_db != 0.0 {
        description.push_str(&format!(" vol {:.1}dB.", gain_db));
    }
    if let Some(warning) = clip_warning {
        description.push(' ');
        description.push_str(warning);
    }
    description
}

/// Full comment list for one file: remapped tags plus the synthesized
/// DESCRIPTION.
pub fn build_comments(metadata_text: &str, gain_db: f64, clip_warning: Option<&str>) -> Vec<String> {
    let mut comments = parse_metadata(metadata_text);
    comments.push(format!("DESCRIPTION={}", gain_description(gain_db, clip_warning)));
    comments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_remaps_to_tracknumber() {
        assert_eq!(parse_metadata("track=3"), vec!["TRACKNUMBER=3"]);
    }

    #[test]
    fn test_full_remap_table() {
        let cases = [
            ("organization=label", "ORGANIZATION=label"),
            ("version=radio edit", "VERSION=radio edit"),
            ("performer=someone", "PERFORMER=someone"),
            ("copyright=2020", "COPYRIGHT=2020"),
            ("license=CC-BY", "LICENSE=CC-BY"),
            ("description=live", "DESCRIPTION=live"),
            ("disk=2", "DISKNUMBER=2"),
        ];
        for (input, expected) in cases {
            assert_eq!(parse_metadata(input), vec![expected]);
        }
    }

    #[test]
    fn test_comment_and_encoder_dropped() {
        assert!(parse_metadata("comment=foo").is_empty());
        assert!(parse_metadata("encoder=Lavf61.1.100").is_empty());
    }

    #[test]
    fn test_unknown_key_uppercased() {
        assert_eq!(parse_metadata("mood=happy"), vec!["MOOD=happy"]);
    }

    #[test]
    fn test_key_case_and_whitespace_normalized() {
        assert_eq!(parse_metadata("  Track =7"), vec!["TRACKNUMBER=7"]);
        assert_eq!(parse_metadata("COMMENT=x"), Vec::<String>::new());
    }

    #[test]
    fn test_lines_without_equals_ignored() {
        let text = ";FFMETADATA1\ntitle=Song\njust some text\n\ntrack=1";
        assert_eq!(parse_metadata(text), vec!["TITLE=Song", "TRACKNUMBER=1"]);
    }

    #[test]
    fn test_value_passed_through_including_equals() {
        // Only the first `=` splits key from value
        assert_eq!(parse_metadata("title=a=b"), vec!["TITLE=a=b"]);
    }

    #[test]
    fn test_control_characters_stripped_from_value() {
        assert_eq!(parse_metadata("title=bad\x00name\x1b"), vec!["TITLE=badname"]);
    }

    #[test]
    fn test_gain_description_without_gain() {
        assert_eq!(gain_description(0.0, None), "auto gain(-G).");
    }

    #[test]
    fn test_gain_description_with_gain() {
        assert_eq!(gain_description(-0.4, None), "auto gain(-G). vol -0.4dB.");
    }

    #[test]
    fn test_gain_description_with_clip_warning() {
        let description = gain_description(-1.8, Some("still clipped at vol -1.8dB"));
        assert!(description.contains("-1.8dB"));
        assert!(description.contains("still clipped"));
    }

    #[test]
    fn test_build_comments_appends_description_last() {
        let comments = build_comments("title=Song\ntrack=1", 0.0, None);
        assert_eq!(
            comments,
            vec!["TITLE=Song", "TRACKNUMBER=1", "DESCRIPTION=auto gain(-G)."]
        );
    }
}
