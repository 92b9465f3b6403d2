//! Turns whatever an admin pasted into the video field into a known-safe
//! embed, or nothing.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref YOUTUBE: Regex = Regex::new(
        r#"(?:youtube\.com/(?:watch\?(?:[^\s"'<>]*&)?v=|embed/)|youtu\.be/)([A-Za-z0-9_-]{6,})"#
    )
    .expect("youtube regex");
    static ref VIMEO: Regex =
        Regex::new(r"vimeo\.com/(?:video/)?(\d+)").expect("vimeo regex");
}

pub fn sanitize_video_embed(input: &str) -> String {
    if let Some(caps) = YOUTUBE.captures(input) {
        return format!(
            r#"<iframe src="https://www.youtube.com/embed/{}"></iframe>"#,
            &caps[1]
        );
    }
    if let Some(caps) = VIMEO.captures(input) {
        return format!(
            r#"<iframe src="https://player.vimeo.com/video/{}"></iframe>"#,
            &caps[1]
        );
    }
    String::new()
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn youtube_links() {
        let expected = r#"<iframe src="https://www.youtube.com/embed/dQw4w9WgXcQ"></iframe>"#;
        assert_eq!(
            sanitize_video_embed("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            expected
        );
        assert_eq!(
            sanitize_video_embed("https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ"),
            expected
        );
        assert_eq!(sanitize_video_embed("https://youtu.be/dQw4w9WgXcQ"), expected);
        assert_eq!(
            sanitize_video_embed(
                r#"<iframe width="560" src="https://www.youtube.com/embed/dQw4w9WgXcQ" onload="x()"></iframe>"#
            ),
            expected
        );
    }

    #[test]
    fn vimeo_links() {
        let expected = r#"<iframe src="https://player.vimeo.com/video/76979871"></iframe>"#;
        assert_eq!(sanitize_video_embed("https://vimeo.com/76979871"), expected);
        assert_eq!(
            sanitize_video_embed("https://player.vimeo.com/video/76979871?h=abc"),
            expected
        );
    }

    #[test]
    fn anything_else_is_dropped() {
        assert_eq!(sanitize_video_embed(""), "");
        assert_eq!(sanitize_video_embed("<script>alert(1)</script>"), "");
        assert_eq!(sanitize_video_embed("https://example.com/watch?v=abc"), "");
    }
}
