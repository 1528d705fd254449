//! YouTube link helpers for the music video slots.

use url::Url;

/// Video id from `watch?v=`, `youtu.be/`, `/embed/` and `/shorts/` links.
pub fn video_id(link: &str) -> Option<String> {
    let url = Url::parse(link.trim()).ok()?;
    let host = url.host_str()?.trim_start_matches("www.").trim_start_matches("m.");

    let id = match host {
        "youtube.com" | "music.youtube.com" => {
            let mut segments = url.path_segments()?;
            match segments.next() {
                Some("watch") => url
                    .query_pairs()
                    .find(|(key, _)| key == "v")
                    .map(|(_, value)| value.into_owned()),
                Some("embed") | Some("shorts") | Some("live") => {
                    segments.next().map(str::to_owned)
                }
                _ => None,
            }
        }
        "youtu.be" => url.path_segments()?.next().map(str::to_owned),
        _ => None,
    }?;

    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Some(id)
    } else {
        None
    }
}

pub fn embed_url(video_id: &str) -> String {
    format!("https://www.youtube.com/embed/{}", video_id)
}

pub fn small_thumbnail(video_id: &str) -> String {
    format!("https://img.youtube.com/vi/{}/2.jpg", video_id)
}

pub fn large_thumbnail(video_id: &str) -> String {
    format!("https://img.youtube.com/vi/{}/0.jpg", video_id)
}

/// A stored link ready for rendering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Video {
    pub link: String,
    pub embed_url: String,
    pub thumbnail_small: String,
    pub thumbnail_large: String,
}

impl Video {
    /// `None` for links that do not point at a video.
    pub fn from_link(link: &str) -> Option<Self> {
        let id = video_id(link)?;
        Some(Self {
            link: link.to_owned(),
            embed_url: embed_url(&id),
            thumbnail_small: small_thumbnail(&id),
            thumbnail_large: large_thumbnail(&id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_id_forms() {
        for link in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtube.com/watch?feature=share&v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "https://m.youtube.com/shorts/dQw4w9WgXcQ",
        ] {
            assert_eq!(video_id(link).as_deref(), Some("dQw4w9WgXcQ"), "{}", link);
        }
    }

    #[test]
    fn test_non_video_links() {
        assert_eq!(video_id("https://vimeo.com/12345"), None);
        assert_eq!(video_id("https://www.youtube.com/channel/abc"), None);
        assert_eq!(video_id("https://www.youtube.com/watch"), None);
        assert_eq!(video_id("not a url"), None);
    }

    #[test]
    fn test_video_urls() {
        let video = Video::from_link("https://youtu.be/abc_DEF-123").unwrap();
        assert_eq!(video.embed_url, "https://www.youtube.com/embed/abc_DEF-123");
        assert_eq!(video.thumbnail_small, "https://img.youtube.com/vi/abc_DEF-123/2.jpg");
        assert_eq!(video.thumbnail_large, "https://img.youtube.com/vi/abc_DEF-123/0.jpg");
    }
}
