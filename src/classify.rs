use crate::image_source::{ImageCandidate, ImageSource, SearchQuery};
use std::path::PathBuf;
use tracing::debug;

const URL_PREFIXES: [&str; 4] = ["http:", "https:", "www.", "ftp:"];
const VIDEO_HOSTS: [&str; 2] = ["youtube", "youtu.be"];

/// What the text typed into the search box refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputKind {
    LocalFile(PathBuf),
    VideoLink(String),
    /// A URL that may or may not point straight at an image.
    WebLink(String),
    SearchTerm(String),
}

/// What to do with the input once any direct fetch has been attempted.
#[derive(Debug, Clone)]
pub enum InputAction {
    OpenFile(PathBuf),
    ApplyImage(ImageCandidate),
    OpenVideo(String),
    OpenLink(String),
    Search(SearchQuery),
}

pub fn is_url(text: &str) -> bool {
    let text = text.trim().to_lowercase();
    URL_PREFIXES.iter().any(|prefix| text.starts_with(prefix))
}

pub fn is_video(text: &str) -> bool {
    let text = text.trim().to_lowercase();
    VIDEO_HOSTS.iter().any(|host| text.contains(host))
}

fn has_path_separator(text: &str) -> bool {
    text.contains('\\') || text.contains('/')
}

/// Blank input classifies as nothing.
pub fn classify(text: &str) -> Option<InputKind> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let kind = if is_url(text) {
        if is_video(text) {
            InputKind::VideoLink(text.to_string())
        } else {
            InputKind::WebLink(text.to_string())
        }
    } else if has_path_separator(text) {
        InputKind::LocalFile(PathBuf::from(text))
    } else {
        InputKind::SearchTerm(text.to_string())
    };

    debug!("Classified {:?} as {:?}", text, kind);
    Some(kind)
}

/// Turns a classification into an action. Web links are fetched once; anything
/// that doesn't come back as an image, for whatever reason, is opened as a link.
pub async fn resolve(kind: InputKind, source: &dyn ImageSource) -> InputAction {
    match kind {
        InputKind::LocalFile(path) => InputAction::OpenFile(path),
        InputKind::VideoLink(url) => InputAction::OpenVideo(embed_url(&url)),
        InputKind::SearchTerm(term) => InputAction::Search(SearchQuery::Term(term)),
        InputKind::WebLink(url) => match source.fetch_image(url.clone()).await {
            Ok(image) => InputAction::ApplyImage(ImageCandidate::from_url(url, image)),
            Err(e) => {
                debug!("{} is not a direct image ({}), opening as link", url, e);
                InputAction::OpenLink(url)
            }
        },
    }
}

/// Full-screen, looping, autoplaying player for a video link.
pub fn embed_url(url: &str) -> String {
    let id = video_id(url);
    format!(
        "https://www.youtube.com/embed/{id}?autoplay=1&controls=0&loop=1&playlist={id}",
        id = id
    )
}

fn video_id(url: &str) -> &str {
    let url = url.trim();
    if let Some((_, query)) = url.split_once('?') {
        if let Some(id) = query
            .split('&')
            .find_map(|pair| pair.strip_prefix("v="))
        {
            return id;
        }
    }

    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.trim_end_matches('/').rsplit('/').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_source::ImageOrigin;
    use crate::image_source::testing::StubSource;

    #[test]
    fn test_classify_cases() {
        assert_eq!(
            classify("C:\\Images\\x.jpg"),
            Some(InputKind::LocalFile(PathBuf::from("C:\\Images\\x.jpg")))
        );
        assert_eq!(
            classify("/home/me/Pictures/x.png"),
            Some(InputKind::LocalFile(PathBuf::from("/home/me/Pictures/x.png")))
        );
        assert_eq!(
            classify("https://youtu.be/abc123"),
            Some(InputKind::VideoLink("https://youtu.be/abc123".into()))
        );
        assert_eq!(
            classify("  https://example.com/img.jpg "),
            Some(InputKind::WebLink("https://example.com/img.jpg".into()))
        );
        assert_eq!(
            classify("WWW.Example.com/a/b.png"),
            Some(InputKind::WebLink("WWW.Example.com/a/b.png".into()))
        );
        assert_eq!(
            classify("sunset beach"),
            Some(InputKind::SearchTerm("sunset beach".into()))
        );
        assert_eq!(classify("   "), None);
    }

    #[test]
    fn test_url_wins_over_path_separator() {
        assert!(matches!(classify("ftp://host/dir/file.jpg"), Some(InputKind::WebLink(_))));
    }

    #[test]
    fn test_embed_url() {
        assert_eq!(
            embed_url("https://youtu.be/0fYL_qiDYf0"),
            "https://www.youtube.com/embed/0fYL_qiDYf0?autoplay=1&controls=0&loop=1&playlist=0fYL_qiDYf0"
        );
        assert!(embed_url("https://www.youtube.com/watch?v=abc123&t=4").contains("/embed/abc123?"));
    }

    #[tokio::test]
    async fn test_web_link_fetched_as_image() {
        let source = StubSource::default();
        let action = resolve(
            InputKind::WebLink("https://example.com/img.jpg".into()),
            &source,
        )
        .await;

        match action {
            InputAction::ApplyImage(candidate) => assert_eq!(
                candidate.origin(),
                &ImageOrigin::Url("https://example.com/img.jpg".into())
            ),
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_web_link_falls_back_to_open() {
        let mut source = StubSource::default();
        source.broken.insert("https://example.com/page".to_string());

        let action = resolve(InputKind::WebLink("https://example.com/page".into()), &source).await;
        assert!(matches!(action, InputAction::OpenLink(url) if url == "https://example.com/page"));
    }

    #[tokio::test]
    async fn test_video_and_term_skip_the_network() {
        let source = StubSource::default();

        let action = resolve(InputKind::VideoLink("https://youtu.be/abc123".into()), &source).await;
        assert!(matches!(action, InputAction::OpenVideo(url) if url.contains("abc123")));

        let action = resolve(InputKind::SearchTerm("sunset beach".into()), &source).await;
        assert!(matches!(action, InputAction::Search(SearchQuery::Term(t)) if t == "sunset beach"));

        assert!(source.fetched.lock().unwrap().is_empty());
    }
}
