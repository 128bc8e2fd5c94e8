use anyhow::{Context, Result};
use tracing::debug;

/// Accepts clipboard text as a URL only if, once trimmed, it starts with `http://` or `https://`
pub fn url_from_clipboard_text(text: &str) -> Option<String> {
    let candidate = text.trim();
    if candidate.starts_with("http://") || candidate.starts_with("https://") {
        Some(candidate.to_string())
    } else {
        None
    }
}

/// Reads the system clipboard and returns its text if it looks like a URL.
///
/// arboard talks to the display server synchronously, so the read runs on the
/// blocking pool and the runtime's workers stay free for in-flight tasks.
pub async fn read_clipboard_url() -> Result<Option<String>> {
    off_runtime(read_clipboard_url_blocking).await
}

async fn off_runtime<T, F>(read: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(read)
        .await
        .context("clipboard reader task failed")?
}

fn read_clipboard_url_blocking() -> Result<Option<String>> {
    let mut clipboard = arboard::Clipboard::new().context("failed to access clipboard")?;
    let text = match clipboard.get_text() {
        Ok(text) => text,
        // images or an empty clipboard are "no URL", not an access error
        Err(arboard::Error::ContentNotAvailable) => return Ok(None),
        Err(e) => return Err(e).context("failed to read clipboard text"),
    };
    debug!(chars = text.chars().count(), "read clipboard text");
    Ok(url_from_clipboard_text(&text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn accepts_http_and_https() {
        assert_eq!(
            url_from_clipboard_text("https://example.com/a"),
            Some("https://example.com/a".to_string())
        );
        assert_eq!(
            url_from_clipboard_text("http://example.com/a"),
            Some("http://example.com/a".to_string())
        );
    }

    #[test]
    fn trims_surrounding_whitespace() {
        assert_eq!(
            url_from_clipboard_text("  https://example.com/a\n"),
            Some("https://example.com/a".to_string())
        );
    }

    #[test]
    fn rejects_non_urls() {
        assert_eq!(url_from_clipboard_text("not a url"), None);
        assert_eq!(url_from_clipboard_text(""), None);
        assert_eq!(url_from_clipboard_text("ftp://example.com/file"), None);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn slow_clipboard_does_not_stall_the_runtime() {
        let read = off_runtime(|| {
            std::thread::sleep(Duration::from_millis(300));
            Ok(Some("https://example.com/slow".to_string()))
        });
        tokio::pin!(read);

        // a timer on the same single-threaded runtime still fires first
        tokio::select! {
            _ = &mut read => panic!("clipboard read finished before the timer"),
            _ = tokio::time::sleep(Duration::from_millis(20)) => {}
        }
        let url = read.await.expect("read");
        assert_eq!(url.as_deref(), Some("https://example.com/slow"));
    }

    #[tokio::test]
    async fn panicking_reader_becomes_an_error() {
        let result: Result<Option<String>> = off_runtime(|| panic!("display server gone")).await;
        let err = result.unwrap_err();
        assert!(err.to_string().contains("clipboard reader task failed"));
    }
}
