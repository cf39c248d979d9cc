use std::path::{Path, PathBuf};

use anyhow::Context;
use base64::{engine::general_purpose::STANDARD, Engine};
use image::DynamicImage;
use reqwest::StatusCode;

use super::resource_path::ResourcePath;

pub async fn load_any(client: &reqwest::Client, root: &Path, url: &str) -> anyhow::Result<Vec<u8>> {
    use ResourcePath::*;
    match ResourcePath::from(url) {
        Local(path) => load_local(root, &path).await,
        URL(url) => load_url(client, &url).await,
        Data(data) => load_data(&data),
    }
}

async fn load_local(root: &Path, path: &PathBuf) -> anyhow::Result<Vec<u8>> {
    // absolute paths replace the root when joined
    let full = root.join(path);
    tokio::fs::read(&full)
        .await
        .context(format!("Failed to load file {}", full.display()))
}

async fn load_url(client: &reqwest::Client, url: &str) -> anyhow::Result<Vec<u8>> {
    let response = client
        .get(url)
        .send()
        .await
        .context(format!("Failed to get image {url}!"))?;

    if response.status() != StatusCode::OK {
        anyhow::bail!("Status code for {} is {}, not OK.", url, response.status())
    }

    let bytes = response
        .bytes()
        .await
        .context("Failed to read body from response")?;

    Ok(bytes.to_vec())
}

// `data` is everything after the `data:` scheme, e.g. `image/gif;base64,R0lG...`
fn load_data(data: &str) -> anyhow::Result<Vec<u8>> {
    let (header, payload) = data
        .split_once(',')
        .context("Data URL has no `,` separating header and payload")?;

    if header.ends_with(";base64") {
        STANDARD
            .decode(payload)
            .context("Failed to decode base64 payload of data URL")
    } else {
        Ok(urlencoding::decode_binary(payload.as_bytes()).into_owned())
    }
}

pub fn decode(bytes: &[u8]) -> anyhow::Result<DynamicImage> {
    image::load_from_memory(bytes).context("Failed to decode image")
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::ImageFormat;

    use super::*;

    fn png_bytes() -> Vec<u8> {
        let mut buf = Cursor::new(vec![]);
        DynamicImage::new_rgba8(2, 3)
            .write_to(&mut buf, ImageFormat::Png)
            .expect("encoding a tiny png cannot fail");
        buf.into_inner()
    }

    #[test]
    fn base64_data_url_is_decoded() {
        let encoded = STANDARD.encode(png_bytes());
        let bytes = load_data(&format!("image/png;base64,{encoded}")).unwrap();
        assert_eq!(bytes, png_bytes());
    }

    #[test]
    fn plain_data_url_is_percent_decoded() {
        let bytes = load_data("image/svg+xml,%3Csvg%20width=%221%22%3E%3C/svg%3E").unwrap();
        assert_eq!(bytes, b"<svg width=\"1\"></svg>");
    }

    #[tokio::test]
    async fn file_urls_with_escapes_reach_the_file() {
        let dir = tempfile::tempdir().expect("failed to create temp directory");
        let path = dir.path().join("with space.png");
        std::fs::write(&path, png_bytes()).unwrap();

        let url = format!("file://{}", path.display()).replace(' ', "%20");
        let client = reqwest::Client::new();
        let bytes = load_any(&client, dir.path(), &url).await.unwrap();
        assert_eq!(bytes, png_bytes());
    }

    #[test]
    fn broken_data_urls_fail() {
        assert!(load_data("image/gif;base64,@@not-base64@@").is_err());
        assert!(load_data("image/gif;base64").is_err());
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode(b"definitely not an image").is_err());
        let image = decode(&png_bytes()).unwrap();
        assert_eq!((image.width(), image.height()), (2, 3));
    }

    #[tokio::test]
    async fn local_paths_are_resolved_against_root() {
        let dir = tempfile::tempdir().expect("failed to create temp directory");
        std::fs::write(dir.path().join("tiny.png"), png_bytes()).unwrap();

        let client = reqwest::Client::new();
        let bytes = load_any(&client, dir.path(), "tiny.png").await.unwrap();
        assert_eq!(bytes, png_bytes());

        let missing = load_any(&client, dir.path(), "missing.png").await;
        assert!(missing.is_err());
    }
}
