use crate::error::{has_extension, MediaError};
use crate::{loge, logi, logok, logw};
use anyhow::{Context, Result};
use image::imageops::FilterType;
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use url::Url;
use walkdir::WalkDir;

const USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15";

const IMAGE_EXTS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "tiff"];

pub const TARGET_SIZE: (u32, u32) = (1080, 1350);

static IMG_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("img[src]").expect("static img selector"));
static NEXT_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"a[rel~="next"][href], link[rel~="next"][href]"#).expect("static next selector"));

pub fn build_client() -> Result<Client> {
    Client::builder()
        .cookie_store(true)
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(60))
        .connect_timeout(Duration::from_secs(20))
        .build()
        .context("Failed to build HTTP client")
}

pub fn is_image_url(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    IMAGE_EXTS.iter().any(|ext| lower.ends_with(&format!(".{}", ext)))
}

/// Thumbnail sources (`236x`) found in `html`, rewritten to the `736x`
/// rendition and resolved against `base`.
pub fn collect_pin_images(html: &str, base: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut out = Vec::new();
    for img in document.select(&IMG_SELECTOR) {
        let Some(src) = img.value().attr("src") else {
            continue;
        };
        let Ok(resolved) = base.join(src) else {
            continue;
        };
        let src = resolved.to_string();
        if src.contains("236x") {
            out.push(src.replace("236", "736"));
        }
    }
    out
}

/// Target of the page's `rel="next"` link, if it has one.
pub fn next_page(html: &str, base: &Url) -> Option<Url> {
    let document = Html::parse_document(html);
    let href = document.select(&NEXT_SELECTOR).next()?.value().attr("href")?;
    base.join(href).ok()
}

/// File name an image URL is saved under: the last path segment.
fn image_file_name(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let name = parsed.path_segments()?.next_back()?.to_string();
    if name.is_empty() { None } else { Some(name) }
}

/// Streams the image at `url` into `folder`. Returns `Ok(None)` for URLs
/// that do not look like images.
pub async fn download_image(client: &Client, url: &str, folder: &Path) -> Result<Option<PathBuf>> {
    if !is_image_url(url) {
        logw(format!("Invalid image URL: {}", url));
        return Ok(None);
    }
    let name = image_file_name(url).ok_or_else(|| MediaError::InvalidUrl(url.to_string()))?;

    let mut resp = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Request failed: {}", url))?
        .error_for_status()?;

    fs::create_dir_all(folder).await?;
    let path = folder.join(name);
    let mut file = fs::File::create(&path)
        .await
        .with_context(|| format!("Failed to create {}", path.display()))?;
    while let Some(chunk) = resp.chunk().await? {
        file.write_all(&chunk).await?;
    }
    file.flush().await?;

    logok(format!("Saved: {}", path.display()));
    Ok(Some(path))
}

async fn fetch_page(client: &Client, url: &Url) -> Result<String> {
    let resp = client
        .get(url.clone())
        .send()
        .await
        .with_context(|| format!("Request failed: {}", url))?
        .error_for_status()?;
    Ok(resp.text().await?)
}

/// Downloads every pin image on `page_url` into `folder`, then follows up to
/// `extra_pages` `rel="next"` links doing the same. Returns how many images
/// were saved.
pub async fn scrape_images(client: &Client, page_url: &str, folder: &Path, extra_pages: u32) -> Result<usize> {
    let mut url = Url::parse(page_url).map_err(|_| MediaError::InvalidUrl(page_url.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(MediaError::InvalidUrl(page_url.to_string()).into());
    }

    let mut seen = HashSet::new();
    let mut saved = 0usize;

    for page in 0..=extra_pages {
        logi(format!("Scraping page {}: {}", page + 1, url));
        let html = fetch_page(client, &url).await?;

        for src in collect_pin_images(&html, &url) {
            if !seen.insert(src.clone()) {
                continue;
            }
            match download_image(client, &src, folder).await {
                Ok(Some(_)) => saved += 1,
                Ok(None) => {}
                Err(err) => loge(format!("Failed to save image {}: {}", src, err)),
            }
        }

        match next_page(&html, &url) {
            Some(next) if page < extra_pages => url = next,
            _ => break,
        }
    }

    logok(format!("Scrape finished: {} images saved to {}", saved, folder.display()));
    Ok(saved)
}

/// Resizes every image directly inside `dir` to 1080x1350 unless it already
/// has that size. Returns how many files were rewritten.
pub fn resize_images(dir: &Path) -> Result<usize> {
    if !dir.is_dir() {
        return Err(MediaError::DirNotFound(dir.to_path_buf()).into());
    }

    let mut resized = 0;
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                logw(format!("Error accessing directory {}: {}", dir.display(), err));
                continue;
            }
        };
        let path = entry.path();
        if !entry.file_type().is_file() || !has_extension(path, IMAGE_EXTS) {
            continue;
        }

        match resize_one(path) {
            Ok(true) => {
                resized += 1;
                logi(format!("Resized and saved: {}", path.display()));
            }
            Ok(false) => logi(format!(
                "Image {} is already {}x{}, skipping resize.",
                path.display(),
                TARGET_SIZE.0,
                TARGET_SIZE.1
            )),
            Err(err) => loge(format!("Failed to process image {}: {}", path.display(), err)),
        }
    }
    Ok(resized)
}

fn resize_one(path: &Path) -> Result<bool> {
    let img = image::open(path)?;
    if (img.width(), img.height()) == TARGET_SIZE {
        return Ok(false);
    }
    img.resize_exact(TARGET_SIZE.0, TARGET_SIZE.1, FilterType::Lanczos3)
        .save(path)?;
    Ok(true)
}
