//! Token logo loading: memory cache, disk cache, background download

use crate::constants::REQUEST_TIMEOUT;
use crate::query::lock;
use crate::utils::rasterize_svg;
use eframe::egui;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tracing::{debug, warn};

/// Logos are drawn at most this many pixels across
const LOGO_PIXELS: u32 = 128;
/// Wait before downloading a logo again after a failure
const RETRY_AFTER: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fetch {
    InFlight,
    Failed(Instant),
}

fn should_fetch(state: Option<Fetch>, now: Instant) -> bool {
    match state {
        None => true,
        Some(Fetch::InFlight) => false,
        Some(Fetch::Failed(at)) => now.saturating_duration_since(at) >= RETRY_AFTER,
    }
}

pub struct LogoCache {
    dir: PathBuf,
    http: reqwest::Client,
    textures: HashMap<String, Option<egui::TextureHandle>>,
    /// Downloads started this session, by URL
    requested: Arc<Mutex<HashMap<String, Fetch>>>,
}

impl LogoCache {
    pub fn new(dir: PathBuf) -> Self {
        std::fs::create_dir_all(&dir).ok();
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            dir,
            http,
            textures: HashMap::new(),
            requested: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Texture for `url` if it is ready. Starts a download the first time a
    /// URL is seen and it is not on disk yet.
    pub fn get(&mut self, ctx: &egui::Context, runtime: &Handle, url: &str) -> Option<egui::TextureHandle> {
        if let Some(cached) = self.textures.get(url) {
            return cached.clone();
        }

        let path = self.dir.join(cache_file_name(url));
        if path.exists() {
            let texture = std::fs::read(&path).ok().and_then(|bytes| {
                let decoded = decode_logo(&bytes);
                if decoded.is_none() {
                    warn!(url, "Failed to decode logo");
                }
                decoded.map(|(pixels, size)| {
                    ctx.load_texture(
                        format!("logo:{url}"),
                        egui::ColorImage::from_rgba_unmultiplied(size, &pixels),
                        egui::TextureOptions::LINEAR,
                    )
                })
            });
            self.textures.insert(url.to_string(), texture.clone());
            return texture;
        }

        let mut requested = lock(&self.requested);
        if should_fetch(requested.get(url).copied(), Instant::now()) {
            requested.insert(url.to_string(), Fetch::InFlight);
            drop(requested);
            self.download(ctx, runtime, url.to_string(), path);
        }
        None
    }

    fn download(&self, ctx: &egui::Context, runtime: &Handle, url: String, path: PathBuf) {
        let http = self.http.clone();
        let ctx = ctx.clone();
        let requested = Arc::clone(&self.requested);
        debug!(url = %url, "Downloading logo");
        runtime.spawn(async move {
            let bytes = match http.get(&url).send().await.and_then(|r| r.error_for_status()) {
                Ok(response) => response.bytes().await,
                Err(e) => Err(e),
            };
            let saved = match bytes {
                Ok(bytes) => match tokio::fs::write(&path, &bytes).await {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(url = %url, error = %e, "Failed to cache logo");
                        false
                    }
                },
                Err(e) => {
                    warn!(url = %url, error = %e, "Failed to download logo");
                    false
                }
            };
            if saved {
                lock(&requested).remove(&url);
                ctx.request_repaint();
            } else {
                lock(&requested).insert(url, Fetch::Failed(Instant::now()));
                ctx.request_repaint_after(RETRY_AFTER);
            }
        });
    }
}

/// 64-bit FNV-1a of the URL. Fixed so names survive toolchain updates.
fn cache_file_name(url: &str) -> String {
    let hash = url.bytes().fold(0xcbf2_9ce4_8422_2325_u64, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0000_0100_0000_01b3)
    });
    format!("{hash:016x}.img")
}

fn looks_like_svg(bytes: &[u8]) -> bool {
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(256)]);
    let head = head.trim_start();
    head.starts_with("<svg") || (head.starts_with("<?xml") && head.contains("<svg"))
}

/// Straight-alpha RGBA pixels and size, scaled down to `LOGO_PIXELS`.
fn decode_logo(bytes: &[u8]) -> Option<(Vec<u8>, [usize; 2])> {
    if looks_like_svg(bytes) {
        let (pixels, w, h) = rasterize_svg(bytes, LOGO_PIXELS)?;
        return Some((pixels, [w as usize, h as usize]));
    }
    let img = image::load_from_memory(bytes).ok()?;
    let img = if img.width() > LOGO_PIXELS || img.height() > LOGO_PIXELS {
        img.thumbnail(LOGO_PIXELS, LOGO_PIXELS)
    } else {
        img
    };
    let rgba = img.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    Some((rgba.into_raw(), size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::ICON_SVG;
    use std::io::Cursor;

    #[test]
    fn cache_names_are_stable_per_url() {
        let a = cache_file_name("https://cdn.example.com/btc.png");
        assert_eq!(a, cache_file_name("https://cdn.example.com/btc.png"));
        assert_ne!(a, cache_file_name("https://cdn.example.com/eth.png"));
        assert_eq!(cache_file_name(""), "cbf29ce484222325.img");
        assert_eq!(cache_file_name("a"), "af63dc4c8601ec8c.img");
    }

    #[test]
    fn failed_downloads_retry_after_a_pause() {
        let now = Instant::now();
        assert!(should_fetch(None, now));
        assert!(!should_fetch(Some(Fetch::InFlight), now));
        assert!(!should_fetch(Some(Fetch::Failed(now)), now + Duration::from_secs(5)));
        assert!(should_fetch(Some(Fetch::Failed(now)), now + RETRY_AFTER));
    }

    #[test]
    fn decodes_svg_logos() {
        let (pixels, size) = decode_logo(ICON_SVG.as_bytes()).unwrap();
        assert_eq!(size, [LOGO_PIXELS as usize, LOGO_PIXELS as usize]);
        assert_eq!(pixels.len(), size[0] * size[1] * 4);
    }

    #[test]
    fn large_bitmaps_are_scaled_down() {
        let mut png = Vec::new();
        image::RgbaImage::new(512, 256)
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        let (_, size) = decode_logo(&png).unwrap();
        assert_eq!(size, [128, 64]);
    }

    #[test]
    fn garbage_does_not_decode() {
        assert!(decode_logo(b"definitely not an image").is_none());
    }
}
