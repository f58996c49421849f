//! Asset loading.
//!
//! Each asset is fetched by its own future that resolves to a `Result`. The
//! two futures are independent: callers may await them separately (arrival
//! order is not constrained) or join them with [`AssetLoader::load_all`].
//! Natively files are read below an asset root with tokio; on wasm they are
//! fetched relative to the page origin.

use std::{future::Future, path::PathBuf, time::Duration};

use crate::{
    config::AssetConfig,
    data_structures::texture::MatcapImage,
    error::{Result, SceneError},
    resources::font::Typeface,
};

pub mod font;
pub mod text;

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> Result<reqwest::Url> {
    let origin = web_sys::window()
        .and_then(|window| window.location().origin().ok())
        .ok_or_else(|| SceneError::asset(file_name, "no window location available"))?;
    let base = reqwest::Url::parse(&format!("{}/assets/", origin))
        .map_err(|e| SceneError::asset(file_name, e))?;
    base.join(file_name)
        .map_err(|e| SceneError::asset(file_name, e))
}

pub async fn load_binary(root: &std::path::Path, file_name: &str) -> Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let _ = root;
        let url = format_url(file_name)?;
        let response = reqwest::get(url)
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| SceneError::asset(file_name, e))?;
        response
            .bytes()
            .await
            .map_err(|e| SceneError::asset(file_name, e))?
            .to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = {
        let path = root.join(file_name);
        tokio::fs::read(&path)
            .await
            .map_err(|e| SceneError::asset(path.display().to_string(), e))?
    };

    Ok(data)
}

pub async fn load_string(root: &std::path::Path, file_name: &str) -> Result<String> {
    let bytes = load_binary(root, file_name).await?;
    String::from_utf8(bytes).map_err(|e| SceneError::asset(file_name, e))
}

/// Bound `fut` by `after`. On wasm the browser's fetch is left to fail on its own.
pub async fn with_timeout<T>(
    path: &str,
    after: Duration,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        match tokio::time::timeout(after, fut).await {
            Ok(result) => result,
            Err(_) => Err(SceneError::AssetTimeout {
                path: path.to_string(),
                after,
            }),
        }
    }
    #[cfg(target_arch = "wasm32")]
    {
        let _ = (path, after);
        fut.await
    }
}

/// Both assets after a joined load. The texture may fail on its own.
#[derive(Debug)]
pub struct LoadedAssets {
    pub texture: Result<MatcapImage>,
    pub font: Result<Typeface>,
}

#[derive(Debug, Clone)]
pub struct AssetLoader {
    root: PathBuf,
    texture: String,
    font: String,
    timeout: Duration,
}

impl AssetLoader {
    pub fn new(config: &AssetConfig) -> Self {
        Self {
            root: PathBuf::from(&config.asset_root),
            texture: config.texture.clone(),
            font: config.font.clone(),
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }

    pub fn texture_path(&self) -> &str {
        &self.texture
    }

    pub fn font_path(&self) -> &str {
        &self.font
    }

    pub async fn load_texture(&self) -> Result<MatcapImage> {
        let fetch = async {
            let bytes = load_binary(&self.root, &self.texture).await?;
            let extension = std::path::Path::new(&self.texture)
                .extension()
                .and_then(|ext| ext.to_str());
            MatcapImage::from_bytes(&bytes, &self.texture, extension)
        };
        let image = with_timeout(&self.texture, self.timeout, fetch).await?;
        log::info!(
            "loaded matcap {} ({}x{})",
            self.texture,
            image.width,
            image.height
        );
        Ok(image)
    }

    pub async fn load_font(&self) -> Result<Typeface> {
        let fetch = async {
            let bytes = load_binary(&self.root, &self.font).await?;
            Typeface::from_slice(&bytes).map_err(|e| SceneError::asset(&self.font, e))
        };
        let font = with_timeout(&self.font, self.timeout, fetch).await?;
        log::info!(
            "loaded font {} with {} glyphs",
            font.family_name,
            font.glyphs.len()
        );
        Ok(font)
    }

    /// Await both fetches concurrently.
    pub async fn load_all(&self) -> LoadedAssets {
        let (texture, font) = futures::future::join(self.load_texture(), self.load_font()).await;
        LoadedAssets { texture, font }
    }
}
