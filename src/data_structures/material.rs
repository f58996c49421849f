use std::sync::OnceLock;

use crate::data_structures::texture::MatcapImage;

/// A matcap material shared by every mesh of the scene.
///
/// The texture is late-bound: the material exists before any asset is in and
/// the matcap may arrive before or after the font. Until it does renderers fall back
/// to [`MatcapImage::fallback`]. The slot is written at most once.
#[derive(Debug, Default)]
pub struct MatcapMaterial {
    pub label: String,
    matcap: OnceLock<MatcapImage>,
}

impl MatcapMaterial {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            matcap: OnceLock::new(),
        }
    }

    pub fn with_matcap(label: impl Into<String>, matcap: MatcapImage) -> Self {
        let material = Self::new(label);
        // fresh lock, cannot be occupied
        let _ = material.matcap.set(matcap);
        material
    }

    /// Bind the matcap. Returns `false` (and keeps the first one) if already bound.
    pub fn set_matcap(&self, matcap: MatcapImage) -> bool {
        match self.matcap.set(matcap) {
            Ok(()) => true,
            Err(rejected) => {
                log::warn!(
                    "material {} already has a matcap, ignoring {}",
                    self.label,
                    rejected.label
                );
                false
            }
        }
    }

    pub fn matcap(&self) -> Option<&MatcapImage> {
        self.matcap.get()
    }

    pub fn has_matcap(&self) -> bool {
        self.matcap.get().is_some()
    }
}
