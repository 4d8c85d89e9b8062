use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Identifier of an asset within one running session.
pub type AssetId = u32;

/// Smallest width or height a pointer resize may produce.
pub const MIN_SIZE: u32 = 50;

/// Display size in pixels. Serialized as a `[width, height]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[u32; 2]", into = "[u32; 2]")]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Multiply both sides by `factor`, truncating toward zero.
    pub fn scaled(self, factor: f32) -> Self {
        Self {
            width: (self.width as f32 * factor) as u32,
            height: (self.height as f32 * factor) as u32,
        }
    }

    pub fn to_vec2(self) -> eframe::egui::Vec2 {
        eframe::egui::vec2(self.width as f32, self.height as f32)
    }
}

impl From<[u32; 2]> for Size {
    fn from([width, height]: [u32; 2]) -> Self {
        Self { width, height }
    }
}

impl From<Size> for [u32; 2] {
    fn from(size: Size) -> Self {
        [size.width, size.height]
    }
}

/// Snapshot of one overlay as written to the persisted asset list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub id: AssetId,
    pub path: PathBuf,
    pub is_hidden: bool,
    pub size: Size,
}

/// One row of the asset list shown in the main window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetListEntry {
    pub id: AssetId,
    pub label: String,
}

impl AssetListEntry {
    pub fn new(id: AssetId, path: &std::path::Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            id,
            label: format!("{id}: {name}"),
        }
    }
}
