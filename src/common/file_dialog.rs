use std::path::PathBuf;

#[cfg(target_os = "windows")]
pub use rfd::FileDialog;

#[cfg(not(target_os = "windows"))]
pub struct FileDialog;

#[cfg(not(target_os = "windows"))]
impl FileDialog {
    pub fn new() -> Self { FileDialog }
    pub fn set_title(self, _title: &str) -> Self { self }
    pub fn add_filter(self, _name: &str, _exts: &[&str]) -> Self { self }
    pub fn pick_file(self) -> Option<PathBuf> { None }
}

/// Blocking error box for failures that happen after the main window is gone.
#[cfg(target_os = "windows")]
pub fn show_error(title: &str, message: &str) {
    let _ = rfd::MessageDialog::new()
        .set_level(rfd::MessageLevel::Error)
        .set_title(title)
        .set_description(message)
        .set_buttons(rfd::MessageButtons::Ok)
        .show();
}

#[cfg(not(target_os = "windows"))]
pub fn show_error(title: &str, message: &str) {
    tracing::error!(title, "{message}");
}

/// Asks the user for an asset file. `None` means the dialog was cancelled.
pub trait AssetPicker {
    fn pick_asset(&self) -> Option<PathBuf>;
}

/// Native open-file dialog filtered to GIF/APNG, with an "All Files" fallback.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeAssetPicker;

impl AssetPicker for NativeAssetPicker {
    fn pick_asset(&self) -> Option<PathBuf> {
        FileDialog::new()
            .set_title("Select asset")
            .add_filter("Images", &["gif", "apng"])
            .add_filter("All Files", &["*"])
            .pick_file()
    }
}
