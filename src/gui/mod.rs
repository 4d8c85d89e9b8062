mod overlay_view;
#[cfg(target_os = "windows")]
mod tray;

pub use overlay_view::{show_overlay, OverlayView};

use crate::asset::{AssetId, Size};
use crate::collection::{AssetCollection, AssetError, PREVIEW_SIZE};
use crate::common::config_files::app_config_dir;
use crate::common::file_dialog::{show_error, AssetPicker, NativeAssetPicker};
use crate::media::ImageMediaLoader;
use crate::settings::Settings;
use crate::startup::{self, StartupRegistry};
use crate::store::AssetStore;
use crate::toast_log::{append_toast_log, TOAST_LOG_FILE};
use crate::transcode::ApngTranscoder;
use eframe::egui;
use egui_toast::{Toast, ToastKind, ToastOptions, Toasts};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// How often the main loop wakes up to poll the tray while nothing animates.
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(250);

const BACKGROUND_NOTICE: &str =
    "Asset Manager is running in the background. Use the tray icon to show it again.";
const NOTICE_SIZE: egui::Vec2 = egui::vec2(320.0, 70.0);

/// Every action reachable from the main window menu, the asset list and the tray.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuCommand {
    SelectAsset,
    ShowAssets,
    CloseAssets,
    MinimizeToBackground,
    RestoreFromBackground,
    SetRunAtStartup(bool),
    Preview(AssetId),
    ToggleVisibility(AssetId),
    DeleteAsset(AssetId),
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayAction {
    Restore,
    Exit,
}

/// Tray icon menu polled once per frame.
pub trait TrayMenu {
    fn poll(&self) -> Option<TrayAction>;
}

/// Collaborators of [`AssetManagerApp`] that tests replace.
pub struct AppParts {
    pub collection: AssetCollection,
    pub picker: Box<dyn AssetPicker>,
    pub startup: Box<dyn StartupRegistry>,
    /// `None` when no tray icon could be created; the app then never hides.
    pub tray: Option<Box<dyn TrayMenu>>,
    pub toast_log: PathBuf,
}

struct PreviewTexture {
    id: AssetId,
    display_size: Size,
    texture: egui::TextureHandle,
}

pub struct AssetManagerApp {
    collection: AssetCollection,
    picker: Box<dyn AssetPicker>,
    startup: Box<dyn StartupRegistry>,
    exe_path: Option<String>,
    run_at_startup: bool,
    views: HashMap<AssetId, OverlayView>,
    selected: Option<AssetId>,
    preview: Option<PreviewTexture>,
    toasts: Toasts,
    enable_toasts: bool,
    toast_duration: f32,
    toast_log: PathBuf,
    offscreen_pos: egui::Pos2,
    window_pos: Option<egui::Pos2>,
    in_background: bool,
    background_notice: Option<Instant>,
    saved_on_exit: bool,
    exit_unsaved: bool,
    closing: bool,
    last_tick: Instant,
    tray: Option<Box<dyn TrayMenu>>,
}

impl AssetManagerApp {
    /// Build the application with the native collaborators and restore the
    /// previous session.
    pub fn new(settings: &Settings, settings_path: &Path) -> Self {
        let store = AssetStore::new(settings.assets_path(settings_path));
        let parts = AppParts {
            collection: AssetCollection::new(
                store,
                Box::new(ImageMediaLoader),
                Box::new(ApngTranscoder),
            ),
            picker: Box::new(NativeAssetPicker),
            startup: startup::default_registry(),
            tray: native_tray(),
            toast_log: app_config_dir().join(TOAST_LOG_FILE),
        };
        let mut app = Self::with_parts(settings, parts);
        app.restore_session();
        app
    }

    pub fn with_parts(settings: &Settings, parts: AppParts) -> Self {
        let exe_path = match startup::current_exe_path() {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!("{e}");
                None
            }
        };
        let run_at_startup = exe_path
            .as_deref()
            .map(|exe| startup::is_run_at_startup(parts.startup.as_ref(), exe))
            .unwrap_or(false);
        let (ox, oy) = settings.offscreen_pos;

        Self {
            collection: parts.collection,
            picker: parts.picker,
            startup: parts.startup,
            exe_path,
            run_at_startup,
            views: HashMap::new(),
            selected: None,
            preview: None,
            toasts: Toasts::new().anchor(egui::Align2::RIGHT_BOTTOM, [-10.0, -10.0]),
            enable_toasts: settings.enable_toasts,
            toast_duration: settings.toast_duration,
            toast_log: parts.toast_log,
            offscreen_pos: egui::pos2(ox as f32, oy as f32),
            window_pos: None,
            in_background: false,
            background_notice: None,
            saved_on_exit: false,
            exit_unsaved: false,
            closing: false,
            last_tick: Instant::now(),
            tray: parts.tray,
        }
    }

    pub fn collection(&self) -> &AssetCollection {
        &self.collection
    }

    pub fn selected(&self) -> Option<AssetId> {
        self.selected
    }

    pub fn preview_size(&self) -> Option<Size> {
        self.preview.as_ref().map(|p| p.display_size)
    }

    pub fn run_at_startup(&self) -> bool {
        self.run_at_startup
    }

    pub fn in_background(&self) -> bool {
        self.in_background
    }

    pub fn can_run_in_background(&self) -> bool {
        self.tray.is_some()
    }

    pub fn background_notice_shown(&self) -> bool {
        self.background_notice.is_some()
    }

    /// `true` once the main window has been asked to close.
    pub fn closing(&self) -> bool {
        self.closing
    }

    /// Replay the saved asset list. Assets that fail to open are reported.
    pub fn restore_session(&mut self) {
        match self.collection.load_on_startup() {
            Ok(report) => {
                tracing::info!(restored = report.restored, failed = report.failed.len(), "session restored");
                for (path, e) in report.failed {
                    self.notify(
                        ToastKind::Warning,
                        format!("Could not restore {}: {e}", path.display()),
                    );
                }
            }
            Err(e) => {
                tracing::error!("failed to load saved assets: {e}");
                self.notify(ToastKind::Error, format!("Could not load saved assets: {e}"));
            }
        }
    }

    /// Save the collection once on the way out. A failed save can be retried.
    pub fn save_for_exit(&mut self) -> Result<(), AssetError> {
        if self.saved_on_exit {
            return Ok(());
        }
        self.collection.save()?;
        self.saved_on_exit = true;
        Ok(())
    }

    fn close(&mut self, ctx: &egui::Context) {
        self.closing = true;
        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
    }

    fn notify(&mut self, kind: ToastKind, text: String) {
        append_toast_log(&self.toast_log, &text);
        if self.enable_toasts {
            self.toasts.add(Toast {
                text: text.into(),
                kind,
                options: ToastOptions::default().duration_in_seconds(self.toast_duration as f64),
            });
        }
    }

    pub fn handle_command(&mut self, ctx: &egui::Context, command: MenuCommand) {
        tracing::debug!(?command, "menu command");
        match command {
            MenuCommand::SelectAsset => match self.collection.select_asset(self.picker.as_ref()) {
                Ok(Some(id)) => {
                    self.selected = Some(id);
                    self.update_preview(ctx, id);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!("failed to open asset: {e}");
                    self.notify(ToastKind::Error, format!("Could not open asset: {e}"));
                }
            },
            MenuCommand::ShowAssets => self.collection.show_all(ctx),
            MenuCommand::CloseAssets => {
                self.collection.close_assets();
                self.views.clear();
                self.selected = None;
                self.preview = None;
            }
            MenuCommand::MinimizeToBackground => {
                if self.tray.is_none() {
                    tracing::warn!("no tray icon; refusing to hide the main window");
                    self.notify(
                        ToastKind::Warning,
                        "No tray icon is available, so the window stays open".into(),
                    );
                } else if !self.in_background {
                    self.in_background = true;
                    ctx.send_viewport_cmd(egui::ViewportCommand::OuterPosition(self.offscreen_pos));
                    tracing::info!("running in the background");
                    append_toast_log(&self.toast_log, BACKGROUND_NOTICE);
                    self.background_notice = Some(
                        Instant::now() + Duration::from_secs_f32(self.toast_duration.max(1.0)),
                    );
                }
            }
            MenuCommand::RestoreFromBackground => {
                if self.in_background {
                    self.in_background = false;
                    self.background_notice = None;
                    let pos = self.window_pos.unwrap_or(egui::pos2(100.0, 100.0));
                    ctx.send_viewport_cmd(egui::ViewportCommand::OuterPosition(pos));
                    ctx.send_viewport_cmd(egui::ViewportCommand::Focus);
                }
            }
            MenuCommand::SetRunAtStartup(enable) => self.set_run_at_startup(enable),
            MenuCommand::Preview(id) => {
                self.selected = Some(id);
                self.update_preview(ctx, id);
            }
            MenuCommand::ToggleVisibility(id) => {
                self.collection.toggle_visibility(ctx, id);
            }
            MenuCommand::DeleteAsset(id) => {
                self.collection.delete_asset(id);
                self.views.remove(&id);
                if self.selected == Some(id) {
                    self.selected = None;
                }
                if self.preview.as_ref().map(|p| p.id) == Some(id) {
                    self.preview = None;
                }
            }
            MenuCommand::Exit => match self.save_for_exit() {
                Ok(()) => self.close(ctx),
                Err(e) if self.exit_unsaved => {
                    tracing::warn!("exiting without saving assets: {e}");
                    self.saved_on_exit = true;
                    self.close(ctx);
                }
                Err(e) => {
                    tracing::error!("failed to save assets on exit: {e}");
                    self.exit_unsaved = true;
                    if self.in_background {
                        self.handle_command(ctx, MenuCommand::RestoreFromBackground);
                    }
                    self.notify(
                        ToastKind::Error,
                        format!(
                            "Could not save assets: {e}. Choose Exit again to quit without saving."
                        ),
                    );
                }
            },
        }
    }

    fn set_run_at_startup(&mut self, enable: bool) {
        let Some(exe) = self.exe_path.clone() else {
            self.notify(ToastKind::Error, "Cannot determine the executable path".into());
            return;
        };
        if let Err(e) = startup::set_run_at_startup(self.startup.as_ref(), &exe, enable) {
            tracing::warn!("failed to update startup registration: {e}");
            self.notify(ToastKind::Error, format!("Could not change startup setting: {e}"));
        }
        self.run_at_startup = startup::is_run_at_startup(self.startup.as_ref(), &exe);
    }

    fn update_preview(&mut self, ctx: &egui::Context, id: AssetId) {
        self.preview = self.collection.preview(id).map(|preview| {
            let image = preview.image;
            let size = [image.width() as usize, image.height() as usize];
            PreviewTexture {
                id,
                display_size: preview.display_size,
                texture: ctx.load_texture(
                    "asset-preview",
                    egui::ColorImage::from_rgba_unmultiplied(size, image.as_raw()),
                    egui::TextureOptions::LINEAR,
                ),
            }
        });
    }

    fn menu_bar(&self, ctx: &egui::Context, commands: &mut Vec<MenuCommand>) {
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("Asset", |ui| {
                    let entries = [
                        ("Select Asset", MenuCommand::SelectAsset, true),
                        ("Show Assets", MenuCommand::ShowAssets, true),
                        ("Close Assets", MenuCommand::CloseAssets, true),
                        (
                            "Minimize (run in background)",
                            MenuCommand::MinimizeToBackground,
                            self.can_run_in_background(),
                        ),
                    ];
                    for (label, command, enabled) in entries {
                        if ui.add_enabled(enabled, egui::Button::new(label)).clicked() {
                            commands.push(command);
                            ui.close_menu();
                        }
                    }
                    let mut enabled = self.run_at_startup;
                    if ui.checkbox(&mut enabled, "Run at startup").clicked() {
                        commands.push(MenuCommand::SetRunAtStartup(enabled));
                        ui.close_menu();
                    }
                });
            });
        });
    }

    fn asset_panel(&self, ctx: &egui::Context, commands: &mut Vec<MenuCommand>) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let list_height = (ui.available_height() - PREVIEW_SIZE.height as f32 - 12.0).max(40.0);
            egui::ScrollArea::vertical()
                .max_height(list_height)
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    for entry in self.collection.list_entries() {
                        let response =
                            ui.selectable_label(self.selected == Some(entry.id), &entry.label);
                        if response.clicked() {
                            commands.push(MenuCommand::Preview(entry.id));
                        }
                        let hidden = self
                            .collection
                            .get(entry.id)
                            .map(|w| w.is_hidden())
                            .unwrap_or(false);
                        response.context_menu(|ui| {
                            if ui.button(if hidden { "Show" } else { "Hide" }).clicked() {
                                commands.push(MenuCommand::ToggleVisibility(entry.id));
                                ui.close_menu();
                            }
                            if ui.button("Delete").clicked() {
                                commands.push(MenuCommand::DeleteAsset(entry.id));
                                ui.close_menu();
                            }
                        });
                    }
                });
            ui.separator();
            self.preview_pane(ui);
        });
    }

    fn preview_pane(&self, ui: &mut egui::Ui) {
        let (rect, _) = ui.allocate_exact_size(PREVIEW_SIZE.to_vec2(), egui::Sense::hover());
        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, egui::Color32::from_gray(0x33));
        match &self.preview {
            Some(preview) => {
                let image_rect =
                    egui::Rect::from_center_size(rect.center(), preview.display_size.to_vec2());
                painter.image(
                    preview.texture.id(),
                    image_rect,
                    egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                    egui::Color32::WHITE,
                );
            }
            None => {
                painter.text(
                    rect.center(),
                    egui::Align2::CENTER_CENTER,
                    "Preview",
                    egui::FontId::proportional(14.0),
                    egui::Color32::LIGHT_GRAY,
                );
            }
        }
    }

    fn show_overlays(&mut self, ctx: &egui::Context) {
        for window in self.collection.overlays_mut() {
            let view = self.views.entry(window.id()).or_default();
            show_overlay(ctx, window, view);
        }
    }

    /// Command for the next tray menu click, if any.
    pub fn poll_tray(&self) -> Option<MenuCommand> {
        let action = self.tray.as_ref()?.poll()?;
        Some(match action {
            TrayAction::Restore => MenuCommand::RestoreFromBackground,
            TrayAction::Exit => MenuCommand::Exit,
        })
    }

    /// Small always-on-top window telling the user where the app went.
    fn show_background_notice(&mut self, ctx: &egui::Context) {
        let Some(until) = self.background_notice else {
            return;
        };
        if Instant::now() >= until {
            self.background_notice = None;
            return;
        }
        let monitor = ctx
            .input(|i| i.viewport().monitor_size)
            .unwrap_or(egui::vec2(1280.0, 720.0));
        let pos = (monitor - NOTICE_SIZE - egui::vec2(16.0, 56.0)).to_pos2();
        let builder = egui::ViewportBuilder::default()
            .with_title("Asset Manager")
            .with_decorations(false)
            .with_taskbar(false)
            .with_resizable(false)
            .with_window_level(egui::WindowLevel::AlwaysOnTop)
            .with_position(pos)
            .with_inner_size(NOTICE_SIZE);
        ctx.show_viewport_immediate(
            egui::ViewportId::from_hash_of("background-notice"),
            builder,
            |ctx, _class| {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.strong("Asset Manager");
                    ui.label(BACKGROUND_NOTICE);
                });
            },
        );
    }
}

#[cfg(target_os = "windows")]
fn native_tray() -> Option<Box<dyn TrayMenu>> {
    match tray::AssetTray::new() {
        Ok(tray) => Some(Box::new(tray)),
        Err(e) => {
            tracing::error!("failed to create tray icon: {e}");
            None
        }
    }
}

#[cfg(not(target_os = "windows"))]
fn native_tray() -> Option<Box<dyn TrayMenu>> {
    None
}

impl eframe::App for AssetManagerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if !self.in_background {
            // Skip frames where the restore move hasn't landed yet.
            if let Some(rect) = ctx.input(|i| i.viewport().outer_rect) {
                if rect.min.distance(self.offscreen_pos) > 1.0 {
                    self.window_pos = Some(rect.min);
                }
            }
        }

        let now = Instant::now();
        let next_frame = self.collection.advance_animations(now - self.last_tick);
        self.last_tick = now;

        let mut commands: Vec<MenuCommand> = self.poll_tray().into_iter().collect();
        self.menu_bar(ctx, &mut commands);
        self.asset_panel(ctx, &mut commands);
        for command in commands {
            self.handle_command(ctx, command);
        }

        self.show_overlays(ctx);
        self.show_background_notice(ctx);

        if self.enable_toasts {
            self.toasts.show(ctx);
        }

        let wake = next_frame.map_or(IDLE_POLL_INTERVAL, |d| d.min(IDLE_POLL_INTERVAL));
        ctx.request_repaint_after(wake);
    }

    fn clear_color(&self, _visuals: &egui::Visuals) -> [f32; 4] {
        // Overlay viewports rely on a fully transparent clear.
        [0.0; 4]
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if let Err(e) = self.save_for_exit() {
            tracing::error!("failed to save assets on exit: {e}");
            let msg = format!("Could not save assets: {e}");
            append_toast_log(&self.toast_log, &msg);
            show_error("Asset Manager", &msg);
        }
    }
}
