//! Per-asset overlay window: pointer driven drag/resize, visibility and
//! window level handling.
//!
//! All changes to the native window are issued as viewport commands through
//! [`ViewportCtx`], so the state machine can be driven without a GUI.

use crate::asset::{AssetId, AssetRecord, Size, MIN_SIZE};
use crate::media::{Animation, Media};
use eframe::egui::{self, ViewportCommand, ViewportId, WindowLevel};
use std::path::{Path, PathBuf};

/// Width of the band along the right and bottom edges that starts a resize.
pub const RESIZE_MARGIN: i32 = 10;

pub const SHRINK_FACTOR: f32 = 0.5;
pub const ENLARGE_FACTOR: f32 = 1.5;

/// Sink for viewport commands, implemented by [`egui::Context`] and by test doubles.
pub trait ViewportCtx {
    fn send_viewport_cmd_to(&self, id: ViewportId, cmd: ViewportCommand);
    fn request_repaint(&self);
}

impl ViewportCtx for egui::Context {
    fn send_viewport_cmd_to(&self, id: ViewportId, cmd: ViewportCommand) {
        egui::Context::send_viewport_cmd_to(self, id, cmd);
    }

    fn request_repaint(&self) {
        egui::Context::request_repaint(self);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    Idle,
    /// `anchor` is the pointer's global position minus the window's top-left.
    Dragging { anchor: (i32, i32) },
    Resizing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
}

/// Pointer input in window-local and screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    Press {
        button: PointerButton,
        local: (i32, i32),
        global: (i32, i32),
    },
    Move {
        local: (i32, i32),
        global: (i32, i32),
    },
    Release {
        button: PointerButton,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerOutcome {
    Ignored,
    Handled,
    /// Secondary press: the context menu should open at the pointer.
    ContextMenu {
        local: (i32, i32),
        global: (i32, i32),
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorHint {
    Default,
    ResizeDiagonal,
}

impl CursorHint {
    pub fn icon(self) -> egui::CursorIcon {
        match self {
            CursorHint::Default => egui::CursorIcon::Default,
            CursorHint::ResizeDiagonal => egui::CursorIcon::ResizeNwSe,
        }
    }
}

/// Entries of the overlay context menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayCommand {
    Shrink,
    Enlarge,
    RestoreOriginalSize,
    ToggleHidden,
    ToggleOverlap,
}

pub struct OverlayWindow {
    id: AssetId,
    path: PathBuf,
    media: Media,
    animation: Animation,
    original_size: Size,
    size: Size,
    position: (i32, i32),
    hidden: bool,
    allow_overlap: bool,
    interaction: Interaction,
}

impl OverlayWindow {
    pub fn new(id: AssetId, path: PathBuf, media: Media, position: (i32, i32)) -> Self {
        let original_size = media.native_size();
        let animation = media.animation();
        Self {
            id,
            path,
            media,
            animation,
            original_size,
            size: original_size,
            position,
            hidden: false,
            allow_overlap: false,
            interaction: Interaction::Idle,
        }
    }

    pub fn id(&self) -> AssetId {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn media(&self) -> &Media {
        &self.media
    }

    pub fn animation(&self) -> &Animation {
        &self.animation
    }

    pub fn animation_mut(&mut self) -> &mut Animation {
        &mut self.animation
    }

    pub fn original_size(&self) -> Size {
        self.original_size
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn position(&self) -> (i32, i32) {
        self.position
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn allow_overlap(&self) -> bool {
        self.allow_overlap
    }

    pub fn interaction(&self) -> Interaction {
        self.interaction
    }

    pub fn record(&self) -> AssetRecord {
        AssetRecord {
            id: self.id,
            path: self.path.clone(),
            is_hidden: self.hidden,
            size: self.size,
        }
    }

    pub fn viewport_id(&self) -> ViewportId {
        ViewportId::from_hash_of(("asset-overlay", self.id))
    }

    pub fn window_level(&self) -> WindowLevel {
        if self.allow_overlap {
            WindowLevel::Normal
        } else {
            WindowLevel::AlwaysOnTop
        }
    }

    /// Frameless, transparent tool window mirroring the current state.
    pub fn viewport_builder(&self) -> egui::ViewportBuilder {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        egui::ViewportBuilder::default()
            .with_title(name)
            .with_decorations(false)
            .with_transparent(true)
            .with_taskbar(false)
            .with_resizable(false)
            .with_window_level(self.window_level())
            .with_position([self.position.0 as f32, self.position.1 as f32])
            .with_inner_size(self.size.to_vec2())
            .with_visible(!self.hidden)
    }

    pub fn in_resize_zone(&self, local: (i32, i32)) -> bool {
        local.0 >= self.size.width as i32 - RESIZE_MARGIN
            && local.1 >= self.size.height as i32 - RESIZE_MARGIN
    }

    pub fn cursor_hint(&self, local: (i32, i32)) -> CursorHint {
        match self.interaction {
            Interaction::Resizing => CursorHint::ResizeDiagonal,
            Interaction::Dragging { .. } => CursorHint::Default,
            Interaction::Idle if self.in_resize_zone(local) => CursorHint::ResizeDiagonal,
            Interaction::Idle => CursorHint::Default,
        }
    }

    pub fn on_pointer(&mut self, ctx: &impl ViewportCtx, event: PointerEvent) -> PointerOutcome {
        match event {
            PointerEvent::Press {
                button: PointerButton::Secondary,
                local,
                global,
            } => PointerOutcome::ContextMenu { local, global },
            PointerEvent::Press {
                button: PointerButton::Primary,
                local,
                global,
            } => {
                self.interaction = if self.in_resize_zone(local) {
                    Interaction::Resizing
                } else {
                    Interaction::Dragging {
                        anchor: (global.0 - self.position.0, global.1 - self.position.1),
                    }
                };
                tracing::trace!(id = self.id, state = ?self.interaction, "overlay press");
                PointerOutcome::Handled
            }
            PointerEvent::Move { local, global } => match self.interaction {
                Interaction::Resizing => {
                    let width = local.0.max(MIN_SIZE as i32) as u32;
                    let height = local.1.max(MIN_SIZE as i32) as u32;
                    self.resize_to(ctx, Size::new(width, height));
                    PointerOutcome::Handled
                }
                Interaction::Dragging { anchor } => {
                    self.move_to(ctx, (global.0 - anchor.0, global.1 - anchor.1));
                    PointerOutcome::Handled
                }
                Interaction::Idle => PointerOutcome::Ignored,
            },
            PointerEvent::Release {
                button: PointerButton::Primary,
            } => {
                if self.interaction == Interaction::Idle {
                    return PointerOutcome::Ignored;
                }
                self.interaction = Interaction::Idle;
                PointerOutcome::Handled
            }
            PointerEvent::Release {
                button: PointerButton::Secondary,
            } => PointerOutcome::Ignored,
        }
    }

    /// Set the displayed size without applying the pointer-resize floor.
    pub fn resize_to(&mut self, ctx: &impl ViewportCtx, size: Size) {
        if size == self.size {
            return;
        }
        self.size = size;
        ctx.send_viewport_cmd_to(self.viewport_id(), ViewportCommand::InnerSize(size.to_vec2()));
    }

    pub fn move_to(&mut self, ctx: &impl ViewportCtx, position: (i32, i32)) {
        if position == self.position {
            return;
        }
        self.position = position;
        ctx.send_viewport_cmd_to(
            self.viewport_id(),
            ViewportCommand::OuterPosition(egui::pos2(position.0 as f32, position.1 as f32)),
        );
    }

    /// Track a position reported by the window system without echoing it back.
    pub fn sync_position(&mut self, position: (i32, i32)) {
        if self.interaction == Interaction::Idle {
            self.position = position;
        }
    }

    pub fn scale_to_original(&mut self, ctx: &impl ViewportCtx, factor: f32) {
        self.resize_to(ctx, self.original_size.scaled(factor));
    }

    pub fn set_hidden(&mut self, ctx: &impl ViewportCtx, hidden: bool) {
        if hidden == self.hidden {
            return;
        }
        self.hidden = hidden;
        if hidden {
            self.interaction = Interaction::Idle;
        }
        ctx.send_viewport_cmd_to(self.viewport_id(), ViewportCommand::Visible(!hidden));
        ctx.request_repaint();
        tracing::debug!(id = self.id, hidden, "overlay visibility changed");
    }

    pub fn toggle_hidden(&mut self, ctx: &impl ViewportCtx) {
        self.set_hidden(ctx, !self.hidden);
    }

    pub fn set_allow_overlap(&mut self, ctx: &impl ViewportCtx, allow: bool) {
        self.allow_overlap = allow;
        self.reapply_display_style(ctx);
    }

    /// Push the window level to the window manager.
    ///
    /// The level flags only take effect once the window is shown again, so a
    /// visible overlay is hidden and re-shown around the change. Size and
    /// position are left as they are.
    pub fn reapply_display_style(&mut self, ctx: &impl ViewportCtx) {
        let id = self.viewport_id();
        if !self.hidden {
            ctx.send_viewport_cmd_to(id, ViewportCommand::Visible(false));
        }
        ctx.send_viewport_cmd_to(id, ViewportCommand::WindowLevel(self.window_level()));
        if !self.hidden {
            ctx.send_viewport_cmd_to(id, ViewportCommand::Visible(true));
        }
        ctx.request_repaint();
        tracing::debug!(id = self.id, allow_overlap = self.allow_overlap, "display style applied");
    }

    pub fn apply_command(&mut self, ctx: &impl ViewportCtx, command: OverlayCommand) {
        match command {
            OverlayCommand::Shrink => self.scale_to_original(ctx, SHRINK_FACTOR),
            OverlayCommand::Enlarge => self.scale_to_original(ctx, ENLARGE_FACTOR),
            OverlayCommand::RestoreOriginalSize => self.scale_to_original(ctx, 1.0),
            OverlayCommand::ToggleHidden => self.toggle_hidden(ctx),
            OverlayCommand::ToggleOverlap => self.set_allow_overlap(ctx, !self.allow_overlap),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        commands: RefCell<Vec<ViewportCommand>>,
    }

    impl ViewportCtx for Recorder {
        fn send_viewport_cmd_to(&self, _id: ViewportId, cmd: ViewportCommand) {
            self.commands.borrow_mut().push(cmd);
        }

        fn request_repaint(&self) {}
    }

    fn window(w: u32, h: u32) -> OverlayWindow {
        OverlayWindow::new(
            1,
            PathBuf::from("pet.gif"),
            Media::still(RgbaImage::new(w, h)),
            (100, 100),
        )
    }

    #[test]
    fn resize_zone_is_bottom_right_band() {
        let win = window(100, 80);
        assert!(win.in_resize_zone((90, 70)));
        assert!(win.in_resize_zone((99, 79)));
        assert!(!win.in_resize_zone((89, 79)));
        assert!(!win.in_resize_zone((99, 69)));
    }

    #[test]
    fn hover_cursor_follows_zone() {
        let win = window(100, 80);
        assert_eq!(win.cursor_hint((95, 75)), CursorHint::ResizeDiagonal);
        assert_eq!(win.cursor_hint((10, 10)), CursorHint::Default);
    }

    #[test]
    fn secondary_press_requests_menu_without_state_change() {
        let ctx = Recorder::default();
        let mut win = window(100, 80);
        let outcome = win.on_pointer(
            &ctx,
            PointerEvent::Press {
                button: PointerButton::Secondary,
                local: (5, 6),
                global: (105, 106),
            },
        );
        assert_eq!(
            outcome,
            PointerOutcome::ContextMenu {
                local: (5, 6),
                global: (105, 106)
            }
        );
        assert_eq!(win.interaction(), Interaction::Idle);
    }

    #[test]
    fn scale_presets_use_original_size() {
        let ctx = Recorder::default();
        let mut win = window(100, 80);
        win.apply_command(&ctx, OverlayCommand::Enlarge);
        assert_eq!(win.size(), Size::new(150, 120));
        win.apply_command(&ctx, OverlayCommand::Enlarge);
        assert_eq!(win.size(), Size::new(150, 120));
        win.apply_command(&ctx, OverlayCommand::Shrink);
        assert_eq!(win.size(), Size::new(50, 40));
    }

    #[test]
    fn hidden_overlay_changes_level_without_showing() {
        let ctx = Recorder::default();
        let mut win = window(100, 80);
        win.set_hidden(&ctx, true);
        ctx.commands.borrow_mut().clear();
        win.apply_command(&ctx, OverlayCommand::ToggleOverlap);
        let cmds = ctx.commands.borrow();
        assert_eq!(cmds.len(), 1);
        assert!(matches!(
            cmds[0],
            ViewportCommand::WindowLevel(WindowLevel::Normal)
        ));
        assert!(win.is_hidden());
    }
}
