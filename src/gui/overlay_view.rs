use crate::asset::AssetId;
use crate::overlay::{
    OverlayCommand, OverlayWindow, PointerButton, PointerEvent, PointerOutcome, ViewportCtx,
};
use eframe::egui;

/// Size of the context menu popup, independent of the overlay it belongs to.
const MENU_SIZE: egui::Vec2 = egui::vec2(200.0, 150.0);

/// GPU textures and context-menu state for one overlay viewport.
#[derive(Default)]
pub struct OverlayView {
    textures: Vec<egui::TextureHandle>,
    menu: Option<MenuPopup>,
}

/// Open context menu, shown as its own top-level window.
#[derive(Debug, Clone, Copy, PartialEq)]
struct MenuPopup {
    /// Screen position of the right-click.
    at: egui::Pos2,
    /// Set once the popup has had keyboard focus; losing it afterwards dismisses it.
    focused: bool,
}

enum MenuOutcome {
    Open,
    Dismissed,
    Chosen(OverlayCommand),
}

impl OverlayView {
    fn ensure_textures(&mut self, ctx: &egui::Context, window: &OverlayWindow) {
        if !self.textures.is_empty() {
            return;
        }
        self.textures = window
            .media()
            .frames()
            .iter()
            .enumerate()
            .map(|(i, frame)| {
                let size = [frame.image.width() as usize, frame.image.height() as usize];
                ctx.load_texture(
                    format!("asset-{}-{}", window.id(), i),
                    egui::ColorImage::from_rgba_unmultiplied(size, frame.image.as_raw()),
                    egui::TextureOptions::LINEAR,
                )
            })
            .collect();
    }

    fn menu_position(&self) -> Option<egui::Pos2> {
        self.menu.map(|m| m.at)
    }

    fn open_menu(&mut self, global: (i32, i32)) {
        self.menu = Some(MenuPopup {
            at: egui::pos2(global.0 as f32, global.1 as f32),
            focused: false,
        });
    }

    fn close_menu(&mut self) {
        self.menu = None;
    }

    /// Feed one pointer event to the overlay. Any press on the overlay
    /// dismisses an open menu; a secondary press opens a new one.
    fn route_pointer(
        &mut self,
        ctx: &impl ViewportCtx,
        window: &mut OverlayWindow,
        event: PointerEvent,
    ) {
        if matches!(event, PointerEvent::Press { .. }) {
            self.close_menu();
        }
        if let PointerOutcome::ContextMenu { global, .. } = window.on_pointer(ctx, event) {
            self.open_menu(global);
        }
    }
}

fn menu_viewport_id(id: AssetId) -> egui::ViewportId {
    egui::ViewportId::from_hash_of(("asset-overlay-menu", id))
}

fn menu_viewport_builder(at: egui::Pos2) -> egui::ViewportBuilder {
    egui::ViewportBuilder::default()
        .with_title("Asset menu")
        .with_decorations(false)
        .with_taskbar(false)
        .with_resizable(false)
        .with_window_level(egui::WindowLevel::AlwaysOnTop)
        .with_position(at)
        .with_inner_size(MENU_SIZE)
}

/// Render `window` in its own native viewport and feed it this frame's input.
/// An open context menu gets a second viewport at the click position.
pub fn show_overlay(ctx: &egui::Context, window: &mut OverlayWindow, view: &mut OverlayView) {
    view.ensure_textures(ctx, window);
    if window.is_hidden() {
        view.close_menu();
    }
    let viewport_id = window.viewport_id();
    let builder = window.viewport_builder();
    ctx.show_viewport_immediate(viewport_id, builder, |ctx, _class| {
        overlay_ui(ctx, window, view);
    });

    let Some(mut popup) = view.menu else {
        return;
    };
    let outcome = ctx.show_viewport_immediate(
        menu_viewport_id(window.id()),
        menu_viewport_builder(popup.at),
        |ctx, _class| menu_ui(ctx, window, &mut popup),
    );
    match outcome {
        MenuOutcome::Open => view.menu = Some(popup),
        MenuOutcome::Dismissed => view.close_menu(),
        MenuOutcome::Chosen(command) => {
            view.close_menu();
            window.apply_command(ctx, command);
        }
    }
}

fn overlay_ui(ctx: &egui::Context, window: &mut OverlayWindow, view: &mut OverlayView) {
    let (outer, close_requested, events, hover) = ctx.input(|i| {
        (
            i.viewport().outer_rect,
            i.viewport().close_requested(),
            i.events.clone(),
            i.pointer.hover_pos(),
        )
    });

    if close_requested {
        // Closing an overlay from the OS only hides it; deletion goes through the list.
        ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
        window.set_hidden(ctx, true);
        view.close_menu();
        return;
    }

    let origin = match outer {
        Some(rect) => {
            let origin = (rect.min.x.round() as i32, rect.min.y.round() as i32);
            window.sync_position(origin);
            origin
        }
        None => window.position(),
    };

    for event in events.iter().filter_map(|e| translate(e, origin)) {
        view.route_pointer(ctx, window, event);
    }
    if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
        view.close_menu();
    }

    if let Some(pos) = hover {
        let local = (pos.x as i32, pos.y as i32);
        ctx.set_cursor_icon(window.cursor_hint(local).icon());
    }

    egui::CentralPanel::default()
        .frame(egui::Frame::none())
        .show(ctx, |ui| {
            // Stretched to the window bounds; aspect ratio is not kept.
            if let Some(texture) = view.textures.get(window.animation().current_frame()) {
                ui.painter().image(
                    texture.id(),
                    ctx.screen_rect(),
                    egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                    egui::Color32::WHITE,
                );
            }
        });
}

fn menu_ui(ctx: &egui::Context, window: &OverlayWindow, popup: &mut MenuPopup) -> MenuOutcome {
    let (close_requested, focused, escape) = ctx.input(|i| {
        (
            i.viewport().close_requested(),
            i.viewport().focused,
            i.key_pressed(egui::Key::Escape),
        )
    });
    if close_requested || escape {
        return MenuOutcome::Dismissed;
    }
    match focused {
        Some(true) => popup.focused = true,
        Some(false) if popup.focused => return MenuOutcome::Dismissed,
        _ => ctx.send_viewport_cmd(egui::ViewportCommand::Focus),
    }

    let mut outcome = MenuOutcome::Open;
    egui::CentralPanel::default()
        .frame(egui::Frame::menu(&ctx.style()))
        .show(ctx, |ui| {
            ui.vertical_centered_justified(|ui| {
                if ui.button("Shrink").clicked() {
                    outcome = MenuOutcome::Chosen(OverlayCommand::Shrink);
                }
                if ui.button("Enlarge").clicked() {
                    outcome = MenuOutcome::Chosen(OverlayCommand::Enlarge);
                }
                if ui.button("Restore original size").clicked() {
                    outcome = MenuOutcome::Chosen(OverlayCommand::RestoreOriginalSize);
                }
                let visibility = if window.is_hidden() { "Show" } else { "Hide" };
                if ui.button(visibility).clicked() {
                    outcome = MenuOutcome::Chosen(OverlayCommand::ToggleHidden);
                }
                ui.separator();
                let mut overlap = window.allow_overlap();
                if ui
                    .checkbox(&mut overlap, "Allow other windows on top")
                    .clicked()
                {
                    outcome = MenuOutcome::Chosen(OverlayCommand::ToggleOverlap);
                }
            });
        });
    outcome
}

fn translate(event: &egui::Event, origin: (i32, i32)) -> Option<PointerEvent> {
    let to_points = |pos: egui::Pos2| {
        let local = (pos.x as i32, pos.y as i32);
        (local, (origin.0 + local.0, origin.1 + local.1))
    };
    match event {
        egui::Event::PointerMoved(pos) => {
            let (local, global) = to_points(*pos);
            Some(PointerEvent::Move { local, global })
        }
        egui::Event::PointerButton {
            pos,
            button,
            pressed,
            ..
        } => {
            let button = match button {
                egui::PointerButton::Primary => PointerButton::Primary,
                egui::PointerButton::Secondary => PointerButton::Secondary,
                _ => return None,
            };
            if *pressed {
                let (local, global) = to_points(*pos);
                Some(PointerEvent::Press {
                    button,
                    local,
                    global,
                })
            } else {
                Some(PointerEvent::Release { button })
            }
        }
        _ => None,
    }
}
