use asset_overlay::asset::Size;
use asset_overlay::media::Media;
use asset_overlay::overlay::{
    Interaction, OverlayCommand, OverlayWindow, PointerButton, PointerEvent, PointerOutcome,
};
use eframe::egui::{ViewportCommand, WindowLevel};
use image::RgbaImage;
use std::path::PathBuf;

use mock_ctx::MockCtx;

fn overlay(width: u32, height: u32) -> OverlayWindow {
    OverlayWindow::new(
        0,
        PathBuf::from("pet_temp.gif"),
        Media::still(RgbaImage::new(width, height)),
        (100, 100),
    )
}

fn press(local: (i32, i32), global: (i32, i32)) -> PointerEvent {
    PointerEvent::Press {
        button: PointerButton::Primary,
        local,
        global,
    }
}

fn release() -> PointerEvent {
    PointerEvent::Release {
        button: PointerButton::Primary,
    }
}

#[test]
fn resize_grows_from_fixed_corner() {
    let ctx = MockCtx::default();
    let mut win = overlay(120, 90);
    win.on_pointer(&ctx, press((115, 85), (215, 185)));
    assert_eq!(win.interaction(), Interaction::Resizing);

    win.on_pointer(
        &ctx,
        PointerEvent::Move {
            local: (200, 140),
            global: (300, 240),
        },
    );
    assert_eq!(win.size(), Size::new(200, 140));
    assert_eq!(win.position(), (100, 100));

    let cmds = ctx.take();
    assert_eq!(cmds.len(), 1);
    assert!(matches!(cmds[0], ViewportCommand::InnerSize(v) if v.x == 200.0 && v.y == 140.0));

    win.on_pointer(&ctx, release());
    assert_eq!(win.interaction(), Interaction::Idle);
}

#[test]
fn resize_never_goes_below_floor() {
    let ctx = MockCtx::default();
    for pointer in [(0, 0), (-40, 300), (300, -5), (49, 49), (-1000, -1000)] {
        let mut win = overlay(120, 90);
        win.on_pointer(&ctx, press((119, 89), (219, 189)));
        win.on_pointer(
            &ctx,
            PointerEvent::Move {
                local: pointer,
                global: (100 + pointer.0, 100 + pointer.1),
            },
        );
        let size = win.size();
        assert!(size.width >= 50 && size.height >= 50, "{pointer:?} gave {size:?}");
        win.on_pointer(&ctx, release());
    }
}

#[test]
fn drag_keeps_pointer_anchor() {
    let ctx = MockCtx::default();
    let mut win = overlay(120, 90);
    win.on_pointer(&ctx, press((5, 7), (105, 107)));
    assert_eq!(win.interaction(), Interaction::Dragging { anchor: (5, 7) });

    let outcome = win.on_pointer(
        &ctx,
        PointerEvent::Move {
            local: (30, 40),
            global: (400, 320),
        },
    );
    assert_eq!(outcome, PointerOutcome::Handled);
    assert_eq!(win.position(), (395, 313));
    assert_eq!(win.size(), Size::new(120, 90));

    let cmds = ctx.take();
    assert!(matches!(cmds[..], [ViewportCommand::OuterPosition(p)] if p.x == 395.0 && p.y == 313.0));

    win.on_pointer(&ctx, release());
    assert_eq!(win.interaction(), Interaction::Idle);
}

#[test]
fn release_always_returns_to_idle() {
    let ctx = MockCtx::default();
    let presses = [(0, 0), (60, 45), (115, 85), (119, 89), (110, 0)];
    let moves = [(-50, -50), (0, 0), (500, 500), (119, 89)];
    for start in presses {
        for to in moves {
            let mut win = overlay(120, 90);
            win.on_pointer(&ctx, press(start, (start.0 + 100, start.1 + 100)));
            assert_ne!(win.interaction(), Interaction::Idle);
            win.on_pointer(
                &ctx,
                PointerEvent::Move {
                    local: to,
                    global: (to.0 + 100, to.1 + 100),
                },
            );
            win.on_pointer(&ctx, release());
            assert_eq!(win.interaction(), Interaction::Idle);
        }
    }
}

#[test]
fn idle_moves_do_nothing() {
    let ctx = MockCtx::default();
    let mut win = overlay(120, 90);
    let outcome = win.on_pointer(
        &ctx,
        PointerEvent::Move {
            local: (10, 10),
            global: (110, 110),
        },
    );
    assert_eq!(outcome, PointerOutcome::Ignored);
    assert_eq!(win.on_pointer(&ctx, release()), PointerOutcome::Ignored);
    assert!(ctx.take().is_empty());
}

#[test]
fn restore_returns_load_time_size() {
    let ctx = MockCtx::default();
    let mut win = overlay(120, 90);
    win.apply_command(&ctx, OverlayCommand::Enlarge);
    win.on_pointer(&ctx, press((175, 130), (275, 230)));
    win.on_pointer(
        &ctx,
        PointerEvent::Move {
            local: (333, 77),
            global: (433, 177),
        },
    );
    win.on_pointer(&ctx, release());
    win.apply_command(&ctx, OverlayCommand::Shrink);
    assert_eq!(win.size(), Size::new(60, 45));

    win.apply_command(&ctx, OverlayCommand::RestoreOriginalSize);
    assert_eq!(win.size(), Size::new(120, 90));
    assert_eq!(win.size(), win.original_size());
}

#[test]
fn hide_toggle_flips_visibility() {
    let ctx = MockCtx::default();
    let mut win = overlay(120, 90);
    win.apply_command(&ctx, OverlayCommand::ToggleHidden);
    assert!(win.is_hidden());
    assert!(win.record().is_hidden);
    win.apply_command(&ctx, OverlayCommand::ToggleHidden);
    assert!(!win.is_hidden());

    let cmds = ctx.take();
    assert!(matches!(
        cmds[..],
        [ViewportCommand::Visible(false), ViewportCommand::Visible(true)]
    ));
}

#[test]
fn overlap_toggle_round_trip_restores_always_on_top() {
    let ctx = MockCtx::default();
    let mut win = overlay(120, 90);
    win.on_pointer(&ctx, press((10, 10), (110, 110)));
    win.on_pointer(
        &ctx,
        PointerEvent::Move {
            local: (10, 10),
            global: (250, 260),
        },
    );
    win.on_pointer(&ctx, release());
    ctx.take();
    assert_eq!(win.window_level(), WindowLevel::AlwaysOnTop);

    win.apply_command(&ctx, OverlayCommand::ToggleOverlap);
    assert!(win.allow_overlap());
    assert_eq!(win.window_level(), WindowLevel::Normal);
    let cmds = ctx.take();
    assert!(matches!(
        cmds[..],
        [
            ViewportCommand::Visible(false),
            ViewportCommand::WindowLevel(WindowLevel::Normal),
            ViewportCommand::Visible(true)
        ]
    ));

    win.apply_command(&ctx, OverlayCommand::ToggleOverlap);
    assert!(!win.allow_overlap());
    assert_eq!(win.window_level(), WindowLevel::AlwaysOnTop);
    let cmds = ctx.take();
    assert!(matches!(
        cmds[..],
        [
            ViewportCommand::Visible(false),
            ViewportCommand::WindowLevel(WindowLevel::AlwaysOnTop),
            ViewportCommand::Visible(true)
        ]
    ));

    assert_eq!(win.size(), Size::new(120, 90));
    assert_eq!(win.position(), (240, 250));
    assert!(!win.is_hidden());
}

#[test]
fn commands_target_the_overlay_viewport() {
    let ctx = MockCtx::default();
    let mut win = overlay(120, 90);
    win.apply_command(&ctx, OverlayCommand::Shrink);
    let sent = ctx.commands.lock().unwrap();
    assert!(sent.iter().all(|(id, _)| *id == win.viewport_id()));
}
