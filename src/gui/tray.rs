use tray_icon::menu::{Menu, MenuEvent, MenuId, MenuItem, PredefinedMenuItem};
use tray_icon::{Icon, TrayIcon, TrayIconBuilder};

use super::{TrayAction, TrayMenu};

const ICON_SIZE: u32 = 32;

pub struct AssetTray {
    _tray_icon: TrayIcon,
    restore_id: MenuId,
    exit_id: MenuId,
}

impl AssetTray {
    pub fn new() -> anyhow::Result<Self> {
        let icon = Icon::from_rgba(icon_rgba(), ICON_SIZE, ICON_SIZE)?;

        let tray_menu = Menu::new();
        let restore_item = MenuItem::new("Show again", true, None);
        let separator = PredefinedMenuItem::separator();
        let exit_item = MenuItem::new("Exit", true, None);

        tray_menu.append(&restore_item)?;
        tray_menu.append(&separator)?;
        tray_menu.append(&exit_item)?;

        let tray_icon = TrayIconBuilder::new()
            .with_menu(Box::new(tray_menu))
            .with_tooltip("Asset Manager")
            .with_icon(icon)
            .build()?;

        Ok(Self {
            _tray_icon: tray_icon,
            restore_id: restore_item.id().clone(),
            exit_id: exit_item.id().clone(),
        })
    }
}

impl TrayMenu for AssetTray {
    /// Next pending tray menu action, if any.
    fn poll(&self) -> Option<TrayAction> {
        while let Ok(event) = MenuEvent::receiver().try_recv() {
            if event.id == self.restore_id {
                return Some(TrayAction::Restore);
            }
            if event.id == self.exit_id {
                return Some(TrayAction::Exit);
            }
        }
        None
    }
}

/// Rounded teal square with a lighter "picture frame" inset.
fn icon_rgba() -> Vec<u8> {
    let mut data = Vec::with_capacity((ICON_SIZE * ICON_SIZE * 4) as usize);
    for y in 0..ICON_SIZE {
        for x in 0..ICON_SIZE {
            let edge = x.min(y).min(ICON_SIZE - 1 - x).min(ICON_SIZE - 1 - y);
            let corner = (x < 3 || x > ICON_SIZE - 4) && (y < 3 || y > ICON_SIZE - 4);
            let pixel = if corner {
                [0, 0, 0, 0]
            } else if (6..=8).contains(&edge) {
                [220, 245, 240, 255]
            } else {
                [24, 140, 130, 255]
            };
            data.extend_from_slice(&pixel);
        }
    }
    data
}
