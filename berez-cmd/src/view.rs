//! Show or change the persisted list/map preference.

use crate::config::Config;
use berez_state::ViewMode;

pub fn run_view(config: &Config, set: Option<ViewMode>, toggle: bool) -> anyhow::Result<()> {
    let view = config.view(None);
    if let Some(mode) = set {
        view.set_mode(mode);
    }
    if toggle {
        view.toggle();
    }
    println!("{}", view.mode());
    Ok(())
}
