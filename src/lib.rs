pub mod asset;
pub mod collection;
pub mod common;
pub mod gui;
pub mod logging;
pub mod media;
pub mod overlay;
pub mod settings;
pub mod startup;
pub mod store;
pub mod toast_log;
pub mod transcode;
