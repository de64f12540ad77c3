pub mod app;
pub mod audio;
pub mod browser;
pub mod config;
pub mod input;
pub mod library;
pub mod logging;
pub mod menu;
pub mod model;
pub mod navigation;
pub mod screen;
pub mod session;
pub mod text;
pub mod ui;
