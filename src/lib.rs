pub mod debug;
pub mod door;
pub mod error;
pub mod input;
pub mod loader;
pub mod navigation;
pub mod player;
pub mod ron;
pub mod scene;
pub mod session;
pub mod settings;
pub mod ui;
