pub mod config;
pub mod game;
pub mod player;
pub mod protocol;
pub mod room_code;
pub mod scoring;
