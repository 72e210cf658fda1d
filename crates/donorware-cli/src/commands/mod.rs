pub mod init;
pub mod inventory;
pub mod items;
pub mod lending;
pub mod maintenance;
pub mod menu;
pub mod misc;
pub mod register;
