pub mod fetch;
pub mod install;
pub mod messages;
pub mod navigation;
