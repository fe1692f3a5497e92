pub mod color;
pub mod icon;
