pub mod action;
pub mod catalog;
pub mod pixelate;
pub mod reveal;
