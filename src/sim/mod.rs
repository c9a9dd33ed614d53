pub mod controller;
pub mod event;
pub mod store;
