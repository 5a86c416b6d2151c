pub mod config;
pub mod controller;
pub mod signals;
pub mod subsystems;

pub use controller::Beacon;
