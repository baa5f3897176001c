pub mod buffer;
pub mod communication;
pub mod config;
pub mod controller;
pub mod data;
pub mod display;
pub mod error;
pub mod logging;
pub mod messages;
pub mod ring;
pub mod topology;
