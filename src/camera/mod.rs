//! Camera state and movement

pub mod controller;
pub mod position;
pub mod update;

pub use controller::{CameraController, CompletionCallback};
pub use position::CameraPosition;
pub use update::{CameraAnimation, CameraChangeReason, CameraUpdate, CameraUpdateKind, CameraUpdateParams};
