pub mod events;
pub mod gestures;
pub mod handler;

// Re-export the essential types
pub use events::{EventManager, InputEvent, MapEvent, TouchEventType, TouchPoint};
pub use gestures::{Gesture, GestureConfig, GestureMode, GestureRecognizer};
pub use handler::{GestureAction, GestureHandler};
