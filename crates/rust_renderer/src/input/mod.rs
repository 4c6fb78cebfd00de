//! Keyboard input handling

pub mod movement;

pub use movement::{KeyInput, KeyboardMovementController, MoveKey};
