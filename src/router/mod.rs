//! Maps the current view to a screen and screen callbacks back to the
//! controller.

pub mod intent;
pub mod screen;

pub use intent::Intent;
pub use screen::{route, Screen};
