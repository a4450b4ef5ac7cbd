pub mod camera;
pub mod config;
pub mod cursor;
pub mod error;
pub mod event;
pub mod geometry;
pub mod interaction;
pub mod layer;
pub mod math;
pub mod picker;
pub mod session;
pub mod snap;
pub mod tessellation;

pub use error::{GeoeditError, Result};
pub use session::EditSession;
