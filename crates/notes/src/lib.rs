mod editor;
mod note;
mod session;
mod store;

pub use crate::editor::*;
pub use crate::note::*;
pub use crate::session::*;
pub use crate::store::*;
