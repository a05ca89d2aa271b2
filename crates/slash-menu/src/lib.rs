mod command;
mod config;
mod error;
mod executor;
mod geometry;
mod list;
mod palette;
mod popup;
mod trigger;

pub use crate::command::*;
pub use crate::config::*;
pub use crate::error::*;
pub use crate::executor::execute;
pub use crate::geometry::*;
pub use crate::list::*;
pub use crate::palette::*;
pub use crate::popup::*;
pub use crate::trigger::*;
