mod chain;
mod core;
mod editing;
mod markup;
mod ops;
mod plugin;
mod transforms;
mod view;

pub use crate::chain::*;
pub use crate::core::*;
pub use crate::editing::text_block_paths;
pub use crate::markup::*;
pub use crate::ops::*;
pub use crate::plugin::*;
pub use crate::transforms::{BlockCx, CHAT_BUBBLE_PLACEHOLDER, ListType, MarkKind, TransformError};
pub use crate::view::*;

/// Default edits, exposed for hosts that drive key handling themselves.
pub mod edits {
    pub use crate::editing::{delete_backward, insert_text, move_left, move_right, move_vertical, split_block};
}
