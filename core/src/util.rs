//! General utilities that are not specific to any pipeline stage.

pub mod buf;
pub mod t3ds;
