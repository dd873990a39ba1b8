//! Prompt input and screen rendering.
//!
//! - **renderer**: paints the scrollback viewport and the prompt row
//! - **keymapper**: key events to prompt actions
//! - **editor**: the pending command being typed

pub mod keymapper;
pub mod renderer;
pub mod editor;

pub use keymapper::{KeyAction, KeyMapper, Modifiers};
pub use renderer::Renderer;
pub use editor::LineEditor;
