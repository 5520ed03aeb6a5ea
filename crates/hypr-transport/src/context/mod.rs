//! Context injection.
//!
//! ## Submodules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `resolver` | [`ContextResolver`]: ref → hydrated session context |
//! | `renderer` | [`ContextRenderer`] and the built-in [`TemplateContextRenderer`] |
//! | `injection` | [`ContextInjector`]: resolve, render, prepend per user message |

pub mod injection;
pub mod renderer;
pub mod resolver;

pub use injection::ContextInjector;
pub use renderer::{ContextRenderer, RenderOutput, RenderStatus, TemplateContextRenderer};
pub use resolver::ContextResolver;
