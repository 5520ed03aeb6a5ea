//! UI-facing chunk stream.
//!
//! ## Submodules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `ui_stream` | [`UiMessageStream`]: receiver side of a turn plus its stop signal |
//! | `accumulator` | [`UiMessageAccumulator`]: folds chunks into a `HyprUIMessage` |

pub mod accumulator;
pub mod ui_stream;

pub use accumulator::UiMessageAccumulator;
pub use ui_stream::UiMessageStream;
