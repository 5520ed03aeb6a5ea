//! Tool-loop agent.
//!
//! ## Submodules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `tool_loop` | [`ToolLoopAgent`]: window → model call → stream → tools → loop |
//! | `tool_executor` | Look up and run one tool call |
//! | `chunk_sink` | Channel wrapper the loop emits UI chunks into |
//! | `stop` | [`StopCondition`] step cap |
//! | `window` | [`WindowPolicy`] per-step history truncation |

pub mod chunk_sink;
pub mod stop;
pub mod tool_executor;
pub mod tool_loop;
pub mod window;

pub use chunk_sink::ChunkSink;
pub use stop::StopCondition;
pub use tool_loop::{AgentOutcome, RunEnd, ToolLoopAgent};
pub use window::WindowPolicy;
