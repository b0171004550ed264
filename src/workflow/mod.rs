pub mod screen_ctx;
pub mod screen_flow;

pub use screen_ctx::ScreenCtx;
pub use screen_flow::{ScreenFlow, ScreenOutcome};
