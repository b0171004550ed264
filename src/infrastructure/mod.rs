//! 基础设施层（Infrastructure Layer）
//!
//! 持有稀缺资源（Page），只向上暴露能力。

pub mod session_driver;

pub use session_driver::SessionDriver;
