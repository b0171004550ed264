//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和状态机调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量抽取处理器
//! - 管理应用生命周期（初始化、运行、统计）
//! - 加载检查点并跳过已完成课程
//! - 课程之间严格串行（远端会话是单一有状态资源）
//! - 管理浏览器资源（Browser、SessionDriver）
//!
//! ### `lesson_processor` - 单课程处理器
//! - 单节课的抽取状态机（识别 → 抽取 → 把关 → 落盘 → 前进）
//! - 卡死检测与画面数安全上限
//! - 未知画面 / 卡死走故障报告后终止
//! - 课程定稿与检查点登记
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<LessonInfo>)
//!     ↓
//! lesson_processor (处理单节课的画面循环)
//!     ↓
//! workflow::ScreenFlow (处理单个画面)
//!     ↓
//! services (能力层：classify / extract / checkpoint / advance / report)
//!     ↓
//! infrastructure (基础设施：SessionDriver)
//! ```

pub mod batch_processor;
pub mod lesson_processor;

// 重新导出主要类型
pub use batch_processor::{App, RunMode};
pub use lesson_processor::{LessonOutcome, LessonProcessor};
