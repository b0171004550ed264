//! # Lesson Extractor
//!
//! 一个把远端电子学习应用里的课程画面逐个抽取成结构化 JSON 的
//! Rust 应用程序，支持崩溃后断点续传。
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `SessionDriver` - 唯一的 page owner，提供 eval/导航/截图能力
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个画面
//! - `ScreenClassifier` - 画面识别能力（不认识就说不认识）
//! - `ExtractorRegistry` - 按类型分发的内容抽取能力（带兜底）
//! - `CheckpointStore` / `LessonWriter` - 原子落盘能力
//! - `StuckDetector` - 卡死判定能力
//! - `IssueReporter` - 故障现场打包能力
//! - `AdvancementDriver` - 前进 + 稳定等待能力
//! - `Operator` - 注入的操作员能力（自动 / 终端）
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个画面"的完整处理流程
//! - `ScreenCtx` - 上下文封装（级别 + 课程 + 画面序号）
//! - `ScreenFlow` - 流程编排（抽取 → 人工把关）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/lesson_processor` - 单课程状态机
//! - `orchestrator/batch_processor` - 级别批量处理器，管理资源和续传

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use browser::{connect_to_browser_and_page, launch_headless_browser};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::SessionDriver;
pub use models::{CrawlCheckpoint, ExtractedScreen, LessonRecord, ScreenObservation, ScreenType};
pub use orchestrator::{App, LessonOutcome, RunMode};
pub use workflow::{ScreenCtx, ScreenFlow, ScreenOutcome};
