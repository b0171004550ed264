//! 批量抽取处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责级别批量抽取和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：启动日志、连接/启动浏览器、创建 SessionDriver
//! 2. **断点续传**：加载检查点，跳过已完成的课程
//! 3. **顺序处理**：远端会话是单一有状态资源，课程之间严格串行
//! 4. **失败分级**：打不开的课程跳过（批量继续）；卡死/未知画面/
//!    未捕获异常写故障报告后终止整个运行
//! 5. **资源管理**：唯一持有 Browser 和 SessionDriver 的模块
//! 6. **全局统计**：汇总本次运行的抽取结果

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chromiumoxide::Browser;
use tracing::{error, info, warn};

use crate::browser;
use crate::config::Config;
use crate::error::{AppError, BusinessError};
use crate::infrastructure::SessionDriver;
use crate::models::{CrawlCheckpoint, IssueKind, LessonInfo};
use crate::orchestrator::lesson_processor::{LessonOutcome, LessonProcessor};
use crate::services::checkpoint_store::sanitize_id;
use crate::services::{CheckpointStore, IssueDetails, IssueReporter, LessonNavigator, Operator};
use crate::utils::logging;

/// 运行模式
#[derive(Debug, Clone)]
pub enum RunMode {
    /// 单课程抽取：抽取当前打开的课程（或按标题打开）
    Lesson { title: Option<String> },
    /// 级别批量抽取
    Level { id: String, start: Option<usize> },
}

/// 应用主结构
pub struct App {
    config: Config,
    _browser: Browser,
    driver: SessionDriver,
    navigator: LessonNavigator,
    store: CheckpointStore,
    reporter: IssueReporter,
    processor: LessonProcessor,
}

impl App {
    /// 初始化应用
    pub async fn initialize(
        config: Config,
        operator: Arc<dyn Operator>,
        operator_gated: bool,
    ) -> Result<Self> {
        // 初始化日志文件
        logging::init_log_file(&config.output_log_file)?;
        log_startup(&config, operator_gated);

        // 连接或启动浏览器
        let (browser, page) = if config.launch_headless {
            browser::launch_headless_browser(&config.target_url, config.chrome_executable.as_deref())
                .await?
        } else {
            browser::connect_to_browser_and_page(config.browser_debug_port, &config.target_url)
                .await?
        };

        // 创建 SessionDriver（持有 page）
        let driver = SessionDriver::new(page);
        let processor = LessonProcessor::new(&config, operator, operator_gated);

        Ok(Self {
            store: CheckpointStore::new(&config.checkpoint_dir),
            reporter: IssueReporter::new(&config.issue_dir),
            navigator: LessonNavigator::new(),
            config,
            _browser: browser,
            driver,
            processor,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self, mode: RunMode) -> Result<()> {
        match mode {
            RunMode::Lesson { title } => self.run_single_lesson(title).await,
            RunMode::Level { id, start } => self.run_level(&id, start).await,
        }
    }

    /// 单课程模式
    async fn run_single_lesson(&self, title: Option<String>) -> Result<()> {
        let lesson = match title {
            Some(title) => {
                // 按标题在总览页上找到并打开课程
                let lessons = self.navigator.list_lessons(&self.driver, "single").await?;
                let lesson = lessons
                    .into_iter()
                    .find(|l| l.title == title)
                    .with_context(|| format!("总览页上找不到课程: {}", title))?;
                self.navigator.open_lesson(&self.driver, &lesson).await?;
                lesson
            }
            None => {
                info!("未指定标题，抽取当前打开的课程");
                LessonInfo {
                    index: 0,
                    title: "current_lesson".to_string(),
                    unit: None,
                }
            }
        };

        let session_id = format!("lesson_{}", sanitize_id(&lesson.title));
        let mut checkpoint = self.store.load(&session_id)?;

        let outcome = self.process_guarded(&lesson, &mut checkpoint).await?;
        self.require_success(&lesson, outcome)?;

        info!("\n✅ 单课程抽取完成: {}", lesson.title);
        Ok(())
    }

    /// 级别批量模式
    async fn run_level(&self, level_id: &str, start: Option<usize>) -> Result<()> {
        let mut checkpoint = self.store.load(level_id)?;
        let all_lessons = self.navigator.list_lessons(&self.driver, level_id).await?;

        let pending = lessons_to_process(&all_lessons, &checkpoint, start);
        log_level_plan(level_id, all_lessons.len(), pending.len(), &checkpoint);

        if pending.is_empty() {
            info!("✅ 级别 {} 没有待抽取的课程", level_id);
            return Ok(());
        }

        let mut stats = RunStats {
            total: pending.len(),
            ..Default::default()
        };

        for lesson in pending {
            // 打不开是课程级失败：记日志、跳过，批量继续
            if let Err(e) = self.navigator.open_lesson(&self.driver, &lesson).await {
                error!("[课程 {}] ❌ 无法打开，跳过: {}", lesson.index, e);
                stats.skipped += 1;
                continue;
            }

            let outcome = self.process_guarded(&lesson, &mut checkpoint).await?;
            self.require_success(&lesson, outcome)?;
            stats.success += 1;

            // 回到总览页准备下一节课
            self.navigator
                .back_to_overview(&self.driver, &self.config.target_url)
                .await?;
        }

        print_final_stats(&stats, &self.config);
        Ok(())
    }

    /// 处理一节课，把逃逸的异常按 Fatal 上报后再向上冒泡
    async fn process_guarded(
        &self,
        lesson: &LessonInfo,
        checkpoint: &mut CrawlCheckpoint,
    ) -> Result<LessonOutcome> {
        match self
            .processor
            .process_lesson(&self.driver, lesson, checkpoint)
            .await
        {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                error!("[课程 {}] ❌ 未捕获异常: {:#}", lesson.index, e);
                match self
                    .reporter
                    .report(
                        &self.driver,
                        IssueKind::Fatal,
                        IssueDetails {
                            lesson: Some(lesson.title.clone()),
                            screen_index: Some(checkpoint.current_screen_index),
                            detected_type: None,
                            detail: format!("{:#}", e),
                        },
                    )
                    .await
                {
                    Ok(bundle) => Err(e.context(format!(
                        "课程 {} 发生致命错误，故障报告: {}",
                        lesson.title,
                        bundle.display()
                    ))),
                    Err(report_err) => {
                        warn!("⚠️ 故障报告本身也写失败了: {}", report_err);
                        Err(e)
                    }
                }
            }
        }
    }

    /// 非完成终态一律结束运行（退出码非零），并指向故障报告目录
    fn require_success(&self, lesson: &LessonInfo, outcome: LessonOutcome) -> Result<()> {
        match outcome {
            LessonOutcome::Completed(_) => Ok(()),
            LessonOutcome::Stuck {
                screen_index,
                bundle,
            } => bail!(
                "课程 {} 在画面 {} 卡死，请先检查故障报告: {}",
                lesson.title,
                screen_index,
                bundle.display()
            ),
            LessonOutcome::UnknownScreen {
                screen_index,
                bundle,
            } => bail!(
                "课程 {} 在画面 {} 遇到未知画面类型，请先检查故障报告: {}",
                lesson.title,
                screen_index,
                bundle.display()
            ),
            LessonOutcome::Aborted => {
                Err(AppError::Business(BusinessError::OperatorAborted).into())
            }
        }
    }
}

/// 计算本次运行要处理的课程：跳过已完成的，和起始位置之前的
fn lessons_to_process(
    all_lessons: &[LessonInfo],
    checkpoint: &CrawlCheckpoint,
    start_override: Option<usize>,
) -> Vec<LessonInfo> {
    let start = start_override.unwrap_or(0);
    all_lessons
        .iter()
        .filter(|l| l.index >= start && !checkpoint.is_completed(l.index))
        .cloned()
        .collect()
}

/// 本次运行的统计
#[derive(Debug, Default)]
struct RunStats {
    success: usize,
    skipped: usize,
    total: usize,
}

// ========== 日志辅助函数 ==========

fn log_startup(config: &Config, operator_gated: bool) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 课程画面抽取模式");
    info!(
        "📊 卡死阈值: {} | 画面上限: {} | 人工把关: {}",
        config.stuck_threshold,
        config.max_screens_per_lesson,
        if operator_gated { "开" } else { "关" }
    );
    info!("{}", "=".repeat(60));
}

fn log_level_plan(level_id: &str, total: usize, pending: usize, checkpoint: &CrawlCheckpoint) {
    info!("\n{}", "=".repeat(60));
    info!("📦 级别 {}: 共 {} 节课", level_id, total);
    info!(
        "✓ 已完成 {} 节，本次待抽取 {} 节",
        checkpoint.completed_lessons.len(),
        pending
    );
    info!("{}", "=".repeat(60));
}

fn print_final_stats(stats: &RunStats, config: &Config) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("✅ 成功: {}/{}", stats.success, stats.total);
    info!("⏭️ 跳过: {}", stats.skipped);
    info!("{}", "=".repeat(60));
    info!("\n课程记录目录: {}", config.output_dir);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lessons(n: usize) -> Vec<LessonInfo> {
        (0..n)
            .map(|i| LessonInfo {
                index: i,
                title: format!("lesson-{}", i),
                unit: None,
            })
            .collect()
    }

    #[test]
    fn test_completed_lessons_are_skipped() {
        let all = lessons(3);
        let mut cp = CrawlCheckpoint::empty("a1");
        cp.finalize_lesson(0, "lesson-0");

        let pending = lessons_to_process(&all, &cp, None);
        let indexes: Vec<usize> = pending.iter().map(|l| l.index).collect();
        // L1 已完成 ⇒ 重跑必须直接从 L2 开始，绝不重抽 L1
        assert_eq!(indexes, vec![1, 2]);
    }

    #[test]
    fn test_start_override_skips_earlier_lessons() {
        let all = lessons(5);
        let cp = CrawlCheckpoint::empty("a1");

        let pending = lessons_to_process(&all, &cp, Some(3));
        let indexes: Vec<usize> = pending.iter().map(|l| l.index).collect();
        assert_eq!(indexes, vec![3, 4]);
    }

    #[test]
    fn test_override_and_checkpoint_combine() {
        let all = lessons(5);
        let mut cp = CrawlCheckpoint::empty("a1");
        cp.finalize_lesson(3, "lesson-3");

        let pending = lessons_to_process(&all, &cp, Some(2));
        let indexes: Vec<usize> = pending.iter().map(|l| l.index).collect();
        assert_eq!(indexes, vec![2, 4]);
    }

    #[test]
    fn test_all_completed_yields_empty_plan() {
        let all = lessons(2);
        let mut cp = CrawlCheckpoint::empty("a1");
        cp.finalize_lesson(0, "lesson-0");
        cp.finalize_lesson(1, "lesson-1");

        assert!(lessons_to_process(&all, &cp, None).is_empty());
    }
}
