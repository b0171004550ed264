//! 单课程处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块负责单节课的抽取状态机，是课程级别的编排器。
//!
//! 状态循环：识别 → 抽取 → （可选）人工把关 → 落盘检查点 → 前进 → 识别 …
//!
//! 退出路径：
//! - 终止画面 ⇒ 课程完成（定稿 + 检查点登记）
//! - 卡死阈值 / 画面数安全上限 ⇒ Stuck（写故障报告后终止运行）
//! - 未知画面类型 ⇒ UnknownScreen（写故障报告后终止运行）
//! - 操作员拒绝继续 ⇒ Aborted（检查点已落盘，干净中止）
//! - 其余异常向上冒泡，由批量层按 Fatal 处理
//!
//! 每个画面的"抽取 + 落盘"是一个小事务：课程文件先写、检查点后记，
//! 要么整体完成要么整体没发生，绝不留下半套状态。

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::Config;
use crate::infrastructure::SessionDriver;
use crate::models::{CrawlCheckpoint, IssueKind, LessonInfo, LessonRecord};
use crate::services::{
    AdvancementDriver, CheckpointStore, ExtractorRegistry, IssueDetails, IssueReporter,
    LessonWriter, Operator, ScreenClassifier, StuckDetector, StuckObservation,
};
use crate::workflow::{ScreenCtx, ScreenFlow, ScreenOutcome};

/// 单节课抽取的终态
#[derive(Debug)]
pub enum LessonOutcome {
    /// 观察到终止画面，课程记录已定稿
    Completed(LessonRecord),
    /// 卡死（签名重复达到阈值，或触发画面数安全上限）
    Stuck { screen_index: usize, bundle: PathBuf },
    /// 分类器返回了未知画面类型
    UnknownScreen { screen_index: usize, bundle: PathBuf },
    /// 操作员拒绝继续
    Aborted,
}

/// 单课程处理器
pub struct LessonProcessor {
    config: Config,
    classifier: ScreenClassifier,
    flow: ScreenFlow,
    advancement: AdvancementDriver,
    writer: LessonWriter,
    store: CheckpointStore,
    reporter: IssueReporter,
}

impl LessonProcessor {
    /// 创建单课程处理器
    pub fn new(config: &Config, operator: Arc<dyn Operator>, operator_gated: bool) -> Self {
        Self {
            config: config.clone(),
            classifier: ScreenClassifier::new(config),
            flow: ScreenFlow::new(ExtractorRegistry::new(), operator, operator_gated),
            advancement: AdvancementDriver::new(config),
            writer: LessonWriter::new(&config.output_dir),
            store: CheckpointStore::new(&config.checkpoint_dir),
            reporter: IssueReporter::new(&config.issue_dir),
        }
    }

    /// 处理一节课，直到某个终态
    pub async fn process_lesson(
        &self,
        driver: &SessionDriver,
        lesson: &LessonInfo,
        checkpoint: &mut CrawlCheckpoint,
    ) -> Result<LessonOutcome> {
        let mut record = self.resume_or_new(lesson, checkpoint)?;
        let mut detector = StuckDetector::new(self.config.stuck_threshold);

        log_lesson_start(lesson, record.screens.len());

        loop {
            // 画面数安全上限：即便签名比对被骗过，也保证不会无限循环
            if record.screens.len() >= self.config.max_screens_per_lesson {
                warn!(
                    "[课程 {}] ⚠️ 达到画面数安全上限 {}",
                    lesson.index, self.config.max_screens_per_lesson
                );
                let bundle = self
                    .report_stuck(
                        driver,
                        lesson,
                        &record,
                        format!("画面数达到安全上限 {}", self.config.max_screens_per_lesson),
                    )
                    .await?;
                return Ok(LessonOutcome::Stuck {
                    screen_index: record.screens.len().saturating_sub(1),
                    bundle,
                });
            }

            // ========== 识别 ==========
            let observation = self.classifier.classify(driver).await?;
            let screen_index = record.screens.len();

            // 未知画面：报告后终止，不猜测、不重试
            if observation.screen_type == crate::models::ScreenType::Unknown {
                log_screen(lesson, screen_index, &observation);
                let bundle = self
                    .reporter
                    .report(
                        driver,
                        IssueKind::UnknownScreen,
                        IssueDetails {
                            lesson: Some(lesson.title.clone()),
                            screen_index: Some(screen_index),
                            detected_type: Some(observation.screen_type),
                            detail: "分类器无法识别当前画面".to_string(),
                        },
                    )
                    .await?;
                return Ok(LessonOutcome::UnknownScreen {
                    screen_index,
                    bundle,
                });
            }

            // 终止画面：定稿并登记
            if observation.screen_type.is_terminal() {
                log_screen(lesson, screen_index, &observation);
                return self.finalize_lesson(lesson, record, checkpoint);
            }

            // ========== 卡死检测 ==========
            match detector.observe(&observation.signature()) {
                StuckObservation::Stuck => {
                    let bundle = self
                        .report_stuck(
                            driver,
                            lesson,
                            &record,
                            format!(
                                "签名 {} 连续重复 {} 次",
                                observation.signature(),
                                detector.repeat_count()
                            ),
                        )
                        .await?;
                    return Ok(LessonOutcome::Stuck {
                        screen_index: record.screens.len().saturating_sub(1),
                        bundle,
                    });
                }
                StuckObservation::Repeat(n) => {
                    // 同一画面再次出现：没有追加记录，叙述的仍是上次抽取的序号
                    log_screen(
                        lesson,
                        observed_screen_index(record.screens.len(), true),
                        &observation,
                    );
                    warn!(
                        "[课程 {}] ⚠️ 画面未前进 (第 {} 次重复)，重试前进",
                        lesson.index, n
                    );
                }
                StuckObservation::New => {
                    log_screen(lesson, screen_index, &observation);
                    // ========== 抽取 + 把关 ==========
                    let ctx = ScreenCtx::new(
                        checkpoint.level_id.clone(),
                        lesson.title.clone(),
                        lesson.index,
                        screen_index,
                    );
                    match self.flow.run(driver, &observation, &ctx).await? {
                        ScreenOutcome::Aborted => {
                            info!("[课程 {}] 操作员中止，检查点已是最新", lesson.index);
                            return Ok(LessonOutcome::Aborted);
                        }
                        ScreenOutcome::Keep(screen) => {
                            // ========== 落盘（先课程文件，后检查点） ==========
                            record.screens.push(screen);
                            self.writer
                                .write(&record)
                                .context("写入课程记录失败")?;
                            checkpoint.record_screen(record.screens.len());
                            self.store.save(checkpoint).context("保存检查点失败")?;
                        }
                    }
                }
            }

            // ========== 前进 ==========
            let advance = self
                .advancement
                .advance(driver, &observation, &self.classifier)
                .await?;
            if !advance.advanced {
                warn!(
                    "[课程 {}] ⚠️ 未确认前进，下一轮重新识别",
                    lesson.index
                );
            }
        }
    }

    /// 崩溃后续传：优先复用已落盘的部分课程记录
    fn resume_or_new(
        &self,
        lesson: &LessonInfo,
        checkpoint: &mut CrawlCheckpoint,
    ) -> Result<LessonRecord> {
        let resume_index = checkpoint.begin_lesson(lesson.index, &lesson.title);
        if resume_index > 0 {
            if let Some(partial) = self.writer.load_partial(lesson.index, &lesson.title) {
                info!(
                    "[课程 {}] ♻️ 从画面 {} 续传 (检查点记录 {})",
                    lesson.index,
                    partial.screens.len(),
                    resume_index
                );
                // 以课程文件为准：它才是真正持久化的进度
                checkpoint.record_screen(partial.screens.len());
                self.store.save(checkpoint)?;
                return Ok(partial);
            }
            warn!(
                "[课程 {}] 检查点记录了画面 {} 但找不到部分课程文件，从头抽取",
                lesson.index, resume_index
            );
            checkpoint.record_screen(0);
            self.store.save(checkpoint)?;
        }
        Ok(LessonRecord::new(
            lesson.index,
            lesson.title.clone(),
            lesson.unit.clone(),
            checkpoint.level_id.clone(),
        ))
    }

    /// 课程定稿：写入画面总数、登记检查点
    fn finalize_lesson(
        &self,
        lesson: &LessonInfo,
        mut record: LessonRecord,
        checkpoint: &mut CrawlCheckpoint,
    ) -> Result<LessonOutcome> {
        record.finalize();
        let path = self.writer.write(&record).context("定稿课程记录失败")?;
        checkpoint.finalize_lesson(lesson.index, &lesson.title);
        self.store.save(checkpoint).context("保存检查点失败")?;

        info!(
            "[课程 {}] ✅ 课程完成: {} 个画面, 已写入 {}",
            lesson.index,
            record.screens.len(),
            path.display()
        );
        Ok(LessonOutcome::Completed(record))
    }

    async fn report_stuck(
        &self,
        driver: &SessionDriver,
        lesson: &LessonInfo,
        record: &LessonRecord,
        detail: String,
    ) -> Result<PathBuf> {
        let screen_index = record.screens.len().saturating_sub(1);
        let detected_type = record.screens.last().map(|s| s.screen_type);
        self.reporter
            .report(
                driver,
                IssueKind::Stuck,
                IssueDetails {
                    lesson: Some(lesson.title.clone()),
                    screen_index: Some(screen_index),
                    detected_type,
                    detail,
                },
            )
            .await
    }
}

// ========== 日志辅助函数 ==========

/// 观察到的画面在课程记录里的序号
///
/// 重复观察不追加记录，叙述的仍是上一次抽取时的序号。
fn observed_screen_index(saved_screens: usize, is_repeat: bool) -> usize {
    if is_repeat {
        saved_screens.saturating_sub(1)
    } else {
        saved_screens
    }
}

fn log_lesson_start(lesson: &LessonInfo, resumed_screens: usize) {
    info!("\n[课程 {}] {}", lesson.index, "─".repeat(30));
    info!("[课程 {}] 开始抽取: {}", lesson.index, lesson.title);
    if let Some(unit) = &lesson.unit {
        info!("[课程 {}] 单元: {}", lesson.index, unit);
    }
    if resumed_screens > 0 {
        info!("[课程 {}] 已有 {} 个画面，继续抽取", lesson.index, resumed_screens);
    }
}

fn log_screen(lesson: &LessonInfo, screen_index: usize, observation: &crate::models::ScreenObservation) {
    match observation.progress {
        Some(p) => info!(
            "[课程 {}] 画面 {}: {} (进度 {}/{})",
            lesson.index, screen_index, observation.screen_type, p.current, p.total
        ),
        None => info!(
            "[课程 {}] 画面 {}: {}",
            lesson.index, screen_index, observation.screen_type
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeat_observation_keeps_previous_screen_index() {
        // 已落盘 3 个画面（0..=2）：重复观察叙述的是画面 2，而不是 3
        assert_eq!(observed_screen_index(3, true), 2);
        assert_eq!(observed_screen_index(3, false), 3);
        // 还没有任何画面时的重复观察不下溢
        assert_eq!(observed_screen_index(0, true), 0);
    }
}
