//! 画面处理流程 - 流程层
//!
//! 核心职责：定义"一个画面"的完整处理流程
//!
//! 流程顺序：
//! 1. 注册表抽取（失败自动降级，不中断）
//! 2. 操作员把关（可选：接受 / 修正 / 标记待复查）
//! 3. 把结果交还编排层落盘

use std::sync::Arc;

use anyhow::Result;
use chrono::Local;
use tracing::{info, warn};

use crate::infrastructure::SessionDriver;
use crate::models::{ExtractedScreen, ScreenContent, ScreenObservation};
use crate::services::{ExtractorRegistry, Operator};
use crate::utils::logging::truncate_text;
use crate::workflow::screen_ctx::ScreenCtx;

/// 单个画面的处理结果
#[derive(Debug)]
pub enum ScreenOutcome {
    /// 画面抽取完成，等待落盘
    Keep(ExtractedScreen),
    /// 操作员拒绝继续，干净地中止运行
    Aborted,
}

/// 画面处理流程
///
/// - 编排单个画面的抽取和人工把关
/// - 不持有任何资源（page）
/// - 只依赖业务能力（services）
pub struct ScreenFlow {
    registry: ExtractorRegistry,
    operator: Arc<dyn Operator>,
    operator_gated: bool,
}

impl ScreenFlow {
    /// 创建新的画面处理流程
    pub fn new(registry: ExtractorRegistry, operator: Arc<dyn Operator>, operator_gated: bool) -> Self {
        Self {
            registry,
            operator,
            operator_gated,
        }
    }

    /// 处理一个画面：抽取 → （可选）人工把关
    pub async fn run(
        &self,
        driver: &SessionDriver,
        observation: &ScreenObservation,
        ctx: &ScreenCtx,
    ) -> Result<ScreenOutcome> {
        let content = self
            .registry
            .extract(driver, observation.screen_type)
            .await;

        let screen = ExtractedScreen {
            index: ctx.screen_index,
            screen_type: observation.screen_type,
            instruction: observation.instruction.clone(),
            content,
            progress: observation.progress,
            flagged: false,
            extracted_at: Local::now(),
        };

        if self.operator_gated {
            self.validate(screen, ctx).await
        } else {
            Ok(ScreenOutcome::Keep(screen))
        }
    }

    /// 操作员把关
    ///
    /// 抽取已经降级成错误记录时，先问操作员还要不要继续跑；
    /// 正常内容则给出预览，由操作员接受 / 修正 / 标记待复查。
    async fn validate(&self, mut screen: ExtractedScreen, ctx: &ScreenCtx) -> Result<ScreenOutcome> {
        if let ScreenContent::Error { message } = &screen.content {
            warn!("{} 抽取已降级为错误记录: {}", ctx, message);
            let go_on = self
                .operator
                .confirm("该画面抽取失败，是否继续运行?")
                .await?;
            if !go_on {
                return Ok(ScreenOutcome::Aborted);
            }
            screen.flagged = true;
            return Ok(ScreenOutcome::Keep(screen));
        }

        self.log_preview(&screen, ctx);
        let accepted = self.operator.confirm("以上抽取内容是否正确?").await?;
        if accepted {
            return Ok(ScreenOutcome::Keep(screen));
        }

        let replacement = self
            .operator
            .ask_text("输入修正后的文本（留空则仅标记待复查）")
            .await?;
        if replacement.is_empty() {
            screen.flagged = true;
            info!("{} 已标记为待复查", ctx);
        } else {
            screen.content = ScreenContent::Raw { text: replacement };
            info!("{} 内容已由操作员修正", ctx);
        }
        Ok(ScreenOutcome::Keep(screen))
    }

    /// 打印抽取内容预览
    fn log_preview(&self, screen: &ExtractedScreen, ctx: &ScreenCtx) {
        let preview = match &screen.content {
            ScreenContent::Structured { data } => data.to_string(),
            ScreenContent::Raw { text } => text.clone(),
            ScreenContent::Error { message } => message.clone(),
        };
        info!("{} 类型: {}", ctx, screen.screen_type);
        if let Some(instruction) = &screen.instruction {
            info!("{} 说明: {}", ctx, truncate_text(instruction, 80));
        }
        info!("{} 内容: {}", ctx, truncate_text(&preview, 200));
    }
}
