//! 前进驱动 - 业务能力层
//!
//! 负责把远端会话推进到下一个画面：练习类画面模拟一次合理作答，
//! 信息类画面点"继续"。动作发出后必须等画面真正稳定到一个新状态
//! （或者等待超时）才返回——不等稳定就返回是"假卡死"和重复抽取
//! 两类问题的头号来源。

use std::time::Duration;

use anyhow::Result;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::Config;
use crate::infrastructure::SessionDriver;
use crate::models::{ScreenObservation, ScreenSignature};
use crate::services::screen_classifier::ScreenClassifier;

/// 前进结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvanceResult {
    /// 是否确认远端进入了新画面
    pub advanced: bool,
}

/// 稳定等待的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SettleResult {
    /// 会话稳定到了一个与出发画面不同的状态
    Settled,
    /// 超时仍停在原画面；交给下一轮分类和卡死检测
    TimedOut,
}

/// 练习作答 JS：按画面类型模拟一次正确/合理的作答
///
/// 远端练习组件把正确答案写在 `data-correct` / `data-answer` 上，
/// 配对画面按 `data-pair` 键依次点击两列。作答后统一点检查和继续。
const SOLVE_EXERCISE_JS: &str = r#"
(() => {
    const root = document.querySelector('[data-screen]');
    if (!root) return { acted: false };

    // 选择题：点被标记为正确的选项
    const correct = root.querySelector('.option[data-correct="true"]');
    if (correct) correct.click();

    // 填空/翻译：把标准答案填进输入框
    const input = root.querySelector('input[type="text"], textarea');
    const answerEl = root.querySelector('[data-answer]');
    if (input && answerEl) {
        input.value = answerEl.getAttribute('data-answer');
        input.dispatchEvent(new Event('input', { bubbles: true }));
    }

    // 配对：按 pair 键依次点击左右两列
    const lefts = [...root.querySelectorAll('.match-column.left .match-item')];
    for (const left of lefts) {
        const key = left.getAttribute('data-pair');
        const right = root.querySelector(`.match-column.right .match-item[data-pair="${key}"]`);
        if (right) { left.click(); right.click(); }
    }

    const check = root.querySelector('button.check, [data-action="check"]');
    if (check && !check.disabled) check.click();
    const next = root.querySelector('button.continue, [data-action="continue"]');
    if (next && !next.disabled) next.click();
    return { acted: true };
})()
"#;

/// 信息类画面的"继续" JS
const CONTINUE_JS: &str = r#"
(() => {
    const btn = document.querySelector(
        '[data-screen] button.continue, [data-screen] [data-action="continue"], button.continue'
    );
    if (btn && !btn.disabled) { btn.click(); return { acted: true }; }
    return { acted: false };
})()
"#;

/// 前进驱动
pub struct AdvancementDriver {
    settle_timeout: Duration,
    poll_interval: Duration,
}

impl AdvancementDriver {
    /// 创建前进驱动
    pub fn new(config: &Config) -> Self {
        Self {
            settle_timeout: Duration::from_millis(config.settle_timeout_ms),
            poll_interval: Duration::from_millis(config.settle_poll_ms),
        }
    }

    /// 推进到下一画面
    ///
    /// 按画面类型选择作答或继续两种策略，然后等待会话稳定到新状态。
    /// `advanced: false` 表示动作发出后画面没有变化，由调用方的
    /// 卡死检测接管，这里不重试。
    pub async fn advance(
        &self,
        driver: &SessionDriver,
        observation: &ScreenObservation,
        classifier: &ScreenClassifier,
    ) -> Result<AdvanceResult> {
        let before = observation.signature();

        let js = if observation.screen_type.is_exercise() {
            debug!("练习画面 {}：模拟作答", observation.screen_type);
            SOLVE_EXERCISE_JS
        } else {
            debug!("信息画面 {}：点击继续", observation.screen_type);
            CONTINUE_JS
        };

        let acted = driver
            .eval(js)
            .await?
            .get("acted")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        if !acted {
            warn!("⚠️ 画面 {} 上没有找到可操作的控件", observation.screen_type);
        }

        match self.wait_for_settle(driver, classifier, &before).await? {
            SettleResult::Settled => Ok(AdvanceResult { advanced: true }),
            SettleResult::TimedOut => {
                warn!(
                    "⚠️ 前进后 {} 毫秒内画面未变化 (签名: {})",
                    self.settle_timeout.as_millis(),
                    before
                );
                Ok(AdvanceResult { advanced: false })
            }
        }
    }

    /// 等待会话稳定到一个与出发画面不同的可分类状态
    async fn wait_for_settle(
        &self,
        driver: &SessionDriver,
        classifier: &ScreenClassifier,
        before: &ScreenSignature,
    ) -> Result<SettleResult> {
        let started = tokio::time::Instant::now();
        loop {
            if let Some(observation) = classifier.probe_signature(driver).await? {
                let now = observation.signature();
                if &now != before {
                    debug!("画面已切换: {} → {}", before, now);
                    return Ok(SettleResult::Settled);
                }
            }
            if started.elapsed() >= self.settle_timeout {
                return Ok(SettleResult::TimedOut);
            }
            sleep(self.poll_interval).await;
        }
    }
}
