//! 画面分类器 - 业务能力层
//!
//! 只负责"当前画面是什么"这一件事：轮询远端画面直到稳定，
//! 返回类型标签、进度计数和题目说明。
//!
//! 两条铁律：
//! 1. 不认识的画面必须返回 `Unknown`，绝不就近猜测；
//! 2. 超时窗口内没有稳定画面 ⇒ `ClassifyError::Timeout`，向上报告，不静默重试。

use std::time::Duration;

use anyhow::Result;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, ClassifyError};
use crate::infrastructure::SessionDriver;
use crate::models::{ScreenObservation, ScreenProgress, ScreenType};

/// 单次探针的原始返回
///
/// `ready=false` 表示页面还在加载（根节点缺失或遮罩层可见），
/// 这种状态不参与稳定性判断。
#[derive(Debug, Clone, PartialEq, Deserialize)]
struct ProbeResult {
    ready: bool,
    marker: Option<String>,
    progress: Option<String>,
    instruction: Option<String>,
}

/// 探针 JS：从画面根节点读取标记、进度和说明文字
///
/// 远端应用把画面类型写在 `[data-screen]` 上；进度指示器和说明
/// 文字分别有稳定的选择器。探针只读不写。
const PROBE_JS: &str = r#"
(() => {
    const root = document.querySelector('[data-screen]');
    const loader = document.querySelector('.loading-overlay, .spinner');
    if (!root || (loader && loader.offsetParent !== null)) {
        return { ready: false, marker: null, progress: null, instruction: null };
    }
    const progressEl = document.querySelector('.progress-indicator, [data-progress]');
    const instructionEl = root.querySelector('.screen-instruction, .exercise-prompt');
    return {
        ready: true,
        marker: root.getAttribute('data-screen'),
        progress: progressEl ? progressEl.textContent.trim() : null,
        instruction: instructionEl ? instructionEl.textContent.trim() : null,
    };
})()
"#;

/// 画面分类器
///
/// 职责：
/// - 轮询探针直到画面稳定
/// - 把 DOM 标记映射为 ScreenType
/// - 只处理单个画面，不出现 Vec<ExtractedScreen>
/// - 不关心流程顺序
pub struct ScreenClassifier {
    timeout: Duration,
    poll_interval: Duration,
}

impl ScreenClassifier {
    /// 创建新的画面分类器
    pub fn new(config: &Config) -> Self {
        Self {
            timeout: Duration::from_millis(config.classify_timeout_ms),
            poll_interval: Duration::from_millis(config.classify_poll_ms),
        }
    }

    /// 识别当前画面
    ///
    /// 轮询直到连续两次探针结果一致（画面稳定）为止；
    /// 超时窗口内没等到稳定画面则返回 `ClassifyError::Timeout`。
    pub async fn classify(&self, driver: &SessionDriver) -> Result<ScreenObservation> {
        let started = tokio::time::Instant::now();
        let mut last_probe: Option<ProbeResult> = None;

        loop {
            let probe = self.probe(driver).await?;

            if probe.ready {
                // 连续两次一致才算稳定，避免在过渡动画中途抽取
                if last_probe.as_ref() == Some(&probe) {
                    return Ok(self.observation_from(&probe));
                }
                last_probe = Some(probe);
            } else {
                debug!("页面尚未就绪，继续等待");
                last_probe = None;
            }

            if started.elapsed() >= self.timeout {
                return Err(AppError::classify_timeout(started.elapsed().as_millis() as u64).into());
            }
            sleep(self.poll_interval).await;
        }
    }

    /// 单次探针（不等待稳定）
    ///
    /// 前进驱动的稳定等待也用它来比对签名。
    pub async fn probe_signature(
        &self,
        driver: &SessionDriver,
    ) -> Result<Option<ScreenObservation>> {
        let probe = self.probe(driver).await?;
        if probe.ready {
            Ok(Some(self.observation_from(&probe)))
        } else {
            Ok(None)
        }
    }

    async fn probe(&self, driver: &SessionDriver) -> Result<ProbeResult> {
        let raw = driver.eval(PROBE_JS).await?;
        Ok(probe_from_value(raw)?)
    }

    fn observation_from(&self, probe: &ProbeResult) -> ScreenObservation {
        let marker = probe.marker.as_deref().unwrap_or_default();
        let screen_type = ScreenType::from_marker(marker);
        if screen_type == ScreenType::Unknown {
            warn!("⚠️ 未识别的画面标记: {:?}", probe.marker);
        }

        ScreenObservation {
            screen_type,
            progress: probe.progress.as_deref().and_then(parse_progress),
            instruction: probe
                .instruction
                .as_deref()
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        }
    }
}

/// 解析探针的原始返回
///
/// 结构对不上说明远端改版或脚本被注入失败，按分类错误上报。
fn probe_from_value(raw: JsonValue) -> AppResult<ProbeResult> {
    serde_json::from_value(raw).map_err(|e| {
        AppError::Classify(ClassifyError::BadProbeResult {
            detail: e.to_string(),
        })
    })
}

/// 从进度指示器文本解析进度计数
///
/// 支持 "3 / 17"、"3/17" 等写法；解析不出来就当作没有进度。
pub fn parse_progress(text: &str) -> Option<ScreenProgress> {
    let re = Regex::new(r"(\d+)\s*/\s*(\d+)").ok()?;
    let caps = re.captures(text)?;
    let current = caps.get(1)?.as_str().parse().ok()?;
    let total = caps.get(2)?.as_str().parse().ok()?;
    Some(ScreenProgress { current, total })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_progress_plain() {
        assert_eq!(
            parse_progress("3/17"),
            Some(ScreenProgress { current: 3, total: 17 })
        );
        assert_eq!(
            parse_progress("3 / 17"),
            Some(ScreenProgress { current: 3, total: 17 })
        );
    }

    #[test]
    fn test_parse_progress_with_surrounding_text() {
        assert_eq!(
            parse_progress("第 2 / 5 步"),
            Some(ScreenProgress { current: 2, total: 5 })
        );
    }

    #[test]
    fn test_parse_progress_garbage_is_none() {
        assert_eq!(parse_progress(""), None);
        assert_eq!(parse_progress("加载中..."), None);
        assert_eq!(parse_progress("17"), None);
    }

    #[test]
    fn test_bad_probe_payload_is_classify_error() {
        let raw = serde_json::json!({ "ready": "不是布尔值" });
        let err = probe_from_value(raw).unwrap_err();
        assert!(matches!(
            err,
            AppError::Classify(ClassifyError::BadProbeResult { .. })
        ));
    }

    #[test]
    fn test_observation_from_unknown_marker() {
        let classifier = ScreenClassifier {
            timeout: Duration::from_millis(100),
            poll_interval: Duration::from_millis(10),
        };
        let probe = ProbeResult {
            ready: true,
            marker: Some("shiny-new-widget".to_string()),
            progress: Some("2/5".to_string()),
            instruction: None,
        };
        let obs = classifier.observation_from(&probe);
        // 未知标记必须落到 Unknown，同时进度照常解析
        assert_eq!(obs.screen_type, ScreenType::Unknown);
        assert_eq!(obs.progress, Some(ScreenProgress { current: 2, total: 5 }));
    }

    #[test]
    fn test_observation_empty_instruction_is_none() {
        let classifier = ScreenClassifier {
            timeout: Duration::from_millis(100),
            poll_interval: Duration::from_millis(10),
        };
        let probe = ProbeResult {
            ready: true,
            marker: Some("tip".to_string()),
            progress: None,
            instruction: Some(String::new()),
        };
        let obs = classifier.observation_from(&probe);
        assert_eq!(obs.screen_type, ScreenType::Tip);
        assert!(obs.instruction.is_none());
    }
}
