//! 故障报告服务 - 业务能力层
//!
//! 在不可恢复的终止条件（未知画面 / 卡死 / 未捕获异常）下，把现场
//! 打包成一个诊断目录：整页截图 + 原始 HTML + 结构化 report.json。
//! 报告写完后由编排层终止运行；这里不做任何自动恢复。

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use tracing::{error, warn};

use crate::infrastructure::SessionDriver;
use crate::models::{IssueKind, IssueReport, ScreenType};

/// 调用方补充的故障细节
#[derive(Debug, Clone, Default)]
pub struct IssueDetails {
    pub lesson: Option<String>,
    pub screen_index: Option<usize>,
    pub detected_type: Option<ScreenType>,
    pub detail: String,
}

/// 故障报告服务
pub struct IssueReporter {
    issue_dir: PathBuf,
}

impl IssueReporter {
    /// 创建故障报告服务
    pub fn new(issue_dir: impl Into<PathBuf>) -> Self {
        Self {
            issue_dir: issue_dir.into(),
        }
    }

    /// 打包一份故障报告，返回诊断目录路径
    ///
    /// 截图和取源码是尽力而为：远端会话可能已经不可用，
    /// 拿不到的附件记 warn，report.json 必须写成功。
    pub async fn report(
        &self,
        driver: &SessionDriver,
        kind: IssueKind,
        details: IssueDetails,
    ) -> Result<PathBuf> {
        let now = Local::now();
        let id = format!("{}_{}", kind.as_str(), now.format("%Y%m%d_%H%M%S"));
        let bundle_dir = self.issue_dir.join(&id);
        fs::create_dir_all(&bundle_dir)
            .with_context(|| format!("创建故障目录失败: {}", bundle_dir.display()))?;

        error!("💥 正在打包故障现场: {}", bundle_dir.display());

        // 整页截图（尽力而为）
        match driver.screenshot_png().await {
            Ok(bytes) => {
                if let Err(e) = fs::write(bundle_dir.join("screenshot.png"), bytes) {
                    warn!("⚠️ 截图写入失败: {}", e);
                }
            }
            Err(e) => warn!("⚠️ 无法获取截图: {}", e),
        }

        // 原始 HTML（尽力而为）
        match driver.page_html().await {
            Ok(html) => {
                if let Err(e) = fs::write(bundle_dir.join("page.html"), html) {
                    warn!("⚠️ 页面源码写入失败: {}", e);
                }
            }
            Err(e) => warn!("⚠️ 无法获取页面源码: {}", e),
        }

        let url = driver.current_url().await.unwrap_or(None);

        let report = IssueReport {
            id,
            kind,
            timestamp: now,
            url,
            lesson: details.lesson,
            screen_index: details.screen_index,
            detected_type: details.detected_type,
            detail: details.detail,
        };
        write_report_json(&bundle_dir, &report)?;

        error!("📂 故障报告已写入: {}", bundle_dir.display());
        Ok(bundle_dir)
    }
}

fn write_report_json(bundle_dir: &Path, report: &IssueReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("序列化故障报告失败")?;
    let path = bundle_dir.join("report.json");
    fs::write(&path, json).with_context(|| format!("写入故障报告失败: {}", path.display()))?;
    Ok(())
}
