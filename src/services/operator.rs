//! 操作员能力 - 业务能力层
//!
//! 把"问操作员"抽象成一个注入的能力接口：全自动运行和人工把关
//! 运行走同一套状态机，差别只是注入的实现（无操作 vs 阻塞读终端）。

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use async_trait::async_trait;

/// 操作员能力接口
#[async_trait]
pub trait Operator: Send + Sync {
    /// 是/否确认
    async fn confirm(&self, prompt: &str) -> Result<bool>;

    /// 请求一段文本输入（可为空）
    async fn ask_text(&self, prompt: &str) -> Result<String>;

    /// 等待操作员按回车确认继续
    async fn wait_for_ack(&self, prompt: &str) -> Result<()>;
}

/// 全自动操作员：一律放行
///
/// 这是系统里唯一允许无限等待的挂起点的"关闭档"。
pub struct AutoOperator;

#[async_trait]
impl Operator for AutoOperator {
    async fn confirm(&self, _prompt: &str) -> Result<bool> {
        Ok(true)
    }

    async fn ask_text(&self, _prompt: &str) -> Result<String> {
        Ok(String::new())
    }

    async fn wait_for_ack(&self, _prompt: &str) -> Result<()> {
        Ok(())
    }
}

/// 终端操作员：阻塞在标准输入上等待人工决定
pub struct ConsoleOperator;

impl ConsoleOperator {
    /// 读一行标准输入（在阻塞线程上执行，不占用运行时）
    async fn read_line(prompt: String) -> Result<String> {
        let line = tokio::task::spawn_blocking(move || -> Result<String> {
            let mut stdout = io::stdout();
            write!(stdout, "{}", prompt).context("写提示符失败")?;
            stdout.flush().context("刷新标准输出失败")?;

            let mut line = String::new();
            io::stdin()
                .lock()
                .read_line(&mut line)
                .context("读取标准输入失败")?;
            Ok(line.trim().to_string())
        })
        .await
        .context("标准输入任务失败")??;
        Ok(line)
    }
}

#[async_trait]
impl Operator for ConsoleOperator {
    async fn confirm(&self, prompt: &str) -> Result<bool> {
        loop {
            let answer = Self::read_line(format!("{} [y/n]: ", prompt)).await?;
            match answer.to_lowercase().as_str() {
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => continue,
            }
        }
    }

    async fn ask_text(&self, prompt: &str) -> Result<String> {
        Self::read_line(format!("{}: ", prompt)).await
    }

    async fn wait_for_ack(&self, prompt: &str) -> Result<()> {
        Self::read_line(format!("{} (回车继续) ", prompt)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_auto_operator_always_accepts() {
        let op = AutoOperator;
        assert!(op.confirm("内容是否正确?").await.unwrap());
        assert_eq!(op.ask_text("修正内容").await.unwrap(), "");
        op.wait_for_ack("继续").await.unwrap();
    }
}
