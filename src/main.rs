use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

use lesson_extractor::config::Config;
use lesson_extractor::orchestrator::{App, RunMode};
use lesson_extractor::services::{AutoOperator, ConsoleOperator, Operator};
use lesson_extractor::utils::logging;

/// 课程画面抽取器
#[derive(Parser)]
#[command(name = "lesson_extractor", version, about = "抽取远端学习应用的课程内容")]
struct Cli {
    /// 每个画面抽取后由操作员人工把关
    #[arg(long, global = true)]
    confirm: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 抽取单节课（默认为当前打开的课程）
    Lesson {
        /// 课程标题（在总览页上查找并打开）
        #[arg(long)]
        title: Option<String>,
    },
    /// 按级别批量抽取
    Level {
        /// 级别标识（例如 a1）
        id: String,
        /// 从第几节课开始（覆盖默认起点，已完成的仍会跳过）
        #[arg(long)]
        start: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置
    let config = Config::from_env();

    // 初始化日志
    logging::init(config.verbose_logging);

    // 操作员能力：全自动 vs 终端把关
    let operator: Arc<dyn Operator> = if cli.confirm {
        Arc::new(ConsoleOperator)
    } else {
        Arc::new(AutoOperator)
    };

    let mode = match cli.command {
        Command::Lesson { title } => RunMode::Lesson { title },
        Command::Level { id, start } => RunMode::Level { id, start },
    };

    // 初始化并运行应用；任何终止性故障都会带着故障报告路径
    // 从这里冒泡出去，进程以非零退出码结束
    App::initialize(config, operator, cli.confirm)
        .await?
        .run(mode)
        .await?;

    Ok(())
}
