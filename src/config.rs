/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// 浏览器调试端口
    pub browser_debug_port: u16,
    /// 远端学习应用的入口URL
    pub target_url: String,
    /// 无头模式下使用的浏览器可执行文件（留空则用系统默认）
    pub chrome_executable: Option<String>,
    /// 是否以无头模式自行启动浏览器（否则连接调试端口）
    pub launch_headless: bool,
    /// 课程JSON输出目录
    pub output_dir: String,
    /// 检查点文件目录
    pub checkpoint_dir: String,
    /// 故障报告目录
    pub issue_dir: String,
    /// 运行日志文件
    pub output_log_file: String,
    /// 画面分类的总超时（毫秒）
    pub classify_timeout_ms: u64,
    /// 画面分类的轮询间隔（毫秒）
    pub classify_poll_ms: u64,
    /// 前进后等待画面稳定的超时（毫秒）
    pub settle_timeout_ms: u64,
    /// 稳定等待的轮询间隔（毫秒）
    pub settle_poll_ms: u64,
    /// 卡死判定阈值：同一签名连续重复多少次视为卡死
    pub stuck_threshold: usize,
    /// 单节课画面数的安全上限
    pub max_screens_per_lesson: usize,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            browser_debug_port: 9222,
            target_url: "https://app.lingopath.io/#/learn".to_string(),
            chrome_executable: None,
            launch_headless: false,
            output_dir: "output_lessons".to_string(),
            checkpoint_dir: "checkpoints".to_string(),
            issue_dir: "issues".to_string(),
            output_log_file: "output.txt".to_string(),
            classify_timeout_ms: 15_000,
            classify_poll_ms: 500,
            settle_timeout_ms: 10_000,
            settle_poll_ms: 400,
            stuck_threshold: 3,
            max_screens_per_lesson: 100,
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            browser_debug_port: std::env::var("BROWSER_DEBUG_PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(default.browser_debug_port),
            target_url: std::env::var("TARGET_URL").unwrap_or(default.target_url),
            chrome_executable: std::env::var("CHROME_EXECUTABLE").ok().or(default.chrome_executable),
            launch_headless: std::env::var("LAUNCH_HEADLESS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.launch_headless),
            output_dir: std::env::var("OUTPUT_DIR").unwrap_or(default.output_dir),
            checkpoint_dir: std::env::var("CHECKPOINT_DIR").unwrap_or(default.checkpoint_dir),
            issue_dir: std::env::var("ISSUE_DIR").unwrap_or(default.issue_dir),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            classify_timeout_ms: std::env::var("CLASSIFY_TIMEOUT_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.classify_timeout_ms),
            classify_poll_ms: std::env::var("CLASSIFY_POLL_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.classify_poll_ms),
            settle_timeout_ms: std::env::var("SETTLE_TIMEOUT_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.settle_timeout_ms),
            settle_poll_ms: std::env::var("SETTLE_POLL_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.settle_poll_ms),
            stuck_threshold: std::env::var("STUCK_THRESHOLD").ok().and_then(|v| v.parse().ok()).unwrap_or(default.stuck_threshold),
            max_screens_per_lesson: std::env::var("MAX_SCREENS_PER_LESSON").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_screens_per_lesson),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
        }
    }
}
