use std::sync::Arc;

use chrono::Local;
use lesson_extractor::browser::connect_to_browser_and_page;
use lesson_extractor::config::Config;
use lesson_extractor::infrastructure::SessionDriver;
use lesson_extractor::models::{
    CrawlCheckpoint, ExtractedScreen, LessonRecord, ScreenContent, ScreenProgress,
    ScreenSignature, ScreenType,
};
use lesson_extractor::orchestrator::{App, RunMode};
use lesson_extractor::services::stuck_detector::{StuckDetector, StuckObservation};
use lesson_extractor::services::{AutoOperator, CheckpointStore, LessonWriter, ScreenClassifier};

// ========== 需要浏览器的测试（默认忽略，手动运行：cargo test -- --ignored） ==========

#[tokio::test]
#[ignore]
async fn test_browser_connection() {
    let config = Config::from_env();

    let result = connect_to_browser_and_page(config.browser_debug_port, &config.target_url).await;

    assert!(result.is_ok(), "应该能够成功连接浏览器");
}

#[tokio::test]
#[ignore]
async fn test_classify_current_screen() {
    let config = Config::from_env();

    let (_browser, page) =
        connect_to_browser_and_page(config.browser_debug_port, &config.target_url)
            .await
            .expect("连接浏览器失败");
    let driver = SessionDriver::new(page);

    let classifier = ScreenClassifier::new(&config);
    let observation = classifier.classify(&driver).await.expect("画面识别失败");

    println!(
        "识别到画面: {} (进度 {:?})",
        observation.screen_type, observation.progress
    );
}

#[tokio::test]
#[ignore]
async fn test_extract_current_lesson() {
    let config = Config::from_env();

    let app = App::initialize(config, Arc::new(AutoOperator), false)
        .await
        .expect("初始化应用失败");

    app.run(RunMode::Lesson { title: None })
        .await
        .expect("单课程抽取失败");
}

// ========== 不需要浏览器的端到端属性测试 ==========

fn screen(index: usize, progress: Option<(u32, u32)>) -> ExtractedScreen {
    ExtractedScreen {
        index,
        screen_type: ScreenType::Translation,
        instruction: None,
        content: ScreenContent::Raw {
            text: format!("screen-{}", index),
        },
        progress: progress.map(|(current, total)| ScreenProgress { current, total }),
        flagged: false,
        extracted_at: Local::now(),
    }
}

fn sig(screen_type: ScreenType, progress: Option<(u32, u32)>) -> ScreenSignature {
    ScreenSignature {
        screen_type,
        progress: progress.map(|(current, total)| ScreenProgress { current, total }),
    }
}

/// 卡死场景：画面 2 带着相同进度 {2,5} 重复出现 3 次
///
/// 期望：课程记录恰好 3 个画面（0..=2），卡死指向画面 2，
/// 且检查点始终不声称比课程文件更多的进度。
#[test]
fn test_stuck_scenario_keeps_three_screens_and_monotonic_checkpoint() {
    let dir = tempfile::tempdir().unwrap();
    let store = CheckpointStore::new(dir.path().join("checkpoints"));
    let writer = LessonWriter::new(dir.path().join("output"));

    let mut checkpoint = CrawlCheckpoint::empty("a1");
    checkpoint.begin_lesson(0, "数字");
    let mut record = LessonRecord::new(0, "数字", None, "a1");
    let mut detector = StuckDetector::new(3);

    // 画面 0、1 正常前进
    for (i, progress) in [(0usize, (1u32, 5u32)), (1, (2, 5))] {
        assert_eq!(
            detector.observe(&sig(ScreenType::Vocabulary, Some(progress))),
            StuckObservation::New
        );
        record.screens.push(screen(i, Some(progress)));
        writer.write(&record).unwrap();
        checkpoint.record_screen(record.screens.len());
        store.save(&checkpoint).unwrap();
    }

    // 画面 2 第一次出现：抽取 + 落盘
    let stuck_sig = sig(ScreenType::Translation, Some((2, 5)));
    assert_eq!(detector.observe(&stuck_sig), StuckObservation::New);
    record.screens.push(screen(2, Some((2, 5))));
    writer.write(&record).unwrap();
    checkpoint.record_screen(record.screens.len());
    store.save(&checkpoint).unwrap();

    // 随后 3 次重复观察：不再抽取，第 3 次判定卡死
    assert_eq!(detector.observe(&stuck_sig), StuckObservation::Repeat(1));
    assert_eq!(detector.observe(&stuck_sig), StuckObservation::Repeat(2));
    assert_eq!(detector.observe(&stuck_sig), StuckObservation::Stuck);

    let stuck_index = record.screens.len() - 1;
    assert_eq!(stuck_index, 2);

    // 落盘的课程记录恰好 3 个画面，检查点与之一致
    let partial = writer.load_partial(0, "数字").unwrap();
    assert_eq!(partial.screens.len(), 3);
    let loaded = store.load("a1").unwrap();
    assert_eq!(loaded.current_screen_index, 3);
}

/// 断点续传：模拟在任意画面落盘后崩溃
///
/// 重新加载后检查点的画面数必须恰好等于课程文件里的画面数，
/// 永远不能更多。
#[test]
fn test_checkpoint_never_exceeds_saved_screens() {
    let dir = tempfile::tempdir().unwrap();
    let store = CheckpointStore::new(dir.path().join("checkpoints"));
    let writer = LessonWriter::new(dir.path().join("output"));

    let mut checkpoint = CrawlCheckpoint::empty("a1");
    checkpoint.begin_lesson(0, "问候语");
    let mut record = LessonRecord::new(0, "问候语", None, "a1");

    for n in 0..5usize {
        record.screens.push(screen(n, None));
        // 顺序固定：先课程文件，后检查点
        writer.write(&record).unwrap();
        checkpoint.record_screen(record.screens.len());
        store.save(&checkpoint).unwrap();

        // 在这里"崩溃"：两个文件重新读回必须一致
        let reloaded_cp = store.load("a1").unwrap();
        let reloaded_record = writer.load_partial(0, "问候语").unwrap();
        assert_eq!(reloaded_cp.current_screen_index, reloaded_record.screens.len());
    }
}

/// 断点续传：已完成的课程在重跑时被整体跳过
#[test]
fn test_restart_skips_completed_lesson() {
    let dir = tempfile::tempdir().unwrap();
    let store = CheckpointStore::new(dir.path());

    // 第一次运行：L1 完成，L2 刚开始
    let mut checkpoint = CrawlCheckpoint::empty("a1");
    checkpoint.begin_lesson(0, "lesson-0");
    checkpoint.finalize_lesson(0, "lesson-0");
    checkpoint.begin_lesson(1, "lesson-1");
    store.save(&checkpoint).unwrap();

    // 重启进程：重新加载检查点
    let resumed = store.load("a1").unwrap();
    assert!(resumed.is_completed(0), "L1 必须被跳过");
    assert!(!resumed.is_completed(1));
    assert_eq!(resumed.current_lesson.as_deref(), Some("lesson-1"));
    assert_eq!(resumed.current_screen_index, 0, "L2 从画面 0 开始");
}
