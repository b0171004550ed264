//! 检查点存储 - 业务能力层
//!
//! 每个级别一个 JSON 文件。写入采用"先写临时文件再改名"的原子替换，
//! 改名前 sync 到磁盘，保证中途崩溃不会损坏已有检查点。
//! 检查点文件只有本进程一个写者，原子替换之外不需要加锁。

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::models::CrawlCheckpoint;

/// 检查点存储
pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    /// 创建检查点存储（目录不存在时自动创建）
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// 加载级别的检查点
    ///
    /// 文件不存在不是错误，返回零值检查点。
    pub fn load(&self, level_id: &str) -> AppResult<CrawlCheckpoint> {
        let path = self.path_for(level_id);
        if !path.exists() {
            info!("未找到检查点文件，从头开始: {}", path.display());
            return Ok(CrawlCheckpoint::empty(level_id));
        }

        let content = fs::read_to_string(&path)
            .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;
        let checkpoint: CrawlCheckpoint =
            serde_json::from_str(&content).map_err(AppError::from)?;

        info!(
            "✓ 已加载检查点: 完成 {} 节课, 当前课程 {:?} (画面 {})",
            checkpoint.completed_lessons.len(),
            checkpoint.current_lesson,
            checkpoint.current_screen_index
        );
        Ok(checkpoint)
    }

    /// 原子保存检查点
    pub fn save(&self, checkpoint: &CrawlCheckpoint) -> AppResult<()> {
        let path = self.path_for(&checkpoint.level_id);
        let json = serde_json::to_string_pretty(checkpoint).map_err(AppError::from)?;
        write_atomic(&path, json.as_bytes())?;
        debug!(
            "检查点已保存: 画面索引 {} ({})",
            checkpoint.current_screen_index,
            path.display()
        );
        Ok(())
    }

    /// 级别检查点的文件路径
    pub fn path_for(&self, level_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_id(level_id)))
    }
}

/// 原子写入：临时文件 → sync → 改名覆盖
pub fn write_atomic(path: &Path, bytes: &[u8]) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| AppError::file_write_failed(parent.display().to_string(), e))?;
    }

    let tmp_path = path.with_extension("json.tmp");
    {
        let mut file = File::create(&tmp_path)
            .map_err(|e| AppError::file_write_failed(tmp_path.display().to_string(), e))?;
        file.write_all(bytes)
            .map_err(|e| AppError::file_write_failed(tmp_path.display().to_string(), e))?;
        file.sync_all()
            .map_err(|e| AppError::file_write_failed(tmp_path.display().to_string(), e))?;
    }
    fs::rename(&tmp_path, path)
        .map_err(|e| AppError::file_write_failed(path.display().to_string(), e))?;
    Ok(())
}

/// 把任意标识清洗成安全的文件名
pub fn sanitize_id(id: &str) -> String {
    let cleaned: String = id
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use tempfile::tempdir;

    #[test]
    fn test_load_missing_returns_empty() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());

        let cp = store.load("a1").unwrap();
        assert_eq!(cp.level_id, "a1");
        assert!(cp.completed_lessons.is_empty());
        assert_eq!(cp.current_screen_index, 0);
    }

    #[test]
    fn test_save_then_load_roundtrip() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());

        let mut cp = CrawlCheckpoint::empty("a1");
        cp.begin_lesson(0, "问候语");
        cp.record_screen(4);
        store.save(&cp).unwrap();

        let loaded = store.load("a1").unwrap();
        assert_eq!(loaded.current_lesson.as_deref(), Some("问候语"));
        assert_eq!(loaded.current_screen_index, 4);
    }

    #[test]
    fn test_save_overwrites_and_leaves_no_tmp_file() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());

        let mut cp = CrawlCheckpoint::empty("a1");
        store.save(&cp).unwrap();
        cp.record_screen(1);
        cp.last_updated = Local::now();
        store.save(&cp).unwrap();

        let loaded = store.load("a1").unwrap();
        assert_eq!(loaded.current_screen_index, 1);

        // 临时文件在改名后不应残留
        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(entries, vec!["a1.json".to_string()]);
    }

    #[test]
    fn test_load_corrupt_checkpoint_is_storage_error() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        fs::write(dir.path().join("a1.json"), "{ 不是合法的 JSON").unwrap();

        let err = store.load("a1").unwrap_err();
        assert!(matches!(
            err,
            AppError::Storage(crate::error::StorageError::JsonFailed { .. })
        ));
    }

    #[test]
    fn test_sanitize_id() {
        assert_eq!(sanitize_id("A1"), "A1");
        assert_eq!(sanitize_id("german/a1 (beta)"), "german_a1__beta_");
        assert_eq!(sanitize_id(""), "_");
    }
}
