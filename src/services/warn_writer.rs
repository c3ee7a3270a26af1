//! 警告写入服务 - 业务能力层
//!
//! 只负责"把无法翻译的单元记进 warn 文件"能力，不关心流程。
//! 每条记录一行 JSON，方便事后筛查和重跑。

use std::fs::OpenOptions;
use std::io::Write;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::document::ContentUnit;

/// 警告写入服务
pub struct WarnWriter {
    warn_file_path: String,
}

impl WarnWriter {
    /// 创建新的警告写入服务
    pub fn new() -> Self {
        Self {
            warn_file_path: "warn.txt".to_string(),
        }
    }

    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            warn_file_path: path.into(),
        }
    }

    /// 记录一个无法翻译的单元
    ///
    /// # 参数
    /// - `unit`: 未能翻译的单元
    /// - `reason`: 失败原因
    pub fn write(&self, unit: &ContentUnit, reason: &str) -> AppResult<()> {
        debug!(
            "写入警告: 单元 {} ({}) | 原因: {}",
            unit.index, unit.kind, reason
        );

        let record = serde_json::json!({
            "unit_index": unit.index,
            "kind": unit.kind.name(),
            "reason": reason,
            "chars": unit.stripped_text.chars().count(),
            "time": chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        });

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.warn_file_path)
            .map_err(|e| AppError::file_write_failed(&self.warn_file_path, e))?;

        writeln!(file, "{}", record)
            .map_err(|e| AppError::file_write_failed(&self.warn_file_path, e))?;

        Ok(())
    }
}

impl Default for WarnWriter {
    fn default() -> Self {
        Self::new()
    }
}
