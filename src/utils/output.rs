//! 输出路径与文件写入

use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{AppError, AppResult};

/// 默认输出路径：在扩展名前插入 -zh
///
/// 例如 `slides.tex` → `slides-zh.tex`。
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let suffix = input
        .extension()
        .and_then(|s| s.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_default();
    input.with_file_name(format!("{}-zh{}", stem, suffix))
}

/// 写出重组后的文档（UTF-8），必要时创建父目录
pub fn write_output(text: &str, path: &Path) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AppError::file_write_failed(path.display().to_string(), e))?;
        }
    }
    std::fs::write(path, text)
        .map_err(|e| AppError::file_write_failed(path.display().to_string(), e))?;
    info!("📄 输出已写入: {}", path.display());
    Ok(())
}
