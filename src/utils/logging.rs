//! 日志工具模块
//!
//! 提供日志格式化和输出的辅助函数

use tracing::info;

use crate::config::Config;
use crate::models::document::BeamerDocument;
use crate::services::batcher::UnitBatch;

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - Beamer 课件翻译");
    info!("📊 批次上限: {} 单元 / {} token", config.batch_size, config.max_tokens);
    info!("📊 最大并发批次: {}", config.max_concurrent_batches);
    info!("{}", "=".repeat(60));
}

/// 记录解析结果
pub fn log_document_parsed(doc: &BeamerDocument) {
    info!(
        "📖 解析得到 {} 个单元: {} 个 frame, {} 个 section/subsection",
        doc.units.len(),
        doc.frame_count(),
        doc.heading_count()
    );
}

/// 记录分批计划
pub fn log_batch_plan(batches: &[UnitBatch], total_units: usize) {
    info!(
        "📦 {} 个单元分成 {} 批，逐批翻译",
        total_units,
        batches.len()
    );
}

/// 记录 dry-run 的分批明细
pub fn log_dry_run(batches: &[UnitBatch]) {
    for (i, batch) in batches.iter().enumerate() {
        info!(
            "  批 {}: 单元 {}-{} ({} 个, ~{} token)",
            i + 1,
            batch.start,
            batch.end.saturating_sub(1),
            batch.len(),
            batch.estimated_tokens
        );
    }
    info!("💡 dry-run 完成，未调用 API");
}

/// 打印最终统计信息
///
/// # 参数
/// - `success`: 翻译成功的单元数
/// - `failed`: 失败（保留原文）的单元数
/// - `total`: 单元总数
/// - `output`: 输出文件路径
pub fn print_final_stats(success: usize, failed: usize, total: usize, output: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", success, total);
    info!("❌ 失败: {}", failed);
    info!("{}", "=".repeat(60));
    info!("\n译文已保存至: {}", output);
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
