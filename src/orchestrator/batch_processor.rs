//! 批量翻译处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责一次翻译任务的完整调度。
//!
//! ## 核心功能
//!
//! 1. **解析**：读取 .tex 输入，拆出头部、单元序列、尾部
//! 2. **分批**：按数量和 token 预算把单元序列切成批次
//! 3. **并发控制**：使用 Semaphore 限制同时在途的批次数量
//! 4. **翻译与恢复**：每批交给 TranslateFlow，校验失败递归拆分
//! 5. **重组与写出**：译文按原位置替换，头尾可被模板替换
//! 6. **全局统计**：汇总成功/失败的单元数量
//!
//! ## 设计特点
//!
//! - **顶层编排**：不处理单个批次的细节，向下委托 workflow
//! - **区间隔离**：批次持有互不重叠的单元区间，并发写入天然安全
//! - **失败策略**：默认任何批次失败即中止；best_effort 模式下
//!   失败单元保留原文并记入 warn 文件

use futures::future::join_all;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::AppResult;
use crate::models::document::{BeamerDocument, ContentUnit};
use crate::services::batcher::{self, UnitBatch};
use crate::services::latex_parser;
use crate::services::llm_service::{LlmService, Translator};
use crate::services::warn_writer::WarnWriter;
use crate::utils::logging;
use crate::utils::output;
use crate::workflow::translate_flow::{TranslateFlow, ValidationOutcome};

/// 一次翻译任务的输入
#[derive(Debug, Clone)]
pub struct TranslateJob {
    /// 输入 .tex 文件
    pub input: PathBuf,
    /// 输出文件（缺省为 `<input>-zh.tex`）
    pub output: Option<PathBuf>,
    /// 可选的外部文档模板
    pub template: Option<PathBuf>,
    /// 只解析和分批，不调用 API
    pub dry_run: bool,
}

/// 应用主结构
pub struct App {
    config: Config,
}

/// 处理统计（按单元计数）
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub success: usize,
    pub failed: usize,
    pub total: usize,
}

impl App {
    /// 创建应用
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// 运行一次翻译任务
    pub async fn run(&self, job: &TranslateJob) -> AppResult<()> {
        logging::log_startup(&self.config);

        // ========== 1. 解析输入 ==========
        let mut doc = latex_parser::read_and_parse(&job.input)?;
        logging::log_document_parsed(&doc);

        if self.config.verbose_logging {
            for unit in &doc.units {
                debug!(
                    "单元 {} ({}): {}",
                    unit.index,
                    unit.kind,
                    logging::truncate_text(&unit.stripped_text, 60)
                );
            }
        }

        // 模板路径无法解析是致命错误，在调用 API 之前就失败
        let template = match &job.template {
            Some(path) => Some(latex_parser::load_document_template(path)?),
            None => None,
        };

        // ========== 2. 分批 ==========
        let batches =
            batcher::batch_units(&doc.units, self.config.batch_size, self.config.max_tokens);
        logging::log_batch_plan(&batches, doc.units.len());

        if job.dry_run {
            logging::log_dry_run(&batches);
            return Ok(());
        }

        // ========== 3. 翻译 ==========
        let translator = LlmService::new(&self.config)?;
        let flow = TranslateFlow::new(translator, &self.config);
        let stats = self.translate_all(&flow, &mut doc, &batches).await?;

        // ========== 4. 重组并写出 ==========
        let output_path = job
            .output
            .clone()
            .unwrap_or_else(|| output::default_output_path(&job.input));
        let text = doc.reconstruct(template.as_ref());
        output::write_output(&text, &output_path)?;

        logging::print_final_stats(
            stats.success,
            stats.failed,
            stats.total,
            &output_path.display().to_string(),
        );
        Ok(())
    }

    /// 并发翻译所有批次
    ///
    /// 批次拥有互不重叠的下标区间，通过 `split_at_mut` 借出互不
    /// 相交的可变切片，借用检查保证不会有两个任务写同一个单元。
    async fn translate_all<T: Translator>(
        &self,
        flow: &TranslateFlow<T>,
        doc: &mut BeamerDocument,
        batches: &[UnitBatch],
    ) -> AppResult<ProcessingStats> {
        let total_units = doc.units.len();
        let total_batches = batches.len();
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_batches.max(1)));

        let mut slices: Vec<&mut [ContentUnit]> = Vec::with_capacity(batches.len());
        let mut rest: &mut [ContentUnit] = &mut doc.units;
        for batch in batches {
            let (head, tail) = rest.split_at_mut(batch.len());
            slices.push(head);
            rest = tail;
        }

        let tasks = slices.into_iter().enumerate().map(|(i, slice)| {
            let semaphore = Arc::clone(&semaphore);
            let batch = batches[i];
            async move {
                let _permit = semaphore.acquire().await.ok();
                log_batch_start(i + 1, total_batches, &batch);
                let result = flow.run(i + 1, slice).await;
                if let Ok(outcome) = &result {
                    log_batch_complete(i + 1, outcome);
                }
                result
            }
        });

        let results = join_all(tasks).await;

        let mut stats = ProcessingStats {
            total: total_units,
            ..Default::default()
        };
        let warn_writer = WarnWriter::with_path(self.config.warn_file.as_str());

        for (i, result) in results.into_iter().enumerate() {
            match result {
                Ok(outcome) => {
                    stats.success += outcome.expected_count;
                }
                Err(e) => {
                    if !self.config.best_effort {
                        error!("[批次 {}] ❌ 翻译失败: {}", i + 1, e);
                        return Err(e);
                    }
                    warn!(
                        "[批次 {}] ⚠️ 翻译失败，批内未译单元保留原文: {}",
                        i + 1,
                        e
                    );
                    let batch = &batches[i];
                    for unit in &doc.units[batch.start..batch.end] {
                        if unit.translated_text.is_none() {
                            stats.failed += 1;
                            warn_writer.write(unit, &e.to_string())?;
                        } else {
                            // 拆分恢复可能已经译出了批内的一部分单元
                            stats.success += 1;
                        }
                    }
                }
            }
        }

        Ok(stats)
    }
}

// ========== 日志辅助函数 ==========

fn log_batch_start(batch_no: usize, total_batches: usize, batch: &UnitBatch) {
    info!(
        "📦 [批次 {}/{}] 开始翻译单元 {}-{} ({} 个, ~{} token)",
        batch_no,
        total_batches,
        batch.start,
        batch.end.saturating_sub(1),
        batch.len(),
        batch.estimated_tokens
    );
}

fn log_batch_complete(batch_no: usize, outcome: &ValidationOutcome) {
    if outcome.recovered {
        info!(
            "✓ [批次 {}] 完成: {} 个单元 (经拆分恢复, 最大深度 {})",
            batch_no, outcome.actual_count, outcome.depth
        );
    } else {
        info!(
            "✓ [批次 {}] 完成: {} 个单元",
            batch_no, outcome.actual_count
        );
    }
}
