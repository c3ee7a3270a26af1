//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责整个翻译任务的调度，是系统的"指挥中心"。
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (一次任务: 解析 → 分批 → 并发翻译 → 重组)
//!     ↓
//! workflow::TranslateFlow (一个批次: 校验 → 拆分恢复)
//!     ↓
//! services (能力层: parser / batcher / llm / warn)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：编排层只做调度和统计，不做业务判断
//! 2. **区间隔离**：并发批次持有互不重叠的单元区间
//! 3. **向下依赖**：编排层 → workflow → services

pub mod batch_processor;

// 重新导出主要类型
pub use batch_processor::{App, ProcessingStats, TranslateJob};
