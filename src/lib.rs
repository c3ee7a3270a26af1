//! # Beamer Translate
//!
//! 把 LaTeX Beamer 课件从英文翻译为中文的流水线工具
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 数据模型层（Models）
//! - `models/document` - `ContentUnit` / `BeamerDocument`，解析后只读，
//!   译文按单元写入一次；重组时逐字节还原未翻译的部分
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，不关心流程
//! - `latex_parser` - 结构解析：深度计数匹配 frame，识别 section
//! - `batcher` - 贪心分批（数量 + token 双重上限）
//! - `llm_service` - 调用 OpenAI 兼容 API 的翻译能力（含传输重试）
//! - `warn_writer` - 记录无法翻译的单元
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/boundary` - 边界标记：载荷构建与严格提取
//! - `workflow/translate_flow` - 校验与恢复：数量校验失败时递归
//!   对半拆分，直到单元粒度或深度上限
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 一次任务的完整调度，
//!   批次间并发（Semaphore），批次持有互不重叠的单元区间
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::document::{BeamerDocument, ContentUnit, DocumentTemplate, UnitKind};
pub use orchestrator::{App, TranslateJob};
pub use services::batcher::{batch_units, UnitBatch};
pub use services::latex_parser::{load_document_template, parse_beamer_tex, read_and_parse};
pub use services::llm_service::{LlmService, Translator};
pub use workflow::{TranslateFlow, ValidationOutcome};
