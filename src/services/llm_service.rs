//! LLM 翻译服务 - 业务能力层
//!
//! 只负责"把一段载荷发给翻译模型、拿回原始文本"这一个能力，
//! 不理解批次结构，也不做标记校验。
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 兼容 OpenAI API 的服务（如 Azure, Gemini, Doubao 等）
//! - 传输层错误在本层带退避重试；重试耗尽后错误上抛，
//!   由恢复流程按"数量不匹配"处理

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use futures::future::BoxFuture;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, LlmError};
use crate::utils::terminology;

/// 系统指令：翻译契约（保持 LaTeX 结构、只译正文、逐字保留标记行）
const SYSTEM_INSTRUCTION: &str = "You are a professional LaTeX Beamer translator for machine learning course slides.\n\n\
Your task is to translate English text into Chinese while preserving LaTeX structure exactly.\n\n\
STRICT RULES:\n\
1. DO NOT modify any LaTeX commands, environments, or syntax.\n\
2. DO NOT translate:\n\
   * commands (e.g., \\begin, \\end, \\item)\n\
   * math expressions ($...$, \\[...\\], equation, align, etc.)\n\
   * labels, refs, citations, URLs, file paths\n\
3. ONLY translate human-readable English text.\n\
4. Preserve:\n\
   * unit marker comment lines (reproduce each one EXACTLY, character for character)\n\
   * frame boundaries\n\
   * line breaks\n\
   * indentation\n\
5. DO NOT add or remove any content.\n\
6. DO NOT output explanations or markdown.\n\
7. Output must compile as valid LaTeX.\n\
8. If uncertain, leave the text unchanged.";

/// 传输层重试次数
const MAX_TRANSPORT_RETRIES: usize = 2;
/// 退避基数（秒）
const RETRY_BACKOFF_BASE_SECS: f64 = 2.0;

/// 翻译能力
///
/// 恢复流程只依赖这个接口，测试时可以换成脚本化的假实现。
pub trait Translator: Send + Sync {
    /// 发送一个批次载荷，返回模型的原始响应文本
    ///
    /// `expected_count` 是批内单元数量，仅用于日志；载荷本身已经
    /// 包含期望数量的说明。
    fn translate<'a>(
        &'a self,
        payload: &'a str,
        expected_count: usize,
    ) -> BoxFuture<'a, AppResult<String>>;
}

/// LLM 翻译服务
#[derive(Debug)]
pub struct LlmService {
    client: Client<OpenAIConfig>,
    model_name: String,
    request_timeout: Duration,
}

impl LlmService {
    /// 创建新的翻译服务
    ///
    /// # 返回
    /// 配置中没有 API Key 时返回致命错误。
    pub fn new(config: &Config) -> AppResult<Self> {
        if config.llm_api_key.is_empty() {
            return Err(AppError::Llm(LlmError::MissingApiKey));
        }

        // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        let client = Client::with_config(openai_config);

        info!("✓ 翻译服务就绪 (模型: {})", config.llm_model_name);

        Ok(Self {
            client,
            model_name: config.llm_model_name.clone(),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        })
    }

    /// 系统指令 + 术语表
    fn system_instruction() -> String {
        let mut instruction = SYSTEM_INSTRUCTION.to_string();
        instruction.push_str(&terminology::glossary_section());
        instruction
    }

    /// 单次 API 调用（带超时）
    async fn call_api(&self, payload: &str) -> AppResult<String> {
        debug!(
            "调用 LLM API，模型: {}, 载荷长度: {} 字符",
            self.model_name,
            payload.len()
        );

        let system_msg = ChatCompletionRequestSystemMessageArgs::default()
            .content(Self::system_instruction())
            .build()
            .map_err(|e| AppError::llm_api_failed(&self.model_name, e))?;

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(payload)
            .build()
            .map_err(|e| AppError::llm_api_failed(&self.model_name, e))?;

        let messages = vec![
            ChatCompletionRequestMessage::System(system_msg),
            ChatCompletionRequestMessage::User(user_msg),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(0.3)
            .build()
            .map_err(|e| AppError::llm_api_failed(&self.model_name, e))?;

        let response = tokio::time::timeout(self.request_timeout, self.client.chat().create(request))
            .await
            .map_err(|_| {
                AppError::Llm(LlmError::Timeout {
                    model: self.model_name.clone(),
                    secs: self.request_timeout.as_secs(),
                })
            })?
            .map_err(|e| {
                warn!("LLM API 调用失败: {}", e);
                AppError::llm_api_failed(&self.model_name, e)
            })?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| {
                AppError::Llm(LlmError::EmptyContent {
                    model: self.model_name.clone(),
                })
            })?;

        debug!("收到响应 ({} 字符)", content.len());
        Ok(content)
    }

    /// 带退避重试的调用
    async fn call_with_retry(&self, payload: &str, expected_count: usize) -> AppResult<String> {
        debug!("发送批次载荷，期望 {} 个单元", expected_count);

        let mut last_error: Option<AppError> = None;
        for attempt in 0..=MAX_TRANSPORT_RETRIES {
            match self.call_api(payload).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    warn!(
                        "API 调用失败 (第 {}/{} 次): {}",
                        attempt + 1,
                        MAX_TRANSPORT_RETRIES + 1,
                        e
                    );
                    last_error = Some(e);
                    if attempt < MAX_TRANSPORT_RETRIES {
                        let delay = RETRY_BACKOFF_BASE_SECS * 2f64.powi(attempt as i32);
                        info!("退避 {:.1} 秒后重试", delay);
                        tokio::time::sleep(Duration::from_secs_f64(delay)).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            AppError::Other("LLM 调用失败且没有记录到错误".to_string())
        }))
    }
}

impl Translator for LlmService {
    fn translate<'a>(
        &'a self,
        payload: &'a str,
        expected_count: usize,
    ) -> BoxFuture<'a, AppResult<String>> {
        Box::pin(self.call_with_retry(payload, expected_count))
    }
}
