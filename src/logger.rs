//! 日志初始化
//!
//! 基于 tracing-subscriber，支持 RUST_LOG 环境变量覆盖默认级别

use tracing_subscriber::EnvFilter;

/// 初始化全局日志订阅器
///
/// # 参数
/// - `verbose`: 为 true 时默认级别为 DEBUG，否则为 INFO
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // 测试中可能被多次调用，忽略重复初始化
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
