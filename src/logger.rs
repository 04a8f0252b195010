use tracing_subscriber::{EnvFilter, fmt};

/// 默认日志级别，保持 stdout 只输出响应内容
const DEFAULT_LEVEL: &str = "warn";

/// 初始化日志系统
///
/// 支持通过 RUST_LOG 环境变量控制日志级别
/// 默认级别: warn，日志写入 stderr
///
/// 示例:
/// - RUST_LOG=info rester request.http
/// - RUST_LOG=rester=debug rester request.http
pub fn init_logger() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    tracing::debug!("Logger initialized");
}
