use crate::config::Configuration;
use crate::parser::{ParsedRequest, RequestParser};
use crate::transaction::Transaction;
use crate::Result;

/// 解析请求文本并创建事务
///
/// 配置优先级：内置默认值 < 客户端配置 < 请求文本中的指令。
#[derive(Debug, Clone)]
pub struct Client {
    configuration: Configuration,
    parser: RequestParser,
}

impl Client {
    /// 使用内置默认配置
    pub fn new() -> Self {
        Self::with_configuration(Configuration::new())
    }

    /// 在内置默认值之上叠加 `configuration`
    pub fn with_configuration(configuration: Configuration) -> Self {
        let configuration = Configuration::client_defaults().merged(&configuration);
        let parser = RequestParser::from_configuration(&configuration);
        Self {
            configuration,
            parser,
        }
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// 只解析，不创建事务
    pub fn parse(&self, text: &str) -> Result<ParsedRequest> {
        Ok(self.parser.parse(text)?)
    }

    /// 解析请求文本并返回尚未发送的事务
    pub fn request(&self, text: &str) -> Result<Transaction> {
        let parsed = self.parse(text)?;
        Ok(self.transaction(parsed))
    }

    /// 由已解析的请求创建事务，指令覆盖客户端配置
    pub fn transaction(&self, parsed: ParsedRequest) -> Transaction {
        let configuration = self.configuration.merged(&parsed.configuration);
        tracing::debug!("Effective configuration: {:?}", configuration);
        Transaction::new(parsed.options, parsed.body, configuration)
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}
