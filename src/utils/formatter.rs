use crate::http::Response;
use crate::transaction::Transaction;
use colored::*;

/// 终端输出方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// 只输出响应体
    #[default]
    Body,
    /// 状态行 + headers + 响应体
    Include,
    /// 每一跳的请求与响应报文
    Verbose,
}

pub struct OutputFormatter {
    mode: OutputMode,
    color: bool,
}

impl OutputFormatter {
    pub fn new(mode: OutputMode) -> Self {
        Self { mode, color: true }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// 响应体之前的部分；`Body` 模式下为空
    pub fn preamble(&self, transaction: &Transaction) -> String {
        match self.mode {
            OutputMode::Body => String::new(),
            OutputMode::Include => match transaction.last_response() {
                Some(response) => self.format_head(response),
                None => String::new(),
            },
            OutputMode::Verbose => self.format_hops(transaction),
        }
    }

    /// 完整输出（响应体不经过管道时使用）
    pub fn format(&self, transaction: &Transaction) -> String {
        let mut output = self.preamble(transaction);
        if self.mode != OutputMode::Verbose
            && let Some(response) = transaction.last_response()
        {
            output.push_str(&response.body);
        }
        output
    }

    /// 状态行与 headers，以空行结束
    pub fn format_head(&self, response: &Response) -> String {
        let mut output = vec![self.status_line(response)];
        for (name, value) in response.headers.iter() {
            output.push(self.paint_header(name, value));
        }
        output.push(String::new());
        output.push(String::new());
        output.join("\n")
    }

    fn format_hops(&self, transaction: &Transaction) -> String {
        let responses = transaction.responses();
        let mut output = String::new();

        for (hop, request) in transaction.requests().iter().enumerate() {
            if hop > 0 {
                output.push('\n');
            }
            output.push_str(&self.paint_dim(&format!("# hop {}", hop)));
            output.push('\n');
            output.push_str(&self.paint_request(request));
            if let Some(response) = responses.get(hop) {
                output.push_str("\n\n");
                output.push_str(response);
            }
            output.push('\n');
        }

        output
    }

    fn status_line(&self, response: &Response) -> String {
        let line = format!("HTTP/1.1 {} {}", response.status.code(), response.reason);
        if !self.color {
            return line;
        }
        if response.is_success() {
            line.green().bold().to_string()
        } else if response.is_client_error() {
            line.yellow().bold().to_string()
        } else {
            line.red().bold().to_string()
        }
    }

    fn paint_header(&self, name: &str, value: &str) -> String {
        if self.color {
            format!("{}: {}", name.cyan(), value)
        } else {
            format!("{}: {}", name, value)
        }
    }

    fn paint_request(&self, text: &str) -> String {
        if self.color {
            text.blue().to_string()
        } else {
            text.to_string()
        }
    }

    fn paint_dim(&self, text: &str) -> String {
        if self.color {
            text.dimmed().to_string()
        } else {
            text.to_string()
        }
    }
}
