use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use url::Url;

use crate::config::Configuration;
use crate::http::{HttpClient, Request, RequestOptions, Response, format_request, format_response};
use crate::transaction::types::{TransactionError, TransactionEvent, TransactionState};

/// 一次完整的请求交换：初始请求加上全部被跟随的重定向
///
/// 各跳严格顺序执行，上一跳的响应体完整缓冲之后才会发出下一跳。
pub struct Transaction {
    options: RequestOptions,
    body: Option<String>,
    configuration: Configuration,

    state: TransactionState,
    /// 每一跳的绝对 URL
    history: Vec<Url>,
    current_location: Option<Url>,
    redirect_count: u64,
    /// 渲染后的请求 / 响应文本，按跳顺序
    requests: Vec<String>,
    responses: Vec<String>,
    last_response: Option<Response>,

    subscribers: Vec<UnboundedSender<TransactionEvent>>,
}

impl Transaction {
    pub fn new(options: RequestOptions, body: Option<String>, configuration: Configuration) -> Self {
        Self {
            options,
            body,
            configuration,
            state: TransactionState::Created,
            history: Vec::new(),
            current_location: None,
            redirect_count: 0,
            requests: Vec::new(),
            responses: Vec::new(),
            last_response: None,
            subscribers: Vec::new(),
        }
    }

    /// 订阅事件；需在 `send()` 之前调用才能收到全部事件
    pub fn subscribe(&mut self) -> UnboundedReceiver<TransactionEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    /// 发送请求并跟随重定向直到终止状态
    ///
    /// 终止时发出 `End` 或 `Error` 事件，返回值与事件一致。
    pub async fn send(&mut self) -> Result<(), TransactionError> {
        if self.state != TransactionState::Created {
            return Err(TransactionError::AlreadySent);
        }

        self.emit(TransactionEvent::Request);

        match self.run().await {
            Ok(()) => {
                self.state = TransactionState::Done;
                tracing::info!(
                    "Transaction finished after {} redirect(s)",
                    self.redirect_count
                );
                self.emit(TransactionEvent::End);
                Ok(())
            }
            Err(e) => {
                self.state = TransactionState::Failed;
                tracing::warn!("Transaction failed: {}", e);
                self.emit(TransactionEvent::Error(e.clone()));
                Err(e)
            }
        }
    }

    async fn run(&mut self) -> Result<(), TransactionError> {
        let client = HttpClient::from_configuration(&self.configuration)?;
        let mut options = self.options.clone();
        let mut body = self.body.clone();
        let mut hop = 0;

        loop {
            self.state = TransactionState::Sending { hop };
            let response = self.send_hop(&client, &options, body.as_deref()).await?;

            let location = if self.should_redirect(&response) {
                response.location().map(str::to_string)
            } else {
                None
            };
            let status = response.status.code();
            self.last_response = Some(response);

            let Some(location) = location else {
                if self.should_redirect_status(status) {
                    tracing::warn!("Redirect response {} has no Location header", status);
                }
                return Ok(());
            };

            self.state = TransactionState::Redirecting { hop };
            let next = self.resolve_redirect(&location)?;

            tracing::info!("Following redirect {} -> {}", status, next);
            // 重定向保留方法，不带 body 与用户 header
            options = RequestOptions::from_url(&next, options.method.clone());
            body = None;
            hop += 1;

            self.emit(TransactionEvent::Redirect {
                location: next.to_string(),
            });
        }
    }

    /// 单跳：记录 URL，渲染请求，发送并缓冲响应
    async fn send_hop(
        &mut self,
        client: &HttpClient,
        options: &RequestOptions,
        body: Option<&str>,
    ) -> Result<Response, TransactionError> {
        let mut request = Request::from_options(options, body)?;
        self.history.push(request.url.clone());
        self.current_location = Some(request.url.clone());

        let prepared = client.prepare(&mut request)?;
        self.requests.push(format_request(&request));
        tracing::info!("{} {}", request.method, request.url);

        if let TransactionState::Sending { hop } = self.state {
            self.state = TransactionState::AwaitingResponse { hop };
        }
        let response = client.execute(prepared).await?;

        tracing::info!(
            "{} {} ({}ms)",
            response.status,
            response.reason,
            response.duration.as_millis()
        );
        self.responses.push(format_response(&response));
        self.emit(TransactionEvent::Response {
            status: response.status.code(),
        });

        Ok(response)
    }

    /// 解析 `Location`，累加计数，检查上限与循环
    fn resolve_redirect(&mut self, location: &str) -> Result<Url, TransactionError> {
        let base = self
            .current_location
            .as_ref()
            .ok_or(TransactionError::MissingHost)?;
        let resolved = base
            .join(location)
            .map_err(|e| TransactionError::InvalidLocation {
                location: location.to_string(),
                message: e.to_string(),
            })?;

        self.redirect_count += 1;

        if let Some(limit) = self.configuration.redirect_limit()
            && self.redirect_count > limit
        {
            return Err(TransactionError::RedirectLimitExceeded { limit });
        }

        // 与历史记录比较时使用与发送时相同的形式（不含凭据）
        let next = RequestOptions::from_url(&resolved, "GET")
            .to_url()
            .map_err(|e| TransactionError::InvalidLocation {
                location: location.to_string(),
                message: e.to_string(),
            })?;
        if self.history.contains(&next) {
            return Err(TransactionError::RedirectLoopDetected {
                location: next.to_string(),
            });
        }

        Ok(resolved)
    }

    fn should_redirect(&self, response: &Response) -> bool {
        self.should_redirect_status(response.status.code())
    }

    fn should_redirect_status(&self, status: u16) -> bool {
        self.configuration.follow_redirects()
            && self.configuration.redirect_status_codes().contains(&status)
    }

    fn emit(&self, event: TransactionEvent) {
        tracing::debug!("Transaction event: {:?}", event);
        for subscriber in &self.subscribers {
            // 接收端已关闭时忽略
            let _ = subscriber.send(event.clone());
        }
    }

    // === 访问器 ===

    /// 第一跳渲染后的请求文本
    pub fn get_request(&self) -> Option<&str> {
        self.requests.first().map(String::as_str)
    }

    /// 最近一次收到的响应文本
    pub fn get_response(&self) -> Option<&str> {
        self.responses.last().map(String::as_str)
    }

    pub fn requests(&self) -> &[String] {
        &self.requests
    }

    pub fn responses(&self) -> &[String] {
        &self.responses
    }

    pub fn redirect_count(&self) -> u64 {
        self.redirect_count
    }

    pub fn history(&self) -> &[Url] {
        &self.history
    }

    pub fn last_response(&self) -> Option<&Response> {
        self.last_response.as_ref()
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    pub fn options(&self) -> &RequestOptions {
        &self.options
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }
}
