use rester::config::Configuration;
use rester::http::RequestOptions;
use rester::transaction::{Transaction, TransactionError, TransactionEvent, TransactionState};
use serde_json::json;
use tokio::sync::mpsc::UnboundedReceiver;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// 原样返回请求体，状态码 201
struct Echo;

impl Respond for Echo {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        ResponseTemplate::new(201).set_body_bytes(request.body.clone())
    }
}

#[derive(Debug, Default)]
struct EventCounts {
    request: usize,
    response: Vec<u16>,
    redirect: Vec<String>,
    end: usize,
    error: Vec<TransactionError>,
}

fn drain(rx: &mut UnboundedReceiver<TransactionEvent>) -> EventCounts {
    let mut counts = EventCounts::default();
    while let Ok(event) = rx.try_recv() {
        match event {
            TransactionEvent::Request => counts.request += 1,
            TransactionEvent::Response { status } => counts.response.push(status),
            TransactionEvent::Redirect { location } => counts.redirect.push(location),
            TransactionEvent::End => counts.end += 1,
            TransactionEvent::Error(e) => counts.error.push(e),
        }
    }
    counts
}

fn options(server: &MockServer, method: &str, path: &str) -> RequestOptions {
    let address = server.address();
    let mut options = RequestOptions::new(method);
    options.hostname = Some(address.ip().to_string());
    options.port = Some(address.port());
    options.path = path.to_string();
    options
}

fn redirect_configuration(limit: u64) -> Configuration {
    Configuration::new()
        .with("followRedirects", true)
        .with("redirectStatusCodes", json!([302]))
        .with("redirectLimit", limit)
}

/// /redirect/302/2 -> /redirect/302/1 -> /hello
async fn redirect_server() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/hello"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Hello, world!"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/redirect/302/2"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/redirect/302/1"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/redirect/302/1"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/hello"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/redirect-loop/foo"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/redirect-loop/bar"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/redirect-loop/bar"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/redirect-loop/foo"))
        .mount(&server)
        .await;

    server
}

#[tokio::test]
async fn test_request_without_redirection() {
    let server = redirect_server().await;
    let mut transaction = Transaction::new(
        options(&server, "GET", "/hello"),
        None,
        redirect_configuration(10),
    );
    let mut rx = transaction.subscribe();

    transaction.send().await.unwrap();
    let events = drain(&mut rx);

    assert_eq!(events.request, 1);
    assert_eq!(events.response, vec![200]);
    assert!(events.redirect.is_empty());
    assert_eq!(events.end, 1);
    assert!(events.error.is_empty());
    assert_eq!(transaction.state(), TransactionState::Done);

    let request = transaction.get_request().unwrap();
    assert!(request.starts_with("GET /hello HTTP/1.1\r\n"));
    assert!(request.contains(&format!("Host: {}\r\n", server.address())));

    let response = transaction.get_response().unwrap();
    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(response.ends_with("\r\n\r\nHello, world!"));
}

#[tokio::test]
async fn test_redirect_chain_accounting() {
    let server = redirect_server().await;
    let mut transaction = Transaction::new(
        options(&server, "GET", "/redirect/302/2"),
        None,
        redirect_configuration(10),
    );
    let mut rx = transaction.subscribe();

    transaction.send().await.unwrap();
    let events = drain(&mut rx);

    assert_eq!(events.request, 1);
    assert_eq!(events.response, vec![302, 302, 200]);
    assert_eq!(events.redirect.len(), 2);
    assert!(events.redirect[1].ends_with("/hello"));
    assert_eq!(events.end, 1);
    assert!(events.error.is_empty());

    assert_eq!(transaction.requests().len(), 3);
    assert_eq!(transaction.responses().len(), 3);
    assert_eq!(transaction.redirect_count(), 2);
    assert_eq!(transaction.history().len(), 3);
    assert!(
        transaction
            .get_request()
            .unwrap()
            .starts_with("GET /redirect/302/2 HTTP/1.1\r\n")
    );
    assert!(transaction.get_response().unwrap().contains("Hello, world!"));
    assert_eq!(transaction.last_response().unwrap().status.code(), 200);
}

#[tokio::test]
async fn test_redirect_limit() {
    let server = redirect_server().await;
    let mut transaction = Transaction::new(
        options(&server, "GET", "/redirect/302/2"),
        None,
        redirect_configuration(1),
    );
    let mut rx = transaction.subscribe();

    let result = transaction.send().await;
    let events = drain(&mut rx);

    assert!(matches!(
        result,
        Err(TransactionError::RedirectLimitExceeded { limit: 1 })
    ));
    assert_eq!(events.redirect.len(), 1);
    assert_eq!(events.response, vec![302, 302]);
    assert_eq!(events.end, 0);
    assert_eq!(events.error.len(), 1);
    assert!(matches!(
        events.error[0],
        TransactionError::RedirectLimitExceeded { limit: 1 }
    ));
    assert_eq!(transaction.requests().len(), 2);
    assert_eq!(transaction.state(), TransactionState::Failed);
    assert!(transaction.get_response().unwrap().starts_with("HTTP/1.1 302 Found\r\n"));
}

#[tokio::test]
async fn test_redirect_loop_detection() {
    let server = redirect_server().await;
    let mut transaction = Transaction::new(
        options(&server, "GET", "/redirect-loop/foo"),
        None,
        redirect_configuration(10),
    );
    let mut rx = transaction.subscribe();

    let result = transaction.send().await;
    let events = drain(&mut rx);

    assert!(matches!(
        result,
        Err(TransactionError::RedirectLoopDetected { .. })
    ));
    assert_eq!(events.response.len(), 2);
    assert_eq!(events.redirect.len(), 1);
    assert_eq!(events.end, 0);
    assert_eq!(events.error.len(), 1);
}

#[tokio::test]
async fn test_loop_detected_without_limit() {
    let server = redirect_server().await;
    let configuration = Configuration::new()
        .with("followRedirects", true)
        .with("redirectStatusCodes", json!([302]));
    let mut transaction = Transaction::new(
        options(&server, "GET", "/redirect-loop/foo"),
        None,
        configuration,
    );

    let result = transaction.send().await;
    assert!(matches!(
        result,
        Err(TransactionError::RedirectLoopDetected { .. })
    ));
}

#[tokio::test]
async fn test_redirects_not_followed_when_disabled() {
    let server = redirect_server().await;
    let configuration = redirect_configuration(10).with("followRedirects", false);
    let mut transaction = Transaction::new(
        options(&server, "GET", "/redirect/302/2"),
        None,
        configuration,
    );
    let mut rx = transaction.subscribe();

    transaction.send().await.unwrap();
    let events = drain(&mut rx);

    assert_eq!(events.response, vec![302]);
    assert!(events.redirect.is_empty());
    assert_eq!(events.end, 1);
}

#[tokio::test]
async fn test_status_not_in_redirect_codes() {
    let server = redirect_server().await;
    let configuration = redirect_configuration(10).with("redirectStatusCodes", json!([301]));
    let mut transaction = Transaction::new(
        options(&server, "GET", "/redirect/302/2"),
        None,
        configuration,
    );

    transaction.send().await.unwrap();
    assert_eq!(transaction.responses().len(), 1);
    assert_eq!(transaction.redirect_count(), 0);
}

#[tokio::test]
async fn test_redirect_without_location_ends() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/nowhere"))
        .respond_with(ResponseTemplate::new(302))
        .mount(&server)
        .await;

    let mut transaction = Transaction::new(
        options(&server, "GET", "/nowhere"),
        None,
        redirect_configuration(10),
    );
    let mut rx = transaction.subscribe();

    transaction.send().await.unwrap();
    let events = drain(&mut rx);
    assert_eq!(events.response, vec![302]);
    assert_eq!(events.end, 1);
}

#[tokio::test]
async fn test_body_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/echo"))
        .respond_with(Echo)
        .mount(&server)
        .await;

    let body = "{\"name\": \"molly\"}";
    let mut transaction = Transaction::new(
        options(&server, "POST", "/echo"),
        Some(body.to_string()),
        Configuration::new(),
    );

    transaction.send().await.unwrap();

    let request = transaction.get_request().unwrap();
    assert!(request.starts_with("POST /echo HTTP/1.1\r\n"));
    assert!(request.contains("Content-Length: 17\r\n"));
    assert!(request.ends_with(&format!("\r\n\r\n{}", body)));

    let response = transaction.get_response().unwrap();
    assert!(response.starts_with("HTTP/1.1 201 Created\r\n"));
    assert!(response.ends_with(body));
}

#[tokio::test]
async fn test_redirect_preserves_method_and_drops_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/redirect-to"))
        .respond_with(ResponseTemplate::new(307).insert_header("Location", "/echo"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/echo"))
        .respond_with(Echo)
        .mount(&server)
        .await;

    let configuration = Configuration::new()
        .with("followRedirects", true)
        .with("redirectStatusCodes", json!([307]));
    let mut transaction = Transaction::new(
        options(&server, "POST", "/redirect-to").with_header("X-Pet", "molly"),
        Some("cat=molly".to_string()),
        configuration,
    );

    transaction.send().await.unwrap();

    let second = &transaction.requests()[1];
    assert!(second.starts_with("POST /echo HTTP/1.1\r\n"));
    assert!(!second.contains("Content-Length"));
    assert!(!second.contains("X-Pet"));
    assert_eq!(transaction.last_response().unwrap().status.code(), 201);
    assert_eq!(transaction.last_response().unwrap().body, "");
}

#[tokio::test]
async fn test_transmitted_header_order() {
    let server = redirect_server().await;
    let options = options(&server, "GET", "/hello")
        .with_header("X-First", "1")
        .with_header("X-Second", "2");
    let mut transaction = Transaction::new(options, None, Configuration::new());

    transaction.send().await.unwrap();

    let names: Vec<&str> = transaction
        .get_request()
        .unwrap()
        .split("\r\n")
        .skip(1)
        .take_while(|line| !line.is_empty())
        .filter_map(|line| line.split_once(':').map(|(name, _)| name))
        .collect();
    assert_eq!(names, vec!["X-First", "X-Second", "Host", "User-Agent", "Accept"]);
}

#[tokio::test]
async fn test_basic_auth() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/secret"))
        .and(header("authorization", "Basic ZnJ5OnNlY3JldA=="))
        .respond_with(ResponseTemplate::new(200).set_body_string("welcome"))
        .mount(&server)
        .await;

    let mut options = options(&server, "GET", "/secret");
    options.auth = Some("fry:secret".to_string());
    let mut transaction = Transaction::new(options, None, Configuration::new());

    transaction.send().await.unwrap();
    assert!(
        transaction
            .get_request()
            .unwrap()
            .contains("Authorization: Basic ZnJ5OnNlY3JldA==\r\n")
    );
    assert_eq!(transaction.last_response().unwrap().body, "welcome");
}

#[tokio::test]
async fn test_transport_error() {
    // 绑定后立即释放，得到一个无人监听的端口
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();

    let mut options = RequestOptions::new("GET");
    options.hostname = Some("127.0.0.1".to_string());
    options.port = Some(port);
    options.path = "/hello".to_string();

    let mut transaction = Transaction::new(options, None, Configuration::new());
    let mut rx = transaction.subscribe();

    let result = transaction.send().await;
    let events = drain(&mut rx);

    assert!(matches!(result, Err(TransactionError::Transport(_))));
    assert_eq!(events.request, 1);
    assert!(events.response.is_empty());
    assert_eq!(events.end, 0);
    assert_eq!(events.error.len(), 1);
    assert_eq!(transaction.state(), TransactionState::Failed);
    assert!(transaction.get_request().is_some());
    assert_eq!(transaction.get_response(), None);
}

#[tokio::test]
async fn test_missing_host() {
    let mut transaction = Transaction::new(
        RequestOptions::new("GET"),
        None,
        Configuration::new(),
    );
    let mut rx = transaction.subscribe();

    let result = transaction.send().await;
    let events = drain(&mut rx);

    assert!(matches!(result, Err(TransactionError::MissingHost)));
    assert_eq!(events.request, 1);
    assert_eq!(events.error.len(), 1);
    assert_eq!(transaction.get_request(), None);
}

#[tokio::test]
async fn test_send_twice() {
    let server = redirect_server().await;
    let mut transaction = Transaction::new(
        options(&server, "GET", "/hello"),
        None,
        Configuration::new(),
    );

    transaction.send().await.unwrap();
    let result = transaction.send().await;
    assert!(matches!(result, Err(TransactionError::AlreadySent)));
    assert_eq!(transaction.responses().len(), 1);
}
