//! 集成测试 - HTTP 端点与完整会话
//!
//! 在回环地址上启动真实端点，用 reqwest 验证文件/目录分享行为。

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use qrget_core::error::ResolveError;
use qrget_core::lifecycle::lifecycle_signal;
use qrget_core::net::{AddressSource, PortSource, allocate_port};
use qrget_core::server::{self, EndpointControl, EndpointHandle};
use qrget_core::{
    LifecycleCoordinator, PreviewError, PreviewOpener, PreviewRequest, PreviewSurface,
    QrgetError, ResolvedAddress, ServerError, ServingTarget, SessionConfig, SessionEnd,
    SessionState,
};

fn serve(target: ServingTarget) -> (EndpointHandle, String) {
    let port = allocate_port().unwrap();
    let (tx, _rx) = lifecycle_signal();
    let handle = server::start(target, SocketAddr::from((Ipv4Addr::LOCALHOST, port)), tx);
    (handle, format!("http://127.0.0.1:{}", port))
}

/// 等待监听任务就绪
async fn get_when_ready(url: &str) -> reqwest::Response {
    for _ in 0..50 {
        if let Ok(resp) = reqwest::get(url).await {
            return resp;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("server at {} never became ready", url);
}

fn write(dir: &Path, name: &str, contents: &str) {
    std::fs::write(dir.join(name), contents).unwrap();
}

// ============================================================================
// 文件模式
// ============================================================================

#[tokio::test]
async fn test_file_mode_serves_file_on_any_path() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "notes.txt", "hello from qrget");

    let (mut handle, base) = serve(ServingTarget::file(dir.path().join("notes.txt")));

    for path in ["/", "/notes.txt", "/some/other/path"] {
        let resp = get_when_ready(&format!("{}{}", base, path)).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["content-type"], "text/plain");
        assert_eq!(
            resp.headers()["content-disposition"],
            "attachment; filename*=UTF-8''notes.txt"
        );
        assert_eq!(resp.text().await.unwrap(), "hello from qrget");
    }

    handle.shutdown(Duration::from_secs(2)).await.unwrap();
}

#[tokio::test]
async fn test_head_and_unsupported_methods() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "data.json", "{\"ok\":true}");

    let (mut handle, base) = serve(ServingTarget::file(dir.path().join("data.json")));
    get_when_ready(&base).await;

    let client = reqwest::Client::new();
    let head = client.head(&base).send().await.unwrap();
    assert_eq!(head.status(), 200);
    assert_eq!(head.headers()["content-length"], "11");
    assert_eq!(head.headers()["content-type"], "application/json");

    let post = client.post(&base).send().await.unwrap();
    assert_eq!(post.status(), 405);
    assert_eq!(post.headers()["allow"], "GET, HEAD");

    handle.shutdown(Duration::from_secs(2)).await.unwrap();
}

// ============================================================================
// 目录模式
// ============================================================================

#[tokio::test]
async fn test_directory_mode_listing_and_files() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.txt", "alpha");
    std::fs::create_dir(dir.path().join("sub")).unwrap();
    write(&dir.path().join("sub"), "b.txt", "beta");

    let (mut handle, base) = serve(ServingTarget::directory(dir.path()));

    let listing = get_when_ready(&format!("{}/", base)).await;
    assert_eq!(listing.status(), 200);
    let page = listing.text().await.unwrap();
    assert!(page.contains("<a href=\"a.txt\">a.txt</a>"), "{}", page);
    assert!(page.contains("<a href=\"sub/\">sub/</a>"), "{}", page);

    let nested = reqwest::get(format!("{}/sub/b.txt", base)).await.unwrap();
    assert_eq!(nested.text().await.unwrap(), "beta");

    // 缺少结尾斜杠时重定向到目录
    let redirected = reqwest::get(format!("{}/sub", base)).await.unwrap();
    assert!(redirected.url().as_str().ends_with("/sub/"));
    assert!(redirected.text().await.unwrap().contains("b.txt"));

    let missing = reqwest::get(format!("{}/nope.txt", base)).await.unwrap();
    assert_eq!(missing.status(), 404);

    handle.shutdown(Duration::from_secs(2)).await.unwrap();
}

#[tokio::test]
async fn test_directory_redirect_is_relative() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("evil.example")).unwrap();

    let (mut handle, base) = serve(ServingTarget::directory(dir.path()));
    get_when_ready(&format!("{}/", base)).await;

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    // 双斜杠开头的路径不能变成指向其他主机的地址
    let resp = client
        .get(format!("{}//evil.example", base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 308);
    assert_eq!(resp.headers()["location"], "./evil.example/");

    let resp = client
        .get(format!("{}/evil.example", base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 308);
    assert_eq!(resp.headers()["location"], "./evil.example/");

    handle.shutdown(Duration::from_secs(2)).await.unwrap();
}

#[tokio::test]
async fn test_directory_index_fallback() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "index.html", "<h1>welcome</h1>");
    write(dir.path(), "other.txt", "x");

    let (mut handle, base) = serve(ServingTarget::directory(dir.path()));

    let resp = get_when_ready(&format!("{}/", base)).await;
    assert_eq!(resp.headers()["content-type"], "text/html");
    assert_eq!(resp.text().await.unwrap(), "<h1>welcome</h1>");

    handle.shutdown(Duration::from_secs(2)).await.unwrap();
}

// ============================================================================
// 完整会话
// ============================================================================

struct Loopback;

impl AddressSource for Loopback {
    fn resolve(&self) -> Result<ResolvedAddress, ResolveError> {
        Ok(ResolvedAddress {
            interface: "wlan0".into(),
            ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
        })
    }
}

struct Port(u16);

impl PortSource for Port {
    fn allocate(&self) -> Result<u16, ServerError> {
        Ok(self.0)
    }
}

#[derive(Default)]
struct HeadlessSurface {
    closed: AtomicBool,
    close_calls: AtomicUsize,
}

impl PreviewSurface for HeadlessSurface {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn close(&self) {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[derive(Clone, Default)]
struct Headless(Arc<HeadlessSurface>);

impl PreviewOpener for Headless {
    fn open(&self, _request: PreviewRequest) -> Result<Arc<dyn PreviewSurface>, PreviewError> {
        Ok(self.0.clone())
    }
}

fn quick_config(timeout: Duration) -> SessionConfig {
    SessionConfig {
        timeout,
        poll_interval: Duration::from_millis(20),
        grace_period: Duration::from_secs(2),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_session_serves_until_timeout() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "song.mp3", "ID3");
    let port = allocate_port().unwrap();
    let preview = Headless::default();

    let coordinator = LifecycleCoordinator::new(
        quick_config(Duration::from_millis(500)),
        ServingTarget::directory(dir.path()),
        preview.clone(),
    )
    .with_address_source(Loopback)
    .with_port_source(Port(port));
    let mut state = coordinator.subscribe_state();

    let session = tokio::spawn(coordinator.run());
    state
        .wait_for(|s| *s == SessionState::Running)
        .await
        .unwrap();

    let resp = get_when_ready(&format!("http://127.0.0.1:{}/song.mp3", port)).await;
    assert_eq!(resp.text().await.unwrap(), "ID3");

    let report = session.await.unwrap().unwrap();
    assert_eq!(report.cause, Some(SessionEnd::TimedOut));
    assert_eq!(report.url.as_str(), format!("http://127.0.0.1:{}/", port));
    assert_eq!(preview.0.close_calls.load(Ordering::SeqCst), 1);

    // 端点已关闭，端口可以重新绑定
    assert!(std::net::TcpListener::bind(("0.0.0.0", port)).is_ok());
}

#[tokio::test]
async fn test_occupied_port_routes_through_shutdown() {
    let occupied = std::net::TcpListener::bind(("0.0.0.0", 0)).unwrap();
    let port = occupied.local_addr().unwrap().port();
    let preview = Headless::default();

    let coordinator = LifecycleCoordinator::new(
        quick_config(Duration::ZERO),
        ServingTarget::directory("."),
        preview.clone(),
    )
    .with_address_source(Loopback)
    .with_port_source(Port(port));

    let err = tokio::time::timeout(Duration::from_secs(5), coordinator.run())
        .await
        .unwrap()
        .unwrap_err();

    assert!(
        matches!(err, QrgetError::Server(ServerError::Serve(ref msg)) if msg.contains(&port.to_string())),
        "{:?}",
        err
    );
    assert_eq!(preview.0.close_calls.load(Ordering::SeqCst), 1);
}
