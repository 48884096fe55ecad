use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use futures::StreamExt;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::time::timeout;
use treasury_page::Settings;
use treasury_page::router::*;

fn router_with_state() -> Router {
    let mut router = Router::new();
    router.set_app_state(AppState::new(Settings::default()));
    router
}

async fn echo_path(request: Request, _state: AppState) -> Response {
    Response::ok(request.path)
}

async fn echo_param(request: Request, _state: AppState) -> Response {
    let id = request.params.get("id").cloned().unwrap_or_default();
    Response::ok(id)
}

async fn echo_body(request: Request, _state: AppState) -> Response {
    Response::ok(String::from_utf8_lossy(&request.body).into_owned())
}

// ========== Response struct (JSON, HTML) ==========

#[test]
fn test_response_ok() {
    let resp = Response::ok("hello world");
    assert_eq!(resp.status_code, 200);
    assert_eq!(resp.body, "hello world");
    assert!(resp.headers.is_empty());
}

#[test]
fn test_response_html_sets_content_type() {
    let resp = Response::html("<p>hi</p>");
    assert_eq!(resp.status_code, 200);
    assert_eq!(
        resp.headers.get("Content-Type").unwrap(),
        "text/html; charset=utf-8"
    );
}

#[test]
fn test_response_not_found() {
    let resp = Response::not_found();
    assert_eq!(resp.status_code, 404);
    assert!(resp.body.contains("404"));
}

#[test]
fn test_response_method_not_allowed_lists_methods() {
    let resp = Response::method_not_allowed(&[Method::Get, Method::Post]);
    assert_eq!(resp.status_code, 405);
    assert_eq!(resp.headers.get("Allow").unwrap(), "GET, POST");
}

#[test]
fn test_response_json_success() {
    let mut headers = HashMap::new();
    headers.insert("X-Test".into(), "yes".into());
    let resp = Response::json(json!({"foo": "bar"}), 201, headers);
    assert_eq!(resp.status_code, 201);
    assert_eq!(
        resp.headers.get("Content-Type").unwrap(),
        "application/json; charset=utf-8"
    );
    assert_eq!(resp.headers.get("X-Test").unwrap(), "yes");
    assert!(resp.body.contains("\"foo\":\"bar\""));
}

use serde::{Serialize, Serializer};

struct AlwaysFailsSerialize;

impl Serialize for AlwaysFailsSerialize {
    fn serialize<S>(&self, _serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        Err(serde::ser::Error::custom("Forced failure"))
    }
}

#[test]
fn test_response_json_error_branch_always_fails() {
    let mut headers = HashMap::new();
    headers.insert("Test-Head".to_string(), "Y".to_string());
    let resp = Response::json(AlwaysFailsSerialize, 200, headers);
    assert_eq!(resp.status_code, 500);
    assert!(resp.body.contains("Serialization failed"));
    assert_eq!(resp.headers.get("Test-Head").unwrap(), "Y");
}

#[test]
fn test_status_text_variants() {
    assert_eq!(status_text(200), "OK");
    assert_eq!(status_text(400), "Bad Request");
    assert_eq!(status_text(404), "Not Found");
    assert_eq!(status_text(405), "Method Not Allowed");
    assert_eq!(status_text(413), "Payload Too Large");
    assert_eq!(status_text(590), "Unknown");
}

// ========== Methods and requests ==========

#[test]
fn test_method_parsing() {
    assert_eq!("GET".parse::<Method>().unwrap(), Method::Get);
    assert_eq!("POST".parse::<Method>().unwrap(), Method::Post);
    assert_eq!(
        "DELETE".parse::<Method>().unwrap(),
        Method::Other("DELETE".to_string())
    );
    assert!("get".parse::<Method>().is_err());
    assert!("".parse::<Method>().is_err());
}

#[test]
fn test_request_new_splits_query() {
    let req = Request::new(Method::Get, "/search?q=cash+pool&page=2");
    assert_eq!(req.path, "/search");
    assert_eq!(req.query.get("q").unwrap(), "cash pool");
    assert_eq!(req.query.get("page").unwrap(), "2");

    let root = Request::new(Method::Get, "?x=1");
    assert_eq!(root.path, "/");
}

// ========== Path matching ==========

#[test]
fn test_static_and_param_matching() {
    assert!(match_path("/", "/").is_some());
    assert!(match_path("/foo", "/foo").is_some());
    let params = match_path("/user/:id", "/user/42").unwrap();
    assert_eq!(params.get("id"), Some(&"42".to_string()));
    assert!(match_path("/api/:a/:b", "/api/x/y").is_some());
    assert!(match_path("/foo/bar", "/foo/bar/qux").is_none());
    assert!(match_path("/foo/:id", "/bar/99").is_none());
    assert!(match_path("/", "/healthz").is_none());
}

// ========== Dispatch ==========

#[tokio::test]
async fn test_dispatch_routes_by_method_and_path() {
    let mut router = router_with_state();
    router.add_route(Method::Get, "/", handler(echo_path), vec![]);
    router.add_route(Method::Post, "/", handler(echo_body), vec![]);

    let get = router.dispatch(Request::new(Method::Get, "/")).await;
    assert_eq!(get.status_code, 200);
    assert_eq!(get.body, "/");

    let post = router
        .dispatch(Request::new(Method::Post, "/").with_body("name=Jamie"))
        .await;
    assert_eq!(post.body, "name=Jamie");
}

#[tokio::test]
async fn test_dispatch_unknown_path_is_404() {
    let mut router = router_with_state();
    router.add_route(Method::Get, "/", handler(echo_path), vec![]);
    let resp = router.dispatch(Request::new(Method::Get, "/nope")).await;
    assert_eq!(resp.status_code, 404);
}

#[tokio::test]
async fn test_dispatch_wrong_method_is_405() {
    let mut router = router_with_state();
    router.add_route(Method::Get, "/healthz", handler(echo_path), vec![]);
    let resp = router
        .dispatch(Request::new(Method::Other("PUT".into()), "/healthz"))
        .await;
    assert_eq!(resp.status_code, 405);
    assert_eq!(resp.headers.get("Allow").unwrap(), "GET");
}

#[tokio::test]
async fn test_dispatch_without_state_is_500() {
    let mut router = Router::new();
    router.add_route(Method::Get, "/", handler(echo_path), vec![]);
    let resp = router.dispatch(Request::new(Method::Get, "/")).await;
    assert_eq!(resp.status_code, 500);
}

#[tokio::test]
async fn test_dispatch_extracts_params() {
    let mut router = router_with_state();
    router.add_route(Method::Get, "/user/:id", handler(echo_param), vec![]);
    let resp = router.dispatch(Request::new(Method::Get, "/user/314")).await;
    assert_eq!(resp.body, "314");
}

#[tokio::test]
async fn test_route_macro_registers_routes() {
    let mut router = router_with_state();
    treasury_page::route!(router,
        Get "/a" => { echo_path },
        Post "/b" => { echo_body },
    );
    assert_eq!(router.routes.len(), 2);
    assert_eq!(router.routes[0].method, Method::Get);
    assert_eq!(router.routes[1].path_pattern, "/b");
}

// ========== Middleware ==========

#[tokio::test]
async fn test_pre_middleware_short_circuits_and_post_middleware_still_runs() {
    let before: Middleware = Arc::new(|ctx: &mut RequestContext| {
        if ctx.path == "/blocked" {
            Some(Response::ok("block"))
        } else {
            None
        }
    });
    let post: PostMiddleware = Arc::new(|_ctx: &RequestContext, mut resp: Response| {
        resp.body = format!("{}+PM", resp.body);
        resp
    });

    let mut router = router_with_state();
    router.add_middleware(before);
    router.add_post_middleware(post);
    router.add_route(Method::Get, "/blocked", handler(echo_path), vec![]);
    router.add_route(Method::Get, "/open", handler(echo_path), vec![]);

    let blocked = router.dispatch(Request::new(Method::Get, "/blocked")).await;
    assert_eq!(blocked.body, "block+PM");

    let open = router.dispatch(Request::new(Method::Get, "/open")).await;
    assert_eq!(open.body, "/open+PM");
}

#[tokio::test]
async fn test_post_middleware_chain_order() {
    let mut router = router_with_state();
    router.add_route(Method::Get, "/a", handler(echo_path), vec![]);
    router.add_post_middleware(Arc::new(|_ctx: &RequestContext, mut r: Response| {
        r.body.push('1');
        r
    }));
    router.add_post_middleware(Arc::new(|_ctx: &RequestContext, mut r: Response| {
        r.body.push('2');
        r
    }));

    let resp = router.dispatch(Request::new(Method::Get, "/a")).await;
    assert_eq!(resp.body, "/a12");
}

#[tokio::test]
async fn test_route_middleware_can_override_params() {
    let mut router = router_with_state();
    let override_id: Middleware = Arc::new(|ctx: &mut RequestContext| {
        ctx.params.insert("id".to_string(), "overridden".to_string());
        None
    });
    router.add_route(Method::Get, "/user/:id", handler(echo_param), vec![override_id]);

    let resp = router.dispatch(Request::new(Method::Get, "/user/tomato")).await;
    assert_eq!(resp.body, "overridden");
}

#[tokio::test]
async fn test_timer_and_access_log_leave_response_untouched() {
    let mut router = router_with_state();
    router.add_middleware(start_timer());
    router.add_post_middleware(access_log());
    router.add_route(Method::Get, "/", handler(echo_path), vec![]);

    let resp = router.dispatch(Request::new(Method::Get, "/")).await;
    assert_eq!(resp.status_code, 200);
    assert_eq!(resp.body, "/");
}

// ========== Wire format ==========

#[tokio::test]
async fn test_read_request_with_body() {
    let raw = b"POST /?src=hero HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/x-www-form-urlencoded\r\nContent-Length: 10\r\n\r\nname=Jamie";
    let req = read_request(&raw[..], 1024).await.unwrap();
    assert_eq!(req.method, Method::Post);
    assert_eq!(req.path, "/");
    assert_eq!(req.query.get("src").unwrap(), "hero");
    assert_eq!(req.header("Content-Type"), Some("application/x-www-form-urlencoded"));
    assert_eq!(req.body, b"name=Jamie");
}

#[tokio::test]
async fn test_read_request_rejects_oversized_body() {
    let raw = b"POST / HTTP/1.1\r\nContent-Length: 4096\r\n\r\n";
    let err = read_request(&raw[..], 1024).await.unwrap_err();
    assert!(matches!(err, treasury_page::Error::PayloadTooLarge(4096)));
}

#[tokio::test]
async fn test_read_request_rejects_garbage() {
    let err = read_request(&b"hello\r\n\r\n"[..], 1024).await.unwrap_err();
    assert!(matches!(err, treasury_page::Error::BadRequest(_)));

    let err = read_request(&b"GET / HTTP/1.1\r\nContent-Length: many\r\n\r\n"[..], 1024)
        .await
        .unwrap_err();
    assert!(matches!(err, treasury_page::Error::BadRequest(_)));
}

#[tokio::test]
async fn test_read_request_rejects_invalid_utf8() {
    let err = read_request(&b"GET /\xff HTTP/1.1\r\n\r\n"[..], 1024)
        .await
        .unwrap_err();
    assert!(matches!(err, treasury_page::Error::BadRequest(reason) if reason.contains("UTF-8")));

    let err = read_request(&b"GET / HTTP/1.1\r\nX-Name: \xc3\r\n\r\n"[..], 1024)
        .await
        .unwrap_err();
    assert!(matches!(err, treasury_page::Error::BadRequest(_)));
}

#[tokio::test]
async fn test_read_request_rejects_overlong_line() {
    let mut raw = b"GET /".to_vec();
    raw.extend(std::iter::repeat_n(b'a', 9000));
    raw.extend_from_slice(b" HTTP/1.1\r\n\r\n");
    let err = read_request(&raw[..], 1024).await.unwrap_err();
    assert!(matches!(err, treasury_page::Error::BadRequest(reason) if reason == "line too long"));
}

#[tokio::test]
async fn test_send_response_writes_status_line_and_length() {
    let mut out: Vec<u8> = Vec::new();
    send_response(&mut out, Response::html("héllo")).await.unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(text.contains("Content-Length: 6\r\n"));
    assert!(text.contains("Connection: close\r\n"));
    assert!(text.ends_with("\r\n\r\nhéllo"));
}

// ========== Live reload ==========

#[tokio::test]
async fn test_reload_socket_forwards_broadcasts() {
    let (tx, _) = broadcast::channel::<String>(10);
    let app = router_with_state().build_ws_axum_router(tx.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let (mut socket, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws/reload"))
        .await
        .unwrap();
    // The server subscribes once the upgrade completes.
    timeout(Duration::from_secs(5), async {
        while tx.receiver_count() == 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    tx.send("reload".to_string()).unwrap();
    let msg = timeout(Duration::from_secs(5), socket.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(msg.to_text().unwrap(), "reload");
}

#[tokio::test]
async fn test_template_change_broadcasts_reload() {
    let dir = tempfile::tempdir().unwrap();
    let page = dir.path().join("page.html");
    std::fs::write(&page, "before").unwrap();

    let (tx, mut rx) = broadcast::channel(10);
    router_with_state()
        .setup_ws_reload_watcher(dir.path().to_path_buf(), tx)
        .unwrap();
    std::fs::write(&page, "after").unwrap();

    let msg = timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(msg, "reload");
}

#[tokio::test]
async fn test_watcher_on_missing_dir_is_an_error() {
    let (tx, _) = broadcast::channel(10);
    let err = router_with_state()
        .setup_ws_reload_watcher("/definitely/not/a/template/dir".into(), tx)
        .unwrap_err();
    assert!(matches!(err, treasury_page::Error::Watch(_)));
}

fn debug_settings(ws_port: u16) -> Settings {
    let mut settings = Settings::default();
    settings.debug = true;
    settings.port = 0;
    settings.ws_port = ws_port;
    settings.template.dir = concat!(env!("CARGO_MANIFEST_DIR"), "/templates").to_string();
    settings
}

#[tokio::test]
async fn test_run_fails_when_reload_port_is_taken() {
    let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let settings = debug_settings(taken.local_addr().unwrap().port());

    let mut router = Router::new();
    let result = timeout(Duration::from_secs(5), router.run(settings))
        .await
        .expect("run should stop when the reload server cannot bind");
    assert!(matches!(result, Err(treasury_page::Error::Io(_))));
}

#[tokio::test]
async fn test_run_fails_when_template_dir_is_missing() {
    let mut settings = debug_settings(0);
    settings.template.dir = "/definitely/not/a/template/dir".to_string();

    let mut router = Router::new();
    let result = timeout(Duration::from_secs(5), router.run(settings))
        .await
        .expect("run should stop when the watcher cannot start");
    assert!(matches!(result, Err(treasury_page::Error::Watch(_))));
}
