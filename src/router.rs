//! Routing and HTTP plumbing for the page server
//!
//! This module provides the request/response model and the server loops:
//!
//! - Method- and path-based routing, with `:param` segments
//! - Global and route-specific middleware (pre and post)
//! - A minimal HTTP/1.1 reader and writer over tokio sockets, one request per connection
//! - A hot-reload WebSocket endpoint on a dedicated port, fed by a template file watcher
//!
//! Dispatch is independent of the socket layer so handlers and middleware can be
//! exercised directly.

use crate::error::{Error, Result};
use crate::settings::Settings;
use axum::Router as AxumRouter;
use axum::extract::ws::{Message, WebSocketUpgrade};
use axum::routing::get;
use futures::future::BoxFuture;
use log::{debug, info, warn};
use notify::event::ModifyKind;
use notify::{EventKind, RecursiveMode, Watcher};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;

/// Longest request or header line accepted, in bytes.
const MAX_LINE_BYTES: usize = 8 * 1024;
/// Most header lines accepted per request.
const MAX_HEADERS: usize = 64;

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        AppState {
            settings: Arc::new(settings),
        }
    }
}

/// Represents the outcome of an HTTP handler.
/// Supports HTML, JSON, and custom status/headers.
#[derive(Clone, Debug)]
pub struct Response {
    pub status_code: u16,
    pub body: String,
    pub headers: HashMap<String, String>,
}

impl Response {
    /// Construct a new HTTP 200 response with a plain body and no headers.
    pub fn ok(body: impl Into<String>) -> Self {
        Response {
            status_code: 200,
            body: body.into(),
            headers: HashMap::new(),
        }
    }

    /// Construct a new HTTP 200 response with an HTML body.
    pub fn html(body: impl Into<String>) -> Self {
        let mut response = Response::ok(body);
        response.headers.insert(
            "Content-Type".to_string(),
            "text/html; charset=utf-8".to_string(),
        );
        response
    }

    fn text(status_code: u16, body: impl Into<String>) -> Self {
        let mut headers = HashMap::new();
        headers.insert(
            "Content-Type".to_string(),
            "text/plain; charset=utf-8".to_string(),
        );
        Response {
            status_code,
            body: body.into(),
            headers,
        }
    }

    pub fn bad_request(reason: impl fmt::Display) -> Self {
        Response::text(400, format!("400 Bad Request: {reason}"))
    }

    /// Construct a new HTTP 404 "not found" response.
    pub fn not_found() -> Self {
        Response::text(404, "404 Not Found")
    }

    /// Construct a 405 response listing the methods the path does accept.
    pub fn method_not_allowed(allowed: &[Method]) -> Self {
        let mut response = Response::text(405, "405 Method Not Allowed");
        let allow: Vec<&str> = allowed.iter().map(Method::as_str).collect();
        response
            .headers
            .insert("Allow".to_string(), allow.join(", "));
        response
    }

    pub fn payload_too_large() -> Self {
        Response::text(413, "413 Payload Too Large")
    }

    pub fn internal_error() -> Self {
        Response::text(500, "500 Internal Server Error")
    }

    /// Construct a new HTTP JSON response.
    /// Accepts any serde-serializable payload, status, and custom headers.
    pub fn json<T: Serialize>(
        data: T,
        status_code: u16,
        mut headers: HashMap<String, String>,
    ) -> Self {
        headers.insert(
            "Content-Type".to_string(),
            "application/json; charset=utf-8".to_string(),
        );
        match serde_json::to_string(&data) {
            Ok(body) => Response {
                status_code,
                body,
                headers,
            },
            Err(e) => {
                log::error!("JSON serialization failed: {}", e);
                Response {
                    status_code: 500,
                    body: "{\"error\": \"Serialization failed\"}".to_string(),
                    headers,
                }
            }
        }
    }
}

/// HTTP request method.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Method {
    #[default]
    Get,
    Post,
    Other(String),
}

impl Method {
    pub fn as_str(&self) -> &str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Other(name) => name.as_str(),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(Error::BadRequest(format!("invalid method '{s}'")));
        }
        Ok(match s {
            "GET" => Method::Get,
            "POST" => Method::Post,
            other => Method::Other(other.to_string()),
        })
    }
}

/// A parsed HTTP request.
#[derive(Clone, Debug, Default)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub query: HashMap<String, String>,
    /// Path parameters extracted by the matched route pattern.
    pub params: HashMap<String, String>,
    /// Header names are lower-cased.
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl Request {
    /// Build a request from a method and a request target such as `/path?x=1`.
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, query),
            None => (target, ""),
        };
        let path = if path.is_empty() { "/" } else { path };
        Request {
            method,
            path: path.to_string(),
            query: url::form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect(),
            ..Request::default()
        }
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// Holds metadata about the current HTTP request and its extracted path parameters.
/// Middleware and handlers can modify/read this context.
pub struct RequestContext {
    pub method: Method,
    pub path: String,
    pub params: HashMap<String, String>,
    pub start_time: Option<Instant>,
}

/// Type alias for async handler functions for HTTP routes.
pub type Handler = Arc<dyn Fn(Request, AppState) -> BoxFuture<'static, Response> + Send + Sync>;

/// Type alias for synchronous, pre-processing middleware executed before the handler.
/// If a middleware returns Some(Response), request handling stops and this response is sent.
pub type Middleware = Arc<dyn Fn(&mut RequestContext) -> Option<Response> + Send + Sync>;

/// Type alias for post-processing middleware executed after the handler.
/// Post-middleware can inspect/modify the response before it is sent.
pub type PostMiddleware = Arc<dyn Fn(&RequestContext, Response) -> Response + Send + Sync>;

/// Wrap an async function into a `Handler`.
pub fn handler<F, Fut>(f: F) -> Handler
where
    F: Fn(Request, AppState) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    Arc::new(
        move |request: Request, state: AppState| -> BoxFuture<'static, Response> {
            Box::pin(f(request, state))
        },
    )
}

/// Represents a registered HTTP route and its associated handler + middleware.
#[derive(Clone)]
pub struct Route {
    pub method: Method,
    pub path_pattern: String,
    pub handler: Handler,
    pub middlewares: Vec<Middleware>,
}

/// The main application router.
/// Manages all HTTP routes and global middleware.
#[derive(Clone, Default)]
pub struct Router {
    pub routes: Vec<Route>,
    pub middlewares: Vec<Middleware>,
    pub post_middlewares: Vec<PostMiddleware>,
    pub app_state: Option<AppState>,
}

/// Serializes and writes an HTTP Response, then closes the write half.
pub async fn send_response<W: AsyncWrite + Unpin>(
    writer: &mut W,
    response: Response,
) -> std::io::Result<()> {
    let mut head = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n",
        response.status_code,
        status_text(response.status_code),
        response.body.len(),
    );
    for (key, value) in &response.headers {
        head.push_str(&format!("{}: {}\r\n", key, value));
    }
    head.push_str("\r\n");

    writer.write_all(head.as_bytes()).await?;
    writer.write_all(response.body.as_bytes()).await?;
    writer.flush().await?;
    writer.shutdown().await
}

/// Maps status codes to HTTP status text for responses.
pub fn status_text(code: u16) -> &'static str {
    match code {
        200 => "OK",
        400 => "Bad Request",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        413 => "Payload Too Large",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

async fn read_line_limited<R: AsyncBufRead + Unpin>(reader: &mut R, buf: &mut String) -> Result<usize> {
    let mut bytes = Vec::new();
    let n = (&mut *reader)
        .take(MAX_LINE_BYTES as u64)
        .read_until(b'\n', &mut bytes)
        .await?;
    if n == MAX_LINE_BYTES && bytes.last() != Some(&b'\n') {
        return Err(Error::BadRequest("line too long".to_string()));
    }
    let line = String::from_utf8(bytes)
        .map_err(|_| Error::BadRequest("request is not valid UTF-8".to_string()))?;
    buf.push_str(&line);
    Ok(n)
}

/// Reads one HTTP/1.x request: request line, headers, and a `Content-Length` body.
pub async fn read_request<R: AsyncRead + Unpin>(reader: R, max_body_bytes: usize) -> Result<Request> {
    let mut reader = BufReader::new(reader);

    let mut line = String::new();
    if read_line_limited(&mut reader, &mut line).await? == 0 {
        return Err(Error::BadRequest("empty request".to_string()));
    }
    let mut parts = line.split_whitespace();
    let (method, target) = match (parts.next(), parts.next(), parts.next()) {
        (Some(method), Some(target), Some(version)) if version.starts_with("HTTP/") => {
            (method.parse::<Method>()?, target.to_string())
        }
        _ => {
            return Err(Error::BadRequest(format!(
                "bad request line '{}'",
                line.trim_end()
            )));
        }
    };

    let mut headers = HashMap::new();
    loop {
        let mut header = String::new();
        if read_line_limited(&mut reader, &mut header).await? == 0 {
            break;
        }
        let header = header.trim_end();
        if header.is_empty() {
            break;
        }
        if headers.len() >= MAX_HEADERS {
            return Err(Error::BadRequest("too many headers".to_string()));
        }
        match header.split_once(':') {
            Some((key, value)) => {
                headers.insert(key.trim().to_ascii_lowercase(), value.trim().to_string());
            }
            None => return Err(Error::BadRequest(format!("bad header '{header}'"))),
        }
    }

    let length = match headers.get("content-length") {
        Some(value) => value
            .parse::<usize>()
            .map_err(|_| Error::BadRequest(format!("invalid content-length '{value}'")))?,
        None => 0,
    };
    if length > max_body_bytes {
        return Err(Error::PayloadTooLarge(length));
    }
    let mut body = vec![0; length];
    reader.read_exact(&mut body).await?;

    let mut request = Request::new(method, &target);
    request.headers = headers;
    request.body = body;
    Ok(request)
}

/// Pre-middleware that stamps the request start time.
pub fn start_timer() -> Middleware {
    Arc::new(|ctx: &mut RequestContext| {
        ctx.start_time = Some(Instant::now());
        None
    })
}

/// Post-middleware that logs one line per request.
pub fn access_log() -> PostMiddleware {
    Arc::new(|ctx: &RequestContext, response: Response| {
        let elapsed = ctx
            .start_time
            .map(|t| t.elapsed().as_micros())
            .unwrap_or_default();
        info!(
            "{} {} -> {} ({}us)",
            ctx.method, ctx.path, response.status_code, elapsed
        );
        response
    })
}

impl Router {
    /// Create a new, empty application router.
    pub fn new() -> Self {
        Router::default()
    }

    /// Register an HTTP route with method, path pattern, handler, and any route-specific middleware.
    pub fn add_route(
        &mut self,
        method: Method,
        path_pattern: &str,
        handler: Handler,
        middlewares: Vec<Middleware>,
    ) {
        self.routes.push(Route {
            method,
            path_pattern: path_pattern.to_string(),
            handler,
            middlewares,
        });
    }

    /// Add a global pre-middleware to be run before all HTTP handlers.
    pub fn add_middleware(&mut self, middleware: Middleware) {
        self.middlewares.push(middleware);
    }

    /// Add a post-middleware to be run after each HTTP handler.
    pub fn add_post_middleware(&mut self, middleware: PostMiddleware) {
        self.post_middlewares.push(middleware);
    }

    pub fn set_app_state(&mut self, state: AppState) {
        self.app_state = Some(state);
    }

    fn max_body_bytes(&self) -> usize {
        self.app_state
            .as_ref()
            .map(|state| state.settings.max_body_bytes)
            .unwrap_or_else(|| Settings::default().max_body_bytes)
    }

    /// Route a parsed request through middleware and its handler.
    ///
    /// Post-middleware runs on every response, including ones produced by a
    /// short-circuiting pre-middleware, 404 and 405.
    pub async fn dispatch(&self, request: Request) -> Response {
        let Some(state) = self.app_state.clone() else {
            log::error!("App state not set in Router");
            return Response::internal_error();
        };

        let mut ctx = RequestContext {
            method: request.method.clone(),
            path: request.path.clone(),
            params: HashMap::new(),
            start_time: None,
        };

        let mut response = self.route_request(&mut ctx, request, state).await;
        for post_middleware in &self.post_middlewares {
            response = (post_middleware)(&ctx, response);
        }
        response
    }

    async fn route_request(
        &self,
        ctx: &mut RequestContext,
        mut request: Request,
        state: AppState,
    ) -> Response {
        for middleware in &self.middlewares {
            if let Some(response) = (middleware)(ctx) {
                return response;
            }
        }

        let mut allowed = Vec::new();
        for route in &self.routes {
            let Some(params) = match_path(&route.path_pattern, &ctx.path) else {
                continue;
            };
            if route.method != ctx.method {
                allowed.push(route.method.clone());
                continue;
            }
            ctx.params = params;
            for middleware in &route.middlewares {
                if let Some(response) = (middleware)(ctx) {
                    return response;
                }
            }
            request.params = ctx.params.clone();
            return (route.handler)(request, state).await;
        }

        if allowed.is_empty() {
            Response::not_found()
        } else {
            Response::method_not_allowed(&allowed)
        }
    }

    /// Read one request from `socket`, dispatch it, and write the response.
    pub async fn handle_connection(&self, socket: TcpStream) {
        let (reader, mut writer) = socket.into_split();
        let response = match read_request(reader, self.max_body_bytes()).await {
            Ok(request) => self.dispatch(request).await,
            Err(Error::PayloadTooLarge(length)) => {
                warn!("Rejected request body of {} bytes", length);
                Response::payload_too_large()
            }
            Err(Error::BadRequest(reason)) => {
                warn!("Rejected malformed request: {}", reason);
                Response::bad_request(reason)
            }
            Err(e) => {
                debug!("Connection dropped before a request was read: {}", e);
                return;
            }
        };
        if let Err(e) = send_response(&mut writer, response).await {
            debug!("Failed to write response: {}", e);
        }
    }

    /// Watches the template directory for changes; notifies via WS broadcast for live-reload.
    pub fn setup_ws_reload_watcher(
        &self,
        template_path: PathBuf,
        sender: broadcast::Sender<String>,
    ) -> Result<()> {
        let (tx, mut rx) = tokio::sync::mpsc::channel(32);
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            let _ = tx.blocking_send(res);
        })?;
        watcher.watch(&template_path, RecursiveMode::Recursive)?;

        tokio::spawn(async move {
            // The watcher stops when dropped, so it lives as long as this task.
            let _watcher = watcher;
            while let Some(res) = rx.recv().await {
                match res {
                    Ok(event) => {
                        if let EventKind::Modify(ModifyKind::Data(_)) | EventKind::Create(_) =
                            event.kind
                        {
                            if let Some(file_name) = event
                                .paths
                                .first()
                                .and_then(|path| path.file_name())
                                .and_then(|n| n.to_str())
                            {
                                info!("📄 Template changed: {}", file_name);
                                let _ = sender.send("reload".to_string());
                            }
                        }
                    }
                    Err(e) => log::error!("Watch error: {:?}", e),
                }
            }
        });
        Ok(())
    }

    /// Orchestrate the application: the HTTP server, plus the live-reload
    /// WebSocket server when `settings.debug` is set.
    pub async fn run(&mut self, settings: Settings) -> Result<()> {
        if self.app_state.is_none() {
            self.set_app_state(AppState::new(settings.clone()));
        }
        let http_addr = format!("{}:{}", settings.host, settings.port);

        if !settings.debug {
            return self.run_http(&http_addr).await;
        }

        let ws_addr = format!("{}:{}", settings.host, settings.ws_port);
        // Either server failing ends the run.
        tokio::try_join!(self.run_http(&http_addr), self.run_ws(&ws_addr, settings))?;
        Ok(())
    }

    /// Bind `addr` and serve HTTP requests until an accept error occurs.
    pub async fn run_http(&self, addr: &str) -> Result<()> {
        let listener = TcpListener::bind(addr).await?;
        info!("HTTP server running on http://{}", addr);
        self.serve(listener).await
    }

    /// Accept connections from `listener`, each handled on its own task.
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let router = Arc::new(self.clone());
        loop {
            let (socket, peer) = listener.accept().await?;
            debug!("Accepted connection from {}", peer);
            let router = router.clone();
            tokio::spawn(async move {
                router.handle_connection(socket).await;
            });
        }
    }

    /// Build the Axum router serving the hot-reload WebSocket.
    pub fn build_ws_axum_router(&self, reload_sender: broadcast::Sender<String>) -> AxumRouter {
        AxumRouter::new().route(
            "/ws/reload",
            get(move |ws: WebSocketUpgrade| {
                let tx = reload_sender.clone();
                async move {
                    ws.on_upgrade(move |mut socket| async move {
                        let mut rx = tx.subscribe();
                        info!("🔌 Hot Reload WebSocket client connected!");
                        while let Ok(msg) = rx.recv().await {
                            if socket.send(Message::Text(msg.into())).await.is_err() {
                                break;
                            }
                        }
                    })
                }
            }),
        )
    }

    /// Start the WebSocket server with the template watcher behind it.
    pub async fn run_ws(&self, addr: &str, settings: Settings) -> Result<()> {
        let template_path = PathBuf::from(&settings.template.dir);
        let (sender, _) = broadcast::channel::<String>(10);
        self.setup_ws_reload_watcher(template_path, sender.clone())?;

        let app = self.build_ws_axum_router(sender);

        let addr: SocketAddr = addr.parse()?;
        let listener = TcpListener::bind(addr).await?;
        info!("Live-reload WebSocket server running at ws://{}", addr);

        axum::serve(listener, app).await?;
        Ok(())
    }
}

/// Register routes: `route!(router, Get "/" => { index }, Post "/" => { submit, mw })`.
#[macro_export]
macro_rules! route {
    ($router:expr, $( $method:ident $path:expr => { $handler:expr $(, $middleware:expr )* } ),* $(,)?) => {
        $(
            $router.add_route(
                $crate::router::Method::$method,
                $path,
                $crate::router::handler($handler),
                vec![$($middleware),*]
            );
        )*
    };
}

/// Matches a path pattern (e.g. `/foo/:id`) against a real path,
/// extracting parameters into a HashMap if matched, or None if not.
pub fn match_path(pattern: &str, path: &str) -> Option<HashMap<String, String>> {
    let pattern_parts: Vec<&str> = pattern.trim_matches('/').split('/').collect();
    let path_parts: Vec<&str> = path.trim_matches('/').split('/').collect();

    if pattern_parts.len() != path_parts.len() {
        return None;
    }

    let mut params = HashMap::new();

    for (p, a) in pattern_parts.iter().zip(path_parts.iter()) {
        if let Some(name) = p.strip_prefix(':') {
            params.insert(name.to_string(), a.to_string());
        } else if p != a {
            return None;
        }
    }

    Some(params)
}
