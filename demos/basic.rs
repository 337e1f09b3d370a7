//! Minimal faultline example — fallible handlers behind hyper.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl -i http://localhost:3000/users/42
//!   curl -i http://localhost:3000/users/7            # 404, cause logged to stderr
//!   curl -i http://localhost:3000/users/abc          # 400
//!   curl -i http://localhost:3000/admin              # 401 without x-admin-token
//!   curl -i http://localhost:3000/boom               # 500, generic text
//!
//! There is no router in faultline; the demo dispatches on the first path
//! segment by hand, which is what the host application would normally do.

use std::io;
use std::net::SocketAddr;
use std::time::Instant;

use faultline::{
    BoxedHandler, Error, ErrorTranslator, HostHandler, Pipeline, Request, Response, ResultExt,
    Stack, middleware,
};
use http::StatusCode;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info};

struct Routes {
    user: HostHandler,
    admin: HostHandler,
    boom: HostHandler,
    fallback: HostHandler,
}

#[tokio::main]
async fn main() -> Result<(), io::Error> {
    tracing_subscriber::fmt::init();

    let common = Stack::new().layer(middleware::from_fn(access_log));
    let pipeline = Pipeline::new(ErrorTranslator::new()).common(common);

    let routes = std::sync::Arc::new(Routes {
        user: pipeline.plain(get_user),
        admin: pipeline.route(admin, &Stack::new().layer(require_token)),
        boom: pipeline.plain(boom),
        fallback: pipeline.plain(not_found),
    });

    let addr: SocketAddr = ([0, 0, 0, 0], 3000).into();
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "listening");

    let mut tasks = tokio::task::JoinSet::new();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;

            () = &mut shutdown => {
                info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                break;
            }

            res = listener.accept() => {
                let (stream, peer) = match res {
                    Ok(v) => v,
                    Err(e) => {
                        error!("accept error: {e}");
                        continue;
                    }
                };
                let routes = std::sync::Arc::clone(&routes);

                tasks.spawn(async move {
                    let svc = service_fn(move |req: http::Request<hyper::body::Incoming>| {
                        let routes = std::sync::Arc::clone(&routes);
                        async move {
                            let segment = req.uri().path().trim_start_matches('/').split('/').next().unwrap_or("");
                            let route = match segment {
                                "users" => &routes.user,
                                "admin" => &routes.admin,
                                "boom"  => &routes.boom,
                                _       => &routes.fallback,
                            };
                            hyper::service::Service::call(route, req).await
                        }
                    });

                    if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                        .serve_connection(TokioIo::new(stream), svc)
                        .await
                    {
                        error!(%peer, "connection error: {e}");
                    }
                });
            }

            Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
        }
    }

    while tasks.join_next().await.is_some() {}
    info!("stopped");
    Ok(())
}

// ── Middleware ────────────────────────────────────────────────────────────────

async fn access_log(req: Request, next: BoxedHandler) -> Result<Response, Error> {
    let started = Instant::now();
    let method = req.method().clone();
    let path = req.path().to_owned();
    let result = next.call(req).await;
    info!(%method, %path, ok = result.is_ok(), elapsed = ?started.elapsed(), "request");
    result
}

fn require_token(next: BoxedHandler) -> BoxedHandler {
    BoxedHandler::new(move |req: Request| {
        let next = next.clone();
        async move {
            if req.header("x-admin-token") != Some("letmein") {
                return Err(Error::classified(
                    "missing or wrong x-admin-token",
                    StatusCode::UNAUTHORIZED,
                    &["unauthorized"],
                ));
            }
            next.call(req).await
        }
    })
}

// ── Handlers ──────────────────────────────────────────────────────────────────

// GET /users/:id
async fn get_user(req: Request) -> Result<Response, Error> {
    let id: u64 = req
        .path()
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .parse::<u64>()
        .or_status(StatusCode::BAD_REQUEST, "user id must be a number")?;

    if id != 42 {
        let cause = io::Error::new(io::ErrorKind::NotFound, format!("user {id} not in store"));
        return Err(Error::classified(cause, StatusCode::NOT_FOUND, &["no", "such", "user"]));
    }
    Ok(Response::json(format!(r#"{{"id":{id},"name":"alice"}}"#)))
}

async fn admin(_req: Request) -> Result<&'static str, Error> {
    Ok("welcome, admin")
}

async fn boom(_req: Request) -> Result<Response, Error> {
    Err(Error::other("database connection pool exhausted").context("loading dashboard"))
}

async fn not_found(req: Request) -> Result<Response, Error> {
    Err(Error::classified(format!("no route for {}", req.path()), StatusCode::NOT_FOUND, &[]))
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => { signal.recv().await; }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
