use bytes::Bytes;
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use http::{HeaderMap, Method};
use mote_web::router::CompiledRoute;
use mote_web::{Flow, HandlerResult, Request, Response, Router, handler_fn};
use mote_http::protocol::RequestHead;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::AsyncWrite;

// Discards everything the response writes
struct Sink;

impl AsyncWrite for Sink {
    fn poll_write(self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &[u8]) -> Poll<Result<usize, io::Error>> {
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), io::Error>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), io::Error>> {
        Poll::Ready(Ok(()))
    }
}

fn segments(path: &str) -> Vec<String> {
    path.split('/').filter(|s| !s.is_empty()).map(str::to_owned).collect()
}

fn benchmark_route_compile(c: &mut Criterion) {
    c.bench_function("route_compile", |b| {
        b.iter(|| CompiledRoute::compile(black_box("/teams/:team/users/:id/files/img:a:rest")));
    });
}

fn benchmark_route_matches(c: &mut Criterion) {
    let route = CompiledRoute::compile("/teams/:team/users/:id/files/img:a:rest");
    let hit = segments("/teams/core/users/42/files/imgxlogo.png");
    let miss = segments("/teams/core/groups/42/files/imgxlogo.png");

    let mut group = c.benchmark_group("route_matches");
    group.bench_function("hit", |b| b.iter(|| route.matches(black_box(&hit), true)));
    group.bench_function("miss", |b| b.iter(|| route.matches(black_box(&miss), true)));
    group.finish();
}

fn benchmark_dispatch(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();

    let mut builder = Router::builder();
    for i in 0..20 {
        builder = builder.get(
            &format!("/api/v1/resource{i}/:id"),
            handler_fn(|_req, resp| {
                Box::pin(async move {
                    resp.end("ok").await?;
                    HandlerResult::Ok(Flow::Next)
                })
            }),
        );
    }
    let router = builder.build();

    c.bench_function("dispatch_last_of_20", |b| {
        b.to_async(&runtime).iter(|| async {
            let head = RequestHead::new(Method::GET, "/api/v1/resource19/42", "HTTP/1.1", HeaderMap::new());
            let mut req = Request::from_parts(head, Bytes::new());
            let mut resp = Response::new(Sink);
            router.dispatch(&mut req, &mut resp).await.unwrap();
        });
    });
}

criterion_group!(benches, benchmark_route_compile, benchmark_route_matches, benchmark_dispatch);
criterion_main!(benches);
