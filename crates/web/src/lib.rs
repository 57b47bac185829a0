//! A small web layer on top of [`mote_http`]: an ordered middleware pipeline with
//! route patterns, ready-made middleware and a TCP server.
//!
//! ```no_run
//! use mote_web::middleware::{CompressionPolicy, Cors, json_body_parser, static_files};
//! use mote_web::{Flow, HandlerResult, Router, Server, handler_fn};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let router = Router::builder()
//!         .middleware(Cors::permissive())
//!         .middleware(json_body_parser())
//!         .mount("/static", static_files("./public", CompressionPolicy::PreferCompressed))
//!         .get("/hello/:name", handler_fn(|req, resp| {
//!             Box::pin(async move {
//!                 let greeting = format!("hello {}", req.param("name").unwrap_or("world"));
//!                 resp.send(greeting).await?;
//!                 HandlerResult::Ok(Flow::Next)
//!             })
//!         }))
//!         .build();
//!
//!     let mut server = Server::builder().router(router).build()?;
//!     server.listen("127.0.0.1", 8080).await?;
//!     tokio::signal::ctrl_c().await?;
//!     server.stop().await?;
//!     Ok(())
//! }
//! ```

mod handler;
mod server;

pub mod middleware;
pub mod mime_types;
pub mod router;

pub use handler::FnHandler;
pub use handler::handler_fn;
pub use router::Router;
pub use router::RouterBuilder;
pub use server::Server;
pub use server::ServerBuildError;
pub use server::ServerBuilder;
pub use server::ServerError;

pub use mote_http::handler::{Flow, Handler, HandlerResult};
pub use mote_http::protocol::{Request, Response};
