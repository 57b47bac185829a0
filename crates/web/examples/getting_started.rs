//! Serves `./public` with gzip siblings and a small json api.
//!
//! ```sh
//! curl -v http://127.0.0.1:8080/static/index.html
//! curl -v -H 'Content-Type: application/json' -d '{"name":"hello","zip":"world"}' http://127.0.0.1:8080/users
//! curl -v -d 'name=hello&zip=world' http://127.0.0.1:8080/users
//! curl -v http://127.0.0.1:8080/users/42?verbose=true
//! ```

use mote_web::middleware::{CompressionPolicy, Cors, json_body_parser, static_files, url_encoded_body_parser};
use mote_web::{Flow, HandlerResult, Router, Server, handler_fn};
use serde::{Deserialize, Serialize};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Deserialize, Serialize, Debug)]
struct User {
    name: String,
    zip: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let router = Router::builder()
        .middleware(Cors::permissive())
        .middleware(json_body_parser())
        .middleware(url_encoded_body_parser())
        .mount("/static", static_files("./public", CompressionPolicy::PreferCompressed))
        .post(
            "/users",
            handler_fn(|req, resp| {
                Box::pin(async move {
                    let user: User = req.body_as()?;
                    info!(?user, "create user");
                    resp.send_json(&user).await?;
                    HandlerResult::Ok(Flow::Next)
                })
            }),
        )
        .get(
            "/users/:id",
            handler_fn(|req, resp| {
                Box::pin(async move {
                    let id = req.param("id").unwrap_or_default();
                    let verbose = req.query_param("verbose") == Some("true");
                    resp.send(format!("user {id}, verbose: {verbose}\r\n")).await?;
                    HandlerResult::Ok(Flow::Next)
                })
            }),
        )
        .build();

    let mut server = Server::builder().router(router).build()?;
    let local_addr = server.listen("127.0.0.1", 8080).await?;
    info!(%local_addr, "getting started server is up");

    tokio::signal::ctrl_c().await?;
    server.stop().await?;
    Ok(())
}
