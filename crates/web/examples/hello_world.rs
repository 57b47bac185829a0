use mote_web::{Flow, HandlerResult, Router, Server, handler_fn};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let router = Router::builder()
        .get(
            "/",
            handler_fn(|_req, resp| {
                Box::pin(async move {
                    resp.send("hello world").await?;
                    HandlerResult::Ok(Flow::Next)
                })
            }),
        )
        .build();

    let mut server = Server::builder().router(router).build()?;
    server.listen("127.0.0.1", 3000).await?;

    tokio::signal::ctrl_c().await?;
    info!("received ctrl-c");
    server.stop().await?;
    Ok(())
}
