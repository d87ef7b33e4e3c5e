//! Echo API
//!
//! Binds handlers that echo every request part back inside the envelope.
//!
//! Run with:
//! ```bash
//! RUST_ENV=dev RUST_LOG=axum_bind=debug cargo run --example echo_api
//! ```
//!
//! Then test:
//! ```bash
//! # Every part decoded
//! curl -X POST 'http://localhost:3000/shops/7/echo?page=2' \
//!   -H 'Content-Type: application/json' -H 'x-app-version: 3' \
//!   -d '{"message": "hello"}'
//!
//! # Invalid body: {"ret":4004,"msg":"verify body params failed"}
//! curl -X POST 'http://localhost:3000/shops/7/echo' -H 'x-app-version: 3' -d 'nope'
//!
//! # A service code in Hindi
//! curl -H 'Accept-Language: hi-IN' http://localhost:3000/closed
//! ```

use axum::{extract::Request, middleware::Next, response::Response};
use axum_bind::{
    BindRouter, Code, Config, Context, Data, FromHeaders, HeaderFields, Meta, MetaExt, Result,
    bind_request,
};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

#[derive(Debug, Default, Deserialize, Serialize)]
struct Message {
    message: String,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
struct Paging {
    page: u32,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct Shop {
    shop: u64,
}

#[derive(Debug, Default, Serialize)]
struct ClientInfo {
    version: u32,
    platform: Option<String>,
}

impl FromHeaders for ClientInfo {
    fn header_fields(fields: &mut HeaderFields<Self>) {
        fields
            .field("x-app-version", |c: &mut Self| &mut c.version)
            .required();
        fields.field("x-platform", |c: &mut Self| &mut c.platform);
    }
}

bind_request! {
    struct EchoRequest {
        body: Message,
        query: Paging,
        uri: Shop,
        header: ClientInfo,
        meta: Meta,
    }
}

#[derive(Debug, Serialize)]
struct Echoed {
    body: Message,
    query: Paging,
    uri: Shop,
    header: ClientInfo,
    meta: Meta,
    request_id: Option<String>,
}

async fn echo(ctx: Context, req: EchoRequest) -> std::result::Result<Echoed, Code> {
    Ok(Echoed {
        body: req.body,
        query: req.query,
        uri: req.uri,
        header: req.header,
        meta: req.meta,
        request_id: ctx.request_id().map(str::to_string),
    })
}

static SHOP_CLOSED: OnceLock<Code> = OnceLock::new();

async fn closed(_: Context) -> Option<Code> {
    SHOP_CLOSED.get().cloned()
}

async fn stamp_meta(mut req: Request, next: Next) -> Response {
    req.meta_mut().set("received_at", chrono::Utc::now().to_rfc3339());
    next.run(req).await
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::default();
    config.setup_tracing();

    let mut router = BindRouter::without_state(config)?;
    let shop_closed = router
        .code_book_mut()
        .add_local(-1, [("en", "the shop is closed"), ("hi-IN", "दुकान बंद है")])?;
    let _ = SHOP_CLOSED.set(shop_closed);

    router
        .post("/shops/{shop}/echo", echo)
        .layer(axum::middleware::from_fn(stamp_meta))
        .get("/closed", closed)
        .get("/ping", |_: Context| async { Data("pong") })
        .setup_middleware()?
        .start()
        .await
}
