#![allow(dead_code)]

use axum::Router;
use chainfly_client::chainfly::{ApiClient, Session};
use std::net::{SocketAddr, TcpListener};
use std::time::Duration;

/// Serve `app` on an ephemeral localhost port for the rest of the test.
pub fn spawn(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let server = axum::Server::from_tcp(listener)
        .expect("from_tcp")
        .serve(app.into_make_service());
    tokio::spawn(async move {
        let _ = server.await;
    });
    addr
}

pub fn client_for(addr: SocketAddr, session: Session) -> ApiClient {
    ApiClient::new(
        &format!("http://{addr}/api"),
        Some(Duration::from_secs(5)),
        session,
    )
    .expect("client")
}

/// A port nothing is listening on.
pub fn dead_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    listener.local_addr().expect("local addr")
}
