//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::time::Duration;

use ack::config::AckServerConfig;
use ack::{HttpServer, ServiceIdentity, Shutdown};
use tokio::net::TcpListener;

/// A running ack server on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Configuration with a recognizable identity.
pub fn test_config() -> AckServerConfig {
    let mut config = AckServerConfig::default();
    config.identity = ServiceIdentity {
        agent: "it-agent".into(),
        service_env: "integration".into(),
        service_ns: "acks".into(),
    };
    config
}

/// Start the ack server and wait until it accepts connections.
pub async fn start_server(config: AckServerConfig) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config);
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    TestServer { addr, shutdown }
}

/// Plain client without connection pooling surprises.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
