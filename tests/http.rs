use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use weather_sim::server::http;
use weather_sim::{Reading, SimError};

struct TestServer {
    addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<Result<(), SimError>>,
}

impl TestServer {
    async fn start(paths: &[&str]) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let devices: Vec<String> = paths
            .iter()
            .map(|path| format!("http://{}{}", addr, path))
            .collect();

        let (shutdown, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            http::serve(listener, &devices, async {
                rx.await.ok();
            })
            .await
        });

        Self {
            addr,
            shutdown,
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn stop(self) {
        self.shutdown.send(()).unwrap();
        self.handle.await.unwrap().unwrap();
    }
}

#[tokio::test]
async fn test_discovery_lists_devices() {
    let server = TestServer::start(&["/temperature/1", "/humidity/1"]).await;

    let body = reqwest::get(server.url("/discovery"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    let listed: Vec<&str> = body.lines().collect();
    assert_eq!(
        listed,
        vec![
            server.url("/temperature/1").as_str(),
            server.url("/humidity/1").as_str()
        ]
    );

    server.stop().await;
}

#[tokio::test]
async fn test_value_endpoint_returns_number() {
    let server = TestServer::start(&["/temperature/1"]).await;

    let response = reqwest::get(server.url("/temperature/1")).await.unwrap();
    assert!(response.status().is_success());
    let value: f64 = response.text().await.unwrap().trim().parse().unwrap();
    assert!((value - 30.6).abs() <= 5.0 * 3.1, "value {} out of bounds", value);

    server.stop().await;
}

#[tokio::test]
async fn test_each_request_advances_sequence() {
    let server = TestServer::start(&["/humidity/2"]).await;
    let client = reqwest::Client::new();

    let mut seqs = Vec::new();
    for _ in 0..3 {
        let reading: Reading = client
            .get(server.url("/humidity/2/reading"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!((reading.value - 40.7).abs() <= 5.0 * 2.3);
        seqs.push(reading.seq);
    }
    assert_eq!(seqs, vec![1, 2, 3]);

    // the plain value route shares the same sensor
    client.get(server.url("/humidity/2")).send().await.unwrap();
    let reading: Reading = client
        .get(server.url("/humidity/2/reading"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(reading.seq, 5);

    server.stop().await;
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let server = TestServer::start(&["/temperature/1"]).await;

    let response = reqwest::get(server.url("/temperature/2")).await.unwrap();
    assert_eq!(response.status().as_u16(), 404);

    server.stop().await;
}

#[tokio::test]
async fn test_serve_rejects_empty_device_list() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let result = http::serve(listener, &[], std::future::ready(())).await;
    assert!(matches!(result, Err(SimError::Configuration(_))));
}
