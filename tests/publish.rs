use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;
use weather_sim::{
    BrokerClient, BrokerError, PublishConfig, PublishSink, QoS, Reading, SensorConfig,
    SensorSimulator, SimError,
};

#[derive(Debug, Clone)]
struct Published {
    topic: String,
    payload: Vec<u8>,
    qos: QoS,
}

/// In-memory broker recording every call.
#[derive(Clone, Default)]
struct RecordingBroker {
    published: Arc<Mutex<Vec<Published>>>,
    connects: Arc<AtomicUsize>,
    disconnects: Arc<AtomicUsize>,
    /// Fail every n-th publish (1-based); 0 never fails.
    fail_every: usize,
    refuse_connect: bool,
}

impl RecordingBroker {
    fn published(&self) -> Vec<Published> {
        self.published.lock().unwrap().clone()
    }

    fn readings(&self) -> Vec<Reading> {
        self.published()
            .iter()
            .map(|p| serde_json::from_slice(&p.payload).unwrap())
            .collect()
    }
}

struct Session {
    attempts: usize,
}

#[async_trait]
impl BrokerClient for RecordingBroker {
    type Connection = Session;

    async fn connect(&self, destination: &Url) -> Result<Session, BrokerError> {
        if self.refuse_connect {
            return Err(BrokerError::Connect {
                destination: destination.to_string(),
                reason: "connection refused".to_string(),
            });
        }
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Session { attempts: 0 })
    }

    async fn publish(
        &self,
        session: &mut Session,
        topic: &str,
        payload: Vec<u8>,
        qos: QoS,
    ) -> Result<(), BrokerError> {
        session.attempts += 1;
        if self.fail_every > 0 && session.attempts % self.fail_every == 0 {
            return Err(BrokerError::Publish {
                topic: topic.to_string(),
                reason: "broker unavailable".to_string(),
            });
        }
        self.published.lock().unwrap().push(Published {
            topic: topic.to_string(),
            payload,
            qos,
        });
        Ok(())
    }

    async fn disconnect(&self, _session: Session) {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
    }
}

fn publish_config(server_url: &str, topic: &str) -> PublishConfig {
    PublishConfig {
        server_url: server_url.to_string(),
        topic: topic.to_string(),
        qos: QoS::AtLeastOnce,
    }
}

fn every_second() -> SensorConfig {
    SensorConfig {
        delay_min: 1,
        delay_max: 1,
        randomize: false,
        ..SensorConfig::temperature()
    }
}

#[tokio::test(start_paused = true)]
async fn test_publishes_json_readings() {
    let broker = RecordingBroker::default();
    let sink = PublishSink::from_config(
        broker.clone(),
        &publish_config("mqtt://localhost:1883", "sensors/weather"),
    );
    let mut sim = SensorSimulator::with_seed(&every_second(), sink, 11);

    sim.run().await.unwrap();
    assert_eq!(broker.connects.load(Ordering::SeqCst), 1);

    tokio::time::sleep(Duration::from_millis(4_500)).await;
    sim.stop().await.unwrap();
    assert_eq!(broker.disconnects.load(Ordering::SeqCst), 1);

    let published = broker.published();
    assert_eq!(published.len(), 5);
    assert!(published.iter().all(|p| p.topic == "sensors/weather"));
    assert!(published.iter().all(|p| p.qos == QoS::AtLeastOnce));

    let payload: serde_json::Value = serde_json::from_slice(&published[0].payload).unwrap();
    assert!(payload.get("value").is_some());
    assert!(payload.get("timestamp").is_some());
    assert_eq!(payload["seq"], 1);

    let seqs: Vec<u64> = broker.readings().iter().map(|r| r.seq).collect();
    assert_eq!(seqs, vec![1, 2, 3, 4, 5]);
}

#[tokio::test(start_paused = true)]
async fn test_publish_failures_do_not_stop_loop() {
    let broker = RecordingBroker {
        fail_every: 2,
        ..RecordingBroker::default()
    };
    let sink = PublishSink::from_config(
        broker.clone(),
        &publish_config("mqtt://localhost:1883", "sensors/weather"),
    );
    let mut sim = SensorSimulator::with_seed(&every_second(), sink, 12);

    sim.run().await.unwrap();
    tokio::time::sleep(Duration::from_millis(5_500)).await;
    assert!(sim.is_running());
    sim.stop().await.unwrap();

    // six ticks, every second publish rejected
    let seqs: Vec<u64> = broker.readings().iter().map(|r| r.seq).collect();
    assert_eq!(seqs, vec![1, 3, 5]);
    assert_eq!(sim.sequence(), Some(6));
}

#[tokio::test]
async fn test_malformed_url_keeps_simulator_idle() {
    let broker = RecordingBroker::default();
    let sink = PublishSink::from_config(broker.clone(), &publish_config("", "sensors/weather"));
    let mut sim = SensorSimulator::with_seed(&every_second(), sink, 13);

    let err = sim.run().await.unwrap_err();
    assert!(matches!(err, SimError::Configuration(_)));
    assert!(!sim.is_running());
    assert_eq!(broker.connects.load(Ordering::SeqCst), 0);

    // still idle and still usable
    assert!(sim.stop().await.is_ok());
    assert_eq!(sim.sequence(), Some(0));
}

#[tokio::test]
async fn test_malformed_topic_keeps_simulator_idle() {
    let broker = RecordingBroker::default();
    let sink = PublishSink::from_config(broker, &publish_config("mqtt://localhost", "sensors/#"));
    let mut sim = SensorSimulator::with_seed(&every_second(), sink, 14);

    assert!(matches!(sim.run().await, Err(SimError::Configuration(_))));
    assert!(!sim.is_running());
}

#[tokio::test]
async fn test_refused_connection_is_returned_from_run() {
    let broker = RecordingBroker {
        refuse_connect: true,
        ..RecordingBroker::default()
    };
    let sink = PublishSink::from_config(broker, &publish_config("mqtt://localhost", "sensors/weather"));
    let mut sim = SensorSimulator::with_seed(&every_second(), sink, 15);

    assert!(matches!(sim.run().await, Err(SimError::Connect(_))));
    assert!(!sim.is_running());
}

#[tokio::test(start_paused = true)]
async fn test_restart_reconnects() {
    let broker = RecordingBroker::default();
    let sink = PublishSink::from_config(
        broker.clone(),
        &publish_config("mqtt://localhost:1883", "sensors/weather"),
    );
    let mut sim = SensorSimulator::with_seed(&every_second(), sink, 16);

    for cycle in 1..=3 {
        sim.run().await.unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;
        sim.stop().await.unwrap();

        assert_eq!(broker.connects.load(Ordering::SeqCst), cycle);
        assert_eq!(broker.disconnects.load(Ordering::SeqCst), cycle);
    }

    let seqs: Vec<u64> = broker.readings().iter().map(|r| r.seq).collect();
    assert_eq!(seqs, vec![1, 2, 3]);
}

#[tokio::test(start_paused = true)]
async fn test_weather_server_runs_until_shutdown() {
    let broker = RecordingBroker::default();
    let config = publish_config("mqtt://localhost:1883", "sensors/weather");

    weather_sim::server::weather::run_with(
        broker.clone(),
        &config,
        tokio::time::sleep(Duration::from_secs(30)),
    )
    .await
    .unwrap();

    assert_eq!(broker.connects.load(Ordering::SeqCst), 1);
    assert_eq!(broker.disconnects.load(Ordering::SeqCst), 1);
    // temperature schedule waits 3-5 s between readings
    let count = broker.published().len();
    assert!((7..=11).contains(&count), "published {count} readings");
}

#[tokio::test]
async fn test_weather_server_reports_bad_url() {
    let config = publish_config("not a url", "sensors/weather");
    let result = weather_sim::server::weather::run_with(
        RecordingBroker::default(),
        &config,
        std::future::ready(()),
    )
    .await;

    assert!(matches!(result, Err(SimError::Configuration(_))));
}
