use async_trait::async_trait;
use oic_resource::clients::DiscoveryTask;
use oic_resource::config::{ClientConfig, PlatformConfig, ServerConfig};
use oic_resource::door_resource;
use oic_resource::light_resource::{self, LightCreate};
use oic_resource::model::{ClientRequest, EntityResponse, ObservationId, QueryParams};
use oic_resource::platform::{
    InMemoryPlatform, ObserveSubscription, PlatformResult, RequestTransport, ResourceDescriptor,
    ResourcePlatform,
};
use std::sync::Arc;
use std::time::Duration;

/// Delays every discovery poll.
struct SlowTransport {
    inner: InMemoryPlatform,
    delay: Duration,
}

#[async_trait]
impl RequestTransport for SlowTransport {
    async fn find_resources(&self, resource_type: Option<&str>) -> Vec<ResourceDescriptor> {
        tokio::time::sleep(self.delay).await;
        self.inner.find_resources(resource_type).await
    }

    async fn request(&self, uri: &str, request: ClientRequest) -> PlatformResult<EntityResponse> {
        self.inner.request(uri, request).await
    }

    async fn observe(&self, uri: &str, query: QueryParams) -> PlatformResult<ObserveSubscription> {
        self.inner.observe(uri, query).await
    }

    async fn cancel_observation(&self, uri: &str, id: ObservationId) -> PlatformResult<()> {
        self.inner.cancel_observation(uri, id).await
    }
}

fn client_config() -> ClientConfig {
    ClientConfig {
        discovery_interval_ms: 20,
    }
}

#[tokio::test]
async fn test_discovery_reports_each_resource_once() {
    let platform = InMemoryPlatform::new(&PlatformConfig::default());
    let shared: Arc<dyn ResourcePlatform> = Arc::new(platform.clone());
    let config = ServerConfig::default();
    let _left = door_resource::new("/a/door/left", "left", &config, shared.clone()).unwrap();
    let _light = light_resource::new("/a/light", LightCreate::default(), &config, shared.clone()).unwrap();

    let (task, mut found) =
        DiscoveryTask::start(Arc::new(platform.clone()), Some("core.door".to_string()), &client_config());

    let first = tokio::time::timeout(Duration::from_secs(1), found.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.uri(), "/a/door/left");

    // Several polls go by without repeating the known door.
    tokio::time::sleep(Duration::from_millis(80)).await;
    assert!(found.try_recv().is_err());

    let _right = door_resource::new("/a/door/right", "right", &config, shared).unwrap();
    let second = tokio::time::timeout(Duration::from_secs(1), found.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(second.uri(), "/a/door/right");
    assert_eq!(second.get().await.unwrap().get_str("side"), Ok("right"));

    task.cancel();
    assert_eq!(task.join().await, 2);
}

#[tokio::test]
async fn test_cancel_drops_in_flight_results() {
    let platform = InMemoryPlatform::new(&PlatformConfig::default());
    let shared: Arc<dyn ResourcePlatform> = Arc::new(platform.clone());
    let _light =
        light_resource::new("/a/light", LightCreate::default(), &ServerConfig::default(), shared).unwrap();
    let transport = Arc::new(SlowTransport {
        inner: platform,
        delay: Duration::from_millis(100),
    });

    let (task, mut found) = DiscoveryTask::start(transport, None, &client_config());
    tokio::time::sleep(Duration::from_millis(30)).await;
    task.cancel();

    assert_eq!(task.join().await, 0);
    assert!(found.recv().await.is_none());
}

#[tokio::test]
async fn test_dropping_receiver_stops_discovery() {
    let platform = InMemoryPlatform::new(&PlatformConfig::default());
    let shared: Arc<dyn ResourcePlatform> = Arc::new(platform.clone());
    let _light =
        light_resource::new("/a/light", LightCreate::default(), &ServerConfig::default(), shared.clone())
            .unwrap();

    let (task, found) = DiscoveryTask::start(Arc::new(platform.clone()), None, &client_config());
    drop(found);

    let _door = door_resource::new("/a/door", "left", &ServerConfig::default(), shared).unwrap();
    let reported = tokio::time::timeout(Duration::from_secs(1), task.join())
        .await
        .expect("discovery kept running");
    assert!(reported >= 1);
}
