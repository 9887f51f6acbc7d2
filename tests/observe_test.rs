use async_trait::async_trait;
use oic_resource::clients::RemoteResource;
use oic_resource::config::{NotifyMode, PlatformConfig, ServerConfig};
use oic_resource::light_resource::entity::POWER;
use oic_resource::light_resource::{self, LightCreate};
use oic_resource::model::{EntityResponse, Notification, ObservationId, Representation, ResourceHandle};
use oic_resource::platform::{
    EntityHandler, InMemoryPlatform, ObserveSubscription, PlatformError, PlatformResult,
    RequestTransport, ResourceDescriptor, ResourcePlatform,
};
use std::sync::Arc;
use std::time::Duration;

/// Reports `NoObservers` only after a delay, like a platform on a slow link.
struct LaggingPlatform {
    inner: InMemoryPlatform,
    lag: Duration,
}

#[async_trait]
impl ResourcePlatform for LaggingPlatform {
    fn register_resource(
        &self,
        descriptor: ResourceDescriptor,
        handler: Arc<dyn EntityHandler>,
    ) -> PlatformResult<ResourceHandle> {
        self.inner.register_resource(descriptor, handler)
    }

    fn unregister_resource(&self, handle: ResourceHandle) -> PlatformResult<()> {
        self.inner.unregister_resource(handle)
    }

    fn send_response(&self, response: EntityResponse) -> PlatformResult<()> {
        self.inner.send_response(response)
    }

    async fn notify_all_observers(&self, handle: ResourceHandle) -> PlatformResult<usize> {
        let result = self.inner.notify_all_observers(handle).await;
        if matches!(result, Err(PlatformError::NoObservers(_))) {
            tokio::time::sleep(self.lag).await;
        }
        result
    }

    fn notify_list_of_observers(
        &self,
        handle: ResourceHandle,
        observers: &[ObservationId],
        response: EntityResponse,
    ) -> PlatformResult<usize> {
        self.inner.notify_list_of_observers(handle, observers, response)
    }
}

const WAIT: Duration = Duration::from_secs(2);

fn server_config(mode: NotifyMode) -> ServerConfig {
    ServerConfig {
        notify_interval_ms: 20,
        notify_mode: mode,
        ..ServerConfig::default()
    }
}

async fn next(subscription: &mut ObserveSubscription) -> Notification {
    tokio::time::timeout(WAIT, subscription.next())
        .await
        .expect("no notification in time")
        .expect("subscription closed")
}

async fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + WAIT;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

async fn observe_counter(mode: NotifyMode) {
    let platform = InMemoryPlatform::new(&PlatformConfig::default());
    let shared: Arc<dyn ResourcePlatform> = Arc::new(platform.clone());
    let light = light_resource::new("/a/light", LightCreate::default(), &server_config(mode), shared)
        .unwrap();
    let transport: Arc<dyn RequestTransport> = Arc::new(platform.clone());
    let descriptor = transport.find_resources(Some("core.light")).await.remove(0);
    let remote = RemoteResource::new(descriptor, transport);

    let mut subscription = remote.observe().await.unwrap();
    assert_eq!(subscription.initial().representation.get_int(POWER), Ok(0));
    assert!(light.is_notifying());

    let mut last_power = 0;
    for expected in 1..=5u64 {
        let notification = next(&mut subscription).await;
        assert_eq!(notification.sequence, expected);
        assert_eq!(notification.uri, "/a/light");
        let power = notification.representation.get_int(POWER).unwrap();
        assert!(power > last_power, "power {} after {}", power, last_power);
        last_power = power;
    }

    subscription.cancel().await.unwrap();
    assert_eq!(platform.observer_count("/a/light"), 0);
    assert!(wait_until(|| !light.is_notifying()).await, "notification loop still running");

    // A stopped loop does not advance the entity any further.
    let frozen = light.entity().await.unwrap().power;
    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(light.entity().await.unwrap().power, frozen);
}

#[tokio::test]
async fn test_notify_all_sequence_has_no_gaps() {
    observe_counter(NotifyMode::All).await;
}

#[tokio::test]
async fn test_list_of_observers_sequence_has_no_gaps() {
    observe_counter(NotifyMode::ListOfObservers).await;
}

#[tokio::test]
async fn test_each_observer_has_its_own_sequence() {
    let platform = InMemoryPlatform::new(&PlatformConfig::default());
    let shared: Arc<dyn ResourcePlatform> = Arc::new(platform.clone());
    let light = light_resource::new(
        "/a/light",
        LightCreate::default(),
        &server_config(NotifyMode::All),
        shared,
    )
    .unwrap();

    let mut early = platform.observe("/a/light", Default::default()).await.unwrap();
    next(&mut early).await;
    next(&mut early).await;

    let mut late = platform.observe("/a/light", Default::default()).await.unwrap();
    assert_ne!(early.id(), late.id());
    assert_eq!(next(&mut late).await.sequence, 1);
    assert!(next(&mut early).await.sequence >= 3);

    early.cancel().await.unwrap();
    assert_eq!(platform.observer_count("/a/light"), 1);
    assert!(light.is_notifying());

    drop(late);
    assert!(wait_until(|| !light.is_notifying()).await);
    assert_eq!(platform.observer_count("/a/light"), 0);
}

#[tokio::test]
async fn test_destroy_ends_subscriptions() {
    let platform = InMemoryPlatform::new(&PlatformConfig::default());
    let shared: Arc<dyn ResourcePlatform> = Arc::new(platform.clone());
    let light = light_resource::new(
        "/a/light",
        LightCreate::default(),
        &server_config(NotifyMode::All),
        shared,
    )
    .unwrap();

    let mut subscription = platform.observe("/a/light", Default::default()).await.unwrap();
    next(&mut subscription).await;

    light.destroy().await.unwrap();
    assert!(!light.is_notifying());

    let ended = tokio::time::timeout(WAIT, async {
        while subscription.next().await.is_some() {}
    })
    .await;
    assert!(ended.is_ok(), "subscription still open after destroy");
    subscription.cancel().await.unwrap();
}

#[tokio::test]
async fn test_manual_notify_without_observers_fails() {
    let platform = InMemoryPlatform::new(&PlatformConfig::default());
    let shared: Arc<dyn ResourcePlatform> = Arc::new(platform.clone());
    let light = light_resource::new(
        "/a/light",
        LightCreate::default(),
        &ServerConfig::default(),
        shared,
    )
    .unwrap();

    let err = light.notify_observers().await.unwrap_err();
    assert!(err.to_string().contains("No observers"));

    let mut subscription = platform.observe("/a/light", Default::default()).await.unwrap();
    assert_eq!(light.notify_observers().await.unwrap(), 1);
    assert_eq!(next(&mut subscription).await.sequence, 1);
}

#[tokio::test]
async fn test_observer_added_while_loop_stops_is_notified() {
    let platform = InMemoryPlatform::new(&PlatformConfig::default());
    let lagging: Arc<dyn ResourcePlatform> = Arc::new(LaggingPlatform {
        inner: platform.clone(),
        lag: Duration::from_millis(200),
    });
    let light = light_resource::new(
        "/a/light",
        LightCreate::default(),
        &server_config(NotifyMode::All),
        lagging,
    )
    .unwrap();

    let mut first = platform.observe("/a/light", Default::default()).await.unwrap();
    next(&mut first).await;
    first.cancel().await.unwrap();

    // The loop is now waiting on a NoObservers answer.
    tokio::time::sleep(Duration::from_millis(60)).await;
    let mut second = platform.observe("/a/light", Default::default()).await.unwrap();
    assert_eq!(next(&mut second).await.sequence, 1);
    assert!(light.is_notifying());

    drop(second);
    assert!(wait_until(|| !light.is_notifying()).await);
}

#[tokio::test]
async fn test_power_ramp_stops_at_max() {
    let platform = InMemoryPlatform::new(&PlatformConfig::default());
    let shared: Arc<dyn ResourcePlatform> = Arc::new(platform.clone());
    let light = light_resource::new(
        "/a/light",
        LightCreate::default(),
        &server_config(NotifyMode::All),
        shared,
    )
    .unwrap();
    light
        .set_attributes(Representation::new().with(POWER, i64::MAX))
        .await
        .unwrap();

    let mut subscription = platform.observe("/a/light", Default::default()).await.unwrap();
    for _ in 0..3 {
        let notification = next(&mut subscription).await;
        assert_eq!(notification.representation.get_int(POWER), Ok(i64::MAX));
    }
    assert_eq!(light.attributes().await.unwrap().get_int(POWER), Ok(i64::MAX));
    subscription.cancel().await.unwrap();
}
