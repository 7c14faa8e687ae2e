//! Host-level registration workflows: configuration in, PUT to the agent out.

use consul_helper::config::{ConfigManager, FileFormat};
use consul_helper::*;
use serde_json::json;
use std::io::Write;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn agent() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v1/agent/service/register"))
        .and(body_partial_json(json!({
            "ID": "billing-1",
            "Name": "billing",
            "Address": "http://10.0.0.5",
            "Port": 5000,
            "Tags": ["v1", "eu"],
            "Check": {
                "Args": ["api/consul-helper/health"],
                "Interval": "15s",
                "DeregisterCriticalServiceAfter": "1m"
            }
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_register_from_toml_file() {
    let server = agent().await;

    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    write!(
        file,
        r#"
        [ServiceDiscovery]
        Id = "billing-1"
        Name = "billing"
        Address = "http://10.0.0.5"
        Port = 5000
        Tags = ["v1", "eu"]
        ConsulUrl = "{}"
        HealthCheckInterval = "15s"
        "#,
        server.uri()
    )
    .unwrap();

    let manager = ConfigManager::new();
    manager.load_file(file.path(), FileFormat::Toml).unwrap();

    let runner = configure_consul_helper(&manager).unwrap();
    let (_trigger, shutdown) = shutdown_channel();

    let hook: &dyn StartupHook = &runner;
    hook.on_start(shutdown).await.unwrap();
    hook.on_stop().await.unwrap();
}

#[tokio::test]
async fn test_register_from_environment_style_settings() {
    let server = agent().await;

    let manager = ConfigManager::with_prefix("CONSUL_HELPER");
    manager
        .load_str(
            &format!(
                "REGISTRY__ID=billing-1\n\
                 REGISTRY__NAME=billing\n\
                 REGISTRY__ADDRESS=http://10.0.0.5\n\
                 REGISTRY__PORT=5000\n\
                 REGISTRY__CONSULURL={}\n\
                 REGISTRY__HEALTHCHECKINTERVAL=15s\n\
                 REGISTRY__MAXRETRIES=0\n",
                server.uri()
            ),
            FileFormat::Env,
        )
        .unwrap();
    manager.set("registry.tags", vec!["v1", "eu"]).unwrap();

    let runner = configure_consul_helper_section(&manager, "Registry").unwrap();
    let report = runner.register(&ShutdownSignal::never()).await;

    assert!(report.is_registered(), "{:?}", report.events);
    assert_eq!(report.service_id, "billing-1");
}

#[tokio::test]
async fn test_unreachable_registry_does_not_fail_startup() {
    // Bound then released, so nothing listens there
    let closed_port = LoopbackPortAllocator::new().port().unwrap();

    let manager = ConfigManager::new();
    manager
        .load_str(
            &json!({"ServiceDiscovery": {
                "Name": "billing",
                "Address": "http://10.0.0.5",
                "ConsulUrl": format!("http://127.0.0.1:{}", closed_port),
                "MaxRetries": 0
            }})
            .to_string(),
            FileFormat::Json,
        )
        .unwrap();

    let runner = configure_consul_helper(&manager).unwrap();
    assert_ne!(runner.descriptor().port, 0);

    let report = runner.register(&ShutdownSignal::never()).await;
    assert!(matches!(
        report.outcome(),
        Some(PublishEvent::Failed { attempts: 1, .. })
    ));
    assert!(runner.on_start(ShutdownSignal::never()).await.is_ok());
}

#[tokio::test]
async fn test_shutdown_before_start_skips_registration() {
    let manager = ConfigManager::new();
    manager.set("servicediscovery.name", "billing").unwrap();
    manager.set("servicediscovery.address", "http://10.0.0.5").unwrap();

    let runner = configure_consul_helper(&manager).unwrap();
    let (trigger, shutdown) = shutdown_channel();
    trigger.trigger();

    let report = runner.register(&shutdown).await;
    assert_eq!(report.outcome(), Some(&PublishEvent::Cancelled { attempts: 1 }));
}

#[test]
fn test_health_endpoint() {
    assert_eq!(DEFAULT_HEALTH_ROUTE, "api/consul-helper/health");
    assert_eq!(health_response().status(), 200);
}
