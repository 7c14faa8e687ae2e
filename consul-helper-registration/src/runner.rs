//! Startup hook that publishes the registration.

use async_trait::async_trait;

use crate::descriptor::RegistrationDescriptor;
use crate::publisher::{PublishReport, RegistryPublisher};
use crate::shutdown::ShutdownSignal;

/// Result of a lifecycle hook.
pub type LifecycleResult = std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Hook the host runs once at startup and once at shutdown.
#[async_trait]
pub trait StartupHook: Send + Sync {
    /// Called when the host starts. `shutdown` fires if the host stops early.
    async fn on_start(&self, shutdown: ShutdownSignal) -> LifecycleResult;

    /// Called when the host stops.
    async fn on_stop(&self) -> LifecycleResult {
        Ok(())
    }
}

/// Publishes one descriptor when the host starts.
///
/// Registration problems are logged and never stop the host.
#[derive(Clone)]
pub struct RegistrationRunner {
    publisher: RegistryPublisher,
    descriptor: RegistrationDescriptor,
}

impl RegistrationRunner {
    pub fn new(publisher: RegistryPublisher, descriptor: RegistrationDescriptor) -> Self {
        Self {
            publisher,
            descriptor,
        }
    }

    pub fn descriptor(&self) -> &RegistrationDescriptor {
        &self.descriptor
    }

    pub fn publisher(&self) -> &RegistryPublisher {
        &self.publisher
    }

    /// Publish and log the outcome.
    pub async fn register(&self, shutdown: &ShutdownSignal) -> PublishReport {
        let report = self.publisher.publish(&self.descriptor, shutdown).await;
        report.emit();
        report
    }
}

#[async_trait]
impl StartupHook for RegistrationRunner {
    async fn on_start(&self, shutdown: ShutdownSignal) -> LifecycleResult {
        self.register(&shutdown).await;
        Ok(())
    }
}
