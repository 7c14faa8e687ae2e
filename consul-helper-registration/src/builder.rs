//! Building registration descriptors.
//!
//! Two forms share the same validation and defaults:
//!
//! - [`build_descriptor`] takes a [`RegistrationOptions`] value and returns a
//!   descriptor.
//! - [`RegistrationBuilder`] accumulates overrides fluently and writes the
//!   result onto an existing descriptor.
//!
//! ```rust
//! use consul_helper_registration::{RegistrationBuilder, RegistrationDescriptor, TimeUnit};
//!
//! # fn main() -> consul_helper_registration::Result<()> {
//! let mut builder = RegistrationBuilder::new("billing");
//! builder.with_port(5000)?.with_tags(["v1"])?;
//! builder
//!     .with_health_check("api/health")?
//!     .with_ping_interval(15, TimeUnit::Seconds)?;
//!
//! let mut descriptor = RegistrationDescriptor::default();
//! builder.finalize(&mut descriptor)?;
//! assert_eq!(descriptor.service_id(), "billing");
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::Arc;

use crate::descriptor::{HealthCheckDescriptor, RegistrationDescriptor, Weights};
use crate::duration::{CheckDuration, TimeUnit};
use crate::health::DEFAULT_HEALTH_ROUTE;
use crate::port::{LoopbackPortAllocator, PortAllocator};
use crate::{RegistrationError, Result};

/// Registry used when none is configured.
pub const DEFAULT_REGISTRY_URL: &str = "http://localhost:8500";

/// Service base URL used by the builders when none is configured.
pub const DEFAULT_SERVICE_BASE_URL: &str = "http://localhost";

/// Health-check interval used when none is configured.
pub const DEFAULT_CHECK_INTERVAL: CheckDuration = CheckDuration::seconds(10);

/// How long a critical service stays registered when none is configured.
pub const DEFAULT_DEREGISTER_AFTER: CheckDuration = CheckDuration::minutes(1);

// ============================================================================
// Options form
// ============================================================================

/// Inputs for [`build_descriptor`]. Unset fields take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationOptions {
    pub name: String,
    pub id: Option<String>,
    pub port: Option<u16>,
    pub registry_url: Option<String>,
    pub service_base_url: Option<String>,
    pub tags: Vec<String>,
    pub weights: Option<Weights>,
    pub enable_tag_override: bool,
    /// Health check to attach; the default route is checked when `None`.
    pub health_check: Option<HealthCheckOptions>,
}

impl RegistrationOptions {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Inputs for the health check of a registration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthCheckOptions {
    /// Route Consul probes; [`DEFAULT_HEALTH_ROUTE`] when `None`.
    pub relative_url: Option<String>,
    pub interval: Option<CheckDuration>,
    pub deregister_after: Option<CheckDuration>,
    pub timeout: Option<CheckDuration>,
}

impl HealthCheckOptions {
    pub fn new(relative_url: impl Into<String>) -> Self {
        Self {
            relative_url: Some(relative_url.into()),
            ..Default::default()
        }
    }

    /// Validate and fill in defaults.
    pub fn build(&self) -> Result<HealthCheckDescriptor> {
        let relative_url = self.relative_url.as_deref().unwrap_or(DEFAULT_HEALTH_ROUTE);
        if relative_url.trim().is_empty() {
            return Err(RegistrationError::validation(
                "Health check URL must not be empty",
            ));
        }

        Ok(HealthCheckDescriptor::new(
            relative_url,
            self.interval.unwrap_or(DEFAULT_CHECK_INTERVAL),
            self.deregister_after.unwrap_or(DEFAULT_DEREGISTER_AFTER),
            self.timeout,
        ))
    }
}

/// Build a descriptor from options, drawing the port from `ports` when unset.
pub fn build_descriptor(
    options: RegistrationOptions,
    ports: &dyn PortAllocator,
) -> Result<RegistrationDescriptor> {
    validate_name(&options.name)?;
    let check = options.health_check.clone().unwrap_or_default().build()?;
    assemble(options, ports, check)
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(RegistrationError::validation(
            "Service name must not be empty",
        ));
    }
    Ok(())
}

// Defaults apply in order: port, registry URL, base URL.
fn assemble(
    options: RegistrationOptions,
    ports: &dyn PortAllocator,
    check: HealthCheckDescriptor,
) -> Result<RegistrationDescriptor> {
    let port = match options.port {
        Some(port) if port != 0 => port,
        _ => ports.port()?,
    };

    let consul_url = non_empty(options.registry_url).unwrap_or_else(|| DEFAULT_REGISTRY_URL.into());
    let address =
        non_empty(options.service_base_url).unwrap_or_else(|| DEFAULT_SERVICE_BASE_URL.into());

    Ok(RegistrationDescriptor {
        id: options.id.unwrap_or_default(),
        name: options.name,
        address,
        port,
        tags: options.tags,
        enable_tag_override: options.enable_tag_override,
        check: Some(check),
        weights: options.weights,
        consul_url,
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// ============================================================================
// Fluent form
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Active,
    Finalized,
    Disposed,
}

/// Fluent builder for a [`RegistrationDescriptor`].
///
/// Every method fails with [`RegistrationError::Lifecycle`] once the builder
/// has been finalized or disposed.
pub struct RegistrationBuilder {
    options: RegistrationOptions,
    tag_override: Option<bool>,
    health_check: Option<HealthCheckBuilder>,
    ports: Arc<dyn PortAllocator>,
    state: State,
}

impl fmt::Debug for RegistrationBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationBuilder")
            .field("options", &self.options)
            .field("tag_override", &self.tag_override)
            .field("health_check", &self.health_check)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl RegistrationBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            options: RegistrationOptions::new(name),
            tag_override: None,
            health_check: None,
            ports: Arc::new(LoopbackPortAllocator::new()),
            state: State::Active,
        }
    }

    /// Draw unset ports from `ports` instead of a private loopback allocator.
    pub fn with_port_allocator(mut self, ports: Arc<dyn PortAllocator>) -> Self {
        self.ports = ports;
        self
    }

    pub fn with_port(&mut self, port: u16) -> Result<&mut Self> {
        self.ensure_active()?;
        self.options.port = Some(port);
        Ok(self)
    }

    pub fn with_registry_url(&mut self, url: impl Into<String>) -> Result<&mut Self> {
        self.ensure_active()?;
        self.options.registry_url = Some(url.into());
        Ok(self)
    }

    pub fn with_service_base_url(&mut self, url: impl Into<String>) -> Result<&mut Self> {
        self.ensure_active()?;
        self.options.service_base_url = Some(url.into());
        Ok(self)
    }

    pub fn with_tags<I, S>(&mut self, tags: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ensure_active()?;
        self.options.tags = tags.into_iter().map(Into::into).collect();
        Ok(self)
    }

    pub fn with_weights(&mut self, weights: Weights) -> Result<&mut Self> {
        self.ensure_active()?;
        self.options.weights = Some(weights);
        Ok(self)
    }

    /// Set `EnableTagOverride`; when never called, finalize leaves the
    /// target's flag as it was.
    pub fn with_tag_override(&mut self, enabled: bool) -> Result<&mut Self> {
        self.ensure_active()?;
        self.options.enable_tag_override = enabled;
        self.tag_override = Some(enabled);
        Ok(self)
    }

    /// Configure the health check.
    ///
    /// The first call creates the nested builder for `relative_url`; later
    /// calls return that same builder and ignore their argument.
    pub fn with_health_check(
        &mut self,
        relative_url: impl Into<String>,
    ) -> Result<&mut HealthCheckBuilder> {
        self.ensure_active()?;
        Ok(self
            .health_check
            .get_or_insert_with(|| HealthCheckBuilder::new(relative_url)))
    }

    /// The nested health-check builder, if one was requested.
    pub fn health_check(&self) -> Option<&HealthCheckBuilder> {
        self.health_check.as_ref()
    }

    /// Apply defaults and write the result onto `target`.
    ///
    /// A health check on [`DEFAULT_HEALTH_ROUTE`] is added when none was
    /// configured. The builder is finalized on success and stays usable when
    /// validation fails.
    pub fn finalize(&mut self, target: &mut RegistrationDescriptor) -> Result<()> {
        self.ensure_active()?;
        validate_name(&self.options.name)?;

        let check = self
            .health_check
            .get_or_insert_with(|| HealthCheckBuilder::new(DEFAULT_HEALTH_ROUTE))
            .finalize()?;

        let built = assemble(self.options.clone(), self.ports.as_ref(), check)?;

        if !built.id.is_empty() {
            target.id = built.id;
        }
        target.name = built.name;
        target.port = built.port;
        target.consul_url = built.consul_url;
        target.address = built.address;
        if !built.tags.is_empty() {
            target.tags = built.tags;
        }
        if built.weights.is_some() {
            target.weights = built.weights;
        }
        if let Some(enabled) = self.tag_override {
            target.enable_tag_override = enabled;
        }
        target.check = built.check;

        self.state = State::Finalized;
        Ok(())
    }

    /// Release the accumulated settings. Later calls fail.
    pub fn dispose(&mut self) {
        self.options = RegistrationOptions::default();
        self.tag_override = None;
        if let Some(mut health_check) = self.health_check.take() {
            health_check.dispose();
        }
        self.state = State::Disposed;
    }

    pub fn is_finalized(&self) -> bool {
        self.state == State::Finalized
    }

    fn ensure_active(&self) -> Result<()> {
        match self.state {
            State::Active => Ok(()),
            State::Finalized | State::Disposed => {
                Err(RegistrationError::Lifecycle("RegistrationBuilder"))
            }
        }
    }
}

/// Nested builder for the health check of a registration.
#[derive(Debug)]
pub struct HealthCheckBuilder {
    options: HealthCheckOptions,
    disposed: bool,
}

impl HealthCheckBuilder {
    fn new(relative_url: impl Into<String>) -> Self {
        Self {
            options: HealthCheckOptions::new(relative_url),
            disposed: false,
        }
    }

    /// How long Consul keeps the service after its check turns critical.
    pub fn with_deregister_timeout(&mut self, duration: u8, unit: TimeUnit) -> Result<&mut Self> {
        self.ensure_active()?;
        self.options.deregister_after = Some(CheckDuration::new(duration, unit)?);
        Ok(self)
    }

    /// How often Consul probes the check route.
    pub fn with_ping_interval(&mut self, duration: u8, unit: TimeUnit) -> Result<&mut Self> {
        self.ensure_active()?;
        self.options.interval = Some(CheckDuration::new(duration, unit)?);
        Ok(self)
    }

    pub fn with_timeout(&mut self, duration: u8, unit: TimeUnit) -> Result<&mut Self> {
        self.ensure_active()?;
        self.options.timeout = Some(CheckDuration::new(duration, unit)?);
        Ok(self)
    }

    pub fn relative_url(&self) -> &str {
        self.options.relative_url.as_deref().unwrap_or_default()
    }

    /// Fill in defaults and produce the descriptor.
    pub fn finalize(&mut self) -> Result<HealthCheckDescriptor> {
        self.ensure_active()?;
        self.options.build()
    }

    pub fn dispose(&mut self) {
        self.options = HealthCheckOptions::default();
        self.disposed = true;
    }

    fn ensure_active(&self) -> Result<()> {
        if self.disposed {
            return Err(RegistrationError::Lifecycle("HealthCheckBuilder"));
        }
        Ok(())
    }
}
