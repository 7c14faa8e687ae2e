//! Port selection for services that do not pin their port.

use parking_lot::Mutex;
use std::net::{Ipv4Addr, TcpListener};
use tracing::debug;

use crate::{RegistrationError, Result};

/// Source of the port a service registers with.
pub trait PortAllocator: Send + Sync {
    /// Return the port, choosing one on first use.
    fn port(&self) -> Result<u16>;

    /// Forget the chosen port so the next call picks again.
    fn reset(&self);
}

/// Asks the OS for a free loopback port and keeps it until reset.
#[derive(Debug, Default)]
pub struct LoopbackPortAllocator {
    cached: Mutex<Option<u16>>,
}

impl LoopbackPortAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    fn probe() -> Result<u16> {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
            .map_err(RegistrationError::PortAllocation)?;
        let port = listener
            .local_addr()
            .map_err(RegistrationError::PortAllocation)?
            .port();
        debug!(port, "Picked free loopback port");
        Ok(port)
    }
}

impl PortAllocator for LoopbackPortAllocator {
    fn port(&self) -> Result<u16> {
        let mut cached = self.cached.lock();
        if let Some(port) = *cached {
            return Ok(port);
        }

        let port = Self::probe()?;
        *cached = Some(port);
        Ok(port)
    }

    fn reset(&self) {
        *self.cached.lock() = None;
    }
}

/// Always hands out the same port.
#[derive(Debug, Clone, Copy)]
pub struct FixedPortAllocator(pub u16);

impl PortAllocator for FixedPortAllocator {
    fn port(&self) -> Result<u16> {
        Ok(self.0)
    }

    fn reset(&self) {}
}
