use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tokio::time::timeout;
use tracing::{debug, warn};

use super::error::ExecutionError;

/// Process-wide exclusive access to scanner devices
///
/// Each device name (the empty string being the system default device) gets
/// its own async mutex. A scan holds the returned guard for as long as the
/// scanner runs; other requests for the same device wait up to `wait` and
/// are then turned away.
#[derive(Debug, Default)]
pub struct DeviceLocks {
    devices: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
    wait: Duration,
}

/// Held while a device is in use, released on drop
pub type DeviceGuard = OwnedMutexGuard<()>;

impl DeviceLocks {
    pub fn new(wait: Duration) -> Self {
        Self {
            devices: Mutex::new(HashMap::new()),
            wait,
        }
    }

    fn lock_for(&self, device: &str) -> Arc<AsyncMutex<()>> {
        let mut devices = self
            .devices
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        devices
            .entry(device.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Claim a device, waiting at most the configured time
    pub async fn acquire(&self, device: &str) -> Result<DeviceGuard, ExecutionError> {
        let lock = self.lock_for(device);

        let guard = if self.wait.is_zero() {
            lock.try_lock_owned().ok()
        } else {
            timeout(self.wait, lock.lock_owned()).await.ok()
        };

        match guard {
            Some(guard) => {
                debug!("Acquired device lock for {:?}", device);
                Ok(guard)
            }
            None => {
                warn!("Device {:?} is busy, rejecting scan", device);
                Err(ExecutionError::new(format!("device `{}` is busy", display_name(device))))
            }
        }
    }
}

fn display_name(device: &str) -> &str {
    if device.is_empty() {
        "default"
    } else {
        device
    }
}
