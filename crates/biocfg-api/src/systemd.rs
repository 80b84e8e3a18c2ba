// systemd manager client
//
// Only the one call the panel needs: restarting the service unit.

use tracing::{debug, info};
use zbus::Connection;
use zvariant::OwnedObjectPath;

use crate::error::Error;

const SYSTEMD_BUS_NAME: &str = "org.freedesktop.systemd1";
const SYSTEMD_OBJECT_PATH: &str = "/org/freedesktop/systemd1";
const SYSTEMD_MANAGER_INTERFACE: &str = "org.freedesktop.systemd1.Manager";

/// Raw client for `org.freedesktop.systemd1.Manager`.
#[derive(Debug, Clone)]
pub struct SystemdClient {
    connection: Connection,
}

impl SystemdClient {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }

    /// `RestartUnit(unit, "replace") → o`. Returns the queued job path.
    ///
    /// The reply only confirms the job was queued; the unit may still be
    /// starting when this returns.
    pub async fn restart_unit(&self, unit: &str) -> Result<OwnedObjectPath, Error> {
        debug!(unit, "requesting unit restart");
        let reply = self
            .connection
            .call_method(
                Some(SYSTEMD_BUS_NAME),
                SYSTEMD_OBJECT_PATH,
                Some(SYSTEMD_MANAGER_INTERFACE),
                "RestartUnit",
                &(unit, "replace"),
            )
            .await
            .map_err(|e| Error::from_call("RestartUnit", e))?;

        let job: OwnedObjectPath = reply.body().deserialize().map_err(|e| Error::Decode {
            method: "RestartUnit",
            message: e.to_string(),
        })?;
        info!(unit, job = %job.as_str(), "unit restart queued");
        Ok(job)
    }
}
