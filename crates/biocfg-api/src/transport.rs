// Shared bus configuration and connection setup.
//
// The biometric service and systemd clients share one system-bus
// connection. The bus daemon outlives service restarts, so the same
// connection stays valid while the service is killed and re-registered.

use tracing::debug;
use zbus::Connection;

use crate::error::Error;

/// Well-known name of the biometric-authentication service.
pub const BIOMETRIC_BUS_NAME: &str = "cn.kylinos.Biometric";
/// Object path exported by the service.
pub const BIOMETRIC_OBJECT_PATH: &str = "/cn/kylinos/Biometric";
/// Interface implemented at [`BIOMETRIC_OBJECT_PATH`].
pub const BIOMETRIC_INTERFACE: &str = "cn.kylinos.Biometric";
/// systemd unit that runs the service.
pub const BIOMETRIC_UNIT: &str = "biometric-authentication.service";

/// Where the biometric service lives on the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEndpoint {
    pub bus_name: String,
    pub object_path: String,
    pub interface: String,
}

impl Default for ServiceEndpoint {
    fn default() -> Self {
        Self {
            bus_name: BIOMETRIC_BUS_NAME.into(),
            object_path: BIOMETRIC_OBJECT_PATH.into(),
            interface: BIOMETRIC_INTERFACE.into(),
        }
    }
}

/// Open a connection to the system bus.
///
/// zbus applies no method-call timeout unless one is configured, so
/// every call made over this connection waits for its reply for as long
/// as the service needs (slow service startup must not yield partial
/// results).
pub async fn system_bus() -> Result<Connection, Error> {
    let connection = Connection::system().await.map_err(Error::BusConnect)?;
    debug!(unique_name = ?connection.unique_name(), "connected to system bus");
    Ok(connection)
}
