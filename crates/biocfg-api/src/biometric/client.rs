// Biometric service D-Bus client
//
// Thin wrapper over the system-bus connection that knows the service's
// well-known name, object path, and interface. Every method is a single
// round trip; no retries happen here (the caller owns retry policy).

use tracing::{debug, trace};
use zbus::Connection;
use zbus::fdo::DBusProxy;
use zvariant::{OwnedValue, Structure};

use super::models::{DriverList, StatusReply};
use crate::error::Error;
use crate::transport::ServiceEndpoint;

/// Raw client for the `cn.kylinos.Biometric` service.
#[derive(Debug, Clone)]
pub struct BiometricClient {
    connection: Connection,
    endpoint: ServiceEndpoint,
}

impl BiometricClient {
    /// Build a client over an existing connection.
    pub fn with_connection(connection: Connection, endpoint: ServiceEndpoint) -> Self {
        Self {
            connection,
            endpoint,
        }
    }

    /// Whether the service's well-known name currently has an owner.
    pub async fn service_exists(&self) -> Result<bool, Error> {
        let proxy = DBusProxy::new(&self.connection)
            .await
            .map_err(|e| Error::from_call("ListNames", e))?;
        let names = proxy
            .list_names()
            .await
            .map_err(|e| Error::from_call("ListNames", zbus::Error::from(e)))?;
        let found = names
            .iter()
            .any(|name| name.as_str() == self.endpoint.bus_name);
        debug!(bus_name = %self.endpoint.bus_name, found, "checked service presence");
        Ok(found)
    }

    /// `CheckAppApiVersion(major, minor, func) → i`. Zero means compatible.
    pub async fn check_app_api_version(
        &self,
        major: i32,
        minor: i32,
        func: i32,
    ) -> Result<i32, Error> {
        let reply = self
            .call("CheckAppApiVersion", &(major, minor, func))
            .await?;
        let result: i32 = reply
            .body()
            .deserialize()
            .map_err(|e| decode_error("CheckAppApiVersion", &e))?;
        debug!(major, minor, func, result, "API version check");
        Ok(result)
    }

    /// `GetDrvList() → (i, av)`.
    pub async fn get_drv_list(&self) -> Result<DriverList, Error> {
        let reply = self.call("GetDrvList", &()).await?;
        let (count, entries): (i32, Vec<OwnedValue>) = reply
            .body()
            .deserialize()
            .map_err(|e| decode_error("GetDrvList", &e))?;
        let list = DriverList::from_parts(count, &entries)?;
        trace!(count, decoded = list.devices.len(), "GetDrvList reply");
        Ok(list)
    }

    /// `UpdateStatus(drvid)`.
    ///
    /// Error replies and short bodies both come back as
    /// [`StatusReply::Incomplete`]: right after a restart the service may
    /// answer before it is fully wired up, and the caller retries either way.
    pub async fn update_status(&self, device_id: i32) -> Result<StatusReply, Error> {
        let reply = match self.call("UpdateStatus", &(device_id,)).await {
            Ok(reply) => reply,
            Err(e) if e.is_method_error() => {
                debug!(device_id, error = %e, "UpdateStatus error reply");
                return Ok(StatusReply::Incomplete { fields: 0 });
            }
            Err(e) => return Err(e),
        };

        let body = reply.body();
        let Ok(structure) = body.deserialize::<Structure<'_>>() else {
            return Ok(StatusReply::Incomplete { fields: 0 });
        };
        StatusReply::from_fields(structure.fields())
    }

    /// `GetFeatureList(drvid, uid, idx_start, idx_end) → (i, av)`; returns the count.
    pub async fn feature_count(&self, device_id: i32, uid: i32) -> Result<i32, Error> {
        let reply = self
            .call("GetFeatureList", &(device_id, uid, 0i32, -1i32))
            .await?;
        let (count, _features): (i32, Vec<OwnedValue>) = reply
            .body()
            .deserialize()
            .map_err(|e| decode_error("GetFeatureList", &e))?;
        trace!(device_id, uid, count, "GetFeatureList reply");
        Ok(count)
    }

    // ── Private helpers ──────────────────────────────────────────────

    async fn call<B>(&self, method: &'static str, body: &B) -> Result<zbus::Message, Error>
    where
        B: serde::Serialize + zvariant::DynamicType,
    {
        trace!(method, "calling biometric service");
        self.connection
            .call_method(
                Some(self.endpoint.bus_name.as_str()),
                self.endpoint.object_path.as_str(),
                Some(self.endpoint.interface.as_str()),
                method,
                body,
            )
            .await
            .map_err(|e| Error::from_call(method, e))
    }
}

fn decode_error(method: &'static str, err: &zbus::Error) -> Error {
    Error::Decode {
        method,
        message: err.to_string(),
    }
}
