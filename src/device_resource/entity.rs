//! Read-only device information (`/oic/d`).

use super::error::DeviceError;
use crate::framework::ResourceEntity;
use crate::model::{AttributeError, Representation};
use async_trait::async_trait;

pub const NAME: &str = "n";
pub const DEVICE_ID: &str = "di";
pub const SPEC_VERSION: &str = "icv";
pub const DATA_MODEL_VERSION: &str = "dmv";

#[derive(Debug, Clone, PartialEq)]
pub struct DeviceInfo {
    uri: String,
    pub name: String,
    pub device_id: String,
    pub spec_version: String,
    pub data_model_version: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeviceCreate {
    pub name: String,
    pub device_id: String,
}

impl DeviceCreate {
    pub fn new(name: impl Into<String>, device_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            device_id: device_id.into(),
        }
    }
}

#[async_trait]
impl ResourceEntity for DeviceInfo {
    type Create = DeviceCreate;
    type Error = DeviceError;
    const RESOURCE_TYPE: &'static str = "oic.wk.d";
    const INTERFACE: &'static str = "oic.if.r";

    fn from_create_params(uri: &str, params: DeviceCreate) -> Result<Self, Self::Error> {
        if params.device_id.is_empty() {
            return Err(DeviceError::MissingDeviceId);
        }
        Ok(Self {
            uri: uri.to_string(),
            name: params.name,
            device_id: params.device_id,
            spec_version: "core.1.1.0".to_string(),
            data_model_version: "res.1.1.0".to_string(),
        })
    }

    fn representation(&self) -> Representation {
        Representation::new()
            .with(NAME, self.name.as_str())
            .with(DEVICE_ID, self.device_id.as_str())
            .with(SPEC_VERSION, self.spec_version.as_str())
            .with(DATA_MODEL_VERSION, self.data_model_version.as_str())
    }

    async fn on_put(&mut self, _representation: &Representation) -> Result<(), Self::Error> {
        Err(AttributeError::ReadOnly(self.uri.clone()).into())
    }
}
