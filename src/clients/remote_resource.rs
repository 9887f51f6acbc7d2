//! # Remote Resource
//!
//! Client view of a discovered resource. Each call goes through the
//! [`RequestTransport`] and checks the result code the resource answered with.

use super::error::{ClientError, ClientResult};
use crate::model::{
    ClientRequest, EntityHandlerResult, EntityResponse, QueryParams, Representation,
};
use crate::platform::{ObserveSubscription, RequestTransport, ResourceDescriptor};
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct RemoteResource {
    descriptor: ResourceDescriptor,
    transport: Arc<dyn RequestTransport>,
}

impl RemoteResource {
    pub fn new(descriptor: ResourceDescriptor, transport: Arc<dyn RequestTransport>) -> Self {
        Self {
            descriptor,
            transport,
        }
    }

    pub fn uri(&self) -> &str {
        &self.descriptor.uri
    }

    pub fn resource_type(&self) -> &str {
        &self.descriptor.resource_type
    }

    pub fn descriptor(&self) -> &ResourceDescriptor {
        &self.descriptor
    }

    /// Sends `request` and accepts only the listed result codes.
    async fn send(
        &self,
        request: ClientRequest,
        accepted: &[EntityHandlerResult],
    ) -> ClientResult<EntityResponse> {
        let response = self.transport.request(self.uri(), request).await?;
        debug!(uri = self.uri(), result = %response.result, "Response received");
        if accepted.contains(&response.result) {
            Ok(response)
        } else {
            Err(ClientError::Rejected {
                uri: self.descriptor.uri.clone(),
                result: response.result,
            })
        }
    }

    #[tracing::instrument(skip(self), fields(uri = %self.descriptor.uri))]
    pub async fn get(&self) -> ClientResult<Representation> {
        let response = self
            .send(ClientRequest::get(), &[EntityHandlerResult::Ok])
            .await?;
        Ok(response.representation)
    }

    /// GET with an explicit interface (`if=`) query.
    pub async fn get_with_interface(&self, interface: &str) -> ClientResult<Representation> {
        let request = ClientRequest::get().with_query("if", interface);
        let response = self.send(request, &[EntityHandlerResult::Ok]).await?;
        Ok(response.representation)
    }

    #[tracing::instrument(skip(self, representation), fields(uri = %self.descriptor.uri))]
    pub async fn put(&self, representation: Representation) -> ClientResult<Representation> {
        let response = self
            .send(ClientRequest::put(representation), &[EntityHandlerResult::Ok])
            .await?;
        Ok(response.representation)
    }

    /// The full response is returned so callers can read `new_resource_uri`.
    #[tracing::instrument(skip(self, representation), fields(uri = %self.descriptor.uri))]
    pub async fn post(&self, representation: Representation) -> ClientResult<EntityResponse> {
        self.send(
            ClientRequest::post(representation),
            &[EntityHandlerResult::Ok, EntityHandlerResult::ResourceCreated],
        )
        .await
    }

    #[tracing::instrument(skip(self), fields(uri = %self.descriptor.uri))]
    pub async fn delete(&self) -> ClientResult<()> {
        self.send(
            ClientRequest::delete(),
            &[EntityHandlerResult::ResourceDeleted],
        )
        .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(uri = %self.descriptor.uri))]
    pub async fn observe(&self) -> ClientResult<ObserveSubscription> {
        Ok(self
            .transport
            .observe(self.uri(), QueryParams::default())
            .await?)
    }
}

impl std::fmt::Debug for RemoteResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteResource")
            .field("descriptor", &self.descriptor)
            .finish()
    }
}
