use std::collections::BTreeMap;

use cloudcafe_clients::{ApiResponse, ObjectStorageClient};
use cloudcafe_config::ObjectStorageConfig;
use cloudcafe_types::datagen::rand_name;
use cloudcafe_types::object_storage::ObjectInfo;

use crate::BehaviorError;
use crate::poll::{self, Check, PollConfig};

/// Objects fetched per listing page while emptying a container.
const PAGE_SIZE: &str = "1000";

#[derive(Debug, Clone)]
pub struct ObjectStorageBehaviors {
    client: ObjectStorageClient,
    config: ObjectStorageConfig,
}

impl ObjectStorageBehaviors {
    #[must_use]
    pub fn new(client: ObjectStorageClient, config: ObjectStorageConfig) -> Self {
        Self { client, config }
    }

    #[must_use]
    pub fn client(&self) -> &ObjectStorageClient {
        &self.client
    }

    #[must_use]
    pub fn config(&self) -> &ObjectStorageConfig {
        &self.config
    }

    /// Create a container and upload `objects` into it with the configured
    /// default content type. Returns the container name.
    pub async fn create_container_with_objects(
        &self,
        container: Option<&str>,
        objects: &[(&str, &[u8])],
    ) -> Result<String, BehaviorError> {
        let container = container.map_or_else(|| rand_name("container"), str::to_string);
        self.client
            .create_container(&container, &BTreeMap::new())
            .await?;
        for (name, data) in objects {
            self.client
                .put_object(
                    &container,
                    name,
                    data.to_vec(),
                    Some(self.config.default_content_type.as_str()),
                    &BTreeMap::new(),
                )
                .await?;
        }
        tracing::info!(container = %container, objects = objects.len(), "Created container");
        Ok(container)
    }

    /// Poll the container listing until it shows `expected` objects.
    ///
    /// Listings are eventually consistent, so a 404 for a container that was
    /// just created is polled through rather than returned.
    pub async fn wait_for_object_count(
        &self,
        container: &str,
        expected: usize,
    ) -> Result<Vec<ObjectInfo>, BehaviorError> {
        let client = &self.client;
        poll::poll_until(
            move || async move {
                client
                    .list_objects(container, &[])
                    .await
                    .map(ApiResponse::into_entity)
            },
            |objects: &Vec<ObjectInfo>| {
                if objects.len() == expected {
                    Check::Done
                } else {
                    Check::Pending
                }
            },
            PollConfig::from_secs(self.config.listing_timeout, self.config.listing_poll_interval)
                .tolerating_fetch_errors(),
        )
        .await
        .map_err(|source| {
            BehaviorError::wait(
                format!("container {container} to list {expected} objects"),
                source,
            )
        })
    }

    /// Delete every object in `container`, then the container itself.
    ///
    /// Objects or a container that are already gone count as deleted.
    /// Returns the number of objects removed.
    pub async fn delete_container_recursive(
        &self,
        container: &str,
    ) -> Result<usize, BehaviorError> {
        let mut deleted = 0;
        let mut marker: Option<String> = None;
        loop {
            let mut query = vec![("limit", PAGE_SIZE)];
            if let Some(marker) = marker.as_deref() {
                query.push(("marker", marker));
            }
            let page = match self.client.list_objects(container, &query).await {
                Ok(response) => response.into_entity(),
                Err(err) if err.is_not_found() => return Ok(deleted),
                Err(err) => return Err(err.into()),
            };
            let Some(last) = page.last() else {
                break;
            };
            let next_marker = last.name.clone();
            for object in &page {
                match self.client.delete_object(container, &object.name).await {
                    Ok(_) => deleted += 1,
                    Err(err) if err.is_not_found() => {}
                    Err(err) => return Err(err.into()),
                }
            }
            marker = Some(next_marker);
        }

        match self.client.delete_container(container).await {
            Ok(_) => {}
            Err(err) if err.is_not_found() => {}
            Err(err) => return Err(err.into()),
        }
        tracing::info!(container, deleted, "Deleted container");
        Ok(deleted)
    }
}
