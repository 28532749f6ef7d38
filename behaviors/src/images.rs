use cloudcafe_clients::{ApiResponse, ImagesClient};
use cloudcafe_config::ImagesConfig;
use cloudcafe_types::datagen::rand_name;
use cloudcafe_types::images::{Image, ImageCreate, Task, TaskCreate};
use cloudcafe_types::{ImageStatus, TaskStatus};

use crate::BehaviorError;
use crate::poll::{self, PollConfig, StatusExpectation};

const SECTION: &str = "images";

#[derive(Debug, Clone)]
pub struct ImagesBehaviors {
    client: ImagesClient,
    config: ImagesConfig,
}

impl ImagesBehaviors {
    #[must_use]
    pub fn new(client: ImagesClient, config: ImagesConfig) -> Self {
        Self { client, config }
    }

    #[must_use]
    pub fn client(&self) -> &ImagesClient {
        &self.client
    }

    #[must_use]
    pub fn config(&self) -> &ImagesConfig {
        &self.config
    }

    pub async fn wait_for_image_status(
        &self,
        image_id: &str,
        expected: ImageStatus,
    ) -> Result<Image, BehaviorError> {
        let client = &self.client;
        let expectation = StatusExpectation::new(expected);
        poll::wait_for_status(
            move || async move {
                client
                    .get_image(image_id)
                    .await
                    .map(ApiResponse::into_entity)
            },
            |image: &Image| image.status.clone(),
            &expectation,
            PollConfig::from_secs(
                self.config.image_status_timeout,
                self.config.status_poll_interval,
            ),
        )
        .await
        .map_err(|source| {
            BehaviorError::wait(
                format!("image {image_id} to become {}", expectation.target),
                source,
            )
        })
    }

    pub async fn wait_for_task_status(
        &self,
        task_id: &str,
        expected: TaskStatus,
    ) -> Result<Task, BehaviorError> {
        let client = &self.client;
        let expectation = StatusExpectation::new(expected);
        poll::wait_for_status(
            move || async move { client.get_task(task_id).await.map(ApiResponse::into_entity) },
            |task: &Task| task.status.clone(),
            &expectation,
            PollConfig::from_secs(
                self.config.task_status_timeout,
                self.config.status_poll_interval,
            ),
        )
        .await
        .map_err(|source| {
            BehaviorError::wait(
                format!("task {task_id} to become {}", expectation.target),
                source,
            )
        })
    }

    /// Run an import task from `import_from` and return the new image id.
    ///
    /// `import_from` falls back to the `[images]` section. A task that
    /// fails reports its `message` in the error.
    pub async fn create_image_via_task(
        &self,
        import_from: Option<&str>,
    ) -> Result<String, BehaviorError> {
        let import_from = import_from
            .map(str::to_string)
            .or_else(|| self.config.import_from.clone())
            .ok_or(BehaviorError::MissingConfig {
                section: SECTION,
                key: "import_from",
            })?;
        let request = TaskCreate::import(
            import_from,
            &self.config.import_from_format,
            &self.config.container_format,
            &self.config.disk_format,
        );
        let task = self.client.create_task(&request).await?.into_entity();
        tracing::info!(task_id = %task.id, "Created import task");

        let task = match self.wait_for_task_status(&task.id, TaskStatus::Success).await {
            Ok(task) => task,
            Err(BehaviorError::Wait { what, source }) => {
                let message = self
                    .client
                    .get_task(&task.id)
                    .await
                    .ok()
                    .and_then(|response| response.into_entity().message);
                return Err(match message {
                    Some(message) => BehaviorError::Unexpected(format!(
                        "import task {} did not succeed: {message}",
                        task.id
                    )),
                    None => BehaviorError::Wait { what, source },
                });
            }
            Err(err) => return Err(err),
        };

        task.image_id().map(str::to_string).ok_or_else(|| {
            BehaviorError::Unexpected(format!(
                "import task {} has no image_id in its result",
                task.id
            ))
        })
    }

    /// Register an image, upload `data` and wait for `active`.
    pub async fn create_new_image(
        &self,
        name: Option<&str>,
        data: impl Into<Vec<u8>>,
    ) -> Result<Image, BehaviorError> {
        let name = name.map_or_else(|| rand_name("image"), str::to_string);
        let request = ImageCreate::new(
            name,
            &self.config.container_format,
            &self.config.disk_format,
        );
        let image = self.client.create_image(&request).await?.into_entity();
        tracing::info!(image_id = %image.id, "Created image record");

        self.client.upload_file(&image.id, data).await?;
        self.wait_for_image_status(&image.id, ImageStatus::Active)
            .await
    }
}
