//! Image upload service.

use crate::model::image::{Image, ImageId, NewImage};
use crate::model::user::UserId;
use crate::repo::image_repo::ImageRepository;
use crate::repo::{Page, RepoResult};
use log::info;

pub struct ImageService<R: ImageRepository> {
    repo: R,
}

impl<R: ImageRepository> ImageService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn create_image(
        &self,
        owner_id: UserId,
        mime_type: &str,
        payload: Vec<u8>,
    ) -> RepoResult<Image> {
        let image = self
            .repo
            .create_image(&NewImage::new(owner_id, mime_type, payload)?)?;
        info!(
            "event=image_create module=service status=ok image_id={} bytes={}",
            image.id, image.byte_size
        );
        Ok(image)
    }

    pub fn get_image(&self, id: ImageId) -> RepoResult<Option<Image>> {
        self.repo.get_image(id)
    }

    pub fn list_images_by_owner(&self, owner_id: UserId, page: Page) -> RepoResult<Vec<Image>> {
        self.repo.list_images_by_owner(owner_id, page)
    }

    /// Deletes an image; maps that used it keep existing without one.
    pub fn delete_image(&self, id: ImageId) -> RepoResult<Image> {
        self.repo.delete_image(id)
    }
}
