// PostForm - text, optional group, optional image

use axum::{
    extract::{multipart::MultipartError, FromRequest, Multipart, Request},
    http::{header::CONTENT_TYPE, StatusCode},
    Form,
};
use serde::{Deserialize, Serialize};
use tracing::warn;
use validator::Validate;

use super::FormErrors;
use crate::entities::{EntGroup, EntPost, Entity};
use crate::error::{AppError, AppResult};
use crate::infrastructure::database::BlogDatabase;
use crate::infrastructure::media::{ImageKind, ImageUpload};

pub const INVALID_GROUP: &str = "Select a valid choice. That choice is not one of the available choices.";
pub const EMPTY_FILE: &str = "The submitted file is empty.";
pub const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";
pub const UPLOAD_TOO_LARGE: &str = "The uploaded file is too large.";
pub const BROKEN_UPLOAD: &str = "The submitted data was not a file. Check the encoding type on the form.";

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PostForm {
    #[validate(length(min = 1, message = "This field is required."))]
    pub text: String,
    /// Raw selector value: a group id, or empty for none.
    pub group: Option<String>,
    #[serde(rename = "image-clear")]
    pub image_clear: Option<String>,
    #[serde(skip)]
    pub image: Option<ImageUpload>,
    /// Set when the multipart body could not be read to the end.
    #[serde(skip)]
    pub upload_error: Option<String>,
}

/// A post submission that passed validation.
#[derive(Debug, Clone)]
pub struct CleanedPost {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<(ImageUpload, ImageKind)>,
    pub clear_image: bool,
}

impl PostForm {
    /// Pre-filled form for editing an existing post.
    pub fn from_post(post: &EntPost) -> Self {
        PostForm {
            text: post.text.clone(),
            group: post.group_id.map(|id| id.to_string()),
            image_clear: None,
            image: None,
            upload_error: None,
        }
    }

    fn normalized(&self) -> Self {
        let mut form = self.clone();
        form.text = form.text.trim().to_string();
        form.group = form
            .group
            .map(|group| group.trim().to_string())
            .filter(|group| !group.is_empty());
        form
    }

    fn wants_clear(&self) -> bool {
        matches!(
            self.image_clear.as_deref().map(str::trim),
            Some("on") | Some("true") | Some("1")
        )
    }

    /// Validates every field. Database faults are `Err`; invalid input is
    /// `Ok(Err(errors))`.
    pub async fn clean(&self, db: &BlogDatabase) -> AppResult<Result<CleanedPost, FormErrors>> {
        let form = self.normalized();
        let mut errors = match form.validate() {
            Ok(()) => FormErrors::new(),
            Err(validation) => FormErrors::from(validation),
        };

        let mut group_id = None;
        if let Some(raw) = &form.group {
            let group = match raw.parse::<i64>() {
                Ok(id) => EntGroup::gen_nullable(db, id).await?,
                Err(_) => None,
            };
            match group {
                Some(group) => group_id = Some(group.id),
                None => errors.add("group", INVALID_GROUP),
            }
        }

        if let Some(message) = &form.upload_error {
            errors.add("image", message.clone());
        }

        let mut image = None;
        if let Some(upload) = &form.image {
            if upload.data.is_empty() {
                errors.add("image", EMPTY_FILE);
            } else {
                match ImageKind::detect(&upload.data) {
                    Some(kind) => image = Some((upload.clone(), kind)),
                    None => errors.add("image", INVALID_IMAGE),
                }
            }
        }

        if let Err(errors) = errors.into_result() {
            return Ok(Err(errors));
        }
        let clear_image = form.wants_clear();
        Ok(Ok(CleanedPost {
            text: form.text,
            group_id,
            image,
            clear_image,
        }))
    }
}

/// Accepts `multipart/form-data` (needed for the image) or a plain urlencoded form.
impl<S> FromRequest<S> for PostForm
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.starts_with("multipart/form-data"))
            .unwrap_or(false);

        if !is_multipart {
            let Form(form) = Form::<PostForm>::from_request(req, state)
                .await
                .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
            return Ok(form);
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
        let mut form = PostForm::default();
        if let Err(e) = read_multipart(&mut multipart, &mut form).await {
            warn!("Unreadable post upload: {}", e);
            form.upload_error = Some(upload_error_message(&e).to_string());
        }
        Ok(form)
    }
}

async fn read_multipart(multipart: &mut Multipart, form: &mut PostForm) -> Result<(), MultipartError> {
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "text" => form.text = field.text().await?,
            "group" => form.group = Some(field.text().await?),
            "image-clear" => form.image_clear = Some(field.text().await?),
            "image" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await?;
                // Browsers send an unnamed empty part when no file was picked.
                if !filename.is_empty() {
                    form.image = Some(ImageUpload {
                        filename,
                        data: data.to_vec(),
                    });
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn upload_error_message(err: &MultipartError) -> &'static str {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        UPLOAD_TOO_LARGE
    } else {
        BROKEN_UPLOAD
    }
}
