use serde::{Deserialize, Serialize};
use validator::Validate;

use super::FormErrors;

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct CommentForm {
    #[validate(length(min = 1, message = "This field is required."))]
    pub text: String,
}

impl CommentForm {
    /// The trimmed comment text, or the field errors.
    pub fn clean(&self) -> Result<String, FormErrors> {
        let form = CommentForm {
            text: self.text.trim().to_string(),
        };
        form.validate().map_err(FormErrors::from)?;
        Ok(form.text)
    }
}
