use serde_json::{json, Value};

use crate::render::TemplateResponse;

pub async fn author() -> TemplateResponse<Value> {
    TemplateResponse::new("about_author.html", json!({}))
}

pub async fn tech() -> TemplateResponse<Value> {
    TemplateResponse::new("about_tech.html", json!({}))
}
