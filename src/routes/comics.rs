use rocket::form::{Form, FromForm};
use rocket::fs::TempFile;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;

use crate::models::comic::{ComicDetails, ComicPages, ComicSummary, SetThumbnailRequest};
use crate::services::comic_service::ComicService;
use crate::utils::response::{ApiError, Message};

#[derive(FromForm)]
pub struct ComicUpload<'r> {
    /// Optional at the form layer; a missing name must map to 400, not to a
    /// form-parse failure.
    pub name: Option<String>,
    pub images: Vec<TempFile<'r>>,
}

#[post("/uploadComic", data = "<upload>")]
pub async fn upload_comic(
    service: &State<ComicService>,
    upload: Form<ComicUpload<'_>>,
) -> Result<(Status, Json<Message>), ApiError> {
    let ComicUpload { name, images } = upload.into_inner();
    service
        .upload(name.as_deref().unwrap_or(""), images)
        .await
        .map_err(|e| ApiError::from(e, "Failed to upload comic"))?;
    Ok((Status::Created, Json(Message::new("Comic uploaded successfully"))))
}

#[get("/listComics")]
pub async fn list_comics(
    service: &State<ComicService>,
) -> Result<Json<Vec<ComicSummary>>, ApiError> {
    service
        .list_summaries()
        .await
        .map(Json)
        .map_err(|e| ApiError::from(e, "Failed to list comics"))
}

#[get("/getComic/<name>")]
pub async fn get_comic(
    service: &State<ComicService>,
    name: &str,
) -> Result<Json<ComicPages>, ApiError> {
    service
        .get_comic(name)
        .await
        .map(Json)
        .map_err(|e| ApiError::from(e, "Failed to get comic"))
}

#[get("/getComicDetails/<name>")]
pub async fn get_comic_details(
    service: &State<ComicService>,
    name: &str,
) -> Result<Json<ComicDetails>, ApiError> {
    service
        .get_details(name)
        .await
        .map(Json)
        .map_err(|e| ApiError::from(e, "Failed to get comic details"))
}

#[derive(serde::Serialize)]
pub struct ThumbnailUpdated {
    pub message: String,
    pub thumbnail: String,
}

#[post("/setThumbnailPage/<name>", data = "<body>")]
pub async fn set_thumbnail_page(
    service: &State<ComicService>,
    name: &str,
    body: Json<SetThumbnailRequest>,
) -> Result<Json<ThumbnailUpdated>, ApiError> {
    let thumbnail = service
        .set_thumbnail(name, body.page_index)
        .await
        .map_err(|e| ApiError::from(e, "Failed to update thumbnail"))?;
    Ok(Json(ThumbnailUpdated {
        message: "Thumbnail updated".to_string(),
        thumbnail,
    }))
}

#[delete("/deleteComic/<name>")]
pub async fn delete_comic(
    service: &State<ComicService>,
    name: &str,
) -> Result<Json<Message>, ApiError> {
    let deleted = service
        .delete_comic(name)
        .await
        .map_err(|e| ApiError::from(e, "Failed to delete comic"))?;
    Ok(Json(Message::new(format!("Comic {deleted} deleted"))))
}

#[options("/uploadComic")]
pub fn upload_options() -> Status {
    Status::NoContent
}

#[options("/setThumbnailPage/<_name>")]
pub fn thumbnail_options(_name: &str) -> Status {
    Status::NoContent
}

#[options("/deleteComic/<_name>")]
pub fn delete_options(_name: &str) -> Status {
    Status::NoContent
}
