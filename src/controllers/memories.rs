//! Memory endpoints: listing, text and image-reference submission, and
//! binary uploads.

use std::path::Path;

use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Responder};
use futures_util::TryStreamExt;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::models::{Memory, MemoryKind};
use crate::AppState;

#[derive(Debug, Deserialize)]
struct AddTextRequest {
    content: String,
}

#[derive(Debug, Deserialize)]
struct AddImageRequest {
    url: String,
}

#[derive(Debug, Serialize)]
struct MemoriesResponse {
    memories: Vec<Memory>,
}

#[derive(Debug, Serialize)]
struct AddedResponse {
    status: &'static str,
    id: i64,
}

#[derive(Debug, Serialize)]
struct UploadedResponse {
    status: &'static str,
    id: i64,
    url: String,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/memories").route(web::get().to(list_memories)))
        .service(web::resource("/api/add-text").route(web::post().to(add_text)))
        .service(web::resource("/api/add-image").route(web::post().to(add_image)))
        .service(web::resource("/api/upload-image").route(web::post().to(upload_image)))
        .service(web::resource("/api/upload-audio").route(web::post().to(upload_audio)));
}

/// The 50 most recent memories, newest first.
async fn list_memories(data: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(MemoriesResponse {
        memories: data.store.list_recent(),
    })
}

async fn add_text(data: web::Data<AppState>, body: web::Json<AddTextRequest>) -> impl Responder {
    match data.store.add_text(&body.content) {
        Ok(id) => HttpResponse::Ok().json(AddedResponse { status: "ok", id }),
        Err(e) => {
            log::error!("Failed to save text memory: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to save memory"
            }))
        }
    }
}

/// Record an image hosted elsewhere (or already uploaded) by URL. The URL
/// is stored as given, with no existence check.
async fn add_image(data: web::Data<AppState>, body: web::Json<AddImageRequest>) -> impl Responder {
    match data.store.add_media(MemoryKind::Image, &body.url) {
        Ok(id) => HttpResponse::Ok().json(AddedResponse { status: "ok", id }),
        Err(e) => {
            log::error!("Failed to save image memory: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to save memory"
            }))
        }
    }
}

async fn upload_image(data: web::Data<AppState>, payload: Multipart) -> impl Responder {
    receive_upload(data, payload, MemoryKind::Image).await
}

async fn upload_audio(data: web::Data<AppState>, payload: Multipart) -> impl Responder {
    receive_upload(data, payload, MemoryKind::Audio).await
}

/// Write the uploaded file under the uploads root, then record a memory
/// pointing at its serving URL. The client-supplied filename is used as-is;
/// a repeated filename overwrites the previous upload.
async fn receive_upload(
    data: web::Data<AppState>,
    payload: Multipart,
    kind: MemoryKind,
) -> HttpResponse {
    let Some(subdir) = kind.upload_subdir() else {
        return HttpResponse::InternalServerError().json(serde_json::json!({
            "error": "Unsupported upload kind"
        }));
    };

    let dir = data.config.upload_dir(subdir);
    let filename = match save_upload(payload, &dir).await {
        Ok(Some(filename)) => filename,
        Ok(None) => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "error": "No file field in upload"
            }));
        }
        Err(resp) => return resp,
    };

    let url = format!("/uploads/{}/{}", subdir, filename);
    match data.store.add_media(kind, &url) {
        Ok(id) => HttpResponse::Ok().json(UploadedResponse {
            status: "ok",
            id,
            url,
        }),
        Err(e) => {
            log::error!("Failed to save {} memory: {}", kind, e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to save memory"
            }))
        }
    }
}

/// Stream the first file-carrying multipart field into `dir`, returning the
/// stored filename. `Ok(None)` means no field carried a filename.
async fn save_upload(mut payload: Multipart, dir: &Path) -> Result<Option<String>, HttpResponse> {
    loop {
        let mut field = match payload.try_next().await {
            Ok(Some(field)) => field,
            Ok(None) => return Ok(None),
            Err(e) => {
                log::error!("Malformed multipart payload: {}", e);
                return Err(bad_payload());
            }
        };

        let filename = field
            .content_disposition()
            .get_filename()
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        let Some(filename) = filename else {
            // Drain non-file fields (stray form values) before moving on.
            while let Ok(Some(_)) = field.try_next().await {}
            continue;
        };

        let path = dir.join(&filename);
        let mut file = match fs::File::create(&path).await {
            Ok(file) => file,
            Err(e) => {
                log::error!("Failed to create {}: {}", path.display(), e);
                return Err(storage_error());
            }
        };

        loop {
            match field.try_next().await {
                Ok(Some(chunk)) => {
                    if let Err(e) = file.write_all(&chunk).await {
                        log::error!("Failed to write {}: {}", path.display(), e);
                        return Err(storage_error());
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    log::error!("Failed to read upload body: {}", e);
                    return Err(bad_payload());
                }
            }
        }

        return Ok(Some(filename));
    }
}

fn bad_payload() -> HttpResponse {
    HttpResponse::BadRequest().json(serde_json::json!({
        "error": "Malformed multipart payload"
    }))
}

fn storage_error() -> HttpResponse {
    HttpResponse::InternalServerError().json(serde_json::json!({
        "error": "Failed to store upload"
    }))
}
