use std::path::Path;

use actix_files::NamedFile;
use actix_web::{web, HttpRequest, HttpResponse};

use crate::AppState;

const MISSING_INDEX_BODY: &str = "<h1>Put your index.html inside /static/index.html</h1>";

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(home)));
}

/// Serve the front-end entry page from the static directory.
async fn home(data: web::Data<AppState>, req: HttpRequest) -> actix_web::Result<HttpResponse> {
    let index_path = Path::new(&data.config.static_dir).join("index.html");
    if !index_path.exists() {
        return Ok(HttpResponse::NotFound()
            .content_type("text/html; charset=utf-8")
            .body(MISSING_INDEX_BODY));
    }

    let file = NamedFile::open_async(&index_path).await?;
    Ok(file.into_response(&req))
}
