use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::health::health))
        .nest("/contents", content_routes())
        .nest("/publications", publication_routes())
}

fn content_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::content::list_contents))
        .routes(routes!(
            handlers::content::get_content,
            handlers::content::register_content,
            handlers::content::ingest_content
        ))
}

fn publication_routes() -> OpenApiRouter<AppState> {
    let crud = OpenApiRouter::new()
        .routes(routes!(
            handlers::publication::list_publications,
            handlers::publication::create_publication
        ))
        .routes(routes!(handlers::publication::check_by_title))
        .routes(routes!(
            handlers::publication::get_publication,
            handlers::publication::update_publication,
            handlers::publication::delete_publication
        ));

    let upload = OpenApiRouter::new()
        .routes(routes!(handlers::publication::upload_publication_file))
        .layer(handlers::publication::upload_body_limit());

    crud.merge(upload)
}
