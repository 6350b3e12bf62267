//! OpenAPI documentation for the relay, served at `/api-docs/openapi.json`.

use utoipa::OpenApi;

use crate::api;

/// Path under which the contact handler is documented.
const DOCUMENTED_CONTACT_PATH: &str = "/contact";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "formrelay",
        description = "Contact form relay: validates multipart submissions and forwards them to the site owner by mail."
    ),
    paths(api::handlers::contact::submit_contact),
    components(schemas(
        api::models::contact::RelayOutcome,
        api::models::contact::AttachmentsMeta,
        api::models::contact::AttachmentMeta
    )),
    tags(
        (name = "contact", description = "Contact form submission")
    )
)]
pub struct ApiDoc;

/// The API document with the contact operation under the configured path.
pub fn api_doc(contact_path: &str) -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    if contact_path != DOCUMENTED_CONTACT_PATH
        && let Some(item) = doc.paths.paths.remove(DOCUMENTED_CONTACT_PATH)
    {
        doc.paths.paths.insert(contact_path.to_string(), item);
    }
    doc
}
