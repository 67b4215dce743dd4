//! OpenAPI document for the auto-save API.

use utoipa::OpenApi;

use crate::routes::autosave::{AutoSaveEntry, OwnerDto, SaveDraftRequest};
use crate::routes::publish::PublishItem;

/// Aggregated API documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "pagekit auto-save API",
        description = "Draft storage and atomic publishing for the page builder."
    ),
    components(schemas(AutoSaveEntry, OwnerDto, SaveDraftRequest, PublishItem)),
    tags(
        (name = "auto-save", description = "Session-scoped draft storage"),
        (name = "publish", description = "Atomic publish of all session drafts"),
        (name = "content", description = "Published-object lifecycle hooks"),
    )
)]
pub struct ApiDoc;
