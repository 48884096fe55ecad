//! Route table and handlers for the page server.

use std::collections::HashMap;

use serde_json::json;

use crate::contact::{ConsultationRequest, FormState};
use crate::page::render_page;
use crate::route;
use crate::router::{AppState, Request, Response, Router, access_log, start_timer};
use crate::settings::Settings;

/// `GET /`: the page with an idle contact form.
pub async fn index(_request: Request, state: AppState) -> Response {
    render_page(&state.settings, &FormState::Idle)
}

/// `POST /`: the page with the submitted form acknowledged.
pub async fn submit(request: Request, state: AppState) -> Response {
    let form = FormState::submit(ConsultationRequest::from_form(&request.body));
    render_page(&state.settings, &form)
}

/// `GET /healthz`: liveness probe.
pub async fn health(_request: Request, state: AppState) -> Response {
    Response::json(
        json!({ "status": "ok", "revision": state.settings.revision.as_str() }),
        200,
        HashMap::new(),
    )
}

/// Build the router serving the page, with request timing and access logging.
pub fn build_router(settings: Settings) -> Router {
    let mut router = Router::new();
    router.set_app_state(AppState::new(settings));
    router.add_middleware(start_timer());
    router.add_post_middleware(access_log());

    route!(router,
        Get "/" => { index },
        Post "/" => { submit },
        Get "/healthz" => { health },
    );

    router
}
