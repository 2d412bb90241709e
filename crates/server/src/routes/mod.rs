//! HTTP route definitions.

pub mod customers;
pub mod proxy;
pub mod sync;

use axum::Router;
use axum::routing::{get, post};

use crate::middleware::verify_app_proxy;
use crate::state::AppState;

/// Build the application router.
///
/// The state handle is needed up front so the App Proxy verification
/// middleware can read the signing secret.
pub fn routes(state: &AppState) -> Router<AppState> {
    let proxied = Router::new()
        .route("/apps/proxy/discount", get(proxy::discount))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            verify_app_proxy,
        ));

    Router::new()
        .route(
            "/customers",
            get(customers::list).post(customers::create),
        )
        .route(
            "/customers/{id}",
            get(customers::show).post(customers::update),
        )
        .route("/customers/{id}/delete", post(customers::delete))
        .route("/customers/{id}/discount", post(customers::set_discount))
        .route("/customers/{id}/details", post(customers::create_detail))
        .route("/details/{id}", post(customers::update_detail))
        .route("/details/{id}/delete", post(customers::delete_detail))
        .route("/sync/customers", post(sync::customers))
        .merge(proxied)
}
