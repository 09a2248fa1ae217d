pub mod admin;
pub mod auth;
pub mod channels;
pub mod dms;
pub mod error;
pub mod messages;
pub mod middleware;
pub mod scheduler;
pub mod standup;
pub mod state;
pub mod users;

use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, get, post, put},
};

use crate::middleware::require_session;
use crate::state::AppState;

/// Every HTTP route. Cross-cutting layers (CORS, tracing) are added by the
/// server binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register/v3", post(auth::register))
        .route("/auth/login/v3", post(auth::login))
        .route("/auth/passwordreset/request/v1", post(auth::password_reset_request))
        .route("/auth/passwordreset/reset/v1", post(auth::password_reset))
        .route("/clear/v1", delete(admin::clear))
        .route("/health", get(admin::health))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/auth/logout/v2", post(auth::logout))
        // channels
        .route("/channels/create/v3", post(channels::create))
        .route("/channels/list/v3", get(channels::list))
        .route("/channels/listall/v3", get(channels::listall))
        .route("/channel/details/v3", get(channels::details))
        .route("/channel/join/v3", post(channels::join))
        .route("/channel/invite/v3", post(channels::invite))
        .route("/channel/leave/v2", post(channels::leave))
        .route("/channel/messages/v3", get(channels::messages))
        .route("/channel/addowner/v2", post(channels::add_owner))
        .route("/channel/removeowner/v2", post(channels::remove_owner))
        // dms
        .route("/dm/create/v2", post(dms::create))
        .route("/dm/list/v2", get(dms::list))
        .route("/dm/details/v2", get(dms::details))
        .route("/dm/remove/v2", delete(dms::remove))
        .route("/dm/leave/v2", post(dms::leave))
        .route("/dm/messages/v2", get(dms::messages))
        // messages
        .route("/message/send/v2", post(messages::send))
        .route("/message/senddm/v2", post(messages::send_dm))
        .route("/message/edit/v2", put(messages::edit))
        .route("/message/remove/v2", delete(messages::remove))
        .route("/message/share/v1", post(messages::share))
        .route("/message/react/v1", post(messages::react))
        .route("/message/unreact/v1", post(messages::unreact))
        .route("/message/pin/v1", post(messages::pin))
        .route("/message/unpin/v1", post(messages::unpin))
        .route("/message/sendlater/v1", post(messages::send_later))
        .route("/message/sendlaterdm/v1", post(messages::send_later_dm))
        // standups
        .route("/standup/start/v1", post(standup::start))
        .route("/standup/active/v1", get(standup::active))
        .route("/standup/send/v1", post(standup::send))
        // users
        .route("/notifications/get/v1", get(users::notifications))
        .route("/search/v1", get(users::search))
        .route("/user/profile/v3", get(users::profile))
        .route("/user/profile/sethandle/v2", put(users::set_handle))
        .route("/user/profile/setname/v2", put(users::set_name))
        .route("/user/profile/setemail/v2", put(users::set_email))
        .route("/users/all/v2", get(users::all))
        .route("/user/stats/v1", get(users::user_stats))
        .route("/users/stats/v1", get(users::workspace_stats))
        // admin
        .route("/admin/userpermission/change/v1", post(admin::permission_change))
        .route("/admin/user/remove/v1", delete(admin::user_remove))
        .layer(axum_middleware::from_fn_with_state(state.clone(), require_session))
        .with_state(state);

    Router::new().merge(public_routes).merge(protected_routes)
}
