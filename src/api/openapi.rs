use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::account::{store::PublicProfile, IdentitySummary, LoginGrant};
use crate::api::handlers::{
    health::Health,
    users::{EditDetailsRequest, LoginRequest, RegisterRequest},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::handlers::health::health,
        crate::api::handlers::users::register,
        crate::api::handlers::users::login,
        crate::api::handlers::users::profile,
        crate::api::handlers::users::edit_details,
        crate::api::handlers::users::change_avatar,
        crate::api::handlers::users::authors,
    ),
    components(schemas(
        Health,
        RegisterRequest,
        LoginRequest,
        EditDetailsRequest,
        IdentitySummary,
        LoginGrant,
        PublicProfile,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "users", description = "Account registration, sessions and profiles"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_token",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
