use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Recipe Service API",
        version = "1.0.0",
        description = "API documentation for the recipe sharing service. \n\n**Authentication:** Endpoints that create or modify data require JWT Bearer token authentication.\n\n**Features:**\n- Multi-provider authentication (Local, Google)\n- Recipe publishing, rating, and saving\n- Full-text recipe search with relevance ranking\n- Follows and activity feed\n- Personal recipe collections\n- Health monitoring and metrics",
        contact(
            name = "Recipe Service Team",
            email = "support@recipe-service.com"
        )
    ),
    paths(
        // Auth endpoints
        crate::api::auth::login,
        crate::api::auth::register,
        crate::api::auth::verify_token,
        crate::api::auth::get_me,

        // Health & Metrics
        crate::api::health::health_check,
        crate::api::health::database_health,
        crate::api::metrics::get_metrics,

        // Recipes
        crate::api::recipes::list_recipes,
        crate::api::recipes::get_recipe,
        crate::api::recipes::create_recipe,
        crate::api::recipes::rate_recipe,

        // Search
        crate::api::search::search_recipes,

        // Users
        crate::api::users::get_profile,
    ),
    components(
        schemas(
            // Auth
            crate::services::auth_service::LoginRequest,
            crate::services::auth_service::RegisterRequest,
            crate::services::auth_service::AuthResponse,
            crate::services::auth_service::UserInfo,

            // Health & Metrics
            crate::api::health::HealthResponse,
            crate::api::metrics::MetricsResponse,

            // Recipes
            crate::models::recipe::CreateRecipeRequest,
            crate::models::recipe::UpdateRecipeRequest,
            crate::models::recipe::RecipeResponse,
            crate::models::recipe::RecipeSummary,
            crate::models::rating::RateRecipeRequest,
            crate::models::rating::RatingSummary,

            // Users
            crate::models::user::AuthorInfo,
            crate::models::user::UserProfileResponse,
            crate::models::user::UpdateProfileRequest,

            // Shared
            crate::utils::pagination::Pagination,
        )
    ),
    tags(
        (name = "Auth", description = "Authentication and account endpoints. Supports local (email/password) and Google authentication."),
        (name = "Health", description = "Health check and system metrics endpoints for monitoring service status."),
        (name = "Recipes", description = "Recipe CRUD, ratings, and saves. Unpublished recipes are only visible to their owner."),
        (name = "Search", description = "Full-text recipe search with filters and relevance ranking."),
        (name = "Users", description = "Public profiles, follows, and the activity feed."),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Enter your JWT token"))
                        .build(),
                ),
            );
        }
    }
}
