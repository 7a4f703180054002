pub mod auth_service;
pub mod collection_service;
pub mod rating_service;
pub mod recipe_service;
pub mod search_service;
pub mod social_service;
pub mod user_service;
