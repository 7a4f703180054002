pub mod analytics;
pub mod auth;
pub mod collections;
pub mod health;
pub mod maintenance;
pub mod metrics;
pub mod recipes;
pub mod search;
pub mod social;
pub mod swagger;
pub mod users;
pub mod webhooks;
