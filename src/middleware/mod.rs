pub mod auth;
pub mod bot_guard;
pub mod rate_limit;
pub mod security_headers;

pub use auth::AuthMiddleware;
pub use bot_guard::BotGuard;
pub use rate_limit::{RateLimit, RateLimitConfig, RateLimiter};
pub use security_headers::SecurityHeaders;
