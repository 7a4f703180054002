use crate::database::MongoDB;
use crate::models::User;
use crate::utils::error::AppError;
use base64::Engine;
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

// JWT Claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,           // user_id
    pub email: String,
    pub name: Option<String>,
    pub iat: usize,            // issued at
    pub exp: usize,            // expiration
    pub jti: String,           // JWT ID
    pub aud: String,           // audience
    pub iss: String,           // issuer
}

// Request/Response structures
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub google_id: Option<String>,
    pub picture: Option<String>,
    pub provider: Option<String>, // "local" or "google"
}

#[derive(Debug, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    pub refresh_token: Option<String>,
    pub user: UserInfo,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct UserInfo {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GoogleAuthUrlResponse {
    pub success: bool,
    pub auth_url: String,
    pub state: String,
}

fn get_jwt_secret() -> String {
    std::env::var("JWT_SECRET").unwrap_or_else(|_| "default-secret-change-me".to_string())
}

fn get_jwt_issuer() -> String {
    std::env::var("JWT_ISSUER").unwrap_or_else(|_| "recipe-service".to_string())
}

fn get_jwt_audience() -> String {
    std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "recipe-api".to_string())
}

// Generate JWT token
pub fn generate_jwt(user: &User) -> Result<String, AppError> {
    let iat = Utc::now().timestamp() as usize;
    let exp = (Utc::now() + Duration::hours(24)).timestamp() as usize;
    let jti = Uuid::new_v4().to_string();

    let claims = Claims {
        sub: user.user_id.clone(),
        email: user.email.clone(),
        name: user.name.clone(),
        iat,
        exp,
        jti,
        aud: get_jwt_audience(),
        iss: get_jwt_issuer(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(get_jwt_secret().as_ref()),
    )
    .map_err(|e| AppError::Database(format!("Failed to generate token: {}", e)))
}

// Generate refresh token (longer expiry)
pub fn generate_refresh_token(user_id: &str) -> Result<String, AppError> {
    let iat = Utc::now().timestamp() as usize;
    let exp = (Utc::now() + Duration::days(30)).timestamp() as usize;
    let jti = Uuid::new_v4().to_string();

    let claims = Claims {
        sub: user_id.to_string(),
        email: String::new(),
        name: None,
        iat,
        exp,
        jti,
        aud: get_jwt_audience(),
        iss: get_jwt_issuer(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(get_jwt_secret().as_ref()),
    )
    .map_err(|e| AppError::Database(format!("Failed to generate refresh token: {}", e)))
}

// Verify JWT token
pub fn verify_token(token: &str) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[get_jwt_audience()]);

    let mut issuers = HashSet::new();
    issuers.insert(get_jwt_issuer());
    validation.iss = Some(issuers);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(get_jwt_secret().as_ref()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))
}

/// Optional authentication for routes that tolerate anonymous callers
/// (recipe GET, follow/save status). Returns None instead of an error.
pub fn claims_from_request(req: &actix_web::HttpRequest) -> Option<Claims> {
    let header = req.headers().get("Authorization")?;
    let header_str = header.to_str().ok()?;
    let token = header_str.strip_prefix("Bearer ")?;
    verify_token(token).ok()
}

/// Mandatory authentication for write routes living in mixed scopes that are
/// not wrapped by the auth middleware.
pub fn require_claims(req: &actix_web::HttpRequest) -> Result<Claims, AppError> {
    claims_from_request(req)
        .ok_or_else(|| AppError::Unauthorized("Missing or invalid authorization token".to_string()))
}

// User login
pub async fn login(db: &MongoDB, request: &LoginRequest) -> Result<AuthResponse, AppError> {
    let collection = db.collection::<User>("users");

    let user = collection
        .find_one(doc! { "email": &request.email })
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

    // OAuth-only accounts have no password
    let stored_password = user.password.as_ref().ok_or_else(|| {
        AppError::Unauthorized("This account uses Google login. Please sign in with Google.".to_string())
    })?;

    let valid = verify(&request.password, stored_password)
        .map_err(|e| AppError::Database(format!("Password verification error: {}", e)))?;

    if !valid {
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    if !user.is_active {
        return Err(AppError::Unauthorized("Account is inactive".to_string()));
    }

    collection
        .update_one(
            doc! { "user_id": &user.user_id },
            doc! { "$set": { "last_login": BsonDateTime::now() } },
        )
        .await?;

    let token = generate_jwt(&user)?;
    let refresh_token = generate_refresh_token(&user.user_id)?;

    Ok(AuthResponse {
        success: true,
        token,
        refresh_token: Some(refresh_token),
        user: UserInfo {
            id: user.user_id,
            email: user.email,
            name: user.name,
            picture: user.picture,
        },
    })
}

// User registration
pub async fn register(db: &MongoDB, request: &RegisterRequest) -> Result<AuthResponse, AppError> {
    let collection = db.collection::<User>("users");

    let email = request
        .email
        .as_ref()
        .ok_or_else(|| AppError::Validation("Email is required".to_string()))?;

    let provider = request.provider.as_deref().unwrap_or("local");

    match provider {
        "local" => {
            if request.password.is_none() {
                return Err(AppError::Validation(
                    "Password is required for local registration".to_string(),
                ));
            }
        }
        "google" => {
            if request.google_id.is_none() {
                return Err(AppError::Validation(
                    "Google ID is required for Google registration".to_string(),
                ));
            }
        }
        _ => {
            return Err(AppError::Validation(format!(
                "Invalid provider: {}. Supported: local, google",
                provider
            )))
        }
    }

    // Check if user already exists (by email or OAuth ID)
    let mut filter = doc! { "email": email };
    if let Some(google_id) = &request.google_id {
        filter = doc! {
            "$or": [
                { "email": email },
                { "google_id": google_id }
            ]
        };
    }

    if collection.find_one(filter).await?.is_some() {
        return Err(AppError::Validation("User already exists".to_string()));
    }

    let hashed_password = match &request.password {
        Some(pwd) => Some(
            hash(pwd, DEFAULT_COST)
                .map_err(|e| AppError::Database(format!("Failed to hash password: {}", e)))?,
        ),
        None => None,
    };

    let new_user_id = ObjectId::new().to_hex();

    let new_user = User {
        id: None,
        user_id: new_user_id.clone(),
        email: email.clone(),
        password: hashed_password,
        name: request.name.clone(),
        picture: request.picture.clone(),
        provider: Some(provider.to_string()),
        google_id: request.google_id.clone(),
        is_private: false,
        is_active: true,
        created_at: Some(BsonDateTime::now()),
        updated_at: Some(BsonDateTime::now()),
        last_login: Some(BsonDateTime::now()),
    };

    collection.insert_one(&new_user).await?;

    let token = generate_jwt(&new_user)?;
    let refresh_token = generate_refresh_token(&new_user_id)?;

    log::info!("✅ User registered: {} (provider: {})", email, provider);

    Ok(AuthResponse {
        success: true,
        token,
        refresh_token: Some(refresh_token),
        user: UserInfo {
            id: new_user_id,
            email: new_user.email,
            name: new_user.name,
            picture: new_user.picture,
        },
    })
}

// Refresh token
pub async fn refresh_token(
    db: &MongoDB,
    request: &RefreshTokenRequest,
) -> Result<AuthResponse, AppError> {
    let claims = verify_token(&request.refresh_token)?;

    let collection = db.collection::<User>("users");

    let user = collection
        .find_one(doc! { "user_id": &claims.sub })
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

    if !user.is_active {
        return Err(AppError::Unauthorized("Account is inactive".to_string()));
    }

    let token = generate_jwt(&user)?;
    let new_refresh_token = generate_refresh_token(&user.user_id)?;

    Ok(AuthResponse {
        success: true,
        token,
        refresh_token: Some(new_refresh_token),
        user: UserInfo {
            id: user.user_id,
            email: user.email,
            name: user.name,
            picture: user.picture,
        },
    })
}

// Get current user
pub async fn get_current_user(db: &MongoDB, user_id: &str) -> Result<UserInfo, AppError> {
    let collection = db.collection::<User>("users");

    let user = collection
        .find_one(doc! { "user_id": user_id })
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(UserInfo {
        id: user.user_id,
        email: user.email,
        name: user.name,
        picture: user.picture,
    })
}

// Generate Google OAuth URL
pub fn generate_google_oauth_url() -> Result<GoogleAuthUrlResponse, AppError> {
    let client_id = std::env::var("GOOGLE_CLIENT_ID")
        .map_err(|_| AppError::Database("GOOGLE_CLIENT_ID not configured".to_string()))?;

    let redirect_uri = std::env::var("GOOGLE_REDIRECT_URI")
        .unwrap_or_else(|_| "http://localhost:3000/auth/callback".to_string());

    // State for CSRF protection
    let state = Uuid::new_v4().to_string();

    let params = vec![
        ("client_id", client_id.as_str()),
        ("redirect_uri", redirect_uri.as_str()),
        ("response_type", "code"),
        ("scope", "openid email profile"),
        ("state", state.as_str()),
        ("access_type", "offline"),
        ("prompt", "select_account"),
    ];

    let query_string = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    let auth_url = format!("https://accounts.google.com/o/oauth2/v2/auth?{}", query_string);

    Ok(GoogleAuthUrlResponse {
        success: true,
        auth_url,
        state,
    })
}

/// Fields we need from the Google ID token payload
#[derive(Debug, Deserialize)]
struct GoogleIdTokenPayload {
    sub: String,
    email: String,
    name: Option<String>,
    picture: Option<String>,
}

/// Decode the payload segment of the Google ID token. The token was just
/// handed to us over TLS by Google's token endpoint, so the signature is
/// not re-verified here.
fn decode_google_id_token(id_token: &str) -> Result<GoogleIdTokenPayload, AppError> {
    let token_parts: Vec<&str> = id_token.split('.').collect();
    if token_parts.len() != 3 {
        return Err(AppError::Unauthorized("Malformed ID token".to_string()));
    }

    let payload_bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(token_parts[1])
        .map_err(|e| AppError::Unauthorized(format!("Failed to decode ID token payload: {}", e)))?;

    serde_json::from_slice(&payload_bytes)
        .map_err(|e| AppError::Unauthorized(format!("Failed to parse ID token payload: {}", e)))
}

// Handle Google OAuth callback: exchange the code, then find-or-create the user
pub async fn handle_google_callback(db: &MongoDB, code: &str) -> Result<AuthResponse, AppError> {
    let client_id = std::env::var("GOOGLE_CLIENT_ID")
        .map_err(|_| AppError::Database("GOOGLE_CLIENT_ID not configured".to_string()))?;
    let client_secret = std::env::var("GOOGLE_CLIENT_SECRET")
        .map_err(|_| AppError::Database("GOOGLE_CLIENT_SECRET not configured".to_string()))?;
    let redirect_uri = std::env::var("GOOGLE_REDIRECT_URI")
        .unwrap_or_else(|_| "http://localhost:3000/auth/callback".to_string());

    let client = reqwest::Client::new();
    let token_response = client
        .post("https://oauth2.googleapis.com/token")
        .form(&[
            ("code", code),
            ("client_id", &client_id),
            ("client_secret", &client_secret),
            ("redirect_uri", &redirect_uri),
            ("grant_type", "authorization_code"),
        ])
        .send()
        .await
        .map_err(|e| AppError::Database(format!("Failed to exchange code: {}", e)))?;

    if !token_response.status().is_success() {
        return Err(AppError::Unauthorized(
            "Failed to exchange authorization code".to_string(),
        ));
    }

    let tokens: serde_json::Value = token_response
        .json()
        .await
        .map_err(|e| AppError::Database(format!("Failed to parse token response: {}", e)))?;

    let id_token = tokens["id_token"]
        .as_str()
        .ok_or_else(|| AppError::Unauthorized("No ID token in response".to_string()))?;

    let payload = decode_google_id_token(id_token)?;

    let collection = db.collection::<User>("users");

    // Find by google_id first, then by email (account linking), else create
    let user = if let Some(existing) = collection
        .find_one(doc! { "google_id": &payload.sub })
        .await?
    {
        collection
            .update_one(
                doc! { "user_id": &existing.user_id },
                doc! { "$set": {
                    "name": payload.name.clone(),
                    "picture": payload.picture.clone(),
                    "last_login": BsonDateTime::now(),
                    "updated_at": BsonDateTime::now(),
                } },
            )
            .await?;
        existing
    } else if let Some(existing) = collection.find_one(doc! { "email": &payload.email }).await? {
        log::info!("✅ Linking google_id to existing user: {}", existing.user_id);
        collection
            .update_one(
                doc! { "user_id": &existing.user_id },
                doc! { "$set": {
                    "google_id": &payload.sub,
                    "provider": "google",
                    "name": payload.name.clone(),
                    "picture": payload.picture.clone(),
                    "last_login": BsonDateTime::now(),
                    "updated_at": BsonDateTime::now(),
                } },
            )
            .await?;
        existing
    } else {
        let new_user_id = ObjectId::new().to_hex();
        log::info!("✅ Creating new user from Google sign-in: {}", new_user_id);

        let new_user = User {
            id: None,
            user_id: new_user_id,
            email: payload.email.clone(),
            password: None,
            name: payload.name.clone(),
            picture: payload.picture.clone(),
            provider: Some("google".to_string()),
            google_id: Some(payload.sub.clone()),
            is_private: false,
            is_active: true,
            created_at: Some(BsonDateTime::now()),
            updated_at: Some(BsonDateTime::now()),
            last_login: Some(BsonDateTime::now()),
        };

        collection.insert_one(&new_user).await?;
        new_user
    };

    let token = generate_jwt(&user)?;
    let refresh_token = generate_refresh_token(&user.user_id)?;

    Ok(AuthResponse {
        success: true,
        token,
        refresh_token: Some(refresh_token),
        user: UserInfo {
            id: user.user_id.clone(),
            email: user.email,
            name: payload.name.or(user.name),
            picture: payload.picture.or(user.picture),
        },
    })
}

/// 🗑️ Delete a user account and everything it owns: recipes (with their
/// dependent ratings/saves/memberships), collections, and the user's own
/// edges in both directions.
pub async fn delete_user_account(db: &MongoDB, user_id: &str) -> Result<(), AppError> {
    use futures::stream::TryStreamExt;

    log::info!("🗑️ Deleting account for user_id: {}", user_id);

    let database = db.database();

    // Collect owned recipe and collection ids before removing them
    let recipes = database.collection::<crate::models::Recipe>("recipes");
    let recipe_ids: Vec<String> = recipes
        .find(doc! { "user_id": user_id })
        .await?
        .try_collect::<Vec<_>>()
        .await?
        .into_iter()
        .filter_map(|r| r.id.map(|id| id.to_hex()))
        .collect();

    let collections = database.collection::<crate::models::RecipeCollection>("collections");
    let collection_ids: Vec<String> = collections
        .find(doc! { "user_id": user_id })
        .await?
        .try_collect::<Vec<_>>()
        .await?
        .into_iter()
        .filter_map(|c| c.id.map(|id| id.to_hex()))
        .collect();

    let documents = |name: &str| database.collection::<mongodb::bson::Document>(name);

    // Rows referencing the user's recipes
    if !recipe_ids.is_empty() {
        let filter = doc! { "recipe_id": { "$in": &recipe_ids } };
        documents("ratings").delete_many(filter.clone()).await?;
        documents("saved_recipes").delete_many(filter.clone()).await?;
        documents("collection_recipes").delete_many(filter).await?;
    }

    // Rows inside the user's collections
    if !collection_ids.is_empty() {
        documents("collection_recipes")
            .delete_many(doc! { "collection_id": { "$in": &collection_ids } })
            .await?;
    }

    // The user's own activity on other people's content
    documents("ratings").delete_many(doc! { "user_id": user_id }).await?;
    documents("saved_recipes").delete_many(doc! { "user_id": user_id }).await?;
    documents("follows")
        .delete_many(doc! { "$or": [ { "follower_id": user_id }, { "following_id": user_id } ] })
        .await?;

    let deleted_recipes = documents("recipes").delete_many(doc! { "user_id": user_id }).await?;
    let deleted_collections = documents("collections").delete_many(doc! { "user_id": user_id }).await?;

    let delete_user_result = documents("users").delete_one(doc! { "user_id": user_id }).await?;
    if delete_user_result.deleted_count == 0 {
        log::warn!("⚠️ User {} not found in database", user_id);
        return Err(AppError::NotFound(format!("User {} not found", user_id)));
    }

    log::info!(
        "🎉 Account deleted for user {} ({} recipes, {} collections)",
        user_id,
        deleted_recipes.deleted_count,
        deleted_collections.deleted_count
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user() -> User {
        User {
            id: None,
            user_id: "user-1".to_string(),
            email: "cook@example.com".to_string(),
            password: None,
            name: Some("Cook".to_string()),
            picture: None,
            provider: Some("local".to_string()),
            google_id: None,
            is_private: false,
            is_active: true,
            created_at: None,
            updated_at: None,
            last_login: None,
        }
    }

    #[test]
    fn test_jwt_round_trip() {
        let token = generate_jwt(&test_user()).unwrap();
        let claims = verify_token(&token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.email, "cook@example.com");
        assert_eq!(claims.iss, get_jwt_issuer());
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        assert!(verify_token("not.a.jwt").is_err());
    }

    #[test]
    fn test_tampered_token_is_rejected() {
        let token = generate_jwt(&test_user()).unwrap();
        let mut tampered = token.clone();
        tampered.push('x');
        assert!(verify_token(&tampered).is_err());
    }

    #[test]
    fn test_decode_google_id_token_payload() {
        let payload = serde_json::json!({
            "sub": "google-123",
            "email": "cook@example.com",
            "name": "Cook",
            "picture": null
        });
        let encoded = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .encode(serde_json::to_vec(&payload).unwrap());
        let id_token = format!("header.{}.signature", encoded);

        let decoded = decode_google_id_token(&id_token).unwrap();
        assert_eq!(decoded.sub, "google-123");
        assert_eq!(decoded.email, "cook@example.com");

        assert!(decode_google_id_token("only-one-part").is_err());
    }
}
