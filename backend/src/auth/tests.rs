use super::*;
use axum::http::{Request, header::AUTHORIZATION};
use jsonwebtoken::{EncodingKey, Header, encode};

const SECRET: &str = "supersecretjwtsecretforunittesting123";
const USER_ID: &str = "123e4567-e89b-12d3-a456-426614174000";

fn token(secret: &str, aud: &str, exp: usize) -> String {
    let claims = SupabaseClaims {
        sub: USER_ID.to_string(),
        aud: aud.to_string(),
        role: "authenticated".to_string(),
        email: Some("test@example.com".to_string()),
        exp,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

fn parts(authorization: Option<&str>, with_secret: bool) -> Parts {
    let mut builder = Request::builder().uri("/api/v1/content");
    if let Some(value) = authorization {
        builder = builder.header(AUTHORIZATION, value);
    }
    let (mut parts, _) = builder.body(()).unwrap().into_parts();
    if with_secret {
        parts
            .extensions
            .insert(Arc::new(SupabaseJwtSecret(SECRET.to_string())));
    }
    parts
}

#[test]
fn test_validate_supabase_jwt_success() {
    let claims = validate_supabase_jwt(&token(SECRET, "authenticated", 9999999999), SECRET)
        .expect("Valid token should pass");

    assert_eq!(claims.sub, USER_ID);
    assert_eq!(claims.email.as_deref(), Some("test@example.com"));
}

#[test]
fn test_validate_supabase_jwt_expired() {
    assert!(validate_supabase_jwt(&token(SECRET, "authenticated", 1), SECRET).is_err());
}

#[test]
fn test_validate_supabase_jwt_invalid_signature() {
    assert!(validate_supabase_jwt(&token("wrongsecret", "authenticated", 9999999999), SECRET).is_err());
}

#[test]
fn test_validate_supabase_jwt_wrong_audience() {
    assert!(validate_supabase_jwt(&token(SECRET, "anon", 9999999999), SECRET).is_err());
}

#[tokio::test]
async fn extractor_resolves_the_user_from_a_bearer_token() {
    let header = format!("Bearer {}", token(SECRET, "authenticated", 9999999999));
    let mut parts = parts(Some(&header), true);

    let user = AuthUser::from_request_parts(&mut parts, &()).await.unwrap();

    assert_eq!(user.user_id, Uuid::parse_str(USER_ID).unwrap());
    assert_eq!(user.email.as_deref(), Some("test@example.com"));
}

#[tokio::test]
async fn extractor_rejects_missing_or_malformed_headers() {
    let token = token(SECRET, "authenticated", 9999999999);

    for header in [None, Some(token.as_str()), Some("Bearer not-a-jwt")] {
        let mut parts = parts(header, true);
        let (status, _) = AuthUser::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn extractor_fails_closed_without_a_configured_secret() {
    let header = format!("Bearer {}", token(SECRET, "authenticated", 9999999999));
    let mut parts = parts(Some(&header), false);

    let (status, _) = AuthUser::from_request_parts(&mut parts, &())
        .await
        .unwrap_err();

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}
