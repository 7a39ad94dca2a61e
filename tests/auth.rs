use std::net::TcpListener;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::middleware::Logger;
use actix_web::{body::MessageBody, rt, test, web, App, HttpServer};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use starter_kit::auth::{verify_token, SignInResponse, SignUpResponse};
use starter_kit::config::{AdminConfig, AuthConfig};
use starter_kit::models::{UserDto, ROLE_ADMIN, ROLE_USER};
use starter_kit::pagination::Page;
use starter_kit::repository::InMemoryUserRepository;
use starter_kit::routes::{self, health};
use starter_kit::UserService;

fn auth_config() -> AuthConfig {
    AuthConfig::new("auth_integration_secret", 1)
}

fn user_service() -> UserService {
    UserService::new(Arc::new(InMemoryUserRepository::new()), auth_config()).with_bcrypt_cost(4)
}

async fn init_app(
    service: UserService,
) -> impl Service<actix_http::Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>
{
    let auth = service.auth().clone();
    test::init_service(
        App::new()
            .app_data(web::Data::new(service))
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(health::health)
            .configure(|cfg| routes::config(cfg, &auth)),
    )
    .await
}

async fn login(
    app: &impl Service<actix_http::Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>,
    username: &str,
    password: &str,
) -> (StatusCode, Value) {
    let req = test::TestRequest::post()
        .uri("/auth/login")
        .set_json(json!({ "username": username, "password": password }))
        .to_request();
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let body: Value = test::read_body_json(resp).await;
    (status, body)
}

fn registration() -> Value {
    json!({
        "username": "integration_user",
        "password": "Password123!",
        "email": "integration@example.com",
        "fullname": "Integration User"
    })
}

#[actix_rt::test]
async fn test_register_and_login_flow() {
    let app = init_app(user_service()).await;

    // Register a new user
    let req = test::TestRequest::post()
        .uri("/auth/register")
        .set_json(registration())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let registered: SignUpResponse = test::read_body_json(resp).await;

    // Same username again
    let req = test::TestRequest::post()
        .uri("/auth/register")
        .set_json(registration())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // Login
    let (status, body) = login(&app, "integration_user", "Password123!").await;
    assert_eq!(status, StatusCode::OK);
    let signed_in: SignInResponse = serde_json::from_value(body).unwrap();
    let claims = verify_token(&signed_in.token, &auth_config()).unwrap();
    assert_eq!(claims.sub, registered.id);
    assert_eq!(claims.email, "integration@example.com");
    assert_eq!(claims.name, "Integration User");
    assert_eq!(claims.roles, vec![ROLE_USER.to_string()]);

    // A plain user cannot reach the admin API
    let req = test::TestRequest::get()
        .uri("/api/v1/user")
        .insert_header(("Authorization", format!("Bearer {}", signed_in.token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_rt::test]
async fn test_login_rejections() {
    let app = init_app(user_service()).await;

    let req = test::TestRequest::post()
        .uri("/auth/register")
        .set_json(registration())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let (status, body) = login(&app, "integration_user", "WrongPassword!").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid username or password");

    let (status, body) = login(&app, "someone_else", "Password123!").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid username or password");

    let (status, _) = login(&app, "integration_user", "short").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let req = test::TestRequest::post()
        .uri("/auth/login")
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn test_register_validation() {
    let app = init_app(user_service()).await;

    for payload in [
        json!({ "username": "ok_name", "password": "Password123!", "email": "invalid-email" }),
        json!({ "username": "ok_name", "password": "short", "email": "a@example.com" }),
        json!({ "username": "bad name!", "password": "Password123!", "email": "a@example.com" }),
    ] {
        let req = test::TestRequest::post()
            .uri("/auth/register")
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(
            resp.status(),
            StatusCode::UNPROCESSABLE_ENTITY,
            "payload {} was accepted",
            payload
        );
    }
}

#[actix_rt::test]
async fn test_change_password_flow() {
    let app = init_app(user_service()).await;

    let req = test::TestRequest::post()
        .uri("/auth/register")
        .set_json(registration())
        .to_request();
    test::call_service(&app, req).await;

    let change = |old: &str| {
        test::TestRequest::post()
            .uri("/auth/password")
            .set_json(json!({
                "username": "integration_user",
                "oldPassword": old,
                "newPassword": "NewPassword456!"
            }))
            .to_request()
    };

    let resp = test::call_service(&app, change("NotMyPassword")).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = test::call_service(&app, change("Password123!")).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let (status, _) = login(&app, "integration_user", "Password123!").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = login(&app, "integration_user", "NewPassword456!").await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_rt::test]
async fn test_seeded_admin_manages_users() {
    let service = user_service();
    service
        .seed_admin(&AdminConfig {
            username: "admin".into(),
            email: "admin@example.com".into(),
            password: "AdminPassword1".into(),
        })
        .await
        .unwrap();
    let app = init_app(service).await;

    let (status, body) = login(&app, "admin", "AdminPassword1").await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();
    let claims = verify_token(&token, &auth_config()).unwrap();
    assert!(claims.roles.contains(&ROLE_ADMIN.to_string()));

    let req = test::TestRequest::post()
        .uri("/auth/register")
        .set_json(registration())
        .to_request();
    let registered: SignUpResponse =
        test::read_body_json(test::call_service(&app, req).await).await;

    let req = test::TestRequest::get()
        .uri("/api/v1/user?sort=email")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let page: Page<UserDto> = test::read_body_json(resp).await;
    assert_eq!(page.total_elements, 2);
    let emails: Vec<_> = page.elements.iter().map(|u| u.email.as_str()).collect();
    assert_eq!(emails, vec!["admin@example.com", "integration@example.com"]);

    // Disabled users can no longer sign in
    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/user/{}/enabledisable", registered.id))
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let (status, _) = login(&app, "integration_user", "Password123!").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_health_is_public() {
    let app = init_app(user_service()).await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn test_user_api_unauthorized_over_http() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let service = web::Data::new(user_service());
    let auth = auth_config();
    let server = HttpServer::new(move || {
        App::new()
            .app_data(service.clone())
            .wrap(Logger::default())
            .service(health::health)
            .configure(|cfg| routes::config(cfg, &auth))
    })
    .workers(1)
    .listen(listener)
    .expect("Failed to listen")
    .run();
    let handle = server.handle();
    rt::spawn(server);

    let client = reqwest::Client::new();
    let resp = client
        .get(format!("http://127.0.0.1:{}/api/v1/user?size=5", port))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Missing token");

    handle.stop(true).await;
}
