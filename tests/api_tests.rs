use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode, header},
};
use foodgram::api::AppState;
use foodgram::config::Config;
use http_body_util::BodyExt;
use sea_orm::ConnectionTrait;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

const PNG: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

struct TestApp {
    state: Arc<AppState>,
    router: Router,
    /// Token of `owner`, registered on a fresh database.
    token: String,
}

async fn spawn_app() -> TestApp {
    let id = uuid::Uuid::new_v4();
    let db_path = std::env::temp_dir().join(format!("foodgram-api-test-{id}.db"));
    let media_path = std::env::temp_dir().join(format!("foodgram-api-media-{id}"));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.general.images_path = media_path.display().to_string();
    config.server.secure_cookies = false;
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;

    let state = foodgram::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    let router = foodgram::api::router(state.clone()).await;

    let mut app = TestApp {
        state,
        router,
        token: String::new(),
    };
    app.token = app.register("owner").await;
    app
}

impl TestApp {
    async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, HeaderMap, Vec<u8>) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Token {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header("Content-Type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, headers, bytes.to_vec())
    }

    async fn json(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let (status, _, bytes) = self.send(method, uri, token, body).await;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    /// Seeds tags `breakfast`, `dinner` and ingredients Flour (g), Sugar (g), Milk (ml).
    async fn seed_catalog(&self) {
        self.state
            .store()
            .insert_tags(vec![
                ("Breakfast".to_string(), "breakfast".to_string()),
                ("Dinner".to_string(), "dinner".to_string()),
            ])
            .await
            .unwrap();
        self.state
            .store()
            .insert_ingredients(vec![
                ("Flour".to_string(), "g".to_string()),
                ("Sugar".to_string(), "g".to_string()),
                ("Milk".to_string(), "ml".to_string()),
            ])
            .await
            .unwrap();
    }

    async fn ingredient_id(&self, name: &str) -> i32 {
        let (_, body) = self
            .json("GET", &format!("/api/ingredients?name={name}"), None, None)
            .await;
        body[0]["id"].as_i64().unwrap() as i32
    }

    async fn tag_id(&self, slug: &str) -> i32 {
        let (_, body) = self.json("GET", "/api/tags", None, None).await;
        body.as_array()
            .unwrap()
            .iter()
            .find(|t| t["slug"] == slug)
            .and_then(|t| t["id"].as_i64())
            .unwrap() as i32
    }

    async fn create_recipe(&self, token: &str, name: &str, lines: &[(&str, i64)]) -> i32 {
        let mut ingredients = Vec::new();
        for (ingredient, amount) in lines {
            ingredients.push(json!({"id": self.ingredient_id(ingredient).await, "amount": amount}));
        }
        let tag = self.tag_id("breakfast").await;

        let (status, body) = self
            .json(
                "POST",
                "/api/recipes",
                Some(token),
                Some(json!({
                    "name": name,
                    "image": PNG,
                    "text": "Mix everything.",
                    "cooking_time": 15,
                    "tags": [tag],
                    "ingredients": ingredients,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_i64().unwrap() as i32
    }

    /// Registers a user and returns their token.
    async fn register(&self, username: &str) -> String {
        let email = format!("{username}@example.com");
        let (status, body) = self
            .json(
                "POST",
                "/api/users",
                None,
                Some(json!({
                    "email": email,
                    "username": username,
                    "first_name": "Test",
                    "last_name": "User",
                    "password": "correct horse",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");

        let (status, body) = self
            .json(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({"email": email, "password": "correct horse"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        body["auth_token"].as_str().unwrap().to_string()
    }
}

#[tokio::test]
async fn test_protected_routes_require_auth() {
    let app = spawn_app().await;

    for (method, uri) in [
        ("GET", "/api/users/me"),
        ("GET", "/api/recipes/download_shopping_cart/"),
        ("POST", "/api/recipes"),
        ("GET", "/api/users/subscriptions"),
    ] {
        let (status, body) = app.json(method, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
        assert_eq!(body["success"], false);
    }

    let (status, _) = app.json("GET", "/api/users/me", Some("wrong-key"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .json("GET", "/api/users/me", Some(&app.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "owner");

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/users/me")
                .header("X-Api-Key", &app.token)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_and_logout_rotates_token() {
    let app = spawn_app().await;

    let (status, _) = app
        .json(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"email": "owner@example.com", "password": "wrong"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let token = app.register("logout_user").await;

    let (status, _) = app.json("GET", "/api/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.json("POST", "/api/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.json("GET", "/api/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_registration_rejects_duplicates() {
    let app = spawn_app().await;
    app.register("chef").await;

    let (status, body) = app
        .json(
            "POST",
            "/api/users",
            None,
            Some(json!({
                "email": "chef@example.com",
                "username": "chef2",
                "first_name": "A",
                "last_name": "B",
                "password": "long enough",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("email"));

    let (status, body) = app.json("GET", "/api/users?limit=1", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(body["results"].as_array().unwrap().len(), 1);
    assert_eq!(body["next"], 2);
}

#[tokio::test]
async fn test_get_link_is_idempotent_and_redirects() {
    let app = spawn_app().await;
    app.seed_catalog().await;
    let recipe_id = app
        .create_recipe(&app.token, "Pancakes", &[("Flour", 200)])
        .await;

    let uri = format!("/api/recipes/{recipe_id}/get-link/");
    let (status, first) = app.json("GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, second) = app
        .json("GET", &format!("/api/recipes/{recipe_id}/get-link"), None, None)
        .await;
    assert_eq!(first, second);

    let link = first["short-link"].as_str().unwrap();
    let token = link
        .strip_prefix("http://localhost:6789/s/")
        .expect("short link uses the configured base URL");
    assert_eq!(token.len(), 7);
    assert!(token.chars().all(|c| c.is_ascii_alphabetic()));

    for path in [format!("/s/{token}/"), format!("/s/{token}")] {
        let (status, headers, _) = app.send("GET", &path, None, None).await;
        assert_eq!(status, StatusCode::FOUND);
        assert_eq!(
            headers[header::LOCATION].to_str().unwrap(),
            format!("/recipes/{recipe_id}")
        );
    }

    assert_eq!(app.state.store().count_short_links().await.unwrap(), 1);
}

#[tokio::test]
async fn test_short_link_not_found() {
    let app = spawn_app().await;

    let (status, body) = app
        .json("GET", "/api/recipes/999999/get-link/", None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);

    let (status, _, _) = app.send("GET", "/s/ZZZZZZZ/", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_download_empty_cart() {
    let app = spawn_app().await;

    let (status, headers, body) = app
        .send(
            "GET",
            "/api/recipes/download_shopping_cart/",
            Some(&app.token),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(
        headers[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with(mime::TEXT_PLAIN.as_ref())
    );
    assert_eq!(
        headers[header::CONTENT_DISPOSITION].to_str().unwrap(),
        "attachment; filename=\"shopping_list.txt\""
    );
    assert_eq!(String::from_utf8(body).unwrap(), "Shopping list:\n");
}

#[tokio::test]
async fn test_download_sums_matching_ingredients() {
    let app = spawn_app().await;
    app.seed_catalog().await;

    let cake = app
        .create_recipe(&app.token, "Cake", &[("Sugar", 100), ("Flour", 200)])
        .await;
    let tea = app
        .create_recipe(&app.token, "Sweet tea", &[("Sugar", 50), ("Milk", 30)])
        .await;

    for id in [cake, tea] {
        let (status, _) = app
            .json(
                "POST",
                &format!("/api/recipes/{id}/shopping_cart"),
                Some(&app.token),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, _, body) = app
        .send(
            "GET",
            "/api/recipes/download_shopping_cart",
            Some(&app.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        String::from_utf8(body).unwrap(),
        "Shopping list:\n1. Flour - 200 g\n2. Milk - 30 ml\n3. Sugar - 150 g\n"
    );

    // Another user's cart stays empty.
    let other = app.register("other_cook").await;
    let (_, _, body) = app
        .send(
            "GET",
            "/api/recipes/download_shopping_cart/",
            Some(&other),
            None,
        )
        .await;
    assert_eq!(String::from_utf8(body).unwrap(), "Shopping list:\n");
}

#[tokio::test]
async fn test_favorite_lifecycle() {
    let app = spawn_app().await;
    app.seed_catalog().await;
    let id = app
        .create_recipe(&app.token, "Omelette", &[("Milk", 50)])
        .await;
    let uri = format!("/api/recipes/{id}/favorite");

    let (status, body) = app.json("POST", &uri, Some(&app.token), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], id);
    assert_eq!(body["name"], "Omelette");
    assert!(body["image"].as_str().unwrap().starts_with("/media/recipes/"));

    let (status, body) = app.json("POST", &uri, Some(&app.token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (_, list) = app
        .json("GET", "/api/recipes?is_favorited=1", Some(&app.token), None)
        .await;
    assert_eq!(list["count"], 1);
    assert_eq!(list["results"][0]["is_favorited"], true);

    let (status, _) = app.json("DELETE", &uri, Some(&app.token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.json("DELETE", &uri, Some(&app.token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .json("POST", "/api/recipes/424242/favorite", Some(&app.token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_recipe_validation_and_ownership() {
    let app = spawn_app().await;
    app.seed_catalog().await;
    let flour = app.ingredient_id("Flour").await;

    let (status, _) = app
        .json(
            "POST",
            "/api/recipes",
            Some(&app.token),
            Some(json!({
                "name": "No tags",
                "image": PNG,
                "text": "x",
                "cooking_time": 5,
                "tags": [],
                "ingredients": [{"id": flour, "amount": 1}],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let id = app
        .create_recipe(&app.token, "Bread", &[("Flour", 500)])
        .await;

    let (status, recipe) = app.json("GET", &format!("/api/recipes/{id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(recipe["author"]["username"], "owner");
    assert_eq!(recipe["ingredients"][0]["amount"], 500);
    assert_eq!(recipe["tags"][0]["slug"], "breakfast");
    assert_eq!(recipe["is_favorited"], false);

    let intruder = app.register("intruder").await;
    let (status, _) = app
        .json("DELETE", &format!("/api/recipes/{id}"), Some(&intruder), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let tag = app.tag_id("dinner").await;
    let (status, updated) = app
        .json(
            "PATCH",
            &format!("/api/recipes/{id}"),
            Some(&app.token),
            Some(json!({
                "name": "Rye bread",
                "text": "Bake longer.",
                "cooking_time": 90,
                "tags": [tag],
                "ingredients": [{"id": flour, "amount": 450}],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Rye bread");
    assert_eq!(updated["tags"][0]["slug"], "dinner");
    assert_eq!(updated["image"], recipe["image"]);

    let (_, filtered) = app.json("GET", "/api/recipes?tags=dinner", None, None).await;
    assert_eq!(filtered["count"], 1);

    let (status, _) = app
        .json("DELETE", &format!("/api/recipes/{id}"), Some(&app.token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.json("GET", &format!("/api/recipes/{id}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_subscriptions() {
    let app = spawn_app().await;
    app.seed_catalog().await;
    let follower = app.register("follower").await;

    app.create_recipe(&app.token, "One", &[("Flour", 1)]).await;
    app.create_recipe(&app.token, "Two", &[("Flour", 2)]).await;

    let (_, me) = app.json("GET", "/api/users/me", Some(&app.token), None).await;
    let owner_id = me["id"].as_i64().unwrap();
    let uri = format!("/api/users/{owner_id}/subscribe?recipes_limit=1");

    let (status, _) = app.json("POST", &uri, Some(&app.token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.json("POST", &uri, Some(&follower), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["is_subscribed"], true);
    assert_eq!(body["recipes_count"], 2);
    assert_eq!(body["recipes"].as_array().unwrap().len(), 1);

    let (status, _) = app.json("POST", &uri, Some(&follower), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, list) = app
        .json("GET", "/api/users/subscriptions", Some(&follower), None)
        .await;
    assert_eq!(list["count"], 1);
    assert_eq!(list["results"][0]["username"], "owner");

    let (_, profile) = app
        .json("GET", &format!("/api/users/{owner_id}"), Some(&follower), None)
        .await;
    assert_eq!(profile["is_subscribed"], true);

    let uri = format!("/api/users/{owner_id}/subscribe");
    let (status, _) = app.json("DELETE", &uri, Some(&follower), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.json("DELETE", &uri, Some(&follower), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_ingredient_prefix_search() {
    let app = spawn_app().await;
    app.seed_catalog().await;

    let (status, body) = app.json("GET", "/api/ingredients?name=Fl", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Flour"]);

    let (status, _) = app.json("GET", "/api/ingredients/99999", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deleted_recipe_leaves_cart_and_favorites() {
    let app = spawn_app().await;
    app.seed_catalog().await;
    let id = app.create_recipe(&app.token, "Crepes", &[("Flour", 120)]).await;

    for collection in ["shopping_cart", "favorite"] {
        let (status, _) = app
            .json(
                "POST",
                &format!("/api/recipes/{id}/{collection}"),
                Some(&app.token),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, _) = app
        .json("DELETE", &format!("/api/recipes/{id}"), Some(&app.token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, _, body) = app
        .send(
            "GET",
            "/api/recipes/download_shopping_cart/",
            Some(&app.token),
            None,
        )
        .await;
    assert_eq!(String::from_utf8(body).unwrap(), "Shopping list:\n");

    let (_, favorites) = app
        .json("GET", "/api/recipes?is_favorited=1", Some(&app.token), None)
        .await;
    assert_eq!(favorites["count"], 0);
}

fn stored_recipe_images(app: &TestApp) -> usize {
    let dir = app.state.shared.image_service.root().join("recipes");
    std::fs::read_dir(dir).map_or(0, Iterator::count)
}

#[tokio::test]
async fn test_failed_update_discards_new_image() {
    let app = spawn_app().await;
    app.seed_catalog().await;
    let id = app.create_recipe(&app.token, "Scones", &[("Flour", 300)]).await;
    let flour = app.ingredient_id("Flour").await;
    let tag = app.tag_id("breakfast").await;
    assert_eq!(stored_recipe_images(&app), 1);

    app.state
        .store()
        .conn
        .execute_unprepared(
            "CREATE TRIGGER recipes_read_only BEFORE UPDATE ON recipes \
             BEGIN SELECT RAISE(ABORT, 'recipes are read-only'); END;",
        )
        .await
        .unwrap();

    let (status, _) = app
        .json(
            "PATCH",
            &format!("/api/recipes/{id}"),
            Some(&app.token),
            Some(json!({
                "name": "Cheese scones",
                "image": PNG,
                "text": "Add cheese.",
                "cooking_time": 20,
                "tags": [tag],
                "ingredients": [{"id": flour, "amount": 300}],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(stored_recipe_images(&app), 1);

    let (_, recipe) = app.json("GET", &format!("/api/recipes/{id}"), None, None).await;
    assert_eq!(recipe["name"], "Scones");
}
