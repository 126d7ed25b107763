use foodgram::config::Config;
use foodgram::db::NewUser;
use foodgram::models::recipe::RecipeDraft;
use foodgram::services::{ShortLinkError, TokenGenerator};
use foodgram::state::SharedState;
use std::sync::{Arc, Mutex};

/// Replays a fixed list of tokens, repeating the last one when exhausted.
struct ScriptedTokens {
    tokens: Mutex<Vec<&'static str>>,
}

impl ScriptedTokens {
    fn new(mut tokens: Vec<&'static str>) -> Self {
        tokens.reverse();
        Self {
            tokens: Mutex::new(tokens),
        }
    }
}

impl TokenGenerator for ScriptedTokens {
    fn generate(&self) -> String {
        let mut tokens = self.tokens.lock().unwrap();
        if tokens.len() > 1 {
            tokens.pop().unwrap().to_string()
        } else {
            tokens[0].to_string()
        }
    }
}

fn test_config() -> Config {
    let id = uuid::Uuid::new_v4();
    let mut config = Config::default();
    config.general.database_path = format!(
        "sqlite:{}",
        std::env::temp_dir()
            .join(format!("foodgram-link-test-{id}.db"))
            .display()
    );
    config.general.images_path = std::env::temp_dir()
        .join(format!("foodgram-link-media-{id}"))
        .display()
        .to_string();
    config.short_links.base_url = "https://food.example".to_string();
    config
}

async fn seed_recipe(state: &SharedState, name: &str) -> i32 {
    let author = match state.store.get_user_by_username("author").await.unwrap() {
        Some(user) => user,
        None => state
            .store
            .create_user(
                NewUser {
                    email: "author@example.com".to_string(),
                    username: "author".to_string(),
                    first_name: "Recipe".to_string(),
                    last_name: "Author".to_string(),
                    password: "correct horse".to_string(),
                },
                &state.config().await.security,
            )
            .await
            .unwrap(),
    };

    state
        .store
        .create_recipe(
            author.id,
            RecipeDraft {
                name: name.to_string(),
                image: Some("recipes/placeholder.png".to_string()),
                text: "Stir.".to_string(),
                cooking_time: 10,
                tag_ids: Vec::new(),
                ingredients: Vec::new(),
            },
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn concurrent_requests_share_one_link() {
    let state = Arc::new(SharedState::new(test_config()).await.unwrap());
    let recipe_id = seed_recipe(&state, "Soup").await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let state = state.clone();
        handles.push(tokio::spawn(async move {
            state.short_link_service.get_or_create(recipe_id).await
        }));
    }

    let mut urls = Vec::new();
    for handle in handles {
        urls.push(handle.await.unwrap().unwrap());
    }

    urls.dedup();
    assert_eq!(urls.len(), 1, "all callers must observe the same link");
    assert!(urls[0].starts_with("https://food.example/s/"));
    assert_eq!(state.store.count_short_links().await.unwrap(), 1);
}

#[tokio::test]
async fn token_collision_is_retried() {
    let generator = Arc::new(ScriptedTokens::new(vec!["AAAAAAA", "AAAAAAA", "BBBBBBB"]));
    let state = SharedState::with_token_generator(test_config(), generator)
        .await
        .unwrap();

    let first = seed_recipe(&state, "First").await;
    let second = seed_recipe(&state, "Second").await;

    let link = state.short_link_service.get_or_create(first).await.unwrap();
    assert_eq!(link, "https://food.example/s/AAAAAAA");

    let link = state.short_link_service.get_or_create(second).await.unwrap();
    assert_eq!(link, "https://food.example/s/BBBBBBB");

    assert_eq!(
        state.short_link_service.resolve("BBBBBBB").await.unwrap(),
        format!("/recipes/{second}")
    );
}

#[tokio::test]
async fn gives_up_after_max_attempts() {
    let mut config = test_config();
    config.short_links.max_attempts = 3;

    let generator = Arc::new(ScriptedTokens::new(vec!["CCCCCCC"]));
    let state = SharedState::with_token_generator(config, generator)
        .await
        .unwrap();

    let first = seed_recipe(&state, "First").await;
    let second = seed_recipe(&state, "Second").await;

    state.short_link_service.get_or_create(first).await.unwrap();
    let err = state
        .short_link_service
        .get_or_create(second)
        .await
        .unwrap_err();

    assert!(matches!(err, ShortLinkError::Exhausted(3)));
    assert_eq!(state.store.count_short_links().await.unwrap(), 1);
}

#[tokio::test]
async fn resolve_rejects_unknown_and_malformed_tokens() {
    let state = SharedState::new(test_config()).await.unwrap();
    let recipe_id = seed_recipe(&state, "Stew").await;

    let link = state
        .short_link_service
        .get_or_create(recipe_id)
        .await
        .unwrap();
    let token = link.rsplit('/').next().unwrap();

    assert_eq!(
        state.short_link_service.resolve(token).await.unwrap(),
        format!("/recipes/{recipe_id}")
    );

    for bad in ["ZZZZZZZ", "abc", "abc123d", ""] {
        assert!(matches!(
            state.short_link_service.resolve(bad).await,
            Err(ShortLinkError::LinkNotFound)
        ));
    }
}

#[tokio::test]
async fn unknown_recipe_is_rejected() {
    let state = SharedState::new(test_config()).await.unwrap();

    assert!(matches!(
        state.short_link_service.get_or_create(4242).await,
        Err(ShortLinkError::RecipeNotFound(4242))
    ));
    assert_eq!(state.store.count_short_links().await.unwrap(), 0);
}

#[tokio::test]
async fn fresh_database_has_no_accounts() {
    let state = SharedState::new(test_config()).await.unwrap();
    let (users, total) = state.store.list_users(1, 10).await.unwrap();
    assert!(users.is_empty());
    assert_eq!(total, 0);
}
