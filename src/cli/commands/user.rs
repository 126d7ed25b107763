//! Account bootstrap command handler

use crate::config::Config;
use crate::services::RegisterRequest;
use crate::state::SharedState;

/// Registers an account with the same validation as `POST /api/users` and
/// prints its API token.
pub async fn cmd_create_user(config: &Config, request: RegisterRequest) -> anyhow::Result<()> {
    let state = SharedState::new(config.clone()).await?;

    let email = request.email.clone();
    let password = request.password.clone();

    let user = state.user_service.register(request).await?;
    let login = state.auth_service.login(&email, &password).await?;

    println!("✓ Created user {} (id {})", user.username, user.id);
    println!("  API token: {}", login.auth_token);
    Ok(())
}
