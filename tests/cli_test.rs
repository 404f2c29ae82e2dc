//! CLI handlers wired through `App::from_config` against a fake Twitch.

mod common;

use std::sync::Arc;

use common::{config_for, spawn_twitch, twitch_dev_user, SharedTwitch};
use pollbridge::cli::{self, App};
use pollbridge::config::{Config, FlowVariant};
use pollbridge::session::{Session, SessionState};
use pollbridge::store::FileStore;

fn app_with_token(config: &mut Config, dir: &tempfile::TempDir, token: &str) -> App {
    let path = dir.path().join("storage.json");
    let session = Session::new(Arc::new(FileStore::new(&path)));
    session.set_access_token(token).unwrap();
    session.set_broadcaster_id("141981764").unwrap();

    config.storage.path = Some(path);
    App::from_config(config).unwrap()
}

#[tokio::test]
async fn poll_with_expired_token_posts_nothing() {
    let twitch = SharedTwitch::default();
    twitch.lock().users = Some(twitch_dev_user());
    let base = spawn_twitch(twitch.clone()).await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = config_for(&base, FlowVariant::Classic);
    let app = app_with_token(&mut config, &dir, "expired");

    cli::handle_poll(&app).await.unwrap();

    let twitch = twitch.lock();
    assert_eq!(twitch.validate_calls, 1);
    assert_eq!(twitch.users_calls, 0);
    assert!(twitch.poll_bodies.is_empty());
}

#[tokio::test]
async fn poll_with_unreachable_twitch_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    // Nothing listens on port 1
    let mut config = config_for("http://127.0.0.1:1", FlowVariant::Classic);
    let app = app_with_token(&mut config, &dir, "tok");

    assert!(cli::handle_poll(&app).await.is_err());
}

#[tokio::test]
async fn status_with_unreachable_twitch_is_no_session() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_for("http://127.0.0.1:1", FlowVariant::Classic);
    let app = app_with_token(&mut config, &dir, "tok");

    assert_eq!(cli::current_state(&app).await, SessionState::NoSession);
    cli::handle_status(&app).await.unwrap();
}

#[tokio::test]
async fn status_with_valid_token_is_ready() {
    let twitch = SharedTwitch::default();
    {
        let mut twitch = twitch.lock();
        twitch.valid_tokens = vec!["tok".to_string()];
        twitch.users = Some(twitch_dev_user());
    }
    let base = spawn_twitch(twitch).await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = config_for(&base, FlowVariant::Classic);
    let app = app_with_token(&mut config, &dir, "tok");

    assert!(cli::current_state(&app).await.is_ready());
}
