use serde_json::json;
use std::process::ExitCode;
use std::sync::Arc;
use urur::cli::{LoginArgs, MethodArg, SubmitArgs};
use urur::commands;
use urur::AppContext;
use urur_auth::testing::{
    sample_session, InMemoryCredentialStore, RecordingBrowser, ScriptedGateway, ScriptedPrompter,
};
use urur_auth::{AuthenticatedSession, Settings};
use wiremock::matchers::{bearer_token, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Harness {
    store: Arc<InMemoryCredentialStore>,
    prompter: Arc<ScriptedPrompter>,
    ctx: AppContext,
}

fn harness(
    backend_url: &str,
    gateway: ScriptedGateway,
    store: InMemoryCredentialStore,
    prompter: ScriptedPrompter,
) -> Harness {
    let store = Arc::new(store);
    let prompter = Arc::new(prompter);
    let settings = Settings {
        backend_url: backend_url.to_string(),
        anon_key: "anon-key".into(),
        ..Settings::default()
    };

    let ctx = AppContext {
        settings,
        gateway: Arc::new(gateway),
        store: store.clone(),
        prompter: prompter.clone(),
        browser: Arc::new(RecordingBrowser::new()),
    };

    Harness {
        store,
        prompter,
        ctx,
    }
}

fn submit_args(name: &str, url: &str) -> SubmitArgs {
    SubmitArgs {
        name: Some(name.into()),
        url: Some(url.into()),
        ..SubmitArgs::default()
    }
}

async fn mount_insert(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/rest/v1/services"))
        .and(bearer_token("access-token"))
        .and(body_partial_json(json!({
            "user_id": "5d1f3c2a-0000-4000-8000-000000000001",
            "source": "cli"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{
            "id": "0b6f5b8e-1111-4000-8000-000000000002",
            "user_id": "5d1f3c2a-0000-4000-8000-000000000001",
            "name": "My Service",
            "url": "https://example.com",
            "tagline": null,
            "description": null,
            "logo_url": null,
            "source": "cli"
        }])))
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_submit_with_flags_inserts_row() {
    let server = MockServer::start().await;
    mount_insert(&server, 1).await;
    let h = harness(
        &server.uri(),
        ScriptedGateway::new(),
        InMemoryCredentialStore::with_session(sample_session()),
        ScriptedPrompter::new().confirm_with(true),
    );

    let code = commands::submit::run(&h.ctx, &submit_args("My Service", "https://example.com"))
        .await
        .unwrap();

    assert_eq!(code, ExitCode::SUCCESS);
    assert_eq!(h.prompter.asked(), vec!["Submit this product?"]);
}

#[tokio::test]
async fn test_submit_requires_login() {
    let server = MockServer::start().await;
    mount_insert(&server, 0).await;
    let h = harness(
        &server.uri(),
        ScriptedGateway::new(),
        InMemoryCredentialStore::new(),
        ScriptedPrompter::new(),
    );

    let code = commands::submit::run(&h.ctx, &submit_args("My Service", "https://example.com"))
        .await
        .unwrap();

    assert_eq!(code, ExitCode::FAILURE);
    assert!(h.prompter.asked().is_empty());
}

#[tokio::test]
async fn test_submit_with_rejected_session_fails() {
    let server = MockServer::start().await;
    mount_insert(&server, 0).await;
    let h = harness(
        &server.uri(),
        ScriptedGateway::new().with_invalid_session(),
        InMemoryCredentialStore::with_session(sample_session()),
        ScriptedPrompter::new(),
    );

    let code = commands::submit::run(&h.ctx, &submit_args("My Service", "https://example.com"))
        .await
        .unwrap();

    assert_eq!(code, ExitCode::FAILURE);
}

#[tokio::test]
async fn test_submit_with_invalid_flags_sends_nothing() {
    let server = MockServer::start().await;
    mount_insert(&server, 0).await;
    let h = harness(
        &server.uri(),
        ScriptedGateway::new(),
        InMemoryCredentialStore::with_session(sample_session()),
        ScriptedPrompter::new(),
    );
    let mut args = submit_args("My Service", "not a url");
    args.logo_url = Some("logo.png".into());

    let code = commands::submit::run(&h.ctx, &args).await.unwrap();

    assert_eq!(code, ExitCode::FAILURE);
    assert!(h.prompter.asked().is_empty());
}

#[tokio::test]
async fn test_submit_declined_at_confirmation() {
    let server = MockServer::start().await;
    mount_insert(&server, 0).await;
    let h = harness(
        &server.uri(),
        ScriptedGateway::new(),
        InMemoryCredentialStore::with_session(sample_session()),
        ScriptedPrompter::new().confirm_with(false),
    );

    let code = commands::submit::run(&h.ctx, &submit_args("My Service", "https://example.com"))
        .await
        .unwrap();

    assert_eq!(code, ExitCode::SUCCESS);
}

#[tokio::test]
async fn test_submit_interactive_reasks_invalid_answers() {
    let server = MockServer::start().await;
    mount_insert(&server, 1).await;
    let h = harness(
        &server.uri(),
        ScriptedGateway::new(),
        InMemoryCredentialStore::with_session(sample_session()),
        ScriptedPrompter::new()
            .input_with("   ")
            .input_with("My Service")
            .input_with("example")
            .input_with("https://example.com")
            .input_with("")
            .input_with("")
            .input_with("")
            .confirm_with(true),
    );

    let code = commands::submit::run(&h.ctx, &SubmitArgs::default())
        .await
        .unwrap();

    assert_eq!(code, ExitCode::SUCCESS);
    assert_eq!(h.prompter.rejected(), vec!["   ", "example"]);
}

#[tokio::test]
async fn test_submit_backend_error_exits_nonzero() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/services"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23505",
            "message": "duplicate key value violates unique constraint",
            "details": null,
            "hint": null
        })))
        .mount(&server)
        .await;
    let h = harness(
        &server.uri(),
        ScriptedGateway::new(),
        InMemoryCredentialStore::with_session(sample_session()),
        ScriptedPrompter::new().confirm_with(true),
    );

    let code = commands::submit::run(&h.ctx, &submit_args("My Service", "https://example.com"))
        .await
        .unwrap();

    assert_eq!(code, ExitCode::FAILURE);
}

#[tokio::test]
async fn test_whoami_reports_login_state() {
    let logged_in = harness(
        "http://127.0.0.1:9",
        ScriptedGateway::new(),
        InMemoryCredentialStore::with_session(sample_session()),
        ScriptedPrompter::new(),
    );
    assert_eq!(
        commands::whoami::run(&logged_in.ctx).await.unwrap(),
        ExitCode::SUCCESS
    );

    let logged_out = harness(
        "http://127.0.0.1:9",
        ScriptedGateway::new(),
        InMemoryCredentialStore::new(),
        ScriptedPrompter::new(),
    );
    assert_eq!(
        commands::whoami::run(&logged_out.ctx).await.unwrap(),
        ExitCode::FAILURE
    );
}

#[tokio::test]
async fn test_login_with_email_saves_session() {
    let issued = AuthenticatedSession {
        session: sample_session(),
        display_name: "me@example.com".into(),
    };
    let h = harness(
        "http://127.0.0.1:9",
        ScriptedGateway::new()
            .with_otp_code("123456")
            .with_issued_session(issued),
        InMemoryCredentialStore::new(),
        ScriptedPrompter::new()
            .input_with("me@example.com")
            .input_with("123456"),
    );
    let args = LoginArgs {
        port: None,
        method: Some(MethodArg::Email),
    };

    let code = commands::login::run(&h.ctx, &args).await.unwrap();

    assert_eq!(code, ExitCode::SUCCESS);
    assert_eq!(h.store.save_count(), 1);
}

#[tokio::test]
async fn test_login_failure_exits_nonzero() {
    let h = harness(
        "http://127.0.0.1:9",
        ScriptedGateway::new(),
        InMemoryCredentialStore::new(),
        ScriptedPrompter::new()
            .input_with("me@example.com")
            .input_with("1")
            .input_with("2")
            .input_with("3")
            .confirm_with(false),
    );
    let args = LoginArgs {
        port: None,
        method: Some(MethodArg::Email),
    };

    let code = commands::login::run(&h.ctx, &args).await.unwrap();

    assert_eq!(code, ExitCode::FAILURE);
    assert_eq!(h.store.save_count(), 0);
}
