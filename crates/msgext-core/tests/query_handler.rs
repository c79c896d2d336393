use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use msgext_core::auth::{consent_required_response, sign_in_response};
use msgext_core::cards::HERO_CARD_CONTENT_TYPE;
use msgext_core::{
    AppConfig, Attachment, AuthOutcome, AuthProvider, BoxError, CardRenderer, CardTemplate,
    HandlerError, MessagingExtensionQuery, OnBehalfOfConfig, PlatformResponse, Profile,
    ProfileClient, QueryHandler, QueryParameter, QueryResponse, RenderError, ResponseEnvelope,
    StockDataset, TemplateCardRenderer, TokenResponse, TurnContext, UserCredential,
};
use serde_json::{Value, json};

fn config() -> AppConfig {
    AppConfig {
        authority_host: "https://login.microsoftonline.com".into(),
        client_id: "client-1".into(),
        tenant_id: "tenant-1".into(),
        client_secret: "secret".into(),
        bot_domain: "bot.example.com".into(),
    }
}

enum AuthScript {
    Grant,
    Consent,
    Fail,
}

struct ScriptedAuth {
    script: AuthScript,
    calls: AtomicUsize,
    seen: Mutex<Vec<(Vec<String>, String)>>,
}

impl ScriptedAuth {
    fn new(script: AuthScript) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl AuthProvider for ScriptedAuth {
    async fn authenticate(
        &self,
        context: &TurnContext,
        config: &OnBehalfOfConfig,
        scopes: &[&str],
        login_endpoint: &str,
    ) -> Result<AuthOutcome, BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().expect("seen lock").push((
            scopes.iter().map(|s| s.to_string()).collect(),
            login_endpoint.to_string(),
        ));
        match self.script {
            AuthScript::Grant => {
                let sso = context.sso_token.clone().unwrap_or_default();
                Ok(AuthOutcome::Authenticated(TokenResponse {
                    token: format!("access-for-{sso}"),
                    sso_token: sso,
                    sso_token_expiration: Utc::now() + Duration::minutes(60),
                    expiration: Utc::now() + Duration::minutes(60),
                    connection_name: String::new(),
                }))
            }
            AuthScript::Consent => Ok(AuthOutcome::ConsentRequired(sign_in_response(
                login_endpoint,
                scopes,
                config,
            )?)),
            AuthScript::Fail => Err("token endpoint unreachable".into()),
        }
    }
}

struct FakeProfiles {
    fail: bool,
    calls: AtomicUsize,
    bearers: Mutex<Vec<String>>,
}

impl FakeProfiles {
    fn new(fail: bool) -> Arc<Self> {
        Arc::new(Self {
            fail,
            calls: AtomicUsize::new(0),
            bearers: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl ProfileClient for FakeProfiles {
    async fn fetch_self(&self, credential: &UserCredential) -> Result<Profile, BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.bearers
            .lock()
            .expect("bearer lock")
            .push(credential.bearer().to_string());
        if self.fail {
            return Err("graph returned status 503".into());
        }
        Ok(Profile {
            display_name: Some("Megan Bowen".into()),
            user_principal_name: Some("megan@contoso.example".into()),
            ..Default::default()
        })
    }
}

#[derive(Default)]
struct CountingRenderer {
    renders: AtomicUsize,
    previews: AtomicUsize,
}

impl CardRenderer for CountingRenderer {
    fn render(&self, template: &CardTemplate, data: &Value) -> Result<Attachment, RenderError> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        TemplateCardRenderer.render(template, data)
    }

    fn render_preview(&self, title: &str, subtitle: &str) -> Attachment {
        self.previews.fetch_add(1, Ordering::SeqCst);
        TemplateCardRenderer.render_preview(title, subtitle)
    }
}

struct Harness {
    handler: QueryHandler,
    auth: Arc<ScriptedAuth>,
    profiles: Arc<FakeProfiles>,
    renderer: Arc<CountingRenderer>,
}

fn harness(script: AuthScript, profile_fails: bool) -> Harness {
    let auth = ScriptedAuth::new(script);
    let profiles = FakeProfiles::new(profile_fails);
    let renderer = Arc::new(CountingRenderer::default());
    let handler = QueryHandler::new(&config(), auth.clone(), profiles.clone(), renderer.clone())
        .expect("handler");
    Harness {
        handler,
        auth,
        profiles,
        renderer,
    }
}

fn query(values: [&str; 4]) -> MessagingExtensionQuery {
    let names = ["StockIndex", "NumberofStocks", "P/B", "P/E"];
    MessagingExtensionQuery {
        command_id: Some("findStocks".into()),
        parameters: names
            .iter()
            .zip(values)
            .map(|(name, value)| QueryParameter::new(*name, value))
            .collect(),
        ..Default::default()
    }
}

fn context(token: &str) -> TurnContext {
    TurnContext::query(Some(token.to_string()))
}

fn expect_results(response: QueryResponse) -> ResponseEnvelope {
    match response {
        QueryResponse::Results(envelope) => envelope,
        QueryResponse::SignIn(other) => panic!("expected results, got sign-in {other:?}"),
    }
}

fn symbols(envelope: &ResponseEnvelope) -> Vec<String> {
    envelope
        .attachments()
        .iter()
        .map(|a| a.preview.content["subtitle"].as_str().unwrap_or_default().to_string())
        .collect()
}

#[tokio::test]
async fn basic_query_returns_every_record() -> anyhow::Result<()> {
    let h = harness(AuthScript::Grant, false);
    let response = h
        .handler
        .handle_query(&context("sso-1"), &query(["NASDAQ", "", "", ""]))
        .await?;
    let envelope = expect_results(response);

    assert_eq!(envelope.attachments().len(), 5);
    assert_eq!(h.handler.dataset().len(), 5);
    assert_eq!(h.renderer.renders.load(Ordering::SeqCst), 5);
    assert_eq!(h.renderer.previews.load(Ordering::SeqCst), 5);
    assert_eq!(h.profiles.calls.load(Ordering::SeqCst), 1);

    let seen = h.auth.seen.lock().expect("seen lock");
    assert_eq!(seen[0].0, vec!["User.Read".to_string()]);
    assert_eq!(seen[0].1, "https://bot.example.com/auth-start.html");
    let bearers = h.profiles.bearers.lock().expect("bearer lock");
    assert_eq!(bearers.as_slice(), ["access-for-sso-1"]);
    Ok(())
}

#[tokio::test]
async fn parameters_do_not_filter_or_reorder() -> anyhow::Result<()> {
    let h = harness(AuthScript::Grant, false);
    let basic = expect_results(
        h.handler
            .handle_query(&context("sso-1"), &query(["NASDAQ", "", "", ""]))
            .await?,
    );
    let advanced = expect_results(
        h.handler
            .handle_query(&context("sso-1"), &query(["", "Top:10", "<2", "<30"]))
            .await?,
    );

    let dataset_order: Vec<String> = h
        .handler
        .dataset()
        .records()
        .iter()
        .map(|r| r.symbol.clone())
        .collect();
    assert_eq!(symbols(&basic), dataset_order);
    assert_eq!(symbols(&advanced), dataset_order);
    assert_eq!(basic, advanced);
    Ok(())
}

#[tokio::test]
async fn every_attachment_has_card_and_preview() {
    let h = harness(AuthScript::Grant, false);
    let envelope = expect_results(
        h.handler
            .handle_query(&context("sso-1"), &query(["NASDAQ", "", "", ""]))
            .await
            .expect("query"),
    );
    for (attachment, record) in envelope.attachments().iter().zip(h.handler.dataset().records()) {
        assert_eq!(
            attachment.card.content_type,
            "application/vnd.microsoft.card.adaptive"
        );
        assert_eq!(attachment.card.content["type"], "AdaptiveCard");
        assert_eq!(attachment.preview.content_type, HERO_CARD_CONTENT_TYPE);
        assert_eq!(
            attachment.preview.content,
            json!({"title": record.company_name, "subtitle": record.symbol})
        );
    }
}

#[tokio::test]
async fn consent_required_skips_profile_and_rendering() {
    let h = harness(AuthScript::Consent, false);
    let response = h
        .handler
        .handle_query(&TurnContext::query(None), &query(["NASDAQ", "", "", ""]))
        .await
        .expect("query");

    let QueryResponse::SignIn(platform) = response else {
        panic!("expected sign-in response");
    };
    assert_eq!(platform.status, 200);
    let body = platform.body.expect("body");
    assert_eq!(body["composeExtension"]["type"], "silentAuth");
    assert_eq!(h.profiles.calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.renderer.renders.load(Ordering::SeqCst), 0);
    assert_eq!(h.renderer.previews.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn precondition_failed_passes_through() {
    struct ConsentGate;

    #[async_trait]
    impl AuthProvider for ConsentGate {
        async fn authenticate(
            &self,
            _context: &TurnContext,
            _config: &OnBehalfOfConfig,
            _scopes: &[&str],
            _login_endpoint: &str,
        ) -> Result<AuthOutcome, BoxError> {
            Ok(AuthOutcome::ConsentRequired(consent_required_response()))
        }
    }

    let renderer = Arc::new(CountingRenderer::default());
    let handler = QueryHandler::new(
        &config(),
        Arc::new(ConsentGate),
        FakeProfiles::new(false),
        renderer.clone(),
    )
    .expect("handler");
    let response = handler
        .handle_query(&context("expired"), &query(["", "", "", ""]))
        .await
        .expect("query")
        .into_platform_response()
        .expect("platform response");
    assert_eq!(response, PlatformResponse::status(412));
    assert_eq!(renderer.renders.load(Ordering::SeqCst), 0);
}

// Short parameter lists fault instead of producing an empty result list.
#[tokio::test]
async fn short_query_faults_with_out_of_range() {
    let h = harness(AuthScript::Grant, false);
    let mut short = query(["NASDAQ", "", "", ""]);
    short.parameters.truncate(3);

    let err = h
        .handler
        .handle_query(&context("sso-1"), &short)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        HandlerError::ParameterOutOfRange { index: 3, len: 3 }
    ));
    assert_eq!(h.renderer.renders.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn profile_failure_ends_the_turn() {
    let h = harness(AuthScript::Grant, true);
    let err = h
        .handler
        .handle_query(&context("sso-1"), &query(["NASDAQ", "", "", ""]))
        .await
        .unwrap_err();
    assert!(matches!(err, HandlerError::Profile(_)));
    assert_eq!(err.to_string(), "profile lookup failed: graph returned status 503");
    assert_eq!(h.renderer.renders.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn auth_transport_failure_propagates() {
    let h = harness(AuthScript::Fail, false);
    let err = h
        .handler
        .handle_query(&context("sso-1"), &query(["NASDAQ", "", "", ""]))
        .await
        .unwrap_err();
    assert!(matches!(err, HandlerError::Auth(_)));
    assert_eq!(h.profiles.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn render_failure_propagates() {
    let template = CardTemplate::from_value(json!({
        "type": "AdaptiveCard",
        "body": [{ "type": "TextBlock", "text": "${dividendYield}" }]
    }))
    .expect("template");
    let handler = QueryHandler::with_data(
        &config(),
        ScriptedAuth::new(AuthScript::Grant),
        FakeProfiles::new(false),
        Arc::new(TemplateCardRenderer),
        template,
        StockDataset::bundled().expect("data"),
    );
    let err = handler
        .handle_query(&context("sso-1"), &query(["NASDAQ", "", "", ""]))
        .await
        .unwrap_err();
    assert!(matches!(err, HandlerError::Render(_)));
}

#[tokio::test]
async fn other_invokes_are_rejected() {
    let h = harness(AuthScript::Grant, false);
    let ctx = TurnContext {
        invoke_name: "composeExtension/selectItem".into(),
        ..context("sso-1")
    };
    let err = h
        .handler
        .handle_query(&ctx, &query(["NASDAQ", "", "", ""]))
        .await
        .unwrap_err();
    assert!(matches!(err, HandlerError::UnsupportedInvoke(name) if name == "composeExtension/selectItem"));
    assert_eq!(h.auth.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_turns_do_not_interfere() {
    let h = harness(AuthScript::Grant, false);
    let first = h.handler.clone();
    let second = h.handler.clone();

    let a = tokio::spawn(async move {
        first
            .handle_query(&context("user-a"), &query(["NASDAQ", "", "", ""]))
            .await
    });
    let b = tokio::spawn(async move {
        second
            .handle_query(&context("user-b"), &query(["", "Top:10", "<2", "<30"]))
            .await
    });
    let (a, b) = (a.await.expect("join a"), b.await.expect("join b"));
    let a = expect_results(a.expect("turn a"));
    let b = expect_results(b.expect("turn b"));

    assert_eq!(a.attachments().len(), 5);
    assert_eq!(a, b);
    assert_eq!(h.renderer.renders.load(Ordering::SeqCst), 10);

    let mut bearers = h.profiles.bearers.lock().expect("bearer lock").clone();
    bearers.sort();
    assert_eq!(bearers, ["access-for-user-a", "access-for-user-b"]);
}
