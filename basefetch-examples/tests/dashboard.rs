use std::time::Duration;

use basefetch::{ClientError, HeaderInterceptor, HttpClient, RequestDescriptor, RetryPolicy, retry_with_policy};
use basefetch_examples::{
    Campaign, CampaignPage, CampaignStatus, CampaignUpdate, DEMO_PASSWORD, DailyReport, Deposit,
    LoginRequest, LoginResponse, NewCampaign, PAGE_SIZE, Profile, app,
};
use serde_json::json;

async fn spawn_app() -> HttpClient {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app()).await.unwrap();
    });
    HttpClient::with_base_url(format!("http://{}", addr)).unwrap()
}

async fn login(client: &HttpClient) -> String {
    let response: LoginResponse = client
        .post(
            "/auth/login",
            &LoginRequest {
                email: "ops@agency.test".to_string(),
                password: DEMO_PASSWORD.to_string(),
            },
        )
        .await
        .unwrap();
    response.token
}

#[tokio::test]
async fn test_login_rejects_wrong_password() {
    let client = spawn_app().await;

    let err = client
        .post::<_, LoginResponse>(
            "/auth/login",
            &LoginRequest {
                email: "ops@agency.test".to_string(),
                password: "wrong".to_string(),
            },
        )
        .await
        .unwrap_err();

    let api = err.as_api().unwrap();
    assert_eq!(api.status.as_u16(), 401);
    assert_eq!(api.body["code"], "invalid_credentials");
}

#[tokio::test]
async fn test_me_requires_authorization() {
    let client = spawn_app().await;

    let err = client.get::<Profile>("/me").await.unwrap_err();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(401));

    let token = login(&client).await;
    let handle = client
        .request_interceptors()
        .add(HeaderInterceptor::bearer(&token).unwrap());
    let profile: Profile = client.get("/me").await.unwrap();
    assert_eq!(profile.email, "ops@agency.test");

    assert!(client.request_interceptors().eject(handle));
    assert!(client.get::<Profile>("/me").await.is_err());
}

#[tokio::test]
async fn test_me_accepts_session_cookie() {
    let client = spawn_app().await;
    let token = login(&client).await;

    let descriptor = RequestDescriptor::default().header("cookie", format!("theme=dark; session={}", token));
    let profile: Profile = client.get_with("/me", descriptor).await.unwrap();
    assert_eq!(profile.email, "ops@agency.test");
}

#[tokio::test]
async fn test_campaign_filters_and_pagination() {
    let client = spawn_app().await;

    let page: CampaignPage = client
        .get_with("/campaigns", RequestDescriptor::default().param("status", "active"))
        .await
        .unwrap();
    assert_eq!(page.page, 1);
    assert_eq!(page.total, 3);
    assert_eq!(page.items.len(), PAGE_SIZE);
    assert!(page.items.iter().all(|c| c.status == CampaignStatus::Active));

    let second: CampaignPage = client
        .get_with(
            "/campaigns",
            RequestDescriptor::default().param("status", "active").param("page", "2"),
        )
        .await
        .unwrap();
    assert_eq!(second.items.len(), 1);

    let err = client
        .get_with::<CampaignPage>("/campaigns", RequestDescriptor::default().param("page", "0"))
        .await
        .unwrap_err();
    assert_eq!(err.message(), Some("page starts at 1"));
}

#[tokio::test]
async fn test_campaign_lifecycle() {
    let client = spawn_app().await;

    let created: Campaign = client
        .post(
            "/campaigns",
            &NewCampaign {
                name: "Summer referral bonus".to_string(),
                budget_cents: 300_000,
            },
        )
        .await
        .unwrap();
    assert_eq!(created.status, CampaignStatus::Draft);

    let update = CampaignUpdate {
        status: Some(CampaignStatus::Active),
        ..Default::default()
    };
    let updated: Campaign = client
        .put(&format!("/campaigns/{}", created.id), &update)
        .await
        .unwrap();
    assert_eq!(updated.status, CampaignStatus::Active);
    assert_eq!(updated.name, "Summer referral bonus");

    client
        .delete::<()>(&format!("/campaigns/{}", created.id))
        .await
        .unwrap();

    let err = client
        .delete::<()>(&format!("/campaigns/{}", created.id))
        .await
        .unwrap_err();
    let api = err.as_api().unwrap();
    assert_eq!(api.status.as_u16(), 404);
    assert_eq!(
        api.body,
        json!({"message": format!("campaign {} not found", created.id), "code": "not_found"})
    );
}

#[tokio::test]
async fn test_validation_error_payload() {
    let client = spawn_app().await;

    let err = client
        .post::<_, Campaign>(
            "/campaigns",
            &NewCampaign {
                name: "  ".to_string(),
                budget_cents: 0,
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Api(_)));
    assert_eq!(err.status().map(|s| s.as_u16()), Some(422));
    assert_eq!(err.message(), Some("campaign name must not be empty"));
}

#[tokio::test]
async fn test_deposits() {
    let client = spawn_app().await;

    let deposits: Vec<Deposit> = client.get("/deposits").await.unwrap();
    assert_eq!(deposits.len(), 2);
    assert!(deposits.iter().all(|d| d.currency == "USD"));
}

#[tokio::test]
async fn test_daily_report_needs_retry() {
    let client = spawn_app().await;

    let err = client.get::<DailyReport>("/reports/daily").await.unwrap_err();
    assert!(err.is_retryable());

    // Calls alternate between failure and success.
    client.get::<DailyReport>("/reports/daily").await.unwrap();

    let policy = RetryPolicy::new()
        .base_delay(Duration::from_millis(5))
        .max_delay(Duration::from_millis(20));
    let client = &client;
    let report = retry_with_policy(&policy, move || client.get::<DailyReport>("/reports/daily"))
        .await
        .unwrap();
    assert_eq!(report.campaigns, 5);
}
