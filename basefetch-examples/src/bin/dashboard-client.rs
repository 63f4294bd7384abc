//! Example: dashboard client walkthrough
//!
//! Drives the mock API through `basefetch::HttpClient`: login, auth-header
//! injection, filtered listing, create/update/delete, a server-side
//! validation error and a retried flaky report.
//!
//! Usage:
//!   # First, start the mock API in another terminal:
//!   cargo run --bin mock-api
//!
//!   # Then run the client (defaults to http://localhost:3000):
//!   cargo run --bin dashboard-client
//!
//!   # Or specify a custom server URL:
//!   cargo run --bin dashboard-client -- http://localhost:8080

use std::env;
use std::time::Duration;

use basefetch::{
    ClientError, HeaderInterceptor, HttpClient, RequestDescriptor, RetryPolicy, TraceRequests,
    TraceResponses, retry_with_policy,
};
use basefetch_examples::{
    Campaign, CampaignPage, CampaignStatus, CampaignUpdate, DEMO_PASSWORD, DailyReport, Deposit,
    LoginRequest, LoginResponse, NewCampaign, PAGE_SIZE, Profile,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    // Check command line args first, then SERVER_URL env var, then default
    let base_url = env::args()
        .nth(1)
        .or_else(|| env::var("SERVER_URL").ok())
        .unwrap_or_else(|| "http://localhost:3000".to_string());

    println!("=== Dashboard client ===");
    println!("Server URL: {}", base_url);
    println!();

    let client = HttpClient::builder()
        .base_url(&base_url)
        .with_request_interceptor(TraceRequests)
        .with_response_interceptor(TraceResponses)
        .build()?;

    println!("Step 1: /me without credentials is rejected...");
    match client.get::<Profile>("/me").await {
        Err(ClientError::Api(err)) => {
            assert_eq!(err.status.as_u16(), 401);
            println!("  PASS: {} (code = {})", err, err.body["code"]);
        }
        other => anyhow::bail!("expected 401, got {:?}", other),
    }

    println!("Step 2: login and install the auth interceptor...");
    let login: LoginResponse = client
        .post(
            "/auth/login",
            &LoginRequest {
                email: "ops@agency.test".to_string(),
                password: DEMO_PASSWORD.to_string(),
            },
        )
        .await?;
    let auth = client
        .request_interceptors()
        .add(HeaderInterceptor::bearer(&login.token)?);
    let profile: Profile = client.get("/me").await?;
    println!("  PASS: logged in as {}", profile.email);

    println!("Step 3: list active campaigns page by page...");
    let mut page = 1;
    loop {
        let descriptor = RequestDescriptor::default()
            .param("status", "active")
            .param("page", page.to_string());
        let result: CampaignPage = client.get_with("/campaigns", descriptor).await?;
        for campaign in &result.items {
            assert_eq!(campaign.status, CampaignStatus::Active);
            println!("  page {}: #{} {}", result.page, campaign.id, campaign.name);
        }
        if page * PAGE_SIZE >= result.total {
            break;
        }
        page += 1;
    }

    println!("Step 4: create, activate and delete a campaign...");
    let created: Campaign = client
        .post(
            "/campaigns",
            &NewCampaign {
                name: "Summer referral bonus".to_string(),
                budget_cents: 300_000,
            },
        )
        .await?;
    println!("  PASS: created #{} as {:?}", created.id, created.status);

    let update = CampaignUpdate {
        status: Some(CampaignStatus::Active),
        ..Default::default()
    };
    let updated: Campaign = client
        .put(&format!("/campaigns/{}", created.id), &update)
        .await?;
    assert_eq!(updated.status, CampaignStatus::Active);
    println!("  PASS: #{} is now {:?}", updated.id, updated.status);

    client
        .delete::<()>(&format!("/campaigns/{}", created.id))
        .await?;
    println!("  PASS: deleted #{}", created.id);

    println!("Step 5: server-side validation error carries the payload...");
    let invalid = NewCampaign {
        name: "   ".to_string(),
        budget_cents: 0,
    };
    match client.post::<_, Campaign>("/campaigns", &invalid).await {
        Err(err) => {
            let api = err.as_api().ok_or_else(|| anyhow::anyhow!("unexpected error: {}", err))?;
            println!("  PASS: HTTP {} body = {}", api.status, api.body);
        }
        Ok(campaign) => anyhow::bail!("invalid campaign was accepted: {:?}", campaign),
    }

    println!("Step 6: deposits...");
    let deposits: Vec<Deposit> = client.get("/deposits").await?;
    let total: u64 = deposits.iter().map(|d| d.amount_cents).sum();
    println!("  PASS: {} deposits, {} cents total", deposits.len(), total);

    println!("Step 7: retry the flaky daily report...");
    let policy = RetryPolicy::aggressive().base_delay(Duration::from_millis(100));
    let reports = &client;
    let report: DailyReport =
        retry_with_policy(&policy, move || reports.get::<DailyReport>("/reports/daily")).await?;
    println!(
        "  PASS: {} campaigns, {} cents planned spend",
        report.campaigns, report.spend_cents
    );

    println!("Step 8: eject the auth interceptor...");
    client.request_interceptors().eject(auth);
    let err = client.get::<Profile>("/me").await.unwrap_err();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(401));
    println!("  PASS: /me is rejected again");

    println!();
    println!("All steps passed.");
    Ok(())
}
