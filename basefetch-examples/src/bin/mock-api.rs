//! Example: mock dashboard REST API
//!
//! Serves the endpoints `dashboard-client` talks to.
//!
//! Run with: cargo run --bin mock-api
//! Override the port with: PORT=8080 cargo run --bin mock-api

use basefetch_examples::{DEMO_PASSWORD, app, server_addr};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let addr = server_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;

    println!("=== Mock dashboard API ===");
    println!("Server listening on http://{}", addr);
    println!();
    println!("Endpoints:");
    println!("  POST   /auth/login        {{\"email\", \"password\"}}");
    println!("  GET    /me                requires Authorization: Bearer <token>");
    println!("  GET    /campaigns         ?status=active|paused|draft&page=N");
    println!("  POST   /campaigns         {{\"name\", \"budget_cents\"}}");
    println!("  PUT    /campaigns/{{id}}    {{\"name\"?, \"status\"?}}");
    println!("  DELETE /campaigns/{{id}}");
    println!("  GET    /deposits");
    println!("  GET    /reports/daily     fails with 503 every other call");
    println!();
    println!("Test with:");
    println!("  curl -X POST http://localhost:{}/auth/login \\", addr.port());
    println!("    -H 'Content-Type: application/json' \\");
    println!(
        "    -d '{{\"email\": \"ops@agency.test\", \"password\": \"{}\"}}'",
        DEMO_PASSWORD
    );

    axum::serve(listener, app()).await?;
    Ok(())
}
