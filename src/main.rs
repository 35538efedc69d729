use tracing_subscriber::EnvFilter;

use dev_profiler::config::ProfilerConfig;
use dev_profiler::middleware::profiler::Profiler;
use dev_profiler::server;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!();
    println!("╔══════════════════════════════════════════════════╗");
    println!("║   ⏱   DEV REQUEST PROFILER — DEMO APP           ║");
    println!("╚══════════════════════════════════════════════════╝");
    println!();

    let config = ProfilerConfig::from_env();
    println!(
        "Profiling {} — keeping {} profiles per page under {}",
        if config.enabled { "enabled" } else { "disabled (set APP_ENV=development)" },
        config.retention_count,
        config.storage_path.display(),
    );

    let profiler = Profiler::new(config);
    let app = server::create_router(profiler);

    let addr = "0.0.0.0:3000";
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to port 3000 — is it already in use?");

    println!();
    println!("Server listening on http://localhost:3000");
    println!("Demo workload    → http://localhost:3000/contacts");
    println!("Profile report   → http://localhost:3000/dev/performance_profiles");
    println!();

    axum::serve(listener, app)
        .await
        .expect("Server exited with error");
}
