// Net Payment Tracker - Web Server
// JSON API over the reconciliation engine

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Json},
    routing::get,
    Router,
};
use axum::extract::State;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use net_tracker::{
    load_free_nets, load_identity_map, load_netlists, load_payments, reconcile, FreeNetLedger,
    PaymentBook, ReconciliationRun,
};

/// Shared application state: just the source file paths. Every request
/// reloads the sheets and runs a fresh, fully isolated reconciliation, so
/// there is no mutable state to synchronize across requests.
#[derive(Clone)]
struct AppState {
    sources: Arc<NetSources>,
}

struct NetSources {
    netlist: PathBuf,
    members: PathBuf,
    payments: Vec<PathBuf>,
    freenet: Option<PathBuf>,
}

impl NetSources {
    /// Reload everything and run one reconciliation. A failed run produces
    /// nothing - no partial state escapes.
    fn run(&self) -> anyhow::Result<ReconciliationRun> {
        let identity = load_identity_map(&self.members)?;

        let mut payments = PaymentBook::new();
        for path in &self.payments {
            payments = payments.merge(load_payments(path)?);
        }

        let free_nets = match &self.freenet {
            Some(path) => load_free_nets(path)?,
            None => FreeNetLedger::new(),
        };

        let netlists = load_netlists(&self.netlist, &identity)?;

        Ok(reconcile(netlists, payments, &identity, free_nets))
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

impl ApiResponse<()> {
    fn err(message: String) -> Self {
        Self {
            success: false,
            data: (),
            error: Some(message),
        }
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/netlists - All sessions newest-first with per-player verdicts
async fn get_netlists(State(state): State<AppState>) -> impl IntoResponse {
    match state.sources.run() {
        Ok(run) => (StatusCode::OK, Json(ApiResponse::ok(run.netlists))).into_response(),
        Err(e) => {
            eprintln!("Error reconciling netlists: {:#}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::err(format!("{:#}", e))),
            )
                .into_response()
        }
    }
}

/// GET /api/outstanding - Who still owes, most sessions first
async fn get_outstanding(State(state): State<AppState>) -> impl IntoResponse {
    match state.sources.run() {
        Ok(run) => (StatusCode::OK, Json(ApiResponse::ok(run.outstanding))).into_response(),
        Err(e) => {
            eprintln!("Error building outstanding report: {:#}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::err(format!("{:#}", e))),
            )
                .into_response()
        }
    }
}

/// GET / - Serve index.html
async fn serve_index() -> impl IntoResponse {
    Html(include_str!("../web/index.html"))
}

// ============================================================================
// Main Server
// ============================================================================

fn parse_sources(args: &[String]) -> Option<NetSources> {
    let mut positional: Vec<PathBuf> = Vec::new();
    let mut freenet = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--freenet" {
            freenet = Some(PathBuf::from(iter.next()?));
        } else {
            positional.push(PathBuf::from(arg));
        }
    }

    if positional.len() < 3 {
        return None;
    }

    let netlist = positional.remove(0);
    let members = positional.remove(0);

    Some(NetSources {
        netlist,
        members,
        payments: positional,
        freenet,
    })
}

#[tokio::main]
async fn main() {
    println!("🌐 Net Payment Tracker - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(sources) = parse_sources(&args) else {
        eprintln!(
            "usage: net-server <netlist.csv> <members.csv> <payments.csv>... \
             [--freenet <freenet.csv>]"
        );
        std::process::exit(1);
    };

    for path in std::iter::once(&sources.netlist)
        .chain(std::iter::once(&sources.members))
        .chain(sources.payments.iter())
        .chain(sources.freenet.iter())
    {
        if !path.exists() {
            eprintln!("❌ Source file not found: {:?}", path);
            std::process::exit(1);
        }
    }
    println!("✓ Source sheets located");

    let state = AppState {
        sources: Arc::new(sources),
    };

    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/netlists", get(get_netlists))
        .route("/outstanding", get(get_outstanding))
        .with_state(state);

    // Build main router
    let app = Router::new()
        .route("/", get(serve_index))
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive());

    // Start server
    let addr = "0.0.0.0:3000";
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    println!("\n🚀 Server running on http://localhost:3000");
    println!("   API: http://localhost:3000/api/netlists");
    println!("   UI:  http://localhost:3000");
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
