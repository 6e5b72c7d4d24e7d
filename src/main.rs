mod config;
mod db;
mod dtos;
mod error;
mod handler;
mod middleware;
mod models;
mod routes;
mod service;
mod utils;

use std::sync::Arc;

use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use config::Config;
use dotenv::dotenv;
use routes::create_router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing_subscriber::filter::LevelFilter;
use uuid::Uuid;

use crate::db::db::DBClient;
use service::{
    account_service::AccountService,
    escrow_service::EscrowService,
    event_service::{ChannelEventSink, EventService, EventSink, LogEventSink},
    job_service::JobService,
    proposal_service::ProposalService,
    user_service::UserService,
};

const EVENT_STREAM_CAPACITY: usize = 1024;

#[derive(Debug, Clone)]
pub struct AppState {
    pub env: Config,
    pub db_client: Arc<DBClient>,
    pub event_stream: ChannelEventSink,
    pub event_service: Arc<EventService>,
    pub escrow_service: Arc<EscrowService>,
    pub account_service: Arc<AccountService>,
    pub job_service: Arc<JobService>,
    pub proposal_service: Arc<ProposalService>,
    pub user_service: Arc<UserService>,
}

impl AppState {
    pub fn new(db_client: DBClient, config: Config) -> Self {
        let db_client_arc = Arc::new(db_client);

        let event_stream = ChannelEventSink::new(EVENT_STREAM_CAPACITY);
        let sinks: Vec<Arc<dyn EventSink>> = vec![Arc::new(LogEventSink), Arc::new(event_stream.clone())];
        let event_service = Arc::new(EventService::new(db_client_arc.clone(), sinks));

        let escrow_service = Arc::new(EscrowService::new(
            db_client_arc.clone(),
            config.platform_account,
            config.payout_basis,
        ));
        let account_service = Arc::new(AccountService::new(db_client_arc.clone()));

        let job_service = Arc::new(JobService::new(
            db_client_arc.clone(),
            escrow_service.clone(),
            event_service.clone(),
        ));
        let proposal_service = Arc::new(ProposalService::new(db_client_arc.clone(), event_service.clone()));
        let user_service = Arc::new(UserService::new(db_client_arc.clone(), event_service.clone()));

        Self {
            env: config,
            db_client: db_client_arc,
            event_stream,
            event_service,
            escrow_service,
            account_service,
            job_service,
            proposal_service,
            user_service,
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::DEBUG)
        .init();

    dotenv().ok();

    let config = match Config::init() {
        Ok(config) => config,
        Err(err) => {
            println!("🔥 Invalid configuration: {}", err);
            std::process::exit(1);
        }
    };

    // `gigledger token <identity>` prints a bearer token for that identity.
    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(String::as_str) == Some("token") {
        issue_token(&config, args.get(2));
        return;
    }

    let db_client = match DBClient::connect(&config.database_url).await {
        Ok(db_client) => {
            println!("✅ Connection to the database is successful!");
            db_client
        }
        Err(err) => {
            println!("🔥 Failed to connect to the database: {:?}", err);
            std::process::exit(1);
        }
    };

    if let Err(err) = db_client.migrate().await {
        println!("🔥 Failed to apply the ledger schema: {:?}", err);
        std::process::exit(1);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "ignoring malformed CORS origin");
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE])
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT]);

    let port = config.port;
    let app_state = Arc::new(AppState::new(db_client, config));
    tracing::info!(
        platform_account = %app_state.escrow_service.platform_account(),
        payout_basis = app_state.escrow_service.payout_basis().to_str(),
        "ledger ready"
    );

    let app = create_router(app_state).layer(cors);

    println!("🚀 Server is running on http://localhost:{}", port);

    let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await {
        Ok(listener) => listener,
        Err(err) => {
            println!("🔥 Failed to bind port {}: {:?}", port, err);
            std::process::exit(1);
        }
    };

    if let Err(err) = axum::serve(listener, app).await {
        tracing::error!("server stopped: {}", err);
    }
}

fn issue_token(config: &Config, identity: Option<&String>) {
    let identity = match identity.map(|raw| Uuid::parse_str(raw)) {
        Some(Ok(identity)) => identity,
        Some(Err(_)) | None => {
            println!("usage: gigledger token <identity-uuid>");
            std::process::exit(2);
        }
    };

    match utils::token::create_token(&identity.to_string(), config.jwt_secret.as_bytes(), config.jwt_maxage) {
        Ok(token) => println!("{}", token),
        Err(err) => {
            println!("🔥 Failed to sign token: {}", err);
            std::process::exit(1);
        }
    }
}
