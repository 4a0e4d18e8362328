mod client;
mod core;
mod features;
mod modules;
mod shared;

use crate::client::{
    platform, FormState, Gallery, GalleryView, HttpUploadApi, SelectedFile, TerminalPlatform,
    UploadForm, UploadNotifier,
};
use crate::core::config::{AppConfig, Config};
use crate::core::middleware;
use crate::core::openapi::{ApiDoc, SwaggerInfoModifier};
use crate::features::images::{routes as images_routes, FunctionEvent, FunctionHandler, ImageService};
use crate::modules::media_store::CloudinaryClient;
use axum::{middleware::from_fn, Router};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";

#[derive(Parser)]
#[command(name = "image-uploader")]
#[command(about = "Upload images and browse the gallery")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (default)
    Serve,
    /// Handle one function event read from stdin and write the response to stdout
    Function,
    /// Upload an image file through the upload endpoint
    Upload {
        path: PathBuf,
        #[arg(long, env = "API_URL", default_value = DEFAULT_API_URL)]
        api_url: String,
    },
    /// Print the gallery
    Gallery {
        #[arg(long, env = "API_URL", default_value = DEFAULT_API_URL)]
        api_url: String,
        /// Share the image with this public id
        #[arg(long)]
        share: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    // Build Tokio runtime with configurable worker threads
    let worker_threads = std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
        });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .max_blocking_threads(worker_threads * 4)
        .enable_all()
        .build()?;

    runtime.block_on(async_main(worker_threads))
}

async fn async_main(worker_threads: usize) -> anyhow::Result<()> {
    // Load .env file BEFORE initializing logger so RUST_LOG is available
    let _ = dotenvy::dotenv();

    // Logs go to stderr; stdout carries function responses and CLI output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(worker_threads).await,
        Commands::Function => run_function().await,
        Commands::Upload { path, api_url } => upload(path, &api_url).await,
        Commands::Gallery { api_url, share } => gallery(&api_url, share).await,
    }
}

fn image_service(config: &Config) -> anyhow::Result<Arc<ImageService>> {
    let store = Arc::new(
        CloudinaryClient::new(config.cloudinary.clone())
            .map_err(|e| anyhow::anyhow!("Failed to initialize Cloudinary client: {}", e))?,
    );
    Ok(Arc::new(ImageService::new(store, &config.app)))
}

async fn serve(worker_threads: usize) -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    // Log system info
    let available_cpus = std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(1);
    tracing::info!(
        "System info: available_cpus={}, tokio_worker_threads={}, pid={}",
        available_cpus,
        worker_threads,
        std::process::id()
    );

    tracing::info!("Configuration loaded successfully");

    let image_service = image_service(&config)?;
    tracing::info!(
        "Image service initialized (environment: {:?})",
        config.app.environment
    );

    // Build application router with dynamic swagger config
    let swagger_modifier = SwaggerInfoModifier {
        title: config.swagger.title.clone(),
        version: config.swagger.version.clone(),
        description: config.swagger.description.clone(),
    };

    let mut openapi = ApiDoc::openapi();
    swagger_modifier.modify(&mut openapi);

    let swagger = if let Some(credentials) = config.swagger.credentials() {
        tracing::info!("Swagger UI basic auth enabled");
        Router::new()
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
            .layer(from_fn(middleware::basic_auth_middleware(Arc::new(
                credentials,
            ))))
    } else {
        tracing::info!("Swagger UI basic auth disabled (no credentials configured)");
        Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
    };

    // Simple health check endpoint
    async fn health_check() -> axum::http::StatusCode {
        axum::http::StatusCode::OK
    }
    let health_route = Router::new().route("/health", axum::routing::get(health_check));

    let app = Router::new()
        .merge(swagger)
        .merge(images_routes(
            image_service,
            config.app.max_request_body_size,
        ))
        .merge(health_route)
        .layer(middleware::cors_layer(
            config.app.cors_allowed_origins.clone(),
        ))
        // Propagate X-Request-Id to response headers
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(middleware::MakeSpanWithRequestId)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Generate X-Request-Id using UUID v7 (or use client-provided one)
        .layer(SetRequestIdLayer::x_request_id(middleware::MakeRequestUuid));

    let listener = bind(&config.app)?;
    let addr = config.app.server_address();
    tracing::info!("Server listening on {}", format!("http://{}", addr));
    tracing::info!(
        "Swagger UI available at {}",
        format!("http://{}/swagger-ui/", addr)
    );

    axum::serve(listener, app).await?;

    Ok(())
}

fn bind(app: &AppConfig) -> anyhow::Result<tokio::net::TcpListener> {
    let socket_addr: std::net::SocketAddr = app
        .server_address()
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid address: {}", e))?;

    // Use socket2 for TCP listener configuration
    let socket = socket2::Socket::new(
        socket2::Domain::for_address(socket_addr),
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.set_nodelay(true)?;

    socket.set_recv_buffer_size(256 * 1024)?;
    socket.set_send_buffer_size(256 * 1024)?;

    #[cfg(target_os = "linux")]
    {
        let keepalive = socket2::TcpKeepalive::new()
            .with_time(Duration::from_secs(60))
            .with_interval(Duration::from_secs(10))
            .with_retries(3);
        socket.set_tcp_keepalive(&keepalive)?;
    }
    #[cfg(not(target_os = "linux"))]
    {
        let keepalive = socket2::TcpKeepalive::new().with_time(Duration::from_secs(60));
        socket.set_tcp_keepalive(&keepalive)?;
    }

    socket.set_nonblocking(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(1024)?;

    Ok(tokio::net::TcpListener::from_std(socket.into())?)
}

async fn run_function() -> anyhow::Result<()> {
    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;
    let handler = FunctionHandler::new(image_service(&config)?, config.app.primary_origin());

    let raw = tokio::task::spawn_blocking(|| {
        let mut raw = String::new();
        std::io::stdin().read_to_string(&mut raw).map(|_| raw)
    })
    .await??;

    let event: FunctionEvent = serde_json::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("Invalid function event: {}", e))?;

    let response = handler.handle(event).await;
    println!("{}", serde_json::to_string(&response)?);

    Ok(())
}

async fn upload(path: PathBuf, api_url: &str) -> anyhow::Result<()> {
    let api = Arc::new(HttpUploadApi::new(api_url));
    let notifier = UploadNotifier::new();
    let mut uploaded = notifier.subscribe();
    let mut form = UploadForm::new(api, notifier).with_success_delay(Duration::ZERO);

    let file = SelectedFile::from_path(&path).await?;
    form.select_file(file).await?;

    if let FormState::Failed(message) = form.submit().await {
        return Err(anyhow::anyhow!(message));
    }

    let event = uploaded
        .try_recv()
        .map_err(|e| anyhow::anyhow!("Upload finished without a result: {}", e))?;
    println!("{}  {}", event.public_id, event.url);

    Ok(())
}

async fn gallery(api_url: &str, share: Option<String>) -> anyhow::Result<()> {
    let api = Arc::new(HttpUploadApi::new(api_url));
    let notifier = UploadNotifier::new();
    let handle = Gallery::mount(api, notifier.subscribe());

    let view = handle
        .subscribe()
        .wait_for(|view| *view != GalleryView::Loading)
        .await?
        .clone();

    match view {
        GalleryView::Loading => {}
        GalleryView::Error(message) => return Err(anyhow::anyhow!(message)),
        GalleryView::Empty => {
            println!("No images yet. Upload your first image to start building your gallery!");
        }
        GalleryView::Grid(images) => {
            for image in &images {
                println!(
                    "{}  {}  {}",
                    image.created_at.format("%Y-%m-%d"),
                    image.public_id,
                    platform::view_full_size(image)
                );
            }

            if let Some(public_id) = share {
                let image = images
                    .iter()
                    .find(|image| image.public_id == public_id)
                    .ok_or_else(|| anyhow::anyhow!("No image with public id {}", public_id))?;
                platform::share(&TerminalPlatform, image).await?;
            }
        }
    }

    Ok(())
}
