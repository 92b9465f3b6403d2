use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use camino::{Utf8Path as Path, Utf8PathBuf as PathBuf};
use clap::Parser;
use eyre::{self, Context, Result};
use folio::{
    app_state::{AppState, SharedState},
    routes,
};
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{
    request_id::MakeRequestUuid,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
    ServiceBuilderExt,
};
use tracing::info;
use tracing_error::ErrorLayer;
use tracing_subscriber::{prelude::*, EnvFilter};

use folio_core::{
    auth,
    catalog::operation::ingest_image::ImageIngester,
    config::Config,
    core::{background::BackgroundTasks, storage::ContentStore},
    deadpool_diesel, interact,
    model::repository::db::{self, DbPool},
};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[arg(short, long)]
    config: String,
    #[cfg(feature = "opentelemetry")]
    #[arg(long)]
    otel_endpoint: Option<String>,
}

async fn db_setup(db_path: &Path, config: &Config) -> Result<DbPool> {
    let pool = db::open_db_pool(db_path.as_str())?;
    let conn = pool.get().await?;
    interact!(conn, db::migrate).await??;
    let admin_password = config.admin_password.clone();
    let created = interact!(conn, move |conn| {
        Ok(auth::ensure_admin_user(conn, admin_password.as_deref()))
    })
    .await??
    .wrap_err("error creating admin user")?;
    if created {
        info!(username = auth::ADMIN_USERNAME, "created admin account");
    }
    Ok(pool)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "1")
    }
    if std::env::var("RUST_SPANTRACE").is_err() {
        std::env::set_var("RUST_SPANTRACE", "1");
    }
    color_eyre::install()?;
    if std::env::var("FOLIO_LOG").is_err() {
        std::env::set_var("FOLIO_LOG", "info,folio=debug,folio_core=debug")
    }
    let tracing = tracing_subscriber::registry()
        .with(EnvFilter::from_env("FOLIO_LOG"))
        .with(ErrorLayer::default())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr));
    #[cfg(feature = "opentelemetry")]
    {
        use opentelemetry_otlp::WithExportConfig;
        let telemetry = args
            .otel_endpoint
            .as_ref()
            .map(|otel_endpoint| {
                opentelemetry_otlp::new_pipeline()
                    .tracing()
                    .with_exporter(
                        opentelemetry_otlp::new_exporter()
                            .tonic()
                            .with_endpoint(otel_endpoint),
                    )
                    .with_trace_config(opentelemetry_sdk::trace::config().with_resource(
                        opentelemetry_sdk::Resource::new(vec![opentelemetry::KeyValue::new(
                            opentelemetry_semantic_conventions::resource::SERVICE_NAME,
                            "folio",
                        )]),
                    ))
                    .install_batch(opentelemetry_sdk::runtime::Tokio)
                    .wrap_err("error installing opentelemetry pipeline")
            })
            .transpose()?
            .map(|tracer| tracing_opentelemetry::layer().with_tracer(tracer));
        tracing.with(telemetry).init();
    }
    #[cfg(not(feature = "opentelemetry"))]
    {
        tracing.init();
    }

    let config_path = PathBuf::from(args.config);
    // relative paths in the config are already resolved against its directory
    let config = folio_core::config::read_config(&config_path).await?;

    let addr: IpAddr = config
        .address
        .parse()
        .wrap_err("error parsing listening address")?;
    let port = config.port;

    info!("Starting up...");
    std::fs::create_dir_all(&config.data_dir.path)
        .wrap_err_with(|| format!("error creating data dir {}", config.data_dir.path))?;
    let pool = db_setup(&config.data_dir.database_path(), &config).await?;
    let store = ContentStore::open(config.uploads_dir.clone())
        .wrap_err_with(|| format!("error opening upload store {}", config.uploads_dir))?;
    let background = BackgroundTasks::start(pool.clone(), store.clone(), &config.cleanup);

    let ingester = ImageIngester::new(store, config.variants.clone());
    let shared_state: SharedState = Arc::new(AppState {
        pool,
        ingester,
        config,
    });
    let app = routes::router(shared_state).layer(
        ServiceBuilder::new().set_x_request_id(MakeRequestUuid).layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        ),
    );
    let listener = tokio::net::TcpListener::bind(SocketAddr::new(addr, port))
        .await
        .wrap_err("Error binding socket")?;
    info!(%addr, port, "listening");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .wrap_err("server error")?;
    info!("Shutting down...");
    background.shutdown().await;

    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => {}
        Err(err) => {
            eprintln!("Unable to listen for shutdown signal: {}", err);
            std::process::exit(1);
            // we also shut down in case of error
        }
    }
}
