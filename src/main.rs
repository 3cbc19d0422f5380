use std::{future::IntoFuture, process, sync::Arc};

use lekha::{
    application::{
        analytics::AnalyticsService,
        auth::{AuthService, BootstrapCredentials, TokenIssuer},
        categories::CategoryService,
        comments::CommentService,
        completion::CompletionClient,
        error::AppError,
        generation::GenerationService,
        media::MediaService,
        newsletter::NewsletterService,
        posts::PostService,
        repos::{
            AdminsRepo, AnalyticsRepo, CategoriesRepo, CommentsRepo, HealthRepo, MediaRepo,
            NewsletterRepo, PostsRepo, PostsWriteRepo,
        },
    },
    config,
    infra::{
        completion::OpenRouterClient,
        db::PostgresRepositories,
        error::InfraError,
        http::{self, ApiState},
        telemetry,
    },
};
use tokio::sync::Notify;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    info!(
        target = "lekha::migrate",
        "database migrations are up to date"
    );
    repositories.pool().close().await;
    Ok(())
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    if settings.auth.jwt_secret_ephemeral {
        warn!(
            target = "lekha::auth",
            "no JWT secret configured; using a random per-process secret, issued tokens will not survive a restart"
        );
    }

    let repositories = init_repositories(&settings).await?;
    let state = build_api_state(repositories, &settings)?;
    serve_http(&settings, state).await
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings.database.url.as_deref().ok_or_else(|| {
        AppError::validation(
            "database url is required (provide --database-url or set LEKHA_DATABASE__URL)",
        )
    })?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

fn build_api_state(
    repositories: Arc<PostgresRepositories>,
    settings: &config::Settings,
) -> Result<ApiState, AppError> {
    let admins_repo: Arc<dyn AdminsRepo> = repositories.clone();
    let posts_repo: Arc<dyn PostsRepo> = repositories.clone();
    let posts_write_repo: Arc<dyn PostsWriteRepo> = repositories.clone();
    let comments_repo: Arc<dyn CommentsRepo> = repositories.clone();
    let newsletter_repo: Arc<dyn NewsletterRepo> = repositories.clone();
    let categories_repo: Arc<dyn CategoriesRepo> = repositories.clone();
    let media_repo: Arc<dyn MediaRepo> = repositories.clone();
    let analytics_repo: Arc<dyn AnalyticsRepo> = repositories.clone();
    let health_repo: Arc<dyn HealthRepo> = repositories;

    let token_ttl = time::Duration::try_from(settings.auth.token_ttl)
        .map_err(|err| AppError::validation(format!("token ttl out of range: {err}")))?;
    let tokens = Arc::new(TokenIssuer::new(
        settings.auth.jwt_secret.as_bytes(),
        token_ttl,
    ));
    let bootstrap = BootstrapCredentials {
        username: settings.auth.bootstrap_username.clone(),
        password: settings.auth.bootstrap_password.clone(),
    };

    let completion: Arc<dyn CompletionClient> =
        Arc::new(OpenRouterClient::new(&settings.completion).map_err(AppError::from)?);
    if settings.completion.api_key.is_none() {
        warn!(
            target = "lekha::completion",
            "no completion API key configured; AI generation endpoints will fail"
        );
    }

    Ok(ApiState {
        auth: Arc::new(AuthService::new(admins_repo, tokens, bootstrap)),
        comments: Arc::new(CommentService::new(comments_repo.clone())),
        newsletter: Arc::new(NewsletterService::new(newsletter_repo)),
        posts: Arc::new(PostService::new(
            posts_repo,
            posts_write_repo.clone(),
            comments_repo,
        )),
        analytics: Arc::new(AnalyticsService::new(analytics_repo)),
        generation: Arc::new(GenerationService::new(completion, posts_write_repo)),
        categories: Arc::new(CategoryService::new(categories_repo)),
        media: Arc::new(MediaService::new(media_repo)),
        health: health_repo,
    })
}

async fn serve_http(settings: &config::Settings, state: ApiState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(
        target = "lekha::http",
        addr = %settings.server.addr,
        "listening"
    );

    let shutdown = Arc::new(Notify::new());
    let signal = shutdown.clone();
    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async move {
            wait_for_ctrl_c().await;
            signal.notify_one();
        })
        .into_future();

    let grace = settings.server.graceful_shutdown;
    tokio::select! {
        result = server => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))?;
        }
        _ = async {
            shutdown.notified().await;
            tokio::time::sleep(grace).await;
        } => {
            warn!(
                target = "lekha::http",
                grace_seconds = grace.as_secs(),
                "graceful shutdown timed out; dropping open connections"
            );
        }
    }

    info!(target = "lekha::http", "server stopped");
    Ok(())
}

async fn wait_for_ctrl_c() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(
            target = "lekha::http",
            error = %err,
            "failed to listen for shutdown signal"
        );
        std::future::pending::<()>().await;
    }
    info!(target = "lekha::http", "shutdown signal received");
}
