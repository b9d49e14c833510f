use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use live_interview::{
    create_router, AppState, CannedEvaluator, Config, ConsoleView, HttpQuestionService,
    QuestionReply, RecordingOutcome, ReplayCapture, ReplayConfig, ScriptedFaceMonitor,
    SessionConfig, SessionController,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "live-interview", version, about = "Live video interview session controller")]
struct Cli {
    /// Config file, without extension
    #[arg(long, default_value = "config/live-interview")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the canned rehearsal interview over HTTP
    Serve,

    /// Answer every question from the terminal
    Interview {
        /// Backend URL (defaults to interview.base_url)
        #[arg(long)]
        base_url: Option<String>,

        /// Pre-recorded media replayed as the camera
        #[arg(long)]
        media: PathBuf,

        /// Face counts reported by the detector, e.g. "1,1,0" (`e` = failed sample)
        #[arg(long, default_value = "1")]
        faces: String,

        /// Seconds to record per answer
        #[arg(long, default_value_t = 5)]
        answer_secs: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Serve => serve(&cfg).await,
        Command::Interview {
            base_url,
            media,
            faces,
            answer_secs,
        } => {
            let base_url = base_url.unwrap_or_else(|| cfg.interview.base_url.clone());
            interview(&cfg, &base_url, media, &faces, Duration::from_secs(answer_secs)).await
        }
    }
}

async fn serve(cfg: &Config) -> Result<()> {
    let evaluator = Arc::new(CannedEvaluator::new(
        cfg.rehearsal.transcript.clone(),
        cfg.rehearsal.feedback.clone(),
    ));
    let state = AppState::new(cfg.rehearsal.questions.clone(), evaluator);
    let app = create_router(state);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!(
        "Rehearsal server on {} ({} questions)",
        addr,
        cfg.rehearsal.questions.len()
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await
        .context("HTTP server failed")?;

    Ok(())
}

async fn interview(
    cfg: &Config,
    base_url: &str,
    media: PathBuf,
    faces: &str,
    answer_length: Duration,
) -> Result<()> {
    let questions = Arc::new(HttpQuestionService::new(
        base_url,
        Duration::from_secs(cfg.interview.request_timeout_secs),
    )?);
    // Backends without a start endpoint keep whatever interview they have
    if let Err(e) = questions.start_interview().await {
        warn!("Could not start a fresh interview: {}", e);
    }

    let capture = Arc::new(ReplayCapture::new(ReplayConfig::new(media)));
    let monitor = Arc::new(ScriptedFaceMonitor::parse(faces)?);

    let mut controller = SessionController::new(
        SessionConfig::from(&cfg.interview),
        capture,
        questions,
        Arc::new(ConsoleView::new()),
    );

    controller.load_detector(monitor).await;

    if !matches!(
        controller.load_current_question().await,
        Ok(QuestionReply::Question(_))
    ) {
        return Ok(());
    }

    loop {
        if let Err(e) = controller.start().await {
            warn!("Could not start recording: {}", e);
            break;
        }

        let outcome = controller
            .run_recording(tokio::time::sleep(answer_length))
            .await?;
        if let RecordingOutcome::Terminated(reason) = outcome {
            info!("Interview terminated: {:?}", reason);
            break;
        }

        match controller.next_question().await {
            Ok(QuestionReply::Question(_)) => continue,
            Ok(QuestionReply::End) => {
                controller.end_interview().await;
                break;
            }
            Ok(QuestionReply::Rejected(_)) | Err(_) => break,
        }
    }

    let stats = controller.stats();
    info!("Finished in state {:?}", stats.state);

    Ok(())
}
