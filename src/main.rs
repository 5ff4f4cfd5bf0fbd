use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use interview_coach::{create_router, practice, AppState, Config, InterviewCoach, StartInterview};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "interview-coach", version, about = "Voice mock-interview coach")]
struct Cli {
    /// Configuration file (extension optional)
    #[arg(long, default_value = "config/interview-coach")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API (and the web client, if a static directory is configured)
    Serve,

    /// Practice in the terminal; press Enter to finish each answer
    Practice {
        /// Job role to interview for
        #[arg(long)]
        job: String,

        /// Number of questions (defaults to the configured value)
        #[arg(long)]
        questions: Option<usize>,

        /// Interviewer name
        #[arg(long)]
        interviewer: Option<String>,

        /// Interviewer voice (alloy, echo, fable, onyx, nova, shimmer)
        #[arg(long)]
        voice: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));
    info!("Recordings: {}", cfg.audio.recordings_dir().display());

    let coach = Arc::new(InterviewCoach::from_config(&cfg)?);

    match cli.command {
        Command::Serve => serve(&cfg, coach).await,
        Command::Practice {
            job,
            questions,
            interviewer,
            voice,
        } => {
            let request = StartInterview {
                job,
                num_questions: questions,
                interviewer_name: interviewer,
                interviewer_voice: voice,
            };
            practice::run(&coach, request).await
        }
    }
}

async fn serve(cfg: &Config, coach: Arc<InterviewCoach>) -> Result<()> {
    let static_dir = cfg.service.http.static_dir.as_ref().map(PathBuf::from);
    if let Some(dir) = &static_dir {
        info!("Serving web client from {}", dir.display());
    }

    let app = create_router(AppState::new(coach), static_dir.as_deref());

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app).await.context("HTTP server failed")?;

    Ok(())
}
