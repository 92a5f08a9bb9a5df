use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::WrapErr;
use health_learn::auth::SessionProvider;
use health_learn::catalog::{self, TopicInfo};
use health_learn::config::{Cli, Command};
use health_learn::models::{ContentType, Lesson};
use health_learn::progress::ProgressTracker;
use health_learn::query::{QueryFetcher, QueryState};
use health_learn::store::RecordStore;
use health_learn::{AppError, QuizRunner};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("health_learn=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let store = cli.store.build().wrap_err("could not open the record store")?;
    let session = cli.session.build();

    match cli.command {
        Command::Quiz { file, time_expiry } => {
            let runner = match file {
                Some(path) => QuizRunner::from_json(path, time_expiry.into())?,
                None => QuizRunner::builtin(time_expiry.into())?,
            };
            let quiz_id = runner.app().quiz().id.clone();

            if let Some(completion) = runner.run().await? {
                println!(
                    "Scored {}% ({}/{} correct)",
                    completion.score, completion.correct, completion.total
                );
                if session.current().is_some() {
                    let tracker = ProgressTracker::new(store, session);
                    if let Err(e) = tracker.record_quiz_score(&quiz_id, &completion).await {
                        warn!(error = %e, "could not save quiz score");
                    }
                }
            }
        }
        Command::Topics { limit } => {
            let topics = catalog::list_topics(store.as_ref(), limit).await?;
            if topics.is_empty() {
                println!("No topics yet.");
            }
            for topic in topics {
                println!(
                    "{:<20} {} ({} lessons, {} quizzes)",
                    topic.id, topic.title, topic.lessons, topic.quizzes
                );
                println!("{:<20} {}", "", topic.description);
            }

            let featured = catalog::featured_content(store.as_ref()).await?;
            if !featured.is_empty() {
                println!();
                println!("Recently added:");
                for lesson in featured {
                    println!("  [{}] {} ({})", lesson.content_type, lesson.title, lesson.topic_id);
                }
            }
        }
        Command::Lessons { topic, format } => show_lessons(store, session, &topic, format).await?,
        Command::Complete { content_id, format } => {
            ProgressTracker::new(store, session)
                .mark_completed(&content_id, format)
                .await?;
            println!("Marked {} as completed.", content_id);
        }
        Command::Progress { topic } => {
            let progress = ProgressTracker::new(store, session)
                .topic_progress(&topic)
                .await?;
            println!(
                "{}: {}/{} lessons ({}%)",
                TopicInfo::for_id(&topic).title,
                progress.completed,
                progress.total,
                progress.percent()
            );
        }
        Command::Dashboard => {
            let dashboard = session.dashboard().ok_or(AppError::NotSignedIn)?;
            println!("{}", dashboard.title());
            for section in dashboard.sections() {
                println!("  - {}", section);
            }
        }
    }

    Ok(())
}

async fn show_lessons(
    store: Arc<dyn RecordStore>,
    session: SessionProvider,
    topic: &str,
    format: Option<ContentType>,
) -> Result<(), AppError> {
    let request = catalog::topic_lessons_request(topic)?;
    let fetcher: QueryFetcher<Lesson> = QueryFetcher::new(Arc::clone(&store), session, request);
    fetcher.sync();

    match fetcher.settled().await {
        QueryState::Loading => return Err(AppError::NotSignedIn),
        QueryState::Error(message) => println!("Could not load lessons: {}", message),
        QueryState::Success(lessons) => {
            let shown = match format {
                Some(preference) => catalog::lessons_for(&lessons, preference),
                None => lessons.iter().collect(),
            };
            info!(topic, count = shown.len(), "lessons loaded");
            println!("{}", TopicInfo::for_id(topic).title);
            if shown.is_empty() {
                println!("  No lessons found.");
            }
            for lesson in shown {
                println!("  [{}] {:<12} {}", lesson.content_type, lesson.id, lesson.title);
            }
        }
    }

    let quizzes = catalog::topic_quizzes(store.as_ref(), topic).await?;
    if !quizzes.is_empty() {
        println!("Quizzes:");
        for quiz in quizzes {
            println!("  {:<20} {}", quiz.id, quiz.title);
        }
    }
    Ok(())
}
