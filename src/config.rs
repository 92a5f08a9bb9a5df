//! Command-line and environment configuration.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::{Identity, SessionProvider};
use crate::catalog::DEFAULT_TOPIC_LIMIT;
use crate::error::AppError;
use crate::models::{ContentType, Role};
use crate::quiz::ExpiryPolicy;
use crate::store::{MemoryStore, RecordStore, RestStore};

/// Collections the offline store starts with when no seed is given.
pub const COLLECTIONS: [&str; 4] = [
    "course_content",
    "assignments",
    "student_progress",
    "quiz_results",
];

/// Health education for learners, in the terminal.
#[derive(Parser, Debug)]
#[command(name = "health-learn", version, about)]
pub struct Cli {
    #[command(flatten)]
    pub store: StoreArgs,

    #[command(flatten)]
    pub session: SessionArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone, Default)]
pub struct StoreArgs {
    /// Project URL of the hosted record store. Without it an in-memory store
    /// is used.
    #[arg(long, global = true, env = "HEALTH_LEARN_STORE_URL")]
    pub store_url: Option<String>,

    /// Anonymous API key for the hosted store.
    #[arg(long, global = true, env = "HEALTH_LEARN_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Bearer token of a signed-in user.
    #[arg(long, global = true, env = "HEALTH_LEARN_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// JSON file seeding the in-memory store.
    #[arg(long, global = true, env = "HEALTH_LEARN_SEED")]
    pub seed: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct SessionArgs {
    /// Signed-in user. Reads that need a learner are skipped without one.
    #[arg(long, global = true, env = "HEALTH_LEARN_USER_ID")]
    pub user_id: Option<Uuid>,

    /// Role from the user's profile: student, teacher or parent.
    #[arg(long, global = true, env = "HEALTH_LEARN_ROLE")]
    pub role: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Take a timed quiz in the terminal
    Quiz {
        /// Quiz JSON file; the built-in nutrition quiz when omitted
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// What happens when the clock runs out
        #[arg(long, value_enum, default_value_t = TimeExpiry::AutoComplete)]
        time_expiry: TimeExpiry,
    },

    /// List topics with their lesson and quiz counts
    Topics {
        /// Maximum number of lesson rows to scan
        #[arg(short, long, default_value_t = DEFAULT_TOPIC_LIMIT)]
        limit: usize,
    },

    /// Show the lessons of a topic
    Lessons {
        topic: String,

        /// Only lessons in this format (video or text)
        #[arg(long)]
        format: Option<ContentType>,
    },

    /// Mark a lesson as completed
    Complete {
        content_id: String,

        /// Format the lesson was followed in
        #[arg(long, default_value_t = ContentType::Text)]
        format: ContentType,
    },

    /// Show completed lessons for a topic
    Progress { topic: String },

    /// Show the landing view for the signed-in role
    Dashboard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TimeExpiry {
    /// End the attempt and score it
    AutoComplete,
    /// Stop the clock at zero and let the learner finish
    KeepOpen,
}

impl From<TimeExpiry> for ExpiryPolicy {
    fn from(value: TimeExpiry) -> Self {
        match value {
            TimeExpiry::AutoComplete => ExpiryPolicy::AutoComplete,
            TimeExpiry::KeepOpen => ExpiryPolicy::KeepOpen,
        }
    }
}

impl StoreArgs {
    /// The hosted store when a URL is configured, otherwise an in-memory one.
    pub fn build(&self) -> Result<Arc<dyn RecordStore>, AppError> {
        if let Some(url) = &self.store_url {
            info!(url = %url, "using hosted record store");
            let mut store = RestStore::new(url.as_str(), self.api_key.clone().unwrap_or_default());
            if let Some(token) = &self.access_token {
                store = store.with_access_token(token.as_str());
            }
            return Ok(Arc::new(store));
        }

        let store = match &self.seed {
            Some(path) => {
                debug!(path = %path.display(), "seeding in-memory store");
                MemoryStore::from_path(path)?
            }
            None => MemoryStore::with_collections(COLLECTIONS),
        };
        Ok(Arc::new(store))
    }
}

impl SessionArgs {
    pub fn build(&self) -> SessionProvider {
        match self.user_id {
            Some(id) => {
                let role = Role::from_metadata(self.role.as_deref());
                SessionProvider::signed_in(Identity::new(id, role))
            }
            None => SessionProvider::new(),
        }
    }
}
