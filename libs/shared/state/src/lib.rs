use std::sync::Arc;

use notification_cell::MailerClient;
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

/// Shared handles for every workflow: configuration, the store client, and
/// the mail gateway client. Built once at process start; request handlers
/// receive it as `Arc<AppState>` instead of constructing their own
/// connections.
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<SupabaseClient>,
    pub mailer: Arc<MailerClient>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let store = Arc::new(SupabaseClient::new(&config));
        let mailer = Arc::new(MailerClient::new(&config));

        Self {
            config,
            store,
            mailer,
        }
    }
}
