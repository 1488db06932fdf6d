use std::sync::Arc;

use tracing::debug;

use shared_database::supabase::{StoreError, SupabaseClient};
use shared_models::user::UserProfile;

/// Public doctor directory backing the landing page.
pub struct DoctorDirectoryService {
    store: Arc<SupabaseClient>,
}

impl DoctorDirectoryService {
    pub fn new(store: Arc<SupabaseClient>) -> Self {
        Self { store }
    }

    /// Every registered doctor, as public profiles. The select list never
    /// touches the password column.
    pub async fn list_doctors(&self) -> Result<Vec<UserProfile>, StoreError> {
        debug!("Listing doctor directory");

        let path = "/rest/v1/users?role=eq.Doctor&select=id,name,email,role,specialization&order=name.asc";
        self.store.select(path).await
    }
}
