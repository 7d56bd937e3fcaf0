//! Profiling level control.

use mongodb::bson::doc;

use crate::connection::ConnectionProvider;
use crate::error::Result;
use crate::models::profile::read_i64;
use crate::models::{ProfileLevel, ProfileLevelAck, ProfileStatus};

impl ConnectionProvider {
    /// Current profiling level and slow-operation threshold (`{ profile: -1 }`).
    pub async fn profile_status(&self) -> Result<ProfileStatus> {
        let conn = self.control_connection();
        let reply = conn.run_command(doc! { "profile": -1 }).await?;
        Ok(ProfileStatus::from_document(reply))
    }

    /// Change the server-wide profiling level. Affects every client of the database.
    pub async fn set_profile_level(&self, level: i64) -> Result<ProfileLevelAck> {
        let level = ProfileLevel::try_from(level)?;
        let conn = self.control_connection();
        let reply = conn.run_command(doc! { "profile": level.as_i32() }).await?;
        log::info!("Profiling level on '{}' set to {}", conn.name(), level.as_i32());

        Ok(ProfileLevelAck {
            level,
            previous_level: read_i64(&reply, "was"),
            slowms: read_i64(&reply, "slowms"),
        })
    }
}
