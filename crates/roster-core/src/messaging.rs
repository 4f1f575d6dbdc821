use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use roster_db::queries::{messages, users};
use roster_types::models::{InboxStatus, Message, User};

use crate::Roster;
use crate::error::{Result, RosterError};

impl Roster {
    pub fn send_message(&self, from_user_id: Uuid, to_user_id: Option<Uuid>, text: &str) -> Result<Uuid> {
        let to_user_id = to_user_id.ok_or_else(|| RosterError::validation("missing recipient"))?;
        if text.trim().is_empty() {
            return Err(RosterError::validation("missing message"));
        }

        let id = Uuid::new_v4();
        self.db.with_conn(|conn| -> Result<()> {
            if users::account_of(conn, to_user_id)?.is_none() {
                return Err(RosterError::not_found("user", to_user_id));
            }
            messages::insert(conn, id, from_user_id, to_user_id, text, Utc::now())?;
            Ok(())
        })?;
        debug!("Message({}) sent from user({}) to user({})", id, from_user_id, to_user_id);
        Ok(id)
    }

    /// Messages addressed to `user_id`, oldest first. `status` is `read`,
    /// `unread` or empty for all.
    pub fn inbox(&self, user_id: Uuid, status: &str, limit: u32) -> Result<Vec<Message>> {
        let status: InboxStatus = status.parse().map_err(RosterError::Validation)?;
        Ok(self
            .db
            .with_conn(|conn| messages::inbox(conn, user_id, status, limit))?)
    }

    /// Visible to its sender and its recipient.
    pub fn get_message(&self, actor: &User, id: Uuid) -> Result<Message> {
        let message = self.load_message(id)?;
        if message.from_user_id != actor.id && message.to_user_id != actor.id {
            return Err(RosterError::unauthorized("not your message"));
        }
        Ok(message)
    }

    /// Sets or clears the read timestamp. Recipient only.
    pub fn mark_read(&self, actor: &User, id: Uuid, read: bool) -> Result<Message> {
        let mut message = self.load_message(id)?;
        if message.to_user_id != actor.id {
            return Err(RosterError::unauthorized("message was not sent to you"));
        }
        let time_read = read.then(Utc::now);
        self.db
            .with_conn(|conn| messages::set_read(conn, id, time_read))?;
        message.time_read = time_read;
        Ok(message)
    }

    /// Recipient only.
    pub fn del_message(&self, actor: &User, id: Uuid) -> Result<()> {
        let message = self.load_message(id)?;
        if message.to_user_id != actor.id {
            return Err(RosterError::unauthorized("message was not sent to you"));
        }
        self.db.with_conn(|conn| messages::delete(conn, id))?;
        info!("Message({}) deleted by user({})", id, actor.id);
        Ok(())
    }

    fn load_message(&self, id: Uuid) -> Result<Message> {
        self.db
            .with_conn(|conn| messages::get(conn, id))?
            .ok_or_else(|| RosterError::not_found("message", id))
    }
}
