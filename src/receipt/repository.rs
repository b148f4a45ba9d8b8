use std::collections::HashMap;

use chrono::NaiveDateTime;
use diesel::ExpressionMethods;
use diesel::QueryDsl;
use diesel::RunQueryDsl;
use diesel::sql_types::{Array, Integer};

use crate::integration::db::Pool;
use crate::schema::{read_receipts, users};
use crate::{chat, message, user};

use super::model::Reader;

const READ_THROUGH: &str = r#"
    INSERT INTO read_receipts (message_id, user_id)
    SELECT m.id, $2
    FROM messages m
    WHERE m.chat_id = $1 AND m.id = ANY($3)
    ON CONFLICT (message_id, user_id) DO NOTHING
"#;

pub trait ReceiptRepository {
    /// Covers the listed messages of the chat with a receipt for `viewer`.
    /// `shown` is the chat log as the viewer got it, so messages appended
    /// after the listing stay unread. Returns the number of receipts created.
    fn record_read_through(
        &self,
        chat: chat::Id,
        viewer: user::Id,
        shown: &[message::Id],
    ) -> super::Result<usize>;

    fn find_by_messages(
        &self,
        ids: &[message::Id],
    ) -> super::Result<HashMap<message::Id, Vec<Reader>>>;
}

pub struct PgReceiptRepository {
    pool: Pool,
}

impl PgReceiptRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

impl ReceiptRepository for PgReceiptRepository {
    fn record_read_through(
        &self,
        chat: chat::Id,
        viewer: user::Id,
        shown: &[message::Id],
    ) -> super::Result<usize> {
        if shown.is_empty() {
            return Ok(0);
        }

        let mut conn = self.pool.get()?;
        let shown = shown.iter().map(message::Id::get).collect::<Vec<_>>();

        // single statement, the primary key absorbs concurrent duplicates
        let created = diesel::sql_query(READ_THROUGH)
            .bind::<Integer, _>(chat)
            .bind::<Integer, _>(viewer)
            .bind::<Array<Integer>, _>(shown)
            .execute(&mut conn)?;

        Ok(created)
    }

    fn find_by_messages(
        &self,
        ids: &[message::Id],
    ) -> super::Result<HashMap<message::Id, Vec<Reader>>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut conn = self.pool.get()?;

        let rows = read_receipts::table
            .inner_join(users::table)
            .filter(read_receipts::message_id.eq_any(ids))
            .order((
                read_receipts::message_id.asc(),
                read_receipts::read_at.asc(),
                users::username.asc(),
            ))
            .select((read_receipts::message_id, users::username, read_receipts::read_at))
            .load::<(message::Id, String, NaiveDateTime)>(&mut conn)?;

        let mut readers: HashMap<message::Id, Vec<Reader>> = HashMap::new();
        for (message_id, username, read_at) in rows {
            readers
                .entry(message_id)
                .or_default()
                .push(Reader { username, read_at });
        }

        Ok(readers)
    }
}
