use diesel::RunQueryDsl;
use diesel::sql_types::Integer;

use crate::integration::db::Pool;
use crate::user;

use super::model::SummaryRow;

/// Every chat of the viewer with its peer, last message, unread count
/// and read flag, in one statement.
const SUMMARIES: &str = r#"
SELECT
    c.id AS chat_id,
    c.is_group_chat,
    c.title,
    c.group_avatar,
    me.is_favourite,
    peer.id AS peer_id,
    peer.username AS peer_username,
    peer.avatar AS peer_avatar,
    peer.is_online AS peer_online,
    lm.id AS last_id,
    lm.message AS last_message,
    lm.is_image AS last_is_image,
    lm.created_at AS last_created_at,
    sender.username AS last_sender,
    (
        SELECT COUNT(*)
        FROM messages m
        WHERE m.chat_id = c.id
          AND NOT EXISTS (
              SELECT 1 FROM read_receipts rr
              WHERE rr.message_id = m.id AND rr.user_id = $1
          )
    ) AS unread,
    EXISTS (
        SELECT 1 FROM read_receipts rr
        WHERE rr.message_id = lm.id AND rr.user_id = $1
    ) AS read_last
FROM chat_users me
JOIN chats c ON c.id = me.chat_id
LEFT JOIN LATERAL (
    SELECT u.id, u.username, u.avatar, u.is_online
    FROM chat_users other
    JOIN users u ON u.id = other.user_id
    WHERE other.chat_id = c.id
      AND other.user_id <> $1
      AND NOT c.is_group_chat
    ORDER BY other.added_at, other.user_id
    LIMIT 1
) peer ON TRUE
LEFT JOIN LATERAL (
    SELECT m.id, m.user_id, m.message, m.is_image, m.created_at
    FROM messages m
    WHERE m.chat_id = c.id
    ORDER BY m.created_at DESC, m.id DESC
    LIMIT 1
) lm ON TRUE
LEFT JOIN users sender ON sender.id = lm.user_id
WHERE me.user_id = $1
ORDER BY lm.created_at DESC NULLS LAST, lm.id DESC NULLS LAST, c.id ASC
"#;

pub trait ContactRepository {
    /// Chats with the most recent activity first; chats without messages last.
    fn find_summaries(&self, viewer: user::Id) -> super::Result<Vec<SummaryRow>>;
}

pub struct PgContactRepository {
    pool: Pool,
}

impl PgContactRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

impl ContactRepository for PgContactRepository {
    fn find_summaries(&self, viewer: user::Id) -> super::Result<Vec<SummaryRow>> {
        let mut conn = self.pool.get()?;

        let rows = diesel::sql_query(SUMMARIES)
            .bind::<Integer, _>(viewer)
            .load::<SummaryRow>(&mut conn)?;

        Ok(rows)
    }
}

#[cfg(test)]
mod test {
    use diesel::{ExpressionMethods, QueryDsl};
    use testcontainers_modules::{postgres::Postgres, testcontainers::runners::AsyncRunner};

    use crate::chat::{
        self,
        model::{MemberSignature, NewChat},
        repository::{ChatRepository, PgChatRepository},
    };
    use crate::integration::db;
    use crate::message::{
        self, Content,
        model::NewMessage,
        repository::{MessageRepository, PgMessageRepository},
    };
    use crate::receipt::repository::{PgReceiptRepository, ReceiptRepository};
    use crate::schema::{messages, read_receipts};
    use crate::user::{
        model::NewUser,
        repository::{PgUserRepository, UserRepository},
    };

    use super::*;

    struct Fixture {
        pool: Pool,
        jora: user::Id,
        valera: user::Id,
        igor: user::Id,
    }

    impl Fixture {
        fn new(pool: Pool) -> Self {
            let users = PgUserRepository::new(pool.clone());
            let jora = users.insert(&NewUser::new("jora", "hash")).unwrap();
            let valera = users.insert(&NewUser::new("valera", "hash")).unwrap();
            let igor = users.insert(&NewUser::new("igor", "hash")).unwrap();

            Self {
                pool,
                jora,
                valera,
                igor,
            }
        }

        fn direct(&self, a: user::Id, b: user::Id) -> chat::Id {
            PgChatRepository::new(self.pool.clone())
                .create_direct(a, b)
                .unwrap()
        }

        fn group(&self, members: &[user::Id]) -> chat::Id {
            let signature = MemberSignature::new(members.iter().copied());
            PgChatRepository::new(self.pool.clone())
                .create_group(&NewChat::group("trio", "desc", None), &signature)
                .unwrap()
        }

        fn say(&self, chat: chat::Id, author: user::Id, text: &str) -> message::Id {
            let content = Content::text(text).unwrap();
            PgMessageRepository::new(self.pool.clone())
                .append(&NewMessage::new(chat, author, &content))
                .unwrap()
                .id()
        }

        fn log(&self, chat: chat::Id) -> Vec<message::Id> {
            PgMessageRepository::new(self.pool.clone())
                .list_by_chat(chat)
                .unwrap()
                .iter()
                .map(|a| a.message.id())
                .collect()
        }

        fn read(&self, chat: chat::Id, viewer: user::Id) {
            PgReceiptRepository::new(self.pool.clone())
                .record_read_through(chat, viewer, &self.log(chat))
                .unwrap();
        }

        fn receipts(&self, chat: chat::Id, viewer: user::Id) -> i64 {
            read_receipts::table
                .inner_join(messages::table)
                .filter(messages::chat_id.eq(chat))
                .filter(read_receipts::user_id.eq(viewer))
                .count()
                .get_result::<i64>(&mut self.pool.get().unwrap())
                .unwrap()
        }
    }

    #[tokio::test]
    async fn should_summarize_empty_chat() {
        let node = Postgres::default().start().await.unwrap();
        let pool = db::Config::test(&node).await.init().unwrap();
        let f = Fixture::new(pool.clone());
        let repo = PgContactRepository::new(pool);

        let chat = f.direct(f.jora, f.valera);

        let rows = repo.find_summaries(f.jora).unwrap();

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.chat_id, chat);
        assert_eq!(row.peer_id, Some(f.valera));
        assert_eq!(row.peer_username.as_deref(), Some("valera"));
        assert_eq!(row.last_id, None);
        assert_eq!(row.unread, 0);
        assert!(!row.read_last);
    }

    #[tokio::test]
    async fn should_count_unread_until_read_through() {
        let node = Postgres::default().start().await.unwrap();
        let pool = db::Config::test(&node).await.init().unwrap();
        let f = Fixture::new(pool.clone());
        let repo = PgContactRepository::new(pool);

        let chat = f.direct(f.jora, f.valera);
        f.say(chat, f.jora, "one");
        f.say(chat, f.jora, "two");
        let last = f.say(chat, f.jora, "three");

        let row = &repo.find_summaries(f.valera).unwrap()[0];
        assert_eq!(row.unread, 3);
        assert_eq!(row.last_id, Some(last));
        assert_eq!(row.last_message.as_deref(), Some("three"));
        assert_eq!(row.last_sender.as_deref(), Some("jora"));
        assert!(!row.read_last);

        // authored messages are unread for the author too until they open the chat
        assert_eq!(repo.find_summaries(f.jora).unwrap()[0].unread, 3);

        f.read(chat, f.valera);

        let row = &repo.find_summaries(f.valera).unwrap()[0];
        assert_eq!(row.unread, 0);
        assert!(row.read_last);
    }

    #[tokio::test]
    async fn should_count_unread_as_messages_without_receipt() {
        let node = Postgres::default().start().await.unwrap();
        let pool = db::Config::test(&node).await.init().unwrap();
        let f = Fixture::new(pool.clone());
        let repo = PgContactRepository::new(pool);

        let pair = f.direct(f.jora, f.valera);
        let other = f.direct(f.valera, f.igor);
        let trio = f.group(&[f.jora, f.valera, f.igor]);

        f.say(pair, f.jora, "one");
        f.say(trio, f.igor, "two");
        f.read(pair, f.valera);
        f.say(pair, f.jora, "three");
        f.say(other, f.igor, "four");
        f.read(trio, f.jora);
        f.say(trio, f.valera, "five");
        f.say(trio, f.jora, "six");
        f.read(other, f.igor);
        f.say(pair, f.valera, "seven");
        f.read(trio, f.igor);
        f.say(other, f.valera, "eight");

        for viewer in [f.jora, f.valera, f.igor] {
            for row in repo.find_summaries(viewer).unwrap() {
                let total = f.log(row.chat_id).len() as i64;
                let expected = total - f.receipts(row.chat_id, viewer);
                assert_eq!(row.unread, expected, "chat {} viewer {viewer}", row.chat_id);
            }
        }

        let valera = repo.find_summaries(f.valera).unwrap();
        let unread = |id: chat::Id| valera.iter().find(|r| r.chat_id == id).unwrap().unread;
        assert_eq!(unread(pair), 2);
        assert_eq!(unread(other), 2);
        assert_eq!(unread(trio), 3);
    }

    #[tokio::test]
    async fn should_order_by_latest_activity() {
        let node = Postgres::default().start().await.unwrap();
        let pool = db::Config::test(&node).await.init().unwrap();
        let f = Fixture::new(pool.clone());
        let repo = PgContactRepository::new(pool);

        let quiet = f.direct(f.jora, f.igor);
        let older = f.direct(f.jora, f.valera);
        let newer = f.group(&[f.jora, f.valera, f.igor]);
        f.say(older, f.valera, "first");
        f.say(newer, f.igor, "second");

        let order = repo
            .find_summaries(f.jora)
            .unwrap()
            .into_iter()
            .map(|r| r.chat_id)
            .collect::<Vec<_>>();

        assert_eq!(order, vec![newer, older, quiet]);
    }

    #[tokio::test]
    async fn should_leave_group_peer_empty() {
        let node = Postgres::default().start().await.unwrap();
        let pool = db::Config::test(&node).await.init().unwrap();
        let f = Fixture::new(pool.clone());
        let repo = PgContactRepository::new(pool);

        f.group(&[f.jora, f.valera, f.igor]);

        let row = &repo.find_summaries(f.igor).unwrap()[0];
        assert!(row.is_group_chat);
        assert_eq!(row.title.as_deref(), Some("trio"));
        assert_eq!(row.peer_id, None);
    }

    #[tokio::test]
    async fn should_skip_chats_of_others() {
        let node = Postgres::default().start().await.unwrap();
        let pool = db::Config::test(&node).await.init().unwrap();
        let f = Fixture::new(pool.clone());
        let repo = PgContactRepository::new(pool);

        f.direct(f.jora, f.valera);

        assert!(repo.find_summaries(f.igor).unwrap().is_empty());
    }
}
