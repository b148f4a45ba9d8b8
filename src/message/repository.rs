use diesel::ExpressionMethods;
use diesel::QueryDsl;
use diesel::RunQueryDsl;
use diesel::SelectableHelper;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

use crate::chat;
use crate::integration::db::Pool;
use crate::schema::{messages, users};

use super::Error;
use super::model::{Authored, Message, NewMessage};

pub trait MessageRepository {
    /// Appends to the chat log. The server assigns id and timestamp.
    fn append(&self, msg: &NewMessage) -> super::Result<Message>;

    /// Whole chat log in ascending `(created_at, id)` order.
    fn list_by_chat(&self, chat: chat::Id) -> super::Result<Vec<Authored>>;
}

pub struct PgMessageRepository {
    pool: Pool,
}

impl PgMessageRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

impl MessageRepository for PgMessageRepository {
    fn append(&self, msg: &NewMessage) -> super::Result<Message> {
        let mut conn = self.pool.get()?;

        diesel::insert_into(messages::table)
            .values(msg)
            .returning(Message::as_returning())
            .get_result(&mut conn)
            .map_err(|e| match e {
                DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                    Error::ChatNotFound(msg.chat_id())
                }
                e => e.into(),
            })
    }

    fn list_by_chat(&self, chat: chat::Id) -> super::Result<Vec<Authored>> {
        let mut conn = self.pool.get()?;

        let rows = messages::table
            .inner_join(users::table)
            .filter(messages::chat_id.eq(chat))
            .order((messages::created_at.asc(), messages::id.asc()))
            .select((Message::as_select(), users::username, users::avatar))
            .load::<(Message, String, Option<String>)>(&mut conn)?;

        Ok(rows.into_iter().map(Authored::from).collect())
    }
}

#[cfg(test)]
mod test {
    use testcontainers_modules::{postgres::Postgres, testcontainers::runners::AsyncRunner};

    use crate::chat::repository::{ChatRepository, PgChatRepository};
    use crate::integration::db;
    use crate::message::Content;
    use crate::user::{
        self,
        model::NewUser,
        repository::{PgUserRepository, UserRepository},
    };

    use super::*;

    fn seed(pool: &Pool) -> (user::Id, user::Id, chat::Id) {
        let users = PgUserRepository::new(pool.clone());
        let jora = users.insert(&NewUser::new("jora", "hash")).unwrap();
        let valera = users.insert(&NewUser::new("valera", "hash")).unwrap();
        let chat = PgChatRepository::new(pool.clone())
            .create_direct(jora, valera)
            .unwrap();
        (jora, valera, chat)
    }

    #[tokio::test]
    async fn should_append_and_list_in_order() {
        let node = Postgres::default().start().await.unwrap();
        let pool = db::Config::test(&node).await.init().unwrap();
        let repo = PgMessageRepository::new(pool.clone());
        let (jora, valera, chat) = seed(&pool);

        let hi = Content::text("hi").unwrap();
        let hello = Content::text("hello").unwrap();
        let first = repo.append(&NewMessage::new(chat, jora, &hi)).unwrap();
        let last = repo.append(&NewMessage::new(chat, valera, &hello)).unwrap();

        let log = repo.list_by_chat(chat).unwrap();

        assert_eq!(log.len(), 2);
        assert_eq!(log[0].message, first);
        assert_eq!(log[1].message, last);
        assert_eq!(log[1].username, "valera");
        assert!(last.created_at() >= first.created_at());
    }

    #[tokio::test]
    async fn should_store_image_marker() {
        let node = Postgres::default().start().await.unwrap();
        let pool = db::Config::test(&node).await.init().unwrap();
        let repo = PgMessageRepository::new(pool.clone());
        let (jora, _, chat) = seed(&pool);

        let image = Content::image("/uploads/cat.png");
        let msg = repo.append(&NewMessage::new(chat, jora, &image)).unwrap();

        assert!(msg.is_image());
        assert_eq!(msg.message(), "/uploads/cat.png");
        assert_eq!(msg.chat_id(), chat);
        assert_eq!(msg.user_id(), jora);
    }

    #[tokio::test]
    async fn should_not_append_to_missing_chat() {
        let node = Postgres::default().start().await.unwrap();
        let pool = db::Config::test(&node).await.init().unwrap();
        let repo = PgMessageRepository::new(pool.clone());
        let (jora, _, _) = seed(&pool);

        let missing = chat::Id::from(404);
        let text = Content::text("anyone?").unwrap();
        let result = repo.append(&NewMessage::new(missing, jora, &text));

        assert!(matches!(result, Err(Error::ChatNotFound(id)) if id == missing));
    }

    #[tokio::test]
    async fn should_list_nothing_for_empty_chat() {
        let node = Postgres::default().start().await.unwrap();
        let pool = db::Config::test(&node).await.init().unwrap();
        let repo = PgMessageRepository::new(pool.clone());
        let (_, _, chat) = seed(&pool);

        assert!(repo.list_by_chat(chat).unwrap().is_empty());
    }
}
