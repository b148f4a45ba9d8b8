use diesel::Connection;
use diesel::ExpressionMethods;
use diesel::OptionalExtension;
use diesel::QueryDsl;
use diesel::RunQueryDsl;
use diesel::SelectableHelper;
use diesel::dsl::exists;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

use crate::integration::db::Pool;
use crate::schema::{chat_users, chats, users};

use super::Error;
use super::model::{NewUser, User};
use super::{Bio, Id, Username};

pub trait UserRepository {
    fn insert(&self, user: &NewUser) -> super::Result<Id>;

    fn find_by_id(&self, id: Id) -> super::Result<User>;

    fn find_by_username(&self, username: &str) -> super::Result<Option<User>>;

    fn find_by_ids(&self, ids: &[Id]) -> super::Result<Vec<User>>;

    fn find_all_except(&self, id: Id) -> super::Result<Vec<User>>;

    fn exists(&self, id: Id) -> super::Result<bool>;

    fn update_bio(&self, id: Id, bio: &Bio) -> super::Result<()>;

    fn update_username(&self, id: Id, username: &Username) -> super::Result<()>;

    fn update_avatar(&self, id: Id, avatar: Option<&str>) -> super::Result<()>;

    fn update_password(&self, id: Id, hash: &str) -> super::Result<()>;

    fn set_online(&self, id: Id, online: bool) -> super::Result<()>;

    /// Removes the user together with their direct chats.
    fn delete(&self, id: Id) -> super::Result<()>;
}

pub struct PgUserRepository {
    pool: Pool,
}

impl PgUserRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

impl UserRepository for PgUserRepository {
    fn insert(&self, u: &NewUser) -> super::Result<Id> {
        let mut conn = self.pool.get()?;

        let id = diesel::insert_into(users::table)
            .values(u)
            .returning(users::id)
            .get_result::<Id>(&mut conn)
            .map_err(username_taken)?;

        Ok(id)
    }

    fn find_by_id(&self, id: Id) -> super::Result<User> {
        let mut conn = self.pool.get()?;

        users::table
            .find(id)
            .select(User::as_select())
            .first(&mut conn)
            .optional()?
            .ok_or(Error::NotFound(id))
    }

    fn find_by_username(&self, username: &str) -> super::Result<Option<User>> {
        let mut conn = self.pool.get()?;

        let u = users::table
            .filter(users::username.eq(username))
            .select(User::as_select())
            .first(&mut conn)
            .optional()?;

        Ok(u)
    }

    fn find_by_ids(&self, ids: &[Id]) -> super::Result<Vec<User>> {
        let mut conn = self.pool.get()?;

        let users = users::table
            .filter(users::id.eq_any(ids))
            .order(users::id.asc())
            .select(User::as_select())
            .load(&mut conn)?;

        Ok(users)
    }

    fn find_all_except(&self, id: Id) -> super::Result<Vec<User>> {
        let mut conn = self.pool.get()?;

        let users = users::table
            .filter(users::id.ne(id))
            .order(users::username.asc())
            .select(User::as_select())
            .load(&mut conn)?;

        Ok(users)
    }

    fn exists(&self, id: Id) -> super::Result<bool> {
        let mut conn = self.pool.get()?;

        let found = diesel::select(exists(users::table.find(id))).get_result::<bool>(&mut conn)?;

        Ok(found)
    }

    fn update_bio(&self, id: Id, bio: &Bio) -> super::Result<()> {
        let mut conn = self.pool.get()?;

        let updated = diesel::update(users::table.find(id))
            .set(users::bio.eq(bio.as_str()))
            .execute(&mut conn)?;

        affected(id, updated)
    }

    fn update_username(&self, id: Id, username: &Username) -> super::Result<()> {
        let mut conn = self.pool.get()?;

        let updated = diesel::update(users::table.find(id))
            .set(users::username.eq(username.as_str()))
            .execute(&mut conn)
            .map_err(username_taken)?;

        affected(id, updated)
    }

    fn update_avatar(&self, id: Id, avatar: Option<&str>) -> super::Result<()> {
        let mut conn = self.pool.get()?;

        let updated = diesel::update(users::table.find(id))
            .set(users::avatar.eq(avatar))
            .execute(&mut conn)?;

        affected(id, updated)
    }

    fn update_password(&self, id: Id, hash: &str) -> super::Result<()> {
        let mut conn = self.pool.get()?;

        let updated = diesel::update(users::table.find(id))
            .set(users::password.eq(hash))
            .execute(&mut conn)?;

        affected(id, updated)
    }

    fn set_online(&self, id: Id, online: bool) -> super::Result<()> {
        let mut conn = self.pool.get()?;

        let updated = diesel::update(users::table.find(id))
            .set(users::is_online.eq(online))
            .execute(&mut conn)?;

        affected(id, updated)
    }

    fn delete(&self, id: Id) -> super::Result<()> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, Error, _>(|conn| {
            let memberships = chat_users::table
                .filter(chat_users::user_id.eq(id))
                .select(chat_users::chat_id);

            diesel::delete(
                chats::table
                    .filter(chats::is_group_chat.eq(false))
                    .filter(chats::id.eq_any(memberships)),
            )
            .execute(conn)?;

            let deleted = diesel::delete(users::table.find(id)).execute(conn)?;
            affected(id, deleted)
        })
    }
}

fn affected(id: Id, rows: usize) -> super::Result<()> {
    if rows == 0 {
        return Err(Error::NotFound(id));
    }
    Ok(())
}

fn username_taken(e: DieselError) -> Error {
    match e {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => Error::UsernameTaken,
        e => e.into(),
    }
}
