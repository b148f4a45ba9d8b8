use std::collections::HashMap;

use diesel::Connection;
use diesel::ExpressionMethods;
use diesel::OptionalExtension;
use diesel::PgConnection;
use diesel::QueryDsl;
use diesel::QueryableByName;
use diesel::RunQueryDsl;
use diesel::SelectableHelper;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sql_types::{Array, Integer};
use log::debug;

use crate::integration::db::Pool;
use crate::schema::{chat_users, chats, users};
use crate::user;

use super::Error;
use super::Id;
use super::model::{Chat, DirectKey, Member, MemberSignature, Membership, NewChat, NewMember};

const GROUP_WITH_MEMBERS: &str = r#"
    SELECT c.id
    FROM chats c
    JOIN chat_users cu ON cu.chat_id = c.id
    WHERE c.is_group_chat
    GROUP BY c.id
    HAVING array_agg(cu.user_id ORDER BY cu.user_id) = $1
    LIMIT 1
"#;

const SERIALIZABLE_ATTEMPTS: usize = 5;

pub trait ChatRepository {
    fn find_by_id(&self, id: Id) -> super::Result<Chat>;

    fn find_membership(&self, id: Id, user: user::Id) -> super::Result<Option<Membership>>;

    fn find_direct(&self, a: user::Id, b: user::Id) -> super::Result<Option<Id>>;

    fn create_direct(&self, a: user::Id, b: user::Id) -> super::Result<Id>;

    fn create_group(&self, chat: &NewChat, members: &MemberSignature) -> super::Result<Id>;

    fn add_members(&self, id: Id, users: &[user::Id]) -> super::Result<usize>;

    fn remove_member(&self, id: Id, user: user::Id) -> super::Result<bool>;

    fn find_members(&self, id: Id) -> super::Result<Vec<Member>>;

    fn find_member_names(&self, ids: &[Id]) -> super::Result<HashMap<Id, Vec<String>>>;

    fn find_shared_groups(&self, a: user::Id, b: user::Id) -> super::Result<Vec<Chat>>;

    fn set_favourite(&self, id: Id, user: user::Id, favourite: bool) -> super::Result<bool>;

    fn update_title(&self, id: Id, title: &str) -> super::Result<()>;

    fn update_description(&self, id: Id, description: &str) -> super::Result<()>;

    fn update_avatar(&self, id: Id, avatar: Option<&str>) -> super::Result<()>;

    fn delete(&self, id: Id) -> super::Result<()>;
}

pub struct PgChatRepository {
    pool: Pool,
}

impl PgChatRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

impl ChatRepository for PgChatRepository {
    fn find_by_id(&self, id: Id) -> super::Result<Chat> {
        let mut conn = self.pool.get()?;

        chats::table
            .find(id)
            .select(Chat::as_select())
            .first(&mut conn)
            .optional()?
            .ok_or(Error::NotFound(id))
    }

    fn find_membership(&self, id: Id, user: user::Id) -> super::Result<Option<Membership>> {
        let mut conn = self.pool.get()?;

        let m = chat_users::table
            .find((id, user))
            .select(Membership::as_select())
            .first(&mut conn)
            .optional()?;

        Ok(m)
    }

    fn find_direct(&self, a: user::Id, b: user::Id) -> super::Result<Option<Id>> {
        let mut conn = self.pool.get()?;
        let key = DirectKey::new(a, b);

        let id = chats::table
            .filter(chats::direct_key.eq(key.as_str()))
            .select(chats::id)
            .first::<Id>(&mut conn)
            .optional()?;

        Ok(id)
    }

    fn create_direct(&self, a: user::Id, b: user::Id) -> super::Result<Id> {
        let mut conn = self.pool.get()?;
        let key = DirectKey::new(a, b);

        conn.transaction::<_, Error, _>(|conn| {
            ensure_users_exist(conn, &[a, b])?;

            let created = diesel::insert_into(chats::table)
                .values(NewChat::direct(&key))
                .on_conflict(chats::direct_key)
                .do_nothing()
                .returning(chats::id)
                .get_result::<Id>(conn)
                .optional()?;

            match created {
                Some(id) => {
                    diesel::insert_into(chat_users::table)
                        .values(&vec![NewMember::new(id, a), NewMember::new(id, b)])
                        .execute(conn)?;
                    Ok(id)
                }
                // lost the race, the winner's chat is committed by now
                None => {
                    let id = chats::table
                        .filter(chats::direct_key.eq(key.as_str()))
                        .select(chats::id)
                        .first::<Id>(conn)?;
                    Ok(id)
                }
            }
        })
    }

    fn create_group(&self, chat: &NewChat, members: &MemberSignature) -> super::Result<Id> {
        let mut conn = self.pool.get()?;

        serializable(&mut conn, |conn| {
            ensure_users_exist(conn, members.ids())?;

            if find_group_with_members(conn, members)?.is_some() {
                return Err(Error::AlreadyExists);
            }

            let id = diesel::insert_into(chats::table)
                .values(chat)
                .returning(chats::id)
                .get_result::<Id>(conn)?;

            let rows = members
                .ids()
                .iter()
                .map(|u| NewMember::new(id, *u))
                .collect::<Vec<_>>();

            diesel::insert_into(chat_users::table)
                .values(&rows)
                .execute(conn)?;

            Ok(id)
        })
    }

    fn add_members(&self, id: Id, users: &[user::Id]) -> super::Result<usize> {
        let mut conn = self.pool.get()?;

        serializable(&mut conn, |conn| {
            let current = chat_users::table
                .filter(chat_users::chat_id.eq(id))
                .select(chat_users::user_id)
                .load::<user::Id>(conn)?;

            let fresh =
                MemberSignature::new(users.iter().copied().filter(|u| !current.contains(u)));
            if fresh.is_empty() {
                return Err(Error::NoNewMembers);
            }

            ensure_users_exist(conn, fresh.ids())?;

            let combined = MemberSignature::new(current.iter().chain(fresh.ids()).copied());
            if find_group_with_members(conn, &combined)?.is_some() {
                return Err(Error::AlreadyExists);
            }

            let rows = fresh
                .ids()
                .iter()
                .map(|u| NewMember::new(id, *u))
                .collect::<Vec<_>>();

            let added = diesel::insert_into(chat_users::table)
                .values(&rows)
                .execute(conn)?;

            Ok(added)
        })
    }

    fn remove_member(&self, id: Id, user: user::Id) -> super::Result<bool> {
        let mut conn = self.pool.get()?;

        let deleted = diesel::delete(chat_users::table.find((id, user))).execute(&mut conn)?;

        Ok(deleted > 0)
    }

    fn find_members(&self, id: Id) -> super::Result<Vec<Member>> {
        let mut conn = self.pool.get()?;

        let members = chat_users::table
            .inner_join(users::table)
            .filter(chat_users::chat_id.eq(id))
            .order((chat_users::added_at.asc(), chat_users::user_id.asc()))
            .select((
                users::id,
                users::username,
                users::avatar,
                users::bio,
                users::is_online,
                chat_users::added_at,
            ))
            .load::<Member>(&mut conn)?;

        Ok(members)
    }

    fn find_member_names(&self, ids: &[Id]) -> super::Result<HashMap<Id, Vec<String>>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut conn = self.pool.get()?;

        let rows = chat_users::table
            .inner_join(users::table)
            .filter(chat_users::chat_id.eq_any(ids))
            .order((
                chat_users::chat_id.asc(),
                chat_users::added_at.asc(),
                chat_users::user_id.asc(),
            ))
            .select((chat_users::chat_id, users::username))
            .load::<(Id, String)>(&mut conn)?;

        let mut names: HashMap<Id, Vec<String>> = HashMap::new();
        for (chat_id, username) in rows {
            names.entry(chat_id).or_default().push(username);
        }

        Ok(names)
    }

    fn find_shared_groups(&self, a: user::Id, b: user::Id) -> super::Result<Vec<Chat>> {
        let mut conn = self.pool.get()?;

        let of_a = chat_users::table
            .filter(chat_users::user_id.eq(a))
            .select(chat_users::chat_id);
        let of_b = chat_users::table
            .filter(chat_users::user_id.eq(b))
            .select(chat_users::chat_id);

        let groups = chats::table
            .filter(chats::is_group_chat.eq(true))
            .filter(chats::id.eq_any(of_a))
            .filter(chats::id.eq_any(of_b))
            .order(chats::id.asc())
            .select(Chat::as_select())
            .load(&mut conn)?;

        Ok(groups)
    }

    fn set_favourite(&self, id: Id, user: user::Id, favourite: bool) -> super::Result<bool> {
        let mut conn = self.pool.get()?;

        let updated = diesel::update(chat_users::table.find((id, user)))
            .set(chat_users::is_favourite.eq(favourite))
            .execute(&mut conn)?;

        Ok(updated > 0)
    }

    fn update_title(&self, id: Id, title: &str) -> super::Result<()> {
        let mut conn = self.pool.get()?;

        diesel::update(chats::table.find(id))
            .set(chats::title.eq(title))
            .execute(&mut conn)?;

        Ok(())
    }

    fn update_description(&self, id: Id, description: &str) -> super::Result<()> {
        let mut conn = self.pool.get()?;

        diesel::update(chats::table.find(id))
            .set(chats::description.eq(description))
            .execute(&mut conn)?;

        Ok(())
    }

    fn update_avatar(&self, id: Id, avatar: Option<&str>) -> super::Result<()> {
        let mut conn = self.pool.get()?;

        diesel::update(chats::table.find(id))
            .set(chats::group_avatar.eq(avatar))
            .execute(&mut conn)?;

        Ok(())
    }

    fn delete(&self, id: Id) -> super::Result<()> {
        let mut conn = self.pool.get()?;

        let deleted = diesel::delete(chats::table.find(id)).execute(&mut conn)?;
        if deleted == 0 {
            return Err(Error::NotFound(id));
        }

        Ok(())
    }
}

#[derive(QueryableByName)]
struct ChatRow {
    #[diesel(sql_type = Integer)]
    id: Id,
}

fn find_group_with_members(
    conn: &mut PgConnection,
    members: &MemberSignature,
) -> super::Result<Option<Id>> {
    let row = diesel::sql_query(GROUP_WITH_MEMBERS)
        .bind::<Array<Integer>, _>(members.raw())
        .get_result::<ChatRow>(conn)
        .optional()?;

    Ok(row.map(|r| r.id))
}

fn ensure_users_exist(conn: &mut PgConnection, ids: &[user::Id]) -> super::Result<()> {
    let found = users::table
        .filter(users::id.eq_any(ids))
        .select(users::id)
        .load::<user::Id>(conn)?;

    match ids.iter().find(|id| !found.contains(id)) {
        Some(missing) => Err(Error::NonExistingUser(*missing)),
        None => Ok(()),
    }
}

/// Runs `f` in a serializable transaction, starting over when Postgres
/// aborts it because of a concurrent writer.
fn serializable<T>(
    conn: &mut PgConnection,
    f: impl Fn(&mut PgConnection) -> super::Result<T>,
) -> super::Result<T> {
    let mut attempt = 1;
    loop {
        let result = conn
            .build_transaction()
            .serializable()
            .run::<_, Error, _>(|conn| f(conn));

        match result {
            Err(Error::_Diesel(DieselError::DatabaseError(
                DatabaseErrorKind::SerializationFailure,
                _,
            ))) => {
                if attempt >= SERIALIZABLE_ATTEMPTS {
                    return Err(Error::Contention(attempt));
                }
                debug!("serialization failure on attempt {attempt}, retrying");
                attempt += 1;
            }
            result => return result,
        }
    }
}
