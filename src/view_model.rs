use anyhow::Context;

use crate::model::{decode_users, User};
use crate::observable::Observable;
use crate::source::UserSource;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserCellViewModel {
    pub name: String,
}

impl From<&User> for UserCellViewModel {
    fn from(user: &User) -> Self {
        Self {
            name: user.name.clone(),
        }
    }
}

/// Rows of the user list. Starts empty and is replaced wholesale by
/// [`load`](Self::load).
#[derive(Debug, Default)]
pub struct UserListViewModel {
    users: Observable<Vec<UserCellViewModel>>,
}

impl UserListViewModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn users(&self) -> &Observable<Vec<UserCellViewModel>> {
        &self.users
    }

    /// Fetches and decodes users, then assigns their rows. Returns the row
    /// count.
    ///
    /// A failed fetch or decode leaves the current rows untouched and no
    /// listener is notified.
    pub async fn load<S>(&self, source: &S) -> anyhow::Result<usize>
    where
        S: UserSource + ?Sized,
    {
        let users = match fetch_users(source).await {
            Ok(users) => users,
            Err(err) => {
                log::warn!("keeping {} rows, user load failed: {:#}", self.row_count(), err);
                return Err(err);
            }
        };

        let rows: Vec<UserCellViewModel> = users.iter().map(UserCellViewModel::from).collect();
        let count = rows.len();
        log::debug!("loaded {} users", count);
        self.users.set(rows);
        Ok(count)
    }

    pub fn row_count(&self) -> usize {
        self.users.with(Vec::len)
    }

    pub fn row(&self, index: usize) -> Option<UserCellViewModel> {
        self.users.with(|rows| rows.get(index).cloned())
    }
}

async fn fetch_users<S>(source: &S) -> anyhow::Result<Vec<User>>
where
    S: UserSource + ?Sized,
{
    let payload = source.fetch().await.context("fetching users")?;
    let users = decode_users(&payload).context("decoding users payload")?;
    Ok(users)
}
