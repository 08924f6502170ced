// Who may answer the survey and who may read the results.

use crate::survey::store::Users;
use snafu::Snafu;

#[derive(Eq, PartialEq, Debug, Clone, Copy, Snafu)]
pub enum Ineligible {
    #[snafu(display("no identity supplied"))]
    NoIdentity,
    #[snafu(display("this identity is not registered"))]
    NotRegistered,
    #[snafu(display("this identity already completed the survey"))]
    AlreadyVoted,
    #[snafu(display("the statistics are reserved for admins"))]
    NotAdmin,
}

/// Checks that a voter may still answer questions.
pub fn can_vote(users: &Users, user: &str) -> Result<(), Ineligible> {
    if user.is_empty() {
        return Err(Ineligible::NoIdentity);
    }
    match users.get(user) {
        None => Err(Ineligible::NotRegistered),
        Some(u) if u.has_voted => Err(Ineligible::AlreadyVoted),
        Some(_) => Ok(()),
    }
}

/// Admins may read the statistics, whether they voted or not.
pub fn can_view_stats(users: &Users, user: &str) -> Result<(), Ineligible> {
    if user.is_empty() {
        return Err(Ineligible::NoIdentity);
    }
    match users.get(user) {
        None => Err(Ineligible::NotRegistered),
        Some(u) if !u.admin => Err(Ineligible::NotAdmin),
        Some(_) => Ok(()),
    }
}
