mod session;

pub use session::{DbSession, SessionLoadQuery};
pub use sharedkey_core::db::{
    CommitResponse, Db, DbBuilder, Joined, ReadConsistency, Response, SaveMode, UnitOfWork,
};
