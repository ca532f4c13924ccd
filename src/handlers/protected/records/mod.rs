//! Record intake and query handlers. Every handler takes the caller from
//! [AuthUser](crate::middleware::AuthUser); no request can name another owner.

mod input;

pub mod balance;
pub mod invoice;
pub mod list;
pub mod statement;
pub mod summary;

pub use balance::post as balance;
pub use invoice::post as invoice;
pub use list::get as list;
pub use statement::post as statement;
pub use summary::get as summary;
