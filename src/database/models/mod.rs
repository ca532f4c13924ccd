pub mod metadata;
pub mod record;
pub mod user;
pub mod view;

pub use metadata::{MetaValue, Metadata};
pub use record::{parse_date, FinancialRecord, NewRecord, RecordError, RecordKind, RecordType};
pub use user::{NewUser, User, UserView};
pub use view::{RecordView, TransactionView};
