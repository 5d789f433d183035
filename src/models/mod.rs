pub mod user;
pub mod watchlist;
pub mod alert;

pub use user::{Session, SessionUser};
pub use watchlist::WatchlistEntry;
pub use alert::{AlertFields, AlertInput, AlertRecord, AlertType, AlertView, ThresholdInput};
