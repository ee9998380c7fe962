mod code;
mod custom;
mod date_time;
mod db_ref;
mod regex;

pub use bson::{Binary, Decimal128, Timestamp};
pub use code::*;
pub use custom::*;
pub use date_time::*;
pub use db_ref::*;
pub use self::regex::*;
