mod constants;
pub mod types;
pub mod util;
mod value;
mod value_type;

pub use constants::*;
pub use types::*;
pub use util::*;
pub use value::*;
pub use value_type::*;
