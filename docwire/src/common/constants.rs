// doc constants
pub const DOC_ID: &str = "_id";

// reference constants
pub const REF_COLLECTION: &str = "$ref";
pub const REF_ID: &str = "$id";
pub const REF_DATABASE: &str = "$db";
pub const REFERENCE_FIELDS: [&str; 3] = [REF_COLLECTION, REF_ID, REF_DATABASE];

pub const UUID_LENGTH: usize = 16;

pub const DOCWIRE_VERSION: &str = env!("CARGO_PKG_VERSION");
