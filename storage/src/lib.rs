pub mod channels;
pub mod db;
pub mod errors;
pub mod record;
pub mod util;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;
