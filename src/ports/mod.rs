pub mod credentials;
pub mod database;
pub mod geocoding;
pub mod storage;
pub mod tokens;
