pub mod admin_ops;
pub mod bootstrap;
pub mod password;
pub mod storage_init;
