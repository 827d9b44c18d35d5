pub mod listener;
pub mod router;
