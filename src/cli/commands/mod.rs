mod check;
mod evict;

pub use check::cmd_check;
pub use evict::cmd_evict;
