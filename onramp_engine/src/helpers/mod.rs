mod keyed_lock;
mod wallet_address;

pub use keyed_lock::KeyedLocks;
pub use wallet_address::{is_valid_email, is_valid_wallet_address};
