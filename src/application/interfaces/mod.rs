mod key_value_store;
mod store_dialer;

pub use key_value_store::*;
pub use store_dialer::*;
