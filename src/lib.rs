pub mod application;
pub mod connector;
pub mod domain;

pub use application::{KeyValueStore, StoreConnector, StoreDialer};

pub use connector::{connect, connection_info, InMemoryDialer, InMemoryStore, RedisDialer, RedisStore};

pub use domain::{
    BackoffError, BackoffPolicy, ConnectError, ConnectionConfig, ExponentialPolicy, TablePolicy,
    DEFAULT_ADDRESS, DEFAULT_BACKOFF_MILLIS,
};
