mod cli;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

use kvconnect::{
    BackoffPolicy, ConnectionConfig, ExponentialPolicy, KeyValueStore, RedisDialer,
    StoreConnector, TablePolicy, DEFAULT_ADDRESS,
};

use cli::{pairs_from_flat, Commands};

#[derive(Parser)]
#[command(name = "kvconnect")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Store address, either host[:port] or a redis:// URL
    #[arg(short, long, global = true, default_value = DEFAULT_ADDRESS)]
    addr: String,

    #[arg(long, global = true, default_value = "")]
    password: String,

    #[arg(long, global = true, default_value = "0")]
    db: i64,

    /// Retry with exponential backoff for at most this many attempts instead of the default schedule
    #[arg(long, global = true)]
    max_attempts: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = ConnectionConfig::new(&cli.addr)
        .with_password(&cli.password)
        .with_db(cli.db);

    let policy: Arc<dyn BackoffPolicy> = match cli.max_attempts {
        Some(max_attempts) => {
            debug!("Using exponential backoff with {} attempts", max_attempts);
            Arc::new(ExponentialPolicy::new(
                Duration::from_millis(100),
                max_attempts,
            ))
        }
        None => Arc::new(TablePolicy::default()),
    };

    let store = StoreConnector::new(RedisDialer::new())
        .with_policy(policy)
        .connect(&config)
        .await?;

    match cli.command {
        Commands::Ping => {
            println!("{}", store.ping().await?);
        }

        Commands::Del { keys } => {
            let removed = store.delete(&keys).await?;
            println!("(integer) {}", removed);
        }

        Commands::Hgetall { key } => {
            let hash = store.hgetall(&key).await?;

            if hash.is_empty() {
                println!("(empty hash)");
            } else {
                let mut fields: Vec<_> = hash.into_iter().collect();
                fields.sort();
                for (field, value) in fields {
                    println!("{} = {}", field, value);
                }
            }
        }

        Commands::Hmset {
            key,
            field,
            value,
            pairs,
        } => {
            let pairs = pairs_from_flat(&pairs).map_err(anyhow::Error::msg)?;
            println!("{}", store.hmset(&key, &field, &value, &pairs).await?);
        }

        Commands::Lpush { key, values } => {
            let len = store.lpush(&key, &values).await?;
            println!("(integer) {}", len);
        }

        Commands::Lrange { key, start, stop } => {
            let items = store.lrange(&key, start, stop).await?;

            if items.is_empty() {
                println!("(empty list)");
            } else {
                for (i, item) in items.iter().enumerate() {
                    println!("{}) {}", i + 1, item);
                }
            }
        }

        Commands::Lrem { key, count, value } => {
            let removed = store.lrem(&key, count, &value).await?;
            println!("(integer) {}", removed);
        }

        Commands::Set {
            key,
            value,
            expire_ms,
        } => {
            let status = store
                .set(&key, &value, Duration::from_millis(expire_ms))
                .await?;
            println!("{}", status);
        }
    }

    Ok(())
}

#[cfg(test)]
mod cli_tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_store() {
        let cli = Cli::try_parse_from(["kvconnect", "ping"]).unwrap();

        assert_eq!(cli.addr, DEFAULT_ADDRESS);
        assert_eq!(cli.db, 0);
        assert!(cli.password.is_empty());
        assert!(cli.max_attempts.is_none());
    }

    #[test]
    fn lrange_accepts_negative_indices() {
        let cli = Cli::try_parse_from(["kvconnect", "lrange", "jobs", "0", "-1"]).unwrap();

        match cli.command {
            Commands::Lrange { key, start, stop } => {
                assert_eq!(key, "jobs");
                assert_eq!(start, 0);
                assert_eq!(stop, -1);
            }
            _ => panic!("expected lrange"),
        }
    }

    #[test]
    fn values_may_start_with_a_hyphen() {
        let cli = Cli::try_parse_from(["kvconnect", "set", "k", "-5"]).unwrap();
        match cli.command {
            Commands::Set { value, .. } => assert_eq!(value, "-5"),
            _ => panic!("expected set"),
        }

        let cli = Cli::try_parse_from(["kvconnect", "lpush", "q", "-x", "-y"]).unwrap();
        match cli.command {
            Commands::Lpush { values, .. } => assert_eq!(values, vec!["-x", "-y"]),
            _ => panic!("expected lpush"),
        }

        let cli =
            Cli::try_parse_from(["kvconnect", "hmset", "h", "f", "-1", "g", "-2"]).unwrap();
        match cli.command {
            Commands::Hmset { value, pairs, .. } => {
                assert_eq!(value, "-1");
                assert_eq!(pairs, vec!["g", "-2"]);
            }
            _ => panic!("expected hmset"),
        }

        let cli = Cli::try_parse_from(["kvconnect", "lrem", "q", "-1", "-x"]).unwrap();
        match cli.command {
            Commands::Lrem { count, value, .. } => {
                assert_eq!(count, -1);
                assert_eq!(value, "-x");
            }
            _ => panic!("expected lrem"),
        }
    }

    #[test]
    fn del_requires_a_key() {
        assert!(Cli::try_parse_from(["kvconnect", "del"]).is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "kvconnect",
            "set",
            "k",
            "v",
            "--expire-ms",
            "1500",
            "--addr",
            "cache:6380",
            "--max-attempts",
            "3",
        ])
        .unwrap();

        assert_eq!(cli.addr, "cache:6380");
        assert_eq!(cli.max_attempts, Some(3));
        match cli.command {
            Commands::Set { expire_ms, .. } => assert_eq!(expire_ms, 1500),
            _ => panic!("expected set"),
        }
    }
}
