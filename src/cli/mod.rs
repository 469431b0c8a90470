use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Check the store answers
    Ping,

    /// Delete one or more keys
    Del {
        #[arg(required = true)]
        keys: Vec<String>,
    },

    Hgetall {
        key: String,
    },

    /// Set one or more hash fields
    Hmset {
        key: String,
        field: String,

        #[arg(allow_hyphen_values = true)]
        value: String,

        /// Further FIELD VALUE pairs
        #[arg(allow_hyphen_values = true)]
        pairs: Vec<String>,
    },

    Lpush {
        key: String,

        #[arg(required = true, allow_hyphen_values = true)]
        values: Vec<String>,
    },

    Lrange {
        key: String,

        #[arg(allow_negative_numbers = true)]
        start: i64,

        #[arg(allow_negative_numbers = true)]
        stop: i64,
    },

    /// Remove list elements equal to VALUE (COUNT < 0 removes from the tail, 0 removes all)
    Lrem {
        key: String,

        #[arg(allow_negative_numbers = true)]
        count: i64,

        #[arg(allow_hyphen_values = true)]
        value: String,
    },

    Set {
        key: String,

        #[arg(allow_hyphen_values = true)]
        value: String,

        /// Expire the key after this many milliseconds (0 keeps it forever)
        #[arg(long, default_value = "0")]
        expire_ms: u64,
    },
}

/// Group a flat `FIELD VALUE FIELD VALUE ...` list into pairs.
pub fn pairs_from_flat(flat: &[String]) -> Result<Vec<(String, String)>, String> {
    if flat.len() % 2 != 0 {
        return Err(format!(
            "expected FIELD VALUE pairs, got an odd number of arguments ({})",
            flat.len()
        ));
    }

    Ok(flat
        .chunks(2)
        .map(|pair| (pair[0].clone(), pair[1].clone()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_pairs_from_flat() {
        let pairs = pairs_from_flat(&strings(&["a", "1", "b", "2"])).unwrap();

        assert_eq!(
            pairs,
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "2".to_string())
            ]
        );
        assert!(pairs_from_flat(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_pairs_from_flat_rejects_odd_count() {
        assert!(pairs_from_flat(&strings(&["a", "1", "b"])).is_err());
    }
}
