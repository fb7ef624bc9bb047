use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};

/// Hands out error ids of the form `<random base>-<counter>`.
///
/// The base is drawn once, so each id costs a single atomic increment.
#[derive(Debug)]
pub struct ErrorIdGenerator {
    base: String,
    count: AtomicU64,
}

impl ErrorIdGenerator {
    pub fn new() -> Self {
        Self {
            base: random_token(),
            count: AtomicU64::new(0),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn next_id(&self) -> String {
        let n = self.count.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{}-{}", self.base, n)
    }
}

impl Default for ErrorIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// UUID-shaped hex token (8-4-4-4-12)
fn random_token() -> String {
    let bytes: [u8; 16] = rand::thread_rng().r#gen();
    let hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ids_share_base_and_count_up() {
        let ids = ErrorIdGenerator::new();
        assert_eq!(ids.base().len(), 36);
        assert_eq!(ids.next_id(), format!("{}-1", ids.base()));
        assert_eq!(ids.next_id(), format!("{}-2", ids.base()));
    }

    #[test]
    fn generators_draw_distinct_bases() {
        assert_ne!(ErrorIdGenerator::new().base(), ErrorIdGenerator::new().base());
    }

    #[test]
    fn concurrent_ids_are_unique() {
        let ids = ErrorIdGenerator::new();
        let collected: Vec<String> = std::thread::scope(|s| {
            let workers: Vec<_> = (0..16)
                .map(|_| s.spawn(|| (0..128).map(|_| ids.next_id()).collect::<Vec<_>>()))
                .collect();
            workers
                .into_iter()
                .flat_map(|w| w.join().unwrap())
                .collect()
        });
        let unique: HashSet<&String> = collected.iter().collect();
        assert_eq!(collected.len(), 2048);
        assert_eq!(unique.len(), collected.len());
    }
}
