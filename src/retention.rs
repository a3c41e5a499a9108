use log::{error, info};
use rand::{thread_rng, Rng};
use sqlx::{query, query_scalar, PgPool};
use uuid::Uuid;

use crate::error::Error;

pub const SWEEP_PROBABILITY: f64 = 0.1;

pub const RETENTION_THRESHOLD: i64 = 50;

pub fn eviction_quota(count: i64) -> i64 {
    if count > RETENTION_THRESHOLD {
        count / 10
    } else {
        0
    }
}

// failures stay in the log, the submitter never sees them
pub async fn maybe_sweep(db: &PgPool) {
    if thread_rng().gen::<f64>() >= SWEEP_PROBABILITY {
        return;
    }
    match sweep(db).await {
        Ok(0) => {}
        Ok(removed) => info!("Cleaned up {} old application records", removed),
        Err(e) => error!("Error during application cleanup: {}", e),
    }
}

// count, scan and deletes run as separate statements, submissions landing
// in between are tolerated
pub async fn sweep(db: &PgPool) -> Result<u64, Error> {
    let count: i64 = query_scalar("SELECT COUNT(*) FROM applications").fetch_one(db).await?;
    let quota = eviction_quota(count);
    if quota == 0 {
        return Ok(0);
    }
    let oldest: Vec<Uuid> = query_scalar("SELECT id FROM applications ORDER BY created_at ASC LIMIT $1")
        .bind(quota)
        .fetch_all(db)
        .await?;
    let mut removed = 0;
    for id in oldest {
        removed += query("DELETE FROM applications WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?
            .rows_affected();
    }
    Ok(removed)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_quota_is_zero_at_or_below_threshold() {
        assert_eq!(eviction_quota(0), 0);
        assert_eq!(eviction_quota(49), 0);
        assert_eq!(eviction_quota(50), 0);
    }

    #[test]
    fn test_quota_is_a_tenth_of_the_table() {
        assert_eq!(eviction_quota(51), 5);
        assert_eq!(eviction_quota(120), 12);
        assert_eq!(eviction_quota(509), 50);
    }
}
