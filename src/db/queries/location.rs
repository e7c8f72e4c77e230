//! Location reference network queries

use anyhow::Result;
use sqlx::PgPool;

use crate::types::location::{LocationId, LocationRecord};

/// Subset of `ids` that exists in the reference network.
pub async fn known_locations(pool: &PgPool, ids: &[LocationId]) -> Result<Vec<LocationId>> {
    let known = sqlx::query_scalar::<_, LocationId>(
        r#"
        SELECT location_id
        FROM locations
        WHERE location_id = ANY($1)
        "#,
    )
    .bind(ids)
    .fetch_all(pool)
    .await?;

    Ok(known)
}

/// Coordinates for a single location, if present.
pub async fn coordinates_for(pool: &PgPool, id: LocationId) -> Result<Option<LocationRecord>> {
    let record = sqlx::query_as::<_, LocationRecord>(
        r#"
        SELECT location_id, lat, lng
        FROM locations
        WHERE location_id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

/// Every location in the network, for the distance sync job.
pub async fn all_locations(pool: &PgPool) -> Result<Vec<LocationRecord>> {
    let records = sqlx::query_as::<_, LocationRecord>(
        r#"
        SELECT location_id, lat, lng
        FROM locations
        ORDER BY location_id ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(records)
}
