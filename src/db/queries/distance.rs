//! Distance table queries

use anyhow::Result;
use sqlx::PgPool;

use crate::types::location::{DistanceRow, LocationId};

/// Distance rows whose endpoints both fall inside `ids`.
pub async fn rows_within(pool: &PgPool, ids: &[LocationId]) -> Result<Vec<DistanceRow>> {
    let rows = sqlx::query_as::<_, DistanceRow>(
        r#"
        SELECT origin, destination, travel_time, kilometers
        FROM distances
        WHERE origin = ANY($1) AND destination = ANY($1)
        "#,
    )
    .bind(ids)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// All location pairs already measured, as stored (canonical order,
/// lower id first).
pub async fn existing_pairs(pool: &PgPool) -> Result<Vec<(LocationId, LocationId)>> {
    let pairs = sqlx::query_as::<_, (LocationId, LocationId)>(
        r#"
        SELECT origin, destination
        FROM distances
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(pairs)
}

/// Insert or refresh one measured pair. Callers pass the canonical
/// order (origin < destination).
pub async fn insert_distance(
    pool: &PgPool,
    origin: LocationId,
    destination: LocationId,
    travel_time: i64,
    kilometers: f64,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO distances (origin, destination, travel_time, kilometers)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (origin, destination)
        DO UPDATE SET travel_time = EXCLUDED.travel_time, kilometers = EXCLUDED.kilometers
        "#,
    )
    .bind(origin)
    .bind(destination)
    .bind(travel_time)
    .bind(kilometers)
    .execute(pool)
    .await?;

    Ok(())
}
