//! Trip history queries

use anyhow::Result;
use chrono::NaiveDate;
use sqlx::PgPool;

use crate::types::trip::RawTrip;

/// Fetch trips whose start date code falls in `[from, to)`, ordered by
/// start date and trip id. Date codes are stored as `YYYYMMDD` text, so
/// the range compare works lexicographically.
pub async fn trips_in_code_range(
    pool: &PgPool,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<RawTrip>> {
    let from_code = from.format("%Y%m%d").to_string();
    let to_code = to.format("%Y%m%d").to_string();

    let trips = sqlx::query_as::<_, RawTrip>(
        r#"
        SELECT trip_id, origin, destination,
               start_date_code, start_time_text, end_date_code, end_time_text,
               vehicle_id, truck_type
        FROM trips
        WHERE start_date_code >= $1 AND start_date_code < $2
        ORDER BY start_date_code ASC, trip_id ASC
        "#,
    )
    .bind(&from_code)
    .bind(&to_code)
    .fetch_all(pool)
    .await?;

    Ok(trips)
}
