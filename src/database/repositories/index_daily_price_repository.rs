use crate::database::connection::DatabaseError;
use crate::database::context::DbContext;
use crate::database::models::index_price::IndexDailyPriceRow;
use crate::database::models::{DateRange, IndexDailyPrice, MarketIndex, NewIndexDailyPrice};
use crate::database::repositories::{last_per_key, UPSERT_CHUNK_SIZE};
use chrono::Utc;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Double, Text, Timestamptz};
use uuid::Uuid;

const COLUMNS: &str =
    "id, date, open, high, low, close, adjusted_close, volume, created_at, updated_at";

/// Index daily price repository trait - one global daily series per index,
/// keyed by date alone
pub trait IndexDailyPriceRepository: Send + Sync {
    /// Index this repository reads and writes
    fn index(&self) -> MarketIndex;

    /// Insert or update by date; on conflict every value column and
    /// `updated_at` are overwritten
    fn create_or_update(
        &self,
        ctx: &mut DbContext<'_>,
        prices: &[NewIndexDailyPrice],
    ) -> Result<usize, DatabaseError>;

    /// Latest day of the series; `NotFound` when the series is empty
    fn get_latest(&self, ctx: &mut DbContext<'_>) -> Result<IndexDailyPrice, DatabaseError>;

    /// Days within an inclusive day range, oldest first
    fn list(
        &self,
        ctx: &mut DbContext<'_>,
        range: &DateRange,
    ) -> Result<Vec<IndexDailyPrice>, DatabaseError>;
}

/// Concrete implementation of IndexDailyPriceRepository
///
/// Both index tables share one shape, so a single implementation serves
/// either by table name.
#[derive(Debug, Clone, Copy)]
pub struct IndexDailyPriceRepositoryImpl {
    index: MarketIndex,
}

impl IndexDailyPriceRepositoryImpl {
    pub fn new(index: MarketIndex) -> Self {
        Self { index }
    }

    fn upsert_sql(&self, rows: usize) -> String {
        let values = (0..rows)
            .map(|i| {
                let base = i * 10;
                let placeholders = (1..=10)
                    .map(|n| format!("${}", base + n))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("({})", placeholders)
            })
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "INSERT INTO {} ({}) VALUES {} \
             ON CONFLICT (date) DO UPDATE SET \
             open = EXCLUDED.open, high = EXCLUDED.high, low = EXCLUDED.low, \
             close = EXCLUDED.close, adjusted_close = EXCLUDED.adjusted_close, \
             volume = EXCLUDED.volume, updated_at = EXCLUDED.updated_at",
            self.index.table_name(),
            COLUMNS,
            values
        )
    }

    fn list_sql(&self, range: &DateRange) -> String {
        let mut conditions = Vec::new();
        if range.date_from.is_some() {
            conditions.push(format!("date >= ${}", conditions.len() + 1));
        }
        if range.date_to.is_some() {
            conditions.push(format!("date < ${}", conditions.len() + 1));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {} ", conditions.join(" AND "))
        };

        format!(
            "SELECT {} FROM {} {}ORDER BY date ASC",
            COLUMNS,
            self.index.table_name(),
            where_clause
        )
    }
}

impl IndexDailyPriceRepository for IndexDailyPriceRepositoryImpl {
    fn index(&self) -> MarketIndex {
        self.index
    }

    fn create_or_update(
        &self,
        ctx: &mut DbContext<'_>,
        prices: &[NewIndexDailyPrice],
    ) -> Result<usize, DatabaseError> {
        if prices.is_empty() {
            return Ok(0);
        }

        let now = Utc::now();
        let rows = last_per_key(prices, |p| p.date)
            .into_iter()
            .map(|p| Ok((p.date, p.ohlcv.to_stored()?)))
            .collect::<Result<Vec<_>, DatabaseError>>()?;

        let mut count = 0;
        for chunk in rows.chunks(UPSERT_CHUNK_SIZE) {
            let mut query = diesel::sql_query(self.upsert_sql(chunk.len())).into_boxed::<Pg>();
            for (date, stored) in chunk {
                query = query
                    .bind::<Text, _>(Uuid::new_v4().to_string())
                    .bind::<Timestamptz, _>(*date)
                    .bind::<Double, _>(stored.open)
                    .bind::<Double, _>(stored.high)
                    .bind::<Double, _>(stored.low)
                    .bind::<Double, _>(stored.close)
                    .bind::<Double, _>(stored.adjusted_close)
                    .bind::<BigInt, _>(stored.volume)
                    .bind::<Timestamptz, _>(now)
                    .bind::<Timestamptz, _>(now);
            }

            count += ctx.run("upsert index daily prices", |conn| query.execute(conn))?;
        }

        tracing::debug!(
            "Upserted {} {} daily prices (received {})",
            count,
            self.index,
            prices.len()
        );

        Ok(count)
    }

    fn get_latest(&self, ctx: &mut DbContext<'_>) -> Result<IndexDailyPrice, DatabaseError> {
        let query = format!(
            "SELECT {} FROM {} ORDER BY date DESC LIMIT 1",
            COLUMNS,
            self.index.table_name()
        );

        let row = ctx.run("get latest index daily price", |conn| {
            diesel::sql_query(query)
                .get_result::<IndexDailyPriceRow>(conn)
                .optional()
        })?;

        row.ok_or_else(|| DatabaseError::NotFound(format!("{} daily price", self.index)))?
            .try_into()
    }

    fn list(
        &self,
        ctx: &mut DbContext<'_>,
        range: &DateRange,
    ) -> Result<Vec<IndexDailyPrice>, DatabaseError> {
        let mut query = diesel::sql_query(self.list_sql(range)).into_boxed::<Pg>();
        if let Some(lower) = range.lower_bound() {
            query = query.bind::<Timestamptz, _>(lower);
        }
        if let Some(upper) = range.upper_bound() {
            query = query.bind::<Timestamptz, _>(upper);
        }

        let rows = ctx.run("list index daily prices", |conn| {
            query.load::<IndexDailyPriceRow>(conn)
        })?;

        rows.into_iter().map(IndexDailyPrice::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_upsert_sql_numbers_placeholders_per_row() {
        let repo = IndexDailyPriceRepositoryImpl::new(MarketIndex::Topix);
        let sql = repo.upsert_sql(2);

        assert!(sql.starts_with("INSERT INTO topix_daily_prices"));
        assert!(sql.contains("($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"));
        assert!(sql.contains("($11, $12, $13, $14, $15, $16, $17, $18, $19, $20)"));
        assert!(sql.contains("ON CONFLICT (date) DO UPDATE"));
        assert!(!sql.contains("created_at = EXCLUDED"));
    }

    #[test]
    fn test_list_sql_bounds() {
        let repo = IndexDailyPriceRepositoryImpl::new(MarketIndex::Nikkei);
        let day = Utc.with_ymd_and_hms(2023, 1, 3, 0, 0, 0).unwrap();

        let open = repo.list_sql(&DateRange::default());
        assert!(open.contains("FROM nikkei_daily_prices ORDER BY date ASC"));
        assert!(!open.contains("WHERE"));

        let both = repo.list_sql(&DateRange::new(Some(day), Some(day)));
        assert!(both.contains("WHERE date >= $1 AND date < $2"));

        let upper_only = repo.list_sql(&DateRange::new(None, Some(day)));
        assert!(upper_only.contains("WHERE date < $1"));
    }

    #[test]
    fn test_repository_reports_its_index() {
        assert_eq!(
            IndexDailyPriceRepositoryImpl::new(MarketIndex::Topix).index(),
            MarketIndex::Topix
        );
    }
}
