//! # PostgreSQL Order Repository
//!
//! [`OrderRepository`] backed by PostgreSQL through SQLx.
//!
//! ## Stored Routines
//!
//! Selection and batching rules live in the database:
//!
//! - `usp_populate_custom_orders()` and `usp_assign_batches_custom_orders()` are procedures
//! - `usp_get_image_custom_orders()`, `usp_get_label_custom_orders()` and
//!   `usp_get_label_reprint_custom_orders(batch_guid, id)` are set-returning functions
//!
//! ## Tables Written
//!
//! - `order_custom` (status, station, print count, header)
//! - `order_custom_batch` (document URL, printed timestamp)
//! - `order_custom_batch_history` and `order_custom_station_history` (append-only)

use super::repository::OrderRepository;
use crate::constants::{pipeline::STATION_HISTORY_USER, OrderCustomStatus, OrderCustomType, Station};
use crate::error::Result;
use crate::models::{
    BatchDocumentUpdate, BatchHistoryRecord, ImageItemUpdate, OrderItem, ProductionUrlCheck,
};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, instrument};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn populate_custom_orders(&self) -> Result<()> {
        sqlx::query("CALL usp_populate_custom_orders()")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn assign_batches(&self) -> Result<()> {
        sqlx::query("CALL usp_assign_batches_custom_orders()")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn fetch_items_for_production_url_check(&self) -> Result<Vec<ProductionUrlCheck>> {
        let items = sqlx::query_as::<_, ProductionUrlCheck>(
            r#"
            SELECT id, image_url
            FROM order_custom
            WHERE custom_type_id = $1
              AND production_url_status = 0
              AND custom_status_id = ANY($2)
            ORDER BY id
            "#,
        )
        .bind(OrderCustomType::Image as i32)
        .bind(vec![
            OrderCustomStatus::New as i32,
            OrderCustomStatus::CopyApproved as i32,
        ])
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    async fn update_production_url_status(&self, ids: &[i64]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }

        sqlx::query("UPDATE order_custom SET production_url_status = 1 WHERE id = ANY($1)")
            .bind(ids)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn fetch_pending_image_batch_items(&self) -> Result<Vec<OrderItem>> {
        let items =
            sqlx::query_as::<_, OrderItem>("SELECT * FROM usp_get_image_custom_orders()")
                .fetch_all(&self.pool)
                .await?;
        Ok(items)
    }

    async fn fetch_pending_label_items(&self) -> Result<Vec<OrderItem>> {
        let items =
            sqlx::query_as::<_, OrderItem>("SELECT * FROM usp_get_label_custom_orders()")
                .fetch_all(&self.pool)
                .await?;
        Ok(items)
    }

    async fn fetch_items_by_batch_guid(&self, batch_guid: Uuid) -> Result<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(
            "SELECT * FROM usp_get_label_reprint_custom_orders($1, NULL)",
        )
        .bind(batch_guid)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    async fn fetch_item_by_id(&self, id: i64) -> Result<Option<OrderItem>> {
        let item = sqlx::query_as::<_, OrderItem>(
            "SELECT * FROM usp_get_label_reprint_custom_orders(NULL, $1) LIMIT 1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(item)
    }

    #[instrument(skip(self, ids), fields(item_count = ids.len(), status = %status))]
    async fn update_item_status(
        &self,
        ids: &[i64],
        status: OrderCustomStatus,
        station: Option<Station>,
    ) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }

        let marks_label = matches!(
            status,
            OrderCustomStatus::LabelPrinted | OrderCustomStatus::Reprint
        );

        sqlx::query(
            r#"
            UPDATE order_custom
            SET custom_status_id = $1,
                current_station_id = COALESCE($2, current_station_id),
                label_printed = CASE WHEN $3 THEN TRUE ELSE label_printed END,
                updated_date_utc = $4
            WHERE id = ANY($5)
            "#,
        )
        .bind(status)
        .bind(station)
        .bind(marks_label)
        .bind(Utc::now())
        .bind(ids)
        .execute(&self.pool)
        .await?;

        debug!(item_count = ids.len(), "Updated item status");
        Ok(())
    }

    #[instrument(skip(self, updates), fields(item_count = updates.len()))]
    async fn update_image_items(&self, updates: &[ImageItemUpdate]) -> Result<()> {
        if updates.is_empty() {
            return Ok(());
        }

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        for update in updates {
            sqlx::query(
                r#"
                UPDATE order_custom
                SET custom_status_id = $1,
                    print_count = $2,
                    item_header = $3,
                    updated_date_utc = $4
                WHERE id = $5
                "#,
            )
            .bind(update.custom_status_id)
            .bind(update.print_count)
            .bind(&update.item_header)
            .bind(now)
            .bind(update.id)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn append_station_history(&self, ids: &[i64], station: Station) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }

        let now = Utc::now();
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO order_custom_station_history \
             (order_custom_id, order_station_id, created_date_utc, station_user_name) ",
        );
        builder.push_values(ids, |mut row, id| {
            row.push_bind(*id)
                .push_bind(station)
                .push_bind(now)
                .push_bind(STATION_HISTORY_USER);
        });
        builder.build().execute(&self.pool).await?;
        Ok(())
    }

    async fn append_batch_history(&self, records: &[BatchHistoryRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO order_custom_batch_history \
             (custom_status_id, order_custom_id, order_custom_guid, order_batch_id, \
              order_batch_guid, image_url, barcode, item_header, item_description, \
              created_date_utc) ",
        );
        builder.push_values(records, |mut row, record| {
            row.push_bind(record.custom_status_id)
                .push_bind(record.order_custom_id)
                .push_bind(record.order_custom_guid)
                .push_bind(record.order_batch_id)
                .push_bind(record.order_batch_guid)
                .push_bind(record.image_url.clone())
                .push_bind(record.barcode.clone())
                .push_bind(record.item_header.clone())
                .push_bind(record.item_description.clone())
                .push_bind(record.created_date_utc);
        });
        builder.build().execute(&self.pool).await?;
        Ok(())
    }

    async fn update_batch_document_url(&self, updates: &[BatchDocumentUpdate]) -> Result<()> {
        if updates.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for update in updates {
            sqlx::query(
                "UPDATE order_custom_batch SET file_url = $1, printed_date_utc = $2 WHERE id = $3",
            )
            .bind(&update.file_url)
            .bind(update.printed_date_utc)
            .bind(update.batch_id)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn health_check(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM order_custom")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
