use spell_core::model::{ResultDetails, TestResult, TestResultId, WordListId};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use super::SqliteRepository;
use super::mapping::{
    conn, from_json, id_i64, list_id_from_i64, result_id_from_i64, ser, to_json, u32_from_i64,
};
use crate::repository::{StorageError, TestResultRepository, TestResultRow};

impl SqliteRepository {
    async fn linked_list_ids(&self, result_id: i64) -> Result<Vec<WordListId>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT word_list_id FROM test_word_lists
                WHERE test_result_id = ?1
                ORDER BY word_list_id ASC
            ",
        )
        .bind(result_id)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter()
            .map(|row| list_id_from_i64(row.try_get::<i64, _>("word_list_id").map_err(ser)?))
            .collect()
    }

    async fn map_result_row(&self, row: &SqliteRow) -> Result<TestResultRow, StorageError> {
        let raw_id: i64 = row.try_get("id").map_err(ser)?;
        let details: ResultDetails = from_json(&row.try_get::<String, _>("details").map_err(ser)?)?;
        let result = TestResult::new(
            self.linked_list_ids(raw_id).await?,
            u32_from_i64("score", row.try_get::<i64, _>("score").map_err(ser)?)?,
            u32_from_i64("total", row.try_get::<i64, _>("total").map_err(ser)?)?,
            details,
            row.try_get("completed_at").map_err(ser)?,
        )
        .map_err(ser)?;
        Ok(TestResultRow::new(result_id_from_i64(raw_id)?, result))
    }
}

#[async_trait::async_trait]
impl TestResultRepository for SqliteRepository {
    async fn append_result(&self, result: &TestResult) -> Result<TestResultId, StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        let res = sqlx::query(
            r"
                INSERT INTO test_results (score, total, details, completed_at)
                VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(i64::from(result.score()))
        .bind(i64::from(result.total()))
        .bind(to_json(result.details())?)
        .bind(result.completed_at())
        .execute(&mut *tx)
        .await
        .map_err(conn)?;
        let result_id = res.last_insert_rowid();

        for list_id in result.list_ids() {
            sqlx::query(
                r"
                    INSERT INTO test_word_lists (test_result_id, word_list_id)
                    VALUES (?1, ?2)
                ",
            )
            .bind(result_id)
            .bind(id_i64("word_list_id", list_id.value())?)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)?;
        result_id_from_i64(result_id)
    }

    async fn get_result(&self, id: TestResultId) -> Result<TestResult, StorageError> {
        let row = sqlx::query(
            r"
                SELECT id, score, total, details, completed_at
                FROM test_results
                WHERE id = ?1
            ",
        )
        .bind(id_i64("test_result_id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        .ok_or(StorageError::NotFound)?;

        Ok(self.map_result_row(&row).await?.result)
    }

    async fn list_results_for_list(
        &self,
        list_id: WordListId,
        limit: u32,
    ) -> Result<Vec<TestResultRow>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT r.id, r.score, r.total, r.details, r.completed_at
                FROM test_results r
                JOIN test_word_lists l ON l.test_result_id = r.id
                WHERE l.word_list_id = ?1
                ORDER BY r.completed_at DESC, r.id DESC
                LIMIT ?2
            ",
        )
        .bind(id_i64("word_list_id", list_id.value())?)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in &rows {
            out.push(self.map_result_row(row).await?);
        }
        Ok(out)
    }
}
