use chrono::{DateTime, Utc};
use spell_core::model::{Word, WordList, WordListDraft, WordListId};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use super::SqliteRepository;
use super::mapping::{conn, from_json, id_i64, list_id_from_i64, ser, to_json};
use crate::repository::{StorageError, WordListRepository};

const LIST_COLUMNS: &str = "id, name, words, is_active, created_at, deleted_at";

fn list_from_row(row: &SqliteRow) -> Result<WordList, StorageError> {
    let id = list_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?;
    let words: Vec<Word> = from_json(&row.try_get::<String, _>("words").map_err(ser)?)?;

    WordList::from_persisted(
        id,
        row.try_get::<String, _>("name").map_err(ser)?,
        words,
        row.try_get::<i64, _>("is_active").map_err(ser)? != 0,
        row.try_get("created_at").map_err(ser)?,
        row.try_get("deleted_at").map_err(ser)?,
    )
    .map_err(ser)
}

impl SqliteRepository {
    async fn fetch_lists(&self, filter: &str) -> Result<Vec<WordList>, StorageError> {
        let sql = format!(
            "SELECT {LIST_COLUMNS} FROM word_lists WHERE {filter} ORDER BY created_at DESC, id DESC"
        );
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        let mut lists = Vec::with_capacity(rows.len());
        for row in rows {
            lists.push(list_from_row(&row)?);
        }
        Ok(lists)
    }

    async fn fetch_live_list(&self, id: WordListId) -> Result<WordList, StorageError> {
        match self.get_list(id).await? {
            Some(list) if !list.is_deleted() => Ok(list),
            _ => Err(StorageError::NotFound),
        }
    }
}

#[async_trait::async_trait]
impl WordListRepository for SqliteRepository {
    async fn insert_new_list(
        &self,
        draft: &WordListDraft,
        created_at: DateTime<Utc>,
    ) -> Result<WordListId, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO word_lists (name, words, is_active, created_at)
            VALUES (?1, ?2, 0, ?3)
            ",
        )
        .bind(draft.name())
        .bind(to_json(&draft.words())?)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        list_id_from_i64(res.last_insert_rowid())
    }

    async fn get_list(&self, id: WordListId) -> Result<Option<WordList>, StorageError> {
        let sql = format!("SELECT {LIST_COLUMNS} FROM word_lists WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(id_i64("word_list_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        row.as_ref().map(list_from_row).transpose()
    }

    async fn list_lists(&self) -> Result<Vec<WordList>, StorageError> {
        self.fetch_lists("deleted_at IS NULL").await
    }

    async fn get_active_lists(&self) -> Result<Vec<WordList>, StorageError> {
        self.fetch_lists("deleted_at IS NULL AND is_active = 1").await
    }

    async fn update_list(
        &self,
        id: WordListId,
        draft: &WordListDraft,
    ) -> Result<WordList, StorageError> {
        let res = sqlx::query(
            r"
            UPDATE word_lists SET name = ?1, words = ?2
            WHERE id = ?3 AND deleted_at IS NULL
            ",
        )
        .bind(draft.name())
        .bind(to_json(&draft.words())?)
        .bind(id_i64("word_list_id", id.value())?)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        self.fetch_live_list(id).await
    }

    async fn set_active(&self, id: WordListId, active: bool) -> Result<WordList, StorageError> {
        let res = sqlx::query(
            r"
            UPDATE word_lists SET is_active = ?1
            WHERE id = ?2 AND deleted_at IS NULL
            ",
        )
        .bind(i64::from(active))
        .bind(id_i64("word_list_id", id.value())?)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        self.fetch_live_list(id).await
    }

    async fn soft_delete(&self, id: WordListId, at: DateTime<Utc>) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
            UPDATE word_lists SET deleted_at = COALESCE(deleted_at, ?1)
            WHERE id = ?2
            ",
        )
        .bind(at)
        .bind(id_i64("word_list_id", id.value())?)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
