use anyhow::{Context, Result};
use rusqlite::{Connection, params};

use super::{STORE_VERSION, TranslationRecord};

pub fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(
            "
            CREATE TABLE IF NOT EXISTS metadata (
              key TEXT PRIMARY KEY,
              value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS translations (
              position INTEGER NOT NULL,
              location TEXT PRIMARY KEY,
              context TEXT NOT NULL DEFAULT '',
              source TEXT NOT NULL DEFAULT '',
              target TEXT NOT NULL DEFAULT ''
            );

            CREATE INDEX IF NOT EXISTS idx_translations_position ON translations(position);
            ",
        )
        .context("failed to create translation store schema")?;

    connection
        .execute(
            "
            INSERT INTO metadata(key, value) VALUES('store_version', ?1)
            ON CONFLICT(key) DO UPDATE SET value=excluded.value
            ",
            params![STORE_VERSION.to_string()],
        )
        .context("failed to record store version")?;

    Ok(())
}

pub fn replace_rows(connection: &mut Connection, records: &[TranslationRecord]) -> Result<()> {
    let transaction = connection.transaction()?;
    transaction.execute("DELETE FROM translations", [])?;

    {
        let mut statement = transaction.prepare(
            "
            INSERT INTO translations(position, location, context, source, target)
            VALUES(?1, ?2, ?3, ?4, ?5)
            ",
        )?;

        for (position, record) in records.iter().enumerate() {
            statement.execute(params![
                position as i64,
                record.location,
                record.context,
                record.source,
                record.target,
            ])?;
        }
    }

    transaction.commit()?;
    Ok(())
}

pub fn read_rows(connection: &Connection) -> Result<Vec<TranslationRecord>> {
    let mut statement = connection.prepare(
        "
        SELECT
          COALESCE(location, ''),
          COALESCE(context, ''),
          COALESCE(source, ''),
          COALESCE(target, '')
        FROM translations
        ORDER BY position ASC, location ASC
        ",
    )?;

    let mut rows = statement.query([])?;
    let mut out = Vec::<TranslationRecord>::new();

    while let Some(row) = rows.next()? {
        out.push(TranslationRecord {
            location: row.get(0)?,
            context: row.get(1)?,
            source: row.get(2)?,
            target: row.get(3)?,
        });
    }

    Ok(out)
}
