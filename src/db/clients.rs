use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::OptionalExtension;

use super::SqliteCatalog;
use crate::core::ClientRow;
use crate::error::Result;

pub async fn get(catalog: &SqliteCatalog, client_id: i64) -> Result<Option<ClientRow>> {
    catalog
        .call(move |c| {
            c.query_row(
                "SELECT ClientId, Name, Uname FROM Client WHERE ClientId = ?1",
                params![client_id],
                |row| {
                    Ok(ClientRow {
                        client_id: row.get(0)?,
                        name: row.get(1)?,
                        uname: row.get(2)?,
                    })
                },
            )
            .optional()
        })
        .await
}
