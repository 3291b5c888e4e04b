use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{Connection, OptionalExtension as _, params};

use super::OrderState;
use crate::error::{SwapError, SwapResult};

/// Durable home of the single in-flight [`OrderState`]. A `set` either
/// fully replaces the record or leaves the prior one intact; partial writes
/// must be impossible. The coordinator is the only writer.
pub trait OrderStateStore: Send {
    fn get(&self) -> SwapResult<Option<OrderState>>;
    fn set(&mut self, state: &OrderState) -> SwapResult<()>;
    fn set_initiate_tx_hash(&mut self, tx_hash: &str) -> SwapResult<()>;
    fn set_interface_id(&mut self, interface_id: &str) -> SwapResult<()>;
    fn clear(&mut self) -> SwapResult<()>;
}

#[derive(Debug)]
pub struct SqliteOrderStore {
    conn: Connection,
    path: PathBuf,
}

impl SqliteOrderStore {
    pub fn open(path: PathBuf) -> SwapResult<Self> {
        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
        {
            std::fs::create_dir_all(dir)
                .map_err(|e| SwapError::Storage(format!("create store dir {}: {e}", dir.display())))?;
        }

        let conn = Connection::open(&path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA foreign_keys = ON;")?;

        migrate(&conn)?;

        Ok(Self { conn, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OrderStateStore for SqliteOrderStore {
    fn get(&self) -> SwapResult<Option<OrderState>> {
        let row = self
            .conn
            .query_row(
                r#"
SELECT order_id, secret, interface_id, initiate_tx_hash
FROM pending_order
WHERE slot = 0
"#,
                [],
                |row| {
                    Ok(OrderState {
                        order_id: row.get(0)?,
                        secret: row.get(1)?,
                        interface_id: row.get(2)?,
                        initiate_tx_hash: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    fn set(&mut self, state: &OrderState) -> SwapResult<()> {
        self.conn.execute(
            r#"
INSERT INTO pending_order (slot, order_id, secret, interface_id, initiate_tx_hash)
VALUES (0, ?1, ?2, ?3, ?4)
ON CONFLICT (slot) DO UPDATE SET
  order_id = excluded.order_id,
  secret = excluded.secret,
  interface_id = excluded.interface_id,
  initiate_tx_hash = excluded.initiate_tx_hash
"#,
            params![
                &state.order_id,
                &state.secret,
                &state.interface_id,
                &state.initiate_tx_hash,
            ],
        )?;
        Ok(())
    }

    fn set_initiate_tx_hash(&mut self, tx_hash: &str) -> SwapResult<()> {
        let rows = self.conn.execute(
            "UPDATE pending_order SET initiate_tx_hash = ?1 WHERE slot = 0",
            params![tx_hash],
        )?;
        if rows != 1 {
            return Err(SwapError::StateConflict(
                "no pending order to record the deposit on".to_string(),
            ));
        }
        Ok(())
    }

    fn set_interface_id(&mut self, interface_id: &str) -> SwapResult<()> {
        let rows = self.conn.execute(
            "UPDATE pending_order SET interface_id = ?1 WHERE slot = 0",
            params![interface_id],
        )?;
        if rows != 1 {
            return Err(SwapError::StateConflict(
                "no pending order to attach the interface to".to_string(),
            ));
        }
        Ok(())
    }

    fn clear(&mut self) -> SwapResult<()> {
        self.conn
            .execute("DELETE FROM pending_order WHERE slot = 0", [])?;
        Ok(())
    }
}

fn migrate(conn: &Connection) -> SwapResult<()> {
    conn.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS pending_order (
  slot INTEGER PRIMARY KEY CHECK (slot = 0),
  order_id TEXT NOT NULL,
  secret TEXT NOT NULL,
  interface_id TEXT,
  initiate_tx_hash TEXT
);
"#,
    )?;
    Ok(())
}

/// Volatile store for embedders that manage durability themselves, and for
/// exercising the coordinator in tests.
#[derive(Debug, Default)]
pub struct MemoryOrderStore {
    state: Option<OrderState>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OrderStateStore for MemoryOrderStore {
    fn get(&self) -> SwapResult<Option<OrderState>> {
        Ok(self.state.clone())
    }

    fn set(&mut self, state: &OrderState) -> SwapResult<()> {
        self.state = Some(state.clone());
        Ok(())
    }

    fn set_initiate_tx_hash(&mut self, tx_hash: &str) -> SwapResult<()> {
        match &mut self.state {
            Some(state) => {
                state.initiate_tx_hash = Some(tx_hash.to_string());
                Ok(())
            }
            None => Err(SwapError::StateConflict(
                "no pending order to record the deposit on".to_string(),
            )),
        }
    }

    fn set_interface_id(&mut self, interface_id: &str) -> SwapResult<()> {
        match &mut self.state {
            Some(state) => {
                state.interface_id = Some(interface_id.to_string());
                Ok(())
            }
            None => Err(SwapError::StateConflict(
                "no pending order to attach the interface to".to_string(),
            )),
        }
    }

    fn clear(&mut self) -> SwapResult<()> {
        self.state = None;
        Ok(())
    }
}
