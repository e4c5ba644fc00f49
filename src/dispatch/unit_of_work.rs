//! Unit of Work
//!
//! One storage session per dispatch. `commit` and `discard` consume the
//! scope so each scope resolves exactly once; both are crate-private and
//! only the dispatcher calls them. A scope dropped before either runs
//! (cancelled dispatch) discards, since sessions roll back on drop.

use uuid::Uuid;

use crate::error::AppResult;
use crate::storage::{Session, Store, UserRepository};

/// Per-dispatch transactional scope
pub struct UnitOfWork {
    id: Uuid,
    session: Box<dyn Session>,
}

impl UnitOfWork {
    /// Begin a fresh session on `store`
    pub(crate) async fn open(store: &dyn Store) -> AppResult<Self> {
        let session = store.begin().await?;
        let id = Uuid::new_v4();
        tracing::trace!(unit_of_work = %id, "Opened");
        Ok(Self { id, session })
    }

    /// Identifier for log correlation
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// User repository bound to this scope's session
    pub fn repository(&mut self) -> &mut dyn UserRepository {
        self.session.repository()
    }

    pub(crate) async fn commit(self) -> AppResult<()> {
        let id = self.id;
        self.session.commit().await?;
        tracing::trace!(unit_of_work = %id, "Committed");
        Ok(())
    }

    pub(crate) async fn discard(self) -> AppResult<()> {
        let id = self.id;
        self.session.discard().await?;
        tracing::trace!(unit_of_work = %id, "Discarded");
        Ok(())
    }
}

impl std::fmt::Debug for UnitOfWork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitOfWork").field("id", &self.id).finish()
    }
}
