//! Port contracts for transactional board storage.

mod error;
mod transaction;

pub use error::{
    PENDING_INVITATION_CONSTRAINT, StoreError, StoreResult, TASK_SLOT_CONSTRAINT,
};
pub use transaction::{StoreTransaction, TransactionalStore};

#[cfg(test)]
pub use transaction::MockStoreTransaction;
