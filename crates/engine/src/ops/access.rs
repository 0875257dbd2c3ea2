use sea_orm::{DatabaseTransaction, prelude::*};

use crate::{EngineError, ResultEngine, branches, cajas, cases, cash_operations};

use super::Engine;

/// Generates a `require_*` method loading a row by primary key or failing
/// with [`EngineError::KeyNotFound`].
macro_rules! impl_require {
    ($require_fn:ident, $entity:path, $model:path, $err_msg:literal) => {
        pub(super) async fn $require_fn(
            &self,
            db: &DatabaseTransaction,
            id: i32,
        ) -> ResultEngine<$model> {
            <$entity>::find_by_id(id)
                .one(db)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(format!($err_msg, id)))
        }
    };
}

impl Engine {
    impl_require!(
        require_branch,
        branches::Entity,
        branches::Model,
        "branch {} not exists"
    );

    impl_require!(
        require_case,
        cases::Entity,
        cases::Model,
        "case {} not exists"
    );

    impl_require!(
        require_caja,
        cajas::Entity,
        cajas::Model,
        "caja {} not exists"
    );

    impl_require!(
        require_cash_operation,
        cash_operations::Entity,
        cash_operations::Model,
        "withdrawal {} not exists"
    );

    /// Loads a register that must already be closed.
    pub(super) async fn require_closed_caja(
        &self,
        db: &DatabaseTransaction,
        caja_id: i32,
    ) -> ResultEngine<cajas::Model> {
        let model = self.require_caja(db, caja_id).await?;
        if model.status()?.is_open() {
            return Err(EngineError::Validation(format!(
                "caja {caja_id} is not closed"
            )));
        }
        Ok(model)
    }
}
