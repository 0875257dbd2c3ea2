#![allow(dead_code)]

use std::{
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    },
};

use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use uuid::Uuid;

use engine::{
    Currency, CurrencyTotals, Denomination, DenominationBreakdown, DiskStorage, Engine,
    EngineError, OpenCajaCmd, ReceiptStorage, StoredFile, Upload,
};
use migration::MigratorTrait;

pub struct Fixture {
    pub engine: Engine,
    pub db: DatabaseConnection,
    pub uploads: PathBuf,
    pub branch_id: i32,
    pub case_id: i32,
}

impl Fixture {
    /// Files currently in the uploads directory.
    pub fn stored_files(&self) -> usize {
        std::fs::read_dir(&self.uploads)
            .map(|dir| dir.count())
            .unwrap_or(0)
    }

    pub async fn count(&self, sql: &str) -> i64 {
        let backend = self.db.get_database_backend();
        let row = self
            .db
            .query_one(Statement::from_string(backend, sql.to_string()))
            .await
            .unwrap()
            .unwrap();
        row.try_get_by_index::<i64>(0).unwrap()
    }

    pub async fn execute(&self, sql: &str) {
        let backend = self.db.get_database_backend();
        self.db
            .execute(Statement::from_string(backend, sql.to_string()))
            .await
            .unwrap();
    }

    /// Opens a register on the fixture case with `pyg` guaraníes.
    pub async fn open(&self, pyg: i64) -> i32 {
        self.engine
            .open_caja(OpenCajaCmd::new(self.branch_id, 1, self.case_id, breakdown(pyg)))
            .await
            .unwrap()
            .id
    }

    /// Opens a register on a fresh case of the fixture branch.
    pub async fn open_on_new_case(&self, code: &str) -> i32 {
        let case = self.engine.new_case(self.branch_id, code).await.unwrap();
        self.engine
            .open_caja(OpenCajaCmd::new(self.branch_id, 1, case.id, breakdown(0)))
            .await
            .unwrap()
            .id
    }
}

pub fn uploads_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../target/test_uploads")
        .join(Uuid::new_v4().to_string())
}

pub async fn fixture() -> Fixture {
    let uploads = uploads_root();
    let storage = Arc::new(DiskStorage::new(&uploads, "http://localhost:3000"));
    fixture_with_storage(storage, uploads).await
}

pub async fn fixture_with_storage(storage: Arc<dyn ReceiptStorage>, uploads: PathBuf) -> Fixture {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .storage(storage)
        .build()
        .await
        .unwrap();

    let branch = engine.new_branch("Central").await.unwrap();
    let case = engine.new_case(branch.id, "M-01").await.unwrap();

    Fixture {
        engine,
        db,
        uploads,
        branch_id: branch.id,
        case_id: case.id,
    }
}

pub fn breakdown(pyg: i64) -> DenominationBreakdown {
    let denominations = if pyg > 0 {
        vec![Denomination {
            value: Decimal::from(pyg),
            count: 1,
            currency: Currency::Pyg,
        }]
    } else {
        Vec::new()
    };
    DenominationBreakdown::from_parts(
        Some(denominations),
        Some(CurrencyTotals::new(Decimal::from(pyg), Decimal::ZERO, Decimal::ZERO)),
    )
    .unwrap()
}

pub fn upload(name: &str) -> Upload {
    Upload::new(Some(name.to_string()), b"receipt".to_vec())
}

/// Disk storage whose first `remove` of every file fails.
#[derive(Debug)]
pub struct FlakyStorage {
    pub inner: DiskStorage,
    pub removes: AtomicU32,
}

impl FlakyStorage {
    pub fn new(inner: DiskStorage) -> Self {
        Self {
            inner,
            removes: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl ReceiptStorage for FlakyStorage {
    async fn store(&self, upload: &Upload) -> Result<StoredFile, EngineError> {
        self.inner.store(upload).await
    }

    async fn remove(&self, filename: &str) -> Result<(), EngineError> {
        if self.removes.fetch_add(1, Ordering::SeqCst) % 2 == 0 {
            return Err(EngineError::Storage("disk busy".to_string()));
        }
        self.inner.remove(filename).await
    }

    async fn read(&self, filename: &str) -> Result<Vec<u8>, EngineError> {
        self.inner.read(filename).await
    }

    fn public_url(&self, relative: &str) -> String {
        self.inner.public_url(relative)
    }
}
