// src/oplog.rs
//
// Append-only audit trail: one timestamped line per scheduler event, one
// file per run day. Never read back by the operator.
use crate::error::OperatorResult;
use chrono::Utc;
use std::io::Write;
use std::path::PathBuf;

pub struct OperationLog {
    path: PathBuf,
}

impl OperationLog {
    pub fn open(dir: &std::path::Path) -> OperatorResult<Self> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("operations-{}.log", Utc::now().date_naive()));
        Ok(Self { path })
    }

    /// Append one line. The log is an audit aid, so a write failure is
    /// reported to diagnostics and otherwise ignored.
    pub fn record(&self, message: &str) {
        if let Err(e) = self.append(message) {
            tracing::warn!(error = %e, "operations log write failed");
        }
    }

    fn append(&self, message: &str) -> std::io::Result<()> {
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "[{}] {message}", Utc::now().to_rfc3339())
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}
