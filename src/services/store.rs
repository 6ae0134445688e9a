//! In-process document store.
//!
//! Every collection lives behind a single `RwLock`. Callers pass a closure
//! to [`Store::read`] or [`Store::write`]; the closure runs with the guard
//! held, so a rule check and the mutation it guards are one atomic step.
//! When a snapshot path is configured, dirty state is written out as JSON
//! via a temp file and rename.

use crate::models::{Complaint, Notification, QrIntent, RedeemRequest, Transaction, User};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Collections {
    pub users: HashMap<Uuid, User>,
    pub transactions: Vec<Transaction>,
    pub redeem_requests: HashMap<Uuid, RedeemRequest>,
    pub complaints: HashMap<Uuid, Complaint>,
    pub notifications: Vec<Notification>,
    pub qr_intents: HashMap<String, QrIntent>,
}

impl Collections {
    pub fn user_by_email(&self, email: &str) -> Option<&User> {
        self.users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
    }

    pub fn transaction_mut(&mut self, id: Uuid) -> Option<&mut Transaction> {
        self.transactions.iter_mut().rev().find(|t| t.id == id)
    }
}

pub struct Store {
    data: RwLock<Collections>,
    path: Option<PathBuf>,
    dirty: AtomicBool,
}

impl Store {
    pub fn in_memory() -> Self {
        Self {
            data: RwLock::new(Collections::default()),
            path: None,
            dirty: AtomicBool::new(false),
        }
    }

    /// Opens a store backed by `path`, loading the snapshot if one exists.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let data = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let data: Collections = serde_json::from_slice(&bytes)
                    .with_context(|| format!("Corrupt snapshot at {}", path.display()))?;
                tracing::info!(
                    users = data.users.len(),
                    transactions = data.transactions.len(),
                    "Loaded snapshot from {}",
                    path.display()
                );
                data
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No snapshot at {}, starting empty", path.display());
                Collections::default()
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()));
            }
        };

        Ok(Self {
            data: RwLock::new(data),
            path: Some(path),
            dirty: AtomicBool::new(false),
        })
    }

    pub fn is_persistent(&self) -> bool {
        self.path.is_some()
    }

    pub async fn read<R>(&self, f: impl FnOnce(&Collections) -> R) -> R {
        let guard = self.data.read().await;
        f(&guard)
    }

    /// Runs `f` under the write lock. The store is marked dirty whether or
    /// not `f` succeeds, since failed operations may still append records.
    pub async fn write<R>(&self, f: impl FnOnce(&mut Collections) -> R) -> R {
        let mut guard = self.data.write().await;
        let result = f(&mut guard);
        self.dirty.store(true, Ordering::Release);
        result
    }

    /// Writes the snapshot if anything changed. Returns whether a write happened.
    pub async fn flush(&self) -> Result<bool> {
        let Some(path) = &self.path else {
            return Ok(false);
        };
        if !self.dirty.swap(false, Ordering::AcqRel) {
            return Ok(false);
        }

        let bytes = {
            let guard = self.data.read().await;
            serde_json::to_vec(&*guard).context("Failed to serialize snapshot")
        };
        let bytes = match bytes {
            Ok(bytes) => bytes,
            Err(e) => {
                self.dirty.store(true, Ordering::Release);
                return Err(e);
            }
        };

        if let Err(e) = write_atomically(path, &bytes).await {
            self.dirty.store(true, Ordering::Release);
            return Err(e);
        }

        tracing::debug!(bytes = bytes.len(), "Snapshot written to {}", path.display());
        Ok(true)
    }
}

async fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let tmp = path.with_extension("tmp");
    tokio::fs::write(&tmp, bytes)
        .await
        .with_context(|| format!("Failed to write {}", tmp.display()))?;
    tokio::fs::rename(&tmp, path)
        .await
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}
