//! # Strata: Process Hierarchy and Impact Propagation
//!
//! Strata keeps a three-level (A/B/C) business-process hierarchy as relational
//! edges and answers "what is affected if I change this" across applications,
//! interfaces, business processes, technical processes and change requests.
//!
//! ## Design Philosophy
//!
//! - **Edges, not object graphs** - the hierarchy lives in relationship rows; walks are iterative with a visited set
//! - **One transaction per mutation** - move, duplicate and delete cascade commit or roll back as a whole
//! - **Bounded propagation** - impact stops after one indirect hop
//! - **Partial results over failure** - analyses skip unknown seeds instead of raising
//! - **Derived diagrams** - any change to a process's interface set drops its cached diagram
//!
//! ## Quick Start
//!
//! ```
//! use strata::{EntityStore, Level, NewBusinessProcess, Strata};
//!
//! let mut strata = Strata::in_memory();
//! let store = strata.store_mut();
//! let order = store.create_process(NewBusinessProcess::named("Order to cash", Level::A))?;
//! let billing = store.create_process(NewBusinessProcess::named("Billing", Level::A))?;
//!
//! // Attach "Billing" under "Order to cash"; its level follows the parent.
//! let moved = strata.hierarchy().move_process(billing.id, Some(order.id), None)?;
//! assert_eq!(moved.level, Level::B);
//!
//! let preview = strata.hierarchy().preview_deletion(order.id)?;
//! assert_eq!(preview.orphaned_children.len(), 1);
//! # Ok::<(), strata::Error>(())
//! ```

pub mod assignments;
pub mod config;
pub mod diagram;
mod error;
pub mod hierarchy;
pub mod impact;
pub mod risk;
pub mod store;
mod types;

pub use assignments::{Assignment, InterfaceAssignments};
pub use config::StrataConfig;
pub use diagram::DiagramCache;
pub use error::{Error, Result};
pub use hierarchy::{DeletionImpact, Hierarchy, HierarchyAudit, LevelMismatch, ProcessTree};
pub use impact::ImpactAnalyzer;
pub use risk::{RiskLevel, RiskTables};
pub use store::{EntityStore, InMemoryStore, SqliteStore, in_transaction};
pub use types::{
    Application, ApplicationId, BusinessProcess, ChangeRequest, ChangeRequestId,
    ChangeRequestStatus, Diagram, ImpactLink, Interface, InterfaceId, Level, NewApplication,
    NewBusinessProcess, NewChangeRequest, NewImpactLink, NewInterface, NewProcessInterface,
    NewRelationship, NewTechnicalProcess, ProcessId, ProcessInterface, Relationship,
    RelationshipType, SequencedProcess, TechnicalProcess, TechnicalProcessId,
};

use tracing::info;

/// A store paired with its configuration.
///
/// `Strata` is the main entry point. It owns an [`EntityStore`] and hands out
/// short-lived views over it: [`Hierarchy`] for the process tree,
/// [`ImpactAnalyzer`] for read-only analyses, [`InterfaceAssignments`] and
/// [`DiagramCache`] for the join table and cached diagrams.
#[derive(Debug)]
pub struct Strata<S: EntityStore = SqliteStore> {
    store: S,
    config: StrataConfig,
}

impl Strata<SqliteStore> {
    /// Open (creating if needed) the `SQLite` database named by `config`.
    ///
    /// # Errors
    ///
    /// `Error::Io` if the database directory cannot be created,
    /// `Error::Database` if the database cannot be opened or migrated.
    pub fn open(config: StrataConfig) -> Result<Self> {
        let store = SqliteStore::open(&config.database)?;
        info!(database = %config.database.display(), "Opened strata database");
        Ok(Self { store, config })
    }
}

impl Strata<InMemoryStore> {
    /// An empty in-memory instance with default configuration.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::with_store(InMemoryStore::new(), StrataConfig::default())
    }
}

impl<S: EntityStore> Strata<S> {
    /// Wrap an existing store.
    pub fn with_store(store: S, config: StrataConfig) -> Self {
        Self { store, config }
    }

    /// Hierarchy operations.
    pub fn hierarchy(&mut self) -> Hierarchy<'_, S> {
        Hierarchy::new(&mut self.store)
    }

    /// Impact analyses using the configured risk tables.
    pub fn impact(&self) -> ImpactAnalyzer<'_, S> {
        ImpactAnalyzer::new(&self.store, &self.config.risk)
    }

    /// Interface assignment mutations.
    pub fn assignments(&mut self) -> InterfaceAssignments<'_, S> {
        InterfaceAssignments::new(&mut self.store)
    }

    /// Cached diagram access.
    pub fn diagrams(&mut self) -> DiagramCache<'_, S> {
        DiagramCache::new(&mut self.store)
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The underlying store, for inventory writes the views don't cover.
    ///
    /// Store writes never touch cached diagrams. Changes to a process's
    /// interface set belong in [`Strata::assignments`], which invalidates
    /// the affected diagrams in the same transaction.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Active configuration.
    pub fn config(&self) -> &StrataConfig {
        &self.config
    }

    /// Give back the store.
    pub fn into_store(self) -> S {
        self.store
    }
}
