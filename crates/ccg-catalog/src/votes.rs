//! Vote counting
//!
//! The catalog only needs to read vote counts, through [`VoteCounter`].
//! [`VoteLedger`] is the in-memory implementation: one vote per user per
//! resource, toggled on and off.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use ccg_rbac::{Action, Actor, ResourceKind};

use crate::access::require;
use crate::error::CatalogResult;
use crate::store::MemoryStore;

/// Read access to vote counts.
#[async_trait]
pub trait VoteCounter: Send + Sync {
    /// Votes for one resource; 0 if it has none.
    async fn vote_count(&self, resource_id: Uuid) -> u64;

    /// Votes for several resources at once.
    async fn vote_counts(&self, resource_ids: &[Uuid]) -> HashMap<Uuid, u64> {
        let mut counts = HashMap::with_capacity(resource_ids.len());
        for &id in resource_ids {
            counts.insert(id, self.vote_count(id).await);
        }
        counts
    }
}

/// What a toggle did.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VoteAction {
    /// A vote was added
    Voted,
    /// The existing vote was removed
    Unvoted,
}

/// Result of [`VoteLedger::toggle_vote`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct VoteOutcome {
    /// What happened
    pub action: VoteAction,
    /// Votes after the toggle
    pub votes_count: u64,
}

/// In-memory vote storage.
#[derive(Debug)]
pub struct VoteLedger {
    store: Arc<MemoryStore>,
    votes: RwLock<HashMap<Uuid, HashSet<Uuid>>>,
}

impl VoteLedger {
    /// Create a ledger for resources in `store`.
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self {
            store,
            votes: RwLock::new(HashMap::new()),
        }
    }

    /// Add the actor's vote, or remove it if already cast.
    ///
    /// The resource's row lock is held from the liveness check until the
    /// vote is recorded, so a concurrent delete either happens first and
    /// the vote is refused, or waits for the vote. The check and the change
    /// happen under one write lock, so concurrent toggles never lose a vote.
    pub async fn toggle_vote(&self, actor: &Actor, resource_id: Uuid) -> CatalogResult<VoteOutcome> {
        require(actor, ResourceKind::Vote, Action::Vote)?;

        // Read-only: nothing is staged, the transaction only carries the lock
        let mut row = self.store.begin();
        row.lock_live_resource(resource_id).await?;

        let mut votes = self.votes.write().await;
        let voters = votes.entry(resource_id).or_default();
        let action = if voters.remove(&actor.id) {
            VoteAction::Unvoted
        } else {
            voters.insert(actor.id);
            VoteAction::Voted
        };
        let votes_count = voters.len() as u64;

        info!(%resource_id, user_id = %actor.id, ?action, votes_count, "Vote toggled");
        Ok(VoteOutcome { action, votes_count })
    }

    /// Check whether a user has voted for a resource.
    pub async fn has_voted(&self, user_id: Uuid, resource_id: Uuid) -> bool {
        let votes = self.votes.read().await;
        votes.get(&resource_id).is_some_and(|voters| voters.contains(&user_id))
    }

    /// Resources a user has voted for.
    pub async fn voted_resources(&self, user_id: Uuid) -> Vec<Uuid> {
        let votes = self.votes.read().await;
        votes
            .iter()
            .filter(|(_, voters)| voters.contains(&user_id))
            .map(|(resource_id, _)| *resource_id)
            .collect()
    }
}

#[async_trait]
impl VoteCounter for VoteLedger {
    async fn vote_count(&self, resource_id: Uuid) -> u64 {
        let votes = self.votes.read().await;
        votes.get(&resource_id).map_or(0, |voters| voters.len() as u64)
    }

    async fn vote_counts(&self, resource_ids: &[Uuid]) -> HashMap<Uuid, u64> {
        let votes = self.votes.read().await;
        resource_ids
            .iter()
            .map(|id| (*id, votes.get(id).map_or(0, |voters| voters.len() as u64)))
            .collect()
    }
}
