//! Registries (C4): wallets, communities, and purpose channels, each keyed
//! by id with a secondary case-insensitive name lookup.

use omnium_spec::{
    Community, CommunityId, OmniumError, OmniumResult, PurposeChannel, PurposeId, TimestampMs,
    Unit, Wallet, WalletId,
};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct WalletRegistry {
    by_id: HashMap<WalletId, Wallet>,
    by_name: HashMap<String, WalletId>,
}

impl WalletRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, id: WalletId, name: String, now: TimestampMs) -> Wallet {
        let wallet = Wallet {
            id: id.clone(),
            name: name.clone(),
            created_at: now,
            communities: vec![],
            purposes: vec![],
        };
        self.by_name.insert(name.to_lowercase(), id.clone());
        self.by_id.insert(id, wallet.clone());
        wallet
    }

    pub fn get(&self, id: &str) -> OmniumResult<&Wallet> {
        self.by_id
            .get(id)
            .ok_or_else(|| OmniumError::WalletUnknown(id.to_string()))
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Wallet> {
        self.by_name
            .get(&name.to_lowercase())
            .and_then(|id| self.by_id.get(id))
    }

    pub fn exists(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn join_community(&mut self, wallet_id: &str, community_id: &str) -> OmniumResult<()> {
        let wallet = self
            .by_id
            .get_mut(wallet_id)
            .ok_or_else(|| OmniumError::WalletUnknown(wallet_id.to_string()))?;
        if !wallet.communities.iter().any(|c| c == community_id) {
            wallet.communities.push(community_id.to_string());
            wallet.communities.sort();
        }
        Ok(())
    }

    pub fn register_purpose(&mut self, wallet_id: &str, purpose_id: &str) -> OmniumResult<()> {
        let wallet = self
            .by_id
            .get_mut(wallet_id)
            .ok_or_else(|| OmniumError::WalletUnknown(wallet_id.to_string()))?;
        if !wallet.purposes.iter().any(|p| p == purpose_id) {
            wallet.purposes.push(purpose_id.to_string());
            wallet.purposes.sort();
        }
        Ok(())
    }

    pub fn list(&self) -> Vec<Wallet> {
        let mut wallets: Vec<Wallet> = self.by_id.values().cloned().collect();
        wallets.sort_by(|a, b| a.id.cmp(&b.id));
        wallets
    }

    pub fn import(wallets: Vec<Wallet>) -> Self {
        let mut registry = Self::default();
        for wallet in wallets {
            registry.by_name.insert(wallet.name.to_lowercase(), wallet.id.clone());
            registry.by_id.insert(wallet.id.clone(), wallet);
        }
        registry
    }
}

#[derive(Debug, Clone, Default)]
pub struct CommunityRegistry {
    by_id: HashMap<CommunityId, Community>,
    by_name: HashMap<String, CommunityId>,
}

impl CommunityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(
        &mut self,
        id: CommunityId,
        name: String,
        description: String,
        boundary_fee: f64,
        now: TimestampMs,
    ) -> OmniumResult<Community> {
        if !(0.0..=1.0).contains(&boundary_fee) {
            return Err(OmniumError::Amount(format!(
                "boundary fee {boundary_fee} must be in [0, 1]"
            )));
        }
        let community = Community {
            id: id.clone(),
            name: name.clone(),
            description,
            boundary_fee,
            created_at: now,
            member_count: 0,
        };
        self.by_name.insert(name.to_lowercase(), id.clone());
        self.by_id.insert(id, community.clone());
        Ok(community)
    }

    pub fn get(&self, id: &str) -> OmniumResult<&Community> {
        self.by_id
            .get(id)
            .ok_or_else(|| OmniumError::CommunityUnknown(id.to_string()))
    }

    pub fn add_member(&mut self, id: &str) -> OmniumResult<()> {
        let community = self
            .by_id
            .get_mut(id)
            .ok_or_else(|| OmniumError::CommunityUnknown(id.to_string()))?;
        community.member_count += 1;
        Ok(())
    }

    /// No-op at a member count of 0.
    pub fn remove_member(&mut self, id: &str) -> OmniumResult<()> {
        let community = self
            .by_id
            .get_mut(id)
            .ok_or_else(|| OmniumError::CommunityUnknown(id.to_string()))?;
        community.member_count = community.member_count.saturating_sub(1);
        Ok(())
    }

    pub fn list(&self) -> Vec<Community> {
        let mut communities: Vec<Community> = self.by_id.values().cloned().collect();
        communities.sort_by(|a, b| a.id.cmp(&b.id));
        communities
    }

    pub fn import(communities: Vec<Community>) -> Self {
        let mut registry = Self::default();
        for community in communities {
            registry
                .by_name
                .insert(community.name.to_lowercase(), community.id.clone());
            registry.by_id.insert(community.id.clone(), community);
        }
        registry
    }

    /// True if `unit` may spend within `community_id`: its locality set is
    /// either empty (global) or contains the community.
    pub fn can_spend_in(&self, unit: &Unit, community_id: &str) -> bool {
        unit.localities.is_empty() || unit.localities.iter().any(|c| c == community_id)
    }

    /// A unit's value as observed from outside its locality set: full value
    /// if global or the target is already a member locality, otherwise
    /// discounted by the compounded boundary fees of every locality it
    /// belongs to.
    pub fn effective_value_outside(&self, unit: &Unit, target: Option<&str>) -> f64 {
        if unit.localities.is_empty() {
            return unit.magnitude;
        }
        if let Some(target) = target {
            if unit.localities.iter().any(|c| c == target) {
                return unit.magnitude;
            }
        }
        unit.localities.iter().fold(unit.magnitude, |value, c| {
            let fee = self.by_id.get(c).map(|c| c.boundary_fee).unwrap_or(0.0);
            value * (1.0 - fee)
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct PurposeRegistry {
    by_id: HashMap<PurposeId, PurposeChannel>,
    by_name: HashMap<String, PurposeId>,
}

impl PurposeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(
        &mut self,
        id: PurposeId,
        name: String,
        description: String,
        conversion_discount: f64,
        now: TimestampMs,
    ) -> OmniumResult<PurposeChannel> {
        if !(0.0..=1.0).contains(&conversion_discount) {
            return Err(OmniumError::Amount(format!(
                "conversion discount {conversion_discount} must be in [0, 1]"
            )));
        }
        let purpose = PurposeChannel {
            id: id.clone(),
            name: name.clone(),
            description,
            recipients: vec![],
            conversion_discount,
            created_at: now,
        };
        self.by_name.insert(name.to_lowercase(), id.clone());
        self.by_id.insert(id, purpose.clone());
        Ok(purpose)
    }

    pub fn get(&self, id: &str) -> OmniumResult<&PurposeChannel> {
        self.by_id
            .get(id)
            .ok_or_else(|| OmniumError::PurposeUnknown(id.to_string()))
    }

    pub fn register_recipient(&mut self, purpose_id: &str, wallet: &str) -> OmniumResult<()> {
        let purpose = self
            .by_id
            .get_mut(purpose_id)
            .ok_or_else(|| OmniumError::PurposeUnknown(purpose_id.to_string()))?;
        if !purpose.recipients.iter().any(|r| r == wallet) {
            purpose.recipients.push(wallet.to_string());
            purpose.recipients.sort();
        }
        Ok(())
    }

    pub fn list(&self) -> Vec<PurposeChannel> {
        let mut purposes: Vec<PurposeChannel> = self.by_id.values().cloned().collect();
        purposes.sort_by(|a, b| a.id.cmp(&b.id));
        purposes
    }

    pub fn import(purposes: Vec<PurposeChannel>) -> Self {
        let mut registry = Self::default();
        for purpose in purposes {
            registry
                .by_name
                .insert(purpose.name.to_lowercase(), purpose.id.clone());
            registry.by_id.insert(purpose.id.clone(), purpose);
        }
        registry
    }
}
