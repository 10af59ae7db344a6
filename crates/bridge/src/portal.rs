use crate::{
    chatinfo::ChatInfo,
    networkid::{PortalId, UserLoginId},
};

/// A bridged room and the connector metadata attached to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Portal<M> {
    pub id: PortalId,
    /// Login that owns the portal; empty for portals shared between logins.
    pub receiver: UserLoginId,
    pub metadata: M,
}

impl<M> Portal<M> {
    pub fn new(id: PortalId, receiver: UserLoginId, metadata: M) -> Self {
        Self {
            id,
            receiver,
            metadata,
        }
    }

    /// Apply the extra updaters carried by a chat info. Returns true when the
    /// metadata changed and the portal should be saved.
    pub fn apply_extra_updates(&mut self, info: &ChatInfo<M>) -> bool {
        if info.extra_updates.is_empty() {
            return false;
        }
        info.extra_updates.apply(&mut self.metadata)
    }
}
