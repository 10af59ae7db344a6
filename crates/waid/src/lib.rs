//! WhatsApp identifiers and the metadata the connector persists through the
//! bridge.

pub mod ids;
pub mod jid;
pub mod metadata;

pub use {
    ids::{
        make_portal_id, make_user_id, make_user_login_id, parse_portal_id, parse_user_id,
        parse_user_login_id,
    },
    jid::{
        Jid, JidExt, JidParseError, Server, device_jid, is_status_broadcast, new_jid,
        status_broadcast_jid,
    },
    metadata::{GroupInviteMeta, MessageMetadata, PortalMetadata, UserLoginMetadata},
};
