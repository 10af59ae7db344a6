//! Conversions between WhatsApp JIDs and bridge network ids.
//!
//! User ids and login ids are the bare phone number; portal ids are the full
//! non-AD JID so the server stays recoverable.

use mxwa_bridge::networkid::{PortalId, UserId, UserLoginId};

use crate::jid::{Jid, JidParseError, Server, device_jid, new_jid};

pub fn make_user_id(jid: &Jid) -> UserId {
    UserId(jid.user.clone())
}

pub fn parse_user_id(user: &UserId) -> Jid {
    new_jid(user.as_str(), &Server::DefaultUser)
}

pub fn make_user_login_id(jid: &Jid) -> UserLoginId {
    UserLoginId(jid.user.clone())
}

/// Rebuild a device JID from a login id and the stored device number.
pub fn parse_user_login_id(login: &UserLoginId, device: u16) -> Jid {
    device_jid(login.as_str(), 0, device)
}

pub fn make_portal_id(jid: &Jid) -> PortalId {
    PortalId(jid.to_non_ad().to_string())
}

pub fn parse_portal_id(portal: &PortalId) -> Result<Jid, JidParseError> {
    portal.as_str().parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn portal_id_round_trip_drops_device() {
        let jid = device_jid("111", 0, 7);
        let portal = make_portal_id(&jid);
        assert_eq!(portal.as_str(), "111@s.whatsapp.net");
        assert_eq!(parse_portal_id(&portal).unwrap(), jid.to_non_ad());
    }

    #[test]
    fn login_id_keeps_device_separately() {
        let jid = device_jid("111", 0, 7);
        let login = make_user_login_id(&jid);
        assert_eq!(login.as_str(), "111");
        assert_eq!(parse_user_login_id(&login, 7), jid);
    }

    #[test]
    fn user_id_is_phone_number() {
        let jid: Jid = "4477@s.whatsapp.net".parse().unwrap();
        let user = make_user_id(&jid);
        assert_eq!(user.as_str(), "4477");
        assert_eq!(parse_user_id(&user), jid);
    }
}
