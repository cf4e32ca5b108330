//! `^L` / `^LACK` login handshake (spec §4.4).

use uuid::Uuid;

use crate::role::Role;

/// One object-code a side offers to consume, with the lossless flag spec.md
/// encodes as a leading `+` in the wire form (`+ObjCode` vs `ObjCode`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumedCodeAnnounce {
    pub object_code: String,
    pub lossless: bool,
}

impl ConsumedCodeAnnounce {
    pub fn encode(&self) -> String {
        if self.lossless {
            format!("+{}", self.object_code)
        } else {
            self.object_code.clone()
        }
    }

    pub fn parse(token: &str) -> Self {
        match token.strip_prefix('+') {
            Some(rest) => ConsumedCodeAnnounce { object_code: rest.to_string(), lossless: true },
            None => ConsumedCodeAnnounce { object_code: token.to_string(), lossless: false },
        }
    }
}

/// `^L`: the initiating side's login offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Login {
    pub uuid: Uuid,
    pub role: Role,
    pub name: String,
    pub version: String,
    pub core_version: String,
    pub user_label: Option<String>,
    pub consumed: Vec<ConsumedCodeAnnounce>,
}

/// `^LACK`: the accepting side's reply, same shape plus an accepted flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginAck {
    pub uuid: Uuid,
    pub role: Role,
    pub name: String,
    pub version: String,
    pub core_version: String,
    pub user_label: Option<String>,
    pub consumed: Vec<ConsumedCodeAnnounce>,
    pub accepted: bool,
    pub refusal_reason: Option<String>,
}

impl Login {
    /// Decide whether `other`'s declared role conflicts with ours, per the
    /// spec's "same single role" refusal rule.
    pub fn refuses(&self, other_role: Role) -> bool {
        self.role.conflicts_with(other_role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consumed_code_round_trips_lossless_flag() {
        let lossless = ConsumedCodeAnnounce { object_code: "Ping".into(), lossless: true };
        let plain = ConsumedCodeAnnounce { object_code: "Pong".into(), lossless: false };
        assert_eq!(ConsumedCodeAnnounce::parse(&lossless.encode()), lossless);
        assert_eq!(ConsumedCodeAnnounce::parse(&plain.encode()), plain);
        assert_eq!(lossless.encode(), "+Ping");
        assert_eq!(plain.encode(), "Pong");
    }

    #[test]
    fn login_refuses_matching_single_role() {
        let login = Login {
            uuid: Uuid::nil(),
            role: Role::Producer,
            name: "a".into(),
            version: "1".into(),
            core_version: "1".into(),
            user_label: None,
            consumed: vec![],
        };
        assert!(login.refuses(Role::Producer));
        assert!(!login.refuses(Role::Consumer));
        assert!(!login.refuses(Role::Both));
    }
}
