//! Channel roles and the login-refusal rule (spec §4.4).

/// The role a side of a channel declares during login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Producer,
    Consumer,
    Both,
}

impl Role {
    /// Login is refused when both sides declare the same single role: two
    /// producers or two consumers can never exchange data objects. `Both`
    /// never conflicts, since it can play either side.
    pub fn conflicts_with(self, other: Role) -> bool {
        matches!(
            (self, other),
            (Role::Producer, Role::Producer) | (Role::Consumer, Role::Consumer)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_single_role_conflicts() {
        assert!(Role::Producer.conflicts_with(Role::Producer));
        assert!(Role::Consumer.conflicts_with(Role::Consumer));
    }

    #[test]
    fn both_never_conflicts() {
        assert!(!Role::Both.conflicts_with(Role::Both));
        assert!(!Role::Both.conflicts_with(Role::Producer));
        assert!(!Role::Both.conflicts_with(Role::Consumer));
    }

    #[test]
    fn complementary_roles_do_not_conflict() {
        assert!(!Role::Producer.conflicts_with(Role::Consumer));
        assert!(!Role::Consumer.conflicts_with(Role::Producer));
    }
}
