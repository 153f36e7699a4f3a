/// How a term participates in a query.
///
/// The discriminants are the wire values used by the query syntax and the
/// order in which the engine request lists the roles.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum Role {
    /// Every document must contain the term (AND).
    Require = 0,
    /// Documents must contain at least one of the contain terms (OR).
    Contain = 1,
    /// Documents must not contain the term (AND-NOT).
    Exclude = 2,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Require, Role::Contain, Role::Exclude];

    pub fn from_digit(digit: u8) -> Option<Role> {
        match digit {
            b'0' => Some(Role::Require),
            b'1' => Some(Role::Contain),
            b'2' => Some(Role::Exclude),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Role::Require => "require",
            Role::Contain => "contain",
            Role::Exclude => "exclude",
        }
    }
}

/// One ordered list per role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByRole<T> {
    pub require: Vec<T>,
    pub contain: Vec<T>,
    pub exclude: Vec<T>,
}

impl<T> Default for ByRole<T> {
    fn default() -> Self {
        ByRole {
            require: Vec::new(),
            contain: Vec::new(),
            exclude: Vec::new(),
        }
    }
}

impl<T> ByRole<T> {
    pub fn new() -> ByRole<T> {
        Default::default()
    }

    pub fn get(&self, role: Role) -> &Vec<T> {
        match role {
            Role::Require => &self.require,
            Role::Contain => &self.contain,
            Role::Exclude => &self.exclude,
        }
    }

    pub fn get_mut(&mut self, role: Role) -> &mut Vec<T> {
        match role {
            Role::Require => &mut self.require,
            Role::Contain => &mut self.contain,
            Role::Exclude => &mut self.exclude,
        }
    }

    pub fn push(&mut self, role: Role, item: T) {
        self.get_mut(role).push(item);
    }

    /// Total number of items across all roles.
    pub fn len(&self) -> usize {
        self.require.len() + self.contain.len() + self.exclude.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates items in role order, then list order.
    pub fn iter(&self) -> impl Iterator<Item = (Role, &T)> {
        Role::ALL
            .into_iter()
            .flat_map(move |role| self.get(role).iter().map(move |item| (role, item)))
    }

    /// Consumes the lists in role order.
    pub fn into_iter_flat(self) -> impl Iterator<Item = (Role, T)> {
        let ByRole {
            require,
            contain,
            exclude,
        } = self;
        require
            .into_iter()
            .map(|t| (Role::Require, t))
            .chain(contain.into_iter().map(|t| (Role::Contain, t)))
            .chain(exclude.into_iter().map(|t| (Role::Exclude, t)))
    }
}

impl<T> FromIterator<(Role, T)> for ByRole<T> {
    fn from_iter<I: IntoIterator<Item = (Role, T)>>(iter: I) -> Self {
        let mut by_role = ByRole::new();
        for (role, item) in iter {
            by_role.push(role, item);
        }
        by_role
    }
}
