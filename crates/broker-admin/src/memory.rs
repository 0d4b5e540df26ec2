//! In-memory administrative backend
//!
//! Keeps vhosts, users and permission grants in hashmaps and mirrors the
//! semantics of the management API: existence-checked creates, `NotFound` on
//! deleting absent entities, cascading deletes of permission grants.
//!
//! Individual operations can be forced to fail, which lets tests inject a
//! failure at any step of a lifecycle flow. Every call is appended to a
//! journal.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;
use tracing::debug;

use crate::client::{AdminClient, Permissions};
use crate::error::{AdminError, Result};

/// Operations of [`AdminClient`], used to select injected failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdminOperation {
    VhostExists,
    CreateVhost,
    DeleteVhost,
    UserExists,
    CreateUser,
    DeleteUser,
    GrantPermissions,
}

#[derive(Debug, Clone)]
struct UserRecord {
    password: String,
    tags: String,
}

#[derive(Debug, Default)]
struct AdminState {
    vhosts: HashMap<String, bool>,
    users: HashMap<String, UserRecord>,
    permissions: HashMap<(String, String), Permissions>,
    failures: HashSet<AdminOperation>,
    journal: Vec<String>,
}

impl AdminState {
    fn enter(&mut self, op: AdminOperation, entry: String) -> Result<()> {
        debug!(operation = ?op, entry = %entry, "In-memory admin call");
        self.journal.push(entry.clone());
        if self.failures.contains(&op) {
            return Err(AdminError::Injected(entry));
        }
        Ok(())
    }
}

/// In-memory administrative backend
#[derive(Debug, Default)]
pub struct InMemoryAdmin {
    state: RwLock<AdminState>,
}

impl InMemoryAdmin {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call of `op` fail
    pub fn fail_on(&self, op: AdminOperation) {
        self.state.write().unwrap().failures.insert(op);
    }

    /// Remove all injected failures
    pub fn clear_failures(&self) {
        self.state.write().unwrap().failures.clear();
    }

    pub fn has_vhost(&self, name: &str) -> bool {
        self.state.read().unwrap().vhosts.contains_key(name)
    }

    pub fn has_user(&self, name: &str) -> bool {
        self.state.read().unwrap().users.contains_key(name)
    }

    /// Tracing flag a vhost was created with
    pub fn vhost_tracing(&self, name: &str) -> Option<bool> {
        self.state.read().unwrap().vhosts.get(name).copied()
    }

    /// Password stored for a user
    pub fn user_password(&self, name: &str) -> Option<String> {
        self.state
            .read()
            .unwrap()
            .users
            .get(name)
            .map(|u| u.password.clone())
    }

    /// Tags stored for a user
    pub fn user_tags(&self, name: &str) -> Option<String> {
        self.state
            .read()
            .unwrap()
            .users
            .get(name)
            .map(|u| u.tags.clone())
    }

    /// Permissions granted to `username` on `vhost`
    pub fn permissions(&self, username: &str, vhost: &str) -> Option<Permissions> {
        self.state
            .read()
            .unwrap()
            .permissions
            .get(&(vhost.to_string(), username.to_string()))
            .cloned()
    }

    pub fn vhost_count(&self) -> usize {
        self.state.read().unwrap().vhosts.len()
    }

    pub fn user_count(&self) -> usize {
        self.state.read().unwrap().users.len()
    }

    pub fn permission_count(&self) -> usize {
        self.state.read().unwrap().permissions.len()
    }

    /// Calls received so far, oldest first
    pub fn journal(&self) -> Vec<String> {
        self.state.read().unwrap().journal.clone()
    }
}

#[async_trait]
impl AdminClient for InMemoryAdmin {
    async fn vhost_exists(&self, name: &str) -> Result<bool> {
        let mut state = self.state.write().unwrap();
        state.enter(AdminOperation::VhostExists, format!("vhost_exists {}", name))?;
        Ok(state.vhosts.contains_key(name))
    }

    async fn create_vhost(&self, name: &str, tracing: bool) -> Result<()> {
        let mut state = self.state.write().unwrap();
        state.enter(AdminOperation::CreateVhost, format!("create_vhost {}", name))?;
        if state.vhosts.contains_key(name) {
            return Err(AdminError::AlreadyExists(format!("vhost {}", name)));
        }
        state.vhosts.insert(name.to_string(), tracing);
        Ok(())
    }

    async fn delete_vhost(&self, name: &str) -> Result<()> {
        let mut state = self.state.write().unwrap();
        state.enter(AdminOperation::DeleteVhost, format!("delete_vhost {}", name))?;
        if state.vhosts.remove(name).is_none() {
            return Err(AdminError::NotFound(format!("vhost {}", name)));
        }
        state.permissions.retain(|(vhost, _), _| vhost != name);
        Ok(())
    }

    async fn user_exists(&self, name: &str) -> Result<bool> {
        let mut state = self.state.write().unwrap();
        state.enter(AdminOperation::UserExists, format!("user_exists {}", name))?;
        Ok(state.users.contains_key(name))
    }

    async fn create_user(&self, name: &str, password: &str) -> Result<()> {
        let mut state = self.state.write().unwrap();
        state.enter(AdminOperation::CreateUser, format!("create_user {}", name))?;
        if state.users.contains_key(name) {
            return Err(AdminError::AlreadyExists(format!("user {}", name)));
        }
        state.users.insert(
            name.to_string(),
            UserRecord {
                password: password.to_string(),
                tags: "management".to_string(),
            },
        );
        Ok(())
    }

    async fn delete_user(&self, name: &str) -> Result<()> {
        let mut state = self.state.write().unwrap();
        state.enter(AdminOperation::DeleteUser, format!("delete_user {}", name))?;
        if state.users.remove(name).is_none() {
            return Err(AdminError::NotFound(format!("user {}", name)));
        }
        state.permissions.retain(|(_, user), _| user != name);
        Ok(())
    }

    async fn grant_all_permissions(&self, username: &str, vhost: &str) -> Result<()> {
        let mut state = self.state.write().unwrap();
        state.enter(
            AdminOperation::GrantPermissions,
            format!("grant_all_permissions {} {}", username, vhost),
        )?;
        if !state.vhosts.contains_key(vhost) {
            return Err(AdminError::NotFound(format!("vhost {}", vhost)));
        }
        if !state.users.contains_key(username) {
            return Err(AdminError::NotFound(format!("user {}", username)));
        }
        state.permissions.insert(
            (vhost.to_string(), username.to_string()),
            Permissions::unrestricted(),
        );
        Ok(())
    }
}
