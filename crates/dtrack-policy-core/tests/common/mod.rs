//! In-memory Dependency-Track stand-in shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use dtrack_policy_core::{
    ApplyError, ConditionOperator, ConditionSpec, ConditionSubject, Policy, PolicyAccessor,
    PolicyCondition, PolicyOperator, Project, Tag, ViolationState,
};
use uuid::Uuid;

/// One remote call, as observed by [`FakeRemote`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Call {
    FetchPolicy(String),
    CreatePolicy(String),
    UpdatePolicy(PolicyOperator, ViolationState),
    AttachTag(String),
    DetachTag(String),
    LookupProject(String, String),
    LookupProjects(String),
    AttachProject(Uuid),
    DetachProject(Uuid),
    CreateCondition(ConditionSpec),
    DeleteCondition(Uuid),
}

impl Call {
    pub fn is_mutation(&self) -> bool {
        !matches!(
            self,
            Self::FetchPolicy(_) | Self::LookupProject(..) | Self::LookupProjects(_)
        )
    }
}

#[derive(Default)]
struct State {
    policy: Option<Policy>,
    projects: Vec<Project>,
    calls: Vec<Call>,
    not_found: HashSet<Call>,
    failing: HashSet<Call>,
    tag_added_on_update: Option<Tag>,
}

/// Holds at most one policy and a project catalogue; every call is logged
/// and applied to the stored policy so repeated runs observe earlier ones.
#[derive(Default)]
pub struct FakeRemote {
    state: Mutex<State>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(self, policy: Policy) -> Self {
        self.state.lock().unwrap().policy = Some(policy);
        self
    }

    pub fn with_project(self, project: Project) -> Self {
        self.state.lock().unwrap().projects.push(project);
        self
    }

    /// Makes `call` answer `NotFound` without touching state.
    pub fn not_found_on(self, call: Call) -> Self {
        self.state.lock().unwrap().not_found.insert(call);
        self
    }

    /// Makes `call` answer with a transport error.
    pub fn fail_on(self, call: Call) -> Self {
        self.state.lock().unwrap().failing.insert(call);
        self
    }

    /// Simulates another writer: the next update response carries `tag`.
    pub fn tag_added_on_update(self, tag: &str) -> Self {
        self.state.lock().unwrap().tag_added_on_update = Some(Tag::new(tag));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn mutations(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutation).collect()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn policy(&self) -> Option<Policy> {
        self.state.lock().unwrap().policy.clone()
    }

    fn enter(&self, call: Call) -> Result<std::sync::MutexGuard<'_, State>, ApplyError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call.clone());
        if state.failing.contains(&call) {
            return Err(ApplyError::transport(format!("injected failure on {call:?}")));
        }
        if state.not_found.contains(&call) {
            return Err(ApplyError::not_found("fake", format!("{call:?}")));
        }
        Ok(state)
    }
}

fn owned_policy<'a>(state: &'a mut State, id: Uuid) -> Result<&'a mut Policy, ApplyError> {
    state
        .policy
        .as_mut()
        .filter(|p| p.uuid == id)
        .ok_or_else(|| ApplyError::not_found("policy", id.to_string()))
}

#[async_trait]
impl PolicyAccessor for FakeRemote {
    async fn policy_by_name(&self, name: &str) -> Result<Policy, ApplyError> {
        let state = self.enter(Call::FetchPolicy(name.to_string()))?;
        state
            .policy
            .clone()
            .filter(|p| p.name == name)
            .ok_or_else(|| ApplyError::not_found("policy", name))
    }

    async fn create_policy(&self, name: &str) -> Result<Policy, ApplyError> {
        let mut state = self.enter(Call::CreatePolicy(name.to_string()))?;
        // Mirrors the server defect: operator and violation state are not
        // taken from the create request.
        let policy = policy(name, PolicyOperator::Any, ViolationState::Info);
        state.policy = Some(policy.clone());
        Ok(policy)
    }

    async fn update_policy(&self, policy: &Policy) -> Result<Policy, ApplyError> {
        let mut state = self.enter(Call::UpdatePolicy(policy.operator, policy.violation_state))?;
        let extra = state.tag_added_on_update.take();
        let stored = owned_policy(&mut state, policy.uuid)?;
        stored.tags.extend(extra);
        stored.operator = policy.operator;
        stored.violation_state = policy.violation_state;
        Ok(stored.clone())
    }

    async fn attach_tag(&self, policy: Uuid, tag: &str) -> Result<(), ApplyError> {
        let mut state = self.enter(Call::AttachTag(tag.to_string()))?;
        owned_policy(&mut state, policy)?.tags.push(Tag::new(tag));
        Ok(())
    }

    async fn detach_tag(&self, policy: Uuid, tag: &str) -> Result<(), ApplyError> {
        let mut state = self.enter(Call::DetachTag(tag.to_string()))?;
        owned_policy(&mut state, policy)?
            .tags
            .retain(|t| t.name != tag);
        Ok(())
    }

    async fn project_by_name_version(
        &self,
        name: &str,
        version: &str,
    ) -> Result<Project, ApplyError> {
        let state = self.enter(Call::LookupProject(name.to_string(), version.to_string()))?;
        state
            .projects
            .iter()
            .find(|p| p.name == name && p.version.as_deref() == Some(version))
            .cloned()
            .ok_or_else(|| ApplyError::not_found("project", format!("{name}:{version}")))
    }

    async fn projects_by_name(&self, name: &str) -> Result<Vec<Project>, ApplyError> {
        let state = self.enter(Call::LookupProjects(name.to_string()))?;
        Ok(state
            .projects
            .iter()
            .filter(|p| p.name == name)
            .cloned()
            .collect())
    }

    async fn attach_project(&self, policy: Uuid, project: Uuid) -> Result<(), ApplyError> {
        let mut state = self.enter(Call::AttachProject(project))?;
        let found = state
            .projects
            .iter()
            .find(|p| p.uuid == project)
            .cloned()
            .ok_or_else(|| ApplyError::not_found("project", project.to_string()))?;
        owned_policy(&mut state, policy)?.projects.push(found);
        Ok(())
    }

    async fn detach_project(&self, policy: Uuid, project: Uuid) -> Result<(), ApplyError> {
        let mut state = self.enter(Call::DetachProject(project))?;
        owned_policy(&mut state, policy)?
            .projects
            .retain(|p| p.uuid != project);
        Ok(())
    }

    async fn create_condition(
        &self,
        policy: Uuid,
        condition: &ConditionSpec,
    ) -> Result<PolicyCondition, ApplyError> {
        let mut state = self.enter(Call::CreateCondition(condition.clone()))?;
        let created = PolicyCondition {
            uuid: Uuid::new_v4(),
            ..PolicyCondition::unsaved(condition)
        };
        owned_policy(&mut state, policy)?
            .policy_conditions
            .push(created.clone());
        Ok(created)
    }

    async fn delete_condition(&self, condition: Uuid) -> Result<(), ApplyError> {
        let mut state = self.enter(Call::DeleteCondition(condition))?;
        let policy = state
            .policy
            .as_mut()
            .ok_or_else(|| ApplyError::not_found("condition", condition.to_string()))?;
        policy.policy_conditions.retain(|c| c.uuid != condition);
        Ok(())
    }
}

pub fn policy(name: &str, operator: PolicyOperator, violation_state: ViolationState) -> Policy {
    Policy {
        uuid: Uuid::new_v4(),
        name: name.to_string(),
        operator,
        violation_state,
        policy_conditions: Vec::new(),
        projects: Vec::new(),
        tags: Vec::new(),
    }
}

pub fn project(name: &str, version: &str) -> Project {
    Project {
        uuid: Uuid::new_v4(),
        name: name.to_string(),
        version: Some(version.to_string()),
    }
}

pub fn vuln(value: &str) -> ConditionSpec {
    ConditionSpec::new(ConditionSubject::VulnerabilityId, ConditionOperator::Is, value)
}

pub fn stored(spec: &ConditionSpec) -> PolicyCondition {
    PolicyCondition {
        uuid: Uuid::new_v4(),
        ..PolicyCondition::unsaved(spec)
    }
}
