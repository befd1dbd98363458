//! Set-based deletion plans
//!
//! A [`DeletionPlan`] is a predicate over [`Todo`] records, built up front and
//! handed to [`TodoStore::delete_matching`](crate::TodoStore::delete_matching)
//! so the whole delete set of one reconciliation is removed in a single step.

use std::collections::BTreeSet;
use sweep_model::{GroupId, IssueId, ProjectId, Todo, TodoId, TodoScope, UserId};

/// One clause of a deletion plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletionRule {
    /// Every todo scoped to the project, except those on the listed issues
    ProjectTodos {
        /// Project whose todos go
        project: ProjectId,
        /// Issue targets that survive
        keep_issues: BTreeSet<IssueId>,
    },

    /// Todos whose target is one of the listed issues
    IssueTargets {
        /// Issues whose todos go
        issues: BTreeSet<IssueId>,
    },

    /// Every todo scoped to the group
    GroupTodos {
        /// Group whose todos go
        group: GroupId,
    },

    /// Todos picked individually
    Todos {
        /// Todo ids to remove
        ids: BTreeSet<TodoId>,
    },
}

impl DeletionRule {
    /// Check if the rule selects this todo
    #[must_use]
    pub fn matches(&self, todo: &Todo) -> bool {
        match self {
            DeletionRule::ProjectTodos {
                project,
                keep_issues,
            } => {
                todo.scope == TodoScope::Project(*project)
                    && !todo
                        .target
                        .issue()
                        .is_some_and(|issue| keep_issues.contains(&issue))
            }
            DeletionRule::IssueTargets { issues } => todo
                .target
                .issue()
                .is_some_and(|issue| issues.contains(&issue)),
            DeletionRule::GroupTodos { group } => todo.scope == TodoScope::Group(*group),
            DeletionRule::Todos { ids } => ids.contains(&todo.id),
        }
    }

    /// Rules over an empty id set can never match
    fn is_vacuous(&self) -> bool {
        match self {
            DeletionRule::IssueTargets { issues } => issues.is_empty(),
            DeletionRule::Todos { ids } => ids.is_empty(),
            DeletionRule::ProjectTodos { .. } | DeletionRule::GroupTodos { .. } => false,
        }
    }
}

/// Disjunction of deletion rules, optionally restricted to one owner
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionPlan {
    owner: Option<UserId>,
    rules: Vec<DeletionRule>,
}

impl DeletionPlan {
    /// Plan restricted to todos owned by `owner`
    #[inline]
    #[must_use]
    pub fn for_owner(owner: UserId) -> Self {
        Self {
            owner: Some(owner),
            rules: Vec::new(),
        }
    }

    /// Plan over todos of every owner
    #[inline]
    #[must_use]
    pub fn any_owner() -> Self {
        Self::default()
    }

    /// Add a rule; rules that cannot match anything are dropped
    pub fn push(&mut self, rule: DeletionRule) {
        if !rule.is_vacuous() {
            self.rules.push(rule);
        }
    }

    /// With rule
    #[inline]
    #[must_use]
    pub fn with_rule(mut self, rule: DeletionRule) -> Self {
        self.push(rule);
        self
    }

    /// Owner restriction, if any
    #[inline]
    #[must_use]
    pub fn owner(&self) -> Option<UserId> {
        self.owner
    }

    /// Rules in insertion order
    #[inline]
    #[must_use]
    pub fn rules(&self) -> &[DeletionRule] {
        &self.rules
    }

    /// Check if the plan selects this todo
    #[must_use]
    pub fn matches(&self, todo: &Todo) -> bool {
        if self.owner.is_some_and(|owner| owner != todo.owner) {
            return false;
        }
        self.rules.iter().any(|rule| rule.matches(todo))
    }

    /// Number of rules
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if the plan has no rules
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sweep_model::{MergeRequestId, TodoTarget};

    fn todo(id: u64, owner: u64, target: TodoTarget, scope: TodoScope) -> Todo {
        Todo::new(TodoId(id), UserId(owner), target, scope)
    }

    #[test]
    fn project_rule_keeps_listed_issues() {
        let rule = DeletionRule::ProjectTodos {
            project: ProjectId(1),
            keep_issues: BTreeSet::from([IssueId(7)]),
        };

        let kept = todo(1, 1, TodoTarget::Issue(IssueId(7)), TodoScope::Project(ProjectId(1)));
        let gone = todo(2, 1, TodoTarget::Issue(IssueId(8)), TodoScope::Project(ProjectId(1)));
        let mr = todo(
            3,
            1,
            TodoTarget::MergeRequest(MergeRequestId(1)),
            TodoScope::Project(ProjectId(1)),
        );
        let other = todo(4, 1, TodoTarget::Issue(IssueId(8)), TodoScope::Project(ProjectId(2)));

        assert!(!rule.matches(&kept));
        assert!(rule.matches(&gone));
        assert!(rule.matches(&mr));
        assert!(!rule.matches(&other));
    }

    #[test]
    fn group_rule_ignores_project_todos() {
        let rule = DeletionRule::GroupTodos { group: GroupId(3) };
        assert!(rule.matches(&todo(1, 1, TodoTarget::Group, TodoScope::Group(GroupId(3)))));
        assert!(!rule.matches(&todo(2, 1, TodoTarget::Group, TodoScope::Group(GroupId(4)))));
        assert!(!rule.matches(&todo(
            3,
            1,
            TodoTarget::Issue(IssueId(1)),
            TodoScope::Project(ProjectId(3))
        )));
    }

    #[test]
    fn plan_respects_owner() {
        let plan = DeletionPlan::for_owner(UserId(1)).with_rule(DeletionRule::GroupTodos {
            group: GroupId(1),
        });

        assert!(plan.matches(&todo(1, 1, TodoTarget::Group, TodoScope::Group(GroupId(1)))));
        assert!(!plan.matches(&todo(2, 2, TodoTarget::Group, TodoScope::Group(GroupId(1)))));
    }

    #[test]
    fn vacuous_rules_are_dropped() {
        let mut plan = DeletionPlan::any_owner();
        plan.push(DeletionRule::IssueTargets {
            issues: BTreeSet::new(),
        });
        plan.push(DeletionRule::Todos {
            ids: BTreeSet::new(),
        });
        assert!(plan.is_empty());

        plan.push(DeletionRule::Todos {
            ids: BTreeSet::from([TodoId(1)]),
        });
        assert_eq!(plan.len(), 1);
    }

    #[test]
    fn empty_plan_matches_nothing() {
        let plan = DeletionPlan::for_owner(UserId(1));
        assert!(!plan.matches(&todo(1, 1, TodoTarget::Group, TodoScope::Group(GroupId(1)))));
    }
}
