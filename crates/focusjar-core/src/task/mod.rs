//! Task Queue Manager.
//!
//! Owns the ordered planned list and the ordered completed list, plus the
//! reward balance earned by selling completed tasks.
//!
//! ## Alternation
//!
//! The planned list strictly alternates `Consume`, `Produce`, `Consume`, ...
//! by position. Every insertion or removal recomputes every task's kind from
//! its new index, so the pattern can never drift.

use serde::{Deserialize, Serialize};

/// Kind of a planned task. Serialized with the wire names `input`/`output`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskKind {
    #[serde(rename = "input")]
    Consume,
    #[serde(rename = "output")]
    Produce,
}

impl TaskKind {
    /// Kind required at position `index` of the planned list.
    pub fn for_index(index: usize) -> Self {
        if index % 2 == 0 {
            TaskKind::Consume
        } else {
            TaskKind::Produce
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TaskKind::Consume => "Consume",
            TaskKind::Produce => "Produce",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: TaskKind,
    pub text: String,
}

/// A task as handed to [`TaskQueue::replace_plan`]; the id may be missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanEntry {
    #[serde(default)]
    pub id: Option<i64>,
    pub text: String,
}

impl From<Task> for PlanEntry {
    fn from(task: Task) -> Self {
        Self {
            id: Some(task.id),
            text: task.text,
        }
    }
}

impl From<&str> for PlanEntry {
    fn from(text: &str) -> Self {
        Self {
            id: None,
            text: text.to_string(),
        }
    }
}

/// Sold tasks add this much to the balance.
pub const SALE_UNIT: u64 = 1;

#[derive(Debug, Clone, Default)]
pub struct TaskQueue {
    planned: Vec<Task>,
    completed: Vec<Task>,
    balance: u64,
}

impl TaskQueue {
    /// Rebuild from persisted lists. The planned list is re-labelled so a
    /// hand-edited or older blob still satisfies the alternation invariant.
    pub fn from_parts(planned: Vec<Task>, completed: Vec<Task>, balance: u64) -> Self {
        let mut queue = Self {
            planned,
            completed,
            balance,
        };
        queue.relabel();
        queue
    }

    pub fn planned(&self) -> &[Task] {
        &self.planned
    }

    pub fn completed(&self) -> &[Task] {
        &self.completed
    }

    /// Completed tasks of one kind.
    pub fn completed_count(&self, kind: TaskKind) -> usize {
        self.completed.iter().filter(|t| t.kind == kind).count()
    }

    pub fn balance(&self) -> u64 {
        self.balance
    }

    /// Next task a session would run.
    pub fn next_up(&self) -> Option<&Task> {
        self.planned.first()
    }

    /// Append a task. `now_ms` seeds the id; ids stay unique against both
    /// lists even when the clock does not advance between calls.
    pub fn add_planned(&mut self, text: &str, now_ms: i64) -> Option<Task> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let task = Task {
            id: self.fresh_id(now_ms),
            kind: TaskKind::for_index(self.planned.len()),
            text: text.to_string(),
        };
        self.planned.push(task.clone());
        Some(task)
    }

    pub fn remove_planned(&mut self, id: i64) -> Option<Task> {
        let pos = self.planned.iter().position(|t| t.id == id)?;
        let removed = self.planned.remove(pos);
        self.relabel();
        Some(removed)
    }

    /// Bulk-replace the plan. Entries without an id get fresh ids in
    /// creation order, none colliding with each other or with kept ids.
    pub fn replace_plan(&mut self, entries: Vec<PlanEntry>, now_ms: i64) {
        let mut taken: Vec<i64> = entries.iter().filter_map(|e| e.id).collect();
        taken.extend(self.completed.iter().map(|t| t.id));
        let mut next = taken.iter().copied().max().map_or(now_ms, |m| (m + 1).max(now_ms));

        self.planned = entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| {
                let id = match entry.id {
                    Some(id) => id,
                    None => {
                        let id = next;
                        next += 1;
                        id
                    }
                };
                Task {
                    id,
                    kind: TaskKind::for_index(index),
                    text: entry.text,
                }
            })
            .collect();
    }

    /// Record a finished session. The same id is dropped from the plan if it
    /// is still there, so a task edited mid-session is not run twice.
    pub fn complete_active(&mut self, task: Task) {
        let before = self.planned.len();
        self.planned.retain(|t| t.id != task.id);
        if self.planned.len() != before {
            self.relabel();
        }
        self.completed.push(task);
    }

    /// Sell the oldest completed task. `None` when the jar is empty.
    pub fn sell_one(&mut self) -> Option<Task> {
        if self.completed.is_empty() {
            return None;
        }
        let sold = self.completed.remove(0);
        self.balance += SALE_UNIT;
        Some(sold)
    }

    pub fn clear_completed(&mut self) {
        self.completed.clear();
    }

    pub fn replace_completed(&mut self, tasks: Vec<Task>) {
        self.completed = tasks;
    }

    fn relabel(&mut self) {
        for (index, task) in self.planned.iter_mut().enumerate() {
            task.kind = TaskKind::for_index(index);
        }
    }

    fn fresh_id(&self, now_ms: i64) -> i64 {
        let max_existing = self
            .planned
            .iter()
            .chain(self.completed.iter())
            .map(|t| t.id)
            .max();
        match max_existing {
            Some(max) if max >= now_ms => max + 1,
            _ => now_ms,
        }
    }
}
