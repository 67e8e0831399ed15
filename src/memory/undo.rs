//! 撤销栈：有界 LIFO
//!
//! 超出容量时丢弃最旧的快照，栈顶（最近一次）永不被淘汰。只由编排器所在的单一上下文修改。

use std::collections::VecDeque;

/// 可编辑状态的快照，入栈后不可变
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UndoSnapshot {
    pub input_text: String,
    pub output_text: String,
    pub tone_index: usize,
}

impl UndoSnapshot {
    pub fn new(
        input_text: impl Into<String>,
        output_text: impl Into<String>,
        tone_index: usize,
    ) -> Self {
        Self {
            input_text: input_text.into(),
            output_text: output_text.into(),
            tone_index,
        }
    }
}

#[derive(Clone, Debug)]
pub struct UndoStack {
    // front = 最旧，back = 栈顶
    snapshots: VecDeque<UndoSnapshot>,
    capacity: usize,
}

impl UndoStack {
    /// capacity 至少为 1
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            snapshots: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, snapshot: UndoSnapshot) {
        self.snapshots.push_back(snapshot);
        while self.snapshots.len() > self.capacity {
            self.snapshots.pop_front();
        }
    }

    /// 空栈返回 None，不是错误
    pub fn pop(&mut self) -> Option<UndoSnapshot> {
        self.snapshots.pop_back()
    }

    pub fn peek(&self) -> Option<&UndoSnapshot> {
        self.snapshots.back()
    }

    pub fn can_undo(&self) -> bool {
        !self.snapshots.is_empty()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
