//! Undo/redo for vertex edits inside a single transaction.
//!
//! Every action knows how to reverse and reapply itself against the draft's
//! vertex list. The log lives only as long as the transaction that owns it
//! and is discarded on commit or rollback, so individual vertex corrections
//! never reach the document history.

use mapkit_core::Point;

/// One vertex of a grouped move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexMove {
    pub vertex_index: usize,
    pub old: Point,
    pub new: Point,
}

/// A reversible micro-edit of the draft's vertices.
#[derive(Debug, Clone, PartialEq)]
pub enum LocalAction {
    /// A vertex appended by click-to-draw.
    PlaceVertex { vertex_index: usize, vertex: Point },
    /// A single vertex dragged to a new position.
    MoveVertex {
        vertex_index: usize,
        old: Point,
        new: Point,
    },
    /// A vertex inserted on an existing edge.
    InsertVertex { insert_index: usize, vertex: Point },
    DeleteVertex { deleted_index: usize, vertex: Point },
    /// Several selected vertices dragged together.
    MultiMoveVertex { moves: Vec<VertexMove> },
    /// Both endpoints of one edge dragged together.
    MoveLine {
        line_index: usize,
        vertex1_index: usize,
        vertex2_index: usize,
        old1: Point,
        old2: Point,
        new1: Point,
        new2: Point,
    },
}

fn set_vertex(vertices: &mut [Point], index: usize, point: Point) {
    match vertices.get_mut(index) {
        Some(slot) => *slot = point,
        None => tracing::warn!(index, len = vertices.len(), "Vertex index out of range"),
    }
}

fn remove_vertex(vertices: &mut Vec<Point>, index: usize) {
    if index < vertices.len() {
        vertices.remove(index);
    } else {
        tracing::warn!(index, len = vertices.len(), "Vertex index out of range");
    }
}

impl LocalAction {
    /// Records the most recently appended vertex of `vertices`.
    pub fn place_vertex(vertices: &[Point]) -> Option<Self> {
        let vertex = *vertices.last()?;
        Some(LocalAction::PlaceVertex {
            vertex_index: vertices.len() - 1,
            vertex,
        })
    }

    /// Reverts the edit.
    pub fn undo(&self, vertices: &mut Vec<Point>) {
        match self {
            LocalAction::PlaceVertex { .. } => {
                vertices.pop();
            }
            LocalAction::MoveVertex {
                vertex_index, old, ..
            } => set_vertex(vertices, *vertex_index, *old),
            LocalAction::InsertVertex { insert_index, .. } => remove_vertex(vertices, *insert_index),
            LocalAction::DeleteVertex {
                deleted_index,
                vertex,
            } => {
                let at = (*deleted_index).min(vertices.len());
                vertices.insert(at, *vertex);
            }
            LocalAction::MultiMoveVertex { moves } => {
                for m in moves {
                    set_vertex(vertices, m.vertex_index, m.old);
                }
            }
            LocalAction::MoveLine {
                vertex1_index,
                vertex2_index,
                old1,
                old2,
                ..
            } => {
                set_vertex(vertices, *vertex1_index, *old1);
                set_vertex(vertices, *vertex2_index, *old2);
            }
        }
    }

    /// Reapplies the edit.
    pub fn redo(&self, vertices: &mut Vec<Point>) {
        match self {
            LocalAction::PlaceVertex { vertex, .. } => vertices.push(*vertex),
            LocalAction::MoveVertex {
                vertex_index, new, ..
            } => set_vertex(vertices, *vertex_index, *new),
            LocalAction::InsertVertex {
                insert_index,
                vertex,
            } => {
                let at = (*insert_index).min(vertices.len());
                vertices.insert(at, *vertex);
            }
            LocalAction::DeleteVertex { deleted_index, .. } => remove_vertex(vertices, *deleted_index),
            LocalAction::MultiMoveVertex { moves } => {
                for m in moves {
                    set_vertex(vertices, m.vertex_index, m.new);
                }
            }
            LocalAction::MoveLine {
                vertex1_index,
                vertex2_index,
                new1,
                new2,
                ..
            } => {
                set_vertex(vertices, *vertex1_index, *new1);
                set_vertex(vertices, *vertex2_index, *new2);
            }
        }
    }

    /// Human-readable summary for menus and logs.
    pub fn description(&self) -> String {
        match self {
            LocalAction::PlaceVertex { vertex, .. } => format!("Place vertex at {}", vertex),
            LocalAction::MoveVertex {
                vertex_index,
                old,
                new,
            } => format!("Move vertex {} from {} to {}", vertex_index, old, new),
            LocalAction::InsertVertex {
                insert_index,
                vertex,
            } => format!("Insert vertex at index {} {}", insert_index, vertex),
            LocalAction::DeleteVertex {
                deleted_index,
                vertex,
            } => format!("Delete vertex {} at {}", deleted_index, vertex),
            LocalAction::MultiMoveVertex { moves } => format!("Move {} vertices", moves.len()),
            LocalAction::MoveLine { line_index, .. } => format!("Move line {}", line_index),
        }
    }
}

/// Bounded two-stack log of [`LocalAction`]s.
#[derive(Debug, Clone)]
pub struct LocalHistory {
    undo_stack: Vec<LocalAction>,
    redo_stack: Vec<LocalAction>,
    max_depth: usize,
}

impl LocalHistory {
    /// Create a log with default depth (100)
    pub fn new() -> Self {
        Self::with_depth(100)
    }

    /// Create with custom maximum undo depth
    pub fn with_depth(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_depth: max_depth.max(1),
        }
    }

    /// Record an action that has already been applied
    pub fn push(&mut self, action: LocalAction) {
        self.redo_stack.clear();
        self.undo_stack.push(action);
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
    }

    /// Reverts the latest action against `vertices`
    pub fn undo(&mut self, vertices: &mut Vec<Point>) -> Option<&LocalAction> {
        let action = self.undo_stack.pop()?;
        action.undo(vertices);
        self.redo_stack.push(action);
        self.redo_stack.last()
    }

    /// Reapplies the latest undone action against `vertices`
    pub fn redo(&mut self, vertices: &mut Vec<Point>) -> Option<&LocalAction> {
        let action = self.redo_stack.pop()?;
        action.redo(vertices);
        self.undo_stack.push(action);
        self.undo_stack.last()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    /// Clear all undo/redo history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

impl Default for LocalHistory {
    fn default() -> Self {
        Self::new()
    }
}
