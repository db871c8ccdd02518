//! Document-level undo/redo
//!
//! Every completed transaction, merge, delete or property update is recorded
//! as one [`RegionCommand`]. Undoing or redoing a command replays it against
//! the remote store; the local scene is then refreshed from the store.

use mapkit_core::{
    AddRegionRequest, Region, RegionError, RegionIndex, RegionStore, RemoveRegionRequest, Result,
    Scene, SceneId, UpdateRegionRequest,
};
use parking_lot::Mutex;

/// Sink for document-level undo entries
pub trait ActionRecorder: Send + Sync {
    fn record(&self, command: RegionCommand);
}

/// A region that was recreated under a new server-assigned index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexRemap {
    pub from: RegionIndex,
    pub to: RegionIndex,
}

/// A command that could not be applied
#[derive(Debug, Clone, PartialEq)]
pub struct CommandFailure {
    pub error: RegionError,
    /// Regions recreated while applying or rolling back
    pub remaps: Vec<IndexRemap>,
    /// False if the store was left with part of the command applied
    pub rolled_back: bool,
}

type CommandResult = std::result::Result<Vec<IndexRemap>, CommandFailure>;

/// A reversible change to a scene's regions
#[derive(Debug, Clone, PartialEq)]
pub enum RegionCommand {
    Create {
        scene_id: SceneId,
        region: Region,
    },
    Edit {
        scene_id: SceneId,
        region_index: RegionIndex,
        old_region: Region,
        new_region: Region,
    },
    Delete {
        scene_id: SceneId,
        region: Region,
    },
    /// Applied in order, undone in reverse
    Batch {
        name: String,
        commands: Vec<RegionCommand>,
    },
}

impl RegionCommand {
    pub fn description(&self) -> String {
        match self {
            RegionCommand::Create { region, .. } => format!("Create region \"{}\"", region.name),
            RegionCommand::Edit { new_region, .. } => format!("Edit region \"{}\"", new_region.name),
            RegionCommand::Delete { region, .. } => format!("Delete region \"{}\"", region.name),
            RegionCommand::Batch { name, .. } => name.clone(),
        }
    }

    /// Non-batch commands in application order
    pub fn leaves_mut(&mut self) -> Vec<&mut RegionCommand> {
        match self {
            RegionCommand::Batch { commands, .. } => {
                commands.iter_mut().flat_map(|c| c.leaves_mut()).collect()
            }
            leaf => vec![leaf],
        }
    }

    /// Reapplies the command against the store
    pub async fn execute(&mut self, store: &dyn RegionStore) -> CommandResult {
        self.run(store, true).await
    }

    /// Reverts the command against the store
    pub async fn undo(&mut self, store: &dyn RegionStore) -> CommandResult {
        self.run(store, false).await
    }

    /// Applies every leaf in one direction. When a leaf fails, the leaves
    /// applied before it are reverted so the store ends up where it started.
    async fn run(&mut self, store: &dyn RegionStore, forward: bool) -> CommandResult {
        let mut leaves = self.leaves_mut();
        if !forward {
            leaves.reverse();
        }

        let mut remaps = Vec::new();
        for i in 0..leaves.len() {
            let error = match leaves[i].apply_leaf(store, forward).await {
                Ok(remap) => {
                    remaps.extend(remap);
                    continue;
                }
                Err(error) => error,
            };

            let mut rolled_back = true;
            for leaf in leaves[..i].iter_mut().rev() {
                match leaf.apply_leaf(store, !forward).await {
                    Ok(remap) => remaps.extend(remap),
                    Err(e) => {
                        tracing::error!(error = %e, "Rolling back partially applied command failed");
                        rolled_back = false;
                        break;
                    }
                }
            }
            return Err(CommandFailure {
                error,
                remaps,
                rolled_back,
            });
        }
        Ok(remaps)
    }

    async fn apply_leaf(&mut self, store: &dyn RegionStore, forward: bool) -> Result<Option<IndexRemap>> {
        match (self, forward) {
            (RegionCommand::Create { scene_id, region }, true)
            | (RegionCommand::Delete { scene_id, region }, false) => {
                let added = store
                    .add_region(AddRegionRequest::from_region(*scene_id, region))
                    .await?;
                let remap = IndexRemap {
                    from: region.index,
                    to: added.index,
                };
                region.index = added.index;
                Ok((remap.from != remap.to).then_some(remap))
            }
            (RegionCommand::Create { scene_id, region }, false)
            | (RegionCommand::Delete { scene_id, region }, true) => {
                store
                    .remove_region(RemoveRegionRequest {
                        scene_id: *scene_id,
                        region_index: region.index,
                    })
                    .await?;
                Ok(None)
            }
            (
                RegionCommand::Edit {
                    scene_id,
                    region_index,
                    old_region,
                    new_region,
                },
                forward,
            ) => {
                let target = if forward { &*new_region } else { &*old_region };
                store
                    .update_region(UpdateRegionRequest::from_region(*scene_id, *region_index, target))
                    .await?;
                Ok(None)
            }
            (RegionCommand::Batch { .. }, _) => Ok(None),
        }
    }

    /// Points every reference to `remap.from` at `remap.to`
    pub fn remap_index(&mut self, remap: IndexRemap) {
        for leaf in self.leaves_mut() {
            match leaf {
                RegionCommand::Create { region, .. } | RegionCommand::Delete { region, .. } => {
                    if region.index == remap.from {
                        region.index = remap.to;
                    }
                }
                RegionCommand::Edit {
                    region_index,
                    old_region,
                    new_region,
                    ..
                } => {
                    if *region_index == remap.from {
                        *region_index = remap.to;
                        old_region.index = remap.to;
                        new_region.index = remap.to;
                    }
                }
                RegionCommand::Batch { .. } => {}
            }
        }
    }
}

#[derive(Debug, Default)]
struct Stacks {
    undo: Vec<RegionCommand>,
    redo: Vec<RegionCommand>,
}

impl Stacks {
    fn remap(&mut self, remaps: &[IndexRemap]) {
        for remap in remaps {
            for command in self.undo.iter_mut().chain(self.redo.iter_mut()) {
                command.remap_index(*remap);
            }
        }
    }
}

/// Bounded document history of one scene
#[derive(Debug)]
pub struct DocumentHistory {
    scene_id: SceneId,
    stacks: Mutex<Stacks>,
    max_depth: usize,
}

impl DocumentHistory {
    pub fn new(scene_id: SceneId, max_depth: usize) -> Self {
        Self {
            scene_id,
            stacks: Mutex::new(Stacks::default()),
            max_depth: max_depth.max(1),
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.stacks.lock().undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.stacks.lock().redo.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.stacks.lock().undo.len()
    }

    pub fn redo_count(&self) -> usize {
        self.stacks.lock().redo.len()
    }

    /// Description of the command the next undo would revert
    pub fn undo_description(&self) -> Option<String> {
        self.stacks.lock().undo.last().map(RegionCommand::description)
    }

    pub fn redo_description(&self) -> Option<String> {
        self.stacks.lock().redo.last().map(RegionCommand::description)
    }

    pub fn clear(&self) {
        let mut stacks = self.stacks.lock();
        stacks.undo.clear();
        stacks.redo.clear();
    }

    /// Puts a command that failed back on its stack. A command the store
    /// still holds part of cannot be retried safely and is dropped.
    fn keep_failed(
        &self,
        command: RegionCommand,
        rolled_back: bool,
        remaps: &[IndexRemap],
        to_undo: bool,
    ) {
        let mut stacks = self.stacks.lock();
        if rolled_back {
            if to_undo {
                stacks.undo.push(command);
            } else {
                stacks.redo.push(command);
            }
        } else {
            tracing::error!(
                scene_id = %self.scene_id,
                command = %command.description(),
                "Command left partially applied, dropped from history"
            );
        }
        stacks.remap(remaps);
    }

    /// Reverts the latest command and returns the refreshed scene, or `None`
    /// when there is nothing to undo. A command that fails to revert is
    /// rolled back and stays on the undo stack.
    pub async fn undo(&self, store: &dyn RegionStore) -> Result<Option<Scene>> {
        let Some(mut command) = self.stacks.lock().undo.pop() else {
            return Ok(None);
        };

        match command.undo(store).await {
            Ok(remaps) => {
                tracing::info!(scene_id = %self.scene_id, command = %command.description(), "Undo");
                let mut stacks = self.stacks.lock();
                stacks.redo.push(command);
                stacks.remap(&remaps);
            }
            Err(failure) => {
                tracing::error!(scene_id = %self.scene_id, error = %failure.error, "Undo failed");
                self.keep_failed(command, failure.rolled_back, &failure.remaps, true);
                return Err(failure.error);
            }
        }

        store.refetch(self.scene_id).await.map(Some)
    }

    /// Reapplies the latest undone command and returns the refreshed scene,
    /// or `None` when there is nothing to redo. A command that fails to
    /// reapply is rolled back and stays on the redo stack.
    pub async fn redo(&self, store: &dyn RegionStore) -> Result<Option<Scene>> {
        let Some(mut command) = self.stacks.lock().redo.pop() else {
            return Ok(None);
        };

        match command.execute(store).await {
            Ok(remaps) => {
                tracing::info!(scene_id = %self.scene_id, command = %command.description(), "Redo");
                let mut stacks = self.stacks.lock();
                stacks.undo.push(command);
                stacks.remap(&remaps);
            }
            Err(failure) => {
                tracing::error!(scene_id = %self.scene_id, error = %failure.error, "Redo failed");
                self.keep_failed(command, failure.rolled_back, &failure.remaps, false);
                return Err(failure.error);
            }
        }

        store.refetch(self.scene_id).await.map(Some)
    }
}

impl ActionRecorder for DocumentHistory {
    fn record(&self, command: RegionCommand) {
        tracing::debug!(scene_id = %self.scene_id, command = %command.description(), "Recorded");
        let mut stacks = self.stacks.lock();
        stacks.redo.clear();
        stacks.undo.push(command);
        if stacks.undo.len() > self.max_depth {
            stacks.undo.remove(0);
        }
    }
}
