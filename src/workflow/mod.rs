//! Pure workflow-topology queries.
//!
//! A topology is the ordered set of stages (and nested sub-stages) configured
//! by one organization. Every function here is a pure computation over an
//! in-memory snapshot: callers load the topology once per request and pass it
//! in, so these helpers stay independent of the database and are insensitive
//! to the order the rows came back in (they sort internally, ties broken by
//! id).

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::{stage, sub_stage};

/// A concrete place an allocation can sit: a stage, optionally narrowed to
/// one of its sub-stages. A stage that tracks sub-stages is never itself a
/// valid resting position; allocations there always carry a sub-stage id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Position {
    pub stage_id: Uuid,
    pub sub_stage_id: Option<Uuid>,
}

impl Position {
    pub fn stage(stage_id: Uuid) -> Self {
        Self {
            stage_id,
            sub_stage_id: None,
        }
    }

    pub fn sub_stage(stage_id: Uuid, sub_stage_id: Uuid) -> Self {
        Self {
            stage_id,
            sub_stage_id: Some(sub_stage_id),
        }
    }
}

/// One stage with its sub-stages, as loaded from the topology store.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct StageNode {
    pub id: Uuid,
    pub name: String,
    pub sequence_order: i32,
    pub location: Option<String>,
    pub sub_stages: Vec<SubStageNode>,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct SubStageNode {
    pub id: Uuid,
    pub name: String,
    pub sequence_order: i32,
    pub location: Option<String>,
}

/// A position in the flattened, fully-ordered walk of the topology, carrying
/// the display fields move pickers need.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct FlatPosition {
    pub stage_id: Uuid,
    pub stage_name: String,
    pub sub_stage_id: Option<Uuid>,
    pub sub_stage_name: Option<String>,
    pub is_sub_stage: bool,
}

impl FlatPosition {
    pub fn position(&self) -> Position {
        Position {
            stage_id: self.stage_id,
            sub_stage_id: self.sub_stage_id,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TopologyError {
    #[error("stage {0} is not part of this organization's workflow")]
    UnknownStage(Uuid),
    #[error("sub-stage {sub_stage_id} does not belong to stage {stage_id}")]
    UnknownSubStage { stage_id: Uuid, sub_stage_id: Uuid },
    #[error("stage {0} tracks sub-stages; the position must name one")]
    SubStageRequired(Uuid),
}

/// Build topology nodes from raw rows, nesting each sub-stage under its
/// parent and ordering everything by (sequence_order, id).
pub fn assemble(stages: Vec<stage::Model>, sub_stages: Vec<sub_stage::Model>) -> Vec<StageNode> {
    let mut grouped: HashMap<Uuid, Vec<SubStageNode>> = HashMap::new();
    for sub in sub_stages {
        grouped.entry(sub.stage_id).or_default().push(SubStageNode {
            id: sub.id,
            name: sub.name,
            sequence_order: sub.sequence_order,
            location: sub.location,
        });
    }

    let mut nodes: Vec<StageNode> = stages
        .into_iter()
        .map(|stage| {
            let mut subs = grouped.remove(&stage.id).unwrap_or_default();
            subs.sort_by_key(|s| (s.sequence_order, s.id));
            StageNode {
                id: stage.id,
                name: stage.name,
                sequence_order: stage.sequence_order,
                location: stage.location,
                sub_stages: subs,
            }
        })
        .collect();
    nodes.sort_by_key(|s| (s.sequence_order, s.id));
    nodes
}

fn find_stage(stages: &[StageNode], id: Uuid) -> Result<&StageNode, TopologyError> {
    stages
        .iter()
        .find(|s| s.id == id)
        .ok_or(TopologyError::UnknownStage(id))
}

fn find_sub_stage(stage: &StageNode, id: Uuid) -> Result<&SubStageNode, TopologyError> {
    stage
        .sub_stages
        .iter()
        .find(|s| s.id == id)
        .ok_or(TopologyError::UnknownSubStage {
            stage_id: stage.id,
            sub_stage_id: id,
        })
}

fn first_sub(stage: &StageNode) -> Option<&SubStageNode> {
    stage.sub_stages.iter().min_by_key(|s| (s.sequence_order, s.id))
}

fn last_sub(stage: &StageNode) -> Option<&SubStageNode> {
    stage.sub_stages.iter().max_by_key(|s| (s.sequence_order, s.id))
}

/// Sort key placing a stage's own entry ahead of its sub-stage entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct PositionKey {
    stage: (i32, Uuid),
    sub: Option<(i32, Uuid)>,
}

fn position_key(stages: &[StageNode], pos: &Position) -> Result<PositionKey, TopologyError> {
    let stage = find_stage(stages, pos.stage_id)?;
    let sub = match pos.sub_stage_id {
        Some(sub_id) => {
            let sub = find_sub_stage(stage, sub_id)?;
            Some((sub.sequence_order, sub.id))
        }
        None => None,
    };
    Ok(PositionKey {
        stage: (stage.sequence_order, stage.id),
        sub,
    })
}

/// Workflow order of two positions. Stages compare by (sequence_order, id);
/// within one stage, sub-stages compare the same way and the bare stage entry
/// precedes all of its sub-stages.
pub fn compare_positions(
    stages: &[StageNode],
    a: &Position,
    b: &Position,
) -> Result<Ordering, TopologyError> {
    Ok(position_key(stages, a)?.cmp(&position_key(stages, b)?))
}

/// The position immediately after `current`: the next sibling sub-stage when
/// the current position has one, otherwise the entry position of the next
/// stage (descending into its first sub-stage). `None` once the walk is at
/// the end of the workflow.
pub fn next_position(
    stages: &[StageNode],
    current: &Position,
) -> Result<Option<Position>, TopologyError> {
    let stage = find_stage(stages, current.stage_id)?;
    if let Some(sub_id) = current.sub_stage_id {
        let sub = find_sub_stage(stage, sub_id)?;
        let sibling = stage
            .sub_stages
            .iter()
            .filter(|c| c.sequence_order > sub.sequence_order)
            .min_by_key(|c| (c.sequence_order, c.id));
        if let Some(sibling) = sibling {
            return Ok(Some(Position::sub_stage(stage.id, sibling.id)));
        }
    }
    let next = stages
        .iter()
        .filter(|s| s.sequence_order > stage.sequence_order)
        .min_by_key(|s| (s.sequence_order, s.id));
    Ok(next.map(|s| Position {
        stage_id: s.id,
        sub_stage_id: first_sub(s).map(|sub| sub.id),
    }))
}

/// Mirror of [`next_position`]: the previous sibling sub-stage when one
/// exists, otherwise the previous stage, landing on its last sub-stage.
/// `None` at the head of the workflow.
pub fn previous_position(
    stages: &[StageNode],
    current: &Position,
) -> Result<Option<Position>, TopologyError> {
    let stage = find_stage(stages, current.stage_id)?;
    if let Some(sub_id) = current.sub_stage_id {
        let sub = find_sub_stage(stage, sub_id)?;
        let sibling = stage
            .sub_stages
            .iter()
            .filter(|c| c.sequence_order < sub.sequence_order)
            .max_by_key(|c| (c.sequence_order, c.id));
        if let Some(sibling) = sibling {
            return Ok(Some(Position::sub_stage(stage.id, sibling.id)));
        }
    }
    let previous = stages
        .iter()
        .filter(|s| s.sequence_order < stage.sequence_order)
        .max_by_key(|s| (s.sequence_order, s.id));
    Ok(previous.map(|s| Position {
        stage_id: s.id,
        sub_stage_id: last_sub(s).map(|sub| sub.id),
    }))
}

/// Every position strictly after `current`, flattened in workflow order.
/// Move dialogs render this list directly.
pub fn subsequent_positions(
    stages: &[StageNode],
    current: &Position,
) -> Result<Vec<FlatPosition>, TopologyError> {
    let current_key = position_key(stages, current)?;
    Ok(flatten(stages)
        .into_iter()
        .filter(|flat| {
            // Positions produced by flatten always resolve.
            position_key(stages, &flat.position())
                .map(|key| key > current_key)
                .unwrap_or(false)
        })
        .collect())
}

/// The flattened, fully-ordered walk of the topology. Stages without
/// sub-stages contribute themselves; stages with sub-stages contribute each
/// sub-stage in order.
pub fn flatten(stages: &[StageNode]) -> Vec<FlatPosition> {
    let mut ordered: Vec<&StageNode> = stages.iter().collect();
    ordered.sort_by_key(|s| (s.sequence_order, s.id));

    let mut out = Vec::new();
    for stage in ordered {
        if stage.sub_stages.is_empty() {
            out.push(FlatPosition {
                stage_id: stage.id,
                stage_name: stage.name.clone(),
                sub_stage_id: None,
                sub_stage_name: None,
                is_sub_stage: false,
            });
            continue;
        }
        let mut subs: Vec<&SubStageNode> = stage.sub_stages.iter().collect();
        subs.sort_by_key(|s| (s.sequence_order, s.id));
        for sub in subs {
            out.push(FlatPosition {
                stage_id: stage.id,
                stage_name: stage.name.clone(),
                sub_stage_id: Some(sub.id),
                sub_stage_name: Some(sub.name.clone()),
                is_sub_stage: true,
            });
        }
    }
    out
}

/// The workflow's entry position: the first stage, descending into its first
/// sub-stage. `None` only for an empty topology.
pub fn first_position(stages: &[StageNode]) -> Option<Position> {
    let first = stages.iter().min_by_key(|s| (s.sequence_order, s.id))?;
    Some(Position {
        stage_id: first.id,
        sub_stage_id: first_sub(first).map(|sub| sub.id),
    })
}

/// The workflow's terminal position: the last stage, landing on its last
/// sub-stage. `None` only for an empty topology.
pub fn final_position(stages: &[StageNode]) -> Option<Position> {
    let last = stages.iter().max_by_key(|s| (s.sequence_order, s.id))?;
    Some(Position {
        stage_id: last.id,
        sub_stage_id: last_sub(last).map(|sub| sub.id),
    })
}

/// Resolve a caller-supplied move target. A target stage that tracks
/// sub-stages but arrives without one defaults to its first sub-stage, so a
/// resolved target is always a valid resting position.
pub fn resolve_target(
    stages: &[StageNode],
    stage_id: Uuid,
    sub_stage_id: Option<Uuid>,
) -> Result<Position, TopologyError> {
    let stage = find_stage(stages, stage_id)?;
    let sub = match sub_stage_id {
        Some(id) => Some(find_sub_stage(stage, id)?.id),
        None => first_sub(stage).map(|sub| sub.id),
    };
    Ok(Position {
        stage_id: stage.id,
        sub_stage_id: sub,
    })
}

/// Resolve a position that must already be exact, such as the source of a
/// rework. No defaulting: a stage that tracks sub-stages must arrive with
/// one, and a stage that does not must arrive without.
pub fn resolve_exact(
    stages: &[StageNode],
    stage_id: Uuid,
    sub_stage_id: Option<Uuid>,
) -> Result<Position, TopologyError> {
    let stage = find_stage(stages, stage_id)?;
    match sub_stage_id {
        Some(id) => {
            let sub = find_sub_stage(stage, id)?;
            Ok(Position::sub_stage(stage.id, sub.id))
        }
        None if stage.sub_stages.is_empty() => Ok(Position::stage(stage.id)),
        None => Err(TopologyError::SubStageRequired(stage.id)),
    }
}
