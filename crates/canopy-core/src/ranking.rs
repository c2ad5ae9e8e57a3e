//! Priority re-ranking rules.
//!
//! A ranked list always carries a dense priority sequence: the action at
//! index `i` has priority `i + 1`, with no gaps and no duplicates. Every
//! function here that changes order re-establishes that sequence before
//! returning.

use crate::{
  Error, Result,
  action::{ActionType, ClimateAction},
};

/// Move the action at `from` to `to`, shifting the actions in between by one
/// position, then re-densify priorities.
///
/// This is a single-element move, not a swap. `from == to` leaves the order
/// unchanged but still re-densifies. Either index being out of range is
/// [`Error::InvalidIndex`].
pub fn move_action(
  list: &[ClimateAction],
  from: usize,
  to: usize,
) -> Result<Vec<ClimateAction>> {
  let len = list.len();
  for index in [from, to] {
    if index >= len {
      return Err(Error::InvalidIndex { index, len });
    }
  }

  let mut moved = list.to_vec();
  if from != to {
    let action = moved.remove(from);
    moved.insert(to, action);
  }
  densify(&mut moved);
  Ok(moved)
}

/// Assign `index + 1` as the priority of every action, in list order.
pub fn densify(list: &mut [ClimateAction]) {
  for (index, action) in list.iter_mut().enumerate() {
    action.set_priority(index + 1);
  }
}

/// Order a list by its existing priorities and re-densify it.
///
/// Unranked actions go after ranked ones. The sort is stable, so ties and
/// unranked actions keep their incoming relative order. Used when a stored
/// list has gaps or duplicates, and to give an upstream list its first
/// ranking.
pub fn normalize(mut list: Vec<ClimateAction>) -> Vec<ClimateAction> {
  list.sort_by_key(|action| match action.priority() {
    Some(priority) => (0, priority),
    None => (1, 0),
  });
  densify(&mut list);
  list
}

/// Whether priorities are exactly `1..=len` in list order.
pub fn is_dense(list: &[ClimateAction]) -> bool {
  list
    .iter()
    .enumerate()
    .all(|(index, action)| action.priority() == Some(index + 1))
}

/// Check that every action belongs to the `expected` partition.
pub fn ensure_partition(
  list: &[ClimateAction],
  expected: ActionType,
) -> Result<()> {
  match list.iter().find(|action| action.action_type() != expected) {
    Some(action) => Err(Error::WrongActionType {
      action_id: action.action_id().to_owned(),
      expected,
      found: action.action_type(),
    }),
    None => Ok(()),
  }
}

#[cfg(test)]
mod tests {
  use crate::action::{ActionDetails, AdaptationAction, MitigationAction};

  use super::*;

  fn mitigation(id: &str) -> ClimateAction {
    ClimateAction::Mitigation(MitigationAction {
      details:                 ActionDetails::new(id, format!("Action {id}")),
      sector:                  Default::default(),
      ghg_reduction_potential: Default::default(),
    })
  }

  fn ranked(ids: &[&str]) -> Vec<ClimateAction> {
    let mut list: Vec<_> = ids.iter().map(|id| mitigation(id)).collect();
    densify(&mut list);
    list
  }

  fn ids(list: &[ClimateAction]) -> Vec<&str> {
    list.iter().map(ClimateAction::action_id).collect()
  }

  #[test]
  fn move_first_to_last() {
    let list = ranked(&["A", "B", "C"]);
    let moved = move_action(&list, 0, 2).unwrap();
    assert_eq!(ids(&moved), ["B", "C", "A"]);
    let priorities: Vec<_> = moved.iter().map(|a| a.priority()).collect();
    assert_eq!(priorities, [Some(1), Some(2), Some(3)]);
  }

  #[test]
  fn move_last_to_first() {
    let list = ranked(&["A", "B", "C", "D"]);
    let moved = move_action(&list, 3, 0).unwrap();
    assert_eq!(ids(&moved), ["D", "A", "B", "C"]);
    assert!(is_dense(&moved));
  }

  #[test]
  fn move_to_same_index_keeps_order_and_densifies() {
    let list: Vec<_> = ["A", "B", "C"].iter().map(|id| mitigation(id)).collect();
    let moved = move_action(&list, 1, 1).unwrap();
    assert_eq!(ids(&moved), ids(&list));
    assert!(is_dense(&moved));
  }

  #[test]
  fn every_move_is_dense_and_preserves_relative_order() {
    let labels = ["A", "B", "C", "D", "E", "F"];
    for len in 1..=labels.len() {
      let list = ranked(&labels[..len]);
      for from in 0..len {
        for to in 0..len {
          let moved = move_action(&list, from, to).unwrap();
          assert!(is_dense(&moved), "len={len} from={from} to={to}");
          assert_eq!(moved[to].action_id(), list[from].action_id());

          let others_before: Vec<_> = ids(&list)
            .into_iter()
            .filter(|id| *id != list[from].action_id())
            .collect();
          let others_after: Vec<_> = ids(&moved)
            .into_iter()
            .filter(|id| *id != list[from].action_id())
            .collect();
          assert_eq!(others_before, others_after);
        }
      }
    }
  }

  #[test]
  fn repeated_moves_stay_dense() {
    let mut list = ranked(&["A", "B", "C", "D", "E"]);
    for (from, to) in [(0, 4), (3, 1), (2, 2), (4, 0), (1, 3)] {
      list = move_action(&list, from, to).unwrap();
      assert!(is_dense(&list));
    }
    assert_eq!(list.len(), 5);
  }

  #[test]
  fn out_of_range_index_is_rejected() {
    let list = ranked(&["A", "B"]);
    assert!(matches!(
      move_action(&list, 2, 0),
      Err(Error::InvalidIndex { index: 2, len: 2 })
    ));
    assert!(matches!(
      move_action(&list, 0, 5),
      Err(Error::InvalidIndex { index: 5, len: 2 })
    ));
    assert!(matches!(
      move_action(&[], 0, 0),
      Err(Error::InvalidIndex { index: 0, len: 0 })
    ));
  }

  #[test]
  #[cfg(target_pointer_width = "64")]
  fn priorities_beyond_u32_keep_their_order() {
    let json = r#"[
      {"ActionType": "mitigation", "ActionID": "far", "ActionName": "Far", "actionPriority": 4294967297},
      {"ActionType": "mitigation", "ActionID": "near", "ActionName": "Near", "actionPriority": 2}
    ]"#;
    let list: Vec<ClimateAction> = serde_json::from_str(json).unwrap();
    assert_eq!(list[0].priority(), Some(4_294_967_297));

    let normalized = normalize(list);
    assert_eq!(ids(&normalized), ["near", "far"]);
    assert!(is_dense(&normalized));
  }

  #[test]
  fn normalize_closes_gaps_and_puts_unranked_last() {
    let mut list = ranked(&["A", "B", "C"]);
    // Reverse the stored priorities and append an unranked action.
    list[0].set_priority(30);
    list[1].set_priority(20);
    list[2].set_priority(10);
    list.insert(1, mitigation("X"));

    let normalized = normalize(list);
    assert_eq!(ids(&normalized), ["C", "B", "A", "X"]);
    assert!(is_dense(&normalized));
  }

  #[test]
  fn partition_check_names_the_offending_action() {
    let mut list = ranked(&["A", "B"]);
    list.push(ClimateAction::Adaptation(AdaptationAction {
      details:                  ActionDetails::new("Z", "Mangroves"),
      hazard:                   Default::default(),
      adaptation_effectiveness: None,
    }));
    assert!(ensure_partition(&list[..2], ActionType::Mitigation).is_ok());
    let err = ensure_partition(&list, ActionType::Mitigation).unwrap_err();
    assert!(matches!(err, Error::WrongActionType { ref action_id, .. } if action_id == "Z"));
  }
}
