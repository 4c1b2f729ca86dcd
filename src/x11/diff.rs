//! Root state diffing
//!
//! The display only reports that a root property changed; these functions
//! compare the previous and the current value and produce the matching
//! [`NativeEvent`]s.

use std::collections::HashSet;
use std::hash::Hash;

use crate::native::{NativeEvent, NativeMonitorInfo, NativeWorkspace};

/// Entries only present in `new`, then entries only present in `old`.
/// Both keep their list order.
pub fn diff_list<T: Copy + Eq + Hash>(old: &[T], new: &[T]) -> (Vec<T>, Vec<T>) {
    let old_set: HashSet<T> = old.iter().copied().collect();
    let new_set: HashSet<T> = new.iter().copied().collect();
    let added = new.iter().copied().filter(|t| !old_set.contains(t)).collect();
    let removed = old.iter().copied().filter(|t| !new_set.contains(t)).collect();
    (added, removed)
}

/// One name per desktop; unnamed desktops get a generated name
pub fn workspace_names(count: u32, names: &[String]) -> Vec<String> {
    (0..count as usize)
        .map(|i| match names.get(i) {
            Some(name) if !name.is_empty() => name.clone(),
            _ => format!("Workspace {}", i + 1),
        })
        .collect()
}

/// Workspaces are identified by index: removals come off the end (last
/// first), then renames, then additions.
pub fn diff_workspaces(old: &[String], new: &[String]) -> Vec<NativeEvent> {
    let mut events = Vec::new();

    for index in (new.len()..old.len()).rev() {
        events.push(NativeEvent::WorkspaceRemoved(NativeWorkspace(index as u32)));
    }
    for (index, (before, after)) in old.iter().zip(new).enumerate() {
        if before != after {
            events.push(NativeEvent::WorkspaceRenamed {
                workspace: NativeWorkspace(index as u32),
                name: after.clone(),
            });
        }
    }
    for (index, name) in new.iter().enumerate().skip(old.len()) {
        events.push(NativeEvent::WorkspaceAdded {
            workspace: NativeWorkspace(index as u32),
            name: name.clone(),
        });
    }
    events
}

/// Monitors are identified by handle. Additions are reported before
/// removals so a replaced primary always has a successor.
pub fn diff_monitors(old: &[NativeMonitorInfo], new: &[NativeMonitorInfo]) -> Vec<NativeEvent> {
    let mut events = Vec::new();

    for info in new {
        match old.iter().find(|o| o.monitor == info.monitor) {
            None => events.push(NativeEvent::MonitorAdded(*info)),
            Some(previous) if previous.geometry != info.geometry => {
                events.push(NativeEvent::MonitorGeometryChanged {
                    monitor: info.monitor,
                    geometry: info.geometry,
                });
            }
            Some(_) => {}
        }
    }
    for info in old {
        if !new.iter().any(|n| n.monitor == info.monitor) {
            events.push(NativeEvent::MonitorRemoved(info.monitor));
        }
    }

    let old_primary = old.iter().find(|m| m.primary).map(|m| m.monitor);
    let new_primary = new.iter().find(|m| m.primary).map(|m| m.monitor);
    if old_primary != new_primary && new_primary.is_some() {
        events.push(NativeEvent::PrimaryMonitorChanged(new_primary));
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::NativeMonitor;
    use crate::shared::Geometry;

    fn monitor(handle: u32, x: i32, primary: bool) -> NativeMonitorInfo {
        NativeMonitorInfo {
            monitor: NativeMonitor(handle),
            geometry: Geometry::new(x, 0, 1920, 1080),
            primary,
        }
    }

    #[test]
    fn test_diff_list_keeps_order() {
        let (added, removed) = diff_list(&[1, 2, 3, 4], &[4, 5, 2, 6]);
        assert_eq!(added, vec![5, 6]);
        assert_eq!(removed, vec![1, 3]);
    }

    #[test]
    fn test_workspace_names_pads_missing() {
        let names = vec!["Web".to_string(), String::new()];
        assert_eq!(workspace_names(3, &names), vec!["Web", "Workspace 2", "Workspace 3"]);
        assert_eq!(workspace_names(1, &names), vec!["Web"]);
    }

    #[test]
    fn test_diff_workspaces() {
        let old = workspace_names(3, &[]);
        let new = vec!["Workspace 1".to_string(), "Mail".to_string()];
        assert_eq!(
            diff_workspaces(&old, &new),
            vec![
                NativeEvent::WorkspaceRemoved(NativeWorkspace(2)),
                NativeEvent::WorkspaceRenamed { workspace: NativeWorkspace(1), name: "Mail".into() },
            ]
        );

        let grown = workspace_names(4, &new);
        assert_eq!(
            diff_workspaces(&new, &grown),
            vec![
                NativeEvent::WorkspaceAdded { workspace: NativeWorkspace(2), name: "Workspace 3".into() },
                NativeEvent::WorkspaceAdded { workspace: NativeWorkspace(3), name: "Workspace 4".into() },
            ]
        );
        assert!(diff_workspaces(&grown, &grown).is_empty());
    }

    #[test]
    fn test_diff_monitors_replug_primary() {
        let old = vec![monitor(1, 0, true), monitor(2, 1920, false)];
        let new = vec![monitor(2, 0, true), monitor(3, 1920, false)];
        assert_eq!(
            diff_monitors(&old, &new),
            vec![
                NativeEvent::MonitorGeometryChanged {
                    monitor: NativeMonitor(2),
                    geometry: Geometry::new(0, 0, 1920, 1080),
                },
                NativeEvent::MonitorAdded(monitor(3, 1920, false)),
                NativeEvent::MonitorRemoved(NativeMonitor(1)),
                NativeEvent::PrimaryMonitorChanged(Some(NativeMonitor(2))),
            ]
        );
        assert!(diff_monitors(&new, &new).is_empty());
    }
}
