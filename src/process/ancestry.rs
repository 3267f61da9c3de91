//! Session root resolution.
//!
//! Every process is labelled with the name of the top-most ancestor that sits
//! directly below the root supervisor, so all processes of one subtree share
//! the same `parent` label regardless of their depth.

use std::io;

use crate::error::ProcessError;
use crate::process::ProcessHandle;

/// Name of the PID 1 supervisor on this platform.
#[cfg(target_os = "macos")]
pub const DEFAULT_ROOT_SUPERVISOR: &str = "launchd";

/// Name of the PID 1 supervisor on this platform.
#[cfg(not(target_os = "macos"))]
pub const DEFAULT_ROOT_SUPERVISOR: &str = "systemd";

/// Upper bound on parent hops before the chain is treated as corrupt.
pub const MAX_ANCESTOR_DEPTH: usize = 4096;

/// Walks the parent chain of `handle` and returns the session root name.
///
/// Stops when a process has no parent, or when the next parent is named
/// `supervisor`. In both cases the last name examined below that point is
/// returned, so a child of the supervisor resolves to `own_name`.
pub fn resolve_group_ancestor<H: ProcessHandle>(
    own_name: &str,
    handle: &H,
    supervisor: &str,
) -> Result<String, ProcessError> {
    let lookup_err = |pid: u32, source: io::Error| ProcessError::AncestorLookup { pid, source };

    let mut name = own_name.to_string();
    let mut current = match handle.parent().map_err(|e| lookup_err(handle.pid(), e))? {
        Some(parent) => parent,
        None => return Ok(name),
    };

    for _ in 0..MAX_ANCESTOR_DEPTH {
        let parent_name = current.name().map_err(|e| lookup_err(current.pid(), e))?;
        if parent_name == supervisor {
            return Ok(name);
        }
        name = parent_name;

        current = match current.parent().map_err(|e| lookup_err(current.pid(), e))? {
            Some(parent) => parent,
            None => return Ok(name),
        };
    }

    Err(lookup_err(
        handle.pid(),
        io::Error::other(format!(
            "parent chain longer than {} processes",
            MAX_ANCESTOR_DEPTH
        )),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{ProcessEnumerator, TestDataEnumerator, TestHandle, TestProcess};

    fn handle(enumerator: &TestDataEnumerator, pid: u32) -> TestHandle {
        enumerator
            .list()
            .unwrap()
            .into_iter()
            .find(|h| h.pid() == pid)
            .expect("pid present in table")
    }

    fn session_tree() -> TestDataEnumerator {
        TestDataEnumerator::from_processes(vec![
            TestProcess::new(1, "launchd", 0),
            TestProcess::new(100, "Terminal", 1),
            TestProcess::new(200, "bash", 100),
            TestProcess::new(300, "node", 200),
        ])
    }

    #[test]
    fn test_child_of_supervisor_resolves_to_itself() {
        let e = session_tree();
        let ancestor = resolve_group_ancestor("Terminal", &handle(&e, 100), "launchd").unwrap();
        assert_eq!(ancestor, "Terminal");
    }

    #[test]
    fn test_resolution_is_depth_independent() {
        let e = session_tree();
        assert_eq!(
            resolve_group_ancestor("node", &handle(&e, 300), "launchd").unwrap(),
            "Terminal"
        );
        assert_eq!(
            resolve_group_ancestor("bash", &handle(&e, 200), "launchd").unwrap(),
            "Terminal"
        );
    }

    #[test]
    fn test_parentless_process_resolves_to_itself() {
        let e = session_tree();
        assert_eq!(
            resolve_group_ancestor("launchd", &handle(&e, 1), "launchd").unwrap(),
            "launchd"
        );
    }

    #[test]
    fn test_tree_without_supervisor_returns_topmost_name() {
        let e = TestDataEnumerator::from_processes(vec![
            TestProcess::new(2, "kthreadd", 0),
            TestProcess::new(12, "kworker/0:1", 2),
        ]);
        assert_eq!(
            resolve_group_ancestor("kworker/0:1", &handle(&e, 12), "systemd").unwrap(),
            "kthreadd"
        );
    }

    #[test]
    fn test_unreadable_parent_name_fails() {
        let e = TestDataEnumerator::from_processes(vec![
            TestProcess::new(1, "launchd", 0),
            TestProcess::new(100, "ghost", 1).without_name(),
            TestProcess::new(200, "bash", 100),
        ]);
        let err = resolve_group_ancestor("bash", &handle(&e, 200), "launchd").unwrap_err();
        assert!(matches!(err, ProcessError::AncestorLookup { pid: 100, .. }));
    }

    #[test]
    fn test_cyclic_parent_table_fails() {
        let e = TestDataEnumerator::from_processes(vec![
            TestProcess::new(5, "a", 6),
            TestProcess::new(6, "b", 5),
        ]);
        assert!(resolve_group_ancestor("a", &handle(&e, 5), "launchd").is_err());
    }
}
