use sfp::SfpMessage;

/// A process control block's lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Ready,
    Running,
    Blocked,
    Terminated,
}

/// One application's bookkeeping record. PCBs live in a fixed-size arena
/// (`Scheduler::pcbs`, indexed by logical id − 1) and are never deallocated:
/// termination only flips `state`, never removes the entry. Queues store
/// indices into that arena, never owning references, so the table can't
/// form cycles.
#[derive(Debug, Clone)]
pub struct Pcb {
    /// Logical identifier, 1..=N (the `k` in `/A{k}` and in `Ak`).
    pub id: u32,
    /// OS-level process id of the child running this application.
    pub os_pid: i32,
    pub state: ProcessState,
    /// Last program counter the app reported via TICK/DONE.
    pub pc: i32,
    /// Copy of the SFP request that put this PCB into BLOCKED, kept for
    /// diagnostics and for `snapshot()`. `None` except while BLOCKED.
    pub pending_request: Option<SfpMessage>,
}

impl Pcb {
    pub fn new(id: u32, os_pid: i32) -> Self {
        Self {
            id,
            os_pid,
            state: ProcessState::Ready,
            pc: 0,
            pending_request: None,
        }
    }

    /// The index this PCB belongs at in the arena: `id − 1`.
    pub fn index(id: u32) -> usize {
        (id - 1) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_pcb_starts_ready_with_no_pending_request() {
        let pcb = Pcb::new(3, 4242);
        assert_eq!(pcb.state, ProcessState::Ready);
        assert_eq!(pcb.pc, 0);
        assert!(pcb.pending_request.is_none());
    }

    #[test]
    fn index_is_one_less_than_logical_id() {
        assert_eq!(Pcb::index(1), 0);
        assert_eq!(Pcb::index(5), 4);
    }
}
