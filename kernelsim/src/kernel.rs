use sfp::{MsgType, SfpMessage};

use crate::pcb::{Pcb, ProcessState};
use crate::queue::BoundedQueue;
use crate::scheduler::Scheduler;
use crate::syscall::{AppLine, parse_app_line};

/// The kernel's pure state machine: PCB table, scheduler, and the two I/O
/// wait queues. Carries no socket/pipe/signal handles of its own — those
/// live in the runtime loop (`main.rs`), which calls into these methods
/// with closures for "stop a pid", "resume a pid", and "send a datagram",
/// so the scheduling and protocol logic can be driven deterministically in
/// tests.
pub struct Kernel {
    pub scheduler: Scheduler,
    pub file_wait: BoundedQueue<SfpMessage>,
    pub dir_wait: BoundedQueue<SfpMessage>,
    pub paused: bool,
}

impl Kernel {
    pub fn new(pcbs: Vec<Pcb>) -> Self {
        let capacity = pcbs.len();
        Self {
            scheduler: Scheduler::new(pcbs),
            file_wait: BoundedQueue::new(capacity),
            dir_wait: BoundedQueue::new(capacity),
            paused: false,
        }
    }

    /// IRQ0 (timer): preempt whoever is RUNNING and reschedule.
    pub fn handle_irq0(&mut self, stop: &mut dyn FnMut(i32), resume: &mut dyn FnMut(i32)) {
        self.scheduler.preempt_and_reschedule(stop, resume);
    }

    /// IRQ1 (file I/O done): pop the file wait queue's head and deliver it.
    pub fn handle_irq1(
        &mut self,
        stop: &mut dyn FnMut(i32),
        resume: &mut dyn FnMut(i32),
        deliver: &mut dyn FnMut(u32, &SfpMessage),
    ) {
        self.handle_io_irq(true, stop, resume, deliver);
    }

    /// IRQ2 (directory I/O done): same protocol, directory wait queue.
    pub fn handle_irq2(
        &mut self,
        stop: &mut dyn FnMut(i32),
        resume: &mut dyn FnMut(i32),
        deliver: &mut dyn FnMut(u32, &SfpMessage),
    ) {
        self.handle_io_irq(false, stop, resume, deliver);
    }

    fn handle_io_irq(
        &mut self,
        file_class: bool,
        stop: &mut dyn FnMut(i32),
        resume: &mut dyn FnMut(i32),
        deliver: &mut dyn FnMut(u32, &SfpMessage),
    ) {
        let popped = if file_class {
            self.file_wait.pop_front()
        } else {
            self.dir_wait.pop_front()
        };
        let Some(reply) = popped else { return };

        let owner = reply.owner;
        if owner < 1 || owner as usize > self.scheduler.pcbs.len() {
            log::warn!("IRQ{} reply with out-of-range owner {owner}, dropping", if file_class { 1 } else { 2 });
            return;
        }
        let idx = Pcb::index(owner as u32);
        if self.scheduler.pcbs[idx].state != ProcessState::Blocked {
            log::warn!(
                "IRQ{} reply for PCB A{} which is not BLOCKED ({:?}), dropping",
                if file_class { 1 } else { 2 },
                owner,
                self.scheduler.pcbs[idx].state
            );
            return;
        }

        deliver(owner as u32, &reply);
        self.scheduler.pcbs[idx].state = ProcessState::Ready;
        self.scheduler.pcbs[idx].pending_request = None;
        if self.scheduler.ready_queue.push_back(idx).is_err() {
            log::warn!("ready queue full while unblocking A{owner}");
        }
        if self.scheduler.running.is_none() {
            self.scheduler.schedule_next(stop, resume);
        }
    }

    /// Enqueue a reply that just arrived from SFSS onto the matching wait
    /// queue, by message kind. Dropped (and logged) if that queue is full.
    pub fn receive_reply(&mut self, reply: SfpMessage) {
        let is_file = matches!(reply.kind(), Some(MsgType::RdRep) | Some(MsgType::WrRep));
        let class = if is_file { "file" } else { "directory" };
        let queue = if is_file {
            &mut self.file_wait
        } else {
            &mut self.dir_wait
        };
        if queue.push_back(reply).is_err() {
            log::warn!("{class} wait queue full, dropping reply");
        }
    }

    /// Parse and act on one line from the app channel (TICK/DONE/syscall).
    /// `send_datagram` is called with the SFP request to hand to SFSS.
    pub fn handle_app_line(
        &mut self,
        line: &str,
        stop: &mut dyn FnMut(i32),
        resume: &mut dyn FnMut(i32),
        send_datagram: &mut dyn FnMut(&SfpMessage),
    ) {
        let Some(parsed) = parse_app_line(line) else {
            log::warn!("unrecognized app line, discarding: {line:?}");
            return;
        };

        match parsed {
            AppLine::Tick { app_id, pc, .. } => {
                if let Some(pcb) = self.scheduler.pcbs.get_mut(Pcb::index(app_id)) {
                    pcb.pc = pc;
                }
            }
            AppLine::Done { app_id, pc, .. } => {
                let idx = Pcb::index(app_id);
                let was_running = self.scheduler.running == Some(idx);
                if let Some(pcb) = self.scheduler.pcbs.get_mut(idx) {
                    pcb.pc = pc;
                    pcb.state = ProcessState::Terminated;
                }
                if was_running {
                    self.scheduler.running = None;
                    self.scheduler.schedule_next(stop, resume);
                }
            }
            AppLine::Syscall(req) => {
                let idx = Pcb::index(req.app_id);
                let msg = req.to_sfp_message();
                let Some(pcb) = self.scheduler.pcbs.get_mut(idx) else {
                    return;
                };
                if pcb.state == ProcessState::Terminated {
                    log::warn!(
                        "syscall line from already-TERMINATED A{}, discarding",
                        req.app_id
                    );
                    return;
                }
                pcb.state = ProcessState::Blocked;
                pcb.pending_request = Some(msg.clone());

                let was_running = self.scheduler.running == Some(idx);
                send_datagram(&msg);
                if was_running {
                    self.scheduler.running = None;
                    self.scheduler.schedule_next(stop, resume);
                } else if self.scheduler.running.is_none() {
                    self.scheduler.schedule_next(stop, resume);
                }
            }
        }
    }

    /// Parse a controller-channel line (`IRQ0`/`IRQ1`/`IRQ2`). Anything else
    /// is logged and ignored.
    pub fn handle_controller_line(
        &mut self,
        line: &str,
        stop: &mut dyn FnMut(i32),
        resume: &mut dyn FnMut(i32),
        deliver: &mut dyn FnMut(u32, &SfpMessage),
    ) {
        match line {
            "IRQ0" => self.handle_irq0(stop, resume),
            "IRQ1" => self.handle_irq1(stop, resume, deliver),
            "IRQ2" => self.handle_irq2(stop, resume, deliver),
            other => log::warn!("unrecognized controller line, ignoring: {other:?}"),
        }
    }

    pub fn all_terminated(&self) -> bool {
        self.scheduler
            .pcbs
            .iter()
            .all(|p| p.state == ProcessState::Terminated)
    }

    /// The literal shape `print_snapshot()` produced in the original: PCB
    /// id, OS pid, pc, state, pending syscall kind, ready-queue contents,
    /// running PCB, and the two wait-queue depths.
    pub fn snapshot(&self) -> String {
        let mut out = String::new();
        out.push_str("=== KERNEL SNAPSHOT ===\n");
        for pcb in &self.scheduler.pcbs {
            let pending = pcb
                .pending_request
                .as_ref()
                .and_then(|m| m.kind())
                .map(|k| format!("{k:?}"))
                .unwrap_or_else(|| "-".to_string());
            out.push_str(&format!(
                "PCB A{} pid={} pc={} state={:?} pending={}\n",
                pcb.id, pcb.os_pid, pcb.pc, pcb.state, pending
            ));
        }
        out.push_str(&format!(
            "running={:?} ready_queue={:?}\n",
            self.scheduler.running.map(|i| self.scheduler.pcbs[i].id),
            self.scheduler
                .ready_queue
                .iter()
                .map(|&i| self.scheduler.pcbs[i].id)
                .collect::<Vec<_>>()
        ));
        out.push_str(&format!(
            "file_wait_depth={} dir_wait_depth={}\n",
            self.file_wait.len(),
            self.dir_wait.len()
        ));
        out
    }
}
