use crate::pcb::{Pcb, ProcessState};
use crate::queue::BoundedQueue;

/// PCB arena plus ready queue plus the currently-RUNNING index, implementing
/// `schedule_next()`. `stop`/`resume` are injected as closures so the pure
/// scheduling algorithm can be tested without real OS processes; the
/// kernel's runtime wires them to `SIGSTOP`/`SIGCONT` on the PCB's `os_pid`.
pub struct Scheduler {
    pub pcbs: Vec<Pcb>,
    pub ready_queue: BoundedQueue<usize>,
    pub running: Option<usize>,
}

impl Scheduler {
    pub fn new(pcbs: Vec<Pcb>) -> Self {
        let capacity = pcbs.len();
        let mut ready_queue = BoundedQueue::new(capacity);
        for i in 0..pcbs.len() {
            let _ = ready_queue.push_back(i);
        }
        Self {
            pcbs,
            ready_queue,
            running: None,
        }
    }

    /// Leaves the system in one of two stable configurations: some PCB
    /// RUNNING and in no queue, or no PCB RUNNING and every READY PCB in the
    /// ready queue.
    pub fn schedule_next(&mut self, stop: &mut dyn FnMut(i32), resume: &mut dyn FnMut(i32)) {
        self.schedule_next_inner(stop, resume, true);
    }

    fn schedule_next_inner(
        &mut self,
        stop: &mut dyn FnMut(i32),
        resume: &mut dyn FnMut(i32),
        allow_recovery: bool,
    ) {
        let attempts = self.ready_queue.len();
        for _ in 0..attempts {
            let Some(idx) = self.ready_queue.pop_front() else {
                break;
            };
            match self.pcbs[idx].state {
                ProcessState::Ready => {
                    if let Some(running_idx) = self.running.take() {
                        if running_idx != idx {
                            stop(self.pcbs[running_idx].os_pid);
                            self.pcbs[running_idx].state = ProcessState::Ready;
                            let _ = self.ready_queue.push_back(running_idx);
                        }
                    }
                    resume(self.pcbs[idx].os_pid);
                    self.pcbs[idx].state = ProcessState::Running;
                    self.running = Some(idx);
                    return;
                }
                ProcessState::Terminated => continue,
                ProcessState::Blocked | ProcessState::Running => {
                    let _ = self.ready_queue.push_back(idx);
                }
            }
        }

        if allow_recovery {
            let stray: Vec<usize> = (0..self.pcbs.len())
                .filter(|&i| {
                    self.pcbs[i].state == ProcessState::Ready && !self.ready_queue.contains(&i)
                })
                .collect();
            if !stray.is_empty() {
                log::warn!("schedule_next: rebuilding ready queue from {} stray READY PCBs (bookkeeping recovery)", stray.len());
                for i in stray {
                    let _ = self.ready_queue.push_back(i);
                }
                self.schedule_next_inner(stop, resume, false);
            }
        }
        // Otherwise: idle. Nothing RUNNING, nothing READY outside the queue.
    }

    /// Preempt the current RUNNING PCB (if any) and reschedule. Used by IRQ0.
    pub fn preempt_and_reschedule(&mut self, stop: &mut dyn FnMut(i32), resume: &mut dyn FnMut(i32)) {
        if let Some(running_idx) = self.running.take() {
            stop(self.pcbs[running_idx].os_pid);
            self.pcbs[running_idx].state = ProcessState::Ready;
            let _ = self.ready_queue.push_back(running_idx);
        }
        self.schedule_next(stop, resume);
    }
}
