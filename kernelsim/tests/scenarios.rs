//! Black-box tests driving the pure [`Kernel`] state machine the way
//! `runtime::Runtime` does, checking PCB/queue invariants and end-to-end
//! scheduling and syscall scenarios without spawning real processes or
//! sockets (that plumbing is exercised by `ipc`'s and `sfss`'s own
//! integration tests).

use kernelsim::kernel::Kernel;
use kernelsim::pcb::{Pcb, ProcessState};
use sfp::{MsgType, SfpMessage};

fn kernel(n: u32) -> Kernel {
    let pcbs = (1..=n).map(|id| Pcb::new(id, 9000 + id as i32)).collect();
    Kernel::new(pcbs)
}

fn noop(_pid: i32) {}

/// Every PCB's state is consistent with the scheduler's queue and running
/// slot: at most one RUNNING, READY implies queued, BLOCKED implies exactly
/// one outstanding request.
fn assert_invariants(k: &Kernel) {
    let running_count = k
        .scheduler
        .pcbs
        .iter()
        .filter(|p| p.state == ProcessState::Running)
        .count();
    assert!(running_count <= 1, "at most one PCB may be RUNNING");

    for (idx, pcb) in k.scheduler.pcbs.iter().enumerate() {
        match pcb.state {
            ProcessState::Running => assert!(
                !k.scheduler.ready_queue.contains(&idx),
                "RUNNING PCB must not sit in the ready queue"
            ),
            ProcessState::Blocked => {
                assert!(
                    pcb.pending_request.is_some(),
                    "BLOCKED PCB must have exactly one outstanding request"
                );
                assert!(!k.scheduler.ready_queue.contains(&idx));
            }
            ProcessState::Terminated => {
                assert!(!k.scheduler.ready_queue.contains(&idx));
            }
            ProcessState::Ready => {}
        }
    }
}

#[test]
fn preemption_rotates_strictly_through_every_app_and_back() {
    let mut k = kernel(3);
    let mut stop = noop;
    let mut resume = noop;
    k.scheduler.schedule_next(&mut stop, &mut resume);
    assert_invariants(&k);

    let mut seen = Vec::new();
    for _ in 0..6 {
        seen.push(k.scheduler.pcbs[k.scheduler.running.unwrap()].id);
        k.handle_irq0(&mut stop, &mut resume);
        assert_invariants(&k);
    }
    assert_eq!(seen, vec![1, 2, 3, 1, 2, 3]);
}

#[test]
fn file_syscall_cycle_blocks_replies_and_unblocks_only_on_its_irq() {
    let mut k = kernel(1);
    let mut stop = noop;
    let mut resume = noop;
    k.scheduler.schedule_next(&mut stop, &mut resume);

    let mut sent = None;
    k.handle_app_line(
        "WRITE A1 9001 /A1/f 0 HELLO",
        &mut stop,
        &mut resume,
        &mut |msg| sent = Some(msg.clone()),
    );
    assert_eq!(k.scheduler.pcbs[0].state, ProcessState::Blocked);
    assert_invariants(&k);

    let req = sent.expect("WRITE should produce an SFP request");
    assert_eq!(req.kind(), Some(MsgType::WrReq));

    let mut reply = SfpMessage::zeroed();
    reply.set_kind(MsgType::WrRep);
    reply.owner = req.owner;
    reply.offset = 0;
    k.receive_reply(reply);
    assert_invariants(&k);

    let mut delivered = None;
    k.handle_irq1(&mut stop, &mut resume, &mut |owner, msg| {
        delivered = Some((owner, msg.offset))
    });
    let (owner, offset) = delivered.expect("IRQ1 should deliver the buffered reply");
    assert_eq!(owner, 1);
    assert_eq!(offset, 0);
    assert_eq!(k.scheduler.pcbs[0].state, ProcessState::Ready);
    assert_invariants(&k);
}

#[test]
fn permission_denial_is_carried_through_to_the_apps_unblock() {
    let mut k = kernel(2);
    let mut stop = noop;
    let mut resume = noop;
    k.scheduler.schedule_next(&mut stop, &mut resume);

    let mut sent = None;
    k.handle_app_line(
        "READ A2 9002 /A1/f 0",
        &mut stop,
        &mut resume,
        &mut |msg| sent = Some(msg.clone()),
    );
    let req = sent.unwrap();

    let mut reply = SfpMessage::zeroed();
    reply.set_kind(MsgType::RdRep);
    reply.owner = req.owner;
    reply.offset = sfp::StatusError::PERMISSION;
    k.receive_reply(reply);

    let mut delivered = None;
    k.handle_irq1(&mut stop, &mut resume, &mut |owner, msg| {
        delivered = Some((owner, msg.offset))
    });
    let (owner, offset) = delivered.unwrap();
    assert_eq!(owner, 2);
    assert_eq!(offset, sfp::StatusError::PERMISSION);
}

#[test]
fn snapshot_pause_resume_preserves_pcb_states_and_queue_contents() {
    let mut k = kernel(3);
    let mut stop = noop;
    let mut resume = noop;
    k.scheduler.schedule_next(&mut stop, &mut resume);
    k.handle_app_line("WRITE A2 9002 /A2/f 0 HI", &mut stop, &mut resume, &mut |_| {});

    let before: Vec<_> = k
        .scheduler
        .pcbs
        .iter()
        .map(|p| (p.id, p.state, p.pc))
        .collect();
    let before_ready: Vec<_> = k.scheduler.ready_queue.iter().copied().collect();

    k.paused = true;
    k.paused = false;

    let after: Vec<_> = k
        .scheduler
        .pcbs
        .iter()
        .map(|p| (p.id, p.state, p.pc))
        .collect();
    let after_ready: Vec<_> = k.scheduler.ready_queue.iter().copied().collect();

    assert_eq!(before, after);
    assert_eq!(before_ready, after_ready);
}

#[test]
fn kernel_terminates_once_every_app_is_done() {
    let mut k = kernel(2);
    let mut stop = noop;
    let mut resume = noop;
    k.scheduler.schedule_next(&mut stop, &mut resume);

    assert!(!k.all_terminated());
    k.handle_app_line("DONE A1 9001 20", &mut stop, &mut resume, &mut |_| {});
    assert!(!k.all_terminated());
    k.handle_app_line("DONE A2 9002 20", &mut stop, &mut resume, &mut |_| {});
    assert!(k.all_terminated());
    assert_invariants(&k);
}
