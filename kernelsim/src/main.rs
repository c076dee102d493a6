//! Single binary, three roles, dispatched by argv — mirrors the original
//! C program's `exec(argv[0], ...)` pattern (see [`ipc::spawn_role`]).
//! No subcommand: run as the kernel. `inter`: the interrupt controller.
//! `app <id>`: one application.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Parser;
use nix::sys::signal::Signal;

use kernelsim::app::{choose_syscall, format_syscall_line, should_syscall};
use kernelsim::config::{Cli, Role};
use kernelsim::controller::Controller;
use kernelsim::runtime::Runtime;
use sfp::{MsgType, SfpMessage, StatusError};

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.role.clone() {
        None => run_kernel(&cli),
        Some(Role::Inter { kernel_pid }) => run_controller(&cli, kernel_pid),
        Some(Role::App { id, kernel_pid }) => run_app(&cli, id, kernel_pid),
    }
}

fn run_kernel(cli: &Cli) -> Result<()> {
    let runtime = Runtime::start(cli).context("starting kernel runtime")?;
    runtime.run()
}

/// Each quantum: write `IRQ0` (always), `IRQ1` (probabilistically), `IRQ2`
/// (probabilistically) to stdout, signalling the kernel after each line.
/// `SIGSTOP`/`SIGCONT` from the kernel pause this loop exactly like any
/// other process — no explicit pause handling is needed here.
fn run_controller(cli: &Cli, kernel_pid: i32) -> Result<()> {
    let controller = Controller::new(cli.irq1_prob, cli.irq2_prob);
    let mut rng = rand::thread_rng();
    let stdout = std::io::stdout();

    loop {
        std::thread::sleep(cli.quantum());
        for line in controller.tick_lines(&mut rng) {
            let mut out = stdout.lock();
            let _ = writeln!(out, "{line}");
            let _ = out.flush();
            let _ = ipc::send_signal(kernel_pid, Signal::SIGUSR1);
        }
    }
}

/// The application shell: suspend on start so the kernel schedules it
/// explicitly, then per instruction tick either emit `TICK` or (with
/// probability `1/syscall_prob`) emit a syscall line, suspend, and read the
/// reply slot exactly once on resume. Emits `DONE` after the instruction
/// budget and detaches from shared memory.
fn run_app(cli: &Cli, id: u32, kernel_pid: i32) -> Result<()> {
    let pid = std::process::id() as i32;
    let mut rng = rand::thread_rng();
    let stdout = std::io::stdout();

    let emit = |line: String| {
        let mut out = stdout.lock();
        let _ = writeln!(out, "{line}");
        let _ = out.flush();
        let _ = ipc::send_signal(kernel_pid, Signal::SIGUSR2);
    };

    // Start suspended; the kernel's initial schedule_next() resumes us.
    let _ = nix::sys::signal::raise(Signal::SIGSTOP);

    let reply_slot = ipc::ReplySlot::open(id, std::mem::size_of::<SfpMessage>())
        .context("attaching to kernel-created reply slot")?;

    for tick in 1..=cli.max_pc {
        std::thread::sleep(cli.quantum());

        if should_syscall(cli.syscall_prob, &mut rng) {
            let choice = choose_syscall(&mut rng);
            emit(format_syscall_line(id, pid, choice, tick));
            let _ = nix::sys::signal::raise(Signal::SIGSTOP);
            log_reply(id, &reply_slot);
        } else {
            emit(format!("TICK A{id} {pid} {tick}"));
        }
    }

    emit(format!("DONE A{id} {pid} {}", cli.max_pc));
    drop(reply_slot);
    Ok(())
}

/// Read the reply slot exactly once and log it. The slot
/// always holds a full [`SfpMessage`]; this only ever runs right after the
/// kernel wrote one via an I/O IRQ, so a parse failure would mean kernel/app
/// disagree about the wire layout — worth a loud warning, not a panic.
fn log_reply(id: u32, slot: &ipc::ReplySlot) {
    let Some(reply) = SfpMessage::from_bytes(slot.as_bytes()) else {
        log::warn!("A{id}: reply slot held an unparsable SFP message");
        return;
    };
    let verb = match reply.kind() {
        Some(MsgType::RdRep) => "READ",
        Some(MsgType::WrRep) => "WRITE",
        Some(MsgType::DcRep) => "ADD",
        Some(MsgType::DrRep) => "REM",
        Some(MsgType::DlRep) => "LISTDIR",
        _ => "UNKNOWN",
    };
    let status = match reply.kind() {
        Some(MsgType::DcRep) | Some(MsgType::DrRep) => reply.path_len,
        Some(MsgType::DlRep) => reply.nrnames,
        _ => reply.offset,
    };
    match StatusError::from_status(status) {
        Ok(value) => log::info!("A{id}: {verb} OK ({value})"),
        Err(err) => log::warn!("A{id}: {verb} ERROR ({err})"),
    }
}
