//! Wires the pure [`Kernel`] state machine to real OS resources: child
//! processes for the controller and each app, a UDP socket to SFSS, and a
//! shared-memory reply slot per app. This is the only module that touches
//! sockets, pipes, or signals directly.
//!
//! The event loop's single suspension point is [`ipc::wait_for_wakeup`],
//! blocking on the SFSS socket with an empty signal mask: any of the four
//! handled signals (controller/app data pending, snapshot, resume) or a
//! UDP datagram wakes it, same as the original kernel's
//! `pselect(udp_sockfd + 1, ..., &empty_mask)`.

use std::net::UdpSocket;
use std::os::fd::AsFd;

use anyhow::{Context, Result};
use ipc::{LineChannel, ReplySlot, send_signal, spawn_role};
use nix::sys::signal::Signal;
use sfp::SfpMessage;

use crate::config::Cli;
use crate::kernel::Kernel;
use crate::pcb::Pcb;

pub struct Runtime {
    kernel: Kernel,
    socket: UdpSocket,
    sfss_addr: String,
    controller: ipc::ChildHandle,
    controller_channel: LineChannel,
    apps: Vec<ipc::ChildHandle>,
    app_channels: Vec<LineChannel>,
    reply_slots: Vec<ReplySlot>,
}

impl Runtime {
    pub fn start(cli: &Cli) -> Result<Self> {
        ipc::install_handlers().context("installing signal handlers")?;

        let socket = UdpSocket::bind("127.0.0.1:0").context("binding kernel-side SFSS socket")?;
        socket
            .set_nonblocking(true)
            .context("setting SFSS socket non-blocking")?;

        let exe = std::env::current_exe().context("resolving current executable")?;
        let kernel_pid = std::process::id() as i32;

        let mut controller = spawn_role(
            &exe,
            &[
                "inter",
                "--kernel-pid",
                &kernel_pid.to_string(),
                "--quantum-ms",
                &cli.quantum_ms.to_string(),
                "--irq1-prob",
                &cli.irq1_prob.to_string(),
                "--irq2-prob",
                &cli.irq2_prob.to_string(),
            ],
        )
        .context("spawning interrupt controller")?;
        let controller_stdout = controller
            .take_stdout()
            .context("controller has no piped stdout")?;
        let controller_channel =
            LineChannel::new(controller_stdout).context("wrapping controller channel")?;

        let mut pcbs = Vec::with_capacity(cli.apps as usize);
        let mut apps = Vec::with_capacity(cli.apps as usize);
        let mut app_channels = Vec::with_capacity(cli.apps as usize);
        let mut reply_slots = Vec::with_capacity(cli.apps as usize);

        for id in 1..=cli.apps {
            let slot = ReplySlot::create(id, std::mem::size_of::<SfpMessage>())
                .context("creating per-app reply slot")?;
            let mut child = spawn_role(
                &exe,
                &[
                    "app",
                    &id.to_string(),
                    "--kernel-pid",
                    &kernel_pid.to_string(),
                    "--quantum-ms",
                    &cli.quantum_ms.to_string(),
                    "--max-pc",
                    &cli.max_pc.to_string(),
                    "--syscall-prob",
                    &cli.syscall_prob.to_string(),
                ],
            )
            .with_context(|| format!("spawning app A{id}"))?;
            let stdout = child
                .take_stdout()
                .with_context(|| format!("app A{id} has no piped stdout"))?;
            let channel = LineChannel::new(stdout)
                .with_context(|| format!("wrapping channel for A{id}"))?;

            pcbs.push(Pcb::new(id, child.pid));
            apps.push(child);
            app_channels.push(channel);
            reply_slots.push(slot);
        }

        let mut runtime = Self {
            kernel: Kernel::new(pcbs),
            socket,
            sfss_addr: cli.sfss_addr(),
            controller,
            controller_channel,
            apps,
            app_channels,
            reply_slots,
        };

        // Every app starts READY but suspended; nothing is
        // RUNNING yet, so the loop needs one initial kick to bring the head
        // of the ready queue up before the first IRQ/syscall line arrives.
        let (mut stop, mut resume) = runtime.stop_resume();
        runtime.kernel.scheduler.schedule_next(&mut stop, &mut resume);

        Ok(runtime)
    }

    /// Run until every app has terminated, then tear down the controller
    /// and every shared-memory region.
    pub fn run(mut self) -> Result<()> {
        loop {
            self.drain_datagrams();

            let flags = ipc::take_flags();
            if ipc::SignalFlags::SnapshotRequested.is_set(flags) {
                self.pause();
            }
            if ipc::SignalFlags::ResumeRequested.is_set(flags) {
                self.unpause();
            }
            if !self.kernel.paused {
                if ipc::SignalFlags::ControllerPending.is_set(flags) {
                    self.drain_controller();
                }
                if ipc::SignalFlags::AppPending.is_set(flags) {
                    self.drain_apps();
                }
            }

            self.reap_apps();
            if self.kernel.all_terminated() {
                break;
            }
            if let Err(e) = ipc::wait_for_wakeup(self.socket.as_fd()) {
                log::warn!("error waiting for socket/signal wakeup: {e}");
            }
        }

        let _ = self.controller.terminate();
        let _ = self.controller.wait();
        log::info!("all applications terminated, kernel exiting");
        Ok(())
    }

    fn drain_datagrams(&mut self) {
        let mut buf = vec![0u8; std::mem::size_of::<SfpMessage>()];
        loop {
            match self.socket.recv_from(&mut buf) {
                Ok((n, _)) if n == buf.len() => {
                    if let Some(reply) = SfpMessage::from_bytes(&buf) {
                        self.kernel.receive_reply(reply);
                    }
                }
                Ok((n, _)) => {
                    log::warn!("dropped malformed SFSS datagram of {n} bytes");
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    log::warn!("error receiving from SFSS socket: {e}");
                    break;
                }
            }
        }
    }

    fn stop_resume(&self) -> (impl FnMut(i32), impl FnMut(i32)) {
        let stop = |pid: i32| {
            let _ = send_signal(pid, Signal::SIGSTOP);
        };
        let resume = |pid: i32| {
            let _ = send_signal(pid, Signal::SIGCONT);
        };
        (stop, resume)
    }

    fn drain_controller(&mut self) {
        let Ok(lines) = self.controller_channel.drain_lines() else {
            return;
        };
        for line in lines {
            let (mut stop, mut resume) = self.stop_resume();
            let slots = &mut self.reply_slots;
            self.kernel.handle_controller_line(
                &line,
                &mut stop,
                &mut resume,
                &mut |owner, reply| {
                    if let Some(slot) = slots.get_mut((owner - 1) as usize) {
                        slot.write(reply.to_bytes());
                    }
                },
            );
        }
    }

    fn drain_apps(&mut self) {
        for i in 0..self.app_channels.len() {
            let Ok(lines) = self.app_channels[i].drain_lines() else {
                continue;
            };
            for line in lines {
                let (mut stop, mut resume) = self.stop_resume();
                let socket = &self.socket;
                let addr = self.sfss_addr.as_str();
                self.kernel.handle_app_line(&line, &mut stop, &mut resume, &mut |msg| {
                    let _ = socket.send_to(msg.to_bytes(), addr);
                });
            }
        }
    }

    fn pause(&mut self) {
        if self.kernel.paused {
            return;
        }
        let _ = send_signal(self.controller.pid, Signal::SIGSTOP);
        if let Some(running) = self.kernel.scheduler.running {
            let _ = send_signal(self.kernel.scheduler.pcbs[running].os_pid, Signal::SIGSTOP);
        }
        self.kernel.paused = true;
        log::info!("{}", self.kernel.snapshot());
    }

    fn unpause(&mut self) {
        if !self.kernel.paused {
            return;
        }
        let _ = send_signal(self.controller.pid, Signal::SIGCONT);
        if let Some(running) = self.kernel.scheduler.running {
            let _ = send_signal(self.kernel.scheduler.pcbs[running].os_pid, Signal::SIGCONT);
        }
        self.kernel.paused = false;
    }

    fn reap_apps(&mut self) {
        for (i, child) in self.apps.iter_mut().enumerate() {
            if let Ok(true) = child.try_reap() {
                let pcb = &mut self.kernel.scheduler.pcbs[i];
                if pcb.state != crate::pcb::ProcessState::Terminated {
                    log::warn!("A{} exited without DONE, reaping", pcb.id);
                    pcb.state = crate::pcb::ProcessState::Terminated;
                }
            }
        }
    }
}
